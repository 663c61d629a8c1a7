//! JavaScript language support. The import resolver is shared with TypeScript.

use std::sync::Arc;

use tree_sitter::Node;

use super::query::{line_of, unquote, LazyQuery};
use super::{package_hint, Import, ImportResolver, Language, LanguageCode, LanguageMeta, Resolvers};
use crate::error::Result;
use crate::parser::ParseTree;

const IMPORT_QUERY: &str = r#"
(import_statement) @import
(variable_declarator) @declarator
(export_statement) @export
"#;

pub(super) fn language() -> Language {
    Language::new(
        LanguageMeta {
            code: LanguageCode::JavaScript,
            name: "javascript",
            object_oriented: false,
            extensions: &[".js", ".mjs", ".cjs", ".jsx"],
        },
        tree_sitter_javascript::LANGUAGE.into(),
        Resolvers::new(
            LanguageCode::JavaScript,
            Arc::new(EcmaScriptResolver::new(LanguageCode::JavaScript)),
        ),
    )
}

/// Import resolution for the JavaScript family of grammars.
#[derive(Debug)]
pub(super) struct EcmaScriptResolver {
    code: LanguageCode,
    imports: LazyQuery,
}

impl EcmaScriptResolver {
    pub(super) fn new(code: LanguageCode) -> Self {
        Self {
            code,
            imports: LazyQuery::new(IMPORT_QUERY),
        }
    }

    fn finish(&self, import: Import) -> Import {
        let hint = package_hint(self.code, &import.module_name);
        import.finish(hint)
    }

    /// ES module `import` statements, including TypeScript `import x = require()`.
    fn import_statement(&self, tree: &ParseTree, node: Node<'_>, out: &mut Vec<Import>) {
        let file = tree.file().name();
        let line = line_of(node);

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();

        if let Some(clause) = children.iter().find(|c| c.kind() == "import_require_clause") {
            let mut cursor = clause.walk();
            let alias = clause
                .named_children(&mut cursor)
                .find(|c| c.kind() == "identifier");
            if let (Some(alias), Some(source)) = (alias, clause.child_by_field_name("source")) {
                let import = Import::new(unquote(tree.node_text(source)), file, line)
                    .with_alias(tree.node_text(alias));
                out.push(self.finish(import));
            }
            return;
        }

        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let module = unquote(tree.node_text(source));

        let Some(clause) = children.iter().find(|c| c.kind() == "import_clause") else {
            // import 'side-effect'
            out.push(self.finish(Import::new(module, file, line).wildcard()));
            return;
        };

        let mut cursor = clause.walk();
        for part in clause.named_children(&mut cursor) {
            match part.kind() {
                // import Default from 'm'
                "identifier" => {
                    let import = Import::new(module, file, line).with_alias(tree.node_text(part));
                    out.push(self.finish(import));
                }
                // import * as ns from 'm'
                "namespace_import" => {
                    let mut cursor = part.walk();
                    let mut import = Import::new(module, file, line).wildcard();
                    if let Some(alias) = part
                        .named_children(&mut cursor)
                        .find(|c| c.kind() == "identifier")
                    {
                        import = import.with_alias(tree.node_text(alias));
                    }
                    out.push(self.finish(import));
                }
                // import { a, b as c } from 'm'
                "named_imports" => {
                    let mut cursor = part.walk();
                    for spec in part
                        .named_children(&mut cursor)
                        .filter(|c| c.kind() == "import_specifier")
                    {
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let mut import = Import::new(module, file, line_of(spec))
                            .with_item(unquote(tree.node_text(name)));
                        if let Some(alias) = spec.child_by_field_name("alias") {
                            import = import.with_alias(tree.node_text(alias));
                        }
                        out.push(self.finish(import));
                    }
                }
                _ => {}
            }
        }
    }

    /// Re-exports: `export { a, b as c } from 'm'`, `export * from 'm'`,
    /// `export * as ns from 'm'`. They bind no local name.
    fn export_statement(&self, tree: &ParseTree, node: Node<'_>, out: &mut Vec<Import>) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let module = unquote(tree.node_text(source));
        let file = tree.file().name();
        let line = line_of(node);

        let mut cursor = node.walk();
        let clause = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "export_clause");
        let Some(clause) = clause else {
            out.push(self.finish(Import::new(module, file, line).wildcard()));
            return;
        };

        let mut cursor = clause.walk();
        for spec in clause
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "export_specifier")
        {
            if let Some(name) = spec.child_by_field_name("name") {
                let import =
                    Import::new(module, file, line_of(spec)).with_item(unquote(tree.node_text(name)));
                out.push(self.finish(import));
            }
        }
    }

    /// `const x = require('m')`, `const { a, b: c } = require('m')`,
    /// `const x = await import('m')`
    fn declarator(&self, tree: &ParseTree, node: Node<'_>, out: &mut Vec<Import>) {
        let (Some(name), Some(value)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("value"),
        ) else {
            return;
        };
        let Some(module) = self.required_module(tree, value) else {
            return;
        };

        let file = tree.file().name();
        match name.kind() {
            "identifier" => {
                let import = Import::new(module, file, line_of(node)).with_alias(tree.node_text(name));
                out.push(self.finish(import));
            }
            "object_pattern" => {
                let mut cursor = name.walk();
                for prop in name.named_children(&mut cursor) {
                    let import = match prop.kind() {
                        "shorthand_property_identifier_pattern" => {
                            Import::new(module, file, line_of(prop)).with_item(tree.node_text(prop))
                        }
                        "pair_pattern" => {
                            let (Some(key), Some(value)) = (
                                prop.child_by_field_name("key"),
                                prop.child_by_field_name("value"),
                            ) else {
                                continue;
                            };
                            Import::new(module, file, line_of(prop))
                                .with_item(unquote(tree.node_text(key)))
                                .with_alias(tree.node_text(value))
                        }
                        _ => continue,
                    };
                    out.push(self.finish(import));
                }
            }
            _ => {}
        }
    }

    /// Module specifier of a `require('m')` or `[await] import('m')` call.
    fn required_module<'t>(&self, tree: &'t ParseTree, value: Node<'t>) -> Option<&'t str> {
        let call = match value.kind() {
            "await_expression" => {
                let mut cursor = value.walk();
                let inner = value
                    .named_children(&mut cursor)
                    .find(|c| c.kind() == "call_expression");
                inner?
            }
            "call_expression" => value,
            _ => return None,
        };

        let function = call.child_by_field_name("function")?;
        let is_loader = match function.kind() {
            "import" => true,
            "identifier" => tree.node_text(function) == "require",
            _ => false,
        };
        if !is_loader {
            return None;
        }

        let args = call.child_by_field_name("arguments")?;
        let mut cursor = args.walk();
        let first = args.named_children(&mut cursor).next()?;
        if first.kind() != "string" {
            return None;
        }
        Some(unquote(tree.node_text(first)))
    }
}

impl ImportResolver for EcmaScriptResolver {
    fn resolve_imports(&self, tree: &ParseTree) -> Result<Vec<Import>> {
        let mut found = Vec::new();
        for (capture, node) in self.imports.captures(tree)? {
            match capture {
                "import" => self.import_statement(tree, node, &mut found),
                "declarator" => self.declarator(tree, node, &mut found),
                "export" => self.export_statement(tree, node, &mut found),
                _ => {}
            }
        }
        Ok(found)
    }
}
