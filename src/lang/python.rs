//! Python language support.

use std::sync::Arc;

use tree_sitter::Node;

use super::query::{line_of, LazyQuery};
use super::{
    package_hint, ClassDeclaration, Import, ImportResolver, Language, LanguageCode, LanguageMeta,
    ObjectOrientedResolver, Resolvers,
};
use crate::error::Result;
use crate::parser::ParseTree;

const IMPORT_QUERY: &str = r#"
(import_statement) @import
(import_from_statement) @import_from
(future_import_statement) @future
"#;

/// Module name recorded for `from __future__ import ...`.
const FUTURE_MODULE: &str = "__future__";

const CLASS_QUERY: &str = r#"
(class_definition) @class
"#;

pub(super) fn language() -> Language {
    let resolver = Arc::new(PythonResolver::new());
    Language::new(
        LanguageMeta {
            code: LanguageCode::Python,
            name: "python",
            object_oriented: true,
            extensions: &[".py"],
        },
        tree_sitter_python::LANGUAGE.into(),
        Resolvers::new(LanguageCode::Python, resolver.clone()).with_object_oriented(resolver),
    )
}

#[derive(Debug)]
struct PythonResolver {
    imports: LazyQuery,
    classes: LazyQuery,
}

impl PythonResolver {
    fn new() -> Self {
        Self {
            imports: LazyQuery::new(IMPORT_QUERY),
            classes: LazyQuery::new(CLASS_QUERY),
        }
    }

    /// `import a.b`, `import a as b`, `import a, b`
    fn plain_imports(&self, tree: &ParseTree, node: Node<'_>, out: &mut Vec<(usize, Import)>) {
        let file = tree.file().name();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let import = match name.kind() {
                "aliased_import" => {
                    let Some(module) = name.child_by_field_name("name") else {
                        continue;
                    };
                    let mut import = Import::new(tree.node_text(module), file, line_of(name));
                    if let Some(alias) = name.child_by_field_name("alias") {
                        import = import.with_alias(tree.node_text(alias));
                    }
                    import
                }
                _ => Import::new(tree.node_text(name), file, line_of(name)),
            };
            out.push((name.start_byte(), finish(import)));
        }
    }

    /// `from a import b`, `from a import b as c`, `from . import x`, `from a import *`
    fn from_imports(&self, tree: &ParseTree, node: Node<'_>, out: &mut Vec<(usize, Import)>) {
        let file = tree.file().name();
        let Some(module) = node.child_by_field_name("module_name") else {
            return;
        };
        let module_name = tree.node_text(module);

        let mut cursor = node.walk();
        let wildcard = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "wildcard_import");
        if let Some(star) = wildcard {
            let import = Import::new(module_name, file, line_of(node)).wildcard();
            out.push((star.start_byte(), finish(import)));
            return;
        }

        self.imported_items(tree, node, module_name, out);
    }

    /// `from __future__ import annotations`
    fn future_imports(&self, tree: &ParseTree, node: Node<'_>, out: &mut Vec<(usize, Import)>) {
        self.imported_items(tree, node, FUTURE_MODULE, out);
    }

    fn imported_items(
        &self,
        tree: &ParseTree,
        node: Node<'_>,
        module_name: &str,
        out: &mut Vec<(usize, Import)>,
    ) {
        let file = tree.file().name();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let mut import = Import::new(module_name, file, line_of(name));
            match name.kind() {
                "aliased_import" => {
                    if let Some(item) = name.child_by_field_name("name") {
                        import = import.with_item(tree.node_text(item));
                    }
                    if let Some(alias) = name.child_by_field_name("alias") {
                        import = import.with_alias(tree.node_text(alias));
                    }
                }
                _ => import = import.with_item(tree.node_text(name)),
            }
            out.push((name.start_byte(), finish(import)));
        }
    }

    fn class_declaration(&self, tree: &ParseTree, node: Node<'_>) -> Option<ClassDeclaration> {
        let name = tree.node_text(node.child_by_field_name("name")?).to_string();

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                // metaclass=..., **kwargs
                if matches!(
                    base.kind(),
                    "keyword_argument" | "list_splat" | "dictionary_splat" | "comment"
                ) {
                    continue;
                }
                bases.push(tree.node_text(base).to_string());
            }
        }

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for stmt in body.named_children(&mut cursor) {
                let func = match stmt.kind() {
                    "function_definition" => Some(stmt),
                    "decorated_definition" => stmt
                        .child_by_field_name("definition")
                        .filter(|def| def.kind() == "function_definition"),
                    _ => None,
                };
                if let Some(name) = func.and_then(|f| f.child_by_field_name("name")) {
                    methods.push(tree.node_text(name).to_string());
                }
            }
        }

        Some(ClassDeclaration {
            name,
            bases,
            methods,
            line: line_of(node),
        })
    }
}

fn finish(import: Import) -> Import {
    let hint = package_hint(LanguageCode::Python, &import.module_name);
    import.finish(hint)
}

impl ImportResolver for PythonResolver {
    fn resolve_imports(&self, tree: &ParseTree) -> Result<Vec<Import>> {
        let mut found = Vec::new();
        for (capture, node) in self.imports.captures(tree)? {
            match capture {
                "import" => self.plain_imports(tree, node, &mut found),
                "import_from" => self.from_imports(tree, node, &mut found),
                "future" => self.future_imports(tree, node, &mut found),
                _ => {}
            }
        }
        found.sort_by_key(|(pos, _)| *pos);
        Ok(found.into_iter().map(|(_, import)| import).collect())
    }
}

impl ObjectOrientedResolver for PythonResolver {
    fn resolve_classes(&self, tree: &ParseTree) -> Result<Vec<ClassDeclaration>> {
        Ok(self
            .classes
            .captures(tree)?
            .into_iter()
            .filter_map(|(_, node)| self.class_declaration(tree, node))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::lang::{get_language, Import};
    use crate::parser::tests::parse_str;

    fn imports(source: &str) -> Vec<Import> {
        let lang = get_language("python").unwrap();
        let tree = parse_str(&lang, "main.py", source);
        lang.resolvers().resolve_imports(&tree).unwrap()
    }

    fn shape(imports: &[Import]) -> Vec<(&str, Option<&str>, Option<&str>, bool)> {
        imports
            .iter()
            .map(|i| {
                (
                    i.module_name.as_str(),
                    i.module_item.as_deref(),
                    i.module_alias.as_deref(),
                    i.is_wildcard,
                )
            })
            .collect()
    }

    #[test]
    fn test_plain_alias_and_wildcard() {
        let found = imports("import os\nfrom os.path import join as j\nfrom math import *\n");
        assert_eq!(
            shape(&found),
            vec![
                ("os", None, None, false),
                ("os.path", Some("join"), Some("j"), false),
                ("math", None, None, true),
            ]
        );
        assert_eq!(found[0].line, 1);
        assert_eq!(found[1].line, 2);
        assert_eq!(found[2].line, 3);
        assert_eq!(found[1].base_module_name(), "os");
        assert_eq!(found[1].identifier.as_deref(), Some("j"));
        assert_eq!(found[2].identifier, None);
        assert_eq!(found[0].file, "main.py");
    }

    #[test]
    fn test_dotted_aliased_and_multiple() {
        let found = imports("import xml.dom.minidom\nimport numpy as np, pandas\n");
        assert_eq!(
            shape(&found),
            vec![
                ("xml.dom.minidom", None, None, false),
                ("numpy", None, Some("np"), false),
                ("pandas", None, None, false),
            ]
        );
        assert_eq!(found[0].package_hint.as_deref(), Some("xml"));
        assert_eq!(found[1].identifier.as_deref(), Some("np"));
    }

    #[test]
    fn test_parenthesized_from_import() {
        let found = imports("from collections import (\n    OrderedDict,\n    defaultdict as dd,\n)\n");
        assert_eq!(
            shape(&found),
            vec![
                ("collections", Some("OrderedDict"), None, false),
                ("collections", Some("defaultdict"), Some("dd"), false),
            ]
        );
        assert_eq!(found[0].line, 2);
        assert_eq!(found[1].line, 3);
    }

    #[test]
    fn test_relative_imports() {
        let found = imports("from . import sibling\nfrom ..pkg import helper as h\n");
        assert_eq!(
            shape(&found),
            vec![
                (".", Some("sibling"), None, false),
                ("..pkg", Some("helper"), Some("h"), false),
            ]
        );
        assert_eq!(found[0].package_hint, None);
    }

    #[test]
    fn test_future_imports() {
        let found = imports("from __future__ import annotations, division\nimport os\n");
        assert_eq!(
            shape(&found),
            vec![
                ("__future__", Some("annotations"), None, false),
                ("__future__", Some("division"), None, false),
                ("os", None, None, false),
            ]
        );
        assert_eq!(found[0].base_module_name(), "__future__");
        assert_eq!(found[0].package_hint.as_deref(), Some("__future__"));
    }

    #[test]
    fn test_nested_imports_are_in_source_order() {
        let source = "import b\n\ndef f():\n    import a\n    return a\n\nimport c\n";
        let names: Vec<String> = imports(source).into_iter().map(|i| i.module_name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_resolve_classes() {
        let lang = get_language("python").unwrap();
        let source = r#"
class Animal:
    def speak(self):
        pass

class Dog(Animal, metaclass=Meta):
    @property
    def name(self):
        return "dog"

    def speak(self):
        return "woof"
"#;
        let tree = parse_str(&lang, "zoo.py", source);
        let classes = lang
            .resolvers()
            .object_oriented()
            .unwrap()
            .resolve_classes(&tree)
            .unwrap();

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name, "Animal");
        assert!(classes[0].bases.is_empty());
        assert_eq!(classes[0].methods, vec!["speak"]);
        assert_eq!(classes[0].line, 2);

        assert_eq!(classes[1].name, "Dog");
        assert_eq!(classes[1].bases, vec!["Animal"]);
        assert_eq!(classes[1].methods, vec!["name", "speak"]);
    }
}
