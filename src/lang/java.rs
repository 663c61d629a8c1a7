//! Java language support.

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
(import_declaration) @import
"#;

const CLASS_QUERY: &str = r#"
(class_declaration) @class
"#;

pub(super) fn language() -> Language {
    let resolver = Arc::new(JavaResolver::new());
    Language::new(
        LanguageMeta {
            code: LanguageCode::Java,
            name: "java",
            object_oriented: true,
            extensions: &[".java"],
        },
        tree_sitter_java::LANGUAGE.into(),
        Resolvers::new(LanguageCode::Java, resolver.clone()).with_object_oriented(resolver),
    )
}

#[derive(Debug)]
struct JavaResolver {
    imports: LazyQuery,
    classes: LazyQuery,
}

impl JavaResolver {
    fn new() -> Self {
        Self {
            imports: LazyQuery::new(IMPORT_QUERY),
            classes: LazyQuery::new(CLASS_QUERY),
        }
    }

    fn import_declaration(&self, tree: &ParseTree, node: Node<'_>) -> Option<Import> {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();

        let name = children
            .iter()
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
        let is_wildcard = children.iter().any(|c| c.kind() == "asterisk");

        let module = tree.node_text(*name);
        let mut import = Import::new(module, tree.file().name(), line_of(node));
        if is_wildcard {
            import = import.wildcard();
        } else {
            let simple = name
                .child_by_field_name("name")
                .map(|n| tree.node_text(n))
                .unwrap_or(module);
            import = import.with_alias(simple);
        }

        let hint = package_hint(LanguageCode::Java, &import.module_name);
        Some(import.finish(hint))
    }

    fn class_declaration(&self, tree: &ParseTree, node: Node<'_>) -> Option<ClassDeclaration> {
        let name = tree.node_text(node.child_by_field_name("name")?).to_string();

        let mut bases = Vec::new();
        if let Some(superclass) = node.child_by_field_name("superclass") {
            let mut cursor = superclass.walk();
            bases.extend(
                superclass
                    .named_children(&mut cursor)
                    .map(|t| tree.node_text(t).to_string()),
            );
        }
        if let Some(interfaces) = node.child_by_field_name("interfaces") {
            let mut cursor = interfaces.walk();
            for list in interfaces
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "type_list")
            {
                let mut cursor = list.walk();
                bases.extend(
                    list.named_children(&mut cursor)
                        .map(|t| tree.node_text(t).to_string()),
                );
            }
        }

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "method_declaration")
            {
                if let Some(method) = member.child_by_field_name("name") {
                    methods.push(tree.node_text(method).to_string());
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

impl ImportResolver for JavaResolver {
    fn resolve_imports(&self, tree: &ParseTree) -> Result<Vec<Import>> {
        Ok(self
            .imports
            .captures(tree)?
            .into_iter()
            .filter_map(|(_, node)| self.import_declaration(tree, node))
            .collect())
    }
}

impl ObjectOrientedResolver for JavaResolver {
    fn resolve_classes(&self, tree: &ParseTree) -> Result<Vec<ClassDeclaration>> {
        Ok(self
            .classes
            .captures(tree)?
            .into_iter()
            .filter_map(|(_, node)| self.class_declaration(tree, node))
            .collect())
    }
}
