//! Go language support.

use std::sync::Arc;

use tree_sitter::Node;

use super::query::{line_of, unquote, LazyQuery};
use super::{package_hint, Import, ImportResolver, Language, LanguageCode, LanguageMeta, Resolvers};
use crate::error::Result;
use crate::parser::ParseTree;

const IMPORT_QUERY: &str = r#"
(import_spec) @spec
"#;

pub(super) fn language() -> Language {
    Language::new(
        LanguageMeta {
            code: LanguageCode::Go,
            name: "go",
            object_oriented: false,
            extensions: &[".go"],
        },
        tree_sitter_go::LANGUAGE.into(),
        Resolvers::new(LanguageCode::Go, Arc::new(GoResolver::new())),
    )
}

#[derive(Debug)]
struct GoResolver {
    imports: LazyQuery,
}

impl GoResolver {
    fn new() -> Self {
        Self {
            imports: LazyQuery::new(IMPORT_QUERY),
        }
    }

    fn import_spec(&self, tree: &ParseTree, spec: Node<'_>) -> Option<Import> {
        let path = spec.child_by_field_name("path")?;
        let module = unquote(tree.node_text(path));
        if module.is_empty() {
            return None;
        }

        let mut import = Import::new(module, tree.file().name(), line_of(spec));
        match spec.child_by_field_name("name") {
            // Blank and dot imports bind nothing addressable.
            Some(name) if matches!(name.kind(), "blank_identifier" | "dot") => {
                import = import.wildcard();
            }
            Some(name) => import = import.with_alias(tree.node_text(name)),
            None => {
                let implicit = module.rsplit('/').next().unwrap_or(module);
                import = import.with_alias(implicit);
            }
        }

        let hint = package_hint(LanguageCode::Go, &import.module_name);
        Some(import.finish(hint))
    }
}

impl ImportResolver for GoResolver {
    fn resolve_imports(&self, tree: &ParseTree) -> Result<Vec<Import>> {
        Ok(self
            .imports
            .captures(tree)?
            .into_iter()
            .filter_map(|(_, spec)| self.import_spec(tree, spec))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::lang::get_language;
    use crate::parser::tests::parse_str;

    #[test]
    fn test_go_imports() {
        let source = r#"package main

import "fmt"

import (
	"net/http"
	yaml "gopkg.in/yaml.v3"
	_ "github.com/lib/pq"
	. "github.com/onsi/gomega"
	"github.com/jackc/pgx/v5/pgxpool"
)

func main() { fmt.Println(http.StatusOK) }
"#;
        let lang = get_language("go").unwrap();
        let tree = parse_str(&lang, "main.go", source);
        let found = lang.resolvers().resolve_imports(&tree).unwrap();

        let shape: Vec<(&str, Option<&str>, bool)> = found
            .iter()
            .map(|i| (i.module_name.as_str(), i.module_alias.as_deref(), i.is_wildcard))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("fmt", Some("fmt"), false),
                ("net/http", Some("http"), false),
                ("gopkg.in/yaml.v3", Some("yaml"), false),
                ("github.com/lib/pq", None, true),
                ("github.com/onsi/gomega", None, true),
                ("github.com/jackc/pgx/v5/pgxpool", Some("pgxpool"), false),
            ]
        );

        assert_eq!(found[0].line, 3);
        assert_eq!(found[1].line, 6);
        assert_eq!(found[1].package_hint.as_deref(), Some("net"));
        assert_eq!(
            found[5].package_hint.as_deref(),
            Some("github.com/jackc/pgx/v5")
        );
        assert_eq!(found[3].identifier, None);
        assert_eq!(found[2].identifier.as_deref(), Some("yaml"));
    }
}
