//! TypeScript language support.

use std::sync::Arc;

use super::javascript::EcmaScriptResolver;
use super::{Language, LanguageCode, LanguageMeta, Resolvers};

pub(super) fn language() -> Language {
    Language::new(
        LanguageMeta {
            code: LanguageCode::TypeScript,
            name: "typescript",
            object_oriented: false,
            extensions: &[".ts", ".mts", ".cts"],
        },
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Resolvers::new(
            LanguageCode::TypeScript,
            Arc::new(EcmaScriptResolver::new(LanguageCode::TypeScript)),
        ),
    )
}

#[cfg(test)]
mod tests {
    use crate::lang::{get_language, Import};
    use crate::parser::tests::parse_str;

    fn imports(source: &str) -> Vec<Import> {
        let lang = get_language("typescript").unwrap();
        let tree = parse_str(&lang, "app.ts", source);
        lang.resolvers().resolve_imports(&tree).unwrap()
    }

    #[test]
    fn test_typescript_imports() {
        let source = r#"
import type { Request } from 'express';
import fs = require('fs');
import * as path from 'node:path';
const { join } = require('path');
"#;
        let found = imports(source);
        let shape: Vec<(&str, Option<&str>, Option<&str>, bool)> = found
            .iter()
            .map(|i| {
                (
                    i.module_name.as_str(),
                    i.module_item.as_deref(),
                    i.module_alias.as_deref(),
                    i.is_wildcard,
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("express", Some("Request"), None, false),
                ("fs", None, Some("fs"), false),
                ("node:path", None, Some("path"), true),
                ("path", Some("join"), None, false),
            ]
        );
        assert_eq!(found[1].line, 3);
        assert_eq!(found[1].package_hint.as_deref(), Some("fs"));
    }

    #[test]
    fn test_typescript_has_no_class_resolver() {
        let lang = get_language("typescript").unwrap();
        assert!(lang.resolvers().object_oriented().is_none());
    }
}
