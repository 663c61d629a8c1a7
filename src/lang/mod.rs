//! Language registry.
//!
//! The registry is built once per process and is read-only afterwards. Each
//! [`Language`] carries its metadata, tree-sitter grammar and resolver bundle.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

mod go;
mod hint;
mod import;
mod java;
mod javascript;
mod python;
pub(crate) mod query;
mod resolvers;
mod typescript;

pub use hint::package_hint;
pub use import::{base_module_name, Import};
pub use resolvers::{
    Capability, ClassDeclaration, ImportResolver, ObjectOrientedResolver, Resolvers,
};

/// Closed set of supported languages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 5] = [
        LanguageCode::Python,
        LanguageCode::JavaScript,
        LanguageCode::TypeScript,
        LanguageCode::Go,
        LanguageCode::Java,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::Python => "python",
            LanguageCode::JavaScript => "javascript",
            LanguageCode::TypeScript => "typescript",
            LanguageCode::Go => "go",
            LanguageCode::Java => "java",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        LanguageCode::ALL
            .into_iter()
            .find(|code| code.as_str() == lower)
            .ok_or_else(|| Error::UnknownLanguage(s.to_string()))
    }
}

/// Static description of a language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMeta {
    pub code: LanguageCode,
    pub name: &'static str,
    pub object_oriented: bool,
    /// Source file suffixes, each starting with `.`.
    pub extensions: &'static [&'static str],
}

/// A registered language: metadata, grammar and resolvers.
pub struct Language {
    meta: LanguageMeta,
    grammar: tree_sitter::Language,
    resolvers: Resolvers,
}

impl Language {
    pub(crate) fn new(meta: LanguageMeta, grammar: tree_sitter::Language, resolvers: Resolvers) -> Self {
        Self {
            meta,
            grammar,
            resolvers,
        }
    }

    pub fn meta(&self) -> &LanguageMeta {
        &self.meta
    }

    pub fn code(&self) -> LanguageCode {
        self.meta.code
    }

    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        self.meta.extensions
    }

    pub fn grammar(&self) -> &tree_sitter::Language {
        &self.grammar
    }

    pub fn resolvers(&self) -> &Resolvers {
        &self.resolvers
    }

    /// True if the file name ends with one of this language's extensions.
    pub fn matches_file(&self, name: &str) -> bool {
        self.meta.extensions.iter().any(|ext| name.ends_with(ext))
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("meta", &self.meta)
            .field("resolvers", &self.resolvers)
            .finish()
    }
}

static REGISTRY: Lazy<Vec<Arc<Language>>> = Lazy::new(|| {
    let languages = vec![
        Arc::new(python::language()),
        Arc::new(javascript::language()),
        Arc::new(typescript::language()),
        Arc::new(go::language()),
        Arc::new(java::language()),
    ];
    tracing::debug!(count = languages.len(), "language registry initialized");
    languages
});

/// Look up a language by code, case-insensitively.
pub fn get_language(name: &str) -> Result<Arc<Language>> {
    let code: LanguageCode = name.parse()?;
    REGISTRY
        .iter()
        .find(|lang| lang.code() == code)
        .cloned()
        .ok_or_else(|| Error::UnknownLanguage(name.to_string()))
}

/// Every registered language, in registration order.
pub fn all_languages() -> Vec<Arc<Language>> {
    REGISTRY.clone()
}

/// The first registered language whose extensions match `path`.
pub fn language_for_path(path: &str) -> Option<Arc<Language>> {
    REGISTRY.iter().find(|lang| lang.matches_file(path)).cloned()
}

/// Resolve a list of language names; an empty list selects every language.
pub fn languages_by_name<S: AsRef<str>>(names: &[S]) -> Result<Vec<Arc<Language>>> {
    if names.is_empty() {
        return Ok(all_languages());
    }
    let mut selected: Vec<Arc<Language>> = Vec::with_capacity(names.len());
    for name in names {
        let lang = get_language(name.as_ref())?;
        if !selected.iter().any(|l| l.code() == lang.code()) {
            selected.push(lang);
        }
    }
    Ok(selected)
}
