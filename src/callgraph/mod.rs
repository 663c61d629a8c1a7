//! Call signature catalog.
//!
//! A signature names a capability (writing files, spawning processes, ...)
//! and, per language, the calls that exhibit it. The catalog shipped with the
//! crate is embedded at build time and validated the first time it is read.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lang::LanguageCode;

mod matcher;

pub use matcher::{CallEvidence, SignatureMatch, SignatureMatcherPlugin};

static EMBEDDED_CATALOG: &str = include_str!("signatures.yaml");

static CATALOG: OnceCell<Catalog> = OnceCell::new();

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Signature {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Matchers keyed by language code.
    #[serde(default)]
    pub languages: BTreeMap<LanguageCode, LanguageMatcher>,
}

/// How a matcher combines its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Call,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageMatcher {
    #[serde(rename = "match")]
    pub strategy: MatchStrategy,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    /// Dotted callee namespace; a trailing `*` matches any member.
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentConstraint>,
}

impl Condition {
    pub fn is_wildcard(&self) -> bool {
        self.value.ends_with('*')
    }

    /// Whether a resolved callee namespace satisfies this condition.
    ///
    /// `a.b.*` matches any namespace below `a.b`; a trailing `*` on a segment
    /// (`shutil.copy*`) matches any namespace with that prefix.
    pub fn matches_namespace(&self, namespace: &str) -> bool {
        match self.value.strip_suffix('*') {
            Some(prefix) => namespace.starts_with(prefix),
            None => self.value == namespace,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArgumentConstraint {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolves_to: Vec<String>,
}

impl Catalog {
    /// Parse and validate a catalog document.
    pub fn from_yaml(document: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(document)
            .map_err(|e| Error::Validation(format!("malformed signature catalog: {e}")))?;
        catalog.validate()?;
        tracing::debug!(
            version = %catalog.version,
            signatures = catalog.signatures.len(),
            "signature catalog loaded"
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::Validation("catalog version is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for (idx, signature) in self.signatures.iter().enumerate() {
            if signature.id.trim().is_empty() {
                return Err(Error::Validation(format!("signature #{idx} has an empty id")));
            }
            if !seen.insert(signature.id.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate signature id '{}'",
                    signature.id
                )));
            }
            signature.validate()?;
        }
        Ok(())
    }

    /// Signatures carrying a matcher for `code`, in catalog order.
    pub fn for_language(&self, code: LanguageCode) -> Vec<&Signature> {
        self.signatures
            .iter()
            .filter(|s| s.languages.contains_key(&code))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.id == id)
    }
}

impl Signature {
    fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(Error::Validation(format!(
                "signature '{}' has no languages",
                self.id
            )));
        }

        for matcher in self.languages.values() {
            for condition in &matcher.conditions {
                if condition.value.trim().is_empty() {
                    return Err(Error::Validation(format!(
                        "signature '{}': condition value is empty",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn matcher(&self, code: LanguageCode) -> Option<&LanguageMatcher> {
        self.languages.get(&code)
    }
}

/// The process-wide catalog embedded in the crate.
pub fn catalog() -> Result<&'static Catalog> {
    CATALOG.get_or_try_init(|| Catalog::from_yaml(EMBEDDED_CATALOG))
}
