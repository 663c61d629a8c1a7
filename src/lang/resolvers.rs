//! Capability-scoped resolvers attached to each language.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{Import, LanguageCode};
use crate::error::{Error, Result};
use crate::parser::ParseTree;

/// Resolves the import statements of a parse tree.
pub trait ImportResolver: Send + Sync {
    /// Imports in source order.
    fn resolve_imports(&self, tree: &ParseTree) -> Result<Vec<Import>>;
}

/// Resolves class-like declarations of a parse tree.
pub trait ObjectOrientedResolver: Send + Sync {
    fn resolve_classes(&self, tree: &ParseTree) -> Result<Vec<ClassDeclaration>>;
}

/// A class and its directly declared members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDeclaration {
    pub name: String,
    /// Base classes and implemented interfaces, in declaration order.
    pub bases: Vec<String>,
    /// Methods declared in the class body, in body order.
    pub methods: Vec<String>,
    /// 1-based line of the declaration.
    pub line: usize,
}

/// Capabilities a resolver bundle may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Imports,
    ObjectOriented,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Imports => "import resolution",
            Capability::ObjectOriented => "object-oriented resolution",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolvers of one language.
///
/// Import resolution is always present. Other capabilities are optional and
/// must be probed before use.
#[derive(Clone)]
pub struct Resolvers {
    language: LanguageCode,
    imports: Arc<dyn ImportResolver>,
    object_oriented: Option<Arc<dyn ObjectOrientedResolver>>,
}

impl Resolvers {
    pub fn new(language: LanguageCode, imports: Arc<dyn ImportResolver>) -> Self {
        Self {
            language,
            imports,
            object_oriented: None,
        }
    }

    pub fn with_object_oriented(mut self, resolver: Arc<dyn ObjectOrientedResolver>) -> Self {
        self.object_oriented = Some(resolver);
        self
    }

    pub fn imports(&self) -> &dyn ImportResolver {
        self.imports.as_ref()
    }

    pub fn resolve_imports(&self, tree: &ParseTree) -> Result<Vec<Import>> {
        self.imports.resolve_imports(tree)
    }

    /// Probe for object-oriented resolution.
    pub fn object_oriented(&self) -> Option<&dyn ObjectOrientedResolver> {
        self.object_oriented.as_deref()
    }

    /// Like [`Resolvers::object_oriented`], failing with `UnsupportedCapability`.
    pub fn object_oriented_or_err(&self) -> Result<&dyn ObjectOrientedResolver> {
        self.object_oriented()
            .ok_or_else(|| self.unsupported(Capability::ObjectOriented))
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Imports => true,
            Capability::ObjectOriented => self.object_oriented.is_some(),
        }
    }

    fn unsupported(&self, capability: Capability) -> Error {
        Error::UnsupportedCapability {
            language: self.language.to_string(),
            capability: capability.as_str(),
        }
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("language", &self.language)
            .field("object_oriented", &self.object_oriented.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::get_language;

    #[test]
    fn test_capability_probe() {
        let python = get_language("python").unwrap();
        assert!(python.resolvers().supports(Capability::ObjectOriented));
        assert!(python.resolvers().object_oriented().is_some());

        let go = get_language("go").unwrap();
        assert!(go.resolvers().supports(Capability::Imports));
        assert!(go.resolvers().object_oriented().is_none());
    }

    #[test]
    fn test_missing_capability_error() {
        let js = get_language("javascript").unwrap();
        let err = js.resolvers().object_oriented_or_err().err().unwrap();
        assert!(matches!(
            err,
            Error::UnsupportedCapability {
                capability: "object-oriented resolution",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "language javascript does not support object-oriented resolution"
        );
    }
}
