//! Error kinds surfaced by the analysis pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while enumerating, parsing or analyzing source files.
#[derive(Error, Debug)]
pub enum Error {
    /// The cancellation token was triggered.
    #[error("operation cancelled")]
    Cancelled,

    /// `find` could not locate the requested file in any root.
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The grammar refused the input, or no grammar handles the file.
    #[error("failed to parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// A resolver bundle was asked for a capability it does not provide.
    #[error("language {language} does not support {capability}")]
    UnsupportedCapability {
        language: String,
        capability: &'static str,
    },

    #[error("plugin {plugin} failed on {file}: {source}")]
    Plugin {
        plugin: String,
        file: String,
        #[source]
        source: Box<Error>,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid {language} query: {source}")]
    Query {
        language: String,
        #[source]
        source: tree_sitter::QueryError,
    },

    /// Enumeration of one origin (app or import roots) failed.
    #[error("failed to walk {origin} files: {source}")]
    Walk {
        origin: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error, or any error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Plugin { source, .. } | Error::Walk { source, .. } => source.is_cancelled(),
            Error::Other(e) => e
                .chain()
                .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::Cancelled))),
            _ => false,
        }
    }

    /// Returns true for a `NotFound` lookup failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_through_wrapping() {
        let err = Error::Walk {
            origin: "app",
            source: Box::new(Error::Plugin {
                plugin: "p".to_string(),
                file: "a.py".to_string(),
                source: Box::new(Error::Cancelled),
            }),
        };
        assert!(err.is_cancelled());
        assert!(!Error::NotFound("x".to_string()).is_cancelled());
    }

    #[test]
    fn test_display_carries_context() {
        let err = Error::Parse {
            file: "main.py".to_string(),
            reason: "grammar rejected input".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse main.py: grammar rejected input");

        let err = Error::io("/tmp/x", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/tmp/x"));
    }
}
