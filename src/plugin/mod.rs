//! Analyzer plugins and the executor that drives them.
//!
//! A plugin consumes raw files ([`FilePlugin`]), parse trees ([`TreePlugin`]),
//! or both. The executor filters plugins by language and calls them in the
//! order they were registered.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::fs::FileRef;
use crate::lang::LanguageCode;
use crate::parser::ParseTree;

pub mod depsusage;
mod executor;
pub mod stripcomments;

pub use executor::{ErrorMode, ExecutionReport, ExecutorConfig, PluginExecutor};

/// Languages a plugin wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportedLanguages {
    All,
    Only(Vec<LanguageCode>),
}

impl SupportedLanguages {
    pub fn contains(&self, code: LanguageCode) -> bool {
        match self {
            SupportedLanguages::All => true,
            SupportedLanguages::Only(codes) => codes.contains(&code),
        }
    }
}

/// Base capability shared by every plugin.
pub trait Plugin {
    fn name(&self) -> &str;

    fn supported_languages(&self) -> SupportedLanguages;

    /// The file-consuming side of this plugin, if any.
    fn as_file_plugin(&mut self) -> Option<&mut dyn FilePlugin> {
        None
    }

    /// The tree-consuming side of this plugin, if any.
    fn as_tree_plugin(&mut self) -> Option<&mut dyn TreePlugin> {
        None
    }
}

/// Consumes raw source files.
pub trait FilePlugin {
    fn analyze_source(&mut self, cancel: &CancellationToken, file: &FileRef) -> Result<()>;
}

/// Consumes parse trees.
pub trait TreePlugin {
    fn analyze_tree(&mut self, cancel: &CancellationToken, tree: &ParseTree) -> Result<()>;
}
