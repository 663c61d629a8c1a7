//! Dependency usage analysis.
//!
//! For every Python tree the plugin indexes the file's imports by base module,
//! then walks the tree and marks a module used whenever an identifier bound by
//! one of its imports appears. Results go to a caller-supplied sink.

use phf::phf_set;
use tokio_util::sync::CancellationToken;

use super::{Plugin, SupportedLanguages, TreePlugin};
use crate::error::Result;
use crate::fs::{check_cancelled, FileRef};
use crate::lang::LanguageCode;
use crate::lang::query::line_of;
use crate::parser::ParseTree;

mod diagnostics;

pub use diagnostics::{IdentifierItem, ModuleUsage, UsageDiagnostics, UsageEvidence};

/// Node kinds whose subtrees are not searched for identifiers.
static IGNORED_NODE_KINDS: phf::Set<&'static str> = phf_set! {
    "comment",
    "import_statement",
    "import_from_statement",
    "future_import_statement",
};

/// Compiler directives, never a dependency.
const FUTURE_MODULE: &str = "__future__";

/// Nodes visited between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Receives the diagnostics of each analyzed file.
pub type UsageSink<'a> = dyn FnMut(&FileRef, UsageDiagnostics) -> Result<()> + 'a;

pub struct DependencyUsagePlugin<'a> {
    sink: Box<UsageSink<'a>>,
}

impl<'a> DependencyUsagePlugin<'a> {
    pub const NAME: &'static str = "dependency-usage";

    pub fn new(sink: impl FnMut(&FileRef, UsageDiagnostics) -> Result<()> + 'a) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl Plugin for DependencyUsagePlugin<'_> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supported_languages(&self) -> SupportedLanguages {
        SupportedLanguages::Only(vec![LanguageCode::Python])
    }

    fn as_tree_plugin(&mut self) -> Option<&mut dyn TreePlugin> {
        Some(self)
    }
}

impl TreePlugin for DependencyUsagePlugin<'_> {
    fn analyze_tree(&mut self, cancel: &CancellationToken, tree: &ParseTree) -> Result<()> {
        let language = tree.language();
        if language.code() != LanguageCode::Python {
            return Ok(());
        }

        let imports: Vec<_> = language
            .resolvers()
            .resolve_imports(tree)?
            .into_iter()
            .filter(|import| import.module_name != FUTURE_MODULE)
            .collect();
        let mut diagnostics = UsageDiagnostics::from_imports(tree.file().name(), &imports);
        mark_usages(cancel, tree, &mut diagnostics)?;

        tracing::debug!(
            file = tree.file().name(),
            modules = diagnostics.modules().count(),
            unused = diagnostics.unused_modules().len(),
            "dependency usage analyzed"
        );
        (self.sink)(tree.file(), diagnostics)
    }
}

/// Pre-order walk marking every identifier that names an import.
pub fn mark_usages(
    cancel: &CancellationToken,
    tree: &ParseTree,
    diagnostics: &mut UsageDiagnostics,
) -> Result<()> {
    let mut cursor = tree.root_node().walk();
    let mut visited = 0usize;

    loop {
        visited += 1;
        if visited % CANCEL_CHECK_INTERVAL == 0 {
            check_cancelled(cancel)?;
        }

        let node = cursor.node();
        if node.kind() == "identifier" {
            diagnostics.mark_used(tree.node_text(node), line_of(node));
        }

        if !IGNORED_NODE_KINDS.contains(node.kind()) && cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}
