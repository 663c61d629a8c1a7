//! Fan-out of parse trees to plugins.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::Plugin;
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::lang::Language;
use crate::parser::{ParseTree, TreeVisitor, TreeWalker};

/// What to do when a plugin fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Abort on the first plugin error.
    #[default]
    FailFast,
    /// Record plugin errors and keep going. Cancellation still aborts.
    Continue,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorConfig {
    pub error_mode: ErrorMode,
}

/// Summary of one `execute` run.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Parse trees produced by the walker.
    pub trees: usize,
    /// Individual plugin invocations (file and tree sides counted separately).
    pub dispatches: usize,
    /// Plugin errors recorded in `Continue` mode.
    pub errors: Vec<Error>,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Applies each plugin to every tree produced by a tree walker.
pub struct PluginExecutor<'p, W: TreeWalker> {
    walker: W,
    plugins: Vec<Box<dyn Plugin + 'p>>,
    config: ExecutorConfig,
}

impl<'p, W: TreeWalker> PluginExecutor<'p, W> {
    pub fn new(walker: W, plugins: Vec<Box<dyn Plugin + 'p>>) -> Self {
        Self::with_config(walker, plugins, ExecutorConfig::default())
    }

    pub fn with_config(
        walker: W,
        plugins: Vec<Box<dyn Plugin + 'p>>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            walker,
            plugins,
            config,
        }
    }

    /// Plugin names in dispatch order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Walk the file system and dispatch every tree to the plugins.
    pub fn execute(
        &mut self,
        cancel: &CancellationToken,
        fs: &dyn FileSystem,
    ) -> Result<ExecutionReport> {
        let mut dispatcher = Dispatcher {
            cancel,
            plugins: &mut self.plugins,
            error_mode: self.config.error_mode,
            report: ExecutionReport::default(),
        };
        self.walker.walk(cancel, fs, &mut dispatcher)?;

        let report = dispatcher.report;
        tracing::info!(
            trees = report.trees,
            dispatches = report.dispatches,
            errors = report.errors.len(),
            "plugin execution finished"
        );
        Ok(report)
    }
}

struct Dispatcher<'a, 'p> {
    cancel: &'a CancellationToken,
    plugins: &'a mut Vec<Box<dyn Plugin + 'p>>,
    error_mode: ErrorMode,
    report: ExecutionReport,
}

impl Dispatcher<'_, '_> {
    fn handle(&mut self, plugin: String, tree: &ParseTree, result: Result<()>) -> Result<()> {
        self.report.dispatches += 1;
        let Err(source) = result else {
            return Ok(());
        };

        let err = Error::Plugin {
            plugin,
            file: tree.file().name().to_string(),
            source: Box::new(source),
        };
        if self.error_mode == ErrorMode::FailFast || err.is_cancelled() {
            return Err(err);
        }

        tracing::warn!(error = %err, "plugin failed, continuing");
        self.report.errors.push(err);
        Ok(())
    }
}

impl TreeVisitor for Dispatcher<'_, '_> {
    fn visit_tree(&mut self, language: &Arc<Language>, tree: ParseTree) -> Result<()> {
        self.report.trees += 1;
        let code = language.code();

        for idx in 0..self.plugins.len() {
            let plugin = &mut self.plugins[idx];
            if !plugin.supported_languages().contains(code) {
                continue;
            }
            let name = plugin.name().to_string();

            if let Some(file_plugin) = plugin.as_file_plugin() {
                tracing::debug!(plugin = %name, file = tree.file().name(), "file plugin");
                let result = file_plugin.analyze_source(self.cancel, tree.file());
                self.handle(name.clone(), &tree, result)?;
            }

            let plugin = &mut self.plugins[idx];
            if let Some(tree_plugin) = plugin.as_tree_plugin() {
                tracing::debug!(plugin = %name, file = tree.file().name(), "tree plugin");
                let result = tree_plugin.analyze_tree(self.cancel, &tree);
                self.handle(name, &tree, result)?;
            }
        }

        Ok(())
    }
}
