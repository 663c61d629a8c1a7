//! Tree walking: a source walker whose visitor receives parse trees.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{no_language, parse_file, select_language, ParseTree};
use crate::error::Result;
use crate::fs::{FileRef, FileSystem, SourceVisitor, SourceWalker};
use crate::lang::Language;

/// Receives a parse tree for every walked file.
pub trait TreeVisitor {
    /// The tree is handed over by value and dropped once the visitor returns.
    fn visit_tree(&mut self, language: &Arc<Language>, tree: ParseTree) -> Result<()>;
}

impl<F> TreeVisitor for F
where
    F: FnMut(&Arc<Language>, ParseTree) -> Result<()>,
{
    fn visit_tree(&mut self, language: &Arc<Language>, tree: ParseTree) -> Result<()> {
        self(language, tree)
    }
}

/// Produces parse trees from a file system.
pub trait TreeWalker {
    fn walk(
        &self,
        cancel: &CancellationToken,
        fs: &dyn FileSystem,
        visitor: &mut dyn TreeVisitor,
    ) -> Result<()>;
}

/// A `SourceWalker` that parses every accepted file with the walker's
/// own language set.
#[derive(Debug, Clone)]
pub struct WalkingParser {
    walker: SourceWalker,
}

impl WalkingParser {
    pub fn new(walker: SourceWalker) -> Self {
        Self { walker }
    }

    pub fn walker(&self) -> &SourceWalker {
        &self.walker
    }
}

impl TreeWalker for WalkingParser {
    fn walk(
        &self,
        cancel: &CancellationToken,
        fs: &dyn FileSystem,
        visitor: &mut dyn TreeVisitor,
    ) -> Result<()> {
        let mut adapter = ParsingVisitor {
            cancel,
            inner: visitor,
        };
        self.walker.walk(cancel, fs, &mut adapter)
    }
}

/// Adapts a `TreeVisitor` to the `SourceVisitor` interface.
struct ParsingVisitor<'a> {
    cancel: &'a CancellationToken,
    inner: &'a mut dyn TreeVisitor,
}

impl SourceVisitor for ParsingVisitor<'_> {
    fn visit_file(&mut self, languages: &[Arc<Language>], file: FileRef) -> Result<()> {
        let language = select_language(languages, file.name())
            .cloned()
            .ok_or_else(|| no_language(&file))?;
        let tree = parse_file(self.cancel, language.clone(), file)?;
        self.inner.visit_tree(&language, tree)
    }
}
