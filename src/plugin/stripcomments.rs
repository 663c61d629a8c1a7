//! Comment stripping.
//!
//! Reproduces each file's bytes with every comment node cut out. Whitespace
//! around a comment is left alone, so line numbers of the remaining code do
//! not move.

use std::ops::Range;

use phf::phf_set;
use tokio_util::sync::CancellationToken;

use super::{Plugin, SupportedLanguages, TreePlugin};
use crate::error::Result;
use crate::fs::{check_cancelled, FileRef};
use crate::parser::ParseTree;

static COMMENT_NODE_KINDS: phf::Set<&'static str> = phf_set! {
    "comment",
    "line_comment",
    "block_comment",
};

/// Receives the stripped bytes of each file.
pub type StrippedSink<'a> = dyn FnMut(&FileRef, Vec<u8>) -> Result<()> + 'a;

pub struct StripCommentsPlugin<'a> {
    sink: Box<StrippedSink<'a>>,
}

impl<'a> StripCommentsPlugin<'a> {
    pub const NAME: &'static str = "strip-comments";

    pub fn new(sink: impl FnMut(&FileRef, Vec<u8>) -> Result<()> + 'a) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }
}

impl Plugin for StripCommentsPlugin<'_> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supported_languages(&self) -> SupportedLanguages {
        SupportedLanguages::All
    }

    fn as_tree_plugin(&mut self) -> Option<&mut dyn TreePlugin> {
        Some(self)
    }
}

impl TreePlugin for StripCommentsPlugin<'_> {
    fn analyze_tree(&mut self, cancel: &CancellationToken, tree: &ParseTree) -> Result<()> {
        check_cancelled(cancel)?;
        let comments = comment_ranges(tree);
        tracing::debug!(
            file = tree.file().name(),
            comments = comments.len(),
            "stripping comments"
        );
        (self.sink)(tree.file(), strip_ranges(tree.source(), &comments))
    }
}

/// Byte ranges of every comment node, in source order.
fn comment_ranges(tree: &ParseTree) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut cursor = tree.root_node().walk();

    loop {
        let node = cursor.node();
        if COMMENT_NODE_KINDS.contains(node.kind()) {
            ranges.push(node.byte_range());
        } else if cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return ranges;
            }
        }
    }
}

fn strip_ranges(source: &[u8], ranges: &[Range<usize>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(source.len());
    let mut pos = 0;
    for range in ranges {
        if range.start < pos {
            continue;
        }
        out.extend_from_slice(&source[pos..range.start]);
        pos = range.end;
    }
    out.extend_from_slice(&source[pos.min(source.len())..]);
    out
}
