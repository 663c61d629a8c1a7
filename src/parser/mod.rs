//! Parsing of source files into reusable parse trees.
//!
//! This module provides:
//! - `ParseTree`: a syntax tree bundled with its bytes, file and language
//! - `Parser`: picks the language for a file and runs its grammar
//! - `TreeWalker` / `WalkingParser`: a source walker that hands out parse trees

use std::io::Read;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::fs::{check_cancelled, FileRef};
use crate::lang::Language;

mod walker;

pub use walker::{TreeVisitor, TreeWalker, WalkingParser};

/// Bytes handed to the grammar per read callback. Cancellation is observed
/// between chunks.
const PARSE_CHUNK: usize = 4096;

/// A concrete syntax tree bound to the file, bytes and language it came from.
pub struct ParseTree {
    tree: tree_sitter::Tree,
    source: Vec<u8>,
    file: FileRef,
    language: Arc<Language>,
}

impl ParseTree {
    pub fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Raw bytes the tree was parsed from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn file(&self) -> &FileRef {
        &self.file
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    /// Source text covered by `node`; empty if it is not valid UTF-8.
    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

impl std::fmt::Debug for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseTree")
            .field("file", &self.file.name())
            .field("language", &self.language.name())
            .field("bytes", &self.source.len())
            .finish()
    }
}

/// The first language, in order, whose extensions match the file name.
pub fn select_language<'a>(
    languages: &'a [Arc<Language>],
    name: &str,
) -> Option<&'a Arc<Language>> {
    languages.iter().find(|lang| lang.matches_file(name))
}

/// Parses files with the grammar of the matching language.
#[derive(Debug, Clone)]
pub struct Parser {
    languages: Vec<Arc<Language>>,
}

impl Parser {
    pub fn new(languages: Vec<Arc<Language>>) -> Self {
        Self { languages }
    }

    pub fn languages(&self) -> &[Arc<Language>] {
        &self.languages
    }

    /// Read and parse a file with the first language that accepts it.
    pub fn parse(&self, cancel: &CancellationToken, file: FileRef) -> Result<ParseTree> {
        let language = select_language(&self.languages, file.name())
            .cloned()
            .ok_or_else(|| no_language(&file))?;
        parse_file(cancel, language, file)
    }
}

fn no_language(file: &FileRef) -> Error {
    Error::Parse {
        file: file.name().to_string(),
        reason: "no registered language handles this file".to_string(),
    }
}

/// Read a file fully and parse it as `language`.
pub fn parse_file(
    cancel: &CancellationToken,
    language: Arc<Language>,
    file: FileRef,
) -> Result<ParseTree> {
    check_cancelled(cancel)?;
    let mut source = Vec::new();
    file.reader()?
        .read_to_end(&mut source)
        .map_err(|e| Error::io(file.name(), e))?;

    parse_source(cancel, language, file, source)
}

/// Parse bytes already in memory as `language`.
pub fn parse_source(
    cancel: &CancellationToken,
    language: Arc<Language>,
    file: FileRef,
    source: Vec<u8>,
) -> Result<ParseTree> {
    let parse_error = |reason: String| Error::Parse {
        file: file.name().to_string(),
        reason,
    };

    let mut ts = tree_sitter::Parser::new();
    ts.set_language(language.grammar())
        .map_err(|e| parse_error(e.to_string()))?;

    check_cancelled(cancel)?;

    let mut cancelled = false;
    let tree = ts.parse_with(
        &mut |offset: usize, _| -> &[u8] {
            if cancel.is_cancelled() {
                cancelled = true;
                return &[];
            }
            let end = source.len().min(offset.saturating_add(PARSE_CHUNK));
            source.get(offset..end).unwrap_or(&[])
        },
        None,
    );

    if cancelled {
        return Err(Error::Cancelled);
    }
    let tree = tree.ok_or_else(|| parse_error("grammar returned no tree".to_string()))?;

    tracing::debug!(
        file = file.name(),
        language = language.name(),
        bytes = source.len(),
        has_error = tree.root_node().has_error(),
        "parsed file"
    );

    Ok(ParseTree {
        tree,
        source,
        file,
        language,
    })
}
