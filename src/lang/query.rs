//! Compiled tree-sitter queries shared by the resolvers.

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::error::{Error, Result};
use crate::parser::ParseTree;

/// A query compiled on first use against the tree's grammar.
pub(crate) struct LazyQuery {
    source: &'static str,
    compiled: OnceCell<Query>,
}

impl LazyQuery {
    pub(crate) const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceCell::new(),
        }
    }

    fn get(&self, tree: &ParseTree) -> Result<&Query> {
        self.compiled.get_or_try_init(|| {
            Query::new(tree.language().grammar(), self.source).map_err(|source| Error::Query {
                language: tree.language().name().to_string(),
                source,
            })
        })
    }

    /// Run the query over the whole tree and collect every capture as a
    /// `(capture name, node)` pair, ordered by source position.
    pub(crate) fn captures<'q, 't>(
        &'q self,
        tree: &'t ParseTree,
    ) -> Result<Vec<(&'q str, Node<'t>)>> {
        let query = self.get(tree)?;
        let names = query.capture_names();

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, tree.root_node(), tree.source());

        let mut captured = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                captured.push((names[capture.index as usize], capture.node));
            }
        }

        captured.sort_by_key(|(_, node)| node.start_byte());
        captured.dedup_by_key(|(_, node)| node.id());
        Ok(captured)
    }
}

impl std::fmt::Debug for LazyQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyQuery")
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}

/// Text of a string literal node without its surrounding quotes.
pub(crate) fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// 1-based line of a node.
pub(crate) fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}
