//! In-memory files.

use std::io::{Cursor, Read};
use std::sync::Arc;

use super::{File, Origin};
use crate::error::Result;

/// A file whose content lives in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    origin: Origin,
    content: Arc<[u8]>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, origin: Origin, content: impl Into<Vec<u8>>) -> Self {
        let content: Vec<u8> = content.into();
        Self {
            name: name.into(),
            origin,
            content: Arc::from(content),
        }
    }

    /// An app file with the given content.
    pub fn app(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Origin::App, content)
    }
}

impl File for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn reader(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.content.clone())))
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}
