//! Import-aware file system abstraction.
//!
//! A file system distinguishes first-party ("app") sources from third-party
//! ("import") sources. Enumeration is callback driven: the sink receives each
//! file and may abort the traversal by returning an error.
//!
//! - `File`: a named, readable source file tagged with its origin
//! - `FileSystem`: enumeration and lookup over app and import roots
//! - `LocalFileSystem`: directory-backed implementation
//! - `SourceWalker`: enumerates files belonging to a language set

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

mod local;
mod memory;
mod walker;

pub use local::{LocalFile, LocalFileSystem, LocalFileSystemConfig};
pub use memory::MemoryFile;
pub use walker::{SourceVisitor, SourceWalker, SourceWalkerConfig};

/// Where a file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Under an application root (first party).
    App,
    /// Under an import root (third party).
    Import,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::App => "app",
            Origin::Import => "import",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source file produced by enumeration or lookup.
///
/// Files are immutable and cheap to share; the core never caches them.
pub trait File: fmt::Debug + Send + Sync {
    /// Path relative to the root that produced the file, `/` separated.
    fn name(&self) -> &str;

    /// Open the file for reading.
    fn reader(&self) -> Result<Box<dyn Read + Send>>;

    fn origin(&self) -> Origin;

    fn is_app(&self) -> bool {
        self.origin() == Origin::App
    }

    fn is_import(&self) -> bool {
        self.origin() == Origin::Import
    }
}

/// Shared handle to a file.
pub type FileRef = Arc<dyn File>;

/// Callback receiving enumerated files.
pub type FileSink<'a> = dyn FnMut(FileRef) -> Result<()> + 'a;

/// Enumeration and lookup over app and import roots.
pub trait FileSystem {
    /// Enumerate application source files.
    fn enumerate_app(&self, cancel: &CancellationToken, sink: &mut FileSink<'_>) -> Result<()>;

    /// Enumerate third-party source files.
    fn enumerate_imports(&self, cancel: &CancellationToken, sink: &mut FileSink<'_>)
        -> Result<()>;

    /// Find a file by its root-relative name. App roots win over import roots.
    fn find(&self, cancel: &CancellationToken, name: &str) -> Result<FileRef>;

    /// Enumerate every file: app files first, then import files.
    fn enumerate(&self, cancel: &CancellationToken, sink: &mut FileSink<'_>) -> Result<()> {
        self.enumerate_app(cancel, sink)?;
        self.enumerate_imports(cancel, sink)
    }
}

/// Fail with `Cancelled` if the token has fired.
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}
