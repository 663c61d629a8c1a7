//! Codewalk - multi-language source analysis pipeline.
//!
//! Codewalk enumerates application and third-party source files, parses
//! them with tree-sitter and hands each parse tree to analyzer plugins.
//!
//! # Architecture
//!
//! - `fs`: import-aware file systems and the language-filtered source walker
//! - `lang`: language registry, import records and per-language resolvers
//! - `parser`: tree-sitter parsing and the parse-tree walker
//! - `plugin`: plugin traits, the executor, dependency usage and comment
//!   stripping analyzers
//! - `callgraph`: the embedded call signature catalog and the call matcher
//! - `config`: YAML project configuration
//! - `report`: output formatting (text, JSON)
//!
//! # Example
//!
//! ```no_run
//! use codewalk::fs::{LocalFileSystem, LocalFileSystemConfig, SourceWalker, SourceWalkerConfig};
//! use codewalk::lang::all_languages;
//! use codewalk::parser::{TreeWalker, WalkingParser};
//! use tokio_util::sync::CancellationToken;
//!
//! let fs = LocalFileSystem::new(LocalFileSystemConfig {
//!     app_directories: vec!["src".into()],
//!     ..Default::default()
//! });
//! let walker = WalkingParser::new(SourceWalker::new(SourceWalkerConfig::default(), all_languages()));
//! walker.walk(&CancellationToken::new(), &fs, &mut |lang: &std::sync::Arc<codewalk::lang::Language>, tree: codewalk::parser::ParseTree| -> codewalk::Result<()> {
//!     let imports = lang.resolvers().resolve_imports(&tree)?;
//!     println!("{}: {} imports", tree.file().name(), imports.len());
//!     Ok(())
//! })?;
//! # Ok::<(), codewalk::Error>(())
//! ```

pub mod callgraph;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod lang;
pub mod parser;
pub mod plugin;
pub mod report;

pub use error::{Error, Result};
