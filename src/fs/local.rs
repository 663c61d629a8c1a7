//! Directory-backed file system.

use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::{check_cancelled, File, FileRef, FileSink, FileSystem, Origin};
use crate::error::{Error, Result};

/// A file on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    origin: Origin,
}

impl LocalFile {
    pub fn new(path: PathBuf, name: String, origin: Origin) -> Self {
        Self { path, name, origin }
    }

    /// Physical location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl File for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn reader(&self) -> Result<Box<dyn Read + Send>> {
        let file = std::fs::File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        Ok(Box::new(file))
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}

/// Roots and filters for a `LocalFileSystem`.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemConfig {
    /// Directories holding first-party sources.
    pub app_directories: Vec<PathBuf>,
    /// Directories holding third-party sources imported by the application.
    pub import_directories: Vec<PathBuf>,
    /// Paths (files or directories) matching any pattern are skipped.
    pub exclude_patterns: Vec<Regex>,
}

/// File system rooted at local app and import directories.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    config: LocalFileSystemConfig,
}

impl LocalFileSystem {
    pub fn new(config: LocalFileSystemConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalFileSystemConfig {
        &self.config
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.config.exclude_patterns.is_empty() {
            return false;
        }
        let path_str = slash_path(path);
        self.config
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(&path_str))
    }

    fn enumerate_dir(
        &self,
        cancel: &CancellationToken,
        root: &Path,
        origin: Origin,
        sink: &mut FileSink<'_>,
    ) -> Result<()> {
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()));

        for entry in walker {
            check_cancelled(cancel)?;

            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                Error::io(path, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let rel = path.strip_prefix(root).unwrap_or(path);
            let file = LocalFile::new(path.to_path_buf(), slash_path(rel), origin);

            tracing::trace!(name = %file.name, %origin, "enumerated file");
            sink(Arc::new(file))?;
        }

        Ok(())
    }

    fn find_in_dir(&self, root: &Path, name: &str, origin: Origin) -> Option<FileRef> {
        let full_path = root.join(name);
        match std::fs::metadata(&full_path) {
            Ok(metadata) if metadata.is_file() => {
                let rel = full_path.strip_prefix(root).unwrap_or(&full_path);
                Some(Arc::new(LocalFile::new(
                    full_path.clone(),
                    slash_path(rel),
                    origin,
                )))
            }
            _ => None,
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn enumerate_app(&self, cancel: &CancellationToken, sink: &mut FileSink<'_>) -> Result<()> {
        for dir in &self.config.app_directories {
            self.enumerate_dir(cancel, dir, Origin::App, sink)?;
        }
        Ok(())
    }

    fn enumerate_imports(
        &self,
        cancel: &CancellationToken,
        sink: &mut FileSink<'_>,
    ) -> Result<()> {
        for dir in &self.config.import_directories {
            self.enumerate_dir(cancel, dir, Origin::Import, sink)?;
        }
        Ok(())
    }

    fn find(&self, cancel: &CancellationToken, name: &str) -> Result<FileRef> {
        check_cancelled(cancel)?;

        // Names are relative to a root and may not leave it.
        let confined = Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            return Err(Error::NotFound(name.to_string()));
        }

        let roots = self
            .config
            .app_directories
            .iter()
            .map(|d| (d, Origin::App))
            .chain(
                self.config
                    .import_directories
                    .iter()
                    .map(|d| (d, Origin::Import)),
            );

        for (dir, origin) in roots {
            if let Some(file) = self.find_in_dir(dir, name, origin) {
                return Ok(file);
            }
        }

        Err(Error::NotFound(name.to_string()))
    }
}

/// Render a path with `/` separators regardless of the host separator.
fn slash_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::Prefix(p) => p.as_os_str().to_string_lossy(),
            Component::CurDir => continue,
            Component::ParentDir => "..".into(),
            Component::Normal(s) => s.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}
