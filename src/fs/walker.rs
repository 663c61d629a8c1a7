//! Language-aware source file walker.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{FileRef, FileSystem};
use crate::error::{Error, Result};
use crate::lang::Language;

/// Receives every file the walker accepts.
pub trait SourceVisitor {
    /// Visit one file. `languages` is the walker's full language set.
    fn visit_file(&mut self, languages: &[Arc<Language>], file: FileRef) -> Result<()>;
}

impl<F> SourceVisitor for F
where
    F: FnMut(&[Arc<Language>], FileRef) -> Result<()>,
{
    fn visit_file(&mut self, languages: &[Arc<Language>], file: FileRef) -> Result<()> {
        self(languages, file)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SourceWalkerConfig {
    /// Also walk import roots after app roots.
    pub include_imports: bool,
}

/// Streams files whose extension belongs to one of its languages.
#[derive(Debug, Clone)]
pub struct SourceWalker {
    config: SourceWalkerConfig,
    languages: Vec<Arc<Language>>,
}

impl SourceWalker {
    pub fn new(config: SourceWalkerConfig, languages: Vec<Arc<Language>>) -> Self {
        Self { config, languages }
    }

    /// Walker over a single language.
    pub fn for_language(config: SourceWalkerConfig, language: Arc<Language>) -> Self {
        Self::new(config, vec![language])
    }

    pub fn config(&self) -> SourceWalkerConfig {
        self.config
    }

    pub fn languages(&self) -> &[Arc<Language>] {
        &self.languages
    }

    /// Walk app files, then import files if configured.
    ///
    /// Visitor errors abort the walk and propagate unchanged; failures of the
    /// file system itself are wrapped with the origin being enumerated.
    pub fn walk(
        &self,
        cancel: &CancellationToken,
        fs: &dyn FileSystem,
        visitor: &mut dyn SourceVisitor,
    ) -> Result<()> {
        let mut visitor_error: Option<Error> = None;

        let result = fs.enumerate_app(cancel, &mut |file| {
            self.dispatch(file, visitor, &mut visitor_error)
        });
        self.finish("app", result, &mut visitor_error)?;

        if self.config.include_imports {
            let result = fs.enumerate_imports(cancel, &mut |file| {
                self.dispatch(file, visitor, &mut visitor_error)
            });
            self.finish("import", result, &mut visitor_error)?;
        }

        Ok(())
    }

    fn accepts(&self, name: &str) -> bool {
        self.languages.iter().any(|lang| lang.matches_file(name))
    }

    fn dispatch(
        &self,
        file: FileRef,
        visitor: &mut dyn SourceVisitor,
        visitor_error: &mut Option<Error>,
    ) -> Result<()> {
        if !self.accepts(file.name()) {
            return Ok(());
        }

        tracing::debug!(file = file.name(), origin = %file.origin(), "visiting file");
        match visitor.visit_file(&self.languages, file) {
            Ok(()) => Ok(()),
            Err(err) => {
                // Park the real error; the enumerator only needs to stop.
                *visitor_error = Some(err);
                Err(Error::Cancelled)
            }
        }
    }

    fn finish(
        &self,
        origin: &'static str,
        result: Result<()>,
        visitor_error: &mut Option<Error>,
    ) -> Result<()> {
        if let Some(err) = visitor_error.take() {
            return Err(err);
        }
        result.map_err(|source| match source {
            Error::Cancelled => Error::Cancelled,
            source => Error::Walk {
                origin,
                source: Box::new(source),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{LocalFileSystem, LocalFileSystemConfig};
    use crate::lang::{get_language, LanguageCode};
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn languages() -> Vec<Arc<Language>> {
        vec![
            get_language("python").unwrap(),
            get_language("javascript").unwrap(),
        ]
    }

    fn local_fs(temp: &TempDir) -> LocalFileSystem {
        LocalFileSystem::new(LocalFileSystemConfig {
            app_directories: vec![temp.path().join("app")],
            import_directories: vec![temp.path().join("vendor")],
            ..Default::default()
        })
    }

    #[test]
    fn test_walk_filters_by_extension() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app/a.py");
        write(temp.path(), "app/b.js");
        write(temp.path(), "app/c.txt");

        let walker = SourceWalker::new(SourceWalkerConfig::default(), languages());
        let mut seen = Vec::new();
        walker
            .walk(
                &CancellationToken::new(),
                &local_fs(&temp),
                &mut |langs: &[Arc<Language>], file: FileRef| -> Result<()> {
                    assert_eq!(langs.len(), 2);
                    seen.push(file.name().to_string());
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(seen, vec!["a.py", "b.js"]);
    }

    #[test]
    fn test_walk_imports_only_when_enabled() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app/main.py");
        write(temp.path(), "vendor/requests/api.py");

        let fs = local_fs(&temp);
        let cancel = CancellationToken::new();

        let mut names = Vec::new();
        SourceWalker::new(SourceWalkerConfig::default(), languages())
            .walk(&cancel, &fs, &mut |_: &[Arc<Language>], f: FileRef| -> Result<()> {
                names.push((f.name().to_string(), f.is_import()));
                Ok(())
            })
            .unwrap();
        assert_eq!(names, vec![("main.py".to_string(), false)]);

        names.clear();
        SourceWalker::new(
            SourceWalkerConfig {
                include_imports: true,
            },
            languages(),
        )
        .walk(&cancel, &fs, &mut |_: &[Arc<Language>], f: FileRef| -> Result<()> {
            names.push((f.name().to_string(), f.is_import()));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            names,
            vec![
                ("main.py".to_string(), false),
                ("requests/api.py".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_visitor_error_propagates_unchanged() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app/a.py");
        write(temp.path(), "app/b.py");

        let walker = SourceWalker::for_language(
            SourceWalkerConfig::default(),
            get_language("python").unwrap(),
        );
        let mut calls = 0;
        let err = walker
            .walk(
                &CancellationToken::new(),
                &local_fs(&temp),
                &mut |_: &[Arc<Language>], _: FileRef| -> Result<()> {
                    calls += 1;
                    Err(Error::NotFound("boom".to_string()))
                },
            )
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_enumeration_failure_is_wrapped_with_origin() {
        let temp = TempDir::new().unwrap();
        let walker = SourceWalker::new(SourceWalkerConfig::default(), languages());

        let err = walker
            .walk(
                &CancellationToken::new(),
                &local_fs(&temp),
                &mut |_: &[Arc<Language>], _: FileRef| -> Result<()> { Ok(()) },
            )
            .unwrap_err();

        match err {
            Error::Walk { origin, .. } => assert_eq!(origin, "app"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cancelled_walk() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app/a.py");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let walker = SourceWalker::new(SourceWalkerConfig::default(), languages());
        let err = walker
            .walk(
                &cancel,
                &local_fs(&temp),
                &mut |_: &[Arc<Language>], _: FileRef| -> Result<()> { Ok(()) },
            )
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_accepts_all_registered_extensions() {
        let walker = SourceWalker::new(
            SourceWalkerConfig::default(),
            vec![get_language("typescript").unwrap()],
        );
        assert_eq!(walker.languages()[0].code(), LanguageCode::TypeScript);
        assert!(walker.accepts("src/index.ts"));
        assert!(walker.accepts("src/index.mts"));
        assert!(!walker.accepts("src/index.js"));
    }
}
