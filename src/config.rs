//! Project configuration file.
//!
//! A project file names the directories to analyze and how to analyze them.
//! Relative directories are resolved against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fs::{LocalFileSystemConfig, SourceWalkerConfig};
use crate::lang::{languages_by_name, Language, LanguageCode};
use crate::plugin::{ErrorMode, ExecutorConfig};

/// File names probed, in order, when no explicit path is given.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["codewalk.yaml", ".codewalk.yaml"];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub app_directories: Vec<PathBuf>,
    #[serde(default)]
    pub import_directories: Vec<PathBuf>,
    /// Regular expressions matched against forward-slash paths.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub include_imports: bool,
    /// Language codes; empty selects every language.
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub error_mode: ErrorMode,
}

/// Command-line values layered over a project file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub app_directories: Vec<PathBuf>,
    pub import_directories: Vec<PathBuf>,
    pub exclude_patterns: Vec<String>,
    pub languages: Vec<String>,
    pub include_imports: bool,
    pub continue_on_error: bool,
}

impl ProjectConfig {
    /// Parse a project file from YAML.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Validation(format!("invalid config {}: {e}", path.display())))
    }

    /// First of [`CONFIG_FILE_NAMES`] present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the explicit file if given, else whatever `discover` finds in
    /// `dir`. Returns the config with the directory relative paths resolve
    /// against.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<(Self, PathBuf)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(dir),
        };
        let Some(path) = path else {
            return Ok((Self::default(), dir.to_path_buf()));
        };

        let config = Self::parse_file(&path)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded project config");
        Ok((config, base))
    }

    /// Layer command-line values over the file's.
    pub fn merge(&mut self, overrides: Overrides) {
        self.app_directories.extend(overrides.app_directories);
        self.import_directories.extend(overrides.import_directories);
        self.exclude_patterns.extend(overrides.exclude_patterns);
        if !overrides.languages.is_empty() {
            self.languages = overrides.languages;
        }
        self.include_imports |= overrides.include_imports;
        if overrides.continue_on_error {
            self.error_mode = ErrorMode::Continue;
        }
    }

    /// Selected languages in registry order.
    pub fn languages(&self) -> Result<Vec<Arc<Language>>> {
        languages_by_name(&self.languages)
    }

    pub fn file_system_config(&self, base: &Path) -> Result<LocalFileSystemConfig> {
        let resolve =
            |dirs: &[PathBuf]| -> Vec<PathBuf> { dirs.iter().map(|d| base.join(d)).collect() };
        Ok(LocalFileSystemConfig {
            app_directories: resolve(&self.app_directories),
            import_directories: resolve(&self.import_directories),
            exclude_patterns: self.compile_excludes()?,
        })
    }

    pub fn walker_config(&self) -> SourceWalkerConfig {
        SourceWalkerConfig {
            include_imports: self.include_imports,
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            error_mode: self.error_mode,
        }
    }

    fn compile_excludes(&self) -> Result<Vec<Regex>> {
        self.exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    Error::Validation(format!("invalid exclude pattern {p:?}: {e}"))
                })
            })
            .collect()
    }
}

/// Validate a merged configuration.
pub fn validate(config: &ProjectConfig) -> Result<()> {
    for name in &config.languages {
        name.parse::<LanguageCode>()
            .map_err(|_| Error::Validation(format!("unknown language {name:?}")))?;
    }

    config.compile_excludes()?;

    if config.app_directories.is_empty() {
        return Err(Error::Validation(
            "no app directories given (use --dir or app_directories)".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
app_directories: ["src"]
import_directories: [".venv/lib/python3.12/site-packages"]
exclude_patterns: ["/node_modules/"]
include_imports: true
languages: ["python", "javascript"]
error_mode: continue
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app_directories, vec![PathBuf::from("src")]);
        assert!(config.include_imports);
        assert_eq!(config.error_mode, ErrorMode::Continue);
        assert_eq!(config.languages().unwrap().len(), 2);
        validate(&config).unwrap();
    }

    #[test]
    fn test_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("version: '1'\n").unwrap();
        assert_eq!(config.error_mode, ErrorMode::FailFast);
        assert!(!config.include_imports);
        assert_eq!(config.languages().unwrap().len(), LanguageCode::ALL.len());
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = ProjectConfig {
            app_directories: vec![PathBuf::from("src")],
            languages: vec!["cobol".to_string()],
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("cobol"));

        config.languages.clear();
        config.exclude_patterns = vec!["(".to_string()];
        assert!(matches!(validate(&config), Err(Error::Validation(_))));

        config.exclude_patterns.clear();
        config.app_directories.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("no app directories"));
    }

    #[test]
    fn test_discover_and_resolve_against_config_dir() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(
            project.join(".codewalk.yaml"),
            "version: '1'\napp_directories: [src]\nexclude_patterns: ['\\.git/']\n",
        )
        .unwrap();

        let (config, base) = ProjectConfig::load(None, &project).unwrap();
        assert_eq!(base, project);

        let fs_config = config.file_system_config(&base).unwrap();
        assert_eq!(fs_config.app_directories, vec![project.join("src")]);
        assert_eq!(fs_config.exclude_patterns.len(), 1);
    }

    #[test]
    fn test_load_without_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, base) = ProjectConfig::load(None, temp.path()).unwrap();
        assert!(config.app_directories.is_empty());
        assert_eq!(base, temp.path());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        let err = ProjectConfig::load(Some(&missing), temp.path()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = ProjectConfig {
            app_directories: vec![PathBuf::from("src")],
            languages: vec!["go".to_string()],
            ..Default::default()
        };
        config.merge(Overrides {
            app_directories: vec![PathBuf::from("/abs/lib")],
            languages: vec!["python".to_string()],
            continue_on_error: true,
            ..Default::default()
        });

        assert_eq!(config.app_directories.len(), 2);
        assert_eq!(config.languages, vec!["python"]);
        assert_eq!(config.executor_config().error_mode, ErrorMode::Continue);
        assert!(!config.walker_config().include_imports);

        let fs_config = config.file_system_config(Path::new("/base")).unwrap();
        assert_eq!(
            fs_config.app_directories,
            vec![PathBuf::from("/base/src"), PathBuf::from("/abs/lib")]
        );
    }
}
