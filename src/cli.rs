//! Command-line interface for codewalk.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::callgraph::{self, Catalog, SignatureMatch, SignatureMatcherPlugin};
use crate::config::{self, Overrides, ProjectConfig};
use crate::error::{Error, Result};
use crate::fs::{FileRef, LocalFileSystem, SourceWalker};
use crate::lang::{get_language, Language, LanguageCode};
use crate::parser::{ParseTree, TreeWalker, WalkingParser};
use crate::plugin::depsusage::{DependencyUsagePlugin, UsageDiagnostics};
use crate::plugin::stripcomments::StripCommentsPlugin;
use crate::plugin::{Plugin, PluginExecutor};
use crate::report::{self, CallsReport, FileImports, Format, UsageReport, WalkEntry};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Multi-language source analysis.
///
/// Codewalk walks application (and optionally third-party) source trees,
/// parses every file with tree-sitter and runs analyzers over the trees:
/// import resolution, dependency usage, call signature matching and comment
/// stripping.
#[derive(Parser)]
#[command(name = "codewalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every parsed source file
    Walk(ReportArgs),
    /// Print the imports of every source file
    Imports(ReportArgs),
    /// Report used and unused imports of Python files
    Usage(UsageArgs),
    /// Find calls matching the signature catalog
    Calls(ReportArgs),
    /// Print sources with comments removed
    Strip(SourceArgs),
    /// List the embedded call signature catalog
    Signatures(SignaturesArgs),
}

/// Where to find sources and how to walk them.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Application source directory (repeatable)
    #[arg(short, long = "dir")]
    pub dirs: Vec<PathBuf>,

    /// Language to analyze (repeatable, default: all)
    #[arg(short, long = "lang")]
    pub langs: Vec<String>,

    /// Third-party source directory (repeatable)
    #[arg(long = "import-dir")]
    pub import_dirs: Vec<PathBuf>,

    /// Regular expression of paths to skip (repeatable)
    #[arg(short, long = "exclude")]
    pub excludes: Vec<String>,

    /// Also walk the import directories
    #[arg(long)]
    pub include_imports: bool,

    /// Record plugin failures and keep going
    #[arg(long)]
    pub continue_on_error: bool,

    /// Path to project YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    fn overrides(&self, cwd: &Path) -> Overrides {
        let absolute = |dirs: &[PathBuf]| -> Vec<PathBuf> { dirs.iter().map(|d| cwd.join(d)).collect() };
        Overrides {
            app_directories: absolute(&self.dirs),
            import_directories: absolute(&self.import_dirs),
            exclude_patterns: self.excludes.clone(),
            languages: self.langs.clone(),
            include_imports: self.include_imports,
            continue_on_error: self.continue_on_error,
        }
    }
}

#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
    pub format: Format,
}

#[derive(Args)]
pub struct UsageArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Exit with status 1 when any import is unused
    #[arg(long)]
    pub fail_on_unused: bool,
}

#[derive(Args)]
pub struct SignaturesArgs {
    /// Only list signatures with a matcher for this language
    #[arg(short, long = "lang")]
    pub lang: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
    pub format: Format,
}

/// Merged configuration ready to run.
struct Session {
    config: ProjectConfig,
    fs: LocalFileSystem,
    languages: Vec<Arc<Language>>,
}

impl Session {
    fn prepare(args: &SourceArgs) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let (mut config, base) = ProjectConfig::load(args.config.as_deref(), &cwd)?;
        config.merge(args.overrides(&cwd));
        config::validate(&config)?;

        let fs = LocalFileSystem::new(config.file_system_config(&base)?);
        let languages = config.languages()?;
        tracing::debug!(
            languages = languages.len(),
            app_directories = fs.config().app_directories.len(),
            "session prepared"
        );
        Ok(Self {
            config,
            fs,
            languages,
        })
    }

    fn walker(&self, languages: Vec<Arc<Language>>) -> WalkingParser {
        WalkingParser::new(SourceWalker::new(self.config.walker_config(), languages))
    }

    fn executor<'p>(
        &self,
        languages: Vec<Arc<Language>>,
        plugins: Vec<Box<dyn Plugin + 'p>>,
    ) -> PluginExecutor<'p, WalkingParser> {
        PluginExecutor::with_config(
            self.walker(languages),
            plugins,
            self.config.executor_config(),
        )
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli, cancel: &CancellationToken) -> anyhow::Result<i32> {
    run_with_catalog(cli, cancel, callgraph::catalog)
}

/// A broken catalog is a build defect, so every command refuses to start.
fn run_with_catalog(
    cli: &Cli,
    cancel: &CancellationToken,
    load_catalog: impl FnOnce() -> Result<&'static Catalog>,
) -> anyhow::Result<i32> {
    load_catalog()?;

    match &cli.command {
        Commands::Walk(args) => run_walk(args, cancel),
        Commands::Imports(args) => run_imports(args, cancel),
        Commands::Usage(args) => run_usage(args, cancel),
        Commands::Calls(args) => run_calls(args, cancel),
        Commands::Strip(args) => run_strip(args, cancel),
        Commands::Signatures(args) => run_signatures(args),
    }
}

/// Run the walk command.
pub fn run_walk(args: &ReportArgs, cancel: &CancellationToken) -> anyhow::Result<i32> {
    let session = Session::prepare(&args.source)?;

    let mut entries = Vec::new();
    session.walker(session.languages.clone()).walk(
        cancel,
        &session.fs,
        &mut |language: &Arc<Language>, tree: ParseTree| -> Result<()> {
            entries.push(WalkEntry {
                language: language.code(),
                origin: tree.file().origin(),
                name: tree.file().name().to_string(),
            });
            Ok(())
        },
    )?;

    report::write_walk(&mut std::io::stdout().lock(), args.format, &entries)?;
    Ok(EXIT_SUCCESS)
}

/// Run the imports command.
pub fn run_imports(args: &ReportArgs, cancel: &CancellationToken) -> anyhow::Result<i32> {
    let session = Session::prepare(&args.source)?;

    let mut files = Vec::new();
    session.walker(session.languages.clone()).walk(
        cancel,
        &session.fs,
        &mut |language: &Arc<Language>, tree: ParseTree| -> Result<()> {
            let imports = language.resolvers().resolve_imports(&tree)?;
            files.push(FileImports {
                file: tree.file().name().to_string(),
                language: language.code(),
                imports,
            });
            Ok(())
        },
    )?;

    report::write_imports(&mut std::io::stdout().lock(), args.format, &files)?;
    Ok(EXIT_SUCCESS)
}

/// Run the usage command.
pub fn run_usage(args: &UsageArgs, cancel: &CancellationToken) -> anyhow::Result<i32> {
    let session = Session::prepare(&args.report.source)?;
    // The analyzer only understands Python; skip parsing everything else.
    let languages = if session.languages.iter().any(|l| l.code() == LanguageCode::Python) {
        vec![get_language(LanguageCode::Python.as_str())?]
    } else {
        tracing::warn!("python is not among the selected languages, nothing to analyze");
        Vec::new()
    };

    let mut files: Vec<UsageDiagnostics> = Vec::new();
    let execution = {
        let plugin = DependencyUsagePlugin::new(|_: &FileRef, diagnostics: UsageDiagnostics| {
            files.push(diagnostics);
            Ok(())
        });
        let mut executor = session.executor(languages, vec![Box::new(plugin)]);
        executor.execute(cancel, &session.fs)?
    };

    let report = UsageReport {
        files,
        errors: execution.errors.iter().map(|e| e.to_string()).collect(),
    };
    report::write_usage(&mut std::io::stdout().lock(), args.report.format, &report)?;

    if !execution.is_clean() {
        return Ok(EXIT_ERROR);
    }
    if args.fail_on_unused && report.unused_count() > 0 {
        return Ok(EXIT_FAILED);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the calls command.
pub fn run_calls(args: &ReportArgs, cancel: &CancellationToken) -> anyhow::Result<i32> {
    let session = Session::prepare(&args.source)?;
    let catalog = callgraph::catalog()?;

    let mut matches: Vec<SignatureMatch> = Vec::new();
    let execution = {
        let plugin = SignatureMatcherPlugin::new(catalog, |_: &FileRef, found: SignatureMatch| {
            matches.push(found);
            Ok(())
        });
        let mut executor = session.executor(session.languages.clone(), vec![Box::new(plugin)]);
        executor.execute(cancel, &session.fs)?
    };

    let report = CallsReport {
        matches,
        errors: execution.errors.iter().map(|e| e.to_string()).collect(),
    };
    report::write_calls(&mut std::io::stdout().lock(), args.format, &report)?;

    Ok(if execution.is_clean() {
        EXIT_SUCCESS
    } else {
        EXIT_ERROR
    })
}

/// Run the strip command.
pub fn run_strip(args: &SourceArgs, cancel: &CancellationToken) -> anyhow::Result<i32> {
    let session = Session::prepare(args)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let execution = {
        let plugin = StripCommentsPlugin::new(|file: &FileRef, stripped: Vec<u8>| {
            report::write_stripped(&mut out, file.name(), &stripped)
                .map_err(|e| Error::io(file.name(), e))
        });
        let mut executor = session.executor(session.languages.clone(), vec![Box::new(plugin)]);
        executor.execute(cancel, &session.fs)?
    };
    out.flush()?;

    for err in &execution.errors {
        eprintln!("Error: {err}");
    }
    Ok(if execution.is_clean() {
        EXIT_SUCCESS
    } else {
        EXIT_ERROR
    })
}

/// Run the signatures command.
pub fn run_signatures(args: &SignaturesArgs) -> anyhow::Result<i32> {
    let catalog = callgraph::catalog()?;

    let signatures = match &args.lang {
        Some(lang) => catalog.for_language(lang.parse::<LanguageCode>()?),
        None => catalog.signatures.iter().collect(),
    };

    report::write_signatures(&mut std::io::stdout().lock(), args.format, catalog, &signatures)?;
    Ok(EXIT_SUCCESS)
}
