//! Output formatting for codewalk results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use std::io::Write;

use clap::ValueEnum;
use colored::*;
use serde::Serialize;

use crate::callgraph::{Catalog, Signature, SignatureMatch};
use crate::fs::Origin;
use crate::lang::{Import, LanguageCode};
use crate::plugin::depsusage::UsageDiagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Pretty,
    Json,
}

/// One parsed file.
#[derive(Debug, Clone, Serialize)]
pub struct WalkEntry {
    pub language: LanguageCode,
    pub origin: Origin,
    pub name: String,
}

/// Imports resolved from one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileImports {
    pub file: String,
    pub language: LanguageCode,
    pub imports: Vec<Import>,
}

/// Dependency usage over a whole run.
#[derive(Debug, Default, Serialize)]
pub struct UsageReport {
    pub files: Vec<UsageDiagnostics>,
    /// Plugin errors collected in continue mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl UsageReport {
    pub fn unused_count(&self) -> usize {
        self.files.iter().map(|f| f.unused_modules().len()).sum()
    }
}

/// Signature matches over a whole run.
#[derive(Debug, Default, Serialize)]
pub struct CallsReport {
    pub matches: Vec<SignatureMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Serialize)]
struct JsonEnvelope<'a, T: Serialize> {
    version: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

fn write_json<W: Write, T: Serialize>(out: &mut W, body: &T) -> anyhow::Result<()> {
    let envelope = JsonEnvelope {
        version: env!("CARGO_PKG_VERSION"),
        body,
    };
    serde_json::to_writer_pretty(&mut *out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// walk
// =============================================================================

#[derive(Serialize)]
struct WalkBody<'a> {
    files: &'a [WalkEntry],
}

/// Tab-separated `<lang>\t<origin>\t<name>` lines, or a JSON document.
pub fn write_walk<W: Write>(out: &mut W, format: Format, entries: &[WalkEntry]) -> anyhow::Result<()> {
    match format {
        Format::Json => write_json(out, &WalkBody { files: entries }),
        Format::Pretty => {
            for entry in entries {
                writeln!(out, "{}\t{}\t{}", entry.language, entry.origin, entry.name)?;
            }
            Ok(())
        }
    }
}

// =============================================================================
// imports
// =============================================================================

#[derive(Serialize)]
struct ImportsBody<'a> {
    files: &'a [FileImports],
}

pub fn write_imports<W: Write>(
    out: &mut W,
    format: Format,
    files: &[FileImports],
) -> anyhow::Result<()> {
    if format == Format::Json {
        return write_json(out, &ImportsBody { files });
    }

    let total: usize = files.iter().map(|f| f.imports.len()).sum();
    writeln!(out)?;
    writeln!(
        out,
        "  {} ({} in {} files)",
        "Imports".bold(),
        total,
        files.len()
    )?;
    writeln!(out)?;

    for file in files.iter().filter(|f| !f.imports.is_empty()) {
        writeln!(out, "  {} {}", file.file.blue(), format!("[{}]", file.language).dimmed())?;
        for import in &file.imports {
            write!(out, "    {}", format!("{:>4}", import.line).dimmed())?;
            write!(out, "  {}", import.module_name)?;
            if let Some(item) = &import.module_item {
                write!(out, " {} {}", "item".dimmed(), item)?;
            }
            if import.is_wildcard {
                write!(out, " {}", "*".yellow())?;
            }
            if let Some(alias) = &import.module_alias {
                write!(out, " {} {}", "as".dimmed(), alias.cyan())?;
            }
            if let Some(hint) = &import.package_hint {
                write!(out, " {}", format!("({hint})").dimmed())?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

// =============================================================================
// usage
// =============================================================================

pub fn write_usage<W: Write>(out: &mut W, format: Format, report: &UsageReport) -> anyhow::Result<()> {
    if format == Format::Json {
        return write_json(out, report);
    }

    writeln!(out)?;
    for diag in &report.files {
        if diag.is_empty() {
            continue;
        }
        writeln!(out, "  {}", diag.file().blue())?;
        for (base, usage) in diag.modules() {
            if usage.used {
                writeln!(out, "    {}  {}", "used  ".green(), base)?;
            } else {
                writeln!(out, "    {}  {}", "UNUSED".red(), base)?;
            }
        }
        writeln!(out)?;
    }

    for err in &report.errors {
        writeln!(out, "  {} {}", "ERROR".red(), err)?;
    }

    let unused = report.unused_count();
    let summary = format!("{} files, {} unused imports", report.files.len(), unused);
    if unused == 0 {
        writeln!(out, "  {}  {}", "✓".green(), summary)?;
    } else {
        writeln!(out, "  {}  {}", "✗".red(), summary)?;
    }
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// strip
// =============================================================================

/// Header line followed by the stripped bytes.
pub fn write_stripped<W: Write>(out: &mut W, name: &str, stripped: &[u8]) -> std::io::Result<()> {
    writeln!(out, "==> {name} <==")?;
    out.write_all(stripped)?;
    if !stripped.ends_with(b"\n") {
        writeln!(out)?;
    }
    Ok(())
}

// =============================================================================
// calls
// =============================================================================

pub fn write_calls<W: Write>(out: &mut W, format: Format, report: &CallsReport) -> anyhow::Result<()> {
    if format == Format::Json {
        return write_json(out, report);
    }

    writeln!(out)?;
    writeln!(
        out,
        "  {} ({} matches)",
        "Signature matches".bold(),
        report.matches.len()
    )?;
    writeln!(out)?;

    let mut current_file: Option<&str> = None;
    for found in &report.matches {
        if current_file != Some(found.file.as_str()) {
            writeln!(
                out,
                "  {} {}",
                found.file.blue(),
                format!("[{}]", found.language).dimmed()
            )?;
            current_file = Some(found.file.as_str());
        }
        writeln!(out, "    {}", found.signature.cyan())?;
        for evidence in &found.evidence {
            writeln!(
                out,
                "      {}  {}",
                format!("{:>4}", evidence.line).dimmed(),
                evidence.namespace
            )?;
        }
    }

    for err in &report.errors {
        writeln!(out, "  {} {}", "ERROR".red(), err)?;
    }
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// signatures
// =============================================================================

#[derive(Serialize)]
struct SignaturesBody<'a> {
    catalog_version: &'a str,
    signatures: &'a [&'a Signature],
}

pub fn write_signatures<W: Write>(
    out: &mut W,
    format: Format,
    catalog: &Catalog,
    signatures: &[&Signature],
) -> anyhow::Result<()> {
    if format == Format::Json {
        return write_json(
            out,
            &SignaturesBody {
                catalog_version: &catalog.version,
                signatures,
            },
        );
    }

    writeln!(out)?;
    writeln!(
        out,
        "  {} v{} ({} signatures)",
        "Signature catalog".bold(),
        catalog.version,
        signatures.len()
    )?;
    writeln!(out)?;
    for signature in signatures {
        write!(out, "    {:<28}", signature.id.cyan())?;
        let languages: Vec<&str> = signature.languages.keys().map(|code| code.as_str()).collect();
        write!(out, "{}", languages.join(", "))?;
        if let Some(description) = &signature.description {
            write!(out, "  {}", description.dimmed())?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
    {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_walk_lines() {
        let entries = vec![
            WalkEntry {
                language: LanguageCode::Python,
                origin: Origin::App,
                name: "main.py".to_string(),
            },
            WalkEntry {
                language: LanguageCode::Go,
                origin: Origin::Import,
                name: "vendor/x.go".to_string(),
            },
        ];
        let text = render(|out| write_walk(out, Format::Pretty, &entries));
        assert_eq!(text, "python\tapp\tmain.py\ngo\timport\tvendor/x.go\n");
    }

    #[test]
    fn test_imports_json() {
        let files = vec![FileImports {
            file: "main.py".to_string(),
            language: LanguageCode::Python,
            imports: vec![Import::new("os", "main.py", 1).finish(Some("os".to_string()))],
        }];
        let text = render(|out| write_imports(out, Format::Json, &files));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["files"][0]["language"], "python");
        assert_eq!(value["files"][0]["imports"][0]["module_name"], "os");
        assert_eq!(value["files"][0]["imports"][0]["identifier"], "os");
        assert!(value["files"][0]["imports"][0].get("module_alias").is_none());
    }

    #[test]
    fn test_usage_pretty_and_json() {
        let imports = vec![
            Import::new("os", "a.py", 1).finish(None),
            Import::new("sys", "a.py", 2).finish(None),
        ];
        let mut diag = UsageDiagnostics::from_imports("a.py", &imports);
        diag.mark_used("os", 3);
        let report = UsageReport {
            files: vec![diag],
            errors: vec![],
        };
        assert_eq!(report.unused_count(), 1);

        let text = render(|out| write_usage(out, Format::Pretty, &report));
        assert!(text.contains("UNUSED  sys"));
        assert!(text.contains("used    os"));
        assert!(text.contains("1 files, 1 unused imports"));

        let json = render(|out| write_usage(out, Format::Json, &report));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"][0]["file"], "a.py");
        assert_eq!(value["files"][0]["modules"]["sys"]["used"], false);
        assert_eq!(value["files"][0]["evidence"][0]["line"], 3);
        assert!(value["files"][0].get("bindings").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_calls_pretty_and_json() {
        let report = CallsReport {
            matches: vec![SignatureMatch {
                signature: "process.exec".to_string(),
                file: "main.go".to_string(),
                language: LanguageCode::Go,
                evidence: vec![crate::callgraph::CallEvidence {
                    condition: "os/exec.Command".to_string(),
                    namespace: "os/exec.Command".to_string(),
                    line: 6,
                }],
            }],
            errors: vec![],
        };

        let text = render(|out| write_calls(out, Format::Pretty, &report));
        assert!(text.contains("(1 matches)"));
        assert!(text.contains("main.go"));
        assert!(text.contains("process.exec"));
        assert!(text.contains("os/exec.Command"));

        let json = render(|out| write_calls(out, Format::Json, &report));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["matches"][0]["signature"], "process.exec");
        assert_eq!(value["matches"][0]["language"], "go");
        assert_eq!(value["matches"][0]["evidence"][0]["line"], 6);
    }

    #[test]
    fn test_stripped_adds_trailing_newline() {
        let mut buf = Vec::new();
        write_stripped(&mut buf, "a.py", b"x = 1").unwrap();
        assert_eq!(buf, b"==> a.py <==\nx = 1\n");
    }
}
