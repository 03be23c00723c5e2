use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::LazyLock;

use clap::Args;
use colored::Colorize;
use regex::Regex;
use serde::Serialize;

use threads::ident::{self, extract_id_from_path};
use threads::thread::{self, Thread};
use threads::{Error, Result, section, workspace};

use super::Context;
use crate::args::{DirectionArgs, FormatArgs};
use crate::output::{self, OutputFormat};

/// Matches a well-formed todo checkbox line
static TODO_CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^- \[([ xX])\] ").unwrap());

/// Fields every thread must carry
const REQUIRED_FIELDS: &[&str] = &["id", "name", "status"];

/// Issue code descriptions
fn issue_description(code: &str) -> &'static str {
    match code {
        "E000" => "Cannot read file",
        "E001" => "Missing frontmatter",
        "E002" => "Invalid YAML syntax",
        "E003" => "Missing required field",
        "E004" => "Invalid ID format",
        "E005" => "ID mismatch with filename",
        "E006" => "Invalid status value",
        "E007" => "Duplicate ID across threads",
        "W006" => "Malformed checkbox",
        "W009" => "Filename missing ID prefix",
        _ => "Unknown issue",
    }
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to validate (root-relative, ./pwd-relative, or absolute)
    #[arg(default_value = "")]
    path: String,

    /// Validate all threads in workspace
    #[arg(short = 'a', long)]
    all: bool,

    /// Show each issue with its description
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(flatten)]
    direction: DirectionArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl Issue {
    fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            line: None,
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    fn warning_at(code: &'static str, line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            line: None,
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    pub issues: Vec<Issue>,
}

impl FileResult {
    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub errors: usize,
    pub warnings: usize,
    pub files: Vec<FileResult>,
}

pub fn run(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let files = collect_files(&args, ctx)?;
    let summary = validate_all(&files, &ctx.root);

    match format {
        OutputFormat::Pretty => output_pretty(&summary, args.verbose),
        OutputFormat::Plain => output_plain(&summary),
        OutputFormat::Json | OutputFormat::Yaml => output::print_structured(&summary, format)?,
    }

    if summary.errors > 0 {
        process::exit(1);
    }
    Ok(())
}

fn collect_files(args: &ValidateArgs, ctx: &Context) -> Result<Vec<PathBuf>> {
    if args.all {
        return Ok(workspace::find_all_threads(&ctx.root));
    }
    let path_arg = if args.path.is_empty() {
        None
    } else {
        Some(args.path.as_str())
    };
    let cross = args.direction.no_git_bound || args.direction.no_git_bound_down;
    let scope = workspace::infer_scope(&ctx.root, &ctx.cwd, path_arg, ctx.allow_nested(cross))?;
    let options = args.direction.to_find_options(&ctx.config);
    Ok(workspace::find_threads_with_options(&scope.dir, &ctx.root, &options))
}

/// Check every file, carrying on past files that fail to read or parse.
pub fn validate_all(files: &[PathBuf], root: &Path) -> ValidationSummary {
    let mut results = Vec::new();
    let mut seen_ids: HashMap<String, String> = HashMap::new();

    for file in files {
        let path = workspace::path_relative_to_root(root, file);
        let mut issues = Vec::new();

        match Thread::parse(file) {
            Ok(t) => {
                issues.extend(check_thread(&t));
                let id = t.id();
                if !id.is_empty() {
                    match seen_ids.get(&id) {
                        Some(first) => issues.push(Issue::error(
                            "E007",
                            format!("ID {} already used by {}", id, first),
                        )),
                        None => {
                            seen_ids.insert(id, path.clone());
                        }
                    }
                }
            }
            Err(e) if e.is_per_file() => {
                tracing::debug!(path = %path, error = %e, "thread failed to parse");
                issues.push(parse_issue(&e));
            }
            Err(e) => issues.push(Issue::error("E000", e.to_string())),
        }

        results.push(FileResult { path, issues });
    }

    let errors = results.iter().map(|r| r.count(Severity::Error)).sum();
    let warnings = results.iter().map(|r| r.count(Severity::Warning)).sum();
    ValidationSummary {
        total: results.len(),
        valid: results.iter().filter(|r| r.issues.is_empty()).count(),
        errors,
        warnings,
        files: results,
    }
}

fn parse_issue(err: &Error) -> Issue {
    match err {
        Error::Parse { reason, .. }
            if reason == "missing frontmatter delimiter" || reason == "unclosed frontmatter" =>
        {
            Issue::error("E001", reason.clone())
        }
        Error::Parse { reason, .. } => Issue::error("E002", reason.clone()),
        other => Issue::error("E000", other.to_string()),
    }
}

/// Issues in a thread that parsed.
pub fn check_thread(t: &Thread) -> Vec<Issue> {
    let mut issues = Vec::new();

    for field in REQUIRED_FIELDS {
        if t.frontmatter.get(field).is_none_or(|v| v.trim().is_empty()) {
            issues.push(Issue::error("E003", format!("missing field '{}'", field)));
        }
    }

    let file_id = extract_id_from_path(&t.path);
    if let Some(id) = t.frontmatter.id() {
        if !ident::is_id(&id) {
            issues.push(Issue::error("E004", format!("ID '{}' is not 6 hex characters", id)));
        } else if let Some(file_id) = &file_id
            && *file_id != id
        {
            issues.push(Issue::error(
                "E005",
                format!("frontmatter ID {} but filename has {}", id, file_id),
            ));
        }
    }
    if file_id.is_none() {
        issues.push(Issue::warning("W009", "filename does not start with an ID"));
    }

    let status = t.status();
    if !status.is_empty() && !thread::is_valid_status(&status) {
        issues.push(Issue::error("E006", format!("unknown status '{}'", status)));
    }

    let offset = t.content[..t.content.len() - t.body().len()].lines().count();
    let mut in_todo = false;
    for (idx, line) in t.body().lines().enumerate() {
        if let Some(header) = line.strip_prefix("## ") {
            in_todo = header.trim_end() == section::TODO;
            continue;
        }
        if in_todo && line.starts_with("- [") && !TODO_CHECKBOX_RE.is_match(line) {
            issues.push(Issue::warning_at(
                "W006",
                offset + idx + 1,
                format!("malformed checkbox: {}", line),
            ));
        }
    }

    issues
}

fn output_pretty(summary: &ValidationSummary, verbose: bool) {
    if summary.errors == 0 && summary.warnings == 0 {
        println!(
            "Validated {} threads: {}",
            summary.total.to_string().bold(),
            "all valid ✓".green()
        );
        return;
    }

    let mut parts = vec![format!("{} valid", summary.valid)];
    if summary.errors > 0 {
        parts.push(format!("{} errors", summary.errors).red().to_string());
    }
    if summary.warnings > 0 {
        parts.push(format!("{} warnings", summary.warnings).yellow().to_string());
    }
    println!(
        "Validated {} threads: {}",
        summary.total.to_string().bold(),
        parts.join(", ")
    );
    println!();

    for file in summary.files.iter().filter(|f| !f.issues.is_empty()) {
        println!("  {}", file.path);
        for issue in &file.issues {
            let marker = match issue.severity {
                Severity::Error => "E".red(),
                Severity::Warning => "W".yellow(),
            };
            let location = issue.line.map(|l| format!(":{}", l)).unwrap_or_default();
            println!(
                "    {} {} {}{}",
                marker,
                issue.code.dimmed(),
                issue.message,
                location.dimmed()
            );
            if verbose {
                println!("      {}", issue_description(issue.code).dimmed());
            }
        }
    }
}

fn output_plain(summary: &ValidationSummary) {
    println!(
        "Validated {} threads: {} valid, {} errors, {} warnings",
        summary.total, summary.valid, summary.errors, summary.warnings
    );
    for file in &summary.files {
        for issue in &file.issues {
            let location = issue.line.map(|l| format!(":{}", l)).unwrap_or_default();
            println!(
                "{}{} | {} | {} | {}",
                file.path, location, issue.code, issue_description(issue.code), issue.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let threads_dir = dir.join(".threads");
        fs::create_dir_all(&threads_dir).unwrap();
        let path = threads_dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn codes(result: &FileResult) -> Vec<&'static str> {
        result.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_validate_reports_and_continues() {
        let dir = TempDir::new().unwrap();
        let good = write(
            dir.path(),
            "abc123-good.md",
            "---\nid: abc123\nname: Good\nstatus: active\n---\n\n## Todo\n\n- [ ] fine <!-- 1a2b -->\n",
        );
        let broken = write(dir.path(), "def456-broken.md", "no frontmatter here\n");
        let bad_yaml = write(dir.path(), "fed654-yaml.md", "---\nname: [unclosed\n---\n");
        let dup = write(
            dir.path(),
            "abc123-dup.md",
            "---\nid: abc123\nname: Dup\nstatus: nonsense\n---\n\n## Todo\n\n- [-] odd\n",
        );

        let summary = validate_all(&[good, broken, bad_yaml, dup], dir.path());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.valid, 1);
        assert!(codes(&summary.files[0]).is_empty());
        assert_eq!(codes(&summary.files[1]), vec!["E001"]);
        assert_eq!(codes(&summary.files[2]), vec!["E002"]);
        assert_eq!(codes(&summary.files[3]), vec!["E006", "W006", "E007"]);
        assert_eq!(summary.files[3].issues[1].line, Some(9));
    }

    #[test]
    fn test_check_thread_fields() {
        let t = Thread::from_content(
            PathBuf::from("/ws/.threads/untitled.md"),
            "---\nid: zzz\nstatus: idea\n---\n".to_string(),
        )
        .unwrap();
        let found: Vec<&str> = check_thread(&t).iter().map(|i| i.code).collect();
        assert_eq!(found, vec!["E003", "E004", "W009"]);

        let t = Thread::from_content(
            PathBuf::from("/ws/.threads/abc123-x.md"),
            "---\nid: 111111\nname: X\nstatus: idea\n---\n".to_string(),
        )
        .unwrap();
        let found: Vec<&str> = check_thread(&t).iter().map(|i| i.code).collect();
        assert_eq!(found, vec!["E005"]);
    }
}
