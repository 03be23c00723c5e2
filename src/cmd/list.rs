use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use threads::config::root_name;
use threads::thread::{self, Thread};
use threads::{Result, workspace};

use super::Context;
use crate::args::{DirectionArgs, FilterArgs, FormatArgs};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ListArgs {
    /// Path to list threads from (root-relative, ./pwd-relative, or absolute)
    #[arg(default_value = "")]
    path: String,

    #[command(flatten)]
    direction: DirectionArgs,

    #[command(flatten)]
    filter: FilterArgs,

    /// Search name/title/desc (substring)
    #[arg(short = 's', long)]
    search: Option<String>,

    /// Filter by status (comma-separated)
    #[arg(long)]
    status: Option<String>,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize, Clone)]
struct ThreadInfo {
    id: String,
    status: String,
    path: String,
    name: String,
    title: String,
    desc: String,
    path_absolute: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_pwd: bool,
}

/// Row data for tabled output
#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "TITLE")]
    title: String,
}

pub fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();

    let path_arg = if args.path.is_empty() {
        None
    } else {
        Some(args.path.as_str())
    };
    let cross_down = args.direction.no_git_bound || args.direction.no_git_bound_down;
    let scope =
        workspace::infer_scope(&ctx.root, &ctx.cwd, path_arg, ctx.allow_nested(cross_down))?;

    let options = args.direction.to_find_options(&ctx.config);
    let files = workspace::find_threads_with_options(&scope.dir, &ctx.root, &options);
    let pwd_rel = workspace::path_relative_to_root(&ctx.root, &ctx.cwd);

    let status_filter: Option<Vec<&str>> = args
        .status
        .as_deref()
        .map(|s| s.split(',').map(str::trim).collect());
    let search = args.search.as_deref().map(str::to_lowercase);

    let mut results = Vec::new();
    for file in files {
        let t = match Thread::parse(&file) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(path = %file.display(), error = %e, "skipping unparseable thread");
                continue;
            }
        };

        let status = t.status();
        let base = thread::base_status(&status);
        match &status_filter {
            Some(wanted) if !wanted.contains(&base) => continue,
            None if !args.filter.include_closed && thread::is_terminal(&status) => continue,
            _ => {}
        }

        let name = threads::ident::extract_name_from_path(&file);
        if let Some(needle) = &search {
            let hit = [&name, &t.name(), &t.desc()]
                .iter()
                .any(|s| s.to_lowercase().contains(needle));
            if !hit {
                continue;
            }
        }

        let path = workspace::parse_thread_path(&ctx.root, &file);
        results.push(ThreadInfo {
            id: t.id(),
            status: base.to_string(),
            is_pwd: path == pwd_rel,
            path,
            name,
            title: t.name(),
            desc: t.desc(),
            path_absolute: file.to_string_lossy().to_string(),
        });
    }

    match format {
        OutputFormat::Pretty => output_pretty(&results, &args, &scope.path, &pwd_rel, ctx),
        OutputFormat::Plain => output_plain(&results, &args, &scope.path, &pwd_rel),
        OutputFormat::Json | OutputFormat::Yaml => output::print_structured(&results, format),
    }
}

/// Build filter description for summary line
fn build_filter_desc(args: &ListArgs) -> String {
    let mut parts = Vec::new();

    if let Some(s) = &args.status {
        parts.push(format!("status={}", s));
    } else if !args.filter.include_closed {
        parts.push("open".to_string());
    } else {
        parts.push("all statuses".to_string());
    }

    if let Some(s) = &args.search {
        parts.push(format!("search=\"{}\"", s));
    }

    let dir_desc = args.direction.description();
    if !dir_desc.is_empty() {
        parts.push(dir_desc);
    }

    parts.join(", ")
}

fn output_pretty(
    results: &[ThreadInfo],
    args: &ListArgs,
    scope_path: &str,
    pwd_rel: &str,
    ctx: &Context,
) -> Result<()> {
    let repo_name = ctx
        .root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root_name(&ctx.config).to_string());
    let path_desc = if scope_path == "." {
        String::new()
    } else {
        format!(" ({})", scope_path)
    };
    let pwd_marker = if scope_path == pwd_rel {
        " ← PWD".bold().to_string()
    } else {
        String::new()
    };
    println!("{}{}{}", repo_name.bold(), path_desc.dimmed(), pwd_marker);
    println!(
        "{}",
        format!("Showing {} threads ({})", results.len(), build_filter_desc(args)).dimmed()
    );

    if results.is_empty() {
        return Ok(());
    }
    println!();

    let path_width = results
        .iter()
        .map(|r| r.path.chars().count())
        .max()
        .unwrap_or(0)
        .min(30);
    // ID, status, path and the table's own padding
    let title_width = output::terminal_width().saturating_sub(6 + 12 + path_width + 8).max(20);

    let rows: Vec<TableRow> = results
        .iter()
        .map(|r| TableRow {
            id: output::style_id(&r.id).to_string(),
            status: output::style_status(&r.status).to_string(),
            path: output::style_path(&output::truncate_front(&r.path, path_width), r.is_pwd),
            title: output::truncate_back(&r.title, title_width),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::blank());
    println!("{}", table);
    Ok(())
}

fn output_plain(
    results: &[ThreadInfo],
    args: &ListArgs,
    scope_path: &str,
    pwd_rel: &str,
) -> Result<()> {
    println!("PWD: {}", pwd_rel);
    println!("Scope: {}", scope_path);
    println!("Showing {} threads ({})", results.len(), build_filter_desc(args));
    if results.is_empty() {
        return Ok(());
    }
    println!();
    println!("ID | STATUS | PATH | NAME | TITLE | DESC");
    for r in results {
        println!(
            "{} | {} | {} | {} | {} | {}",
            r.id, r.status, r.path, r.name, r.title, r.desc
        );
    }
    Ok(())
}
