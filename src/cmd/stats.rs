use std::collections::HashMap;

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use threads::config::{is_quiet, root_name};
use threads::thread::{self, Thread};
use threads::{Result, workspace};

use super::Context;
use crate::args::{DirectionArgs, FilterArgs, FormatArgs};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct StatsArgs {
    /// Path to show stats for (root-relative, ./pwd-relative, or absolute)
    #[arg(default_value = "")]
    path: String,

    #[command(flatten)]
    direction: DirectionArgs,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct StatusCount {
    status: String,
    count: usize,
}

#[derive(Serialize)]
struct StatsOutput {
    scope: String,
    total: usize,
    counts: Vec<StatusCount>,
}

/// Row data for stats table
#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "COUNT")]
    count: String,
}

pub fn run(args: StatsArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();

    let path_arg = if args.path.is_empty() {
        None
    } else {
        Some(args.path.as_str())
    };
    let cross = args.direction.no_git_bound || args.direction.no_git_bound_down;
    let scope = workspace::infer_scope(&ctx.root, &ctx.cwd, path_arg, ctx.allow_nested(cross))?;
    let options = args.direction.to_find_options(&ctx.config);

    let counts = count_by_status(
        &workspace::find_threads_with_options(&scope.dir, &ctx.root, &options),
        args.filter.include_closed,
    );
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    let path_desc = if scope.path == "." {
        root_name(&ctx.config).to_string()
    } else {
        scope.path.clone()
    };
    let filter_desc = build_filter_desc(args.filter.include_closed, &args.direction);

    match format {
        OutputFormat::Pretty => {
            println!(
                "{} {} ({})",
                "Stats for threads in".bold(),
                path_desc,
                filter_desc.dimmed()
            );
            println!();
            if total == 0 {
                print_empty(&args.direction, ctx);
                return Ok(());
            }
            let mut rows: Vec<StatsRow> = counts
                .iter()
                .map(|(status, count)| StatsRow {
                    status: output::style_status(status).to_string(),
                    count: count.to_string(),
                })
                .collect();
            rows.push(StatsRow {
                status: "Total".bold().to_string(),
                count: total.to_string().bold().to_string(),
            });
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Plain => {
            println!("Stats for threads in {} ({})", path_desc, filter_desc);
            println!();
            if total == 0 {
                print_empty(&args.direction, ctx);
                return Ok(());
            }
            println!("STATUS | COUNT");
            for (status, count) in &counts {
                println!("{} | {}", status, count);
            }
            println!("Total | {}", total);
        }
        OutputFormat::Json | OutputFormat::Yaml => output::print_structured(
            &StatsOutput {
                scope: scope.path,
                total,
                counts: counts
                    .into_iter()
                    .map(|(status, count)| StatusCount { status, count })
                    .collect(),
            },
            format,
        )?,
    }
    Ok(())
}

/// Counts per base status, largest first. Unparseable files are skipped.
fn count_by_status(files: &[std::path::PathBuf], include_closed: bool) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in files {
        let Ok(t) = Thread::parse(path) else {
            tracing::debug!(path = %path.display(), "skipping unparseable thread");
            continue;
        };
        let status = t.base_status();
        if !include_closed && thread::is_terminal(&status) {
            continue;
        }
        let status = if status.is_empty() {
            "(none)".to_string()
        } else {
            status
        };
        *counts.entry(status).or_insert(0) += 1;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

fn print_empty(direction: &DirectionArgs, ctx: &Context) {
    println!("No threads found.");
    if !direction.is_searching() && !is_quiet(&ctx.config) {
        println!("Hint: use --down to include nested directories, --up to search parents");
    }
}

fn build_filter_desc(include_closed: bool, direction: &DirectionArgs) -> String {
    let mut parts = vec![if include_closed { "all statuses" } else { "open" }.to_string()];
    let dir_desc = direction.description();
    if !dir_desc.is_empty() {
        parts.push(dir_desc);
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_count_by_status() {
        let dir = TempDir::new().unwrap();
        let threads_dir = dir.path().join(".threads");
        fs::create_dir_all(&threads_dir).unwrap();

        let statuses = ["active", "active", "blocked (review)", "resolved", "idea"];
        let files: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let path = threads_dir.join(format!("00000{}-t.md", i));
                fs::write(&path, format!("---\nname: t\nstatus: {}\n---\n", status)).unwrap();
                path
            })
            .collect();

        let open = count_by_status(&files, false);
        assert_eq!(
            open,
            vec![
                ("active".to_string(), 2),
                ("blocked".to_string(), 1),
                ("idea".to_string(), 1)
            ]
        );

        let all = count_by_status(&files, true);
        assert_eq!(all.iter().map(|(_, n)| n).sum::<usize>(), 5);
    }
}
