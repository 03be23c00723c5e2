use clap::Args;
use colored::Colorize;
use serde::Serialize;

use threads::ident::{extract_id_from_path, extract_name_from_path};
use threads::{Result, git, workspace};

use super::Context;
use crate::args::FormatArgs;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct GitArgs {
    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Debug, Clone, Serialize)]
struct PendingThread {
    id: String,
    name: String,
    path: String,
    change_type: &'static str,
}

#[derive(Serialize)]
struct PendingReport<'a> {
    count: usize,
    pending: &'a [PendingThread],
}

/// Show thread files with uncommitted changes. Nothing is staged or committed.
pub fn run(args: GitArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let repo = git::open(&ctx.root)?;

    let pending: Vec<PendingThread> = git::pending_thread_files(&repo)?
        .into_iter()
        .map(|file| {
            let rel = git::rel_to_workdir(&repo, &file);
            PendingThread {
                id: extract_id_from_path(&file).unwrap_or_default(),
                name: extract_name_from_path(&file),
                path: workspace::path_relative_to_root(&ctx.root, &file),
                change_type: git::change_kind(&repo, &rel).as_str(),
            }
        })
        .collect();

    match format {
        OutputFormat::Pretty => output_pretty(&pending),
        OutputFormat::Plain => output_plain(&pending),
        OutputFormat::Json | OutputFormat::Yaml => output::print_structured(
            &PendingReport {
                count: pending.len(),
                pending: &pending,
            },
            format,
        )?,
    }
    Ok(())
}

fn output_pretty(pending: &[PendingThread]) {
    if pending.is_empty() {
        println!("No pending thread changes");
        return;
    }

    println!(
        "{} thread(s) with uncommitted changes",
        pending.len().to_string().bold()
    );
    println!();

    for p in pending {
        let marker = match p.change_type {
            "added" => "A".green(),
            "modified" => "M".yellow(),
            _ => "D".red(),
        };
        println!("  {} {} {}", marker, p.id.dimmed(), p.path);
    }

    println!();
    println!("{}", "Run 'threads commit --pending' to commit all".dimmed());
}

fn output_plain(pending: &[PendingThread]) {
    if pending.is_empty() {
        println!("No pending thread changes");
        return;
    }

    println!("{} pending", pending.len());
    println!();
    println!("TYPE | ID | NAME | PATH");
    for p in pending {
        println!("{} | {} | {} | {}", p.change_type, p.id, p.name, p.path);
    }
}
