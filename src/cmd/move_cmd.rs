use std::fs;

use clap::Args;
use serde::Serialize;

use threads::{Error, Result, Thread, reference, workspace};

use super::Context;
use crate::args::{CommitArgs, FormatArgs};
use crate::output;

#[derive(Args)]
pub struct MoveArgs {
    /// Thread ID or name reference
    reference: String,

    /// New path (root-relative, ./pwd-relative, or absolute)
    new_path: String,

    /// Allow moving into a nested git repository
    #[arg(long)]
    no_git_bound: bool,

    #[command(flatten)]
    commit: CommitArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct MoveOutput {
    id: String,
    source: String,
    dest: String,
    scope: String,
    committed: bool,
}

pub fn run(args: MoveArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let src_file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let id = Thread::parse(&src_file)?.id();

    let scope = workspace::infer_scope(
        &ctx.root,
        &ctx.cwd,
        Some(args.new_path.as_str()),
        ctx.allow_nested(args.no_git_bound),
    )?;

    let filename = src_file
        .file_name()
        .ok_or_else(|| Error::Usage(format!("invalid thread path {}", src_file.display())))?;
    let dest_file = scope.threads_dir.join(filename);
    if dest_file.exists() {
        return Err(Error::Usage(format!(
            "thread already exists at destination: {}",
            dest_file.display()
        )));
    }

    fs::create_dir_all(&scope.threads_dir)
        .map_err(|e| Error::io(format!("creating {}", scope.threads_dir.display()), e))?;
    fs::rename(&src_file, &dest_file)
        .map_err(|e| Error::io(format!("moving {}", src_file.display()), e))?;

    let source = workspace::path_relative_to_root(&ctx.root, &src_file);
    let dest = workspace::path_relative_to_root(&ctx.root, &dest_file);
    tracing::info!(id = %id, from = %source, to = %dest, "moved thread");

    if format.is_human() {
        println!("Moved: {} → {}", source, dest);
    }

    let committed = super::finish(ctx, &args.commit, &[src_file, dest_file], &id)?;
    output::print_structured(
        &MoveOutput {
            id,
            source,
            dest,
            scope: scope.path,
            committed,
        },
        format,
    )
}
