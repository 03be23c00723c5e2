use std::fs;

use clap::Args;
use serde::Serialize;

use threads::{Error, Result, Thread, git, reference};

use super::Context;
use crate::args::{CommitArgs, FormatArgs};
use crate::output;

#[derive(Args)]
pub struct RemoveArgs {
    /// Thread ID or name reference
    reference: String,

    #[command(flatten)]
    commit: CommitArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct RemoveOutput {
    id: String,
    name: String,
    path: String,
    was_tracked: bool,
    committed: bool,
}

pub fn run(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;

    let t = Thread::parse(&file)?;
    let id = t.id();
    let name = t.name();
    let path = t.rel_path(&ctx.root);

    let repo = if args.commit.wants_commit(&ctx.config) {
        Some(git::open(&ctx.root)?)
    } else {
        None
    };
    let was_tracked = repo
        .as_ref()
        .is_some_and(|r| git::is_tracked(r, &git::rel_to_workdir(r, &file)));

    fs::remove_file(&file).map_err(|e| Error::io(format!("removing {}", file.display()), e))?;
    tracing::info!(id = %id, path = %path, "removed thread");

    let committed = match &repo {
        Some(repo) if was_tracked => {
            super::commit_files(repo, &[file], args.commit.message.clone(), &ctx.config)?;
            true
        }
        _ => false,
    };

    if format.is_human() {
        println!("Removed: {}", path);
        if !was_tracked && repo.is_some() {
            println!("Note: Thread was never committed to git, no commit needed.");
        }
    }

    output::print_structured(
        &RemoveOutput {
            id,
            name,
            path,
            was_tracked,
            committed,
        },
        format,
    )
}
