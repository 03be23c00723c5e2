use clap::Args;
use serde::Serialize;

use threads::{Result, Thread, reference};

use super::Context;
use crate::args::{CommitArgs, FormatArgs};
use crate::output;

#[derive(Args)]
pub struct ReopenArgs {
    /// Thread ID or name reference
    reference: String,

    /// Status to reopen to (default from config, usually "active")
    #[arg(long)]
    status: Option<String>,

    #[command(flatten)]
    commit: CommitArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct ReopenOutput {
    id: String,
    old_status: String,
    new_status: String,
    path: String,
    committed: bool,
}

pub fn run(args: ReopenArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let status = args
        .status
        .unwrap_or_else(|| ctx.config.defaults.open.clone());

    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;
    let old_status = t.status();
    let id = t.id();

    t.reopen(&status)?;
    t.write()?;
    tracing::info!(id = %id, status = %status, "reopened thread");

    let path = t.rel_path(&ctx.root);
    if format.is_human() {
        println!("Reopened: {} → {} ({})", old_status, status, path);
    }

    let committed = super::finish(ctx, &args.commit, &[file], &id)?;
    output::print_structured(
        &ReopenOutput {
            id,
            old_status,
            new_status: status,
            path,
            committed,
        },
        format,
    )
}
