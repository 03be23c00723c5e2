use clap::Args;
use serde::Serialize;

use threads::{Result, Thread, reference};

use super::Context;
use crate::args::{CommitArgs, FormatArgs};
use crate::output;

#[derive(Args)]
pub struct StatusArgs {
    /// Thread ID or name reference
    reference: String,

    /// New status, optionally with a reason: "blocked (waiting on review)"
    new_status: String,

    #[command(flatten)]
    commit: CommitArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct StatusOutput {
    id: String,
    old_status: String,
    new_status: String,
    path: String,
    committed: bool,
}

pub fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;

    let mut t = Thread::parse(&file)?;
    let old_status = t.status();
    let id = t.id();

    t.set_status(&args.new_status)?;
    t.log(&format!("Status changed to {}.", args.new_status))?;
    t.write()?;
    tracing::info!(id = %id, from = %old_status, to = %args.new_status, "changed status");

    let rel_path = t.rel_path(&ctx.root);
    if format.is_human() {
        println!("Changed: {} → {} ({})", old_status, args.new_status, rel_path);
    }

    let committed = super::finish(ctx, &args.commit, &[file], &id)?;
    output::print_structured(
        &StatusOutput {
            id,
            old_status,
            new_status: args.new_status,
            path: rel_path,
            committed,
        },
        format,
    )
}
