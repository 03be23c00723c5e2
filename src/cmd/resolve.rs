use clap::Args;

use threads::{Result, Thread, reference};

use super::Context;
use crate::args::CommitArgs;

#[derive(Args)]
pub struct ResolveArgs {
    /// Thread ID or name reference
    reference: String,

    #[command(flatten)]
    commit: CommitArgs,
}

pub fn run(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;

    t.resolve()?;
    t.write()?;
    tracing::info!(id = %t.id(), "resolved thread");

    println!("Resolved: {}", t.rel_path(&ctx.root));
    super::finish(ctx, &args.commit, &[file], &t.id())?;
    Ok(())
}
