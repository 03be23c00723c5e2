use clap::Args;

use threads::{Error, Result, Thread, reference};

use super::Context;
use crate::args::CommitArgs;
use crate::input;

#[derive(Args)]
pub struct LogArgs {
    /// Thread ID or name reference
    reference: String,

    /// Log entry text (reads from stdin if omitted)
    entry: Option<String>,

    #[command(flatten)]
    commit: CommitArgs,
}

pub fn run(args: LogArgs, ctx: &Context) -> Result<()> {
    let entry = input::arg_or_stdin(args.entry, true);
    if entry.trim().is_empty() {
        return Err(Error::Usage("no log entry provided".to_string()));
    }

    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;
    t.log(entry.trim())?;
    t.write()?;

    println!("Logged to: {}", t.rel_path(&ctx.root));
    super::finish(ctx, &args.commit, &[file], &t.id())?;
    Ok(())
}
