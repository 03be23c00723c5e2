use clap::Args;

use threads::{Error, Result, Thread, reference};

use super::Context;
use crate::args::CommitArgs;

#[derive(Args)]
pub struct UpdateArgs {
    /// Thread ID or name reference
    reference: String,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New one-line description
    #[arg(long)]
    desc: Option<String>,

    #[command(flatten)]
    commit: CommitArgs,
}

pub fn run(args: UpdateArgs, ctx: &Context) -> Result<()> {
    if args.title.is_none() && args.desc.is_none() {
        return Err(Error::Usage("specify --title and/or --desc".to_string()));
    }

    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;

    if let Some(title) = &args.title {
        t.set_field("name", title)?;
        println!("Title updated: {}", title);
    }
    if let Some(desc) = &args.desc {
        t.set_field("desc", desc)?;
        println!("Description updated: {}", desc);
    }
    t.write()?;

    println!("Updated: {}", t.rel_path(&ctx.root));
    super::finish(ctx, &args.commit, &[file], &t.id())?;
    Ok(())
}
