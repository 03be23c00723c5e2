use clap::Args;

use threads::{Error, Result, Thread, reference};

use super::Context;
use crate::args::CommitArgs;
use crate::input;

#[derive(Args)]
pub struct BodyArgs {
    /// Thread ID or name reference
    reference: String,

    /// Replace body content with stdin
    #[arg(long, conflicts_with = "append")]
    set: bool,

    /// Append stdin to body content
    #[arg(long)]
    append: bool,

    #[command(flatten)]
    commit: CommitArgs,
}

/// Without input the Body section is printed; piped input replaces it (or appends with --append).
pub fn run(args: BodyArgs, ctx: &Context) -> Result<()> {
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;

    let content = input::read_stdin(false);
    if content.trim().is_empty() {
        if args.set || args.append {
            return Err(Error::Usage("no content provided (use stdin)".to_string()));
        }
        println!("{}", t.body_section());
        return Ok(());
    }

    if args.append {
        t.append_body_section(&content)?;
    } else {
        t.set_body_section(&content)?;
    }
    t.write()?;

    let mode = if args.append { "append" } else { "set" };
    println!("Body {}: {}", mode, t.rel_path(&ctx.root));
    super::finish(ctx, &args.commit, &[file], &t.id())?;
    Ok(())
}
