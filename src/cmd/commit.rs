use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::Args;

use threads::{Error, Result, git, reference};

use super::Context;

#[derive(Args)]
pub struct CommitArgs {
    /// Thread IDs or names to commit
    refs: Vec<String>,

    /// Commit all modified thread files, deletions included
    #[arg(long, conflicts_with = "refs")]
    pending: bool,

    /// Commit message
    #[arg(short = 'm', long = "message")]
    message: Option<String>,

    /// Accept the generated message without asking
    #[arg(long)]
    auto: bool,
}

pub fn run(args: CommitArgs, ctx: &Context) -> Result<()> {
    let repo = git::open(&ctx.root)?;

    let files: Vec<PathBuf> = if args.pending {
        git::pending_thread_files(&repo)?
    } else {
        if args.refs.is_empty() {
            return Err(Error::Usage("provide thread IDs or use --pending".to_string()));
        }
        let mut files = Vec::new();
        for r in &args.refs {
            let file = reference::find_by_ref(&ctx.root, r)?;
            if !git::has_changes(&repo, &git::rel_to_workdir(&repo, &file)) {
                println!("No changes in thread: {}", r);
                continue;
            }
            files.push(file);
        }
        files
    };

    if files.is_empty() {
        println!("No threads to commit.");
        return Ok(());
    }

    let message = match args.message {
        Some(m) => m,
        None => {
            let generated = git::message_for(&repo, &files);
            println!("Generated message: {}", generated);
            if !args.auto && io::stdin().is_terminal() && !confirm()? {
                println!("Aborted.");
                return Ok(());
            }
            generated
        }
    };

    super::commit_files(&repo, &files, Some(message), &ctx.config)?;
    println!("Committed {} thread(s).", files.len());
    if !ctx.config.behavior.push {
        eprintln!("Note: Changes are local. Push with 'git push' when ready.");
    }
    Ok(())
}

fn confirm() -> Result<bool> {
    print!("Proceed? [Y/n] ");
    io::stdout()
        .flush()
        .map_err(|e| Error::io("flushing stdout", e))?;

    let mut response = String::new();
    io::stdin()
        .lock()
        .read_line(&mut response)
        .map_err(|e| Error::io("reading confirmation", e))?;
    let response = response.trim().to_lowercase();
    Ok(response != "n" && response != "no")
}
