use clap::{Args, Subcommand};

use threads::{Result, Thread, reference};

use super::Context;
use crate::args::CommitArgs;
use crate::output;

#[derive(Args)]
pub struct TodoArgs {
    /// Thread ID or name reference
    reference: String,

    /// Action (default: list)
    #[command(subcommand)]
    action: Option<TodoAction>,

    #[command(flatten)]
    commit: CommitArgs,
}

#[derive(Subcommand)]
enum TodoAction {
    /// List todo items
    #[command(alias = "ls")]
    List,
    /// Add an unchecked item
    Add {
        /// Item text
        text: String,
    },
    /// Mark an item done
    #[command(alias = "done", alias = "complete")]
    Check {
        /// Hash (or unique hash prefix) of the item
        hash: String,
    },
    /// Mark an item not done
    Uncheck {
        /// Hash (or unique hash prefix) of the item
        hash: String,
    },
    /// Remove an item
    #[command(alias = "rm")]
    Remove {
        /// Hash (or unique hash prefix) of the item
        hash: String,
    },
}

pub fn run(args: TodoArgs, ctx: &Context) -> Result<()> {
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;

    match args.action.as_ref().unwrap_or(&TodoAction::List) {
        TodoAction::List => {
            let items = t.todos();
            if items.is_empty() {
                println!("No todo items.");
            }
            for item in items {
                let mark = if item.checked == Some(true) { "[x]" } else { "[ ]" };
                println!("{} {} ({})", mark, item.text, output::style_id(&item.hash));
            }
            return Ok(());
        }
        TodoAction::Add { text } => {
            let hash = t.add_todo(text)?;
            println!("Added to Todo: {} (id: {})", text, hash);
        }
        TodoAction::Check { hash } => {
            t.set_todo_checked(hash, true)?;
            println!("Checked: {}", hash);
        }
        TodoAction::Uncheck { hash } => {
            t.set_todo_checked(hash, false)?;
            println!("Unchecked: {}", hash);
        }
        TodoAction::Remove { hash } => {
            t.remove_todo(hash)?;
            println!("Removed: {}", hash);
        }
    }

    t.write()?;
    super::finish(ctx, &args.commit, &[file], &t.id())?;
    Ok(())
}
