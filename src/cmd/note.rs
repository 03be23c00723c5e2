use clap::{Args, Subcommand};

use threads::{Result, Thread, reference};

use super::Context;
use crate::args::CommitArgs;
use crate::output;

#[derive(Args)]
pub struct NoteArgs {
    /// Thread ID or name reference
    reference: String,

    #[command(subcommand)]
    action: NoteAction,

    #[command(flatten)]
    commit: CommitArgs,
}

#[derive(Subcommand)]
enum NoteAction {
    /// Add a note
    Add {
        /// Note text
        text: String,
    },
    /// Replace the text of a note
    Edit {
        /// Hash (or unique hash prefix) of the note
        hash: String,
        /// New note text
        text: String,
    },
    /// Remove a note
    #[command(alias = "rm")]
    Remove {
        /// Hash (or unique hash prefix) of the note
        hash: String,
    },
    /// List notes
    #[command(alias = "ls")]
    List,
}

pub fn run(args: NoteArgs, ctx: &Context) -> Result<()> {
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let mut t = Thread::parse(&file)?;

    match &args.action {
        NoteAction::List => {
            let notes = t.notes();
            if notes.is_empty() {
                println!("No notes.");
            }
            for note in notes {
                println!("{} ({})", note.text, output::style_id(&note.hash));
            }
            return Ok(());
        }
        NoteAction::Add { text } => {
            let hash = t.add_note(text)?;
            t.log(&format!("Added note: {}", text))?;
            println!("Added note: {} (id: {})", text, hash);
        }
        NoteAction::Edit { hash, text } => {
            t.edit_note(hash, text)?;
            t.log(&format!("Edited note {}", hash))?;
            println!("Edited note {}", hash);
        }
        NoteAction::Remove { hash } => {
            t.remove_note(hash)?;
            t.log(&format!("Removed note {}", hash))?;
            println!("Removed note {}", hash);
        }
    }

    t.write()?;
    super::finish(ctx, &args.commit, &[file], &t.id())?;
    Ok(())
}
