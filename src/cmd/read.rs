use clap::Args;
use colored::Colorize;
use serde::Serialize;

use threads::section::{ListItem, LogEntry};
use threads::{Result, Thread, reference};

use super::Context;
use crate::args::FormatArgs;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ReadArgs {
    /// Thread ID or name reference
    reference: String,

    #[command(flatten)]
    format: FormatArgs,
}

/// Structured output data for JSON/YAML
#[derive(Serialize)]
struct ThreadOutput {
    id: String,
    name: String,
    status: String,
    desc: String,
    path: String,
    body: String,
    notes: Vec<ListItem>,
    todo: Vec<ListItem>,
    log: Vec<LogEntry>,
}

pub fn run(args: ReadArgs, ctx: &Context) -> Result<()> {
    let file = reference::find_by_ref(&ctx.root, &args.reference)?;
    let thread = Thread::parse(&file)?;

    match args.format.resolve() {
        OutputFormat::Plain => print!("{}", thread.content),
        OutputFormat::Pretty => {
            println!(
                "{}  {}  {}",
                output::style_id(&thread.id()),
                output::style_status(&thread.status()),
                thread.name().bold()
            );
            let desc = thread.desc();
            if !desc.is_empty() {
                println!("{}", desc.dimmed());
            }
            println!("{}", thread.rel_path(&ctx.root).dimmed());
            print!("{}", thread.body());
        }
        format => output::print_structured(
            &ThreadOutput {
                id: thread.id(),
                name: thread.name(),
                status: thread.status(),
                desc: thread.desc(),
                path: thread.rel_path(&ctx.root),
                body: thread.body_section(),
                notes: thread.notes(),
                todo: thread.todos(),
                log: thread.log_entries(),
            },
            format,
        )?,
    }
    Ok(())
}
