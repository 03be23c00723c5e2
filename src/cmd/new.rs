use clap::Args;
use serde::Serialize;

use threads::config::{is_quiet, root_name};
use threads::{Result, Thread, workspace};

use super::Context;
use crate::args::{CommitArgs, FormatArgs};
use crate::input;
use crate::output;

#[derive(Args)]
pub struct NewArgs {
    /// [path] title - Path is optional, title is required
    /// Path resolution:
    ///   (none)  → PWD (current directory)
    ///   .       → PWD (explicit)
    ///   ./X/Y   → PWD-relative
    ///   /X/Y    → Absolute
    ///   X/Y     → Root-relative
    #[arg(required = true, num_args = 1..=2)]
    args: Vec<String>,

    /// Initial status (default from config, usually "idea")
    #[arg(long)]
    status: Option<String>,

    /// One-line description
    #[arg(long, default_value = "")]
    desc: String,

    /// Initial body content (read from stdin when piped)
    #[arg(long)]
    body: Option<String>,

    /// Allow creating inside a nested git repository
    #[arg(long)]
    no_git_bound: bool,

    #[command(flatten)]
    commit: CommitArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Serialize)]
struct NewOutput {
    id: String,
    path: String,
    path_absolute: String,
    committed: bool,
}

pub fn run(args: NewArgs, ctx: &Context) -> Result<()> {
    let format = args.format.resolve();
    let status = args.status.unwrap_or_else(|| ctx.config.defaults.new.clone());

    let (path_arg, title) = match args.args.as_slice() {
        [path, title] => (Some(path.as_str()), title.clone()),
        [title] => (None, title.clone()),
        _ => return Err(threads::Error::Usage("title is required".to_string())),
    };
    if title.trim().is_empty() {
        return Err(threads::Error::Usage("title is required".to_string()));
    }

    if args.desc.is_empty() && !is_quiet(&ctx.config) {
        eprintln!("Warning: No --desc provided. Add one with: threads update <id> --desc \"...\"");
    }

    let body = input::arg_or_stdin(args.body, false);

    let scope = workspace::infer_scope(
        &ctx.root,
        &ctx.cwd,
        path_arg,
        ctx.allow_nested(args.no_git_bound),
    )?;
    let id = workspace::generate_id(&ctx.root)?;
    let thread = Thread::create(&scope.threads_dir, &id, &title, &args.desc, &status, &body)?;
    let rel_path = workspace::path_relative_to_root(&ctx.root, &thread.path);

    if format.is_human() {
        let level = if scope.path == "." {
            root_name(&ctx.config)
        } else {
            scope.level_desc.as_str()
        };
        println!("Created thread in {}: {}", level, id);
        println!("  → {}", rel_path);
        if body.trim().is_empty() && !is_quiet(&ctx.config) {
            eprintln!(
                "Hint: Add body with: echo \"content\" | threads body {} --set",
                id
            );
        }
    }

    let committed = super::finish(ctx, &args.commit, &[thread.path.clone()], &id)?;

    output::print_structured(
        &NewOutput {
            id,
            path: rel_path,
            path_absolute: thread.path.to_string_lossy().to_string(),
            committed,
        },
        format,
    )
}
