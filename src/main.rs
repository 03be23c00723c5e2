use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};

use threads::workspace::{self, RootMode};
use threads::{config, logging};

mod args;
mod cmd;
mod input;
mod output;

#[derive(Parser)]
#[command(name = "threads")]
#[command(version = env!("THREADS_VERSION"))]
#[command(about = "Thread management for LLM workflows")]
#[command(
    long_about = "threads - Persistent context management for LLM-assisted development.\n\nThreads are markdown files in .threads/ directories anywhere in a repository.\nEach thread tracks a single topic: a feature, bug, exploration, or decision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List threads
    #[command(alias = "ls")]
    List(cmd::list::ListArgs),

    /// Create a new thread
    New(cmd::new::NewArgs),

    /// Move thread to new location
    #[command(alias = "mv")]
    Move(cmd::move_cmd::MoveArgs),

    /// Validate thread files
    Validate(cmd::validate::ValidateArgs),

    /// Commit thread changes
    Commit(cmd::commit::CommitArgs),

    /// Show thread files with uncommitted changes
    Git(cmd::git_cmd::GitArgs),

    /// Show thread count by status
    Stats(cmd::stats::StatsArgs),

    /// Read thread content
    #[command(alias = "cat", alias = "show")]
    Read(cmd::read::ReadArgs),

    /// Print thread file path
    Path(cmd::path::PathArgs),

    /// Change thread status
    Status(cmd::status::StatusArgs),

    /// Update thread title/desc
    Update(cmd::update::UpdateArgs),

    /// Read or edit Body section
    Body(cmd::body::BodyArgs),

    /// Manage notes
    Note(cmd::note::NoteArgs),

    /// Manage todo items
    Todo(cmd::todo::TodoArgs),

    /// Add log entry
    Log(cmd::log::LogArgs),

    /// Mark thread resolved
    #[command(alias = "close")]
    Resolve(cmd::resolve::ResolveArgs),

    /// Reopen a resolved thread
    Reopen(cmd::reopen::ReopenArgs),

    /// Remove thread entirely
    #[command(alias = "rm")]
    Remove(cmd::remove::RemoveArgs),

    /// Configuration introspection
    Config(cmd::config_cmd::ConfigArgs),
}

fn main() {
    // Use try_parse to catch errors and normalize exit code
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Exit with 0 for help/version, 1 for actual errors
            let exit_code = if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                0
            } else {
                1
            };
            process::exit(exit_code);
        }
    };

    logging::init_logging("warn");

    let ctx = match context() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::List(args) => cmd::list::run(args, &ctx),
        Commands::New(args) => cmd::new::run(args, &ctx),
        Commands::Move(args) => cmd::move_cmd::run(args, &ctx),
        Commands::Validate(args) => cmd::validate::run(args, &ctx),
        Commands::Commit(args) => cmd::commit::run(args, &ctx),
        Commands::Git(args) => cmd::git_cmd::run(args, &ctx),
        Commands::Stats(args) => cmd::stats::run(args, &ctx),
        Commands::Read(args) => cmd::read::run(args, &ctx),
        Commands::Path(args) => cmd::path::run(args, &ctx),
        Commands::Status(args) => cmd::status::run(args, &ctx),
        Commands::Update(args) => cmd::update::run(args, &ctx),
        Commands::Body(args) => cmd::body::run(args, &ctx),
        Commands::Note(args) => cmd::note::run(args, &ctx),
        Commands::Todo(args) => cmd::todo::run(args, &ctx),
        Commands::Log(args) => cmd::log::run(args, &ctx),
        Commands::Resolve(args) => cmd::resolve::run(args, &ctx),
        Commands::Reopen(args) => cmd::reopen::run(args, &ctx),
        Commands::Remove(args) => cmd::remove::run(args, &ctx),
        Commands::Config(args) => cmd::config_cmd::run(args, &ctx),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Locate the workspace root and load the configuration that applies to the working directory.
fn context() -> threads::Result<cmd::Context> {
    let cwd = std::env::current_dir()
        .map_err(|e| threads::Error::io("reading current directory", e))?;
    let mode = RootMode::from_env(config::legacy_workspace_requested());
    let root = workspace::root(&cwd, &mode)?;
    if mode == RootMode::Git
        && let Some(ws) = std::env::var_os(workspace::WORKSPACE_ENV).filter(|v| !v.is_empty())
        && workspace::canonical(Path::new(&ws)) != root
    {
        tracing::warn!(
            workspace = %Path::new(&ws).display(),
            root = %root.display(),
            "$WORKSPACE differs from the git root; using the git root"
        );
    }
    let cwd = workspace::canonical(&cwd);
    let loaded = config::load_config(&root, &cwd);

    Ok(cmd::Context {
        root,
        cwd,
        config: loaded.config,
        sources: loaded.sources,
    })
}
