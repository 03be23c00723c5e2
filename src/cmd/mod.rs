//! Subcommands. Each module exposes an `Args` struct and a `run` function.

use std::path::PathBuf;

use git2::Repository;

use threads::config::{Config, ConfigSource, is_quiet};
use threads::{Result, git};

use crate::args::CommitArgs;
use crate::output;

pub mod body;
pub mod commit;
pub mod config_cmd;
pub mod git_cmd;
pub mod list;
pub mod log;
pub mod move_cmd;
pub mod new;
pub mod note;
pub mod path;
pub mod read;
pub mod remove;
pub mod reopen;
pub mod resolve;
pub mod stats;
pub mod status;
pub mod todo;
pub mod update;
pub mod validate;

/// Everything a command needs to know about where it runs.
pub struct Context {
    pub root: PathBuf,
    pub cwd: PathBuf,
    pub config: Config,
    pub sources: Vec<ConfigSource>,
}

impl Context {
    /// Whether scope resolution may enter nested repositories.
    pub fn allow_nested(&self, flag: bool) -> bool {
        flag || self.config.behavior.allow_nested
    }
}

/// Commit `files` when asked to (flag or config), otherwise remind about the pending change.
///
/// Returns whether a commit was made.
pub fn finish(ctx: &Context, commit: &CommitArgs, files: &[PathBuf], label: &str) -> Result<bool> {
    if commit.wants_commit(&ctx.config) {
        let repo = git::open(&ctx.root)?;
        commit_files(&repo, files, commit.message.clone(), &ctx.config)?;
        Ok(true)
    } else {
        if !is_quiet(&ctx.config) {
            output::print_uncommitted_hint(label);
        }
        Ok(false)
    }
}

/// Commit `files`, generating a message when none is given, then push if configured.
///
/// A failed push is reported but does not undo or fail the commit.
pub fn commit_files(
    repo: &Repository,
    files: &[PathBuf],
    message: Option<String>,
    config: &Config,
) -> Result<String> {
    let message = git::auto_commit(repo, files, message.as_deref())?;

    if config.behavior.push
        && let Err(e) = git::push(repo)
    {
        tracing::warn!(error = %e, "push failed after commit");
        eprintln!("WARNING: git push failed (commit succeeded): {}", e);
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_failed_push_keeps_commit() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut git_config = repo.config().unwrap();
        git_config.set_str("user.name", "Test").unwrap();
        git_config.set_str("user.email", "test@example.com").unwrap();

        let threads_dir = dir.path().join(".threads");
        fs::create_dir_all(&threads_dir).unwrap();
        let file = threads_dir.join("abc123-x.md");
        fs::write(&file, "---\nid: abc123\n---\n").unwrap();

        let mut config = Config::default();
        config.behavior.push = true;

        // No remote is configured, so the push step fails
        let message = commit_files(&repo, &[file], None, &config).unwrap();
        assert_eq!(message, "threads: add abc123");
        assert!(git::exists_in_head(&repo, Path::new(".threads/abc123-x.md")));
    }
}
