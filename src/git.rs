use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Repository, Status, StatusOptions};

use crate::error::{Error, Result};
use crate::ident::extract_id_from_path;

/// Open the repository containing `root`.
pub fn open(root: &Path) -> Result<Repository> {
    Repository::discover(root).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            Error::WorkspaceNotFound(format!("{} is not inside a git repository", root.display()))
        } else {
            Error::git("open", e.message())
        }
    })
}

fn workdir(repo: &Repository) -> Result<&Path> {
    repo.workdir()
        .ok_or_else(|| Error::git("open", "repository has no working directory"))
}

/// `path` relative to the working directory, unchanged if it already is.
pub fn rel_to_workdir(repo: &Repository, path: &Path) -> PathBuf {
    let Some(workdir) = repo.workdir() else {
        return path.to_path_buf();
    };
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    let absolute = crate::workspace::canonical(path);
    absolute
        .strip_prefix(&workdir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Check if a file has uncommitted changes (staged, unstaged, or untracked)
pub fn has_changes(repo: &Repository, rel_path: &Path) -> bool {
    match repo.status_file(rel_path) {
        Ok(status) => !status.is_empty() && status != Status::CURRENT,
        Err(e) if e.code() == git2::ErrorCode::NotFound => repo
            .workdir()
            .is_some_and(|w| w.join(rel_path).exists()),
        Err(_) => true,
    }
}

/// Check if a file is tracked by git
pub fn is_tracked(repo: &Repository, rel_path: &Path) -> bool {
    repo.index()
        .map(|index| index.get_path(rel_path, 0).is_some())
        .unwrap_or(false)
}

/// Check if a file exists in HEAD
pub fn exists_in_head(repo: &Repository, rel_path: &Path) -> bool {
    repo.head()
        .and_then(|head| head.peel_to_tree())
        .map(|tree| tree.get_path(rel_path).is_ok())
        .unwrap_or(false)
}

/// Commit only the listed files, like `git commit -- <files>`.
///
/// Other entries staged in the index are left staged afterwards.
pub fn commit(repo: &Repository, files: &[&Path], message: &str) -> Result<()> {
    let err = |e: git2::Error| Error::git("commit", e.message());
    let workdir = workdir(repo)?;
    let sig = repo.signature().map_err(err)?;

    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree().map_err(err)?),
        Err(_) => None,
    };
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(err)?),
        Err(_) => None,
    };

    let mut index = repo.index().map_err(err)?;
    let staged: Vec<_> = index.iter().collect();

    index.clear().map_err(err)?;
    if let Some(tree) = &head_tree {
        index.read_tree(tree).map_err(err)?;
    }
    for file in files {
        if workdir.join(file).exists() {
            index.add_path(file).map_err(err)?;
        } else {
            let _ = index.remove_path(file);
        }
    }

    let tree_id = index.write_tree().map_err(err)?;
    let tree = repo.find_tree(tree_id).map_err(err)?;
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(err)?;

    // Put back whatever else was staged before
    let new_tree = repo.head().and_then(|h| h.peel_to_tree()).map_err(err)?;
    index.read_tree(&new_tree).map_err(err)?;
    let committed: HashSet<&Path> = files.iter().copied().collect();
    for entry in staged {
        let path = Path::new(std::str::from_utf8(&entry.path).unwrap_or(""));
        if !committed.contains(path) {
            index.add(&entry).map_err(err)?;
        }
    }
    index.write().map_err(err)?;

    tracing::info!(files = files.len(), message, "committed");
    Ok(())
}

fn rel_paths(repo: &Repository, files: &[PathBuf]) -> Vec<PathBuf> {
    files.iter().map(|f| rel_to_workdir(repo, f)).collect()
}

/// Generated commit message for thread files given as absolute or workdir-relative paths.
pub fn message_for(repo: &Repository, files: &[PathBuf]) -> String {
    let rel = rel_paths(repo, files);
    let refs: Vec<&Path> = rel.iter().map(PathBuf::as_path).collect();
    generate_commit_message(repo, &refs)
}

/// Commit thread files (absolute or workdir-relative), generating the message when none is given.
///
/// Returns the message that was used.
pub fn auto_commit(repo: &Repository, files: &[PathBuf], message: Option<&str>) -> Result<String> {
    let message = match message {
        Some(m) => m.to_string(),
        None => message_for(repo, files),
    };
    let rel = rel_paths(repo, files);
    let refs: Vec<&Path> = rel.iter().map(PathBuf::as_path).collect();
    commit(repo, &refs, &message)?;
    Ok(message)
}

/// `git pull --rebase` then `git push` in the working directory.
pub fn push(repo: &Repository) -> Result<()> {
    let workdir = workdir(repo)?;
    run_git(workdir, &["pull", "--rebase"], "pull")?;
    run_git(workdir, &["push"], "push")
}

fn run_git(dir: &Path, args: &[&str], op: &'static str) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::git(op, e))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::git(op, String::from_utf8_lossy(&output.stderr).trim()))
    }
}

/// Thread files under the working directory with uncommitted changes, deletions included.
pub fn pending_thread_files(repo: &Repository) -> Result<Vec<PathBuf>> {
    let workdir = workdir(repo)?;
    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true);

    let statuses = repo
        .statuses(Some(&mut opts))
        .map_err(|e| Error::git("status", e.message()))?;

    let mut files: Vec<PathBuf> = statuses
        .iter()
        .filter(|entry| entry.status() != Status::CURRENT && !entry.status().is_ignored())
        .filter_map(|entry| entry.path().map(str::to_string))
        .filter(|path| is_thread_path(path))
        .map(|path| workdir.join(path))
        .collect();
    files.sort();
    Ok(files)
}

/// How a pending file differs from HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// Classify a workdir-relative path against HEAD and the working tree.
pub fn change_kind(repo: &Repository, rel_path: &Path) -> ChangeKind {
    let on_disk = repo.workdir().is_some_and(|w| w.join(rel_path).exists());
    if !exists_in_head(repo, rel_path) {
        ChangeKind::Added
    } else if on_disk {
        ChangeKind::Modified
    } else {
        ChangeKind::Deleted
    }
}

fn is_thread_path(path: &str) -> bool {
    let path = Path::new(path);
    path.extension().is_some_and(|e| e == "md")
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|d| d == crate::workspace::THREADS_DIR)
}

/// Generate a commit message for thread changes
///
/// One file names its ID, up to three list their IDs, more give a count.
pub fn generate_commit_message(repo: &Repository, files: &[&Path]) -> String {
    let workdir = repo.workdir().unwrap_or(Path::new("."));
    let mut ids = Vec::new();
    let (mut added, mut deleted) = (0, 0);

    for file in files {
        ids.push(extract_id_from_path(file).unwrap_or_else(|| {
            file.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        }));
        if !exists_in_head(repo, file) {
            added += 1;
        } else if !workdir.join(file).exists() {
            deleted += 1;
        }
    }

    let total = ids.len();
    let action = if added == total {
        "add"
    } else if deleted == total {
        "remove"
    } else {
        "update"
    };

    if total <= 3 {
        format!("threads: {} {}", action, ids.join(" "))
    } else {
        format!("threads: {} {} threads", action, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        (dir, repo)
    }

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        PathBuf::from(rel)
    }

    #[test]
    fn test_commit_message_lifecycle() {
        let (dir, repo) = init_repo();
        let rel = write(dir.path(), ".threads/abc123-x.md", "one");

        assert_eq!(generate_commit_message(&repo, &[&rel]), "threads: add abc123");
        assert!(has_changes(&repo, &rel));
        commit(&repo, &[&rel], "threads: add abc123").unwrap();
        assert!(exists_in_head(&repo, &rel));
        assert!(is_tracked(&repo, &rel));
        assert!(!has_changes(&repo, &rel));

        write(dir.path(), ".threads/abc123-x.md", "two");
        assert_eq!(generate_commit_message(&repo, &[&rel]), "threads: update abc123");

        fs::remove_file(dir.path().join(&rel)).unwrap();
        assert_eq!(generate_commit_message(&repo, &[&rel]), "threads: remove abc123");
        commit(&repo, &[&rel], "threads: remove abc123").unwrap();
        assert!(!exists_in_head(&repo, &rel));
    }

    #[test]
    fn test_commit_message_many() {
        let (dir, repo) = init_repo();
        let files: Vec<PathBuf> = ["aaaaaa", "bbbbbb", "cccccc", "dddddd"]
            .iter()
            .map(|id| write(dir.path(), &format!(".threads/{}-t.md", id), "x"))
            .collect();
        let refs: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();

        assert_eq!(
            generate_commit_message(&repo, &refs[..3]),
            "threads: add aaaaaa bbbbbb cccccc"
        );
        assert_eq!(generate_commit_message(&repo, &refs), "threads: add 4 threads");

        commit(&repo, &refs[..1], "first").unwrap();
        assert_eq!(
            generate_commit_message(&repo, &refs[..2]),
            "threads: update aaaaaa bbbbbb"
        );
    }

    #[test]
    fn test_commit_only_listed_files() {
        let (dir, repo) = init_repo();
        let ours = write(dir.path(), ".threads/abc123-x.md", "x");
        let other = write(dir.path(), "other.txt", "staged elsewhere");
        let mut index = repo.index().unwrap();
        index.add_path(&other).unwrap();
        index.write().unwrap();

        commit(&repo, &[&ours], "threads: add abc123").unwrap();
        assert!(exists_in_head(&repo, &ours));
        assert!(!exists_in_head(&repo, &other));
        assert!(is_tracked(&repo, &other), "other file should stay staged");
    }

    #[test]
    fn test_change_kind() {
        let (dir, repo) = init_repo();
        let kept = write(dir.path(), ".threads/abc123-x.md", "x");
        let gone = write(dir.path(), ".threads/def456-y.md", "y");
        commit(&repo, &[&kept, &gone], "seed").unwrap();

        write(dir.path(), ".threads/abc123-x.md", "changed");
        fs::remove_file(dir.path().join(&gone)).unwrap();
        let fresh = write(dir.path(), ".threads/fed789-z.md", "z");

        assert_eq!(change_kind(&repo, &kept), ChangeKind::Modified);
        assert_eq!(change_kind(&repo, &gone), ChangeKind::Deleted);
        assert_eq!(change_kind(&repo, &fresh), ChangeKind::Added);

        let pending = pending_thread_files(&repo).unwrap();
        assert_eq!(pending.len(), 3, "pending {:?}", pending);
    }

    #[test]
    fn test_auto_commit_absolute_paths() {
        let (dir, repo) = init_repo();
        let root = dir.path().canonicalize().unwrap();
        write(&root, ".threads/abc123-x.md", "x");
        write(&root, "src/.threads/def456-y.md", "y");
        let files = vec![
            root.join(".threads/abc123-x.md"),
            root.join("src/.threads/def456-y.md"),
        ];

        let message = auto_commit(&repo, &files, None).unwrap();
        assert_eq!(message, "threads: add abc123 def456");
        assert!(exists_in_head(&repo, Path::new("src/.threads/def456-y.md")));

        write(&root, ".threads/abc123-x.md", "changed");
        let message = auto_commit(&repo, &files[..1], Some("custom")).unwrap();
        assert_eq!(message, "custom");
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("custom"));
    }

    #[test]
    fn test_pending_thread_files() {
        let (dir, repo) = init_repo();
        write(dir.path(), ".threads/abc123-x.md", "x");
        write(dir.path(), "src/.threads/def456-y.md", "y");
        write(dir.path(), "README.md", "not a thread");

        let pending = pending_thread_files(&repo).unwrap();
        let names: Vec<String> = pending
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["abc123-x.md", "def456-y.md"]);
    }
}
