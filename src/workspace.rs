use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::ident::{self, extract_id_from_path};

pub const THREADS_DIR: &str = ".threads";
pub const ARCHIVE_DIR: &str = "archive";
pub const WORKSPACE_ENV: &str = "WORKSPACE";

/// How the workspace root is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootMode {
    /// Nearest ancestor containing `.git`.
    Git,
    /// The directory named by `$WORKSPACE` (None when unset).
    Legacy(Option<PathBuf>),
}

impl RootMode {
    /// Build the mode from `$WORKSPACE`. Outside legacy mode the variable is only reported.
    pub fn from_env(legacy: bool) -> Self {
        let workspace = std::env::var_os(WORKSPACE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        if legacy {
            RootMode::Legacy(workspace)
        } else {
            if let Some(ws) = workspace {
                tracing::debug!(workspace = %ws.display(), "ignoring $WORKSPACE, root comes from git");
            }
            RootMode::Git
        }
    }
}

/// Options for bounded discovery around a start directory.
///
/// A depth of 0 means unlimited.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Levels of subdirectories to search, None for none.
    pub down: Option<usize>,
    /// Levels of parent directories to search, None for none.
    pub up: Option<usize>,
    /// Descend into nested git repositories.
    pub cross_boundary_down: bool,
    /// Continue above the workspace root.
    pub cross_boundary_up: bool,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_down(mut self, depth: usize) -> Self {
        self.down = Some(depth);
        self
    }

    pub fn with_up(mut self, depth: usize) -> Self {
        self.up = Some(depth);
        self
    }

    pub fn crossing_down(mut self, cross: bool) -> Self {
        self.cross_boundary_down = cross;
        self
    }

    pub fn crossing_up(mut self, cross: bool) -> Self {
        self.cross_boundary_up = cross;
        self
    }
}

/// Depth 0 (unlimited) becomes -1 so `within` is one comparison.
fn depth_limit(depth: usize) -> i64 {
    if depth == 0 { -1 } else { depth as i64 }
}

fn within(depth: i64, max: i64) -> bool {
    max < 0 || depth < max
}

/// Check if a directory is a git root (contains .git, as a directory or a worktree file).
pub fn is_git_root(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Find the workspace root for `start`.
pub fn root(start: &Path, mode: &RootMode) -> Result<PathBuf> {
    match mode {
        RootMode::Git => {
            let start = canonical(start);
            start
                .ancestors()
                .find(|dir| is_git_root(dir))
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    Error::WorkspaceNotFound(format!(
                        "no git repository above {}; threads needs a git repo to define scope",
                        start.display()
                    ))
                })
        }
        RootMode::Legacy(Some(ws)) if ws.is_dir() => Ok(canonical(ws)),
        RootMode::Legacy(Some(ws)) => Err(Error::WorkspaceNotFound(format!(
            "$WORKSPACE points to {}, which is not a directory",
            ws.display()
        ))),
        RootMode::Legacy(None) => Err(Error::WorkspaceNotFound(
            "$WORKSPACE is not set".to_string(),
        )),
    }
}

/// Drop `.` and apply `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor and re-attach the rest,
/// so paths that do not exist yet still compare against a canonical root.
pub fn canonical(path: &Path) -> PathBuf {
    let normalized = normalize(path);
    let mut existing = normalized.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            resolved.extend(missing.iter().rev());
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

/// Where in the hierarchy a scope sits, by depth below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
    Root,
    Category,
    Project,
    Nested,
}

/// Scope represents thread placement information.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    /// Directory the scope refers to (absolute)
    pub dir: PathBuf,
    /// Path to the .threads directory (absolute)
    pub threads_dir: PathBuf,
    /// Path relative to the root ("." for the root itself)
    pub path: String,
    /// Human-readable description
    pub level_desc: String,
}

impl Scope {
    fn parts(&self) -> Vec<&str> {
        if self.path == "." {
            Vec::new()
        } else {
            self.path.split('/').collect()
        }
    }

    pub fn level(&self) -> ScopeLevel {
        match self.parts().len() {
            0 => ScopeLevel::Root,
            1 => ScopeLevel::Category,
            2 => ScopeLevel::Project,
            _ => ScopeLevel::Nested,
        }
    }

    /// First path component, the category in a category/project layout.
    pub fn category(&self) -> Option<&str> {
        self.parts().first().copied()
    }

    /// Second path component, the project in a category/project layout.
    pub fn project(&self) -> Option<&str> {
        self.parts().get(1).copied()
    }
}

/// Infer the threads directory and scope from a path argument.
///
/// Path resolution rules:
/// - None, "" or ".": `cwd`
/// - "./X/Y": relative to `cwd`
/// - "/X/Y": absolute
/// - "X/Y": relative to `root`
pub fn infer_scope(
    root: &Path,
    cwd: &Path,
    path_arg: Option<&str>,
    cross_nested: bool,
) -> Result<Scope> {
    let target = match path_arg {
        None | Some("") | Some(".") => cwd.to_path_buf(),
        Some(p) if p.starts_with("./") => cwd.join(&p[2..]),
        Some(p) if p.starts_with('/') => PathBuf::from(p),
        Some(p) => root.join(p),
    };

    let target = canonical(&target);
    let root = canonical(root);

    let Ok(rel) = target.strip_prefix(&root) else {
        return Err(Error::OutOfBounds { path: target, root });
    };

    if !cross_nested
        && let Some(boundary) = target
            .ancestors()
            .take_while(|dir| *dir != root)
            .find(|dir| is_git_root(dir))
    {
        return Err(Error::NestedRepoBoundary {
            path: target.clone(),
            boundary: boundary.to_path_buf(),
        });
    }

    let rel = rel.to_string_lossy().to_string();
    let path = if rel.is_empty() { ".".to_string() } else { rel };
    let level_desc = if path == "." {
        "repo root".to_string()
    } else {
        path.clone()
    };
    tracing::debug!(scope = %path, "resolved scope");

    Ok(Scope {
        threads_dir: target.join(THREADS_DIR),
        dir: target,
        path,
        level_desc,
    })
}

/// True if any component below `root` is an `archive` directory.
fn is_archived(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| c.as_os_str() == ARCHIVE_DIR)
}

/// Push the `.md` files of `dir/.threads` onto `out`.
fn collect_threads_at(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
    let threads_dir = dir.join(THREADS_DIR);
    let entries = match fs::read_dir(&threads_dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(dir = %threads_dir.display(), error = %e, "skipping unreadable threads dir");
            }
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "md")
            && path.is_file()
            && !is_archived(&path, root)
        {
            out.push(path);
        }
    }
}

/// Subdirectories worth descending into: not hidden, not symlinks,
/// and not nested repositories unless `cross_nested`.
fn subdirs(dir: &Path, cross_nested: bool) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut dirs = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if !cross_nested && is_git_root(&path) {
            continue;
        }
        dirs.push(path);
    }
    dirs
}

/// Every thread file below `root`, sorted.
///
/// Descent stops at hidden directories and nested git repositories; files
/// under an `archive` directory are left out.
pub fn find_all_threads(root: &Path) -> Vec<PathBuf> {
    let mut threads = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        collect_threads_at(&dir, root, &mut threads);
        stack.extend(subdirs(&dir, false));
    }

    threads.sort();
    threads.dedup();
    threads
}

/// Threads at `start`, plus the levels below and above it that `options` asks for.
pub fn find_threads_with_options(start: &Path, root: &Path, options: &FindOptions) -> Vec<PathBuf> {
    let start = canonical(start);
    let root = canonical(root);
    let mut threads = Vec::new();

    collect_threads_at(&start, &root, &mut threads);

    if let Some(depth) = options.down {
        let max = depth_limit(depth);
        let mut stack = vec![(start.clone(), 0i64)];
        while let Some((dir, depth)) = stack.pop() {
            if !within(depth, max) {
                continue;
            }
            for child in subdirs(&dir, options.cross_boundary_down) {
                collect_threads_at(&child, &root, &mut threads);
                stack.push((child, depth + 1));
            }
        }
    }

    if let Some(depth) = options.up {
        let max = depth_limit(depth);
        let mut current = start.as_path();
        let mut depth = 0i64;
        while within(depth, max) {
            let Some(parent) = current.parent() else {
                break;
            };
            if !options.cross_boundary_up && !parent.starts_with(&root) {
                break;
            }
            collect_threads_at(parent, &root, &mut threads);
            current = parent;
            depth += 1;
        }
    }

    threads.sort();
    threads.dedup();
    threads
}

/// Generate a 6-character hex ID not used by any thread under `root`.
pub fn generate_id(root: &Path) -> Result<String> {
    let existing: HashSet<String> = find_all_threads(root)
        .iter()
        .filter_map(|p| extract_id_from_path(p))
        .collect();
    ident::allocate_id(&existing, ident::random_id_bytes)
}

/// Get path relative to the root for display purposes.
pub fn path_relative_to_root(root: &Path, path: &Path) -> String {
    let root = canonical(root);
    let path = canonical(path);
    match path.strip_prefix(&root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

/// Root-relative directory owning a thread file's `.threads` directory.
pub fn parse_thread_path(root: &Path, thread_path: &Path) -> String {
    match thread_path.parent().and_then(Path::parent) {
        Some(owner) => path_relative_to_root(root, owner),
        None => ".".to_string(),
    }
}
