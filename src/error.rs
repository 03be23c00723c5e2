use std::path::PathBuf;

/// Error type shared by workspace resolution, thread editing and git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not in a workspace: {0}")]
    WorkspaceNotFound(String),

    #[error("path '{}' is outside the workspace root '{}'", .path.display(), .root.display())]
    OutOfBounds { path: PathBuf, root: PathBuf },

    #[error(
        "path '{}' is inside a nested git repository at '{}' (use --no-git-bound to cross it)",
        .path.display(),
        .boundary.display()
    )]
    NestedRepoBoundary { path: PathBuf, boundary: PathBuf },

    #[error("{}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("thread not found: {0}")]
    NotFound(String),

    #[error(
        "ambiguous reference '{reference}' matches {count} threads: {list}",
        count = .candidates.len(),
        list = .candidates.join(", ")
    )]
    Ambiguous {
        reference: String,
        candidates: Vec<String>,
    },

    #[error("no item with hash '{hash}' found in {section}")]
    ItemNotFound { section: String, hash: String },

    #[error("ambiguous hash '{hash}' matches {count} items in {section}")]
    AmbiguousItem {
        section: String,
        hash: String,
        count: usize,
    },

    #[error("could not generate unique ID after {0} attempts")]
    IdExhausted(usize),

    #[error(
        "invalid status '{0}'. Must be one of: idea, planning, active, blocked, paused, resolved, superseded, deferred, rejected"
    )]
    InvalidStatus(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("{0}")]
    Usage(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("git {op} failed: {message}")]
    Git { op: &'static str, message: String },
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn git(op: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Git {
            op,
            message: err.to_string(),
        }
    }

    /// Per-file problems that a directory-wide scan can report and move past.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = Error::Ambiguous {
            reference: "auth".to_string(),
            candidates: vec![
                "abc123 (auth-refactor)".to_string(),
                "def456 (auth-refactor-v2)".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "ambiguous reference 'auth' matches 2 threads: abc123 (auth-refactor), def456 (auth-refactor-v2)"
        );
    }

    #[test]
    fn test_out_of_bounds_names_both_paths() {
        let err = Error::OutOfBounds {
            path: PathBuf::from("/tmp/elsewhere"),
            root: PathBuf::from("/work/repo"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/elsewhere"), "message: {}", msg);
        assert!(msg.contains("/work/repo"), "message: {}", msg);
    }

    #[test]
    fn test_is_per_file() {
        let parse = Error::Parse {
            path: PathBuf::from("x.md"),
            reason: "missing frontmatter".to_string(),
        };
        assert!(parse.is_per_file());
        assert!(!Error::NotFound("x".to_string()).is_per_file());
    }
}
