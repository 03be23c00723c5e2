//! Shared CLI argument structs for consistent flag definitions across commands.
//!
//! Use `#[command(flatten)]` to include them in command-specific Args structs.

use clap::Args;

use threads::config::Config;
use threads::workspace::FindOptions;

use crate::output::OutputFormat;

// ============================================================================
// FormatArgs - Output format flags
// ============================================================================

/// Common output format flags.
#[derive(Args, Clone, Debug, Default)]
pub struct FormatArgs {
    /// Output format (auto-detects TTY for pretty vs plain)
    #[arg(short = 'f', long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Output as JSON (shorthand for --format=json)
    #[arg(long, conflicts_with = "format")]
    pub json: bool,
}

impl FormatArgs {
    /// Resolve the effective output format.
    pub fn resolve(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.resolve()
        }
    }
}

// ============================================================================
// DirectionArgs - Search direction flags
// ============================================================================

/// Direction flags for hierarchical thread search.
///
/// A bare `--down`/`--up` means unlimited, which is depth 0.
#[derive(Args, Clone, Debug, Default)]
pub struct DirectionArgs {
    /// Search subdirectories (unlimited depth, or specify N levels)
    #[arg(short = 'd', long = "down", value_name = "N", num_args = 0..=1, default_missing_value = "0")]
    pub down: Option<usize>,

    /// Alias for unlimited --down
    #[arg(short = 'r', long, conflicts_with = "down")]
    pub recursive: bool,

    /// Search parent directories (up to the root, or specify N levels)
    #[arg(short = 'u', long = "up", value_name = "N", num_args = 0..=1, default_missing_value = "0")]
    pub up: Option<usize>,

    /// Descend into nested git repositories
    #[arg(long)]
    pub no_git_bound_down: bool,

    /// Continue above the workspace root
    #[arg(long)]
    pub no_git_bound_up: bool,

    /// Shorthand for both --no-git-bound-down and --no-git-bound-up
    #[arg(long)]
    pub no_git_bound: bool,
}

impl DirectionArgs {
    fn effective_down(&self) -> Option<usize> {
        if self.down.is_some() {
            self.down
        } else if self.recursive {
            Some(0)
        } else {
            None
        }
    }

    /// Convert to FindOptions, falling back to configured defaults when no direction is given.
    pub fn to_find_options(&self, config: &Config) -> FindOptions {
        let (down, up) = if self.is_searching() {
            (self.effective_down(), self.up)
        } else {
            (config.behavior.default_down, config.behavior.default_up)
        };

        let mut options = FindOptions::new()
            .crossing_down(self.no_git_bound || self.no_git_bound_down)
            .crossing_up(self.no_git_bound || self.no_git_bound_up);
        if let Some(depth) = down {
            options = options.with_down(depth);
        }
        if let Some(depth) = up {
            options = options.with_up(depth);
        }
        options
    }

    pub fn is_searching(&self) -> bool {
        self.down.is_some() || self.recursive || self.up.is_some()
    }

    /// Returns strings like "(recursive)", "(down 2)", "(up)", "(down 2, up)".
    pub fn description(&self) -> String {
        let mut parts = Vec::new();
        match self.effective_down() {
            Some(0) => parts.push("recursive".to_string()),
            Some(n) => parts.push(format!("down {}", n)),
            None => {}
        }
        match self.up {
            Some(0) => parts.push("up".to_string()),
            Some(n) => parts.push(format!("up {}", n)),
            None => {}
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!("({})", parts.join(", "))
        }
    }
}

// ============================================================================
// FilterArgs - Thread status filter flags
// ============================================================================

#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Include closed threads (resolved/superseded/deferred/rejected)
    #[arg(short = 'c', long = "include-closed")]
    pub include_closed: bool,
}

// ============================================================================
// CommitArgs - Git commit flags for mutating commands
// ============================================================================

#[derive(Args, Clone, Debug, Default)]
pub struct CommitArgs {
    /// Commit the change after writing
    #[arg(long, global = true)]
    pub commit: bool,

    /// Commit message (implies --commit)
    #[arg(short = 'm', long = "message", value_name = "MSG", global = true)]
    pub message: Option<String>,
}

impl CommitArgs {
    pub fn wants_commit(&self, config: &Config) -> bool {
        self.commit || self.message.is_some() || config.behavior.auto_commit
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_description() {
        let cases = vec![
            (DirectionArgs::default(), "", false),
            (
                DirectionArgs {
                    recursive: true,
                    ..Default::default()
                },
                "(recursive)",
                true,
            ),
            (
                DirectionArgs {
                    down: Some(2),
                    ..Default::default()
                },
                "(down 2)",
                true,
            ),
            (
                DirectionArgs {
                    down: Some(0),
                    ..Default::default()
                },
                "(recursive)",
                true,
            ),
            (
                DirectionArgs {
                    up: Some(0),
                    ..Default::default()
                },
                "(up)",
                true,
            ),
            (
                DirectionArgs {
                    down: Some(2),
                    up: Some(3),
                    ..Default::default()
                },
                "(down 2, up 3)",
                true,
            ),
        ];

        for (args, want, searching) in cases {
            assert_eq!(args.description(), want, "args {:?}", args);
            assert_eq!(args.is_searching(), searching, "args {:?}", args);
        }
    }

    #[test]
    fn test_direction_to_find_options() {
        let config = Config::default();

        let opts = DirectionArgs {
            recursive: true,
            ..Default::default()
        }
        .to_find_options(&config);
        assert_eq!(opts.down, Some(0));
        assert_eq!(opts.up, None);

        let opts = DirectionArgs {
            down: Some(1),
            recursive: true,
            no_git_bound: true,
            ..Default::default()
        }
        .to_find_options(&config);
        assert_eq!(opts.down, Some(1));
        assert!(opts.cross_boundary_down);
        assert!(opts.cross_boundary_up);

        let opts = DirectionArgs {
            up: Some(2),
            no_git_bound_up: true,
            ..Default::default()
        }
        .to_find_options(&config);
        assert_eq!(opts.up, Some(2));
        assert!(!opts.cross_boundary_down);
        assert!(opts.cross_boundary_up);
    }

    #[test]
    fn test_direction_config_defaults() {
        let mut config = Config::default();
        config.behavior.default_down = Some(0);

        let opts = DirectionArgs::default().to_find_options(&config);
        assert_eq!(opts.down, Some(0));

        let explicit = DirectionArgs {
            up: Some(1),
            ..Default::default()
        }
        .to_find_options(&config);
        assert_eq!(explicit.down, None, "explicit flags replace configured defaults");
    }

    #[test]
    fn test_commit_args() {
        let mut config = Config::default();
        assert!(!CommitArgs::default().wants_commit(&config));
        let with_msg = CommitArgs {
            message: Some("msg".to_string()),
            ..Default::default()
        };
        assert!(with_msg.wants_commit(&config));
        config.behavior.auto_commit = true;
        assert!(CommitArgs::default().wants_commit(&config));
    }
}
