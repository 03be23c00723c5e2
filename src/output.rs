//! Output formatting utilities with TTY auto-detection and semantic styling.

use std::io::IsTerminal;

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use threads::Result;

/// Output format for commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-optimized: colors and tables
    #[default]
    Pretty,
    /// LLM-optimized: no colors, pipe-delimited, full paths
    Plain,
    /// Machine-readable JSON
    Json,
    /// Machine-readable YAML
    Yaml,
}

impl OutputFormat {
    /// Resolve the output format, applying TTY auto-detection.
    ///
    /// If format is Pretty but stdout is not a TTY, returns Plain.
    pub fn resolve(self) -> Self {
        match self {
            OutputFormat::Pretty if !std::io::stdout().is_terminal() => OutputFormat::Plain,
            other => other,
        }
    }

    pub fn is_human(self) -> bool {
        matches!(self, OutputFormat::Pretty | OutputFormat::Plain)
    }
}

/// Print `value` as JSON or YAML. Human formats print nothing.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Pretty | OutputFormat::Plain => {}
    }
    Ok(())
}

// ============================================================================
// Semantic Styling - Centralized color/style decisions
// ============================================================================

/// Status lifecycle colors.
/// - Green: active work
/// - Yellow: blocked/waiting
/// - Blue: planning phase
/// - Dimmed: terminal states
pub fn style_status(status: &str) -> ColoredString {
    match threads::thread::base_status(status) {
        "active" => status.green(),
        "blocked" | "paused" => status.yellow(),
        "planning" | "idea" => status.blue(),
        "resolved" | "superseded" | "deferred" | "rejected" => status.dimmed(),
        _ => status.normal(),
    }
}

/// Style for IDs and hashes - always dimmed.
pub fn style_id(id: &str) -> ColoredString {
    id.dimmed()
}

/// Style for paths - dimmed by default, bold if it's PWD.
pub fn style_path(path: &str, is_pwd: bool) -> String {
    if is_pwd {
        path.bold().to_string()
    } else {
        path.dimmed().to_string()
    }
}

// ============================================================================
// Hints
// ============================================================================

/// Reminder that a change was written but not committed.
pub fn print_uncommitted_hint(id: &str) {
    eprintln!(
        "Note: Thread {} has uncommitted changes. Use 'threads commit {}' when ready.",
        id, id
    );
}

// ============================================================================
// Terminal utilities
// ============================================================================

/// Get terminal width, defaulting to 80 if unavailable.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Truncate a string from the front, showing "..suffix".
/// Useful for paths where the end is more meaningful.
pub fn truncate_front(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else if max_chars <= 2 {
        "..".to_string()
    } else {
        let skip = char_count - (max_chars - 2);
        let truncated: String = s.chars().skip(skip).collect();
        format!("..{}", truncated)
    }
}

/// Truncate a string from the back, showing "prefix…".
pub fn truncate_back(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else if max_chars <= 1 {
        "…".to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 1).collect();
        format!("{}…", truncated)
    }
}
