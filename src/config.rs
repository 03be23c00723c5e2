//! Configuration system for threads CLI.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. CLI flags (highest priority, applied by the commands)
//! 2. Environment variables (THREADS_*)
//! 3. Project manifests (.threads-config/manifest.yaml, root to cwd)
//! 4. User global (~/.config/threads/config.yaml)
//! 5. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

pub const ENV_AUTO_COMMIT: &str = "THREADS_AUTO_COMMIT";
pub const ENV_PUSH: &str = "THREADS_PUSH";
pub const ENV_QUIET: &str = "THREADS_QUIET";
pub const ENV_DEFAULT_STATUS: &str = "THREADS_DEFAULT_STATUS";
pub const ENV_LEGACY_WORKSPACE: &str = "THREADS_LEGACY_WORKSPACE";
pub const ENV_DOWN: &str = "THREADS_DOWN";
pub const ENV_UP: &str = "THREADS_UP";

/// An environment variable the CLI reads, for `threads config env`.
pub struct EnvVarInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub default: &'static str,
    pub config_path: &'static str,
}

pub const ENV_VARS: &[EnvVarInfo] = &[
    EnvVarInfo {
        name: ENV_AUTO_COMMIT,
        description: "Commit after every mutating command (1/true/yes or 0/false/no)",
        default: "false",
        config_path: "behavior.auto_commit",
    },
    EnvVarInfo {
        name: ENV_PUSH,
        description: "Push after committing; a failed push only warns",
        default: "false",
        config_path: "behavior.push",
    },
    EnvVarInfo {
        name: ENV_QUIET,
        description: "Suppress hints",
        default: "false",
        config_path: "behavior.quiet",
    },
    EnvVarInfo {
        name: ENV_DEFAULT_STATUS,
        description: "Status for new threads",
        default: "idea",
        config_path: "defaults.new",
    },
    EnvVarInfo {
        name: ENV_LEGACY_WORKSPACE,
        description: "Take the workspace root from $WORKSPACE",
        default: "false",
        config_path: "workspace.legacy_env",
    },
    EnvVarInfo {
        name: ENV_DOWN,
        description: "Default --down depth (number, or 'unlimited')",
        default: "unset",
        config_path: "behavior.default_down",
    },
    EnvVarInfo {
        name: ENV_UP,
        description: "Default --up depth (number, or 'unlimited')",
        default: "unset",
        config_path: "behavior.default_up",
    },
    EnvVarInfo {
        name: crate::logging::LOG_ENV,
        description: "Log filter (tracing EnvFilter syntax), falls back to RUST_LOG",
        default: "warn",
        config_path: "-",
    },
    EnvVarInfo {
        name: crate::workspace::WORKSPACE_ENV,
        description: "Workspace root in legacy mode",
        default: "unset",
        config_path: "-",
    },
];

/// Manifest file name within .threads-config/
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Config directory name
pub const CONFIG_DIR: &str = ".threads-config";

// ============================================================================
// Config Structs
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub display: DisplayConfig,
    pub behavior: BehaviorConfig,
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Status for new threads
    pub new: String,
    /// Status when reopening threads
    pub open: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            new: "idea".to_string(),
            open: "active".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Custom name for repo root (null = "repo root")
    pub root_name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Commit after every mutation
    pub auto_commit: bool,
    /// Push after committing; failures only warn
    pub push: bool,
    /// Suppress hints
    pub quiet: bool,
    /// Allow scopes inside nested git repositories
    pub allow_nested: bool,
    /// Default --down depth for list/stats (0 = unlimited)
    pub default_down: Option<usize>,
    /// Default --up depth for list/stats (0 = unlimited)
    pub default_up: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Take the root from $WORKSPACE instead of the enclosing git repository
    pub legacy_env: bool,
}

// ============================================================================
// Config Source Tracking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    UserGlobal,
    ProjectManifest(String),
    EnvVar(String),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::UserGlobal => write!(f, "~/.config/threads/config.yaml"),
            ConfigSource::ProjectManifest(path) => write!(f, "{}", path),
            ConfigSource::EnvVar(name) => write!(f, "${}", name),
        }
    }
}

/// Result of loading configuration with source tracking.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// Sources that contributed, in order of application
    pub sources: Vec<ConfigSource>,
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// 1/true/yes and 0/false/no in any case; anything else reads as unset.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// A depth: a number, or "unlimited" for 0.
pub fn parse_depth(value: &str) -> Option<usize> {
    if value.eq_ignore_ascii_case("unlimited") {
        Some(0)
    } else {
        value.parse().ok()
    }
}

/// Returns `Some(value)` if set and non-empty.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

pub fn env_bool(name: &str) -> Option<bool> {
    env_string(name).as_deref().and_then(parse_bool)
}

// ============================================================================
// Config Loading
// ============================================================================

/// Load configuration from all sources.
pub fn load_config(root: &Path, cwd: &Path) -> LoadedConfig {
    load_config_from(root, cwd, user_config_path().as_deref(), env_string)
}

/// Load configuration with an explicit user config path and environment lookup.
pub fn load_config_from<F>(root: &Path, cwd: &Path, user: Option<&Path>, lookup: F) -> LoadedConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = Value::Mapping(Mapping::new());
    let mut sources = vec![ConfigSource::Default];

    if let Some(layer) = user.and_then(load_manifest_value) {
        merge(&mut merged, layer);
        sources.push(ConfigSource::UserGlobal);
    }

    for path in collect_manifest_paths(root, cwd) {
        if let Some(layer) = load_manifest_value(&path) {
            let rel = path
                .strip_prefix(root)
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|_| path.to_string_lossy().to_string());
            merge(&mut merged, layer);
            sources.push(ConfigSource::ProjectManifest(rel));
        }
    }

    let mut config = match serde_yaml::from_value::<Config>(merged) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "merged config is invalid, using defaults");
            Config::default()
        }
    };
    sources.extend(apply_env(&mut config, lookup));
    tracing::debug!(sources = sources.len(), "loaded config");
    LoadedConfig { config, sources }
}

/// Whether the root should come from $WORKSPACE.
///
/// Decided before the root is known, so only the user config and env count.
pub fn legacy_workspace_requested() -> bool {
    env_bool(ENV_LEGACY_WORKSPACE).unwrap_or_else(|| {
        user_config_path()
            .and_then(|p| load_manifest(&p))
            .is_some_and(|c| c.workspace.legacy_env)
    })
}

/// Overlay THREADS_* variables, returning the ones that were applied.
fn apply_env<F>(config: &mut Config, lookup: F) -> Vec<ConfigSource>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut applied = Vec::new();
    let mut note = |name: &str| applied.push(ConfigSource::EnvVar(name.to_string()));

    if let Some(v) = get(ENV_AUTO_COMMIT).as_deref().and_then(parse_bool) {
        config.behavior.auto_commit = v;
        note(ENV_AUTO_COMMIT);
    }
    if let Some(v) = get(ENV_PUSH).as_deref().and_then(parse_bool) {
        config.behavior.push = v;
        note(ENV_PUSH);
    }
    if let Some(v) = get(ENV_QUIET).as_deref().and_then(parse_bool) {
        config.behavior.quiet = v;
        note(ENV_QUIET);
    }
    if let Some(v) = get(ENV_DEFAULT_STATUS) {
        config.defaults.new = v;
        note(ENV_DEFAULT_STATUS);
    }
    if let Some(v) = get(ENV_LEGACY_WORKSPACE).as_deref().and_then(parse_bool) {
        config.workspace.legacy_env = v;
        note(ENV_LEGACY_WORKSPACE);
    }
    if let Some(v) = get(ENV_DOWN).as_deref().and_then(parse_depth) {
        config.behavior.default_down = Some(v);
        note(ENV_DOWN);
    }
    if let Some(v) = get(ENV_UP).as_deref().and_then(parse_depth) {
        config.behavior.default_up = Some(v);
        note(ENV_UP);
    }
    applied
}

/// Get the user config file path (~/.config/threads/config.yaml).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("threads").join("config.yaml"))
}

/// Load a manifest file, returning None if it doesn't exist or can't be parsed.
pub fn load_manifest(path: &Path) -> Option<Config> {
    load_manifest_value(path).and_then(|layer| serde_yaml::from_value(layer).ok())
}

/// Raw YAML of a manifest that also reads as a valid `Config`.
fn load_manifest_value(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    let layer = match serde_yaml::from_str::<Value>(&content) {
        Ok(Value::Null) => Value::Mapping(Mapping::new()),
        Ok(layer) => layer,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            return None;
        }
    };
    if let Err(e) = serde_yaml::from_value::<Config>(layer.clone()) {
        tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
        return None;
    }
    Some(layer)
}

/// Manifest paths from root to cwd (inclusive), root first.
fn collect_manifest_paths(root: &Path, cwd: &Path) -> Vec<PathBuf> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
    let rel = cwd.strip_prefix(&root).unwrap_or(Path::new(""));

    let mut current = root.clone();
    let mut dirs = vec![current.clone()];
    for component in rel.components() {
        current.push(component);
        dirs.push(current.clone());
    }

    dirs.into_iter()
        .map(|d| d.join(CONFIG_DIR).join(MANIFEST_FILE))
        .filter(|m| m.exists())
        .collect()
}

/// Merge an overlay layer into `base`.
///
/// Mappings merge key by key; any other value set in the overlay replaces the
/// base value, so an explicit `false` in a closer manifest wins.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Commented manifest written by `threads config init`.
pub fn template_manifest() -> &'static str {
    r#"# threads configuration manifest
# Applies to this directory and everything below it.
# Manifests closer to the working directory win.

defaults:
  # Status for new threads
  new: idea
  # Status when reopening threads
  open: active

behavior:
  auto_commit: false
  push: false
  quiet: false
  # Allow scopes inside nested git repositories
  allow_nested: false
  # Default search depth for list/stats (0 = unlimited, omit for none)
  # default_down: 0
  # default_up: 0

# display:
#   root_name: workspace
"#
}

/// Check if quiet mode is enabled (suppress hints).
pub fn is_quiet(config: &Config) -> bool {
    config.behavior.quiet
}

/// Get the display name for the repo root.
pub fn root_name(config: &Config) -> &str {
    config.display.root_name.as_deref().unwrap_or("repo root")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn layer(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn write_manifest(dir: &Path, yaml: &str) {
        fs::create_dir_all(dir.join(CONFIG_DIR)).unwrap();
        fs::write(dir.join(CONFIG_DIR).join(MANIFEST_FILE), yaml).unwrap();
    }

    #[test]
    fn test_parse_bool() {
        let cases = vec![
            ("1", Some(true)),
            ("TRUE", Some(true)),
            ("yes", Some(true)),
            ("0", Some(false)),
            ("no", Some(false)),
            ("", None),
            ("maybe", None),
        ];
        for (value, want) in cases {
            assert_eq!(parse_bool(value), want, "value {:?}", value);
        }
    }

    #[test]
    fn test_parse_depth() {
        let cases = vec![
            ("3", Some(3)),
            ("unlimited", Some(0)),
            ("0", Some(0)),
            ("deep", None),
        ];
        for (value, want) in cases {
            assert_eq!(parse_depth(value), want, "value {:?}", value);
        }
    }

    #[test]
    fn test_apply_env() {
        let vars: HashMap<&str, &str> = [
            (ENV_AUTO_COMMIT, "yes"),
            (ENV_PUSH, "maybe"),
            (ENV_QUIET, ""),
            (ENV_UP, "unlimited"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        let applied = apply_env(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert!(config.behavior.auto_commit);
        assert!(!config.behavior.push);
        assert_eq!(config.behavior.default_up, Some(0));
        assert_eq!(
            applied,
            vec![
                ConfigSource::EnvVar(ENV_AUTO_COMMIT.to_string()),
                ConfigSource::EnvVar(ENV_UP.to_string()),
            ]
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.defaults.new, "idea");
        assert_eq!(config.defaults.open, "active");
        assert!(!config.behavior.auto_commit);
        assert!(!config.workspace.legacy_env);
        assert_eq!(root_name(&config), "repo root");
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut merged = layer("defaults:\n  new: planning\nbehavior:\n  push: true\n  quiet: true\n");
        merge(&mut merged, layer("behavior:\n  push: false\n  default_down: 0\n"));
        let config: Config = serde_yaml::from_value(merged).unwrap();

        assert_eq!(config.defaults.new, "planning");
        assert_eq!(config.defaults.open, "active");
        assert!(!config.behavior.push);
        assert!(config.behavior.quiet);
        assert_eq!(config.behavior.default_down, Some(0));
    }

    #[test]
    fn test_manifest_parse_partial() {
        let config: Config = serde_yaml::from_str("behavior:\n  push: true\n").unwrap();
        assert!(config.behavior.push);
        assert_eq!(config.defaults, DefaultsConfig::default());
    }

    #[test]
    fn test_load_config_walks_manifests() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let sub = root.join("svc/api");
        write_manifest(&root, "defaults:\n  new: planning\n");
        write_manifest(&sub, "behavior:\n  auto_commit: true\n");

        let paths = collect_manifest_paths(&root, &sub);
        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with(root.join(CONFIG_DIR)));

        let loaded = load_config_from(&root, &sub, None, no_env);
        assert_eq!(loaded.config.defaults.new, "planning");
        assert!(loaded.config.behavior.auto_commit);
        assert!(
            loaded
                .sources
                .contains(&ConfigSource::ProjectManifest("svc/api/.threads-config/manifest.yaml".to_string()))
        );
    }

    #[test]
    fn test_closer_manifest_can_turn_settings_off() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let user = root.join("user.yaml");
        fs::write(
            &user,
            "behavior:\n  auto_commit: true\n  push: true\n  allow_nested: true\n",
        )
        .unwrap();
        let sub = root.join("svc");
        write_manifest(&root, "behavior:\n  push: false\n");
        write_manifest(&sub, "behavior:\n  allow_nested: false\n");

        let loaded = load_config_from(&root, &sub, Some(&user), no_env);
        assert!(loaded.config.behavior.auto_commit);
        assert!(!loaded.config.behavior.push);
        assert!(!loaded.config.behavior.allow_nested);
        assert_eq!(loaded.sources[1], ConfigSource::UserGlobal);
    }

    #[test]
    fn test_invalid_manifest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write_manifest(&root, "behavior:\n  push: sometimes\n");

        let loaded = load_config_from(&root, &root, None, no_env);
        assert_eq!(loaded.config, Config::default());
        assert_eq!(loaded.sources, vec![ConfigSource::Default]);
    }

    #[test]
    fn test_env_overrides_manifest() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        write_manifest(&root, "defaults:\n  new: planning\n");

        let loaded = load_config_from(&root, &root, None, |name| match name {
            ENV_DEFAULT_STATUS => Some("active".to_string()),
            ENV_DOWN => Some("unlimited".to_string()),
            _ => None,
        });
        assert_eq!(loaded.config.defaults.new, "active");
        assert_eq!(loaded.config.behavior.default_down, Some(0));
        assert!(
            loaded
                .sources
                .contains(&ConfigSource::EnvVar(ENV_DEFAULT_STATUS.to_string()))
        );
    }

    #[test]
    fn test_template_manifest_parses() {
        let config: Config = serde_yaml::from_str(template_manifest()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Default.to_string(), "default");
        assert_eq!(
            ConfigSource::EnvVar("THREADS_PUSH".to_string()).to_string(),
            "$THREADS_PUSH"
        );
    }
}
