use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::version::verdict::CompareMode;

// =============================================================================
// Defaults
// =============================================================================

/// Registry used for references without a registry part
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Docker Hub namespace for official images
pub const DEFAULT_NAMESPACE: &str = "library";

/// Tag assumed for untagged Docker Hub references
pub const DEFAULT_TAG: &str = "latest";

/// Largest accepted jump of the major version, see `Filter::HugeGap`
pub const DEFAULT_MAX_MAJOR_GAP: u64 = 1000;

/// User agent sent to registries
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown version level: {0}")]
    UnknownKeepLevel(String),
}

/// Restricts candidate tags to the base version's major or major.minor line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeepLevel {
    #[default]
    None,
    Major,
    Minor,
}

impl KeepLevel {
    /// Parse a configured level; unknown values are logged and mean no level.
    pub fn from_config(value: &str) -> Self {
        value.parse().unwrap_or_else(|e: ConfigError| {
            warn!("Ignoring {}", e);
            KeepLevel::None
        })
    }
}

impl FromStr for KeepLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(KeepLevel::None),
            "major" => Ok(KeepLevel::Major),
            "minor" => Ok(KeepLevel::Minor),
            _ => Err(ConfigError::UnknownKeepLevel(s.to_string())),
        }
    }
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub check: CheckConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub normalize: NormalizeConfig,
}

/// Tag selection and comparison options
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    /// Drop alpha, beta and rc pre-releases
    pub exclude_prerelease: bool,
    /// Only compare tags carrying exactly the requested label
    pub strict_labels: bool,
    /// Skip references whose tag is no semantic version before fetching
    pub skip_non_semver: bool,
    /// "major", "minor" or empty
    pub keep: String,
    /// Treat partial base versions ("8.4") as ranges when judging equality
    pub partial_equal: bool,
    pub max_major_gap: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            exclude_prerelease: false,
            strict_labels: false,
            skip_non_semver: false,
            keep: String::new(),
            partial_equal: false,
            max_major_gap: DEFAULT_MAX_MAJOR_GAP,
        }
    }
}

impl CheckConfig {
    pub fn keep_level(&self) -> KeepLevel {
        KeepLevel::from_config(&self.keep)
    }

    pub fn compare_mode(&self) -> CompareMode {
        if self.partial_equal {
            CompareMode::Partial
        } else {
            CompareMode::Exact
        }
    }
}

/// Registry access options
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    /// Concurrent fetches per registry host, 0 means unbounded
    pub limit_per_registry: usize,
    /// Timeout per fetch in seconds, 0 means none
    pub timeout_secs: u64,
    /// Path to a credential store, reserved for authenticated registries
    pub auth_file: Option<PathBuf>,
}

/// Report rendering options
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub show_old: bool,
    pub show_stats: bool,
    pub simple_markers: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// Short-name normalization options
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizeConfig {
    pub default_registry: String,
    pub docker_hub_namespace: String,
    pub default_tag: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            default_registry: DEFAULT_REGISTRY.to_string(),
            docker_hub_namespace: DEFAULT_NAMESPACE.to_string(),
            default_tag: DEFAULT_TAG.to_string(),
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the explicitly given file, or the default file if it exists, or
    /// fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = config_path();
                if path.is_file() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Returns the path to the configuration directory for cciu.
/// Uses $XDG_CONFIG_HOME/cciu if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/cciu,
/// or ./cciu if neither is available.
pub fn config_dir() -> PathBuf {
    config_dir_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default configuration file.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

fn config_dir_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join(env!("CARGO_PKG_NAME"))
}
