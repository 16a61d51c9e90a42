//! Configuration schema for buildc
//!
//! Configuration is stored at `~/.config/buildc/config.toml`

use crate::cache::variant::{BuildMode, Platform};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Declared repositories, in order. Each entry is
    /// `[url]`, `[url, cache_root]` or `[url, cache_root, reserved]`.
    pub repositories: Vec<Vec<String>>,

    /// General settings
    pub general: GeneralConfig,

    /// Local cache settings
    pub cache: CacheConfig,

    /// Version control client settings
    pub vcs: VcsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Parent directory for repositories declared without a cache root
    pub default_root: String,

    /// Libraries map location (defaults to the state directory)
    pub index_path: Option<PathBuf>,

    /// Build mode used when a command doesn't specify one
    pub mode: BuildMode,

    /// CPU part of the variant token (defaults to the host architecture)
    pub cpu: Option<String>,

    /// System part of the variant token (defaults to the host OS)
    pub system: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_root: "~/buildc_libs".to_string(),
            index_path: None,
            mode: BuildMode::Release,
            cpu: None,
            system: None,
        }
    }
}

impl CacheConfig {
    /// Platform used to build variant tokens, host values unless overridden
    pub fn platform(&self) -> Platform {
        let host = Platform::host();
        Platform::new(
            self.cpu.clone().unwrap_or(host.cpu),
            self.system.clone().unwrap_or(host.system),
        )
    }
}

/// Version control client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    /// Client executable
    pub program: String,

    /// Downgrade checkout/update failures to warnings during `cache update`
    pub ignore_errors: bool,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            program: "svn".to_string(),
            ignore_errors: false,
        }
    }
}
