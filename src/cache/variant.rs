//! Build modes and platform variant tokens
//!
//! A variant token has the shape `<cpu>_<mode2>_<system>`, where `mode2` is
//! the first two letters of the build mode. Tokens are only ever matched by
//! looking for `_<mode2>_` inside them.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build mode a cached variant was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Optimized build
    #[default]
    Release,
    /// Debug build
    Debug,
}

impl BuildMode {
    /// Two-letter tag embedded in variant tokens
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Release => "re",
            Self::Debug => "de",
        }
    }

    /// Substring that marks a variant token as belonging to this mode
    pub fn marker(&self) -> String {
        format!("_{}_", self.tag())
    }

    /// Whether a variant token belongs to this mode
    pub fn matches(&self, variant: &str) -> bool {
        variant.contains(&self.marker())
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Release => "release",
            Self::Debug => "debug",
        };
        write!(f, "{}", name)
    }
}

/// CPU and system names used to build the local variant token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub cpu: String,
    pub system: String,
}

impl Platform {
    /// Create a platform from explicit names
    pub fn new(cpu: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            system: system.into(),
        }
    }

    /// The platform this binary runs on
    pub fn host() -> Self {
        Self::new(std::env::consts::ARCH, std::env::consts::OS)
    }

    /// Variant token for `mode` on this platform
    pub fn variant(&self, mode: BuildMode) -> String {
        format!("{}_{}_{}", self.cpu, mode.tag(), self.system)
    }
}
