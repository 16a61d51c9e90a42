//! Per-leaf cache state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, non-empty revision identifier reported by the VCS
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Wrap a revision string; `None` if it is empty after trimming
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == value.len() {
            Some(Self(value))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Revision {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "revision must not be empty".to_string())
    }
}

impl From<Revision> for String {
    fn from(revision: Revision) -> Self {
        revision.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a tree node is materialized in the local cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    /// Not currently on disk
    #[default]
    Uncached,
    /// Checked out at this revision
    Cached(Revision),
}

impl Payload {
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    /// Revision of a cached node
    pub fn revision(&self) -> Option<&Revision> {
        match self {
            Self::Cached(revision) => Some(revision),
            Self::Uncached => None,
        }
    }
}

impl From<Option<Revision>> for Payload {
    fn from(revision: Option<Revision>) -> Self {
        revision.map_or(Self::Uncached, Self::Cached)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncached => f.write_str("uncached"),
            Self::Cached(revision) => write!(f, "r{}", revision),
        }
    }
}
