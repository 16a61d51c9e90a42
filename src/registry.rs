//! Repository registry
//!
//! Holds the declared repositories in configuration order and maps each
//! remote repository root to its local cache root.

use crate::config::Config;
use crate::error::{BuildcError, BuildcResult};
use std::path::{Path, PathBuf};

/// One declared repository: `(url, [cache_root], [reserved])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    url: String,
    cache_root: Option<String>,
    reserved: Option<String>,
}

impl RepositoryDescriptor {
    /// Build a descriptor from its raw configuration fields
    ///
    /// Accepts 1 to 3 fields; any other count is a configuration error.
    pub fn from_fields(fields: &[String]) -> BuildcResult<Self> {
        match fields {
            [url] => Ok(Self {
                url: url.clone(),
                cache_root: None,
                reserved: None,
            }),
            [url, cache_root] => Ok(Self {
                url: url.clone(),
                cache_root: Some(cache_root.clone()),
                reserved: None,
            }),
            [url, cache_root, reserved] => Ok(Self {
                url: url.clone(),
                cache_root: Some(cache_root.clone()),
                reserved: Some(reserved.clone()),
            }),
            _ => Err(BuildcError::DescriptorFieldCount {
                count: fields.len(),
                fields: fields.to_vec(),
            }),
        }
    }

    /// Remote repository root URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Explicit cache root, if declared
    pub fn cache_root(&self) -> Option<&str> {
        self.cache_root.as_deref()
    }

    /// Third field, carried but unused
    pub fn reserved(&self) -> Option<&str> {
        self.reserved.as_deref()
    }

    /// Last path segment of the URL, used to name the default cache root
    pub fn url_basename(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Declared repositories plus the directory that hosts default cache roots
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<RepositoryDescriptor>,
    default_root: PathBuf,
}

impl Registry {
    /// Create a registry from already-validated descriptors
    pub fn new(descriptors: Vec<RepositoryDescriptor>, default_root: impl AsRef<str>) -> Self {
        Self {
            descriptors,
            default_root: expand_home(default_root.as_ref()),
        }
    }

    /// Build the registry from the `repositories` list in `config`
    pub fn from_config(config: &Config) -> BuildcResult<Self> {
        let descriptors = config
            .repositories
            .iter()
            .map(|fields| RepositoryDescriptor::from_fields(fields))
            .collect::<BuildcResult<Vec<_>>>()?;

        Ok(Self::new(descriptors, &config.cache.default_root))
    }

    /// Declared repositories in configuration order
    pub fn descriptors(&self) -> &[RepositoryDescriptor] {
        &self.descriptors
    }

    /// Declared URLs in configuration order, duplicates included
    pub fn urls(&self) -> impl Iterator<Item = &str> + '_ {
        self.descriptors.iter().map(RepositoryDescriptor::url)
    }

    /// Directory hosting the cache roots of repositories without an explicit one
    pub fn default_root(&self) -> &Path {
        &self.default_root
    }

    /// Cache root for a descriptor, with `~` expanded
    pub fn cache_root_of(&self, descriptor: &RepositoryDescriptor) -> PathBuf {
        match descriptor.cache_root() {
            Some(root) => expand_home(root),
            None => self.default_root.join(descriptor.url_basename()),
        }
    }

    /// Resolve a remote repository root to its cache root
    ///
    /// The first declared entry with exactly this URL wins.
    pub fn resolve_cache_root(&self, remote_root: &str) -> Option<PathBuf> {
        self.descriptors
            .iter()
            .find(|d| d.url() == remote_root)
            .map(|d| self.cache_root_of(d))
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
