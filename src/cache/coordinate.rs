//! Logical coordinates of cached libraries
//!
//! A coordinate is the four-segment path `repo-root | library | version |
//! variant`. It renders to a `|`-joined logical key for tree lookups, to a
//! remote URL, and, given a cache root, to the on-disk directories.

use std::fmt;
use std::path::{Path, PathBuf};

/// Separator of the logical key
pub const KEY_DELIMITER: char = '|';

/// Number of segments in a fully-qualified coordinate
pub const DEPTH: usize = 4;

/// Fully-qualified library coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub repo_root: String,
    pub library: String,
    pub version: String,
    pub variant: String,
}

impl Coordinate {
    pub fn new(
        repo_root: impl Into<String>,
        library: impl Into<String>,
        version: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            library: library.into(),
            version: version.into(),
            variant: variant.into(),
        }
    }

    /// Build from tree path segments; `None` unless there are exactly four
    pub fn from_segments(segments: &[&str]) -> Option<Self> {
        match segments {
            [repo_root, library, version, variant] => {
                Some(Self::new(*repo_root, *library, *version, *variant))
            }
            _ => None,
        }
    }

    /// Parse a `|`-joined logical key
    pub fn parse(key: &str) -> Option<Self> {
        let segments: Vec<&str> = key.split(KEY_DELIMITER).collect();
        Self::from_segments(&segments)
    }

    /// Segments in tree order
    pub fn segments(&self) -> [&str; DEPTH] {
        [
            self.repo_root.as_str(),
            self.library.as_str(),
            self.version.as_str(),
            self.variant.as_str(),
        ]
    }

    /// `|`-joined logical key used for tree lookups
    pub fn logical_key(&self) -> String {
        let delimiter = KEY_DELIMITER.to_string();
        self.segments().join(delimiter.as_str())
    }

    /// Remote URL of the variant directory
    pub fn remote_url(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.repo_root,
            self.library,
            self.version,
            self.variant
        )
    }

    /// On-disk directories of this coordinate under `cache_root`
    pub fn locate(&self, cache_root: &Path) -> CacheLocation {
        let name_dir = cache_root.join(&self.library);
        let version_dir = name_dir.join(&self.version);
        let leaf_dir = version_dir.join(&self.variant);
        CacheLocation {
            cache_root: cache_root.to_path_buf(),
            name_dir,
            version_dir,
            leaf_dir,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_key())
    }
}

/// Directories a cached leaf occupies, innermost last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub cache_root: PathBuf,
    pub name_dir: PathBuf,
    pub version_dir: PathBuf,
    pub leaf_dir: PathBuf,
}

impl CacheLocation {
    /// Ancestors eligible for pruning, nearest first, stopping at the cache root
    pub fn prunable_ancestors(&self) -> [&Path; 3] {
        [
            self.version_dir.as_path(),
            self.name_dir.as_path(),
            self.cache_root.as_path(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate() -> Coordinate {
        Coordinate::new("https://host/repoA", "libX", "2.0", "cpu1_re_linux")
    }

    #[test]
    fn logical_key_round_trip() {
        let key = coordinate().logical_key();
        assert_eq!(key, "https://host/repoA|libX|2.0|cpu1_re_linux");
        assert_eq!(Coordinate::parse(&key), Some(coordinate()));
    }

    #[test]
    fn parse_rejects_wrong_depth() {
        assert!(Coordinate::parse("https://host/repoA|libX|2.0").is_none());
        assert!(Coordinate::parse("a|b|c|d|e").is_none());
    }

    #[test]
    fn remote_url_substitutes_separators() {
        assert_eq!(
            coordinate().remote_url(),
            "https://host/repoA/libX/2.0/cpu1_re_linux"
        );
    }

    #[test]
    fn locate_derives_parent_directories() {
        let location = coordinate().locate(Path::new("/cache/repoA"));
        assert_eq!(
            location.leaf_dir,
            PathBuf::from("/cache/repoA/libX/2.0/cpu1_re_linux")
        );
        assert_eq!(location.version_dir, PathBuf::from("/cache/repoA/libX/2.0"));
        assert_eq!(location.name_dir, PathBuf::from("/cache/repoA/libX"));
        assert_eq!(
            location.prunable_ancestors(),
            [
                Path::new("/cache/repoA/libX/2.0"),
                Path::new("/cache/repoA/libX"),
                Path::new("/cache/repoA"),
            ]
        );
    }
}
