//! Local library cache
//!
//! The libraries map is a tree of `repo-root | library | version | variant`
//! nodes discovered from the declared repositories. Each leaf corresponds to
//! a VCS working copy under its repository's cache root:
//!
//! ```text
//! <cache_root>/<library>/<version>/<variant>
//! ```
//!
//! # Leaf States
//!
//! | Payload | On disk | Sync does |
//! |---------|---------|-----------|
//! | Uncached | absent | checkout |
//! | Uncached | present (stale) | remove, checkout |
//! | Cached | absent | checkout |
//! | Cached | present | update if the remote revision differs |

pub mod coordinate;
pub mod discover;
pub mod index;
pub mod leaves;
pub mod payload;
pub mod tree;
pub mod variant;

pub use coordinate::{CacheLocation, Coordinate, KEY_DELIMITER};
pub use discover::discover;
pub use index::{carry_payloads, LibrariesIndex};
pub use leaves::Leaves;
pub use payload::{Payload, Revision};
pub use tree::{
    CacheConflict, CacheLib, CacheTree, ConsistencyReport, LeafRemoval, LeafSync, RemoveSummary,
    SyncOptions, SyncSummary, UPGRADE_HINT,
};
pub use variant::{BuildMode, Platform};
