//! Build the libraries map by listing the declared repositories

use crate::cache::payload::Payload;
use crate::error::BuildcResult;
use crate::tree::{NodeId, Tree};
use crate::vcs::Vcs;
use tracing::{debug, info};

/// Levels below a repository root: library, version, variant
const LISTED_LEVELS: usize = 3;

/// List every declared repository down to its variant directories
///
/// Roots follow declaration order; a URL declared twice is listed once.
/// All nodes start out `Uncached`.
pub async fn discover<'a, I>(vcs: &dyn Vcs, urls: I) -> BuildcResult<Tree<Payload>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tree = Tree::new();

    for url in urls {
        if tree.roots().any(|root| tree.item_text(root) == url) {
            debug!("Skipping repeated repository {}", url);
            continue;
        }

        info!("Listing {}", url);
        let root = tree.append(None, url, Payload::Uncached);
        let mut pending: Vec<(NodeId, String, usize)> = vec![(root, url.to_string(), 0)];

        while let Some((parent, parent_url, depth)) = pending.pop() {
            if depth == LISTED_LEVELS {
                continue;
            }
            let mut children = Vec::new();
            for entry in vcs.list(&parent_url).await? {
                let child = tree.append(Some(parent), entry.as_str(), Payload::Uncached);
                children.push((child, format!("{}/{}", parent_url, entry), depth + 1));
            }
            // Reverse so the stack pops children in listing order
            pending.extend(children.into_iter().rev());
        }
    }

    Ok(tree)
}
