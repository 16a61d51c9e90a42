//! Dep command - fetch a single library for this platform

use crate::cli::args::DepArgs;
use crate::cli::commands::cache::{open_index, save};
use crate::config::{Config, ConfigManager};
use crate::error::{BuildcError, BuildcResult};
use crate::ui::{self, UiContext};

/// Execute the dep command
pub async fn execute(args: DepArgs, config: &Config) -> BuildcResult<()> {
    let ctx = UiContext::detect();
    let index_path = ConfigManager::index_path(config);
    let mode = args.mode.unwrap_or(config.cache.mode);

    let mut cache = open_index(config, &index_path).await?;
    let found = cache
        .sync_dependency(&args.library, &args.lib_version, mode, args.force)
        .await?;

    if !found {
        return Err(BuildcError::User(format!(
            "{} {} ({}) is not in the libraries map",
            args.library,
            args.lib_version,
            cache.platform().variant(mode)
        )));
    }

    save(&cache, &index_path).await?;
    ui::step_ok(
        &ctx,
        &format!("{} {} is available in the local cache", args.library, args.lib_version),
    );
    Ok(())
}
