//! Cache command - manage the local library cache

use crate::cache::{
    carry_payloads, discover, BuildMode, CacheLib, CacheTree, LibrariesIndex, Payload,
    SyncOptions, SyncSummary, UPGRADE_HINT,
};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat, SyncArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{BuildcError, BuildcResult};
use crate::registry::Registry;
use crate::tree::{NodeId, Tree};
use crate::ui::{self, SyncProgress, TaskSpinner, UiContext};
use crate::vcs::{create_vcs, SystemShell, Vcs};
use console::style;
use std::path::Path;
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> BuildcResult<()> {
    let ctx = UiContext::detect();
    let index_path = ConfigManager::index_path(config);

    match args.action {
        CacheAction::Init { sync, force } => init(&ctx, config, &index_path, sync, force).await,
        CacheAction::Upgrade { sync } => upgrade(&ctx, config, &index_path, sync).await,
        CacheAction::Check => check(&ctx, config, &index_path).await,
        CacheAction::Update { sync } => update(&ctx, config, &index_path, sync).await,
        CacheAction::List { mode, format } => {
            list(config, &index_path, mode.unwrap_or(config.cache.mode), format).await
        }
        CacheAction::Remove {
            mode,
            library,
            lib_version,
            yes,
        } => {
            let ctx = ctx.with_auto_yes(yes);
            let mode = mode.unwrap_or(config.cache.mode);
            remove(&ctx, config, &index_path, mode, library, lib_version).await
        }
    }
}

/// Bind a libraries map to the configured registry, VCS and platform
pub(crate) fn open(config: &Config, tree: Tree<Payload>) -> BuildcResult<CacheTree> {
    Ok(CacheTree::new(
        tree,
        Registry::from_config(config)?,
        create_vcs(config),
        Box::new(SystemShell::new()),
        config.cache.platform(),
    ))
}

/// Load the stored map and bind it
pub(crate) async fn open_index(config: &Config, index_path: &Path) -> BuildcResult<CacheTree> {
    let index = LibrariesIndex::require(index_path).await?;
    open(config, index.to_tree())
}

pub(crate) async fn save(cache: &CacheTree, index_path: &Path) -> BuildcResult<()> {
    LibrariesIndex::from_tree(cache.tree()).save(index_path).await
}

async fn init(
    ctx: &UiContext,
    config: &Config,
    index_path: &Path,
    sync: SyncArgs,
    force: bool,
) -> BuildcResult<()> {
    if index_path.exists() && !force {
        ui::step_warn_hint(
            ctx,
            &format!("Libraries map already exists at {}", index_path.display()),
            "Use --force to replace it, or run: buildc cache upgrade",
        );
        return Ok(());
    }

    let registry = Registry::from_config(config)?;
    let vcs = create_vcs(config);
    let tree = discover_tree(ctx, &*vcs, &registry).await?;

    let mut cache = open(config, tree)?;
    report_conflicts(ctx, &cache)?;
    let summary = sync_all(ctx, &mut cache, config, sync).await?;
    save(&cache, index_path).await?;

    print_summary(ctx, &summary);
    Ok(())
}

async fn upgrade(
    ctx: &UiContext,
    config: &Config,
    index_path: &Path,
    sync: SyncArgs,
) -> BuildcResult<()> {
    let registry = Registry::from_config(config)?;
    let vcs = create_vcs(config);
    let mut tree = discover_tree(ctx, &*vcs, &registry).await?;

    if let Some(previous) = LibrariesIndex::load(index_path).await? {
        let carried = carry_payloads(&mut tree, &previous.to_tree());
        debug!("Carried {} cached libraries into the new map", carried);
    }

    let mut cache = open(config, tree)?;
    report_conflicts(ctx, &cache)?;
    let summary = sync_all(ctx, &mut cache, config, sync).await?;
    save(&cache, index_path).await?;

    print_summary(ctx, &summary);
    Ok(())
}

async fn check(ctx: &UiContext, config: &Config, index_path: &Path) -> BuildcResult<()> {
    let cache = open_index(config, index_path).await?;
    report_conflicts(ctx, &cache)?;
    ensure_consistent(ctx, &cache)?;
    ui::step_ok(ctx, "Libraries map matches the repository configuration");
    Ok(())
}

async fn update(
    ctx: &UiContext,
    config: &Config,
    index_path: &Path,
    sync: SyncArgs,
) -> BuildcResult<()> {
    let mut cache = open_index(config, index_path).await?;
    report_conflicts(ctx, &cache)?;
    ensure_consistent(ctx, &cache)?;

    let summary = sync_all(ctx, &mut cache, config, sync).await?;
    save(&cache, index_path).await?;

    print_summary(ctx, &summary);
    Ok(())
}

async fn list(
    config: &Config,
    index_path: &Path,
    mode: BuildMode,
    format: OutputFormat,
) -> BuildcResult<()> {
    let cache = open_index(config, index_path).await?;
    let libs = cache.cache_libs(None, mode)?;

    if libs.is_empty() {
        println!("No {} libraries in the libraries map.", mode);
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_libs_table(&libs),
        OutputFormat::Json => print_libs_json(&libs)?,
        OutputFormat::Plain => print_libs_plain(&libs),
    }

    Ok(())
}

fn print_libs_table(libs: &[CacheLib]) {
    println!("{:<30} {:<15} {:<40}", "LIBRARY", "VERSION", "CACHE ROOT");
    println!("{}", "-".repeat(85));

    for lib in libs {
        println!(
            "{:<30} {:<15} {:<40}",
            lib.name,
            lib.version,
            lib.cache_root.display()
        );
    }

    println!();
    let plural = if libs.len() == 1 { "y" } else { "ies" };
    println!("Total: {} librar{}", libs.len(), plural);
}

fn print_libs_json(libs: &[CacheLib]) -> BuildcResult<()> {
    #[derive(serde::Serialize)]
    struct LibJson<'a> {
        name: &'a str,
        version: &'a str,
        cache_root: String,
    }

    let json_libs: Vec<LibJson<'_>> = libs
        .iter()
        .map(|lib| LibJson {
            name: &lib.name,
            version: &lib.version,
            cache_root: lib.cache_root.display().to_string(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_libs)?);
    Ok(())
}

fn print_libs_plain(libs: &[CacheLib]) {
    for lib in libs {
        println!("{} {} {}", lib.name, lib.version, lib.cache_root.display());
    }
}

async fn remove(
    ctx: &UiContext,
    config: &Config,
    index_path: &Path,
    mode: BuildMode,
    library: Option<String>,
    version: Option<String>,
) -> BuildcResult<()> {
    let mut cache = open_index(config, index_path).await?;
    let starts = removal_starts(cache.tree(), library.as_deref(), version.as_deref());

    let count: usize = starts.iter().map(|s| cache.leaves(*s, mode).count()).sum();
    if count == 0 {
        println!("No {} libraries to remove.", mode);
        return Ok(());
    }

    println!(
        "This will remove {} cached {} librar{}:",
        count,
        mode,
        if count == 1 { "y" } else { "ies" }
    );
    for start in &starts {
        for lib in cache.cache_libs(*start, mode)? {
            println!("  {} {} {}", style("•").red(), lib.name, lib.version);
        }
    }

    if !ui::confirm(ctx, "Remove these libraries?", false).await? {
        println!("Aborted.");
        return Ok(());
    }

    let mut removed = 0;
    let mut pruned = 0;
    for start in starts {
        let summary = cache.remove_tree(start, mode).await?;
        removed += summary.removed;
        pruned += summary.pruned;
    }
    save(&cache, index_path).await?;

    ui::step_ok_detail(
        ctx,
        &format!(
            "Removed {} working cop{}",
            removed,
            if removed == 1 { "y" } else { "ies" }
        ),
        &format!("{} empty directories pruned", pruned),
    );
    Ok(())
}

/// Nodes to remove below: every root, or each root's matching library/version
fn removal_starts(
    tree: &Tree<Payload>,
    library: Option<&str>,
    version: Option<&str>,
) -> Vec<Option<NodeId>> {
    let Some(library) = library else {
        return vec![None];
    };

    tree.roots()
        .filter_map(|root| {
            let root_text = tree.item_text(root);
            match version {
                Some(version) => tree.find([root_text, library, version]),
                None => tree.find([root_text, library]),
            }
        })
        .map(Some)
        .collect()
}

async fn discover_tree(
    ctx: &UiContext,
    vcs: &dyn Vcs,
    registry: &Registry,
) -> BuildcResult<Tree<Payload>> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Listing repositories...");

    match discover(vcs, registry.urls()).await {
        Ok(tree) => {
            spinner.stop(&format!("Found {} repositories", tree.roots().count()));
            Ok(tree)
        }
        Err(e) => {
            spinner.stop_error("Listing repositories failed");
            Err(e)
        }
    }
}

fn report_conflicts(ctx: &UiContext, cache: &CacheTree) -> BuildcResult<()> {
    for conflict in cache.check_local_cache_conflict()? {
        ui::step_warn_hint(
            ctx,
            &format!("Cache path conflict: {}", conflict),
            "Give each repository its own cache root",
        );
    }
    Ok(())
}

fn ensure_consistent(ctx: &UiContext, cache: &CacheTree) -> BuildcResult<()> {
    let report = cache.check_consistency();
    if report.is_consistent() {
        return Ok(());
    }

    for line in report.diagnostics() {
        ui::step_error(ctx, &line);
    }
    ui::remark(ctx, UPGRADE_HINT);
    Err(BuildcError::TreeInconsistent)
}

async fn sync_all(
    ctx: &UiContext,
    cache: &mut CacheTree,
    config: &Config,
    sync: SyncArgs,
) -> BuildcResult<SyncSummary> {
    let mode = sync.mode.unwrap_or(config.cache.mode);
    let options = SyncOptions {
        force_query: sync.fresh,
        ignore_errors: sync.ignore_errors || config.vcs.ignore_errors,
    };

    let leaves: Vec<NodeId> = cache.leaves(None, mode).collect();
    let mut progress = SyncProgress::new(ctx, "Syncing", leaves.len());
    let mut summary = SyncSummary::default();

    for leaf in leaves {
        let label = cache.tree().path_segments(leaf)[1..].join(" ");
        progress.start_item(&label);
        match cache.sync_leaf(leaf, options).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                progress.finish();
                return Err(e);
            }
        }
        progress.finish_item();
    }
    progress.finish();

    Ok(summary)
}

fn print_summary(ctx: &UiContext, summary: &SyncSummary) {
    ui::step_ok_detail(
        ctx,
        &format!("{} libraries in sync", summary.total()),
        &format!(
            "{} checked out, {} updated, {} unchanged",
            summary.checked_out, summary.updated, summary.unchanged
        ),
    );
}
