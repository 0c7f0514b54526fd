//! `watch` command: live category summaries.
//!
//! Saves made by this process are pushed straight through the store's
//! watches. Saves made by other processes only reach the snapshot file, so
//! the file is re-read on a fixed interval and changes are fanned out from
//! there.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tokio::time::MissedTickBehavior;
use trendlens_core::{CategoryKey, Popularity, Product};
use trendlens_store::{Catalog, MemoryStorage};

pub(crate) fn summary_line(category: CategoryKey, products: &[Product]) -> String {
    let high = products
        .iter()
        .filter(|p| p.popularity() == Popularity::High)
        .count();
    format!(
        "{category}: {} products, {high} high popularity",
        products.len()
    )
}

pub(crate) fn watch_banner(watched: usize, snapshot: Option<&Path>) -> String {
    match snapshot {
        Some(path) => format!(
            "watching {watched} categories in {}, press Ctrl-C to stop",
            path.display()
        ),
        None => format!("watching {watched} categories (in-memory), press Ctrl-C to stop"),
    }
}

/// Subscribes to `categories` and prints a summary on every delivery until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error if a watch cannot be started or Ctrl-C cannot be
/// listened for. Failed snapshot reloads are logged and retried on the next
/// tick.
pub(crate) async fn run_watch(
    catalog: &Catalog,
    storage: &MemoryStorage,
    categories: &[CategoryKey],
    interval_secs: u64,
) -> anyhow::Result<()> {
    let mut subscriptions = Vec::with_capacity(categories.len());
    for &category in categories {
        let subscription = catalog
            .subscribe(category, move |products| {
                println!("{}", summary_line(category, products));
            })
            .with_context(|| format!("failed to watch {category}"))?;
        subscriptions.push(subscription);
    }
    println!("{}", watch_banner(subscriptions.len(), storage.snapshot_path()));

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = storage.reload_snapshot().await {
                    tracing::warn!(error = %e, "snapshot reload failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    for subscription in subscriptions {
        subscription.unsubscribe().await;
    }
    Ok(())
}
