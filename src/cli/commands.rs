use url::Url;

use crate::app::{AppContext, FreshetError, Result};
use crate::reconcile::{StoreApplier, UpdateReconciler};
use crate::store::Store;

pub async fn add_feed(ctx: &AppContext, url: &str) -> Result<()> {
    Url::parse(url)?;

    if ctx.store.get_feed(url)?.is_some() {
        println!("Already subscribed: {}", url);
        return Ok(());
    }

    // Fetch first so a dead URL doesn't leave an empty subscription behind.
    let fetched = ctx.fetcher.request_feed(url).await?;

    ctx.store.add_feed(&fetched.feed)?;
    let entry_count = fetched.entries.len();

    // First reconciliation runs against the empty snapshot: everything is new.
    let mut reconciler = UpdateReconciler::new();
    reconciler.submit_initial_feed(&fetched.feed);
    reconciler.submit_initial_entries(&[]);
    let mut applier = StoreApplier::new(ctx.store.as_ref());
    reconciler.submit_new_data(fetched.feed.clone(), fetched.entries, &mut applier)?;

    println!("Subscribed to {}", fetched.feed.display_title());
    println!("Fetched {} entries", entry_count);
    Ok(())
}

pub fn remove_feed(ctx: &AppContext, url: &str) -> Result<()> {
    let feed = ctx
        .store
        .get_feed(url)?
        .ok_or_else(|| FreshetError::FeedNotFound(url.to_string()))?;

    ctx.store.delete_feed_and_entries(&feed.url)?;
    println!("Unsubscribed from {}", feed.display_title());
    Ok(())
}

/// Fetch and reconcile every subscribed feed, reporting per-feed deltas.
pub async fn update_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    if feeds.is_empty() {
        println!("No feeds to update");
        return Ok(());
    }

    println!("Updating {} feeds...", feeds.len());

    let mut errors = 0;
    for feed in feeds {
        let mut reconciler = UpdateReconciler::new();
        reconciler.submit_initial_feed(&feed);
        let stored_entries = ctx.store.get_entries_by_feed(&feed.url)?;
        reconciler.submit_initial_entries(&stored_entries);

        match ctx.fetcher.request_feed(&feed.url).await {
            Ok(fetched) => {
                let mut applier = StoreApplier::new(ctx.store.as_ref());
                reconciler.submit_new_data(fetched.feed, fetched.entries, &mut applier)?;
                let (added, updated) = applier.counts();
                if added + updated > 0 {
                    println!(
                        "  {}: {} added, {} updated",
                        feed.display_title(),
                        added,
                        updated
                    );
                }
            }
            Err(e) => {
                errors += 1;
                tracing::warn!(feed = %feed.url, error = %e, "update failed");
                println!("  {}: update failed ({})", feed.display_title(), e);
            }
        }
    }

    if errors > 0 {
        println!("Done with {} errors", errors);
    } else {
        println!("Done");
    }
    Ok(())
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    if feeds.is_empty() {
        println!("No feeds. Add one with: freshet add <url>");
        return Ok(());
    }

    for feed in feeds {
        let category = feed.category.as_deref().unwrap_or("-");
        println!(
            "{:>4} unread  [{}]  {}  {}",
            feed.unread_count,
            category,
            feed.display_title(),
            feed.url
        );
    }
    Ok(())
}

pub fn list_entries(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    for feed in feeds {
        let entries = ctx.store.get_entries_by_feed(&feed.url)?;
        if entries.is_empty() {
            continue;
        }
        println!("{}", feed.display_title());
        for entry in entries {
            let marker = if entry.is_starred {
                "*"
            } else if !entry.is_read {
                "o"
            } else {
                " "
            };
            let date = entry
                .published
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "          ".to_string());
            println!("  {} {} {}", marker, date, entry.display_title());
        }
    }
    Ok(())
}
