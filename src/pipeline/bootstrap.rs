// src/pipeline/bootstrap.rs

//! Bootstrap pass: seed the content store.
//!
//! Fetches the catalog listing, persists it as the baseline snapshot,
//! then downloads every recently modified CSV resource with one task per
//! resource. A semaphore caps concurrent downloads; retries happen
//! inside each task, so a deep backoff chain never blocks the others.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::models::Config;
use crate::services::{CatalogClient, RetryPolicy, create_client, fetch_with_backoff};
use crate::storage::{CatalogStore, ResourceKey};

/// Run the bootstrap pass.
pub async fn run_bootstrap(config: &Config, store: &dyn CatalogStore) -> Result<()> {
    let client = create_client(&config.http)?;
    let catalog = CatalogClient::new(client.clone(), &config.catalog);

    log::info!("Fetching catalog listing...");
    let (listing, raw) = catalog.fetch().await?;
    store.write_snapshot(&raw).await?;
    log::info!("Catalog lists {} datasets", listing.result.results.len());

    let cutoff =
        Utc::now().naive_utc() - chrono::Duration::days(config.sync.bootstrap_window_days);
    let policy = RetryPolicy::from_config(&config.sync);
    let limiter = Arc::new(Semaphore::new(config.http.max_connections_per_host));

    let mut tasks = JoinSet::new();
    let mut scheduled = 0usize;

    for dataset in &listing.result.results {
        for resource in &dataset.resources {
            if resource.format != "CSV" {
                continue;
            }
            let modified = match resource.modified_time() {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Skipping resource {}: {e}", resource.id);
                    continue;
                }
            };
            if modified <= cutoff {
                continue;
            }

            let key = ResourceKey::for_resource(dataset, resource);
            let dest = store.resource_path(&key);
            let client = client.clone();
            let url = resource.url.clone();
            let name = resource.name.clone();
            let limiter = Arc::clone(&limiter);

            scheduled += 1;
            tasks.spawn(async move {
                let Ok(_permit) = limiter.acquire_owned().await else {
                    return false;
                };
                match fetch_with_backoff(&client, &url, &dest, policy).await {
                    Ok(written) => {
                        log::info!("Downloaded {name} ({written} bytes)");
                        true
                    }
                    Err(e) => {
                        log::warn!("Giving up on {name}: {e}");
                        false
                    }
                }
            });
        }
    }

    log::info!("Downloading {scheduled} resources...");

    let mut failures = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(e) => {
                failures += 1;
                log::warn!("Download task failed: {e}");
            }
        }
    }

    if failures > 0 {
        log::warn!("{failures} of {scheduled} downloads failed");
    }
    log::info!("Bootstrap complete");
    Ok(())
}
