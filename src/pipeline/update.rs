// src/pipeline/update.rs

//! Incremental synchronization pass.
//!
//! Walks the freshly fetched catalog sequentially, classifies every
//! resource against the baseline snapshot, and drives the
//! fetch → normalize → diff → format → notify → persist chain for each
//! new or updated one. The pass is deliberately single-file-at-a-time
//! with a pause between resources: the constraint being protected is the
//! delivery transport's rate tolerance, not the catalog's.

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::error::{AppError, Result};
use crate::models::{Config, ResourceRef, SyncConfig};
use crate::pipeline::diff::diff_lines;
use crate::pipeline::encoding::normalize;
use crate::pipeline::format::{ChangeKind, FormatterRegistry, build_payload};
use crate::services::{CatalogClient, Notifier, create_client, fetch_bytes};
use crate::storage::{CatalogStore, ResourceKey};

/// Why a resource was not processed this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared format is not CSV
    NotCsv,
    /// Resource id is on the exemption list
    Exempt,
    /// Declared size at or above the ceiling
    Oversized,
    /// Catalog timestamp not after the reference timestamp
    NotNewer,
    /// Stored file was already refreshed this epoch
    AlreadyCurrent,
    /// Catalog timestamp did not parse
    BadTimestamp,
}

/// Terminal state of one resource for this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Updated,
    Skipped(SkipReason),
}

/// Eligibility against catalog metadata alone.
fn check_eligibility(
    resource: &ResourceRef,
    sync: &SyncConfig,
    reference: NaiveDateTime,
) -> Option<SkipReason> {
    if resource.format != "CSV" {
        return Some(SkipReason::NotCsv);
    }
    if sync.exempt_resources.iter().any(|id| id == &resource.id) {
        return Some(SkipReason::Exempt);
    }
    if resource.size >= sync.max_resource_size {
        return Some(SkipReason::Oversized);
    }
    match resource.modified_time() {
        Err(_) => Some(SkipReason::BadTimestamp),
        Ok(modified) if modified <= reference => Some(SkipReason::NotNewer),
        Ok(_) => None,
    }
}

/// Full classification, consulting the stored file's state.
///
/// A stored file whose mtime is at or past the reference timestamp was
/// already refreshed during this epoch (e.g. by a bootstrap) and is
/// skipped rather than re-fetched.
async fn classify(
    store: &dyn CatalogStore,
    key: &ResourceKey,
    resource: &ResourceRef,
    sync: &SyncConfig,
    reference: NaiveDateTime,
) -> Result<Classification> {
    if let Some(reason) = check_eligibility(resource, sync, reference) {
        return Ok(Classification::Skipped(reason));
    }
    match store.resource_modified(key).await? {
        None => Ok(Classification::New),
        Some(mtime) if mtime.naive_utc() < reference => Ok(Classification::Updated),
        Some(_) => Ok(Classification::Skipped(SkipReason::AlreadyCurrent)),
    }
}

/// Counters for the run summary.
#[derive(Debug, Default)]
struct UpdateStats {
    created: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
    notified: usize,
}

/// Run the incremental diff-and-notify pass.
pub async fn run_update(config: &Config, store: &dyn CatalogStore) -> Result<()> {
    let client = create_client(&config.http)?;

    let notifier = Notifier::from_env(client.clone())?;
    notifier.check().await?;
    log::info!("Notification transport is reachable");

    let prior_raw = store.read_snapshot().await?.ok_or_else(|| {
        AppError::config("no baseline snapshot found; run 'sync --bootstrap' first")
    })?;
    let prior = CatalogClient::parse(&prior_raw)?;
    let reference = prior
        .reference_time()
        .ok_or_else(|| AppError::catalog("baseline snapshot has no datasets"))?;
    log::info!("Reference timestamp: {reference}");

    let catalog = CatalogClient::new(client.clone(), &config.catalog);
    let (listing, raw_listing) = catalog.fetch().await?;
    log::info!("Catalog lists {} datasets", listing.result.results.len());

    let registry = FormatterRegistry::from_config(&config.notify);
    let pause = Duration::from_secs(config.sync.notify_delay_secs);
    let mut stats = UpdateStats::default();

    for dataset in &listing.result.results {
        for resource in &dataset.resources {
            let key = ResourceKey::for_resource(dataset, resource);
            let kind = match classify(store, &key, resource, &config.sync, reference).await? {
                Classification::Skipped(reason) => {
                    log::debug!("Skipping {} ({reason:?})", resource.id);
                    stats.skipped += 1;
                    continue;
                }
                Classification::New => ChangeKind::New,
                Classification::Updated => ChangeKind::Updated,
            };

            tokio::time::sleep(pause).await;
            log::info!("Processing {:?} {} ({})", kind, resource.name, resource.url);

            let bytes = match fetch_bytes(&client, &resource.url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Fetch failed for {}: {e}", resource.url);
                    stats.failed += 1;
                    continue;
                }
            };

            let normalized = match normalize(bytes) {
                Ok(normalized) => normalized,
                Err(e) => {
                    log::warn!("Encoding failure for {}: {e}", resource.name);
                    stats.failed += 1;
                    continue;
                }
            };
            log::debug!("Detected charset {} for {}", normalized.charset, resource.id);

            let diff = match kind {
                ChangeKind::New => diff_lines(None, &normalized.text),
                ChangeKind::Updated => {
                    let old = store
                        .read_resource(&key)
                        .await?
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
                    diff_lines(old.as_deref(), &normalized.text)
                }
            };
            log::info!("{} changed lines in {}", diff.len(), resource.name);

            if diff.is_empty() && config.sync.suppress_empty_diffs {
                log::info!("No changed lines; notification suppressed");
            } else {
                let payload = build_payload(
                    &registry,
                    &config.notify,
                    &config.catalog.dataset_base_url,
                    kind,
                    &diff,
                    dataset,
                    resource,
                );
                match notifier.send(&payload).await {
                    Ok(()) => stats.notified += 1,
                    Err(e) => log::warn!("Delivery failed for {}: {e}", resource.name),
                }
            }

            store
                .write_resource(&key, normalized.text.as_bytes())
                .await?;
            match kind {
                ChangeKind::New => stats.created += 1,
                ChangeKind::Updated => stats.updated += 1,
            }
        }
    }

    // The snapshot advances even when individual resources failed, so one
    // bad resource cannot pin the reference timestamp forever.
    store.write_snapshot(&raw_listing).await?;
    log::info!(
        "Update complete: {} new, {} updated, {} skipped, {} failed, {} notified",
        stats.created,
        stats.updated,
        stats.skipped,
        stats.failed,
        stats.notified
    );
    Ok(())
}
