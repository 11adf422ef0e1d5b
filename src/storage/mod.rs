//! Storage abstractions for resource content and the baseline snapshot.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! ├── config.toml              # Tracker configuration
//! ├── packagedata.json         # Baseline catalog snapshot
//! └── {organization}/
//!     └── {dataset id}/
//!         └── {resource id}.csv
//! ```
//!
//! Stored files hold canonical UTF-8 content and are overwritten, not
//! versioned; the prior version exists only long enough to be diffed.

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Dataset, ResourceRef};

// Re-export for convenience
pub use local::LocalStore;

/// Identity of one stored resource file.
///
/// (dataset id, resource id) uniquely addresses the file; the
/// organization name only shapes the directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKey {
    pub organization: String,
    pub dataset: String,
    pub resource: String,
}

impl ResourceKey {
    pub fn new(
        organization: impl Into<String>,
        dataset: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            dataset: dataset.into(),
            resource: resource.into(),
        }
    }

    /// Key for a catalog resource within its dataset.
    pub fn for_resource(dataset: &Dataset, resource: &ResourceRef) -> Self {
        Self::new(&dataset.organization.name, &dataset.id, &resource.id)
    }
}

/// Trait for catalog content storage backends.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Deterministic path of a resource file.
    fn resource_path(&self, key: &ResourceKey) -> PathBuf;

    /// Read stored resource content, `None` if never stored.
    async fn read_resource(&self, key: &ResourceKey) -> Result<Option<Vec<u8>>>;

    /// Write resource content, replacing any prior version.
    async fn write_resource(&self, key: &ResourceKey, bytes: &[u8]) -> Result<()>;

    /// Modification time of the stored file, `None` if never stored.
    async fn resource_modified(&self, key: &ResourceKey) -> Result<Option<DateTime<Utc>>>;

    /// Read the baseline snapshot body, `None` if no run has completed.
    async fn read_snapshot(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the baseline snapshot wholesale.
    async fn write_snapshot(&self, bytes: &[u8]) -> Result<()>;

    /// Modification time of the snapshot file.
    async fn snapshot_modified(&self) -> Result<Option<DateTime<Utc>>>;
}
