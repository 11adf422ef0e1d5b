//! Catalog listing data structures.
//!
//! Mirrors the JSON shape returned by the catalog's `package_search`
//! endpoint. The persisted baseline snapshot is the raw response body, so
//! these types are used both for live responses and for the snapshot file.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Timestamp format used by the catalog (naive, microsecond precision).
pub const CATALOG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a catalog timestamp string.
pub fn parse_catalog_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, CATALOG_TIME_FORMAT)
        .map_err(|e| AppError::catalog(format!("bad timestamp '{value}': {e}")))
}

/// Top-level catalog search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Whether the catalog reported the query as successful
    pub success: bool,

    /// The result set
    #[serde(default)]
    pub result: CatalogResult,
}

impl CatalogFile {
    /// The reference timestamp of this listing: the maximum dataset
    /// modification time. Used as the cutoff for the next run.
    pub fn reference_time(&self) -> Option<NaiveDateTime> {
        self.result
            .results
            .iter()
            .filter_map(|d| d.modified_time().ok())
            .max()
    }
}

/// Result envelope containing the dataset records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogResult {
    /// Total dataset count reported by the catalog
    #[serde(default)]
    pub count: i64,

    /// Dataset records
    #[serde(default)]
    pub results: Vec<Dataset>,
}

/// A dataset: a named collection of resources under one organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset unique identifier
    pub id: String,

    /// Dataset machine name
    #[serde(default)]
    pub name: String,

    /// Dataset display title
    #[serde(default)]
    pub title: String,

    /// Modification timestamp in catalog format
    #[serde(default)]
    pub metadata_modified: String,

    /// Declared number of resources
    #[serde(default)]
    pub num_resources: i64,

    /// Owning organization
    #[serde(default)]
    pub organization: Organization,

    /// Downloadable resources
    #[serde(default)]
    pub resources: Vec<ResourceRef>,

    /// Descriptive tags, in catalog order
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Dataset {
    /// Parsed modification time.
    pub fn modified_time(&self) -> Result<NaiveDateTime> {
        parse_catalog_time(&self.metadata_modified)
    }
}

/// The organization owning a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organization {
    /// Organization unique identifier
    #[serde(default)]
    pub id: String,

    /// Organization machine name (used in storage paths)
    #[serde(default)]
    pub name: String,

    /// Organization display title
    #[serde(default)]
    pub title: String,
}

/// One downloadable file belonging to a dataset.
///
/// The pair (dataset id, resource id) uniquely addresses a stored file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource unique identifier
    pub id: String,

    /// Identifier of the owning dataset
    #[serde(default)]
    pub package_id: String,

    /// Resource display name
    #[serde(default)]
    pub name: String,

    /// Declared file format (e.g. "CSV")
    #[serde(default)]
    pub format: String,

    /// Declared size in bytes
    #[serde(default)]
    pub size: i64,

    /// Content modification timestamp
    #[serde(default)]
    pub last_modified: String,

    /// Metadata modification timestamp in catalog format
    #[serde(default)]
    pub metadata_modified: String,

    /// Download URL
    #[serde(default)]
    pub url: String,
}

impl ResourceRef {
    /// Parsed metadata modification time.
    pub fn modified_time(&self) -> Result<NaiveDateTime> {
        parse_catalog_time(&self.metadata_modified)
    }
}

/// A descriptive tag attached to a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    /// Human-readable tag name
    #[serde(default)]
    pub display_name: String,

    /// Tag unique identifier
    #[serde(default)]
    pub id: String,

    /// Tag machine name
    #[serde(default)]
    pub name: String,

    /// Tag state
    #[serde(default)]
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "success": true,
            "result": {
                "count": 2,
                "results": [
                    {
                        "id": "ds-1",
                        "name": "road-counts",
                        "title": "Road Counts",
                        "metadata_modified": "2026-01-05T08:30:00.000000",
                        "num_resources": 1,
                        "organization": {"id": "org-1", "name": "transport", "title": "Ministry of Transport"},
                        "resources": [
                            {
                                "id": "res-1",
                                "package_id": "ds-1",
                                "name": "counts.csv",
                                "format": "CSV",
                                "size": 1024,
                                "metadata_modified": "2026-01-05T08:30:00.000000",
                                "url": "https://example.org/counts.csv"
                            }
                        ],
                        "tags": [{"display_name": "roads", "id": "t1", "name": "roads", "state": "active"}]
                    },
                    {
                        "id": "ds-2",
                        "title": "Budgets",
                        "metadata_modified": "2026-02-01T12:00:00.000000",
                        "organization": {"id": "org-2", "name": "finance", "title": "Ministry of Finance"}
                    }
                ]
            }
        }"#
    }

    #[test]
    fn parse_catalog_response() {
        let file: CatalogFile = serde_json::from_str(sample_json()).unwrap();
        assert!(file.success);
        assert_eq!(file.result.results.len(), 2);
        let ds = &file.result.results[0];
        assert_eq!(ds.organization.name, "transport");
        assert_eq!(ds.resources[0].format, "CSV");
        assert_eq!(ds.tags[0].display_name, "roads");
    }

    #[test]
    fn parse_timestamp_microseconds() {
        let t = parse_catalog_time("2026-01-05T08:30:00.123456").unwrap();
        assert_eq!(t.format("%Y-%m-%d").to_string(), "2026-01-05");
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_catalog_time("05/01/2026").is_err());
    }

    #[test]
    fn reference_time_is_maximum() {
        let file: CatalogFile = serde_json::from_str(sample_json()).unwrap();
        let reference = file.reference_time().unwrap();
        assert_eq!(reference, parse_catalog_time("2026-02-01T12:00:00.000000").unwrap());
    }

    #[test]
    fn missing_fields_default() {
        let file: CatalogFile =
            serde_json::from_str(r#"{"success": true, "result": {"count": 0}}"#).unwrap();
        assert!(file.result.results.is_empty());
        assert!(file.reference_time().is_none());
    }
}
