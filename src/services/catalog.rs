// src/services/catalog.rs

//! Catalog search client.

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{CatalogConfig, CatalogFile};

/// Client for the catalog's package search endpoint.
pub struct CatalogClient {
    client: Client,
    endpoint: String,
    rows: u64,
}

impl CatalogClient {
    pub fn new(client: Client, config: &CatalogConfig) -> Self {
        Self {
            client,
            endpoint: config.search_endpoint.clone(),
            rows: config.rows,
        }
    }

    /// Fetch the full dataset listing as raw bytes.
    ///
    /// The raw body is kept because the baseline snapshot persists the
    /// response verbatim.
    pub async fn fetch_raw(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "rows": self.rows }))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Parse a catalog response body, rejecting unsuccessful queries.
    pub fn parse(bytes: &[u8]) -> Result<CatalogFile> {
        let file: CatalogFile = serde_json::from_slice(bytes)?;
        if !file.success {
            return Err(AppError::catalog("catalog reported an unsuccessful query"));
        }
        Ok(file)
    }

    /// Fetch and parse the listing, returning both forms.
    pub async fn fetch(&self) -> Result<(CatalogFile, Vec<u8>)> {
        let raw = self.fetch_raw().await?;
        let file = Self::parse(&raw)?;
        Ok((file, raw))
    }
}
