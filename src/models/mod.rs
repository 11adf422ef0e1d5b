// src/models/mod.rs

//! Domain models for the catalog tracker.
//!
//! This module contains all data structures used throughout the
//! application, organized by their primary purpose.

mod catalog;
mod config;
mod message;

// Re-export all public types
pub use catalog::{
    CATALOG_TIME_FORMAT, CatalogFile, CatalogResult, Dataset, Organization, ResourceRef, Tag,
    parse_catalog_time,
};
pub use config::{
    CatalogConfig, Config, DashboardConfig, HttpConfig, NotifyConfig, StorageConfig, SyncConfig,
};
pub use message::{
    ENTITY_EXPANDABLE_BLOCKQUOTE, ENTITY_TEXT_LINK, MessageEntity, SendMessagePayload,
};
