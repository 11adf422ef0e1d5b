//! Clients for the external collaborators: the catalog API, resource
//! downloads, and the notification transport.

pub mod catalog;
pub mod fetch;
pub mod notify;

pub use catalog::CatalogClient;
pub use fetch::{RetryPolicy, create_client, fetch_bytes, fetch_with_backoff};
pub use notify::Notifier;
