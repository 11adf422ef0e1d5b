// src/services/notify.rs

//! Notification delivery transport.
//!
//! Posts `sendMessage` payloads to the bot API. Delivery failures are
//! surfaced as errors; the orchestrator logs them and moves on rather
//! than retrying.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::SendMessagePayload;

const API_BASE: &str = "https://api.telegram.org";

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Legacy token file, read when the environment variable is unset.
pub const TOKEN_FILE: &str = ".telegram_token";

/// Minimal bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Client for the message delivery endpoint.
pub struct Notifier {
    client: Client,
    base: String,
}

impl Notifier {
    pub fn new(client: Client, token: &str) -> Self {
        Self {
            client,
            base: format!("{API_BASE}/bot{token}"),
        }
    }

    /// Build a notifier from the `TELEGRAM_TOKEN` environment variable,
    /// falling back to the `.telegram_token` file.
    pub fn from_env(client: Client) -> Result<Self> {
        let token = match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => std::fs::read_to_string(TOKEN_FILE)
                .map_err(|_| {
                    AppError::config(format!(
                        "{TOKEN_ENV} environment variable not set and {TOKEN_FILE} file not found"
                    ))
                })?
                .trim()
                .to_string(),
        };
        Ok(Self::new(client, &token))
    }

    /// Liveness probe against the bot API.
    pub async fn check(&self) -> Result<()> {
        let status: ApiStatus = self
            .client
            .get(format!("{}/getMe", self.base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !status.ok {
            return Err(AppError::notify(
                status
                    .description
                    .unwrap_or_else(|| "bot check rejected".to_string()),
            ));
        }
        Ok(())
    }

    /// Deliver one message.
    pub async fn send(&self, payload: &SendMessagePayload) -> Result<()> {
        let status: ApiStatus = self
            .client
            .post(format!("{}/sendMessage", self.base))
            .json(payload)
            .send()
            .await?
            .json()
            .await?;
        if !status.ok {
            return Err(AppError::notify(
                status
                    .description
                    .unwrap_or_else(|| "delivery rejected".to_string()),
            ));
        }
        Ok(())
    }
}
