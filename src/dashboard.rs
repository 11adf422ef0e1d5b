// src/dashboard.rs

//! Read-only monitoring dashboard.
//!
//! Serves one HTML page summarizing the persisted baseline snapshot:
//! every dataset with its organization, modification time, resource
//! count, and tags, most recently modified first. Reads the snapshot on
//! each request; never mutates anything.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{CatalogFile, Config};
use crate::services::CatalogClient;
use crate::storage::CatalogStore;

/// Shared state passed to route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn CatalogStore>,
    dataset_base_url: String,
}

/// One dataset projected for display.
#[derive(Debug, Clone)]
struct DatasetRow {
    title: String,
    id: String,
    organization: String,
    modified: String,
    modified_time: NaiveDateTime,
    resources: i64,
    tags: Vec<String>,
}

/// Start the dashboard server. Runs until the process terminates.
pub async fn run_dashboard(config: &Config, store: Arc<dyn CatalogStore>) -> Result<()> {
    let state = AppState {
        store,
        dataset_base_url: config.catalog.dataset_base_url.clone(),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.dashboard.bind).await?;
    log::info!("Dashboard listening on {}", config.dashboard.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn index(State(state): State<AppState>) -> Response {
    match render_index(&state).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error loading data: {e}"),
        )
            .into_response(),
    }
}

async fn render_index(state: &AppState) -> Result<String> {
    let raw = state
        .store
        .read_snapshot()
        .await?
        .ok_or_else(|| AppError::config("no baseline snapshot found"))?;
    let listing = CatalogClient::parse(&raw)?;
    let last_update = state.store.snapshot_modified().await?;
    Ok(render_page(
        &project(&listing),
        last_update,
        &state.dataset_base_url,
    ))
}

/// Project datasets into display rows, most recently modified first.
fn project(listing: &CatalogFile) -> Vec<DatasetRow> {
    let mut rows: Vec<DatasetRow> = listing
        .result
        .results
        .iter()
        .filter_map(|dataset| {
            let modified_time = match dataset.modified_time() {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Skipping dataset {} in dashboard: {e}", dataset.id);
                    return None;
                }
            };
            Some(DatasetRow {
                title: dataset.title.clone(),
                id: dataset.id.clone(),
                organization: dataset.organization.title.clone(),
                modified: modified_time.format("%Y-%m-%d %H:%M").to_string(),
                modified_time,
                resources: dataset.num_resources,
                tags: dataset.tags.iter().map(|t| t.display_name.clone()).collect(),
            })
        })
        .collect();

    rows.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
    rows
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page(
    rows: &[DatasetRow],
    last_update: Option<DateTime<Utc>>,
    dataset_base_url: &str,
) -> String {
    let last_update = last_update
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut body = String::new();
    for row in rows {
        body.push_str(&format!(
            r#"            <tr>
                <td><a href="{base}/{id}" class="dataset-link" target="_blank">{title}</a></td>
                <td>{organization}</td>
                <td>{modified}</td>
                <td>{resources}</td>
                <td class="tags">{tags}</td>
            </tr>
"#,
            base = dataset_base_url,
            id = escape(&row.id),
            title = escape(&row.title),
            organization = escape(&row.organization),
            modified = row.modified,
            resources = row.resources,
            tags = escape(&row.tags.join(", ")),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>DataSoup Monitoring</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .header {{ background-color: #f0f0f0; padding: 20px; border-radius: 5px; margin-bottom: 20px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
        th {{ background-color: #f2f2f2; }}
        tr:nth-child(even) {{ background-color: #f9f9f9; }}
        .dataset-link {{ color: #0066cc; text-decoration: none; }}
        .dataset-link:hover {{ text-decoration: underline; }}
        .tags {{ font-size: 0.9em; color: #666; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>🍲 DataSoup Monitoring</h1>
        <p><strong>Last Update:</strong> {last_update}</p>
        <p><strong>Total Datasets:</strong> {count}</p>
    </div>
    <table>
        <thead>
            <tr>
                <th>Dataset Name</th>
                <th>Organization</th>
                <th>Last Modified</th>
                <th>Resources</th>
                <th>Tags</th>
            </tr>
        </thead>
        <tbody>
{body}        </tbody>
    </table>
</body>
</html>
"#,
        last_update = last_update,
        count = rows.len(),
        body = body,
    )
}
