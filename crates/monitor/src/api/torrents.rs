//! Health record API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use swarmwatch_core::{Distribution, HealthState, TorrentHealthRecord};

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TorrentEntry {
    pub hash: String,
    #[serde(flatten)]
    pub record: TorrentHealthRecord,
}

#[derive(Debug, Serialize)]
pub struct TorrentListResponse {
    pub torrents: Vec<TorrentEntry>,
    pub count: usize,
    /// Classification counts over every stored record.
    pub distribution: Distribution,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn server_error(error: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error }),
    )
}

/// Read the state file off the async runtime.
async fn load_state(state: &AppState) -> Result<HealthState, ApiError> {
    let store = state.store();
    tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| server_error(format!("State load task failed: {}", e)))?
        .map_err(|e| server_error(e.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/torrents
///
/// List every stored health record, including records of torrents the client
/// no longer reports.
pub async fn list_torrents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TorrentListResponse>, ApiError> {
    let health = load_state(&state).await?;
    let distribution = health.distribution(health.torrents.keys().map(String::as_str));

    let torrents: Vec<TorrentEntry> = health
        .torrents
        .into_iter()
        .map(|(hash, record)| TorrentEntry { hash, record })
        .collect();
    let count = torrents.len();

    Ok(Json(TorrentListResponse {
        torrents,
        count,
        distribution,
    }))
}

/// GET /api/v1/torrents/{hash}
///
/// Get the health record of a single torrent.
pub async fn get_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<TorrentEntry>, ApiError> {
    let mut health = load_state(&state).await?;

    // qBittorrent reports lowercase hashes; accept either case.
    let key = if health.torrents.contains_key(&hash) {
        hash.clone()
    } else {
        hash.to_lowercase()
    };

    match health.torrents.remove(&key) {
        Some(record) => Ok(Json(TorrentEntry { hash: key, record })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No health record for torrent: {}", hash),
            }),
        )),
    }
}
