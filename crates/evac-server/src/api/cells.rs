//! Danger-cell ingest endpoints.
//!
//! The prediction pipeline replaces the active cell set here; route
//! planning reads it back out of the in-memory store.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::state::AppState;
use evac_core::{CellUpload, DangerCell};

/// Replace the active cell set with an uploaded prediction batch.
pub async fn replace_cells(
    State(state): State<Arc<AppState>>,
    Json(uploads): Json<Vec<CellUpload>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    for (idx, upload) in uploads.iter().enumerate() {
        if !upload.lat.is_finite() || !upload.lon.is_finite() {
            return Err(cell_rejected(idx, "Coordinates must be finite numbers"));
        }
        if upload.lat < -90.0 || upload.lat > 90.0 || upload.lon < -180.0 || upload.lon > 180.0 {
            return Err(cell_rejected(idx, "Coordinates out of range"));
        }
        if !(0.0..=1.0).contains(&upload.probability) {
            return Err(cell_rejected(idx, "Probability must be within [0, 1]"));
        }
        if !(1..=5).contains(&upload.time_step) {
            return Err(cell_rejected(idx, "Time step must be within [1, 5]"));
        }
    }

    let active = state.replace_cells(uploads);
    tracing::info!("Replaced danger cell set: {} active cells", active);
    Ok(Json(serde_json::json!({ "active_cells": active })))
}

/// List all active danger cells.
pub async fn list_cells(State(state): State<Arc<AppState>>) -> Json<Vec<DangerCell>> {
    Json(state.get_all_cells())
}

/// Drop every active cell.
pub async fn clear_cells(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let cleared = state.clear_cells();
    tracing::info!("Cleared {} danger cells", cleared);
    Json(serde_json::json!({ "cleared": cleared }))
}

fn cell_rejected(index: usize, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message, "cell_index": index })),
    )
}
