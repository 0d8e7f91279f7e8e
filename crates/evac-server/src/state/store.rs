//! In-memory state store using DashMap.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use evac_core::{
    BoundingBox, CellSource, CellSourceError, CellUpload, DangerCell, DetourPolicy, RouteProvider,
};
use uuid::Uuid;

/// Application state - thread-safe store for danger cells plus the shared
/// routing provider and detour policy.
pub struct AppState {
    cells: DashMap<String, DangerCell>,
    router: Arc<dyn RouteProvider>,
    policy: DetourPolicy,
}

impl AppState {
    pub fn new(router: Arc<dyn RouteProvider>, policy: DetourPolicy) -> Self {
        Self {
            cells: DashMap::new(),
            router,
            policy,
        }
    }

    pub fn router(&self) -> &dyn RouteProvider {
        self.router.as_ref()
    }

    pub fn policy(&self) -> &DetourPolicy {
        &self.policy
    }

    /// Replace the active cell set with a fresh prediction batch.
    pub fn replace_cells(&self, uploads: Vec<CellUpload>) -> usize {
        let now = Utc::now();
        self.cells.clear();
        for upload in uploads {
            let id = upload.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let cell = DangerCell {
                id: id.clone(),
                lat: upload.lat,
                lon: upload.lon,
                probability: upload.probability,
                time_step: upload.time_step,
                predicted_at: upload.predicted_at.unwrap_or(now),
            };
            self.cells.insert(id, cell);
        }
        self.cells.len()
    }

    /// Get all active danger cells.
    pub fn get_all_cells(&self) -> Vec<DangerCell> {
        self.cells.iter().map(|r| r.value().clone()).collect()
    }

    /// Drop every active cell. Returns how many were removed.
    pub fn clear_cells(&self) -> usize {
        let cleared = self.cells.len();
        self.cells.clear();
        cleared
    }

    /// Get cells inside the query window.
    pub fn cells_in_box(&self, bounds: &BoundingBox) -> Vec<DangerCell> {
        self.cells
            .iter()
            .filter(|r| bounds.contains(r.value().position()))
            .map(|r| r.value().clone())
            .collect()
    }
}

#[async_trait]
impl CellSource for AppState {
    async fn cells_in_bounds(
        &self,
        bounds: &BoundingBox,
    ) -> Result<Vec<DangerCell>, CellSourceError> {
        Ok(self.cells_in_box(bounds))
    }
}
