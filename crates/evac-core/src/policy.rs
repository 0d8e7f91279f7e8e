//! Thresholds and budgets for collision screening and detour search.

use serde::{Deserialize, Serialize};

/// Configuration for the route safety pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetourPolicy {
    /// Path points closer than this to their nearest fire cell collide (km)
    pub collision_threshold_km: f64,
    /// Consecutive collision points closer than this share a group (km)
    pub grouping_threshold_km: f64,
    /// Sideways offset tried on the first bypass attempt (km)
    pub initial_detour_km: f64,
    /// Offset growth per attempt (km)
    pub detour_step_km: f64,
    /// Hard ceiling on the sideways offset (km)
    pub max_detour_km: f64,
    /// Upper bound on bypass attempts per request
    pub max_attempts: u32,
    /// Waypoint limit accepted by the routing provider
    pub max_waypoints: usize,
    /// Padding applied to the cell query window (degrees)
    pub bbox_padding_deg: f64,
}

impl Default for DetourPolicy {
    fn default() -> Self {
        Self {
            collision_threshold_km: 0.265, // half diagonal of a ~375 m prediction cell
            grouping_threshold_km: 0.05,
            initial_detour_km: 0.4,
            detour_step_km: 0.2,
            max_detour_km: 3.0,
            max_attempts: 15,
            max_waypoints: 5,
            bbox_padding_deg: 0.01,
        }
    }
}
