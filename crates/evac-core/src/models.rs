//! Core data models for the evacuation routing system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance for treating two coordinates as the same place.
///
/// 1e-4 degrees is roughly 11 m at mid-latitudes (latitude-dependent for
/// longitude, so only approximate). Used for waypoint deduplication and
/// for matching collision points back to path indices.
pub const COORD_EPSILON_DEG: f64 = 1e-4;

/// A WGS84 coordinate in decimal degrees.
///
/// Stored with named fields so latitude and longitude cannot be swapped
/// silently. External formats that use `[lon, lat]` arrays are converted
/// at the boundary that speaks them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Axis-wise approximate equality: both deltas within `eps_deg`.
    pub fn approx_eq(&self, other: &GeoPoint, eps_deg: f64) -> bool {
        (self.lat - other.lat).abs() < eps_deg && (self.lon - other.lon).abs() < eps_deg
    }
}

/// A predicted fire-spread cell from the upstream prediction pipeline.
///
/// Read-only inside this crate; the serving layer owns ingest and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerCell {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Predicted burn probability in [0, 1]
    pub probability: f64,
    /// Forecast step this cell belongs to (1 = nearest term)
    pub time_step: u32,
    pub predicted_at: DateTime<Utc>,
}

impl DangerCell {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Upload form of a danger cell. Missing ids are assigned on ingest and a
/// missing prediction timestamp defaults to ingest time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellUpload {
    #[serde(default)]
    pub id: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub probability: f64,
    #[serde(default = "default_time_step")]
    pub time_step: u32,
    #[serde(default)]
    pub predicted_at: Option<DateTime<Utc>>,
}

fn default_time_step() -> u32 {
    1
}

/// A walking route as returned by the external routing provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Polyline in travel order
    pub path: Vec<GeoPoint>,
    pub total_distance_m: f64,
    pub total_time_s: f64,
}

/// Request for a fire-aware walking route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeRouteRequest {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

impl SafeRouteRequest {
    pub fn start(&self) -> GeoPoint {
        GeoPoint::new(self.start_lat, self.start_lon)
    }

    pub fn end(&self) -> GeoPoint {
        GeoPoint::new(self.end_lat, self.end_lon)
    }
}
