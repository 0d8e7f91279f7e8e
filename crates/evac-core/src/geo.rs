//! Spherical distance and degree-offset math shared by the safety modules.

use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres spanned by one degree of latitude (also one degree of
/// longitude at the equator).
pub const KM_PER_DEG: f64 = 111.32;

/// Great-circle distance between two points in kilometres.
///
/// Standard haversine formula over a spherical Earth. Pure and total;
/// callers are responsible for passing valid decimal degrees.
///
/// # Arguments
/// * `a`, `b` - Coordinates in decimal degrees
///
/// # Returns
/// Distance in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Convert a north/south offset in kilometres to degrees latitude.
pub fn km_to_deg_lat(km: f64) -> f64 {
    km / KM_PER_DEG
}

/// Convert an east/west offset in kilometres to degrees longitude at the
/// given latitude, correcting for meridian convergence.
pub fn km_to_deg_lon(km: f64, lat_deg: f64) -> f64 {
    let km_per_deg = (KM_PER_DEG * lat_deg.to_radians().cos()).max(1e-9);
    km / km_per_deg
}

/// Axis-aligned query window around a pair of coordinates.
///
/// Derived per request and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Smallest box containing both points, widened by `padding_deg` on
    /// every side.
    pub fn around(a: GeoPoint, b: GeoPoint, padding_deg: f64) -> Self {
        Self {
            min_lat: a.lat.min(b.lat) - padding_deg,
            max_lat: a.lat.max(b.lat) + padding_deg,
            min_lon: a.lon.min(b.lon) - padding_deg,
            max_lon: a.lon.max(b.lon) + padding_deg,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}
