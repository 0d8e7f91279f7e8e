//! Collision screening between a walking path and predicted fire cells.

use serde::{Deserialize, Serialize};

use crate::geo::haversine_km;
use crate::models::{DangerCell, GeoPoint};

/// A path point that lies within the collision threshold of its nearest
/// fire cell. Emitted in path order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionPoint {
    /// The path point that triggered the collision
    pub point: GeoPoint,
    /// The cell nearest to that point
    pub nearest_cell: DangerCell,
    /// Distance between the two in kilometres
    pub distance_km: f64,
}

/// Screen every path point against the cell set.
///
/// For each point the nearest cell is found with a linear scan (the first
/// cell wins on an exact tie) and a collision is recorded when that nearest
/// distance is at or below `threshold_km`. An empty path or empty cell set
/// yields an empty result. O(|path| * |cells|); fine at the scales the
/// prediction grid produces.
pub fn find_collision_points(
    path: &[GeoPoint],
    cells: &[DangerCell],
    threshold_km: f64,
) -> Vec<CollisionPoint> {
    let mut collisions = Vec::new();
    if cells.is_empty() {
        return collisions;
    }

    for &point in path {
        let mut nearest_km = f64::INFINITY;
        let mut nearest: Option<&DangerCell> = None;
        for cell in cells {
            let dist_km = haversine_km(point, cell.position());
            if dist_km < nearest_km {
                nearest_km = dist_km;
                nearest = Some(cell);
            }
        }

        if let Some(cell) = nearest {
            if nearest_km <= threshold_km {
                collisions.push(CollisionPoint {
                    point,
                    nearest_cell: cell.clone(),
                    distance_km: nearest_km,
                });
            }
        }
    }

    collisions
}

/// A path is safe when screening finds nothing.
pub fn is_route_safe(path: &[GeoPoint], cells: &[DangerCell], threshold_km: f64) -> bool {
    find_collision_points(path, cells, threshold_km).is_empty()
}
