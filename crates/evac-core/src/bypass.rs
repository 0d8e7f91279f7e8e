//! Bypass waypoint synthesis around grouped fire obstacles.
//!
//! Each obstacle contributes at most one waypoint, offset sideways from
//! the obstacle's cell center so the routing provider is pulled around
//! the danger area instead of through it.

use crate::error::SynthesisError;
use crate::geo::{haversine_km, km_to_deg_lat, km_to_deg_lon};
use crate::grouping::CollisionGroup;
use crate::models::{DangerCell, GeoPoint, COORD_EPSILON_DEG};

/// Below this norm (in degrees) the start-to-end vector cannot be
/// normalized into a direction.
const MIN_DIRECTION_NORM_DEG: f64 = 1e-9;

/// Turn collision groups into detour waypoints for the routing provider.
///
/// Groups are visited in path order (earliest obstacle first) and at most
/// `max_waypoints` of them are considered. The offset direction is
/// perpendicular to one global bias vector, the straight line from
/// `start` to `end`; sides are compared by their minimum distance to any
/// known cell and the farther side wins, left on a tie. A candidate that
/// lands within [`COORD_EPSILON_DEG`] of the previously emitted waypoint
/// is skipped so the provider never sees near-duplicate pass points.
///
/// Empty `groups` or full deduplication produce an empty list, which is a
/// valid outcome, not an error.
pub fn synthesize_waypoints(
    groups: &[CollisionGroup],
    start: GeoPoint,
    end: GeoPoint,
    cells: &[DangerCell],
    detour_km: f64,
    max_waypoints: usize,
) -> Result<Vec<GeoPoint>, SynthesisError> {
    let mut waypoints = Vec::new();
    if groups.is_empty() {
        return Ok(waypoints);
    }

    let (bias_lat, bias_lon) = bias_direction(start, end)?;

    let mut ordered: Vec<&CollisionGroup> = groups.iter().collect();
    ordered.sort_by_key(|g| g.start_path_index);
    ordered.truncate(max_waypoints);

    for group in ordered {
        if waypoints.len() >= max_waypoints {
            break;
        }

        let obstacle = &group.representative.nearest_cell;
        let (left, right) = offset_candidates(obstacle, bias_lat, bias_lon, detour_km);

        let left_clearance = min_distance_to_cells(left, cells);
        let right_clearance = min_distance_to_cells(right, cells);
        let chosen = if right_clearance > left_clearance {
            right
        } else {
            left
        };

        if let Some(prev) = waypoints.last() {
            if chosen.approx_eq(prev, COORD_EPSILON_DEG) {
                continue;
            }
        }
        waypoints.push(chosen);
    }

    Ok(waypoints)
}

/// Unit vector from start to end in raw degree space.
fn bias_direction(start: GeoPoint, end: GeoPoint) -> Result<(f64, f64), SynthesisError> {
    let d_lat = end.lat - start.lat;
    let d_lon = end.lon - start.lon;
    let norm = (d_lat * d_lat + d_lon * d_lon).sqrt();
    if norm < MIN_DIRECTION_NORM_DEG {
        return Err(SynthesisError::DegenerateDirection);
    }
    Ok((d_lat / norm, d_lon / norm))
}

/// The two candidates `detour_km` to either side of the obstacle center,
/// perpendicular to the travel direction.
///
/// Left is 90 degrees counterclockwise from travel when looking down on
/// the map (north up). Kilometre offsets convert to degrees per axis,
/// with the longitude axis corrected for meridian convergence at the
/// obstacle's latitude.
fn offset_candidates(
    obstacle: &DangerCell,
    bias_lat: f64,
    bias_lon: f64,
    detour_km: f64,
) -> (GeoPoint, GeoPoint) {
    let lat_step = km_to_deg_lat(detour_km);
    let lon_step = km_to_deg_lon(detour_km, obstacle.lat);

    let left = GeoPoint::new(
        obstacle.lat + bias_lon * lat_step,
        obstacle.lon - bias_lat * lon_step,
    );
    let right = GeoPoint::new(
        obstacle.lat - bias_lon * lat_step,
        obstacle.lon + bias_lat * lon_step,
    );
    (left, right)
}

/// Clearance of a candidate from the entire cell set, not only the cell
/// being bypassed. Infinite when no cells are known.
fn min_distance_to_cells(point: GeoPoint, cells: &[DangerCell]) -> f64 {
    let mut best_km = f64::INFINITY;
    for cell in cells {
        let dist_km = haversine_km(point, cell.position());
        if dist_km < best_km {
            best_km = dist_km;
        }
    }
    best_km
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionPoint;
    use chrono::Utc;

    const DETOUR_KM: f64 = 0.4;
    const MAX_WAYPOINTS: usize = 5;

    fn cell(id: &str, lat: f64, lon: f64) -> DangerCell {
        DangerCell {
            id: id.to_string(),
            lat,
            lon,
            probability: 0.9,
            time_step: 1,
            predicted_at: Utc::now(),
        }
    }

    fn group_around(cell: DangerCell, start_path_index: usize) -> CollisionGroup {
        let representative = CollisionPoint {
            point: cell.position(),
            nearest_cell: cell,
            distance_km: 0.05,
        };
        CollisionGroup {
            points: vec![representative.clone()],
            representative,
            start_path_index,
            length_m: 0.0,
        }
    }

    // Eastbound travel: bias (0, 1), left offset is north, right is south.
    const START: GeoPoint = GeoPoint { lat: 37.0, lon: 127.0 };
    const END: GeoPoint = GeoPoint { lat: 37.0, lon: 127.02 };

    #[test]
    fn empty_groups_yield_no_waypoints() {
        let waypoints =
            synthesize_waypoints(&[], START, END, &[], DETOUR_KM, MAX_WAYPOINTS).unwrap();
        assert!(waypoints.is_empty());
    }

    #[test]
    fn coincident_endpoints_are_degenerate() {
        let groups = vec![group_around(cell("c", 37.0, 127.01), 3)];
        let err = synthesize_waypoints(&groups, START, START, &[], DETOUR_KM, MAX_WAYPOINTS)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::DegenerateDirection));
    }

    #[test]
    fn tie_prefers_left() {
        let obstacle = cell("c", 37.0, 127.01);
        let cells = vec![obstacle.clone()];
        let groups = vec![group_around(obstacle, 3)];

        let waypoints =
            synthesize_waypoints(&groups, START, END, &cells, DETOUR_KM, MAX_WAYPOINTS).unwrap();
        assert_eq!(waypoints.len(), 1);
        // Both sides are exactly detour_km from the only cell; left (north
        // of an eastbound leg) wins.
        assert!(waypoints[0].lat > 37.0);
        assert!((haversine_km(waypoints[0], GeoPoint::new(37.0, 127.01)) - DETOUR_KM).abs() < 0.02);
    }

    #[test]
    fn side_with_more_clearance_wins() {
        let obstacle = cell("main", 37.0, 127.01);
        // A second cell sits north of the obstacle, shrinking the left
        // candidate's clearance; the south (right) side must win.
        let cells = vec![obstacle.clone(), cell("north", 37.002, 127.01)];
        let groups = vec![group_around(obstacle, 3)];

        let waypoints =
            synthesize_waypoints(&groups, START, END, &cells, DETOUR_KM, MAX_WAYPOINTS).unwrap();
        assert_eq!(waypoints.len(), 1);
        assert!(waypoints[0].lat < 37.0);

        // The rejected candidate mirrors the chosen one across the
        // obstacle latitude.
        let rejected = GeoPoint::new(2.0 * 37.0 - waypoints[0].lat, waypoints[0].lon);
        let chosen_clearance = min_distance_to_cells(waypoints[0], &cells);
        let rejected_clearance = min_distance_to_cells(rejected, &cells);
        assert!(chosen_clearance >= rejected_clearance);
    }

    #[test]
    fn groups_are_visited_in_path_order() {
        let near = cell("near", 37.0, 127.004);
        let far = cell("far", 37.0, 127.016);
        let groups = vec![group_around(far.clone(), 40), group_around(near.clone(), 8)];
        let cells = vec![near, far];

        let waypoints =
            synthesize_waypoints(&groups, START, END, &cells, DETOUR_KM, MAX_WAYPOINTS).unwrap();
        assert_eq!(waypoints.len(), 2);
        assert!((waypoints[0].lon - 127.004).abs() < 1e-9);
        assert!((waypoints[1].lon - 127.016).abs() < 1e-9);
    }

    #[test]
    fn near_duplicate_waypoints_are_skipped() {
        // Two groups triggered by the same cell produce the same candidate
        let shared = cell("shared", 37.0, 127.01);
        let groups = vec![
            group_around(shared.clone(), 3),
            group_around(shared.clone(), 9),
        ];
        let cells = vec![shared];

        let waypoints =
            synthesize_waypoints(&groups, START, END, &cells, DETOUR_KM, MAX_WAYPOINTS).unwrap();
        assert_eq!(waypoints.len(), 1);
    }

    #[test]
    fn waypoint_count_is_capped() {
        let mut groups = Vec::new();
        let mut cells = Vec::new();
        for i in 0..8 {
            let c = cell(&format!("c{i}"), 37.0, 127.002 + i as f64 * 0.002);
            cells.push(c.clone());
            groups.push(group_around(c, i * 5));
        }

        let waypoints =
            synthesize_waypoints(&groups, START, END, &cells, DETOUR_KM, MAX_WAYPOINTS).unwrap();
        assert_eq!(waypoints.len(), MAX_WAYPOINTS);
    }

    #[test]
    fn consecutive_waypoints_keep_their_distance() {
        let a = cell("a", 37.0, 127.004);
        let b = cell("b", 37.0, 127.012);
        let groups = vec![group_around(a.clone(), 5), group_around(b.clone(), 25)];
        let cells = vec![a, b];

        let waypoints =
            synthesize_waypoints(&groups, START, END, &cells, DETOUR_KM, MAX_WAYPOINTS).unwrap();
        for pair in waypoints.windows(2) {
            assert!(!pair[1].approx_eq(&pair[0], COORD_EPSILON_DEG));
        }
    }
}
