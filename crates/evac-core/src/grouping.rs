//! Clustering of collision points into discrete obstacles along a path.

use serde::{Deserialize, Serialize};

use crate::collision::CollisionPoint;
use crate::geo::haversine_km;
use crate::models::{GeoPoint, COORD_EPSILON_DEG};

/// A contiguous stretch of colliding path points, treated as one obstacle
/// when synthesizing bypass waypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionGroup {
    /// Member collision points in path order (never empty)
    pub points: Vec<CollisionPoint>,
    /// The member at index len/2, standing in for the whole obstacle
    pub representative: CollisionPoint,
    /// Index of the group's first point within the path that produced it
    pub start_path_index: usize,
    /// Ground distance from first to last member in metres
    pub length_m: f64,
}

/// Cluster path-ordered collision points by consecutive-pair distance.
///
/// Adjacent collision points within `threshold_km` of each other stay in
/// one group; a larger gap starts the next group. Only consecutive pairs
/// are compared, so a long curving obstacle stays one group even when its
/// endpoints are far apart, while close-but-non-adjacent collisions are
/// kept separate. Empty input yields an empty result.
pub fn group_collisions(
    collisions: &[CollisionPoint],
    path: &[GeoPoint],
    threshold_km: f64,
) -> Vec<CollisionGroup> {
    let mut groups = Vec::new();
    let Some(first) = collisions.first() else {
        return groups;
    };

    let mut members = vec![first.clone()];
    for pair in collisions.windows(2) {
        let gap_km = haversine_km(pair[0].point, pair[1].point);
        if gap_km <= threshold_km {
            members.push(pair[1].clone());
        } else {
            groups.push(seal_group(members, path));
            members = vec![pair[1].clone()];
        }
    }
    groups.push(seal_group(members, path));

    groups
}

fn seal_group(members: Vec<CollisionPoint>, path: &[GeoPoint]) -> CollisionGroup {
    let representative = members[members.len() / 2].clone();
    let first = members[0].point;
    let last = members[members.len() - 1].point;
    CollisionGroup {
        start_path_index: find_path_index(first, path),
        length_m: haversine_km(first, last) * 1000.0,
        representative,
        points: members,
    }
}

/// Locate a collision point within the path by approximate equality.
///
/// Falls back to the path's midpoint index when no point matches within
/// tolerance, so downstream ordering stays meaningful even under
/// floating-point drift.
fn find_path_index(target: GeoPoint, path: &[GeoPoint]) -> usize {
    path.iter()
        .position(|p| p.approx_eq(&target, COORD_EPSILON_DEG))
        .unwrap_or(path.len() / 2)
}
