//! Route safety orchestration.
//!
//! Fetches a walking route, screens it against predicted fire cells, and
//! when it collides, drives the bypass synthesizer and the routing
//! provider through widening detour attempts until the route is clear or
//! the budget runs out. Inside the attempt loop every failure degrades to
//! the best available answer; an evacuation request must always come back
//! with some route.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bypass::synthesize_waypoints;
use crate::collision::find_collision_points;
use crate::error::{CellSourceError, PlanError, RouterError, SynthesisError};
use crate::geo::BoundingBox;
use crate::grouping::group_collisions;
use crate::models::{DangerCell, GeoPoint, Route, COORD_EPSILON_DEG};
use crate::policy::DetourPolicy;

/// Slack for the detour cap comparison, so a nominal cap-sized offset
/// assembled from float steps is not rejected for accumulated error.
const DETOUR_CAP_SLACK_KM: f64 = 1e-9;

const RESIDUAL_RISK_MESSAGE: &str =
    "Route passes through part of the predicted danger area; this is the lowest-risk option found.";
const UNRESOLVED_RISK_MESSAGE: &str =
    "Route passes through the predicted danger area and no safer detour was found within the search limits.";

/// External walking-route provider.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Fetch a route from `start` to `end` passing through `via` in order.
    ///
    /// A single call is never retried here; the orchestrator decides what
    /// a failure means for the request as a whole.
    async fn fetch_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        via: &[GeoPoint],
    ) -> Result<Route, RouterError>;
}

/// Source of currently relevant fire-prediction cells.
#[async_trait]
pub trait CellSource: Send + Sync {
    /// Cells inside `bounds`. The source is expected to return only cells
    /// that are still current; no status filtering happens downstream.
    async fn cells_in_bounds(
        &self,
        bounds: &BoundingBox,
    ) -> Result<Vec<DangerCell>, CellSourceError>;
}

/// How the returned route relates to the danger data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteVerdict {
    /// The provider's original route cleared screening
    Safe,
    /// A bypass candidate cleared screening
    Detoured,
    /// Budget exhausted; the least-bad route is returned
    Degraded,
}

/// Outcome of a safe-route request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub route: Route,
    pub verdict: RouteVerdict,
    /// Bypass attempts spent; 0 when the original route was already safe
    pub attempts: u32,
    /// Collision count remaining on the returned route
    pub residual_collisions: usize,
    /// Risk annotation, present only on degraded results
    pub message: Option<String>,
}

struct BestCandidate {
    route: Route,
    collisions: usize,
    attempt: u32,
}

/// Plan a fire-aware walking route from `start` to `end`.
///
/// The only hard failures are coincident endpoints and the initial route
/// fetch; once a route exists, cell-source trouble, provider trouble on
/// bypass fetches, and an exhausted attempt budget all degrade into a
/// still-usable [`PlannedRoute`].
pub async fn plan_safe_route<R, C>(
    router: &R,
    cells: &C,
    start: GeoPoint,
    end: GeoPoint,
    policy: &DetourPolicy,
) -> Result<PlannedRoute, PlanError>
where
    R: RouteProvider + ?Sized,
    C: CellSource + ?Sized,
{
    if start.approx_eq(&end, COORD_EPSILON_DEG) {
        return Err(PlanError::DegenerateEndpoints);
    }

    let original = router.fetch_route(start, end, &[]).await?;

    let bounds = BoundingBox::around(start, end, policy.bbox_padding_deg);
    let cells = match cells.cells_in_bounds(&bounds).await {
        Ok(cells) => cells,
        Err(err) => {
            tracing::warn!("Cell query failed, planning without danger data: {}", err);
            Vec::new()
        }
    };

    let collisions = find_collision_points(&original.path, &cells, policy.collision_threshold_km);
    if collisions.is_empty() {
        tracing::info!("Route is clear of predicted fire cells");
        return Ok(PlannedRoute {
            route: original,
            verdict: RouteVerdict::Safe,
            attempts: 0,
            residual_collisions: 0,
            message: None,
        });
    }

    tracing::info!(
        "Route crosses predicted fire cells at {} points, searching for a bypass",
        collisions.len()
    );

    let mut groups = group_collisions(&collisions, &original.path, policy.grouping_threshold_km);
    let mut best: Option<BestCandidate> = None;
    let mut attempts_spent = 0u32;

    for attempt in 1..=policy.max_attempts {
        let nominal_km =
            policy.initial_detour_km + f64::from(attempt - 1) * policy.detour_step_km;
        if nominal_km > policy.max_detour_km + DETOUR_CAP_SLACK_KM {
            tracing::debug!(
                "Detour cap reached at attempt {} ({:.1} km), stopping the search",
                attempt,
                nominal_km
            );
            break;
        }
        let detour_km = nominal_km.min(policy.max_detour_km);
        attempts_spent = attempt;

        let waypoints = match synthesize_waypoints(
            &groups,
            start,
            end,
            &cells,
            detour_km,
            policy.max_waypoints,
        ) {
            Ok(waypoints) => waypoints,
            Err(SynthesisError::DegenerateDirection) => {
                // Cannot happen past the endpoint guard above; bail out of
                // the loop rather than burn attempts that can never work.
                tracing::warn!("Bypass direction undefined at attempt {}, stopping the search", attempt);
                break;
            }
        };
        if waypoints.is_empty() {
            tracing::debug!("No usable waypoints at attempt {} ({:.1} km), widening", attempt, detour_km);
            continue;
        }

        let candidate = match router.fetch_route(start, end, &waypoints).await {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!("Bypass route fetch failed at attempt {}, widening detour: {}", attempt, err);
                continue;
            }
        };

        let candidate_collisions =
            find_collision_points(&candidate.path, &cells, policy.collision_threshold_km);
        let collision_count = candidate_collisions.len();
        if collision_count == 0 {
            tracing::info!("Bypass route is clear at attempt {} ({:.1} km offset)", attempt, detour_km);
            return Ok(PlannedRoute {
                route: candidate,
                verdict: RouteVerdict::Detoured,
                attempts: attempt,
                residual_collisions: 0,
                message: None,
            });
        }
        tracing::debug!("Bypass at attempt {} still collides at {} points", attempt, collision_count);

        // Later attempts target the obstacles present in the latest
        // candidate, not the ones on the original route.
        groups = group_collisions(
            &candidate_collisions,
            &candidate.path,
            policy.grouping_threshold_km,
        );
        if groups.is_empty() {
            tracing::warn!(
                "Regrouping found no obstacles despite {} collisions, returning this candidate",
                collision_count
            );
            return Ok(PlannedRoute {
                route: candidate,
                verdict: RouteVerdict::Degraded,
                attempts: attempt,
                residual_collisions: collision_count,
                message: Some(RESIDUAL_RISK_MESSAGE.to_string()),
            });
        }

        let best_count = best.as_ref().map_or(usize::MAX, |b| b.collisions);
        if collision_count < best_count {
            best = Some(BestCandidate {
                route: candidate,
                collisions: collision_count,
                attempt,
            });
        }
    }

    match best {
        Some(best) => {
            tracing::info!(
                "No clear bypass in {} attempts, returning the attempt {} candidate with {} residual collisions",
                attempts_spent,
                best.attempt,
                best.collisions
            );
            Ok(PlannedRoute {
                route: best.route,
                verdict: RouteVerdict::Degraded,
                attempts: attempts_spent,
                residual_collisions: best.collisions,
                message: Some(RESIDUAL_RISK_MESSAGE.to_string()),
            })
        }
        None => {
            tracing::warn!(
                "No bypass candidate could be scored in {} attempts, returning the original route",
                attempts_spent
            );
            Ok(PlannedRoute {
                route: original,
                verdict: RouteVerdict::Degraded,
                attempts: attempts_spent,
                residual_collisions: collisions.len(),
                message: Some(UNRESOLVED_RISK_MESSAGE.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const START: GeoPoint = GeoPoint { lat: 37.0, lon: 127.0 };
    const END: GeoPoint = GeoPoint { lat: 37.0, lon: 127.02 };

    /// Returns scripted results in order, then repeats the fallback route.
    /// Records the via-list length of every call.
    struct ScriptRouter {
        script: Mutex<VecDeque<Result<Route, RouterError>>>,
        fallback: Route,
        via_lens: Mutex<Vec<usize>>,
    }

    impl ScriptRouter {
        fn new(fallback: Route) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                fallback,
                via_lens: Mutex::new(Vec::new()),
            }
        }

        fn scripted(mut self, results: Vec<Result<Route, RouterError>>) -> Self {
            self.script = Mutex::new(results.into());
            self
        }

        fn via_lens(&self) -> Vec<usize> {
            self.via_lens.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RouteProvider for ScriptRouter {
        async fn fetch_route(
            &self,
            _start: GeoPoint,
            _end: GeoPoint,
            via: &[GeoPoint],
        ) -> Result<Route, RouterError> {
            self.via_lens.lock().unwrap().push(via.len());
            match self.script.lock().unwrap().pop_front() {
                Some(result) => result,
                None => Ok(self.fallback.clone()),
            }
        }
    }

    struct StaticCells(Vec<DangerCell>);

    #[async_trait]
    impl CellSource for StaticCells {
        async fn cells_in_bounds(
            &self,
            _bounds: &BoundingBox,
        ) -> Result<Vec<DangerCell>, CellSourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingCells;

    #[async_trait]
    impl CellSource for FailingCells {
        async fn cells_in_bounds(
            &self,
            _bounds: &BoundingBox,
        ) -> Result<Vec<DangerCell>, CellSourceError> {
            Err(CellSourceError::Query("store offline".to_string()))
        }
    }

    fn route(points: Vec<GeoPoint>) -> Route {
        Route {
            path: points,
            total_distance_m: 1800.0,
            total_time_s: 1500.0,
        }
    }

    /// Route that walks straight through the cell at (37.0005, 127.0005).
    fn colliding_route() -> Route {
        route(vec![
            GeoPoint::new(37.0, 127.0),
            GeoPoint::new(37.0, 127.005),
            GeoPoint::new(37.0, 127.01),
            GeoPoint::new(37.0, 127.02),
        ])
    }

    /// Route that stays well clear of that cell (~500 m south).
    fn clear_route() -> Route {
        route(vec![
            GeoPoint::new(36.9955, 127.0),
            GeoPoint::new(36.9955, 127.01),
            GeoPoint::new(36.9955, 127.02),
        ])
    }

    fn one_cell() -> Vec<DangerCell> {
        vec![DangerCell {
            id: "cell-1".to_string(),
            lat: 37.0005,
            lon: 127.0005,
            probability: 0.85,
            time_step: 1,
            predicted_at: Utc::now(),
        }]
    }

    #[tokio::test]
    async fn returns_original_route_when_no_cells_nearby() {
        let router = ScriptRouter::new(colliding_route());
        let outcome = plan_safe_route(&router, &StaticCells(Vec::new()), START, END, &DetourPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.verdict, RouteVerdict::Safe);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(outcome.residual_collisions, 0);
        assert!(outcome.message.is_none());
        assert_eq!(outcome.route.path, colliding_route().path);
        // Exactly one provider call, with no via points
        assert_eq!(router.via_lens(), vec![0]);
    }

    #[tokio::test]
    async fn detours_when_first_bypass_clears() {
        let router =
            ScriptRouter::new(clear_route()).scripted(vec![Ok(colliding_route()), Ok(clear_route())]);
        let outcome = plan_safe_route(&router, &StaticCells(one_cell()), START, END, &DetourPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.verdict, RouteVerdict::Detoured);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.residual_collisions, 0);
        assert!(outcome.message.is_none());
        assert_eq!(outcome.route.path, clear_route().path);

        let via_lens = router.via_lens();
        assert_eq!(via_lens.len(), 2);
        assert_eq!(via_lens[0], 0);
        assert!(via_lens[1] >= 1, "bypass fetch carried no waypoints");
    }

    #[tokio::test]
    async fn degrades_with_message_when_nothing_clears() {
        // Every candidate the provider returns still collides, so the
        // search must run out and hand back the least-bad candidate.
        let router = ScriptRouter::new(colliding_route());
        let policy = DetourPolicy::default();
        let outcome = plan_safe_route(&router, &StaticCells(one_cell()), START, END, &policy)
            .await
            .unwrap();

        assert_eq!(outcome.verdict, RouteVerdict::Degraded);
        // Attempt 15 would need a 3.2 km offset, past the 3.0 km cap
        assert_eq!(outcome.attempts, 14);
        assert_eq!(outcome.residual_collisions, 1);
        assert_eq!(outcome.message.as_deref(), Some(RESIDUAL_RISK_MESSAGE));
        assert_eq!(outcome.route.path, colliding_route().path);
        assert_eq!(router.via_lens().len(), 15);
    }

    #[tokio::test]
    async fn detour_grows_until_the_cap() {
        let router = ScriptRouter::new(colliding_route());
        let policy = DetourPolicy::default();
        plan_safe_route(&router, &StaticCells(one_cell()), START, END, &policy)
            .await
            .unwrap();

        // One initial fetch plus one bypass fetch per surviving attempt
        let via_lens = router.via_lens();
        assert_eq!(via_lens.len(), 1 + 14);
        assert!(via_lens[1..].iter().all(|&n| n >= 1));
    }

    #[tokio::test]
    async fn absorbs_router_failure_inside_the_loop() {
        let router = ScriptRouter::new(clear_route()).scripted(vec![
            Ok(colliding_route()),
            Err(RouterError::Transport("connect timeout".to_string())),
            Ok(clear_route()),
        ]);
        let outcome = plan_safe_route(&router, &StaticCells(one_cell()), START, END, &DetourPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.verdict, RouteVerdict::Detoured);
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.message.is_none());
    }

    #[tokio::test]
    async fn initial_fetch_failure_is_fatal() {
        let router = ScriptRouter::new(clear_route()).scripted(vec![Err(RouterError::Status {
            status: 503,
            detail: "upstream unavailable".to_string(),
        })]);
        let err = plan_safe_route(&router, &StaticCells(Vec::new()), START, END, &DetourPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::Router(RouterError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn coincident_endpoints_are_rejected_before_any_fetch() {
        let router = ScriptRouter::new(clear_route());
        let err = plan_safe_route(&router, &StaticCells(Vec::new()), START, START, &DetourPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::DegenerateEndpoints));
        assert!(router.via_lens().is_empty());
    }

    #[tokio::test]
    async fn cell_source_failure_degrades_to_no_danger_data() {
        let router = ScriptRouter::new(colliding_route());
        let outcome = plan_safe_route(&router, &FailingCells, START, END, &DetourPolicy::default())
            .await
            .unwrap();

        // Without cells the route cannot collide
        assert_eq!(outcome.verdict, RouteVerdict::Safe);
        assert_eq!(outcome.residual_collisions, 0);
    }

    #[tokio::test]
    async fn best_candidate_is_first_among_ties() {
        // Two distinct colliding candidates with equal collision counts;
        // the first one scored must be the one handed back. Only the
        // first point of this path is within threshold of the cell.
        let second_candidate = route(vec![
            GeoPoint::new(37.0, 127.0),
            GeoPoint::new(36.999, 127.01),
            GeoPoint::new(37.0, 127.02),
        ]);
        let router = ScriptRouter::new(second_candidate).scripted(vec![
            Ok(colliding_route()),
            Ok(colliding_route()),
        ]);
        let outcome = plan_safe_route(&router, &StaticCells(one_cell()), START, END, &DetourPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.verdict, RouteVerdict::Degraded);
        assert_eq!(outcome.route.path, colliding_route().path);
        assert_eq!(outcome.residual_collisions, 1);
    }

    #[test]
    fn verdict_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RouteVerdict::Safe).unwrap(), "\"safe\"");
        assert_eq!(
            serde_json::to_string(&RouteVerdict::Degraded).unwrap(),
            "\"degraded\""
        );
    }
}
