//! REST API routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::cells;
use crate::state::AppState;
use evac_core::{plan_safe_route, PlanError, PlannedRoute, RouteVerdict, SafeRouteRequest};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let planning_routes = Router::new().route("/v1/routes/safe", post(plan_route_handler));

    let cell_routes = Router::new()
        .route("/v1/cells", put(cells::replace_cells))
        .route("/v1/cells", get(cells::list_cells))
        .route("/v1/cells", delete(cells::clear_cells));

    planning_routes.merge(cell_routes)
}

// === Request/Response types ===

#[derive(Debug, Serialize)]
pub struct SafeRouteResponse {
    pub total_distance_m: f64,
    pub total_time_min: u64,
    /// Polyline as `[lon, lat]` pairs in travel order
    pub path: Vec<[f64; 2]>,
    pub verdict: RouteVerdict,
    pub attempts: u32,
    pub message: Option<String>,
}

impl SafeRouteResponse {
    fn from_planned(planned: PlannedRoute) -> Self {
        let path = planned.route.path.iter().map(|p| [p.lon, p.lat]).collect();
        Self {
            total_distance_m: planned.route.total_distance_m,
            total_time_min: (planned.route.total_time_s / 60.0).round() as u64,
            path,
            verdict: planned.verdict,
            attempts: planned.attempts,
            message: planned.message,
        }
    }
}

// === Handlers ===

async fn plan_route_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SafeRouteRequest>,
) -> Result<Json<SafeRouteResponse>, (StatusCode, Json<serde_json::Value>)> {
    validate_route_request(&req)?;

    match plan_safe_route(
        state.router(),
        state.as_ref(),
        req.start(),
        req.end(),
        state.policy(),
    )
    .await
    {
        Ok(planned) => {
            tracing::info!(
                "Planned route: verdict={:?} attempts={} residual_collisions={}",
                planned.verdict,
                planned.attempts,
                planned.residual_collisions
            );
            Ok(Json(SafeRouteResponse::from_planned(planned)))
        }
        Err(PlanError::DegenerateEndpoints) => {
            Err(bad_request("Start and end are the same location", None))
        }
        Err(PlanError::Router(err)) => {
            tracing::error!("Initial route fetch failed: {}", err);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "Routing provider unavailable" })),
            ))
        }
    }
}

fn bad_request(message: &str, field: Option<&str>) -> (StatusCode, Json<serde_json::Value>) {
    let mut payload = serde_json::json!({ "error": message });
    if let Some(field) = field {
        payload["field"] = serde_json::Value::String(field.to_string());
    }
    (StatusCode::BAD_REQUEST, Json(payload))
}

fn validate_route_request(
    req: &SafeRouteRequest,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    validate_coordinate(req.start_lat, req.start_lon, "start_lat", "start_lon")?;
    validate_coordinate(req.end_lat, req.end_lon, "end_lat", "end_lon")?;
    Ok(())
}

fn validate_coordinate(
    lat: f64,
    lon: f64,
    lat_field: &'static str,
    lon_field: &'static str,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if !lat.is_finite() {
        return Err(bad_request(
            "Latitude must be a finite number",
            Some(lat_field),
        ));
    }
    if !lon.is_finite() {
        return Err(bad_request(
            "Longitude must be a finite number",
            Some(lon_field),
        ));
    }
    if lat < -90.0 || lat > 90.0 {
        return Err(bad_request("Latitude out of range", Some(lat_field)));
    }
    if lon < -180.0 || lon > 180.0 {
        return Err(bad_request("Longitude out of range", Some(lon_field)));
    }
    Ok(())
}
