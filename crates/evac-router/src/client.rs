//! Routing provider HTTP client.
//!
//! The provider takes a form-encoded pedestrian route request and answers
//! with a GeoJSON-flavored feature collection: route totals ride on the
//! start-point feature, the walkable polyline on the line-string features.
//! Waypoints travel as a `passList` of up to five `lon,lat` pairs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use evac_core::{GeoPoint, Route, RouteProvider, RouterError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// `pointType` of the feature that carries the route totals.
const START_POINT_TYPE: &str = "SP";

/// HTTP client for the pedestrian routing provider.
///
/// Wraps a pooled [`reqwest::Client`], so cloning is cheap and concurrent
/// use from many in-flight requests is fine.
#[derive(Clone)]
pub struct RouterClient {
    client: Client,
    base_url: String,
    app_key: String,
}

impl RouterClient {
    /// Create a new client.
    ///
    /// `timeout` bounds each full request; the connect phase is capped
    /// separately at five seconds.
    pub fn new(base_url: impl Into<String>, app_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            app_key: app_key.into(),
        }
    }

    /// Request a pedestrian route, optionally forced through `via` points.
    pub async fn pedestrian_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        via: &[GeoPoint],
    ) -> Result<Route, RouterError> {
        let url = format!("{}/routes/pedestrian?version=1", self.base_url);
        let form = RouteForm {
            start_x: start.lon,
            start_y: start.lat,
            end_x: end.lon,
            end_y: end.lat,
            start_name: "start",
            end_name: "end",
            req_coord_type: "WGS84GEO",
            res_coord_type: "WGS84GEO",
            search_option: 0,
            pass_list: format_pass_list(via),
        };

        tracing::debug!("Requesting pedestrian route with {} via points", via.len());
        let response = self
            .client
            .post(&url)
            .header("appKey", &self.app_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| RouterError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RouterError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| RouterError::Transport(err.to_string()))?;
        let payload: RoutePayload =
            serde_json::from_str(&body).map_err(|err| RouterError::Decode(err.to_string()))?;

        parse_route(payload)
    }
}

#[async_trait]
impl RouteProvider for RouterClient {
    async fn fetch_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        via: &[GeoPoint],
    ) -> Result<Route, RouterError> {
        self.pedestrian_route(start, end, via).await
    }
}

#[derive(Debug, Serialize)]
struct RouteForm {
    #[serde(rename = "startX")]
    start_x: f64,
    #[serde(rename = "startY")]
    start_y: f64,
    #[serde(rename = "endX")]
    end_x: f64,
    #[serde(rename = "endY")]
    end_y: f64,
    #[serde(rename = "startName")]
    start_name: &'static str,
    #[serde(rename = "endName")]
    end_name: &'static str,
    #[serde(rename = "reqCoordType")]
    req_coord_type: &'static str,
    #[serde(rename = "resCoordType")]
    res_coord_type: &'static str,
    #[serde(rename = "searchOption")]
    search_option: u8,
    #[serde(rename = "passList", skip_serializing_if = "Option::is_none")]
    pass_list: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoutePayload {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    geometry: FeatureGeometry,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureGeometry {
    coordinates: FeatureCoordinates,
}

/// Wire coordinates arrive in `[lon, lat]` order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureCoordinates {
    Point([f64; 2]),
    Line(Vec<[f64; 2]>),
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(rename = "totalDistance")]
    total_distance: Option<f64>,
    #[serde(rename = "totalTime")]
    total_time: Option<f64>,
    #[serde(rename = "pointType")]
    point_type: Option<String>,
}

/// Waypoints as `lon,lat` pairs joined by underscores, six decimal places.
fn format_pass_list(via: &[GeoPoint]) -> Option<String> {
    if via.is_empty() {
        return None;
    }
    Some(
        via.iter()
            .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join("_"),
    )
}

fn parse_route(payload: RoutePayload) -> Result<Route, RouterError> {
    let mut path = Vec::new();
    let mut total_distance_m = 0.0;
    let mut total_time_s = 0.0;

    for feature in payload.features {
        match feature.geometry.coordinates {
            FeatureCoordinates::Point(_) => {
                if feature.properties.point_type.as_deref() == Some(START_POINT_TYPE) {
                    total_distance_m = feature.properties.total_distance.unwrap_or(0.0);
                    total_time_s = feature.properties.total_time.unwrap_or(0.0);
                }
            }
            FeatureCoordinates::Line(coordinates) => {
                path.extend(
                    coordinates
                        .into_iter()
                        .map(|[lon, lat]| GeoPoint::new(lat, lon)),
                );
            }
        }
    }

    if path.is_empty() {
        return Err(RouterError::EmptyRoute);
    }

    Ok(Route {
        path,
        total_distance_m,
        total_time_s,
    })
}
