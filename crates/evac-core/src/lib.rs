pub mod bypass;
pub mod collision;
pub mod error;
pub mod geo;
pub mod grouping;
pub mod models;
pub mod planner;
pub mod policy;

pub use bypass::synthesize_waypoints;
pub use collision::{find_collision_points, is_route_safe, CollisionPoint};
pub use error::{CellSourceError, PlanError, RouterError, SynthesisError};
pub use geo::{haversine_km, BoundingBox};
pub use grouping::{group_collisions, CollisionGroup};
pub use models::{
    CellUpload, DangerCell, GeoPoint, Route, SafeRouteRequest, COORD_EPSILON_DEG,
};
pub use planner::{plan_safe_route, CellSource, PlannedRoute, RouteProvider, RouteVerdict};
pub use policy::DetourPolicy;
