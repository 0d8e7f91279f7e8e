//! Server configuration from environment.

use std::env;
use std::str::FromStr;

use evac_core::DetourPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub router_base_url: String,
    pub router_app_key: String,
    pub router_timeout_s: u64,
    pub detour_policy: DetourPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env_parse("EVAC_PORT", 3000),
            router_base_url: env::var("ROUTER_URL")
                .unwrap_or_else(|_| "https://apis.openapi.sk.com/tmap".to_string()),
            router_app_key: env::var("ROUTER_APP_KEY").unwrap_or_default(),
            router_timeout_s: env_parse("ROUTER_TIMEOUT_S", 10),
            detour_policy: policy_from_env(),
        }
    }
}

/// Every detour knob can be tuned per deployment without a rebuild.
fn policy_from_env() -> DetourPolicy {
    let defaults = DetourPolicy::default();
    DetourPolicy {
        collision_threshold_km: env_parse(
            "EVAC_COLLISION_THRESHOLD_KM",
            defaults.collision_threshold_km,
        ),
        grouping_threshold_km: env_parse(
            "EVAC_GROUPING_THRESHOLD_KM",
            defaults.grouping_threshold_km,
        ),
        initial_detour_km: env_parse("EVAC_INITIAL_DETOUR_KM", defaults.initial_detour_km),
        detour_step_km: env_parse("EVAC_DETOUR_STEP_KM", defaults.detour_step_km),
        max_detour_km: env_parse("EVAC_MAX_DETOUR_KM", defaults.max_detour_km),
        max_attempts: env_parse("EVAC_MAX_ATTEMPTS", defaults.max_attempts),
        max_waypoints: env_parse("EVAC_MAX_WAYPOINTS", defaults.max_waypoints),
        bbox_padding_deg: env_parse("EVAC_BBOX_PADDING_DEG", defaults.bbox_padding_deg),
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
