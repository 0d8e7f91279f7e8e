//! Error types for route planning and its external collaborators.

use thiserror::Error;

/// Failure from the external routing provider.
///
/// Carried as strings rather than client-library types so the core stays
/// independent of any particular HTTP stack.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Transport-level failure (connect, timeout, broken body)
    #[error("routing provider call failed: {0}")]
    Transport(String),
    /// Provider answered with a non-success status
    #[error("routing provider returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    /// Provider answered 2xx but the payload was not decodable
    #[error("could not decode routing provider response: {0}")]
    Decode(String),
    /// Provider answered with a well-formed payload holding no route
    #[error("routing provider response contained no usable route")]
    EmptyRoute,
}

/// Failure querying the danger-cell source.
#[derive(Debug, Error)]
pub enum CellSourceError {
    #[error("danger cell query failed: {0}")]
    Query(String),
}

/// Failure synthesizing bypass waypoints.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Start and end are too close to define a travel direction, so the
    /// perpendicular offset directions are undefined.
    #[error("start and end coincide; bypass direction is undefined")]
    DegenerateDirection,
}

/// Failure planning a route end to end.
///
/// Everything that can go wrong inside the bypass loop degrades to a
/// usable route instead of surfacing here.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The initial route fetch failed; there is nothing to salvage.
    #[error("initial route fetch failed: {0}")]
    Router(#[from] RouterError),
    /// Start and end coincide within coordinate tolerance.
    #[error("start and end coincide; nothing to plan")]
    DegenerateEndpoints,
}
