//! Evac Router - pedestrian routing provider client
//!
//! Handles all communication with the external walking-route provider.

pub mod client;

pub use client::RouterClient;
