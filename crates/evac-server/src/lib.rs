//! Shared library surface for Evac server utilities and tests.

pub mod api;
pub mod config;
pub mod state;
