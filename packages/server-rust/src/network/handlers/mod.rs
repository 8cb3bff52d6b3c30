//! Server-owned HTTP handlers and the shared state they extract.
//!
//! Store and operation routes come from the [`Registry`](crate::Registry);
//! this module only carries the health endpoints served next to them.

pub mod health;

pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;

/// Shared application state passed to handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// Health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
    /// Registered store names.
    pub stores: Arc<[String]>,
    /// Registered operation paths.
    pub opers: Arc<[String]>,
}
