//! REST API over a simulated device and its recorded run.
//!
//! Provides three GET endpoints:
//! - `/state`: run parameters, shed report, live Load Control objects
//! - `/telemetry`: step records with optional range and object filtering
//! - `/objects/{type}/{instance}/{property}`: one property through
//!   read-property dispatch, decoded to JSON

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use parking_lot::Mutex;
use tracing::info;

use crate::device::Device;
use crate::sim::engine::Engine;
use crate::sim::kpi::ShedReport;
use crate::sim::types::{SimConfig, StepResult};

/// Application state shared across all request handlers.
///
/// The recorded run is read-only; the device sits behind one coarse lock.
pub struct AppState {
    /// Simulation configuration used for this run.
    pub config: SimConfig,
    /// Aggregate shed report.
    pub report: ShedReport,
    /// Per-step simulation results.
    pub results: Vec<StepResult>,
    /// The device as the run left it.
    pub device: Mutex<Device>,
}

impl AppState {
    /// Takes over the engine's device once the run has finished.
    pub fn new(engine: Engine, results: Vec<StepResult>) -> Self {
        let config = engine.config().clone();
        let device = engine.into_device();
        let control_priority = device.load_controls.policy().control_priority.get();
        Self {
            config,
            report: ShedReport::from_results(&results, control_priority),
            results,
            device: Mutex::new(device),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route(
            "/objects/{object_type}/{instance}/{property}",
            get(handlers::get_property),
        )
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
