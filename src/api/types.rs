//! API response and query types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dispatch::PropertyValue;
use crate::error::PropertyError;
use crate::load_control::LoadControl;
use crate::sim::kpi::ShedReport;
use crate::sim::types::{SimConfig, StepResult};

/// Run parameters as reported by `/state`.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub start: NaiveDateTime,
    pub step_minutes: i64,
    pub steps: usize,
    pub seed: u64,
}

impl From<&SimConfig> for SimulationSummary {
    fn from(cfg: &SimConfig) -> Self {
        Self {
            start: cfg.start,
            step_minutes: cfg.step.num_minutes(),
            steps: cfg.steps,
            seed: cfg.seed,
        }
    }
}

/// One Load Control object as it currently stands on the device.
#[derive(Debug, Clone, Serialize)]
pub struct LoadControlRecord {
    pub instance: u32,
    #[serde(flatten)]
    pub object: LoadControl,
}

/// Combined state response: run parameters, shed report, live objects and
/// the last recorded step.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub device_instance: u32,
    pub simulation: SimulationSummary,
    pub report: ShedReport,
    pub load_controls: Vec<LoadControlRecord>,
    /// Most recent step record; `None` before any step ran.
    pub latest_step: Option<StepResult>,
}

/// Optional filters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start step (inclusive).
    pub from: Option<usize>,
    /// End step (inclusive).
    pub to: Option<usize>,
    /// Only records of this Load Control instance.
    pub load_control: Option<u32>,
}

/// Optional array index for the object endpoint.
#[derive(Debug, Deserialize)]
pub struct PropertyQuery {
    pub index: Option<u32>,
}

/// A decoded property read.
#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub object_type: String,
    pub instance: u32,
    pub property: String,
    pub index: Option<u32>,
    pub value: PropertyValue,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl From<PropertyError> for ErrorResponse {
    fn from(err: PropertyError) -> Self {
        Self {
            error: format!("{:?}", err.code),
        }
    }
}
