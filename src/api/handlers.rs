//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::ErrorCode;
use crate::object::{ArrayIndex, ObjectType, PropertyId};

use super::AppState;
use super::types::{
    ErrorResponse, LoadControlRecord, PropertyQuery, PropertyResponse, SimulationSummary,
    StateResponse, TelemetryQuery,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// Returns run parameters, the shed report, every Load Control object and
/// the latest step record.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let device = state.device.lock();
    let load_controls = device
        .load_controls
        .iter()
        .map(|(instance, lc)| LoadControlRecord {
            instance,
            object: lc.clone(),
        })
        .collect();

    Json(StateResponse {
        device_instance: device.instance(),
        simulation: SimulationSummary::from(&state.config),
        report: state.report.clone(),
        load_controls,
        latest_step: state.results.last().cloned(),
    })
}

/// Returns step records, optionally filtered by step range and object.
///
/// `GET /telemetry` → 200 + `Vec<StepResult>` JSON
/// `GET /telemetry?from=N&to=M&load_control=I` → filtered (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(bad_request(format!(
            "`from` ({from}) must be <= `to` ({to})"
        )));
    }

    let records: Vec<_> = state
        .results
        .iter()
        .filter(|r| r.step >= from && r.step <= to)
        .filter(|r| query.load_control.is_none_or(|lc| r.load_control == lc))
        .cloned()
        .collect();

    Ok(Json(records))
}

/// Reads one property through the device's dispatch and returns the decoded
/// value.
///
/// `GET /objects/{type}/{instance}/{property}?index=n`, where `type` and
/// `property` are kebab-case names or numbers.
/// Unknown objects and properties → 404; other dispatch errors → 400.
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path((object_type, instance, property)): Path<(String, u32, String)>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let object_type = ObjectType::from_name(&object_type)
        .ok_or_else(|| bad_request(format!("unknown object type \"{object_type}\"")))?;
    let property = PropertyId::from_name(&property)
        .ok_or_else(|| bad_request(format!("unknown property \"{property}\"")))?;
    let index = query.index.map_or(ArrayIndex::All, ArrayIndex::Index);

    let value = state
        .device
        .lock()
        .read_value(object_type, instance, property, index)
        .map_err(|err| {
            let status = match err.code {
                ErrorCode::UnknownObject | ErrorCode::UnknownProperty => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(ErrorResponse::from(err)))
        })?;

    Ok(Json(PropertyResponse {
        object_type: object_type.to_string(),
        instance,
        property: property.name(),
        index: query.index,
        value,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::ScenarioConfig;
    use crate::sim::engine::Engine;

    fn make_test_state() -> Arc<AppState> {
        let mut scenario = ScenarioConfig::baseline();
        scenario.simulation.steps = 24;
        let mut engine = Engine::from_scenario(&scenario).expect("valid");
        let results = engine.run();
        Arc::new(AppState::new(engine, results))
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn state_returns_200() {
        let (status, json) = get("/state").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.get("simulation").is_some());
        assert!(json.get("report").is_some());
        assert_eq!(json["load_controls"].as_array().map(Vec::len), Some(4));
        assert_eq!(json["latest_step"]["step"], 23);
    }

    #[tokio::test]
    async fn telemetry_filters_by_step_and_object() {
        let (status, json) = get("/telemetry?from=5&to=10&load_control=1").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["step"], 5);
        assert!(rows.iter().all(|r| r["load_control"] == 1));
    }

    #[tokio::test]
    async fn telemetry_invalid_range_returns_400() {
        let (status, json) = get("/telemetry?from=10&to=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn object_property_reads_decoded_value() {
        let (status, json) = get("/objects/analog-output/0/present-value").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"]["kind"], "single");
        assert_eq!(json["value"]["value"]["type"], "real");
    }

    #[tokio::test]
    async fn object_array_element() {
        let (status, json) = get("/objects/load-control/0/shed-levels?index=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"]["value"]["value"], 2);
    }

    #[tokio::test]
    async fn unknown_instance_returns_404() {
        let (status, json) = get("/objects/load-control/99/present-value").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "UnknownObject");
    }

    #[tokio::test]
    async fn bad_index_returns_400() {
        let (status, _) = get("/objects/load-control/0/enable?index=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
