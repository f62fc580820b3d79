//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use bacnet_shed::api::{AppState, router};
use bacnet_shed::config::ScenarioConfig;
use bacnet_shed::sim::engine::Engine;

/// Run the full baseline day and return the API state.
fn build_api_state() -> Arc<AppState> {
    let mut engine = Engine::from_scenario(&ScenarioConfig::baseline()).expect("valid");
    let results = engine.run();
    Arc::new(AppState::new(engine, results))
}

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn state_reports_the_finished_day() {
    let (status, json) = get_json("/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["device_instance"], 260_001);
    assert_eq!(json["simulation"]["steps"], 96);
    assert_eq!(json["simulation"]["step_minutes"], 15);
    assert_eq!(json["report"]["finished_successful"], 2);
    assert_eq!(json["report"]["cancelled"], 0);
    assert_eq!(json["latest_step"]["step"], 95);

    let objects = json["load_controls"].as_array().cloned().unwrap_or_default();
    assert_eq!(objects.len(), 4);
    assert_eq!(objects[0]["instance"], 0);
    assert_eq!(objects[0]["object_name"], "load-control-0");
    assert_eq!(objects[0]["state"], "inactive");
    assert_eq!(objects[0]["last_transition"], serde_json::Value::Null);
}

#[tokio::test]
async fn telemetry_window_around_the_first_shed() {
    let (status, json) = get_json("/telemetry?from=40&to=48&load_control=0").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[1]["transition"], "able_to_meet_shed");
    assert_eq!(rows[1]["state"], "compliant");
    assert_eq!(rows[1]["requested_level"]["type"], "level");
    assert_eq!(rows[8]["transition"], "finished_successful_shed");
}

#[tokio::test]
async fn telemetry_rejects_inverted_range() {
    let (status, json) = get_json("/telemetry?from=50&to=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some_and(|e| e.contains("from")));
}

#[tokio::test]
async fn priority_array_lists_sixteen_slots() {
    let (status, json) = get_json("/objects/analog-output/0/priority-array").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["property"], "priority-array");
    assert_eq!(json["value"]["kind"], "array");
    let slots = json["value"]["value"].as_array().cloned().unwrap_or_default();
    assert_eq!(slots.len(), 16);
    assert!(slots[..15].iter().all(|s| s["type"] == "null"));
    assert_eq!(slots[15]["type"], "real");
    assert_eq!(slots[15]["value"], 60.0);
}

#[tokio::test]
async fn numeric_object_type_is_accepted() {
    let (status, json) = get_json("/objects/1/2/present-value").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["object_type"], "analog-output");
    assert_eq!(json["value"]["value"]["value"], 60.0);
}

#[tokio::test]
async fn finished_shed_leaves_wildcard_start_time() {
    let (status, json) = get_json("/objects/load-control/0/start-time").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"]["kind"], "sequence");
    let parts = json["value"]["value"].as_array().cloned().unwrap_or_default();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["type"], "date");
    assert_eq!(parts[1]["type"], "time");
}

#[tokio::test]
async fn unsupported_property_returns_404() {
    let (status, json) = get_json("/objects/load-control/0/polarity").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "UnknownProperty");
}

#[tokio::test]
async fn unhosted_object_type_returns_404() {
    let (status, json) = get_json("/objects/device/0/object-name").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "UnknownObject");
}

#[tokio::test]
async fn unparseable_object_type_returns_400() {
    let (status, _) = get_json("/objects/widget/0/present-value").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
