#![cfg(feature = "web")]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use intake::app::{AppState, router};
use intake::{AppConfig, SheetStore, Workbook, template};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let config = AppConfig::default();
    let mut book = Workbook::with_sheets(&config.sheet_names());
    template::initialise(&mut book, config.start_row, Some("T1")).expect("template");
    let state = AppState::new(config, Box::new(book)).expect("state");
    router(Arc::new(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn preview_pads_ragged_paste() {
    let app = test_app();
    let (status, body) = send(&app, post_json("/api/preview", json!({ "text": "a\tb\n\nx\ty\tz" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["preview"]["total_rows"], 2);
    assert_eq!(body["preview"]["column_count"], 2);
    assert_eq!(body["preview"]["rows"], json!([["a", "b", ""], ["x", "y", "z"]]));
}

#[tokio::test]
async fn preview_of_blank_text_is_empty() {
    let app = test_app();
    let (status, body) = send(&app, post_json("/api/preview", json!({ "text": "  \n " }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert_eq!(body["preview"]["rows"], json!([]));
}

#[tokio::test]
async fn saved_paste_shows_up_in_report() {
    let app = test_app();
    let text = "2025-03-01\t86C09999\tThức ăn X\t15:00:00\t18:00:00\t03:00:00\t2\t\t1000\tXếp hàng";

    let (status, body) = send(&app, post_json("/api/save", json!({ "month": "Tháng 3", "text": text }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sheet"], "T3");
    assert_eq!(body["rows"], 1);

    let (status, body) = send(&app, get("/api/report?month=Th%C3%A1ng%203")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sheet"], "T3");
    assert_eq!(body["frame"]["rows"][0][1], "86C09999");
    assert_eq!(body["summary"]["total_vehicles"], 1);
    assert_eq!(body["summary"]["late_vehicles"], 1);
    assert_eq!(body["summary"]["slow_vehicles"], 1);
    assert_eq!(body["summary"]["causes"][0]["cause"], "Xếp hàng");
}

#[tokio::test]
async fn saving_nothing_is_rejected() {
    let app = test_app();
    let (status, body) = send(&app, post_json("/api/save", json!({ "month": "Tháng 1", "text": "\n\n" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn report_defaults_to_first_month() {
    let app = test_app();
    let (status, body) = send(&app, get("/api/report")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sheet"], "T1");
    assert_eq!(body["summary"]["total_vehicles"], 4);
}

#[tokio::test]
async fn missing_sheet_is_reported_as_error() {
    let config = AppConfig::default();
    let book = Workbook::with_sheets(&["T1"]);
    assert_eq!(book.sheet_names(), vec!["T1"]);
    let app = router(Arc::new(AppState::new(config, Box::new(book)).unwrap()));

    let (status, body) = send(&app, get("/api/report?month=Th%C3%A1ng%205")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn months_are_listed_in_order() {
    let app = test_app();
    let (status, body) = send(&app, get("/api/months")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["label"], "Tháng 1");
    assert_eq!(body[11]["sheet"], "T12");
}
