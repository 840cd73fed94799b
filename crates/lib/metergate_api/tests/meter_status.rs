//! Protected meter status lookups and data source routing.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Local, NaiveDate};
use common::*;
use metergate_api::services;
use metergate_core::models::meter::MeterStatus;
use metergate_core::routing::DataSource;

async fn token_for(app: &axum::Router) -> String {
    let login = signup_and_login(app, "alice", "alice@x.com", "pw123").await;
    login["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn missing_authorization_is_unauthorized() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let (status, body) = send(&app, get_request("/meter-status?meter_id=M1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let (status, _) = send(
        &app,
        get_request("/meter-status?meter_id=M1", Some("not.a.jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_not_accepted_as_bearer() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let login = signup_and_login(&app, "alice", "alice@x.com", "pw123").await;
    let (status, _) = send(
        &app,
        get_request("/meter-status?meter_id=M1", login["refresh_token"].as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_meter_is_not_found() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let token = token_for(&app).await;
    let (status, body) = send(
        &app,
        get_request("/meter-status?meter_id=UNKNOWN", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn missing_meter_id_is_a_validation_error() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let token = token_for(&app).await;
    let (status, _) = send(&app, get_request("/meter-status", Some(&token))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn meter_seen_today_is_communicating() {
    let store = Arc::new(MemoryStore::dual());
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let seen = today.and_hms_opt(8, 15, 0).unwrap();
    store.add_meter(DataSource::Primary, "M1", Some(seen));
    let state = test_state(store);

    let resp = services::meters::meter_status(
        state.meters.as_ref(),
        &state.sources,
        Some("M1"),
        None,
        today,
    )
    .await
    .unwrap();
    assert_eq!(resp.meter_id, "M1");
    assert_eq!(resp.status, MeterStatus::Communicating);
    assert_eq!(resp.last_communication.as_deref(), Some("2026-10-19 08:15:00"));
    assert_eq!(resp.meter_type.as_deref(), Some("Smart Meter"));
    assert_eq!(resp.communication_medium.as_deref(), Some("GPRS"));
    assert_eq!(resp.ctwc.as_deref(), Some("100/5"));

    let next_day = today.succ_opt().unwrap();
    let resp = services::meters::meter_status(
        state.meters.as_ref(),
        &state.sources,
        Some("M1"),
        None,
        next_day,
    )
    .await
    .unwrap();
    assert_eq!(resp.status, MeterStatus::NonCommunicating);
}

#[tokio::test]
async fn meter_status_response_shape() {
    let store = Arc::new(MemoryStore::dual());
    store.add_meter(DataSource::Primary, "M1", Some(Local::now().naive_local()));
    let app = test_app(store);
    let token = token_for(&app).await;

    let (status, body) = send(&app, get_request("/meter-status?meter_id=M1", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meter_id"], "M1");
    assert!(body["status"].is_string());
    assert!(body["last_communication"].is_string());
    assert_eq!(body["ctwc"], "100/5");
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let login = signup_and_login(&app, "alice", "alice@x.com", "pw123").await;
    let header = format!(
        "{} {}",
        login["token_type"].as_str().unwrap(),
        login["access_token"].as_str().unwrap()
    );
    assert!(header.starts_with("bearer "));

    let req = Request::builder()
        .uri("/meter-status?meter_id=UNKNOWN")
        .header(AUTHORIZATION, header)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_scheme_is_unauthorized() {
    let app = test_app(Arc::new(MemoryStore::dual()));
    let token = token_for(&app).await;
    let req = Request::builder()
        .uri("/meter-status?meter_id=UNKNOWN")
        .header(AUTHORIZATION, format!("Basic {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn meter_seen_yesterday_is_noncommunicating() {
    let store = Arc::new(MemoryStore::dual());
    let yesterday = Local::now().naive_local() - Duration::days(1);
    store.add_meter(DataSource::Primary, "M2", Some(yesterday));
    let app = test_app(store);
    let token = token_for(&app).await;

    let (status, body) = send(&app, get_request("/meter-status?meter_id=M2", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "noncommunicating");
}

#[tokio::test]
async fn meter_that_never_reported_is_noncommunicating() {
    let store = Arc::new(MemoryStore::dual());
    store.add_meter(DataSource::Primary, "M3", None);
    let app = test_app(store);
    let token = token_for(&app).await;

    let (status, body) = send(&app, get_request("/meter-status?meter_id=M3", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "noncommunicating");
    assert!(body["last_communication"].is_null());
}

#[tokio::test]
async fn package_selects_the_data_source() {
    let store = Arc::new(MemoryStore::dual());
    let now = Local::now().naive_local();
    store.add_meter(DataSource::Secondary, "S1", Some(now));
    let app = test_app(store);
    let token = token_for(&app).await;

    let (status, _) = send(
        &app,
        get_request("/meter-status?meter_id=S1&package=PKG3", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Same meter is absent from the primary source.
    for uri in [
        "/meter-status?meter_id=S1",
        "/meter-status?meter_id=S1&package=PKG1",
        "/meter-status?meter_id=S1&package=PKG9",
    ] {
        let (status, _) = send(&app, get_request(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn single_source_deployment_serves_every_package_from_primary() {
    let store = Arc::new(MemoryStore::new(&[DataSource::Primary]));
    store.add_meter(DataSource::Primary, "M1", None);
    let app = test_app(store);
    let token = token_for(&app).await;

    let (status, _) = send(
        &app,
        get_request("/meter-status?meter_id=M1&package=PKG3", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn store_timeout_is_a_generic_server_error() {
    let store = Arc::new(MemoryStore::dual());
    store.hang_lookups();
    let app = test_app(store);
    let token = token_for(&app).await;

    let (status, body) = send(&app, get_request("/meter-status?meter_id=M1", Some(&token))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}
