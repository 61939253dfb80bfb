#![allow(dead_code)]

use std::str::FromStr;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chitfund_backend::{config::AppConfig, routes::create_router, AppState};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde_json::{json, Value};
use tower::ServiceExt;

const TEST_DATABASE_URL: &str = "sqlite::memory:";

/// Fresh in-memory database with the schema applied.
/// A single pooled connection keeps every query on the same memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(TEST_DATABASE_URL);
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn build_test_router() -> Router {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    create_router(AppState {
        db,
        config: AppConfig::with_database_url(TEST_DATABASE_URL),
    })
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::POST, uri, None).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

/// Decimal fields are serialized as strings; accept numbers too
pub fn dec_of(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("expected a decimal, got {}", other),
    }
}

pub async fn create_member(app: &Router, name: &str, phone: &str) -> i64 {
    let (status, json) = post(app, "/members", json!({ "name": name, "phone": phone })).await;
    assert_eq!(status, StatusCode::CREATED, "create member failed: {}", json);
    json["id"].as_i64().unwrap()
}

pub async fn create_chit(app: &Router, total_amount: i64, total_months: i64, start_date: Option<&str>) -> i64 {
    let (status, json) = post(
        app,
        "/chits",
        json!({
            "name": "Test Kuri",
            "total_amount": total_amount,
            "total_months": total_months,
            "start_date": start_date,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create chit failed: {}", json);
    json["id"].as_i64().unwrap()
}

pub async fn join(app: &Router, chit_id: i64, member_id: i64, slot_number: i64) {
    let (status, json) = post(
        app,
        &format!("/chits/{}/members", chit_id),
        json!({ "member_id": member_id, "slot_number": slot_number }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "join failed: {}", json);
}

/// Id of the chit_months row for `month_number`
pub async fn month_id(app: &Router, chit_id: i64, month_number: i64) -> i64 {
    let (_, json) = get(app, &format!("/chits/{}/months", chit_id)).await;
    json["months"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["month_number"].as_i64() == Some(month_number))
        .and_then(|m| m["id"].as_i64())
        .unwrap()
}
