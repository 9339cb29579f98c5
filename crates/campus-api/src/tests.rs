use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use campus_core::initialize_database;
use campus_store_sqlite::{ENTITIES, SqliteStore, default_plan};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn ready_store() -> Arc<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  initialize_database(&store, &default_plan(None).unwrap())
    .await
    .unwrap();
  Arc::new(store)
}

async fn send(store: Arc<SqliteStore>, method: &str, uri: &str, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  api_router(store, ENTITIES)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ─── Inspection ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn migrations_lists_every_ledger_record() {
  let store = ready_store().await;
  let resp = send(store, "GET", "/migrations", None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let records = json_body(resp).await;
  let records = records.as_array().unwrap();
  assert_eq!(records.len(), campus_store_sqlite::MIGRATIONS.len());
  assert!(records.iter().all(|r| r["success"] == json!(true)));
  assert!(records.iter().any(|r| r["name"] == "create_payments_table"));
}

#[tokio::test]
async fn tables_reports_presence_in_catalog_order() {
  let store = ready_store().await;
  let resp = send(store, "GET", "/tables", None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let tables = json_body(resp).await;
  let tables = tables.as_array().unwrap();
  assert_eq!(tables.len(), ENTITIES.len());
  assert_eq!(tables[0]["name"], ENTITIES[0].name);
  assert!(tables.iter().all(|t| t["exists"] == json!(true)));
}

#[tokio::test]
async fn tables_on_empty_database_are_absent() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let tables = json_body(send(store, "GET", "/tables", None).await).await;
  assert!(tables.as_array().unwrap().iter().all(|t| t["exists"] == json!(false)));
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn system_settings_defaults_after_bootstrap() {
  let store = ready_store().await;
  let resp = send(store, "GET", "/settings/system", None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["school_name"], "School Management System");
  assert_eq!(body["allow_registration"], json!(true));
}

#[tokio::test]
async fn put_system_settings_round_trips() {
  let store = ready_store().await;
  let resp = send(
    store.clone(),
    "PUT",
    "/settings/system",
    Some(json!({ "school_name": "Hillside Academy", "timezone": "Europe/Oslo" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["school_name"], "Hillside Academy");

  let body = json_body(send(store, "GET", "/settings/system", None).await).await;
  assert_eq!(body["school_name"], "Hillside Academy");
  assert_eq!(body["timezone"], "Europe/Oslo");
  assert_eq!(body["default_language"], "en");
}

#[tokio::test]
async fn put_security_settings_rejects_invalid_values() {
  let store = ready_store().await;
  let resp = send(
    store.clone(),
    "PUT",
    "/settings/security",
    Some(json!({ "password_min_length": 500 })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(resp).await["error"].is_string());

  let body = json_body(send(store, "GET", "/settings/security", None).await).await;
  assert_eq!(body["password_min_length"], json!(8));
}

#[tokio::test]
async fn put_security_settings_updates_named_fields_only() {
  let store = ready_store().await;
  let resp = send(
    store,
    "PUT",
    "/settings/security",
    Some(json!({ "two_factor_required": true, "max_login_attempts": 3 })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["two_factor_required"], json!(true));
  assert_eq!(body["max_login_attempts"], json!(3));
  assert_eq!(body["session_timeout_minutes"], json!(30));
}

#[tokio::test]
async fn put_system_settings_rejects_blank_name() {
  let store = ready_store().await;
  let resp = send(
    store.clone(),
    "PUT",
    "/settings/system",
    Some(json!({ "school_name": "   " })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert!(body["error"].as_str().unwrap().contains("school_name"));

  let body = json_body(send(store, "GET", "/settings/system", None).await).await;
  assert_eq!(body["school_name"], "School Management System");
}

#[test]
fn invalid_setting_from_store_maps_to_bad_request() {
  let err = campus_store_sqlite::Error::Core(campus_core::Error::InvalidSetting("too short".into()));
  assert!(matches!(ApiError::store(err), ApiError::BadRequest(ref m) if m == "too short"));

  let err = campus_store_sqlite::Error::DateParse("garbage".into());
  assert!(matches!(ApiError::store(err), ApiError::Store(_)));
}

#[tokio::test]
async fn missing_settings_row_is_404() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let spec = ENTITIES.iter().find(|t| t.name == "security_settings").unwrap();
  campus_core::store::SchemaStore::create_table(&store, spec).await.unwrap();

  let resp = send(Arc::new(store), "GET", "/settings/security", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(json_body(resp).await["error"].is_string());
}
