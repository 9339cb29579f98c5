//! HTTP surface of the Campus server.
//!
//! Holds the runtime configuration, the shared application state and the
//! top-level axum [`Router`]. The router is only ever built around a store
//! whose bootstrap reached `Ready`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{Json, Router, routing::get};
use campus_store_sqlite::{ENTITIES, OpenOptions, SqliteStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CAMPUS__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:     String,
  pub port:     u16,
  pub database: DatabaseConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:     "127.0.0.1".to_owned(),
      port:     8080,
      database: DatabaseConfig::default(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
  pub path:              PathBuf,
  /// SQL script for the fallback tier. When unset, the script rendered from
  /// the entity catalog is used.
  pub schema_file:       Option<PathBuf>,
  pub busy_timeout_ms:   u64,
  pub step_timeout_secs: u64,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      path:              PathBuf::from("campus.db"),
      schema_file:       None,
      busy_timeout_ms:   5_000,
      step_timeout_secs: 30,
    }
  }
}

impl DatabaseConfig {
  pub fn open_options(&self) -> OpenOptions {
    OpenOptions { busy_timeout: Duration::from_millis(self.busy_timeout_ms) }
  }

  pub fn step_timeout(&self) -> Duration { Duration::from_secs(self.step_timeout_secs) }

  /// Copy with `~` expanded in every path.
  pub fn expanded(&self) -> Self {
    Self {
      path: expand_tilde(&self.path),
      schema_file: self.schema_file.as_deref().map(expand_tilde),
      ..self.clone()
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state handed to the router.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<SqliteStore>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level [`Router`]: `/health` plus the JSON API under `/api`.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api", campus_api::api_router(state.store, ENTITIES))
    .layer(TraceLayer::new_for_http())
}

/// `GET /health`. The router only exists once bootstrap is complete.
async fn health() -> Json<Value> { Json(json!({ "status": "ready" })) }

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use campus_core::initialize_database;
  use campus_store_sqlite::default_plan;
  use tower::ServiceExt as _;

  async fn make_state() -> AppState {
    let store = SqliteStore::open_in_memory().await.unwrap();
    initialize_database(&store, &default_plan(None).unwrap())
      .await
      .unwrap();
    AppState { store: Arc::new(store) }
  }

  async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  #[tokio::test]
  async fn health_reports_ready() {
    let (status, body) = get_json(make_state().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ready" }));
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (status, body) = get_json(make_state().await, "/api/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), ENTITIES.len());
  }

  #[tokio::test]
  async fn unknown_route_is_404() {
    let (status, _) = get_json(make_state().await, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn config_defaults_fill_missing_fields() {
    let cfg: ServerConfig =
      serde_json::from_value(json!({ "port": 9000, "database": { "path": "/tmp/x.db" } })).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.database.path, PathBuf::from("/tmp/x.db"));
    assert_eq!(cfg.database.step_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.database.open_options().busy_timeout, Duration::from_millis(5_000));
    assert!(cfg.database.schema_file.is_none());
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/campus.db")), PathBuf::from(home).join("campus.db"));
    assert_eq!(expand_tilde(Path::new("/srv/~/campus.db")), PathBuf::from("/srv/~/campus.db"));
  }
}
