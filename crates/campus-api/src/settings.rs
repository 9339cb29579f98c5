//! Handlers for the singleton settings rows.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/settings/system` | 404 if the row is absent |
//! | `PUT`  | `/settings/system` | Partial body; omitted fields are kept |
//! | `GET`  | `/settings/security` | 404 if the row is absent |
//! | `PUT`  | `/settings/security` | Partial body; omitted fields are kept |
//!
//! Updates are validated by the store; a rejected value is a 400.

use axum::{Json, extract::State};
use campus_core::{
  settings::{SecuritySettings, SecuritySettingsUpdate, SystemSettings, SystemSettingsUpdate},
  store::SettingsStore,
};

use crate::{ApiState, error::ApiError};

// ─── System ───────────────────────────────────────────────────────────────────

/// `GET /settings/system`
pub async fn get_system<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<SystemSettings>, ApiError>
where
  S: SettingsStore,
{
  let settings = state
    .store
    .system_settings()
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("system settings not initialised".into()))?;
  Ok(Json(settings))
}

/// `PUT /settings/system`, body: any subset of the settings fields.
pub async fn put_system<S>(
  State(state): State<ApiState<S>>,
  Json(update): Json<SystemSettingsUpdate>,
) -> Result<Json<SystemSettings>, ApiError>
where
  S: SettingsStore,
{
  let settings = state
    .store
    .update_system_settings(update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(settings))
}

// ─── Security ─────────────────────────────────────────────────────────────────

/// `GET /settings/security`
pub async fn get_security<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<SecuritySettings>, ApiError>
where
  S: SettingsStore,
{
  let settings = state
    .store
    .security_settings()
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("security settings not initialised".into()))?;
  Ok(Json(settings))
}

/// `PUT /settings/security`, body: any subset of the settings fields.
pub async fn put_security<S>(
  State(state): State<ApiState<S>>,
  Json(update): Json<SecuritySettingsUpdate>,
) -> Result<Json<SecuritySettings>, ApiError>
where
  S: SettingsStore,
{
  let settings = state
    .store
    .update_security_settings(update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(settings))
}
