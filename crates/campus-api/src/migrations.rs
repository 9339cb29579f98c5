//! Handler for `GET /migrations`: the migration ledger.

use axum::{Json, extract::State};
use campus_core::{migration::MigrationRecord, store::SettingsStore};

use crate::{ApiState, error::ApiError};

/// `GET /migrations`: every ledger record, ordered by name.
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<MigrationRecord>>, ApiError>
where
  S: SettingsStore,
{
  let records = state.store.ledger().await.map_err(ApiError::store)?;
  Ok(Json(records))
}
