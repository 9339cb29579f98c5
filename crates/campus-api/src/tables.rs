//! Handler for `GET /tables`: presence of each catalog table.

use axum::{Json, extract::State};
use campus_core::store::SettingsStore;
use serde::Serialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct TableStatus {
  pub name:   &'static str,
  pub exists: bool,
}

/// `GET /tables`: one entry per catalog table, in catalog order.
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<TableStatus>>, ApiError>
where
  S: SettingsStore,
{
  let mut statuses = Vec::with_capacity(state.tables.len());
  for spec in state.tables {
    let exists = state
      .store
      .table_exists(spec.name)
      .await
      .map_err(ApiError::store)?;
    statuses.push(TableStatus { name: spec.name, exists });
  }
  Ok(Json(statuses))
}
