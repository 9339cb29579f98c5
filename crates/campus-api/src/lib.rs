//! JSON REST API over a bootstrapped Campus database.
//!
//! Exposes an axum [`Router`] backed by any [`campus_core::store::SettingsStore`].
//! Only mount it once `campus_core::initialize_database` has reached `Ready`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", campus_api::api_router(store.clone(), ENTITIES))
//! ```

pub mod error;
pub mod migrations;
pub mod settings;
pub mod tables;

use std::sync::Arc;

use axum::{Router, routing::get};
use campus_core::{store::SettingsStore, table::TableSpec};

pub use error::ApiError;

/// State shared by every API handler.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  /// The entity catalog reported by `/tables`.
  pub tables: &'static [TableSpec],
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), tables: self.tables }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, tables: &'static [TableSpec]) -> Router<()>
where
  S: SettingsStore + 'static,
{
  Router::new()
    // Bootstrap inspection
    .route("/migrations", get(migrations::list::<S>))
    .route("/tables", get(tables::list::<S>))
    // Settings
    .route(
      "/settings/system",
      get(settings::get_system::<S>).put(settings::put_system::<S>),
    )
    .route(
      "/settings/security",
      get(settings::get_security::<S>).put(settings::put_security::<S>),
    )
    .with_state(ApiState { store, tables })
}

#[cfg(test)]
mod tests;
