//! JSON REST API for the Garita access register.
//!
//! Exposes an axum [`Router`] backed by any
//! [`garita_core::store::AccessStore`] and
//! [`garita_core::resolver::RegistryClient`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", garita_api::api_router(store.clone(), registry.clone()))
//! ```

pub mod directory;
pub mod entries;
pub mod error;
pub mod events;
pub mod lookup;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use garita_core::{resolver::RegistryClient, store::AccessStore};

pub use error::ApiError;

/// Shared handler state: the ledger store plus the registry client.
pub struct ApiState<S, R> {
  pub store:    Arc<S>,
  pub registry: Arc<R>,
}

// Derived Clone would require S: Clone and R: Clone; the Arcs make that
// unnecessary.
impl<S, R> Clone for ApiState<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      registry: Arc::clone(&self.registry),
    }
  }
}

/// Build a fully-materialised API router for `store` and `registry`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, R>(store: Arc<S>, registry: Arc<R>) -> Router<()>
where
  S: AccessStore + 'static,
  R: RegistryClient + 'static,
{
  Router::new()
    // Identity resolution
    .route("/lookup/{dni}", get(lookup::handler::<S, R>))
    // Ledger
    .route(
      "/entries",
      get(entries::list::<S, R>).post(entries::create::<S, R>),
    )
    .route("/entries/conflicts", get(entries::conflicts::<S, R>))
    .route("/entries/open", get(entries::open::<S, R>))
    .route("/entries/{id}", get(entries::get_one::<S, R>))
    .route("/entries/{id}/close", post(entries::close_one::<S, R>))
    // Directory
    .route("/directory/clients", get(directory::list::<S, R>))
    .route(
      "/directory/clients/{name}",
      put(directory::put_one::<S, R>),
    )
    .route(
      "/directory/clients/{name}/units",
      get(directory::units::<S, R>),
    )
    // Reports
    .route("/reports/summary", get(reports::summary::<S, R>))
    // Live updates
    .route("/events", get(events::handler::<S, R>))
    .with_state(ApiState { store, registry })
}
