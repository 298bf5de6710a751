//! Handlers for `/directory` endpoints — the client/unit catalogue.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/directory/clients` | All client names |
//! | `PUT`  | `/directory/clients/:name` | Body: `{"units": [...]}`; replaces the list |
//! | `GET`  | `/directory/clients/:name/units` | Ordered unit list, 404 if unknown |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use garita_core::{resolver::RegistryClient, store::AccessStore};
use serde::Deserialize;

use crate::{error::store_err, ApiError, ApiState};

/// `GET /directory/clients`
pub async fn list<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let clients = state.store.list_clients().await.map_err(store_err)?;
  Ok(Json(clients))
}

#[derive(Debug, Deserialize)]
pub struct PutClientBody {
  pub units: Vec<String>,
}

/// `PUT /directory/clients/:name` — create or replace a client and its
/// ordered unit list. Names are stored uppercased.
pub async fn put_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(name): Path<String>,
  Json(body): Json<PutClientBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let name = name.trim().to_uppercase();
  if name.is_empty() {
    return Err(ApiError::BadRequest("client name must not be blank".into()));
  }

  let units: Vec<String> = body
    .units
    .into_iter()
    .map(|u| u.trim().to_uppercase())
    .collect();
  if units.iter().any(String::is_empty) {
    return Err(ApiError::BadRequest("unit names must not be blank".into()));
  }

  state
    .store
    .put_client(name, units)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /directory/clients/:name/units`
pub async fn units<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(name): Path<String>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let name = name.trim().to_uppercase();
  let units = state
    .store
    .client_units(name.clone())
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("client {name} not found")))?;
  Ok(Json(units))
}
