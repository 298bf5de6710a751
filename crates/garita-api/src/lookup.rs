//! Handler for `GET /lookup/:dni` — identity resolution.

use axum::{
  Json,
  extract::{Path, State},
};
use garita_core::{
  document::Document,
  resolver::{self, RegistryClient, Resolution},
  store::AccessStore,
};

use crate::{ApiError, ApiState};

/// `GET /lookup/:dni` — resolve a DNI to a full name, cache first.
pub async fn handler<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(dni): Path<String>,
) -> Result<Json<Resolution>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let document = Document::dni(&dni)?;
  let resolution =
    resolver::resolve(&*state.store, &*state.registry, &document).await?;
  Ok(Json(resolution))
}
