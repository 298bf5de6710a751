//! Handler for `GET /events` — live ledger updates over SSE.

use std::convert::Infallible;

use axum::{
  extract::{Query, State},
  response::sse::{Event, KeepAlive, Sse},
};
use garita_core::{
  entry::Scope, resolver::RegistryClient, store::AccessStore,
};
use serde::Deserialize;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt as _};

use crate::{ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub struct EventParams {
  pub client: Option<String>,
  pub unit:   Option<String>,
}

/// `GET /events[?client=..&unit=..]` — server-sent stream of entry events,
/// optionally filtered to one scope.
pub async fn handler<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<EventParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let scope = match (params.client, params.unit) {
    (Some(client), Some(unit)) => Some(Scope::new(client, unit)),
    (None, None) => None,
    _ => {
      return Err(ApiError::BadRequest(
        "client and unit must be given together".into(),
      ));
    }
  };

  let rx = state.store.subscribe();
  let stream = BroadcastStream::new(rx).filter_map(move |result| {
    // A lagged receiver just skips what it missed.
    let event = result.ok()?;
    if let Some(scope) = &scope {
      if &event.entry().scope != scope {
        return None;
      }
    }
    Event::default().json_data(&event).ok().map(Ok)
  });

  Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
