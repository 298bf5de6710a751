//! Handlers for `/entries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/entries` | Body: [`NewEntryBody`]; returns 201 + stored entry, 409 on conflict |
//! | `GET`  | `/entries` | Ledger query; `client`+`unit` together or not at all |
//! | `GET`  | `/entries/conflicts` | Duplicate-guard preview, no writes |
//! | `GET`  | `/entries/open` | Session matcher; 404 when nothing matches |
//! | `GET`  | `/entries/:id` | Single entry |
//! | `POST` | `/entries/:id/close` | Body: [`CloseBody`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use garita_core::{
  document::{Document, DocumentKind},
  entry::{AccessEntry, EntryState, PersonCategory, Scope, SessionContext},
  guard::{self, GuardOutcome},
  ledger::{self, EntryDraft},
  resolver::RegistryClient,
  session,
  store::{AccessStore, EntryQuery},
  Error as CoreError,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::store_err, ApiError, ApiState};

fn scope_from(client: String, unit: String) -> Scope {
  Scope::new(client, unit)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /entries`.
#[derive(Debug, Deserialize)]
pub struct NewEntryBody {
  pub document_number: String,
  /// Defaults to `dni`.
  pub document_kind:   Option<DocumentKind>,
  pub pass_number:     Option<String>,
  pub full_name:       String,
  pub category:        PersonCategory,
  pub client:          String,
  pub unit:            String,
  pub operator:        String,
  pub company:         Option<String>,
  pub contact_person:  Option<String>,
  pub reason:          Option<String>,
  pub notes:           Option<String>,
}

/// `POST /entries` — returns 201 + the stored entry; 409 with the blocking
/// entry when the duplicate guard rejects the admission.
pub async fn create<S, R>(
  State(state): State<ApiState<S, R>>,
  Json(body): Json<NewEntryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let kind = body.document_kind.unwrap_or(DocumentKind::Dni);
  let document = Document::parse(kind, &body.document_number)?;
  let ctx = SessionContext::new(
    scope_from(body.client, body.unit),
    body.operator,
  );

  let entry = ledger::create(&*state.store, &ctx, EntryDraft {
    document,
    pass_number: body.pass_number,
    full_name: body.full_name,
    category: body.category,
    company: body.company,
    contact_person: body.contact_person,
    reason: body.reason,
    notes: body.notes,
  })
  .await?;

  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub client:         Option<String>,
  pub unit:           Option<String>,
  pub document:       Option<String>,
  pub state:          Option<EntryState>,
  pub entered_after:  Option<DateTime<Utc>>,
  pub entered_before: Option<DateTime<Utc>>,
  pub limit:          Option<u32>,
}

/// `GET /entries` — general ledger query, newest first.
pub async fn list<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AccessEntry>>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let scope = match (params.client, params.unit) {
    (Some(client), Some(unit)) => Some(scope_from(client, unit)),
    (None, None) => None,
    _ => {
      return Err(ApiError::BadRequest(
        "client and unit must be given together".into(),
      ));
    }
  };

  let entries = state
    .store
    .query_entries(EntryQuery {
      scope,
      document: params.document,
      state: params.state,
      entered_after: params.entered_after,
      entered_before: params.entered_before,
      limit: params.limit,
    })
    .await
    .map_err(store_err)?;

  Ok(Json(entries))
}

// ─── Duplicate guard ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConflictParams {
  pub document: String,
  pub pass:     Option<String>,
  pub client:   String,
  pub unit:     String,
}

/// `GET /entries/conflicts` — advisory duplicate check before admission.
pub async fn conflicts<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<ConflictParams>,
) -> Result<Json<GuardOutcome>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let scope = scope_from(params.client, params.unit);
  let outcome = guard::check(
    &*state.store,
    &params.document,
    params.pass.as_deref(),
    &scope,
  )
  .await?;
  Ok(Json(outcome))
}

// ─── Session matcher ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OpenParams {
  pub document: Option<String>,
  pub pass:     Option<String>,
  pub client:   String,
  pub unit:     String,
}

/// `GET /entries/open` — find the open entry for a departing person.
pub async fn open<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<OpenParams>,
) -> Result<Json<AccessEntry>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let scope = scope_from(params.client, params.unit);
  let entry = session::find_open(
    &*state.store,
    params.document.as_deref(),
    params.pass.as_deref(),
    &scope,
  )
  .await?
  .ok_or(CoreError::NoOpenSession)?;
  Ok(Json(entry))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /entries/:id`
pub async fn get_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<Json<AccessEntry>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let entry = state
    .store
    .get_entry(id)
    .await
    .map_err(store_err)?
    .ok_or(CoreError::EntryNotFound(id))?;
  Ok(Json(entry))
}

// ─── Close ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /entries/:id/close`.
#[derive(Debug, Deserialize)]
pub struct CloseBody {
  pub exit_notes: Option<String>,
  pub operator:   String,
  pub client:     String,
  pub unit:       String,
}

/// `POST /entries/:id/close`
pub async fn close_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CloseBody>,
) -> Result<Json<AccessEntry>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  let ctx = SessionContext::new(
    scope_from(body.client, body.unit),
    body.operator,
  );
  let entry = ledger::close(&*state.store, &ctx, id, body.exit_notes).await?;
  Ok(Json(entry))
}
