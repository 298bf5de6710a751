//! Handler for `GET /reports/summary` — dashboard aggregation.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use garita_core::{
  entry::{AccessEntry, Scope},
  report::{self, AccessSummary},
  resolver::RegistryClient,
  store::{AccessStore, EntryQuery},
};
use serde::{Deserialize, Serialize};

use crate::{error::store_err, ApiError, ApiState};

/// Upper bound on rows pulled into one report.
const REPORT_LIMIT: u32 = 10_000;

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
  pub client: String,
  pub unit:   String,
  pub from:   DateTime<Utc>,
  pub to:     DateTime<Utc>,
}

/// One ledger row in the report, with its display-ready dwell string.
#[derive(Debug, Serialize)]
pub struct RecordView {
  #[serde(flatten)]
  pub entry: AccessEntry,
  pub dwell: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub summary: AccessSummary,
  pub records: Vec<RecordView>,
}

/// `GET /reports/summary?client=..&unit=..&from=..&to=..`
pub async fn summary<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: AccessStore,
  R: RegistryClient,
{
  if params.to < params.from {
    return Err(ApiError::BadRequest("`to` precedes `from`".into()));
  }

  let entries = state
    .store
    .query_entries(EntryQuery {
      scope: Some(Scope::new(params.client, params.unit)),
      entered_after: Some(params.from),
      entered_before: Some(params.to),
      limit: Some(REPORT_LIMIT),
      ..EntryQuery::default()
    })
    .await
    .map_err(store_err)?;

  let summary = report::summarize(&entries);
  let records = entries
    .into_iter()
    .map(|entry| RecordView {
      dwell: entry.dwell().to_string(),
      entry,
    })
    .collect();

  Ok(Json(SummaryResponse { summary, records }))
}
