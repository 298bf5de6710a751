//! Duplicate guard — pre-admission conflict detection.
//!
//! Answers "would admitting this person/pass violate the single-active-entry
//! invariant?" without writing anything. The store re-derives the same
//! checks atomically at insert time, so a Clear verdict here is advisory.

use serde::Serialize;

use crate::{
  entry::{AccessEntry, Scope},
  store::{AccessStore, ActiveFilter, IdentMatch},
};

/// Verdict from a duplicate check. Document conflicts take precedence over
/// pass conflicts when both would fire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "entry", rename_all = "snake_case")]
pub enum GuardOutcome {
  Clear,
  DocumentConflict(Box<AccessEntry>),
  PassConflict(Box<AccessEntry>),
}

impl GuardOutcome {
  pub fn is_clear(&self) -> bool { matches!(self, GuardOutcome::Clear) }
}

/// Check whether an Activo entry within `scope` already holds the document
/// number, or the pass number if one is given.
pub async fn check<S: AccessStore>(
  store: &S,
  document_number: &str,
  pass_number: Option<&str>,
  scope: &Scope,
) -> crate::Result<GuardOutcome> {
  let by_document = store
    .find_active(ActiveFilter {
      scope: scope.clone(),
      ident: IdentMatch::Document(document_number.to_owned()),
    })
    .await
    .map_err(Into::into)?;
  if let Some(existing) = by_document.into_iter().next() {
    return Ok(GuardOutcome::DocumentConflict(Box::new(existing)));
  }

  let pass = pass_number
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_uppercase);
  if let Some(pass) = pass {
    let by_pass = store
      .find_active(ActiveFilter {
        scope: scope.clone(),
        ident: IdentMatch::Pass(pass),
      })
      .await
      .map_err(Into::into)?;
    if let Some(existing) = by_pass.into_iter().next() {
      return Ok(GuardOutcome::PassConflict(Box::new(existing)));
    }
  }

  Ok(GuardOutcome::Clear)
}
