//! Ledger operations — check-in and check-out.
//!
//! These functions normalise and validate operator input, then delegate the
//! actual conditional write to the store.

use uuid::Uuid;

use crate::{
  document::Document,
  entry::{
    AccessEntry, EntryMetadata, NewEntry, PersonCategory, SessionContext,
  },
  store::AccessStore,
  Error,
};

/// Sentinel recorded when an exit is confirmed without comments.
pub const NO_COMMENTS: &str = "Sin comentarios";

/// Operator input for a check-in, before normalisation.
#[derive(Debug, Clone)]
pub struct EntryDraft {
  pub document:       Document,
  pub pass_number:    Option<String>,
  pub full_name:      String,
  pub category:       PersonCategory,
  pub company:        Option<String>,
  pub contact_person: Option<String>,
  pub reason:         Option<String>,
  pub notes:          Option<String>,
}

fn upper_opt(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_uppercase())
    .filter(|v| !v.is_empty())
}

/// Register a check-in: normalise the draft, then atomically insert an
/// Activo entry. The store rejects the insert if the duplicate invariant
/// would be violated.
pub async fn create<S: AccessStore>(
  store: &S,
  ctx: &SessionContext,
  draft: EntryDraft,
) -> crate::Result<AccessEntry> {
  if ctx.scope.client.trim().is_empty() {
    return Err(Error::MissingField("client"));
  }
  if ctx.scope.unit.trim().is_empty() {
    return Err(Error::MissingField("unit"));
  }

  let full_name = draft.full_name.trim().to_uppercase();
  if full_name.is_empty() {
    return Err(Error::MissingField("full_name"));
  }

  let pass_number = upper_opt(draft.pass_number);

  let metadata = EntryMetadata {
    company:        upper_opt(draft.company),
    contact_person: upper_opt(draft.contact_person),
    reason:         upper_opt(draft.reason),
    notes:          upper_opt(draft.notes),
    exit_notes:     None,
    registered_by:  Some(ctx.operator.clone()),
    closed_by:      None,
  };

  store
    .insert_entry(NewEntry {
      document_number: draft.document.number,
      document_kind: draft.document.kind,
      pass_number,
      full_name,
      category: draft.category,
      scope: ctx.scope.clone(),
      metadata,
    })
    .await
    .map_err(Into::into)
}

/// Register a check-out: atomically transition the entry to Cerrado. Blank
/// or absent notes become [`NO_COMMENTS`]. Notes keep their original casing.
pub async fn close<S: AccessStore>(
  store: &S,
  ctx: &SessionContext,
  entry_id: Uuid,
  exit_notes: Option<String>,
) -> crate::Result<AccessEntry> {
  let notes = exit_notes
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
    .unwrap_or_else(|| NO_COMMENTS.to_owned());

  store
    .close_entry(entry_id, notes, ctx.operator.clone())
    .await
    .map_err(Into::into)
}
