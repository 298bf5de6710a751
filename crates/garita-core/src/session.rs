//! Session matcher — locate the open entry for a departing person.

use crate::{
  entry::{AccessEntry, Scope},
  store::{AccessStore, ActiveFilter, IdentMatch},
  Error,
};

/// Find the open entry within `scope` matching the given document number
/// and/or pass number. Either identifier matching is enough; when several
/// entries match, the most recent check-in wins.
///
/// Blank identifiers are treated as absent. Fails with
/// [`Error::MissingIdentifier`] when neither is given.
pub async fn find_open<S: AccessStore>(
  store: &S,
  document_number: Option<&str>,
  pass_number: Option<&str>,
  scope: &Scope,
) -> crate::Result<Option<AccessEntry>> {
  let document = document_number
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .map(str::to_uppercase);
  let pass = pass_number
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_uppercase);

  if document.is_none() && pass.is_none() {
    return Err(Error::MissingIdentifier);
  }

  let matches = store
    .find_active(ActiveFilter {
      scope: scope.clone(),
      ident: IdentMatch::Either { document, pass },
    })
    .await
    .map_err(Into::into)?;

  Ok(matches.into_iter().next())
}
