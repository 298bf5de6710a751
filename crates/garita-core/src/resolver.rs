//! Identity resolver — DNI to full name, cache first, registry second.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  document::{Document, DocumentKind},
  store::{AccessStore, EntryQuery},
  Error,
};

// ─── Registry client ─────────────────────────────────────────────────────────

/// Failure modes of a registry lookup, kept distinct so callers can tell
/// "no such person" from "the registry is down".
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryError {
  #[error("no registry record for the document")]
  NotFound,
  #[error("registry rejected our credentials")]
  Auth,
  #[error("registry request timed out")]
  Timeout,
  #[error("registry unreachable: {0}")]
  Network(String),
  #[error("registry response unparseable: {0}")]
  Parse(String),
  #[error("registry returned status {0}")]
  Status(u16),
}

impl RegistryError {
  /// Whether a retry could plausibly succeed without operator action.
  pub fn is_retryable(&self) -> bool {
    matches!(self, RegistryError::Timeout | RegistryError::Network(_))
  }
}

/// A person record as returned by the national registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryPerson {
  pub first_name:       String,
  pub first_last_name:  String,
  pub second_last_name: Option<String>,
  pub date_of_birth:    Option<NaiveDate>,
  pub gender:           Option<String>,
  pub marital_status:   Option<String>,
  pub nationality:      Option<String>,
}

impl RegistryPerson {
  /// "FIRST_NAME FIRST_LAST SECOND_LAST", omitting a missing second
  /// surname.
  pub fn full_name(&self) -> String {
    let mut name =
      format!("{} {}", self.first_name.trim(), self.first_last_name.trim());
    if let Some(second) = &self.second_last_name {
      let second = second.trim();
      if !second.is_empty() {
        name.push(' ');
        name.push_str(second);
      }
    }
    name
  }
}

/// Lookup interface to the national registry. Implemented over HTTP in the
/// registry crate and by stubs in tests.
pub trait RegistryClient: Send + Sync {
  fn lookup<'a>(
    &'a self,
    dni: &'a str,
  ) -> impl Future<Output = Result<RegistryPerson, RegistryError>> + Send + 'a;
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Where a resolved name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
  Cache,
  Registry,
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
  pub full_name: String,
  pub source:    NameSource,
}

/// Resolve a document number to a full name.
///
/// DNIs probe the local ledger first: any prior entry for the same number,
/// in any scope and state, supplies the name without a network call. On a
/// cache miss the registry is consulted. Alternate documents always require
/// manual name entry.
pub async fn resolve<S, R>(
  store: &S,
  registry: &R,
  document: &Document,
) -> crate::Result<Resolution>
where
  S: AccessStore,
  R: RegistryClient,
{
  if document.kind == DocumentKind::Foreign {
    return Err(Error::ManualNameRequired);
  }

  let cached = store
    .query_entries(EntryQuery {
      document: Some(document.number.clone()),
      limit: Some(1),
      ..EntryQuery::default()
    })
    .await
    .map_err(Into::into)?;
  if let Some(prior) = cached.into_iter().next() {
    return Ok(Resolution {
      full_name: prior.full_name,
      source:    NameSource::Cache,
    });
  }

  match registry.lookup(&document.number).await {
    Ok(person) => Ok(Resolution {
      full_name: person.full_name().to_uppercase(),
      source:    NameSource::Registry,
    }),
    Err(RegistryError::NotFound) => {
      Err(Error::PersonNotFound(document.number.clone()))
    }
    Err(e) => Err(Error::Registry(e)),
  }
}
