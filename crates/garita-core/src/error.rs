//! Error taxonomy for `garita-core`.
//!
//! Every core operation returns a discriminated outcome rather than
//! panicking past its boundary; the HTTP layer is the only place a failure
//! terminates in user-visible messaging.

use thiserror::Error;
use uuid::Uuid;

use crate::{entry::AccessEntry, resolver::RegistryError};

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed document number (e.g. a DNI that is not 8 numeric digits).
  #[error("invalid document number: {0:?}")]
  InvalidDocument(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  /// The session matcher needs at least a document or a pass number.
  #[error("either a document number or a pass number is required")]
  MissingIdentifier,

  /// Alternate documents skip registry lookup; the operator types the name.
  #[error("document requires manual name entry")]
  ManualNameRequired,

  /// The registry has no record for this document number.
  #[error("person not found in registry: {0}")]
  PersonNotFound(String),

  /// An Activo entry already holds this document number within the scope.
  #[error("an active entry already exists for document {}", .0.document_number)]
  DocumentConflict(Box<AccessEntry>),

  /// The pass number is already assigned to an open entry within the scope.
  #[error("pass number already in use by the active entry for document {}", .0.document_number)]
  PassConflict(Box<AccessEntry>),

  #[error("entry not found: {0}")]
  EntryNotFound(Uuid),

  /// Closing twice is an error, not a no-op: `exited_at` must reflect a
  /// single real event.
  #[error("entry {0} is already closed")]
  AlreadyClosed(Uuid),

  #[error("no active entry matches the given document/pass")]
  NoOpenSession,

  #[error("registry lookup failed: {0}")]
  Registry(#[from] RegistryError),

  /// Unexpected store failure, surfaced generically.
  #[error("store error: {0}")]
  Store(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
