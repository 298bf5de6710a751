//! The [`AccessStore`] trait — persistence surface for the access ledger
//! and the client/unit directory.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::entry::{AccessEntry, EntryState, NewEntry, Scope};

// ─── Matchers & filters ──────────────────────────────────────────────────────

/// How to match an Activo entry against an identifier.
#[derive(Debug, Clone)]
pub enum IdentMatch {
  /// Match on document number only.
  Document(String),
  /// Match on pass number only.
  Pass(String),
  /// Match if either identifier matches. A `None` side never matches.
  Either {
    document: Option<String>,
    pass:     Option<String>,
  },
}

/// Filter for [`AccessStore::find_active`]. Always scope-bounded.
#[derive(Debug, Clone)]
pub struct ActiveFilter {
  pub scope: Scope,
  pub ident: IdentMatch,
}

/// Filter for [`AccessStore::query_entries`]. All fields optional; unset
/// fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  pub scope:          Option<Scope>,
  pub document:       Option<String>,
  pub state:          Option<EntryState>,
  pub entered_after:  Option<chrono::DateTime<chrono::Utc>>,
  pub entered_before: Option<chrono::DateTime<chrono::Utc>>,
  /// Maximum rows returned; stores apply a default when unset.
  pub limit:          Option<u32>,
}

// ─── Live events ─────────────────────────────────────────────────────────────

/// Emitted by the store after each committed ledger mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryEvent {
  Entered(AccessEntry),
  Closed(AccessEntry),
}

impl EntryEvent {
  pub fn entry(&self) -> &AccessEntry {
    match self {
      EntryEvent::Entered(e) | EntryEvent::Closed(e) => e,
    }
  }
}

// ─── AccessStore ─────────────────────────────────────────────────────────────

/// Persistence for access entries and the client/unit directory.
///
/// Ledger writes are conditional: `insert_entry` re-checks the duplicate
/// invariant and `close_entry` re-checks the Activo precondition inside the
/// same atomic unit as the write, so concurrent callers cannot both succeed.
pub trait AccessStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Atomically insert a new Activo entry, assigning `entry_id` and
  /// `entered_at`. Fails with a conflict if an Activo entry in the same
  /// scope already holds the document number (checked first) or the pass
  /// number.
  fn insert_entry(
    &self,
    new: NewEntry,
  ) -> impl Future<Output = Result<AccessEntry, Self::Error>> + Send + '_;

  fn get_entry(
    &self,
    entry_id: Uuid,
  ) -> impl Future<Output = Result<Option<AccessEntry>, Self::Error>> + Send + '_;

  /// Atomically transition an Activo entry to Cerrado, stamping `exited_at`
  /// and recording exit notes and the closing operator. Fails if the entry
  /// does not exist or is already closed.
  fn close_entry(
    &self,
    entry_id: Uuid,
    exit_notes: String,
    closed_by: String,
  ) -> impl Future<Output = Result<AccessEntry, Self::Error>> + Send + '_;

  /// All Activo entries matching the filter, newest first.
  fn find_active(
    &self,
    filter: ActiveFilter,
  ) -> impl Future<Output = Result<Vec<AccessEntry>, Self::Error>> + Send + '_;

  /// General ledger query, newest first.
  fn query_entries(
    &self,
    query: EntryQuery,
  ) -> impl Future<Output = Result<Vec<AccessEntry>, Self::Error>> + Send + '_;

  /// Subscribe to committed ledger mutations. Events are emitted after the
  /// corresponding write has been durably applied.
  fn subscribe(&self) -> broadcast::Receiver<EntryEvent>;

  // directory

  /// Create or replace a client and its ordered unit list.
  fn put_client(
    &self,
    name: String,
    units: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The units for a client, in stored order. `None` if the client is
  /// unknown.
  fn client_units(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Vec<String>>, Self::Error>> + Send + '_;

  fn list_clients(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
