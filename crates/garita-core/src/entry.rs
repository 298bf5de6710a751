//! Access entries — the ledger record for one visit span.
//!
//! A single entry represents the whole visit: created `Activo` at check-in
//! and transitioned in place to `Cerrado` at check-out. There is no separate
//! exit record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::DocumentKind;

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The (client, unit) pair bounding duplicate and session matching.
/// Entries in different scopes never conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
  pub client: String,
  pub unit:   String,
}

impl Scope {
  pub fn new(client: impl Into<String>, unit: impl Into<String>) -> Self {
    Self { client: client.into(), unit: unit.into() }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.client, self.unit)
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Reporting category for the person entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonCategory {
  Contratista,
  Cliente,
  Visita,
}

/// Lifecycle status. `Activo` is initial, `Cerrado` terminal; entries are
/// never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
  Activo,
  Cerrado,
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Free-form fields carried on an entry; none participate in invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
  pub company:        Option<String>,
  pub contact_person: Option<String>,
  pub reason:         Option<String>,
  pub notes:          Option<String>,
  pub exit_notes:     Option<String>,
  pub registered_by:  Option<String>,
  pub closed_by:      Option<String>,
}

// ─── AccessEntry ─────────────────────────────────────────────────────────────

/// One ledger record, spanning a visit from check-in to check-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEntry {
  pub entry_id:        Uuid,
  pub document_number: String,
  pub document_kind:   DocumentKind,
  /// Physical pass/badge identifier; `None` when not tracked.
  pub pass_number:     Option<String>,
  pub full_name:       String,
  pub category:        PersonCategory,
  pub scope:           Scope,
  pub state:           EntryState,
  /// Set at creation; immutable.
  pub entered_at:      DateTime<Utc>,
  /// Set exactly once, at closure.
  pub exited_at:       Option<DateTime<Utc>>,
  pub metadata:        EntryMetadata,
}

impl AccessEntry {
  pub fn is_active(&self) -> bool { self.state == EntryState::Activo }

  /// Time on site — derived, never stored.
  pub fn dwell(&self) -> Dwell {
    match self.exited_at {
      Some(out) => {
        let minutes = (out - self.entered_at).num_minutes().max(0);
        Dwell::Completed { hours: minutes / 60, minutes: minutes % 60 }
      }
      None => Dwell::InProgress,
    }
  }
}

// ─── Dwell ───────────────────────────────────────────────────────────────────

/// Whole hours + remainder minutes on site, or "in progress".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dwell {
  InProgress,
  Completed { hours: i64, minutes: i64 },
}

impl fmt::Display for Dwell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Dwell::InProgress => write!(f, "En curso"),
      Dwell::Completed { hours, minutes } => write!(f, "{hours}h {minutes}m"),
    }
  }
}

// ─── Session context ─────────────────────────────────────────────────────────

/// The operator's scope and identity, passed explicitly into every core
/// operation. There is no ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
  pub scope:    Scope,
  pub operator: String,
}

impl SessionContext {
  pub fn new(scope: Scope, operator: impl Into<String>) -> Self {
    Self { scope, operator: operator.into() }
  }
}

// ─── NewEntry ────────────────────────────────────────────────────────────────

/// Validated input to [`crate::store::AccessStore::insert_entry`].
/// `entry_id`, `entered_at`, and the initial `Activo` state are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewEntry {
  pub document_number: String,
  pub document_kind:   DocumentKind,
  pub pass_number:     Option<String>,
  pub full_name:       String,
  pub category:        PersonCategory,
  pub scope:           Scope,
  pub metadata:        EntryMetadata,
}
