//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond
//! precision and a literal `Z`, so lexicographic comparison in SQL matches
//! chronological order. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Timelike as _, Utc};
use uuid::Uuid;

use garita_core::{
  document::DocumentKind,
  entry::{AccessEntry, EntryMetadata, EntryState, PersonCategory, Scope},
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Now, truncated to the stored microsecond precision, so an entry handed
/// back to the caller compares equal to the same row read from the database.
pub fn now_micros() -> DateTime<Utc> {
  let now = Utc::now();
  now
    .with_nanosecond(now.nanosecond() / 1_000 * 1_000)
    .unwrap_or(now)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_document_kind(k: DocumentKind) -> &'static str {
  match k {
    DocumentKind::Dni => "dni",
    DocumentKind::Foreign => "foreign",
  }
}

pub fn decode_document_kind(s: &str) -> Result<DocumentKind> {
  match s {
    "dni" => Ok(DocumentKind::Dni),
    "foreign" => Ok(DocumentKind::Foreign),
    other => Err(Error::Decode(format!("unknown document kind: {other:?}"))),
  }
}

pub fn encode_category(c: PersonCategory) -> &'static str {
  match c {
    PersonCategory::Contratista => "contratista",
    PersonCategory::Cliente => "cliente",
    PersonCategory::Visita => "visita",
  }
}

pub fn decode_category(s: &str) -> Result<PersonCategory> {
  match s {
    "contratista" => Ok(PersonCategory::Contratista),
    "cliente" => Ok(PersonCategory::Cliente),
    "visita" => Ok(PersonCategory::Visita),
    other => Err(Error::Decode(format!("unknown category: {other:?}"))),
  }
}

pub fn encode_state(s: EntryState) -> &'static str {
  match s {
    EntryState::Activo => "activo",
    EntryState::Cerrado => "cerrado",
  }
}

pub fn decode_state(s: &str) -> Result<EntryState> {
  match s {
    "activo" => Ok(EntryState::Activo),
    "cerrado" => Ok(EntryState::Cerrado),
    other => Err(Error::Decode(format!("unknown state: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEntry`] field order; keep the two in sync.
pub const ENTRY_COLUMNS: &str = "entry_id, document_number, document_kind, \
   pass_number, full_name, category, client, unit, state, entered_at, \
   exited_at, company, contact_person, reason, notes, exit_notes, \
   registered_by, closed_by";

/// Raw strings read directly from an `entries` row.
pub struct RawEntry {
  pub entry_id:        String,
  pub document_number: String,
  pub document_kind:   String,
  pub pass_number:     Option<String>,
  pub full_name:       String,
  pub category:        String,
  pub client:          String,
  pub unit:            String,
  pub state:           String,
  pub entered_at:      String,
  pub exited_at:       Option<String>,
  pub company:         Option<String>,
  pub contact_person:  Option<String>,
  pub reason:          Option<String>,
  pub notes:           Option<String>,
  pub exit_notes:      Option<String>,
  pub registered_by:   Option<String>,
  pub closed_by:       Option<String>,
}

/// Map a row selected with [`ENTRY_COLUMNS`] into a [`RawEntry`].
pub fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
  Ok(RawEntry {
    entry_id:        row.get(0)?,
    document_number: row.get(1)?,
    document_kind:   row.get(2)?,
    pass_number:     row.get(3)?,
    full_name:       row.get(4)?,
    category:        row.get(5)?,
    client:          row.get(6)?,
    unit:            row.get(7)?,
    state:           row.get(8)?,
    entered_at:      row.get(9)?,
    exited_at:       row.get(10)?,
    company:         row.get(11)?,
    contact_person:  row.get(12)?,
    reason:          row.get(13)?,
    notes:           row.get(14)?,
    exit_notes:      row.get(15)?,
    registered_by:   row.get(16)?,
    closed_by:       row.get(17)?,
  })
}

impl RawEntry {
  pub fn into_entry(self) -> Result<AccessEntry> {
    Ok(AccessEntry {
      entry_id:        decode_uuid(&self.entry_id)?,
      document_number: self.document_number,
      document_kind:   decode_document_kind(&self.document_kind)?,
      pass_number:     self.pass_number,
      full_name:       self.full_name,
      category:        decode_category(&self.category)?,
      scope:           Scope {
        client: self.client,
        unit:   self.unit,
      },
      state:           decode_state(&self.state)?,
      entered_at:      decode_dt(&self.entered_at)?,
      exited_at:       self.exited_at.as_deref().map(decode_dt).transpose()?,
      metadata:        EntryMetadata {
        company:        self.company,
        contact_person: self.contact_person,
        reason:         self.reason,
        notes:          self.notes,
        exit_notes:     self.exit_notes,
        registered_by:  self.registered_by,
        closed_by:      self.closed_by,
      },
    })
  }
}
