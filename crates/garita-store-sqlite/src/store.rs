//! [`SqliteStore`] — the SQLite implementation of [`AccessStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tokio::sync::broadcast;
use uuid::Uuid;

use garita_core::{
  entry::{AccessEntry, EntryState, NewEntry},
  store::{AccessStore, ActiveFilter, EntryEvent, EntryQuery, IdentMatch},
  Error as CoreError,
};

use crate::{
  encode::{
    encode_category, encode_document_kind, encode_dt, encode_state,
    encode_uuid, now_micros, row_to_raw, RawEntry, ENTRY_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_QUERY_LIMIT: u32 = 100;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Garita access ledger backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted and clones
/// share one event channel.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  events: broadcast::Sender<EntryEvent>,
}

/// Outcome of the conditional insert, decided inside the transaction.
enum InsertOutcome {
  Inserted,
  DocConflict(RawEntry),
  PassConflict(RawEntry),
}

/// Outcome of the conditional closure, decided inside the transaction.
enum CloseOutcome {
  Closed(RawEntry),
  NotFound,
  AlreadyClosed,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_conn(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_conn(conn).await
  }

  async fn with_conn(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let store = Self { conn, events };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn publish(&self, event: EntryEvent) {
    // No subscribers is fine; the event is simply dropped.
    let _ = self.events.send(event);
  }
}

// ─── AccessStore impl ────────────────────────────────────────────────────────

impl AccessStore for SqliteStore {
  type Error = Error;

  async fn insert_entry(&self, new: NewEntry) -> Result<AccessEntry> {
    let entry = AccessEntry {
      entry_id:        Uuid::new_v4(),
      document_number: new.document_number,
      document_kind:   new.document_kind,
      pass_number:     new.pass_number,
      full_name:       new.full_name,
      category:        new.category,
      scope:           new.scope,
      state:           EntryState::Activo,
      entered_at:      now_micros(),
      exited_at:       None,
      metadata:        new.metadata,
    };

    let row = (
      encode_uuid(entry.entry_id),
      entry.document_number.clone(),
      encode_document_kind(entry.document_kind).to_owned(),
      entry.pass_number.clone(),
      entry.full_name.clone(),
      encode_category(entry.category).to_owned(),
      entry.scope.client.clone(),
      entry.scope.unit.clone(),
      encode_state(entry.state).to_owned(),
      encode_dt(entry.entered_at),
      entry.metadata.clone(),
    );

    let outcome: InsertOutcome = self
      .conn
      .call(move |conn| {
        let (
          id_str,
          document,
          kind_str,
          pass,
          full_name,
          category_str,
          client,
          unit,
          state_str,
          entered_str,
          metadata,
        ) = row;

        // Immediate transaction: takes the write lock up front, so the
        // conflict probes and the insert see one consistent snapshot.
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let doc_sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM entries
           WHERE client = ?1 AND unit = ?2 AND state = 'activo'
             AND document_number = ?3
           ORDER BY entered_at DESC LIMIT 1"
        );
        let existing: Option<RawEntry> = tx
          .query_row(
            &doc_sql,
            rusqlite::params![client, unit, document],
            row_to_raw,
          )
          .optional()?;
        if let Some(raw) = existing {
          return Ok(InsertOutcome::DocConflict(raw));
        }

        if let Some(p) = &pass {
          let pass_sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries
             WHERE client = ?1 AND unit = ?2 AND state = 'activo'
               AND pass_number = ?3
             ORDER BY entered_at DESC LIMIT 1"
          );
          let existing: Option<RawEntry> = tx
            .query_row(
              &pass_sql,
              rusqlite::params![client, unit, p],
              row_to_raw,
            )
            .optional()?;
          if let Some(raw) = existing {
            return Ok(InsertOutcome::PassConflict(raw));
          }
        }

        tx.execute(
          "INSERT INTO entries (
             entry_id, document_number, document_kind, pass_number,
             full_name, category, client, unit, state, entered_at,
             exited_at, company, contact_person, reason, notes,
             exit_notes, registered_by, closed_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     NULL, ?11, ?12, ?13, ?14, NULL, ?15, NULL)",
          rusqlite::params![
            id_str,
            document,
            kind_str,
            pass,
            full_name,
            category_str,
            client,
            unit,
            state_str,
            entered_str,
            metadata.company,
            metadata.contact_person,
            metadata.reason,
            metadata.notes,
            metadata.registered_by,
          ],
        )?;
        tx.commit()?;

        Ok(InsertOutcome::Inserted)
      })
      .await?;

    match outcome {
      InsertOutcome::Inserted => {
        self.publish(EntryEvent::Entered(entry.clone()));
        Ok(entry)
      }
      InsertOutcome::DocConflict(raw) => Err(Error::Core(
        CoreError::DocumentConflict(Box::new(raw.into_entry()?)),
      )),
      InsertOutcome::PassConflict(raw) => Err(Error::Core(
        CoreError::PassConflict(Box::new(raw.into_entry()?)),
      )),
    }
  }

  async fn get_entry(&self, entry_id: Uuid) -> Result<Option<AccessEntry>> {
    let id_str = encode_uuid(entry_id);

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE entry_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], row_to_raw)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn close_entry(
    &self,
    entry_id: Uuid,
    exit_notes: String,
    closed_by: String,
  ) -> Result<AccessEntry> {
    let id_str = encode_uuid(entry_id);
    let exited_str = encode_dt(now_micros());

    let outcome: CloseOutcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let state: Option<String> = tx
          .query_row(
            "SELECT state FROM entries WHERE entry_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        match state.as_deref() {
          None => return Ok(CloseOutcome::NotFound),
          Some("cerrado") => return Ok(CloseOutcome::AlreadyClosed),
          Some(_) => {}
        }

        tx.execute(
          "UPDATE entries
           SET state = 'cerrado', exited_at = ?2, exit_notes = ?3,
               closed_by = ?4
           WHERE entry_id = ?1 AND state = 'activo'",
          rusqlite::params![id_str, exited_str, exit_notes, closed_by],
        )?;

        let sql =
          format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE entry_id = ?1");
        let raw =
          tx.query_row(&sql, rusqlite::params![id_str], row_to_raw)?;
        tx.commit()?;

        Ok(CloseOutcome::Closed(raw))
      })
      .await?;

    match outcome {
      CloseOutcome::Closed(raw) => {
        let entry = raw.into_entry()?;
        self.publish(EntryEvent::Closed(entry.clone()));
        Ok(entry)
      }
      CloseOutcome::NotFound => {
        Err(Error::Core(CoreError::EntryNotFound(entry_id)))
      }
      CloseOutcome::AlreadyClosed => {
        Err(Error::Core(CoreError::AlreadyClosed(entry_id)))
      }
    }
  }

  async fn find_active(&self, filter: ActiveFilter) -> Result<Vec<AccessEntry>> {
    let client = filter.scope.client;
    let unit = filter.scope.unit;
    let ident = filter.ident;

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        // Every matcher reduces to the two-sided OR: a NULL side never
        // matches, since `col = NULL` is not true in SQL.
        let (doc, pass): (Option<String>, Option<String>) = match ident {
          IdentMatch::Document(d) => (Some(d), None),
          IdentMatch::Pass(p) => (None, Some(p)),
          IdentMatch::Either { document, pass } => (document, pass),
        };

        let sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM entries
           WHERE client = ?1 AND unit = ?2 AND state = 'activo'
             AND (document_number = ?3 OR pass_number = ?4)
           ORDER BY entered_at DESC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![client, unit, doc, pass], row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn query_entries(&self, query: EntryQuery) -> Result<Vec<AccessEntry>> {
    let scope = query.scope;
    let document = query.document;
    let state = query.state.map(|s| encode_state(s).to_owned());
    let after = query.entered_after.map(encode_dt);
    let before = query.entered_before.map(encode_dt);
    let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        // Conditions and parameters are pushed in lockstep, so bare `?`
        // placeholders bind in order.
        let mut conds: Vec<&'static str> = vec![];
        let mut params: Vec<String> = vec![];

        if let Some(scope) = scope {
          conds.push("client = ?");
          params.push(scope.client);
          conds.push("unit = ?");
          params.push(scope.unit);
        }
        if let Some(document) = document {
          conds.push("document_number = ?");
          params.push(document);
        }
        if let Some(state) = state {
          conds.push("state = ?");
          params.push(state);
        }
        if let Some(after) = after {
          conds.push("entered_at >= ?");
          params.push(after);
        }
        if let Some(before) = before {
          conds.push("entered_at <= ?");
          params.push(before);
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM entries
           {where_clause}
           ORDER BY entered_at DESC
           LIMIT {limit}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), row_to_raw)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  fn subscribe(&self) -> broadcast::Receiver<EntryEvent> {
    self.events.subscribe()
  }

  // ── Directory ─────────────────────────────────────────────────────────────

  async fn put_client(&self, name: String, units: Vec<String>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT OR IGNORE INTO clients (client_name) VALUES (?1)",
          rusqlite::params![name],
        )?;
        tx.execute(
          "DELETE FROM client_units WHERE client_name = ?1",
          rusqlite::params![name],
        )?;
        for (position, unit) in units.iter().enumerate() {
          tx.execute(
            "INSERT INTO client_units (client_name, position, unit_name)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![name, position as i64, unit],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn client_units(&self, name: String) -> Result<Option<Vec<String>>> {
    let units: Option<Vec<String>> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM clients WHERE client_name = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let mut stmt = conn.prepare(
          "SELECT unit_name FROM client_units
           WHERE client_name = ?1 ORDER BY position",
        )?;
        let units = stmt
          .query_map(rusqlite::params![name], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Some(units))
      })
      .await?;
    Ok(units)
  }

  async fn list_clients(&self) -> Result<Vec<String>> {
    let names: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT client_name FROM clients ORDER BY client_name")?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }
}
