//! Integration tests for `SqliteStore` against an in-memory database.

use std::{
  future::Future,
  sync::atomic::{AtomicUsize, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

use garita_core::{
  document::{Document, DocumentKind},
  entry::{
    EntryMetadata, EntryState, NewEntry, PersonCategory, Scope,
    SessionContext,
  },
  guard::{self, GuardOutcome},
  ledger::{self, EntryDraft, NO_COMMENTS},
  resolver::{
    self, NameSource, RegistryClient, RegistryError, RegistryPerson,
  },
  session,
  store::{
    AccessStore, ActiveFilter, EntryEvent, EntryQuery, IdentMatch,
  },
  Error as CoreError,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn scope() -> Scope { Scope::new("ClientX", "UnitY") }

fn ctx() -> SessionContext { SessionContext::new(scope(), "vigilante1") }

fn new_entry(document: &str, pass: Option<&str>) -> NewEntry {
  NewEntry {
    document_number: document.into(),
    document_kind:   DocumentKind::Dni,
    pass_number:     pass.map(Into::into),
    full_name:       "ANA PEREZ".into(),
    category:        PersonCategory::Visita,
    scope:           scope(),
    metadata:        EntryMetadata::default(),
  }
}

// ─── Ledger writes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_entry() {
  let s = store().await;

  let entry = s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();
  assert_eq!(entry.state, EntryState::Activo);
  assert!(entry.exited_at.is_none());

  let fetched = s.get_entry(entry.entry_id).await.unwrap().unwrap();
  assert_eq!(fetched.entry_id, entry.entry_id);
  assert_eq!(fetched.document_number, "12345678");
  assert_eq!(fetched.pass_number.as_deref(), Some("P-01"));
  assert_eq!(fetched.scope, scope());
}

#[tokio::test]
async fn get_entry_missing_returns_none() {
  let s = store().await;
  assert!(s.get_entry(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn insert_rejects_active_document_duplicate() {
  let s = store().await;
  let first = s.insert_entry(new_entry("12345678", None)).await.unwrap();

  let err = s.insert_entry(new_entry("12345678", None)).await.unwrap_err();
  match err {
    crate::Error::Core(CoreError::DocumentConflict(existing)) => {
      assert_eq!(existing.entry_id, first.entry_id);
    }
    other => panic!("expected document conflict, got {other:?}"),
  }
}

#[tokio::test]
async fn insert_rejects_active_pass_duplicate() {
  let s = store().await;
  let first = s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();

  let err = s
    .insert_entry(new_entry("87654321", Some("P-01")))
    .await
    .unwrap_err();
  match err {
    crate::Error::Core(CoreError::PassConflict(existing)) => {
      assert_eq!(existing.entry_id, first.entry_id);
    }
    other => panic!("expected pass conflict, got {other:?}"),
  }
}

#[tokio::test]
async fn document_conflict_takes_precedence_over_pass_conflict() {
  let s = store().await;
  s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();

  // Same document AND same pass: the document conflict is reported.
  let err = s
    .insert_entry(new_entry("12345678", Some("P-01")))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(CoreError::DocumentConflict(_))
  ));
}

#[tokio::test]
async fn same_document_in_other_scope_is_no_conflict() {
  let s = store().await;
  s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();

  let mut other = new_entry("12345678", Some("P-01"));
  other.scope = Scope::new("ClientX", "UnitZ");
  s.insert_entry(other).await.unwrap();
}

#[tokio::test]
async fn closed_entry_frees_document_and_pass() {
  let s = store().await;
  let first = s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();
  s.close_entry(first.entry_id, NO_COMMENTS.into(), "vigilante1".into())
    .await
    .unwrap();

  // Re-entry with the same identifiers is clear again.
  s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();
}

#[tokio::test]
async fn close_stamps_exit_fields_and_preserves_entry_timestamp() {
  let s = store().await;
  let entry = s.insert_entry(new_entry("12345678", None)).await.unwrap();

  let closed = s
    .close_entry(entry.entry_id, "salió temprano".into(), "vigilante2".into())
    .await
    .unwrap();

  assert_eq!(closed.state, EntryState::Cerrado);
  assert_eq!(closed.entered_at, entry.entered_at);
  let exited = closed.exited_at.unwrap();
  assert!(exited >= closed.entered_at);
  assert!(exited <= Utc::now());
  assert_eq!(closed.metadata.exit_notes.as_deref(), Some("salió temprano"));
  assert_eq!(closed.metadata.closed_by.as_deref(), Some("vigilante2"));
}

#[tokio::test]
async fn close_twice_is_an_error() {
  let s = store().await;
  let entry = s.insert_entry(new_entry("12345678", None)).await.unwrap();
  s.close_entry(entry.entry_id, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap();

  let err = s
    .close_entry(entry.entry_id, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(CoreError::AlreadyClosed(id)) if id == entry.entry_id
  ));
}

#[tokio::test]
async fn close_unknown_entry_is_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .close_entry(missing, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(CoreError::EntryNotFound(id)) if id == missing
  ));
}

#[tokio::test]
async fn concurrent_inserts_admit_exactly_one() {
  let s = store().await;

  let (a, b) = tokio::join!(
    s.insert_entry(new_entry("12345678", None)),
    s.insert_entry(new_entry("12345678", None)),
  );

  assert!(
    a.is_ok() != b.is_ok(),
    "exactly one concurrent insert must win: {a:?} / {b:?}"
  );
  let active = s
    .find_active(ActiveFilter {
      scope: scope(),
      ident: IdentMatch::Document("12345678".into()),
    })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_active_matches_either_identifier() {
  let s = store().await;
  let entry = s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();

  let by_doc = s
    .find_active(ActiveFilter {
      scope: scope(),
      ident: IdentMatch::Either {
        document: Some("12345678".into()),
        pass:     None,
      },
    })
    .await
    .unwrap();
  assert_eq!(by_doc[0].entry_id, entry.entry_id);

  let by_pass = s
    .find_active(ActiveFilter {
      scope: scope(),
      ident: IdentMatch::Either {
        document: None,
        pass:     Some("P-01".into()),
      },
    })
    .await
    .unwrap();
  assert_eq!(by_pass[0].entry_id, entry.entry_id);
}

#[tokio::test]
async fn find_active_ignores_closed_entries() {
  let s = store().await;
  let entry = s.insert_entry(new_entry("12345678", None)).await.unwrap();
  s.close_entry(entry.entry_id, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap();

  let active = s
    .find_active(ActiveFilter {
      scope: scope(),
      ident: IdentMatch::Document("12345678".into()),
    })
    .await
    .unwrap();
  assert!(active.is_empty());
}

#[tokio::test]
async fn query_entries_orders_newest_first_and_limits() {
  let s = store().await;
  for (doc, _) in [("11111111", 0), ("22222222", 1), ("33333333", 2)] {
    s.insert_entry(new_entry(doc, None)).await.unwrap();
  }

  let all = s.query_entries(EntryQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].entered_at >= w[1].entered_at));

  let limited = s
    .query_entries(EntryQuery {
      limit: Some(2),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(limited.len(), 2);
  assert_eq!(limited[0].document_number, "33333333");
}

#[tokio::test]
async fn query_entries_filters_by_document_state_and_range() {
  let s = store().await;
  let before_all = Utc::now();
  let first = s.insert_entry(new_entry("11111111", None)).await.unwrap();
  s.insert_entry(new_entry("22222222", None)).await.unwrap();
  s.close_entry(first.entry_id, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap();

  let by_doc = s
    .query_entries(EntryQuery {
      document: Some("11111111".into()),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(by_doc.len(), 1);

  let closed = s
    .query_entries(EntryQuery {
      state: Some(EntryState::Cerrado),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(closed.len(), 1);
  assert_eq!(closed[0].document_number, "11111111");

  let in_range = s
    .query_entries(EntryQuery {
      entered_after: Some(before_all),
      entered_before: Some(Utc::now()),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(in_range.len(), 2);

  let none = s
    .query_entries(EntryQuery {
      entered_before: Some(before_all),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn query_entries_scoped() {
  let s = store().await;
  s.insert_entry(new_entry("11111111", None)).await.unwrap();
  let mut other = new_entry("22222222", None);
  other.scope = Scope::new("ClientZ", "UnitQ");
  s.insert_entry(other).await.unwrap();

  let scoped = s
    .query_entries(EntryQuery {
      scope: Some(scope()),
      ..EntryQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(scoped.len(), 1);
  assert_eq!(scoped[0].document_number, "11111111");
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subscribe_sees_entered_and_closed_events() {
  let s = store().await;
  let mut rx = s.subscribe();

  let entry = s.insert_entry(new_entry("12345678", None)).await.unwrap();
  s.close_entry(entry.entry_id, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap();

  match rx.recv().await.unwrap() {
    EntryEvent::Entered(e) => assert_eq!(e.entry_id, entry.entry_id),
    other => panic!("expected Entered, got {other:?}"),
  }
  match rx.recv().await.unwrap() {
    EntryEvent::Closed(e) => {
      assert_eq!(e.entry_id, entry.entry_id);
      assert_eq!(e.state, EntryState::Cerrado);
    }
    other => panic!("expected Closed, got {other:?}"),
  }
}

#[tokio::test]
async fn rejected_insert_emits_no_event() {
  let s = store().await;
  s.insert_entry(new_entry("12345678", None)).await.unwrap();

  let mut rx = s.subscribe();
  let _ = s.insert_entry(new_entry("12345678", None)).await;

  assert!(matches!(
    rx.try_recv(),
    Err(tokio::sync::broadcast::error::TryRecvError::Empty)
  ));
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_client_preserves_unit_order() {
  let s = store().await;
  let units = vec!["TORRE B".to_owned(), "TORRE A".to_owned(), "ANEXO".to_owned()];
  s.put_client("CLIENTX".into(), units.clone()).await.unwrap();

  let fetched = s.client_units("CLIENTX".into()).await.unwrap().unwrap();
  assert_eq!(fetched, units);
}

#[tokio::test]
async fn put_client_replaces_unit_list() {
  let s = store().await;
  s.put_client("CLIENTX".into(), vec!["OLD".into()]).await.unwrap();
  s.put_client("CLIENTX".into(), vec!["NEW1".into(), "NEW2".into()])
    .await
    .unwrap();

  let fetched = s.client_units("CLIENTX".into()).await.unwrap().unwrap();
  assert_eq!(fetched, vec!["NEW1".to_owned(), "NEW2".to_owned()]);
  assert_eq!(s.list_clients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_client_yields_none() {
  let s = store().await;
  assert!(s.client_units("NOBODY".into()).await.unwrap().is_none());
}

// ─── Core operations over the real store ─────────────────────────────────────

#[tokio::test]
async fn guard_reports_conflicts_without_writing() {
  let s = store().await;
  let entry = s.insert_entry(new_entry("12345678", Some("P-01"))).await.unwrap();

  let outcome = guard::check(&s, "12345678", None, &scope()).await.unwrap();
  match outcome {
    GuardOutcome::DocumentConflict(existing) => {
      assert_eq!(existing.entry_id, entry.entry_id);
    }
    other => panic!("expected document conflict, got {other:?}"),
  }

  let outcome = guard::check(&s, "99999999", Some("p-01"), &scope())
    .await
    .unwrap();
  assert!(matches!(outcome, GuardOutcome::PassConflict(_)));

  let outcome = guard::check(&s, "99999999", Some("P-99"), &scope())
    .await
    .unwrap();
  assert!(outcome.is_clear());
}

#[tokio::test]
async fn session_matcher_finds_most_recent_open_entry() {
  let s = store().await;
  s.insert_entry(new_entry("11111111", Some("P-01"))).await.unwrap();
  let newer = s.insert_entry(new_entry("22222222", Some("P-02"))).await.unwrap();

  // Both identifiers given, each pointing at a different entry: the most
  // recent check-in wins.
  let found = session::find_open(&s, Some("11111111"), Some("P-02"), &scope())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.entry_id, newer.entry_id);

  let by_pass = session::find_open(&s, None, Some("p-01"), &scope())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_pass.document_number, "11111111");

  assert!(session::find_open(&s, Some("99999999"), None, &scope())
    .await
    .unwrap()
    .is_none());

  assert!(matches!(
    session::find_open(&s, Some("  "), None, &scope()).await,
    Err(CoreError::MissingIdentifier)
  ));
}

#[tokio::test]
async fn ledger_create_normalises_draft_fields() {
  let s = store().await;

  let entry = ledger::create(&s, &ctx(), EntryDraft {
    document:       Document::dni("12345678").unwrap(),
    pass_number:    Some(" p-07 ".into()),
    full_name:      "  ana maría pérez ".into(),
    category:       PersonCategory::Contratista,
    company:        Some("constructora sur".into()),
    contact_person: Some("  ".into()),
    reason:         Some("mantenimiento".into()),
    notes:          None,
  })
  .await
  .unwrap();

  assert_eq!(entry.full_name, "ANA MARÍA PÉREZ");
  assert_eq!(entry.pass_number.as_deref(), Some("P-07"));
  assert_eq!(entry.metadata.company.as_deref(), Some("CONSTRUCTORA SUR"));
  assert_eq!(entry.metadata.contact_person, None);
  assert_eq!(entry.metadata.reason.as_deref(), Some("MANTENIMIENTO"));
  assert_eq!(entry.metadata.registered_by.as_deref(), Some("vigilante1"));
}

#[tokio::test]
async fn ledger_close_defaults_blank_notes_and_keeps_casing() {
  let s = store().await;
  let entry = s.insert_entry(new_entry("12345678", None)).await.unwrap();

  let closed = ledger::close(&s, &ctx(), entry.entry_id, Some("  ".into()))
    .await
    .unwrap();
  assert_eq!(closed.metadata.exit_notes.as_deref(), Some(NO_COMMENTS));

  let entry2 = s.insert_entry(new_entry("87654321", None)).await.unwrap();
  let closed2 = ledger::close(
    &s,
    &ctx(),
    entry2.entry_id,
    Some(" Dejó herramientas adentro ".into()),
  )
  .await
  .unwrap();
  assert_eq!(
    closed2.metadata.exit_notes.as_deref(),
    Some("Dejó herramientas adentro")
  );
}

// ─── Resolver over the real store ────────────────────────────────────────────

struct FakeRegistry {
  calls: AtomicUsize,
}

impl FakeRegistry {
  fn new() -> Self {
    Self { calls: AtomicUsize::new(0) }
  }

  fn call_count(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl RegistryClient for FakeRegistry {
  fn lookup<'a>(
    &'a self,
    dni: &'a str,
  ) -> impl Future<Output = Result<RegistryPerson, RegistryError>> + Send + 'a
  {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let known = dni == "12345678";
    async move {
      if known {
        Ok(RegistryPerson {
          first_name:       "MARIA".into(),
          first_last_name:  "QUISPE".into(),
          second_last_name: Some("HUAMAN".into()),
          date_of_birth:    None,
          gender:           None,
          marital_status:   None,
          nationality:      None,
        })
      } else {
        Err(RegistryError::NotFound)
      }
    }
  }
}

#[tokio::test]
async fn resolver_prefers_cache_over_registry() {
  let s = store().await;
  let registry = FakeRegistry::new();
  let doc = Document::dni("12345678").unwrap();

  let first = resolver::resolve(&s, &registry, &doc).await.unwrap();
  assert_eq!(first.source, NameSource::Registry);
  assert_eq!(first.full_name, "MARIA QUISPE HUAMAN");
  assert_eq!(registry.call_count(), 1);

  // An entry now exists for the DNI; the next resolve hits the cache.
  let mut entry = new_entry("12345678", None);
  entry.full_name = first.full_name.clone();
  let inserted = s.insert_entry(entry).await.unwrap();
  s.close_entry(inserted.entry_id, NO_COMMENTS.into(), "v".into())
    .await
    .unwrap();

  let second = resolver::resolve(&s, &registry, &doc).await.unwrap();
  assert_eq!(second.source, NameSource::Cache);
  assert_eq!(second.full_name, "MARIA QUISPE HUAMAN");
  assert_eq!(registry.call_count(), 1);
}

#[tokio::test]
async fn resolver_maps_registry_miss_to_person_not_found() {
  let s = store().await;
  let registry = FakeRegistry::new();
  let doc = Document::dni("99999999").unwrap();

  assert!(matches!(
    resolver::resolve(&s, &registry, &doc).await,
    Err(CoreError::PersonNotFound(n)) if n == "99999999"
  ));
}

#[tokio::test]
async fn resolver_requires_manual_name_for_foreign_documents() {
  let s = store().await;
  let registry = FakeRegistry::new();
  let doc = Document::foreign("CE123").unwrap();

  assert!(matches!(
    resolver::resolve(&s, &registry, &doc).await,
    Err(CoreError::ManualNameRequired)
  ));
  assert_eq!(registry.call_count(), 0);
}
