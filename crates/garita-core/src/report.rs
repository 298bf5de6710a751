//! Dashboard aggregation over a slice of ledger entries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entry::{AccessEntry, EntryState, PersonCategory};

/// Entries and exits attributed to one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
  pub date:    NaiveDate,
  pub entries: u32,
  pub exits:   u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
  pub contratista: u32,
  pub cliente:     u32,
  pub visita:      u32,
}

/// Aggregated view of a set of entries. Entries are attributed to the date
/// of `entered_at`, exits to the date of `exited_at`; an entry closed the
/// day after check-in counts under both dates.
#[derive(Debug, Clone, Serialize)]
pub struct AccessSummary {
  pub total_entries: u32,
  pub total_exits:   u32,
  pub daily:         Vec<DailyCount>,
  pub categories:    CategoryCounts,
}

pub fn summarize(entries: &[AccessEntry]) -> AccessSummary {
  let mut daily: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
  let mut categories = CategoryCounts::default();
  let mut total_exits = 0;

  for entry in entries {
    daily.entry(entry.entered_at.date_naive()).or_default().0 += 1;
    if entry.state == EntryState::Cerrado {
      total_exits += 1;
      if let Some(out) = entry.exited_at {
        daily.entry(out.date_naive()).or_default().1 += 1;
      }
    }
    match entry.category {
      PersonCategory::Contratista => categories.contratista += 1,
      PersonCategory::Cliente => categories.cliente += 1,
      PersonCategory::Visita => categories.visita += 1,
    }
  }

  AccessSummary {
    total_entries: entries.len() as u32,
    total_exits,
    daily: daily
      .into_iter()
      .map(|(date, (entries, exits))| DailyCount { date, entries, exits })
      .collect(),
    categories,
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{
    document::DocumentKind,
    entry::{EntryMetadata, Scope},
  };

  fn entry(
    day_in: u32,
    day_out: Option<u32>,
    category: PersonCategory,
  ) -> AccessEntry {
    AccessEntry {
      entry_id:        Uuid::new_v4(),
      document_number: "12345678".into(),
      document_kind:   DocumentKind::Dni,
      pass_number:     None,
      full_name:       "ANA PEREZ".into(),
      category,
      scope:           Scope::new("ClientX", "UnitY"),
      state:           if day_out.is_some() {
        EntryState::Cerrado
      } else {
        EntryState::Activo
      },
      entered_at:      Utc
        .with_ymd_and_hms(2026, 3, day_in, 8, 0, 0)
        .single()
        .unwrap(),
      exited_at:       day_out.map(|d| {
        Utc.with_ymd_and_hms(2026, 3, d, 17, 0, 0).single().unwrap()
      }),
      metadata:        EntryMetadata::default(),
    }
  }

  #[test]
  fn totals_and_categories() {
    let entries = vec![
      entry(1, Some(1), PersonCategory::Contratista),
      entry(1, None, PersonCategory::Visita),
      entry(2, Some(2), PersonCategory::Visita),
    ];
    let summary = summarize(&entries);
    assert_eq!(summary.total_entries, 3);
    assert_eq!(summary.total_exits, 2);
    assert_eq!(summary.categories.contratista, 1);
    assert_eq!(summary.categories.visita, 2);
    assert_eq!(summary.categories.cliente, 0);
  }

  #[test]
  fn overnight_entry_counts_under_both_dates() {
    let entries = vec![entry(1, Some(2), PersonCategory::Cliente)];
    let summary = summarize(&entries);
    assert_eq!(summary.daily.len(), 2);
    assert_eq!(summary.daily[0].entries, 1);
    assert_eq!(summary.daily[0].exits, 0);
    assert_eq!(summary.daily[1].entries, 0);
    assert_eq!(summary.daily[1].exits, 1);
  }

  #[test]
  fn daily_counts_sorted_by_date() {
    let entries = vec![
      entry(5, None, PersonCategory::Visita),
      entry(2, None, PersonCategory::Visita),
      entry(9, None, PersonCategory::Visita),
    ];
    let summary = summarize(&entries);
    let dates: Vec<_> = summary.daily.iter().map(|d| d.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
  }

  #[test]
  fn empty_slice_gives_zero_summary() {
    let summary = summarize(&[]);
    assert_eq!(summary.total_entries, 0);
    assert_eq!(summary.total_exits, 0);
    assert!(summary.daily.is_empty());
  }
}
