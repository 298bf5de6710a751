//! SQLite backend for the Garita access ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Ledger writes run inside
//! immediate transactions that re-derive their preconditions, so the
//! duplicate-entry and single-closure invariants hold under concurrency.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
