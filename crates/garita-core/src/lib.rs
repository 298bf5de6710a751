//! Core types and trait definitions for the Garita access register.
//!
//! This crate is deliberately free of HTTP and database dependencies; the
//! store and registry are traits implemented by the sibling crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod document;
pub mod entry;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod report;
pub mod resolver;
pub mod session;
pub mod store;

pub use error::{Error, Result};
