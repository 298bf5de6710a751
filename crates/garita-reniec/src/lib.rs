//! HTTP client for the national identity registry (RENIEC, via the DeColecta
//! API). Implements [`garita_core::resolver::RegistryClient`].

mod client;

pub use client::{ReniecClient, ReniecConfig};
