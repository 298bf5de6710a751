//! Document numbers — national DNI or alternate/foreign documents.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The class of identity document presented at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
  /// National identity document: exactly 8 numeric digits. Eligible for
  /// registry lookup.
  Dni,
  /// Carné de extranjería or other alternate document: free-form
  /// alphanumeric, never sent to the registry.
  Foreign,
}

/// A validated, normalised document number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub kind:   DocumentKind,
  pub number: String,
}

impl Document {
  /// Validate a DNI. Rejects anything that is not exactly 8 ASCII digits.
  pub fn dni(raw: &str) -> Result<Self> {
    let number = raw.trim().to_owned();
    if number.len() != 8 || !number.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidDocument(raw.to_owned()));
    }
    Ok(Self { kind: DocumentKind::Dni, number })
  }

  /// Validate an alternate document: non-empty alphanumeric, uppercased.
  pub fn foreign(raw: &str) -> Result<Self> {
    let number = raw.trim().to_uppercase();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_alphanumeric())
    {
      return Err(Error::InvalidDocument(raw.to_owned()));
    }
    Ok(Self { kind: DocumentKind::Foreign, number })
  }

  /// Parse according to `kind`.
  pub fn parse(kind: DocumentKind, raw: &str) -> Result<Self> {
    match kind {
      DocumentKind::Dni => Self::dni(raw),
      DocumentKind::Foreign => Self::foreign(raw),
    }
  }
}
