//! [`ReniecClient`] — registry lookups over the DeColecta HTTP API.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use garita_core::resolver::{RegistryClient, RegistryError, RegistryPerson};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Registry connection settings. The bearer token always comes from
/// configuration; there is no built-in default credential.
#[derive(Debug, Clone, Deserialize)]
pub struct ReniecConfig {
  pub base_url: String,
  pub token:    String,
  /// Per-request deadline covering connect, send, and read.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 10 }

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReniecClient {
  http:   reqwest::Client,
  config: ReniecConfig,
}

impl ReniecClient {
  pub fn new(config: ReniecConfig) -> Result<Self, RegistryError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| RegistryError::Network(e.to_string()))?;
    Ok(Self { http, config })
  }

  fn lookup_url(&self, dni: &str) -> String {
    format!(
      "{}/v1/reniec/dni?numero={}",
      self.config.base_url.trim_end_matches('/'),
      dni
    )
  }
}

fn classify_status(status: reqwest::StatusCode) -> RegistryError {
  match status.as_u16() {
    404 | 422 => RegistryError::NotFound,
    401 | 403 => RegistryError::Auth,
    other => RegistryError::Status(other),
  }
}

fn classify_transport(e: reqwest::Error) -> RegistryError {
  if e.is_timeout() {
    RegistryError::Timeout
  } else {
    RegistryError::Network(e.to_string())
  }
}

impl RegistryClient for ReniecClient {
  async fn lookup(&self, dni: &str) -> Result<RegistryPerson, RegistryError> {
    let url = self.lookup_url(dni);
    tracing::debug!(%url, "registry lookup");

    let response = self
      .http
      .get(&url)
      .bearer_auth(&self.config.token)
      .send()
      .await
      .map_err(classify_transport)?;

    let status = response.status();
    if !status.is_success() {
      return Err(classify_status(status));
    }

    let body: LookupResponse = response
      .json()
      .await
      .map_err(|e| RegistryError::Parse(e.to_string()))?;

    body
      .data
      .ok_or_else(|| {
        RegistryError::Parse("response missing data object".into())
      })?
      .into_person()
  }
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LookupResponse {
  data: Option<DniPayload>,
}

/// Person record as the API ships it. Every field is optional on the wire;
/// [`DniPayload::into_person`] enforces what we actually need.
#[derive(Debug, Default, Deserialize)]
struct DniPayload {
  #[serde(default)]
  nombres:          Option<String>,
  #[serde(default)]
  apellido_paterno: Option<String>,
  #[serde(default)]
  apellido_materno: Option<String>,
  #[serde(default)]
  fecha_nacimiento: Option<NaiveDate>,
  #[serde(default)]
  genero:           Option<String>,
  #[serde(default)]
  estado_civil:     Option<String>,
  #[serde(default)]
  nacionalidad:     Option<String>,
}

fn required(
  value: Option<String>,
  field: &str,
) -> Result<String, RegistryError> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
    .ok_or_else(|| RegistryError::Parse(format!("missing field: {field}")))
}

impl DniPayload {
  fn into_person(self) -> Result<RegistryPerson, RegistryError> {
    Ok(RegistryPerson {
      first_name:       required(self.nombres, "nombres")?,
      first_last_name:  required(self.apellido_paterno, "apellido_paterno")?,
      second_last_name: self
        .apellido_materno
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty()),
      date_of_birth:    self.fecha_nacimiento,
      gender:           self.genero,
      marital_status:   self.estado_civil,
      nationality:      self.nacionalidad,
    })
  }
}
