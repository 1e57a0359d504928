//! `reqwest` client for the ledger's cash-register endpoints.
//!
//! Paths are relative to the configured base URL (by default
//! `http://localhost:8000/api/caja`). Failed responses are turned into errors carrying
//! the message the ledger put in its body, so the operator sees "No hay ninguna caja
//! abierta" rather than a bare status code.

use super::Ledger;
use crate::{
    config::LedgerSettings,
    core::{movement::NewMovement, reconcile::CloseRequest},
    entities::{Movement, Shift},
    errors::{Error, Result},
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

/// Body fields checked, in order, for a human-readable error message.
const ERROR_MESSAGE_FIELDS: [&str; 4] = ["error", "mensaje", "message", "detail"];

#[derive(Deserialize)]
struct ActiveShiftResponse {
    existe: bool,
    #[serde(default)]
    turno: Option<Shift>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MovementListing {
    Plain(Vec<Movement>),
    Paginated { results: Vec<Movement> },
}

#[derive(Deserialize)]
struct ClosedShiftResponse {
    turno: Shift,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    turnos: Vec<Shift>,
}

#[derive(Serialize)]
struct OpenShiftRequest {
    monto_apertura: Decimal,
}

/// HTTP client for the ledger API.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl LedgerClient {
    /// Builds a client from ledger settings.
    ///
    /// # Errors
    /// [`Error::Http`] if the underlying HTTP client cannot be constructed.
    pub fn new(settings: &LedgerSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
        })
    }

    /// Base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Sending ledger request: {method} {url}");

        let builder = self.http.request(method, url);
        match &self.api_token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Token {token}")),
            None => builder,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json().await?)
    }
}

impl Ledger for LedgerClient {
    async fn active_shift(&self) -> Result<Option<Shift>> {
        let response: ActiveShiftResponse = self
            .fetch(self.request(Method::GET, "turnos/turno_activo/"))
            .await?;

        if response.existe && response.turno.is_none() {
            warn!("Ledger reported an active shift without including it");
        }
        Ok(response.turno.filter(|_| response.existe))
    }

    async fn open_shift(&self, opening_amount: Decimal) -> Result<Shift> {
        let body = OpenShiftRequest {
            monto_apertura: opening_amount,
        };
        self.fetch(self.request(Method::POST, "turnos/").json(&body))
            .await
    }

    async fn list_movements(&self) -> Result<Vec<Movement>> {
        let listing: MovementListing = self
            .fetch(self.request(Method::GET, "movimientos/"))
            .await?;
        Ok(match listing {
            MovementListing::Plain(movements)
            | MovementListing::Paginated { results: movements } => movements,
        })
    }

    async fn create_movement(&self, movement: &NewMovement) -> Result<Movement> {
        self.fetch(self.request(Method::POST, "movimientos/").json(movement))
            .await
    }

    async fn update_movement(&self, id: i64, movement: &NewMovement) -> Result<Movement> {
        self.fetch(
            self.request(Method::PUT, &format!("movimientos/{id}/"))
                .json(movement),
        )
        .await
    }

    async fn delete_movement(&self, id: i64) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("movimientos/{id}/"));
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn close_shift(&self, shift_id: i64, request: &CloseRequest) -> Result<Shift> {
        let response: ClosedShiftResponse = self
            .fetch(
                self.request(Method::POST, &format!("turnos/{shift_id}/cerrar/"))
                    .json(request),
            )
            .await?;
        Ok(response.turno)
    }

    async fn shift_history(&self) -> Result<Vec<Shift>> {
        let response: HistoryResponse = self
            .fetch(self.request(Method::GET, "turnos/historial/"))
            .await?;
        Ok(response.turnos)
    }
}

/// Passes successful responses through and turns the rest into errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
    warn!(status = status.as_u16(), %message, "Ledger request failed");

    if status == StatusCode::CONFLICT {
        Err(Error::Conflict { message })
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pulls a readable message out of an error body.
///
/// Looks at `error`, `mensaje`, `message` and `detail`, in that order. A field holding a
/// list (as field validation errors do) yields its first string.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ERROR_MESSAGE_FIELDS.iter().find_map(|field| {
        let text = match value.get(field)? {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Array(items) => items.iter().find_map(serde_json::Value::as_str),
            _ => None,
        }?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}
