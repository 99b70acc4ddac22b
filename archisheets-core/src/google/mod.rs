//! Thin REST plumbing for the Google Sheets and Drive APIs.
//!
//! Every call takes the bearer token explicitly; the client only owns the
//! connection pool and the base URLs, so one instance can serve any number of
//! users and spreadsheets.

mod drive;
mod sheets;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub use sheets::{a1_range, Row, ValueRangeWrite};

/// Default Sheets API base URL.
pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
/// Default Drive API base URL.
pub const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";

/// Errors returned by the Google REST layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error during {operation}: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected response from {operation}: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },
}

impl ApiError {
    /// True when the target spreadsheet, tab or file does not exist.
    ///
    /// The Sheets API answers a read of a missing tab with
    /// `400 Unable to parse range`, so that counts as not-found too.
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Status {
                status: 404, ..
            } => true,
            ApiError::Status {
                status: 400,
                message,
                ..
            } => message.contains("Unable to parse range"),
            _ => false,
        }
    }

    /// True when the token was rejected (expired, revoked or missing scope).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Status {
                status: 401 | 403,
                ..
            }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Base URLs for the two APIs. Overridable for proxies and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub sheets: String,
    pub drive: String,
}

impl Endpoints {
    pub fn new(sheets: impl Into<String>, drive: impl Into<String>) -> Self {
        Self {
            sheets: sheets.into().trim_end_matches('/').to_string(),
            drive: drive.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(SHEETS_API_URL, DRIVE_API_URL)
    }
}

/// HTTP client for the Sheets and Drive REST APIs.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl GoogleClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Client whose requests fail after `timeout` instead of hanging.
    pub fn with_timeout(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Http {
                operation: "client setup",
                source,
            })?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn sheets_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.sheets, path)
    }

    fn drive_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.drive, path)
    }
}

impl Default for GoogleClient {
    fn default() -> Self {
        Self::new(Endpoints::default())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Send a request, mapping transport failures and non-2xx answers.
async fn send(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|source| ApiError::Http { operation, source })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(body);

    tracing::debug!("{} returned {}: {}", operation, status, message);
    Err(ApiError::Status {
        operation,
        status: status.as_u16(),
        message,
    })
}

/// Send a request and decode its JSON body.
async fn send_json<T: DeserializeOwned>(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, ApiError> {
    send(operation, request)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse {
            operation,
            reason: e.to_string(),
        })
}
