use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::marketplace::MarketError;
use crate::orchestrator::{AuthError, OrchestratorError};
use crate::pickup::PickupError;
use crate::store::StoreError;
use crate::telemetry::TelemetryError;

/// Application-level error surfaced at the HTTP boundary.
///
/// Validation failures map to 422, legitimate state conflicts (lost races,
/// refused transitions, exhausted balances) to 409, scoping misses to 404,
/// and infrastructure failures to 500.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Auth(AuthError),
    Pickup(PickupError),
    Market(MarketError),
    Ledger(LedgerError),
    Orchestrator(OrchestratorError),
    Store(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Auth(err) => write!(f, "{}", err),
            AppError::Pickup(err) => write!(f, "{}", err),
            AppError::Market(err) => write!(f, "{}", err),
            AppError::Ledger(err) => write!(f, "{}", err),
            AppError::Orchestrator(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Pickup(err) => Some(err),
            AppError::Market(err) => Some(err),
            AppError::Ledger(err) => Some(err),
            AppError::Orchestrator(err) => Some(err),
            AppError::Store(err) => Some(err),
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict | StoreError::VersionConflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::SignMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::InsufficientBalance { .. } => StatusCode::CONFLICT,
        LedgerError::Store(inner) => store_status(inner),
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Pickup(err) => match err {
                PickupError::EmptyItemList
                | PickupError::InvalidCategory(_)
                | PickupError::MissingReason
                | PickupError::MissingWeight(_)
                | PickupError::UnknownItem(_)
                | PickupError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PickupError::InvalidTransition { .. } => StatusCode::CONFLICT,
                PickupError::NotFound => StatusCode::NOT_FOUND,
                PickupError::Ledger(inner) => ledger_status(inner),
                PickupError::Store(inner) => store_status(inner),
            },
            AppError::Market(err) => match err {
                MarketError::MissingReason | MarketError::Pricing(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                MarketError::InsufficientQuantity { .. }
                | MarketError::ListingUnavailable
                | MarketError::InvalidTransition { .. } => StatusCode::CONFLICT,
                MarketError::NotFound => StatusCode::NOT_FOUND,
                MarketError::Ledger(inner) => ledger_status(inner),
                MarketError::Store(inner) => store_status(inner),
            },
            AppError::Ledger(err) => ledger_status(err),
            AppError::Orchestrator(err) => match err {
                OrchestratorError::UnknownReward(_) => StatusCode::NOT_FOUND,
                OrchestratorError::Ledger(inner) => ledger_status(inner),
                OrchestratorError::Store(inner) => store_status(inner),
            },
            AppError::Store(err) => store_status(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<PickupError> for AppError {
    fn from(value: PickupError) -> Self {
        Self::Pickup(value)
    }
}

impl From<MarketError> for AppError {
    fn from(value: MarketError) -> Self {
        Self::Market(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(value: OrchestratorError) -> Self {
        Self::Orchestrator(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
