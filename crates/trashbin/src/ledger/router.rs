use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::Stream;
use super::service::LedgerService;
use super::store::LedgerStore;
use crate::error::AppError;
use crate::orchestrator::{bearer_party, PartyResolver};
use crate::store::StoreError;

pub struct LedgerRouterState<S> {
    pub service: Arc<LedgerService<S>>,
    pub resolver: Arc<dyn PartyResolver>,
}

impl<S> Clone for LedgerRouterState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    page: Option<u32>,
}

fn parse_stream(raw: &str) -> Result<Stream, AppError> {
    match raw {
        "points" => Ok(Stream::Points),
        "cash" => Ok(Stream::Cash),
        _ => Err(StoreError::NotFound.into()),
    }
}

/// Read-side ledger endpoints: cached balance and paged history.
pub fn ledger_router<S>(state: LedgerRouterState<S>) -> Router
where
    S: LedgerStore + 'static,
{
    Router::new()
        .route("/api/v1/ledger/:stream/balance", get(balance_handler::<S>))
        .route("/api/v1/ledger/:stream/history", get(history_handler::<S>))
        .with_state(state)
}

async fn balance_handler<S>(
    State(state): State<LedgerRouterState<S>>,
    headers: HeaderMap,
    Path(stream): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let stream = parse_stream(&stream)?;
    let balance = state.service.balance(&party, stream)?;
    Ok(Json(json!({
        "stream": stream.label(),
        "balance": balance,
    })))
}

async fn history_handler<S>(
    State(state): State<LedgerRouterState<S>>,
    headers: HeaderMap,
    Path(stream): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let stream = parse_stream(&stream)?;
    let page = state
        .service
        .history(&party, stream, query.page.unwrap_or(1))?;
    Ok(Json(json!({ "data": page })))
}
