use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ItemWeight, NewPickupRequest, PickupId, PickupStatus};
use super::repository::PickupRepository;
use super::service::PickupService;
use crate::catalog::CategoryStore;
use crate::error::AppError;
use crate::ledger::LedgerStore;
use crate::orchestrator::{bearer_party, PartyResolver};

pub struct PickupRouterState<R, C, S> {
    pub service: Arc<PickupService<R, C, S>>,
    pub resolver: Arc<dyn PartyResolver>,
}

impl<R, C, S> Clone for PickupRouterState<R, C, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CancelBody {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: PickupStatus,
}

#[derive(Debug, Deserialize)]
struct ConfirmWeightBody {
    items: Vec<ItemWeight>,
}

/// Router builder for requester- and collector-facing pickup endpoints.
pub fn pickup_router<R, C, S>(state: PickupRouterState<R, C, S>) -> Router
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/pickups",
            post(create_handler::<R, C, S>).get(list_handler::<R, C, S>),
        )
        .route("/api/v1/pickups/:id", get(get_handler::<R, C, S>))
        .route("/api/v1/pickups/:id/cancel", post(cancel_handler::<R, C, S>))
        .route(
            "/api/v1/collector/pickups",
            get(pending_handler::<R, C, S>),
        )
        .route(
            "/api/v1/collector/pickups/:id/accept",
            post(accept_handler::<R, C, S>),
        )
        .route(
            "/api/v1/collector/pickups/:id/status",
            post(status_handler::<R, C, S>),
        )
        .route(
            "/api/v1/collector/pickups/:id/confirm-weight",
            post(confirm_weight_handler::<R, C, S>),
        )
        .with_state(state)
}

async fn create_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
    Json(input): Json<NewPickupRequest>,
) -> Result<Response, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let requester = bearer_party(&headers, state.resolver.as_ref())?;
    let request = state.service.create(requester, input)?;
    Ok((StatusCode::CREATED, Json(json!({ "data": request }))).into_response())
}

async fn list_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let requester = bearer_party(&headers, state.resolver.as_ref())?;
    let requests = state.service.list_for_requester(&requester)?;
    Ok(Json(json!({ "data": requests })))
}

async fn get_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let request = state.service.get_for(&PickupId(id), &party)?;
    Ok(Json(json!({ "data": request })))
}

async fn cancel_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CancelBody>,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let request = state.service.cancel(&PickupId(id), &party, &body.reason)?;
    Ok(Json(json!({ "data": request })))
}

async fn pending_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    bearer_party(&headers, state.resolver.as_ref())?;
    let requests = state.service.list_pending()?;
    Ok(Json(json!({ "data": requests })))
}

async fn accept_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let collector = bearer_party(&headers, state.resolver.as_ref())?;
    let request = state.service.assign_collector(&PickupId(id), collector)?;
    Ok(Json(json!({ "data": request })))
}

async fn status_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let collector = bearer_party(&headers, state.resolver.as_ref())?;
    let request = state
        .service
        .advance(&PickupId(id), &collector, body.status)?;
    Ok(Json(json!({ "data": request })))
}

async fn confirm_weight_handler<R, C, S>(
    State(state): State<PickupRouterState<R, C, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ConfirmWeightBody>,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    S: LedgerStore + 'static,
{
    let collector = bearer_party(&headers, state.resolver.as_ref())?;
    let completed = state
        .service
        .confirm_weights(&PickupId(id), &collector, &body.items)?;
    Ok(Json(json!({
        "data": completed.request,
        "points_earned": completed.points_earned,
    })))
}
