use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewOrder, OrderId};
use super::repository::OrderRepository;
use super::service::MarketService;
use crate::catalog::{ListingStore, NewListing};
use crate::error::AppError;
use crate::ledger::LedgerStore;
use crate::orchestrator::{bearer_party, PartyResolver};

pub struct MarketRouterState<O, L, S> {
    pub service: Arc<MarketService<O, L, S>>,
    pub resolver: Arc<dyn PartyResolver>,
    /// Lifetime granted to freshly published listings.
    pub listing_ttl_days: i64,
}

impl<O, L, S> Clone for MarketRouterState<O, L, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            resolver: self.resolver.clone(),
            listing_ttl_days: self.listing_ttl_days,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CancelBody {
    reason: String,
}

/// Router builder for listing publication and the order lifecycle.
pub fn market_router<O, L, S>(state: MarketRouterState<O, L, S>) -> Router
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/marketplace/listings",
            post(publish_handler::<O, L, S>),
        )
        .route(
            "/api/v1/marketplace/orders",
            post(place_handler::<O, L, S>).get(list_handler::<O, L, S>),
        )
        .route(
            "/api/v1/marketplace/orders/:id",
            get(get_handler::<O, L, S>),
        )
        .route(
            "/api/v1/marketplace/orders/:id/confirm",
            post(confirm_handler::<O, L, S>),
        )
        .route(
            "/api/v1/marketplace/orders/:id/ship",
            post(ship_handler::<O, L, S>),
        )
        .route(
            "/api/v1/marketplace/orders/:id/complete",
            post(complete_handler::<O, L, S>),
        )
        .route(
            "/api/v1/marketplace/orders/:id/cancel",
            post(cancel_handler::<O, L, S>),
        )
        .with_state(state)
}

async fn publish_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Json(input): Json<NewListing>,
) -> Result<Response, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let seller = bearer_party(&headers, state.resolver.as_ref())?;
    let listing = state.service.publish_listing(
        seller,
        input,
        Utc::now(),
        Duration::days(state.listing_ttl_days),
    )?;
    Ok((StatusCode::CREATED, Json(json!({ "data": listing }))).into_response())
}

async fn place_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Json(input): Json<NewOrder>,
) -> Result<Response, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let buyer = bearer_party(&headers, state.resolver.as_ref())?;
    let order = state.service.place_order(buyer, input, Utc::now())?;
    Ok((StatusCode::CREATED, Json(json!({ "data": order }))).into_response())
}

async fn list_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let as_buyer = state.service.list_for_buyer(&party)?;
    let as_seller = state.service.list_for_seller(&party)?;
    Ok(Json(json!({ "as_buyer": as_buyer, "as_seller": as_seller })))
}

async fn get_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let order = state.service.get_for(&OrderId(id), &party)?;
    Ok(Json(json!({ "data": order })))
}

async fn confirm_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let seller = bearer_party(&headers, state.resolver.as_ref())?;
    let order = state.service.confirm(&OrderId(id), &seller)?;
    Ok(Json(json!({ "data": order })))
}

async fn ship_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let seller = bearer_party(&headers, state.resolver.as_ref())?;
    let order = state.service.ship(&OrderId(id), &seller)?;
    Ok(Json(json!({ "data": order })))
}

async fn complete_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let buyer = bearer_party(&headers, state.resolver.as_ref())?;
    let completed = state.service.complete(&OrderId(id), &buyer)?;
    Ok(Json(json!({ "data": completed.order })))
}

async fn cancel_handler<O, L, S>(
    State(state): State<MarketRouterState<O, L, S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CancelBody>,
) -> Result<Json<serde_json::Value>, AppError>
where
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let order = state
        .service
        .cancel_order(&OrderId(id), &party, &body.reason)?;
    Ok(Json(json!({ "data": order })))
}
