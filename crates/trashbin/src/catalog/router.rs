use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use super::domain::{CategoryId, ListingId};
use super::store::{CategoryStore, ListingStore};
use crate::error::AppError;

/// Read-only catalog endpoints: categories and open listings.
pub struct CatalogRouterState<C, L> {
    pub categories: Arc<C>,
    pub listings: Arc<L>,
}

impl<C, L> Clone for CatalogRouterState<C, L> {
    fn clone(&self) -> Self {
        Self {
            categories: self.categories.clone(),
            listings: self.listings.clone(),
        }
    }
}

pub fn catalog_router<C, L>(state: CatalogRouterState<C, L>) -> Router
where
    C: CategoryStore + 'static,
    L: ListingStore + 'static,
{
    Router::new()
        .route("/api/v1/categories", get(list_categories::<C, L>))
        .route("/api/v1/categories/:id", get(get_category::<C, L>))
        .route(
            "/api/v1/marketplace/listings",
            get(list_listings::<C, L>),
        )
        .route(
            "/api/v1/marketplace/listings/:id",
            get(get_listing::<C, L>),
        )
        .with_state(state)
}

async fn list_categories<C, L>(
    State(state): State<CatalogRouterState<C, L>>,
) -> Result<Json<serde_json::Value>, AppError>
where
    C: CategoryStore + 'static,
    L: ListingStore + 'static,
{
    let categories = state.categories.list()?;
    Ok(Json(json!({ "data": categories })))
}

async fn get_category<C, L>(
    State(state): State<CatalogRouterState<C, L>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    C: CategoryStore + 'static,
    L: ListingStore + 'static,
{
    let category = state
        .categories
        .fetch(&CategoryId(id))?
        .ok_or(crate::store::StoreError::NotFound)?;
    Ok(Json(json!({ "data": category })))
}

async fn list_listings<C, L>(
    State(state): State<CatalogRouterState<C, L>>,
) -> Result<Json<serde_json::Value>, AppError>
where
    C: CategoryStore + 'static,
    L: ListingStore + 'static,
{
    let listings = state.listings.list_open(Utc::now())?;
    Ok(Json(json!({ "data": listings })))
}

async fn get_listing<C, L>(
    State(state): State<CatalogRouterState<C, L>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    C: CategoryStore + 'static,
    L: ListingStore + 'static,
{
    let now = Utc::now();
    let listing = state
        .listings
        .fetch(&ListingId(id))?
        .filter(|listing| listing.is_open(now))
        .ok_or(crate::store::StoreError::NotFound)?;
    Ok(Json(json!({ "data": listing })))
}
