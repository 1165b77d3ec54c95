//! Composition root tying the catalog, lifecycles, and ledger together, plus
//! the injected external collaborators: the authenticated-party resolver and
//! the reward catalog redeemed against the points ledger.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{
    CategoryId, CategoryStore, ListingId, ListingStore, MarketplaceListing, WasteCategory,
};
use crate::ledger::{
    EntrySource, EntryType, LedgerEntry, LedgerError, LedgerRef, LedgerService, LedgerStore,
    PartyId, Stream,
};
use crate::marketplace::{MarketError, MarketService, OrderRepository};
use crate::pickup::{PickupRepository, PickupService};
use crate::store::StoreError;

/// Error raised by the external authentication boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or invalid credentials")]
    Unauthenticated,
}

/// Resolves request credentials to an authenticated party. Token issuance
/// and verification live outside the core; this trait is the whole contract.
pub trait PartyResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<PartyId, AuthError>;
}

/// Extracts the bearer token from `Authorization` and resolves it.
pub fn bearer_party(
    headers: &HeaderMap,
    resolver: &dyn PartyResolver,
) -> Result<PartyId, AuthError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthenticated)?;
    resolver.resolve(token.trim())
}

/// A redeemable reward offered for points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub id: u32,
    pub name: String,
    pub cost_points: i64,
}

/// The stock reward catalog.
pub fn default_rewards() -> Vec<Reward> {
    vec![
        Reward {
            id: 1,
            name: "Pulsa Rp 10,000".to_string(),
            cost_points: 1000,
        },
        Reward {
            id: 2,
            name: "Voucher Belanja Rp 25,000".to_string(),
            cost_points: 2000,
        },
        Reward {
            id: 3,
            name: "Cashback Rp 50,000".to_string(),
            cost_points: 5000,
        },
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("reward {0} does not exist")]
    UnknownReward(u32),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives the whole collection domain on behalf of the HTTP boundary.
///
/// Owns creation of pickups and orders through the composed services and is
/// the only caller of the ledger outside them (reward redemption).
pub struct CollectionOrchestrator<R, C, O, L, S> {
    pickups: Arc<PickupService<R, C, S>>,
    market: Arc<MarketService<O, L, S>>,
    ledger: Arc<LedgerService<S>>,
    categories: Arc<C>,
    listings: Arc<L>,
    rewards: Vec<Reward>,
}

impl<R, C, O, L, S> CollectionOrchestrator<R, C, O, L, S>
where
    R: PickupRepository,
    C: CategoryStore,
    O: OrderRepository,
    L: ListingStore,
    S: LedgerStore,
{
    pub fn new(
        pickups: Arc<PickupService<R, C, S>>,
        market: Arc<MarketService<O, L, S>>,
        ledger: Arc<LedgerService<S>>,
        categories: Arc<C>,
        listings: Arc<L>,
        rewards: Vec<Reward>,
    ) -> Self {
        Self {
            pickups,
            market,
            ledger,
            categories,
            listings,
            rewards,
        }
    }

    pub fn pickups(&self) -> &Arc<PickupService<R, C, S>> {
        &self.pickups
    }

    pub fn market(&self) -> &Arc<MarketService<O, L, S>> {
        &self.market
    }

    pub fn ledger(&self) -> &Arc<LedgerService<S>> {
        &self.ledger
    }

    pub fn categories(&self) -> Result<Vec<WasteCategory>, StoreError> {
        self.categories.list()
    }

    pub fn category(&self, id: &CategoryId) -> Result<Option<WasteCategory>, StoreError> {
        self.categories.fetch(id)
    }

    pub fn open_listings(&self, now: DateTime<Utc>) -> Result<Vec<MarketplaceListing>, StoreError> {
        self.listings.list_open(now)
    }

    pub fn listing(&self, id: &ListingId) -> Result<Option<MarketplaceListing>, StoreError> {
        self.listings.fetch(id)
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// Spends points on a reward; the ledger enforces the balance floor.
    pub fn redeem(
        &self,
        party: &PartyId,
        reward_id: u32,
    ) -> Result<(Reward, LedgerEntry), OrchestratorError> {
        let reward = self
            .rewards
            .iter()
            .find(|reward| reward.id == reward_id)
            .cloned()
            .ok_or(OrchestratorError::UnknownReward(reward_id))?;
        let entry = self.ledger.record(
            party,
            Stream::Points,
            -reward.cost_points,
            EntryType::Spent,
            EntrySource::Redeem,
            Some(LedgerRef::Reward(reward.id)),
            &format!("Redeemed for {}", reward.name),
        )?;
        Ok((reward, entry))
    }

    /// Idempotent pass flipping listings past their expiry.
    pub fn sweep_expired_listings(&self, now: DateTime<Utc>) -> Result<usize, MarketError> {
        self.market.sweep_expired(now)
    }
}

pub struct RewardsRouterState<R, C, O, L, S> {
    pub orchestrator: Arc<CollectionOrchestrator<R, C, O, L, S>>,
    pub resolver: Arc<dyn PartyResolver>,
}

impl<R, C, O, L, S> Clone for RewardsRouterState<R, C, O, L, S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

/// Router builder for the reward catalog and redemption.
pub fn rewards_router<R, C, O, L, S>(state: RewardsRouterState<R, C, O, L, S>) -> axum::Router
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/api/v1/rewards", get(list_rewards::<R, C, O, L, S>))
        .route(
            "/api/v1/rewards/:id/redeem",
            post(redeem_reward::<R, C, O, L, S>),
        )
        .with_state(state)
}

async fn list_rewards<R, C, O, L, S>(
    axum::extract::State(state): axum::extract::State<RewardsRouterState<R, C, O, L, S>>,
) -> axum::Json<serde_json::Value>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    axum::Json(serde_json::json!({ "data": state.orchestrator.rewards() }))
}

async fn redeem_reward<R, C, O, L, S>(
    axum::extract::State(state): axum::extract::State<RewardsRouterState<R, C, O, L, S>>,
    headers: HeaderMap,
    axum::extract::Path(id): axum::extract::Path<u32>,
) -> Result<axum::Json<serde_json::Value>, crate::error::AppError>
where
    R: PickupRepository + 'static,
    C: CategoryStore + 'static,
    O: OrderRepository + 'static,
    L: ListingStore + 'static,
    S: LedgerStore + 'static,
{
    let party = bearer_party(&headers, state.resolver.as_ref())?;
    let (reward, entry) = state.orchestrator.redeem(&party, id)?;
    Ok(axum::Json(serde_json::json!({
        "reward": reward,
        "remaining_points": entry.balance_after,
    })))
}
