use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::domain::{NewOrder, Order, OrderId, OrderStatus};
use super::repository::OrderRepository;
use crate::catalog::{ListingId, ListingStatus, ListingStore, MarketplaceListing, NewListing};
use crate::ledger::{
    EntrySource, EntryType, LedgerEntry, LedgerError, LedgerRef, LedgerService, LedgerStore,
    PartyId, Stream,
};
use crate::money::Quantity;
use crate::pricing::{self, PricingError};
use crate::store::{StoreError, MAX_COMMIT_ATTEMPTS};

/// Error raised by the marketplace lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity {
        requested: Quantity,
        available: Quantity,
    },
    #[error("listing is not available")]
    ListingUnavailable,
    #[error("cancellation reason is required")]
    MissingReason,
    #[error("invalid transition from {} to {}", from.label(), to.label())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order not found")]
    NotFound,
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of completing an order: the terminal order plus the seller credit.
/// The credit is absent only for a zero-priced listing.
#[derive(Debug)]
pub struct CompletedOrder {
    pub order: Order,
    pub ledger_entry: Option<LedgerEntry>,
}

static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LISTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> OrderId {
    let id = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrderId(format!("order-{id:06}"))
}

fn next_listing_id() -> ListingId {
    let id = LISTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ListingId(format!("listing-{id:06}"))
}

/// State machine for marketplace orders, plus listing publication and the
/// expiry sweep that shares the listing store.
///
/// Quantity reservation happens at placement through a version-guarded
/// listing write, so two racing orders can never jointly oversell.
pub struct MarketService<O, L, S> {
    orders: Arc<O>,
    listings: Arc<L>,
    ledger: Arc<LedgerService<S>>,
}

impl<O, L, S> MarketService<O, L, S>
where
    O: OrderRepository,
    L: ListingStore,
    S: LedgerStore,
{
    pub fn new(orders: Arc<O>, listings: Arc<L>, ledger: Arc<LedgerService<S>>) -> Self {
        Self {
            orders,
            listings,
            ledger,
        }
    }

    /// Publishes a new listing expiring `ttl` from `now`.
    pub fn publish_listing(
        &self,
        seller: PartyId,
        input: NewListing,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<MarketplaceListing, MarketError> {
        if !input.quantity.is_positive() || input.unit_price.minor() < 0 {
            return Err(PricingError::InvalidQuantity.into());
        }
        let listing = MarketplaceListing {
            id: next_listing_id(),
            seller,
            category: input.category,
            title: input.title,
            quantity: input.quantity,
            unit_price: input.unit_price,
            condition: input.condition,
            status: ListingStatus::Available,
            expires_at: now + ttl,
            created_at: now,
            version: 0,
        };
        Ok(self.listings.insert(listing)?)
    }

    /// Places an order, reserving quantity immediately. The listing write is
    /// a compare-and-swap; a lost race re-reads and either retries against
    /// the fresh quantity or fails `InsufficientQuantity` for real.
    pub fn place_order(
        &self,
        buyer: PartyId,
        input: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, MarketError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let listing = self
                .listings
                .fetch(&input.listing)?
                .ok_or(MarketError::ListingUnavailable)?;
            if !listing.is_open(now) {
                return Err(MarketError::ListingUnavailable);
            }
            let total_price = pricing::price_order(&listing, input.quantity, now)?;
            if input.quantity > listing.quantity {
                return Err(MarketError::InsufficientQuantity {
                    requested: input.quantity,
                    available: listing.quantity,
                });
            }

            let version = listing.version;
            let mut reserved = listing;
            reserved.quantity = reserved.quantity - input.quantity;
            if !reserved.quantity.is_positive() {
                reserved.status = ListingStatus::Reserved;
            }
            let reserved = match self.listings.update(reserved, version) {
                Ok(listing) => listing,
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            };

            let order = Order {
                id: next_order_id(),
                listing: reserved.id,
                buyer,
                seller: reserved.seller,
                quantity: input.quantity,
                total_price,
                shipping_address: input.shipping_address,
                notes: input.notes,
                status: OrderStatus::Pending,
                cancellation_reason: None,
                created_at: now,
                version: 0,
            };
            return Ok(self.orders.insert(order)?);
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Seller acknowledges the order.
    pub fn confirm(&self, id: &OrderId, seller: &PartyId) -> Result<Order, MarketError> {
        self.transition(id, seller, ActingRole::Seller, OrderStatus::Confirmed)
    }

    /// Seller hands the material to a carrier.
    pub fn ship(&self, id: &OrderId, seller: &PartyId) -> Result<Order, MarketError> {
        self.transition(id, seller, ActingRole::Seller, OrderStatus::Shipped)
    }

    /// Buyer confirms receipt: the order completes, a depleted listing is
    /// marked sold, and the seller is credited the snapshotted total.
    pub fn complete(&self, id: &OrderId, buyer: &PartyId) -> Result<CompletedOrder, MarketError> {
        let order = self.transition(id, buyer, ActingRole::Buyer, OrderStatus::Completed)?;
        // A failed payout unwinds the completion so the buyer can confirm
        // receipt again; the order and its ledger entry persist together or
        // not at all. The listing flips to sold only after the credit lands.
        let ledger_entry = match self.credit_seller(&order) {
            Ok(entry) => entry,
            Err(err) => {
                let mut reverted = order.clone();
                reverted.status = OrderStatus::Shipped;
                if let Err(revert) = self.orders.update(reverted, order.version) {
                    tracing::error!(
                        order = %order.id.0,
                        error = %revert,
                        "completion rollback failed"
                    );
                }
                return Err(err.into());
            }
        };
        self.mark_sold_if_depleted(&order.listing)?;
        tracing::info!(
            order = %order.id.0,
            total_price = %order.total_price,
            "order completed"
        );
        Ok(CompletedOrder {
            order,
            ledger_entry,
        })
    }

    /// Cancels a not-yet-shipped order and returns its reserved quantity to
    /// the listing. Buyers may only cancel `pending` orders; sellers may
    /// also cancel `confirmed` ones.
    pub fn cancel_order(
        &self,
        id: &OrderId,
        acting: &PartyId,
        reason: &str,
    ) -> Result<Order, MarketError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MarketError::MissingReason);
        }

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut order = self.orders.fetch(id)?.ok_or(MarketError::NotFound)?;
            let is_buyer = &order.buyer == acting;
            let is_seller = &order.seller == acting;
            if !is_buyer && !is_seller {
                return Err(MarketError::NotFound);
            }
            let cancellable = match order.status {
                OrderStatus::Pending => true,
                OrderStatus::Confirmed => is_seller,
                _ => false,
            };
            if !cancellable {
                return Err(MarketError::InvalidTransition {
                    from: order.status,
                    to: OrderStatus::Cancelled,
                });
            }

            let version = order.version;
            order.status = OrderStatus::Cancelled;
            order.cancellation_reason = Some(reason.to_string());
            let stored = match self.orders.update(order, version) {
                Ok(order) => order,
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            };

            self.restore_quantity(&stored.listing, stored.quantity)?;
            return Ok(stored);
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Fetches an order visible to `party` (its buyer or seller).
    pub fn get_for(&self, id: &OrderId, party: &PartyId) -> Result<Order, MarketError> {
        let order = self.orders.fetch(id)?.ok_or(MarketError::NotFound)?;
        if &order.buyer != party && &order.seller != party {
            return Err(MarketError::NotFound);
        }
        Ok(order)
    }

    pub fn list_for_buyer(&self, party: &PartyId) -> Result<Vec<Order>, MarketError> {
        Ok(self.orders.list_for_buyer(party)?)
    }

    pub fn list_for_seller(&self, party: &PartyId) -> Result<Vec<Order>, MarketError> {
        Ok(self.orders.list_for_seller(party)?)
    }

    /// Flips listings past their expiry to `expired`. Idempotent; a lost
    /// write means someone else already touched the listing and the next
    /// sweep will catch it if it still qualifies.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, MarketError> {
        let mut flipped = 0;
        for listing in self.listings.list()? {
            if listing.status.is_terminal() || now < listing.expires_at {
                continue;
            }
            let version = listing.version;
            let mut expired = listing;
            expired.status = ListingStatus::Expired;
            match self.listings.update(expired, version) {
                Ok(_) => flipped += 1,
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Ok(flipped)
    }

    fn transition(
        &self,
        id: &OrderId,
        acting: &PartyId,
        role: ActingRole,
        next: OrderStatus,
    ) -> Result<Order, MarketError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut order = self.orders.fetch(id)?.ok_or(MarketError::NotFound)?;
            let permitted = match role {
                ActingRole::Buyer => &order.buyer == acting,
                ActingRole::Seller => &order.seller == acting,
            };
            if !permitted {
                return Err(MarketError::NotFound);
            }
            if order.status.next_in_line() != Some(next) {
                return Err(MarketError::InvalidTransition {
                    from: order.status,
                    to: next,
                });
            }
            let version = order.version;
            order.status = next;
            match self.orders.update(order, version) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    fn mark_sold_if_depleted(&self, id: &ListingId) -> Result<(), MarketError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let listing = self.listings.fetch(id)?.ok_or(StoreError::NotFound)?;
            if listing.quantity.is_positive() || listing.status == ListingStatus::Sold {
                return Ok(());
            }
            let version = listing.version;
            let mut sold = listing;
            sold.status = ListingStatus::Sold;
            match self.listings.update(sold, version) {
                Ok(_) => return Ok(()),
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    fn restore_quantity(&self, id: &ListingId, quantity: Quantity) -> Result<(), MarketError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let listing = self.listings.fetch(id)?.ok_or(StoreError::NotFound)?;
            let version = listing.version;
            let mut restored = listing;
            restored.quantity += quantity;
            // A sold listing regaining stock from a cancelled sibling order
            // reopens; only expiry is a one-way street.
            let reopens = matches!(
                restored.status,
                ListingStatus::Reserved | ListingStatus::Sold
            );
            if reopens && restored.quantity.is_positive() {
                restored.status = ListingStatus::Available;
            }
            match self.listings.update(restored, version) {
                Ok(_) => return Ok(()),
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    fn credit_seller(&self, order: &Order) -> Result<Option<LedgerEntry>, LedgerError> {
        if order.total_price.minor() <= 0 {
            return Ok(None);
        }
        let entry = self.ledger.record(
            &order.seller,
            Stream::Cash,
            order.total_price.minor(),
            EntryType::Earned,
            EntrySource::ItemSold,
            Some(LedgerRef::Order(order.id.clone())),
            &format!("Sale proceeds for order {}", order.id.0),
        )?;
        Ok(Some(entry))
    }
}

#[derive(Clone, Copy)]
enum ActingRole {
    Buyer,
    Seller,
}
