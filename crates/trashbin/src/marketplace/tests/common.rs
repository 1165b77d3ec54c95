use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::catalog::{CategoryId, InMemoryCatalog, ListingCondition, MarketplaceListing, NewListing};
use crate::ledger::{InMemoryLedger, LedgerService, PartyId};
use crate::marketplace::domain::NewOrder;
use crate::marketplace::repository::InMemoryOrderRepository;
use crate::marketplace::service::MarketService;
use crate::money::{Money, Quantity};

pub(super) struct Fixture {
    pub service: MarketService<InMemoryOrderRepository, InMemoryCatalog, InMemoryLedger>,
    pub listings: Arc<InMemoryCatalog>,
    pub ledger: Arc<LedgerService<InMemoryLedger>>,
    pub now: DateTime<Utc>,
}

pub(super) fn fixture() -> Fixture {
    let orders = Arc::new(InMemoryOrderRepository::default());
    let listings = Arc::new(InMemoryCatalog::default());
    let ledger = Arc::new(LedgerService::new(Arc::new(InMemoryLedger::default())));
    Fixture {
        service: MarketService::new(orders, listings.clone(), ledger.clone()),
        listings,
        ledger,
        now: Utc::now(),
    }
}

pub(super) fn seller() -> PartyId {
    PartyId("seller-1".to_string())
}

pub(super) fn buyer() -> PartyId {
    PartyId("buyer-1".to_string())
}

pub(super) fn pet_listing(quantity_kg: i64, price_major: i64) -> NewListing {
    NewListing {
        category: CategoryId("plastik-pet".to_string()),
        title: "Clean PET bottles, sorted".to_string(),
        quantity: Quantity::from_whole(quantity_kg),
        unit_price: Money::from_major(price_major),
        condition: ListingCondition::Clean,
    }
}

/// Publishes a listing from `seller()` valid for 30 days from `now`.
pub(super) fn publish(fx: &Fixture, quantity_kg: i64, price_major: i64) -> MarketplaceListing {
    fx.service
        .publish_listing(
            seller(),
            pet_listing(quantity_kg, price_major),
            fx.now,
            Duration::days(30),
        )
        .expect("publish listing")
}

pub(super) fn order_for(listing: &MarketplaceListing, quantity_kg: i64) -> NewOrder {
    NewOrder {
        listing: listing.id.clone(),
        quantity: Quantity::from_whole(quantity_kg),
        shipping_address: Some("Jl. Kenanga No. 12, Jakarta".to_string()),
        notes: None,
    }
}
