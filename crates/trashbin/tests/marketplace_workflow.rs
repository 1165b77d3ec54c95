use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use trashbin::catalog::{
    CategoryId, InMemoryCatalog, ListingCondition, ListingStatus, ListingStore, NewListing,
};
use trashbin::ledger::{InMemoryLedger, LedgerService, PartyId, Stream};
use trashbin::marketplace::{
    InMemoryOrderRepository, MarketError, MarketService, NewOrder, OrderStatus,
};
use trashbin::money::{Money, Quantity};

type Market = MarketService<InMemoryOrderRepository, InMemoryCatalog, InMemoryLedger>;

struct World {
    service: Arc<Market>,
    listings: Arc<InMemoryCatalog>,
    ledger: Arc<LedgerService<InMemoryLedger>>,
}

fn world() -> World {
    let listings = Arc::new(InMemoryCatalog::default());
    let ledger = Arc::new(LedgerService::new(Arc::new(InMemoryLedger::default())));
    let service = Arc::new(MarketService::new(
        Arc::new(InMemoryOrderRepository::default()),
        listings.clone(),
        ledger.clone(),
    ));
    World {
        service,
        listings,
        ledger,
    }
}

fn pet_listing(quantity_kg: i64) -> NewListing {
    NewListing {
        category: CategoryId("plastik-pet".to_string()),
        title: "Clean PET bottles, sorted".to_string(),
        quantity: Quantity::from_whole(quantity_kg),
        unit_price: Money::from_major(3500),
        condition: ListingCondition::Clean,
    }
}

fn order(listing: &trashbin::catalog::MarketplaceListing, quantity_kg: i64) -> NewOrder {
    NewOrder {
        listing: listing.id.clone(),
        quantity: Quantity::from_whole(quantity_kg),
        shipping_address: Some("Jl. Kenanga No. 12, Jakarta".to_string()),
        notes: None,
    }
}

#[test]
fn order_runs_from_listing_to_seller_payout() {
    let world = world();
    let seller = PartyId("seller-9".to_string());
    let buyer = PartyId("buyer-9".to_string());
    let now = Utc::now();

    let listing = world
        .service
        .publish_listing(seller.clone(), pet_listing(10), now, Duration::days(30))
        .expect("publish");

    let placed = world
        .service
        .place_order(buyer.clone(), order(&listing, 10), now)
        .expect("place");
    assert_eq!(placed.total_price, Money::from_major(35_000));

    world.service.confirm(&placed.id, &seller).expect("confirm");
    world.service.ship(&placed.id, &seller).expect("ship");
    let completed = world.service.complete(&placed.id, &buyer).expect("complete");

    assert_eq!(completed.order.status, OrderStatus::Completed);
    assert_eq!(
        world.ledger.balance(&seller, Stream::Cash).expect("cash"),
        Money::from_major(35_000).minor()
    );
    let stored = world
        .listings
        .fetch(&listing.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, ListingStatus::Sold);

    // Exactly one cash credit for the order.
    let page = world
        .ledger
        .history(&seller, Stream::Cash, 1)
        .expect("history");
    assert_eq!(page.total, 1);
}

#[test]
fn racing_buyers_cannot_jointly_oversell() {
    let world = world();
    let seller = PartyId("seller-10".to_string());
    let now = Utc::now();

    let listing = world
        .service
        .publish_listing(seller, pet_listing(10), now, Duration::days(30))
        .expect("publish");

    let mut handles = Vec::new();
    for buyer in ["buyer-a", "buyer-b"] {
        let service = world.service.clone();
        let input = order(&listing, 6);
        let buyer = PartyId(buyer.to_string());
        handles.push(thread::spawn(move || {
            service.place_order(buyer, input, now)
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread joins"))
        .collect();

    let placed = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(placed, 1, "only one of two 6 kg orders fits in 10 kg");
    assert!(results.iter().any(|result| matches!(
        result,
        Err(MarketError::InsufficientQuantity { .. })
    )));

    let stored = world
        .listings
        .fetch(&listing.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.quantity, Quantity::from_whole(4));
}

#[test]
fn cancelling_a_pending_order_reopens_the_listing() {
    let world = world();
    let seller = PartyId("seller-11".to_string());
    let buyer = PartyId("buyer-11".to_string());
    let now = Utc::now();

    let listing = world
        .service
        .publish_listing(seller, pet_listing(4), now, Duration::days(30))
        .expect("publish");
    let placed = world
        .service
        .place_order(buyer.clone(), order(&listing, 4), now)
        .expect("place");

    let parked = world
        .listings
        .fetch(&listing.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(parked.status, ListingStatus::Reserved);

    world
        .service
        .cancel_order(&placed.id, &buyer, "ordered the wrong amount")
        .expect("cancel");

    let reopened = world
        .listings
        .fetch(&listing.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(reopened.status, ListingStatus::Available);
    assert_eq!(reopened.quantity, Quantity::from_whole(4));
}
