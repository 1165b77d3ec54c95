use std::sync::Arc;

use chrono::{Duration, Utc};
use trashbin::catalog::{CategoryId, CategoryStore, CategoryUnit, InMemoryCatalog, WasteCategory};
use trashbin::ledger::{
    EntrySource, InMemoryLedger, LedgerRef, LedgerService, PartyId, PerKgPolicy, Stream,
};
use trashbin::money::{Money, Quantity};
use trashbin::pickup::{
    GeoPoint, InMemoryPickupRepository, ItemWeight, NewPickupRequest, PickupItemDraft,
    PickupService, PickupStatus,
};

struct World {
    service: PickupService<InMemoryPickupRepository, InMemoryCatalog, InMemoryLedger>,
    ledger: Arc<LedgerService<InMemoryLedger>>,
}

fn world() -> World {
    let catalog = Arc::new(InMemoryCatalog::default());
    for (id, name, price) in [
        ("plastik-pet", "Plastik PET", 4000),
        ("kardus", "Kardus", 2000),
    ] {
        catalog
            .insert(WasteCategory {
                id: CategoryId(id.to_string()),
                name: name.to_string(),
                unit: CategoryUnit::Mass,
                price_per_unit: Money::from_major(price),
                active: true,
            })
            .expect("seed category");
    }
    let ledger = Arc::new(LedgerService::new(Arc::new(InMemoryLedger::default())));
    let service = PickupService::new(
        Arc::new(InMemoryPickupRepository::default()),
        catalog,
        ledger.clone(),
        Arc::new(PerKgPolicy { points_per_kg: 10 }),
    );
    World { service, ledger }
}

fn request() -> NewPickupRequest {
    NewPickupRequest {
        address: "Jl. Melati No. 4, Bandung".to_string(),
        location: GeoPoint {
            lat: -6.914744,
            lng: 107.609810,
        },
        scheduled_at: Utc::now() + Duration::days(1),
        notes: Some("Gate code 4411".to_string()),
        items: vec![
            PickupItemDraft {
                category: CategoryId("plastik-pet".to_string()),
                estimated_weight: Quantity::from_whole(5),
            },
            PickupItemDraft {
                category: CategoryId("kardus".to_string()),
                estimated_weight: Quantity::from_whole(3),
            },
        ],
    }
}

#[test]
fn pickup_runs_from_request_to_points_award() {
    let world = world();
    let household = PartyId("household-7".to_string());
    let collector = PartyId("collector-3".to_string());

    let created = world
        .service
        .create(household.clone(), request())
        .expect("create");
    assert_eq!(created.status, PickupStatus::Pending);

    world
        .service
        .assign_collector(&created.id, collector.clone())
        .expect("accept");
    world
        .service
        .advance(&created.id, &collector, PickupStatus::OnTheWay)
        .expect("on the way");
    world
        .service
        .advance(&created.id, &collector, PickupStatus::PickedUp)
        .expect("picked up");

    // Scale readings differ from the estimates: 5.50 kg PET, 2.25 kg card.
    let completed = world
        .service
        .confirm_weights(
            &created.id,
            &collector,
            &[
                ItemWeight {
                    item: 1,
                    actual_weight: Quantity(550),
                },
                ItemWeight {
                    item: 2,
                    actual_weight: Quantity(225),
                },
            ],
        )
        .expect("confirm weights");

    let stored = &completed.request;
    assert_eq!(stored.status, PickupStatus::Completed);
    assert_eq!(stored.total_weight, Some(Quantity(775)));
    // 5.50 * 4000.00 + 2.25 * 2000.00
    assert_eq!(stored.total_price, Some(Money::from_major(26_500)));

    // 10 points per kg over 7.75 kg, truncated.
    assert_eq!(completed.points_earned, 77);
    let entry = completed.ledger_entry.expect("points credit");
    assert_eq!(entry.source, EntrySource::PickupCompleted);
    assert_eq!(entry.reference, Some(LedgerRef::Pickup(created.id.clone())));
    assert_eq!(
        world
            .ledger
            .balance(&household, Stream::Points)
            .expect("balance"),
        77
    );

    // Completion is terminal for every later move.
    assert!(world
        .service
        .cancel(&created.id, &household, "too late")
        .is_err());
    assert!(world
        .service
        .confirm_weights(
            &created.id,
            &collector,
            &[ItemWeight {
                item: 1,
                actual_weight: Quantity(550),
            }],
        )
        .is_err());

    // Still exactly one ledger entry for the whole pickup.
    let page = world
        .ledger
        .history(&household, Stream::Points, 1)
        .expect("history");
    assert_eq!(page.total, 1);
}

#[test]
fn cancelled_pickup_earns_nothing() {
    let world = world();
    let household = PartyId("household-8".to_string());

    let created = world
        .service
        .create(household.clone(), request())
        .expect("create");
    world
        .service
        .cancel(&created.id, &household, "going on holiday")
        .expect("cancel");

    assert_eq!(
        world
            .ledger
            .balance(&household, Stream::Points)
            .expect("balance"),
        0
    );
}
