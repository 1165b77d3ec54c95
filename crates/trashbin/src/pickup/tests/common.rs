use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::catalog::{CategoryId, CategoryStore, CategoryUnit, InMemoryCatalog, WasteCategory};
use crate::ledger::{InMemoryLedger, LedgerService, PartyId, PerKgPolicy};
use crate::money::{Money, Quantity};
use crate::orchestrator::{AuthError, PartyResolver};
use crate::pickup::domain::{GeoPoint, NewPickupRequest, PickupItemDraft};
use crate::pickup::repository::InMemoryPickupRepository;
use crate::pickup::service::PickupService;

pub(super) struct Fixture {
    pub service: Arc<PickupService<InMemoryPickupRepository, InMemoryCatalog, InMemoryLedger>>,
    pub catalog: Arc<InMemoryCatalog>,
    pub ledger: Arc<LedgerService<InMemoryLedger>>,
}

/// Resolves the fixed demo tokens used by the routing tests.
pub(super) struct TokenTable;

impl PartyResolver for TokenTable {
    fn resolve(&self, token: &str) -> Result<PartyId, AuthError> {
        match token {
            "household-token" => Ok(PartyId("household-1".to_string())),
            "collector-token" => Ok(PartyId("collector-1".to_string())),
            _ => Err(AuthError::Unauthenticated),
        }
    }
}

/// Service wired over in-memory stores, seeded with one active and one
/// retired category and awarding 10 points per kilogram.
pub(super) fn fixture() -> Fixture {
    let repository = Arc::new(InMemoryPickupRepository::default());
    let catalog = Arc::new(InMemoryCatalog::default());
    let ledger = Arc::new(LedgerService::new(Arc::new(InMemoryLedger::default())));

    catalog
        .insert(WasteCategory {
            id: CategoryId("plastik-pet".to_string()),
            name: "Plastik PET".to_string(),
            unit: CategoryUnit::Mass,
            price_per_unit: Money::from_major(4000),
            active: true,
        })
        .expect("seed pet");
    catalog
        .insert(WasteCategory {
            id: CategoryId("styrofoam".to_string()),
            name: "Styrofoam".to_string(),
            unit: CategoryUnit::Mass,
            price_per_unit: Money::from_major(500),
            active: false,
        })
        .expect("seed retired category");

    let service = Arc::new(PickupService::new(
        repository,
        catalog.clone(),
        ledger.clone(),
        Arc::new(PerKgPolicy { points_per_kg: 10 }),
    ));
    Fixture {
        service,
        catalog,
        ledger,
    }
}

pub(super) fn new_request(category: &str, estimated_kg: i64) -> NewPickupRequest {
    NewPickupRequest {
        address: "Jl. Melati No. 4, Bandung".to_string(),
        location: GeoPoint {
            lat: -6.914744,
            lng: 107.609810,
        },
        scheduled_at: Utc::now() + Duration::days(1),
        notes: None,
        items: vec![PickupItemDraft {
            category: CategoryId(category.to_string()),
            estimated_weight: Quantity::from_whole(estimated_kg),
        }],
    }
}
