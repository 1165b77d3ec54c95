use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use trashbin::catalog::{CategoryId, CategoryStore, CategoryUnit, WasteCategory};
use trashbin::error::AppError;
use trashbin::ledger::PartyId;
use trashbin::money::Money;
use trashbin::orchestrator::{AuthError, PartyResolver};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Bearer-token lookup over a fixed token table.
///
/// Stands in for a real identity provider; the core only ever sees the
/// resolved [`PartyId`].
pub(crate) struct StaticTokenResolver {
    tokens: HashMap<String, PartyId>,
}

impl StaticTokenResolver {
    pub(crate) fn new(tokens: HashMap<String, PartyId>) -> Self {
        Self { tokens }
    }
}

impl PartyResolver for StaticTokenResolver {
    fn resolve(&self, token: &str) -> Result<PartyId, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Demo token table: one household, one collector, one buyer.
pub(crate) fn demo_resolver() -> Arc<StaticTokenResolver> {
    let mut tokens = HashMap::new();
    tokens.insert(
        "household-token".to_string(),
        PartyId("household-1".to_string()),
    );
    tokens.insert(
        "collector-token".to_string(),
        PartyId("collector-1".to_string()),
    );
    tokens.insert("buyer-token".to_string(), PartyId("buyer-1".to_string()));
    Arc::new(StaticTokenResolver::new(tokens))
}

/// Seeds the catalog with the launch set of recyclable categories and their
/// per-kilogram prices in rupiah.
pub(crate) fn seed_categories<C: CategoryStore>(catalog: &C) -> Result<(), AppError> {
    let launch_set = [
        ("plastik-pet", "Plastik PET", 4000),
        ("plastik-hdpe", "Plastik HDPE", 3000),
        ("kardus", "Kardus", 2000),
        ("kertas-putih", "Kertas Putih", 2500),
        ("kaleng-aluminium", "Kaleng Aluminium", 8000),
        ("botol-kaca", "Botol Kaca", 1200),
        ("besi", "Besi", 3500),
    ];
    for (id, name, price_per_kg) in launch_set {
        catalog.insert(WasteCategory {
            id: CategoryId(id.to_string()),
            name: name.to_string(),
            unit: CategoryUnit::Mass,
            price_per_unit: Money::from_major(price_per_kg),
            active: true,
        })?;
    }
    Ok(())
}
