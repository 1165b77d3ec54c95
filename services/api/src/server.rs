use crate::cli::ServeArgs;
use crate::infra::{demo_resolver, seed_categories, AppState};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use trashbin::catalog::{catalog_router, CatalogRouterState, InMemoryCatalog};
use trashbin::config::AppConfig;
use trashbin::error::AppError;
use trashbin::ledger::{
    ledger_router, CurrencyRatePolicy, InMemoryLedger, LedgerRouterState, LedgerService,
};
use trashbin::marketplace::{
    market_router, InMemoryOrderRepository, MarketRouterState, MarketService,
};
use trashbin::orchestrator::{
    rewards_router, CollectionOrchestrator, PartyResolver, RewardsRouterState,
};
use trashbin::pickup::{pickup_router, InMemoryPickupRepository, PickupRouterState, PickupService};
use trashbin::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(InMemoryCatalog::default());
    seed_categories(catalog.as_ref())?;

    let ledger = Arc::new(LedgerService::new(Arc::new(InMemoryLedger::default())));
    let pickups = Arc::new(PickupService::new(
        Arc::new(InMemoryPickupRepository::default()),
        catalog.clone(),
        ledger.clone(),
        Arc::new(CurrencyRatePolicy {
            points_per_thousand_minor: config.rewards.points_per_thousand,
        }),
    ));
    let market = Arc::new(MarketService::new(
        Arc::new(InMemoryOrderRepository::default()),
        catalog.clone(),
        ledger.clone(),
    ));
    let orchestrator = Arc::new(CollectionOrchestrator::new(
        pickups.clone(),
        market.clone(),
        ledger.clone(),
        catalog.clone(),
        catalog.clone(),
        trashbin::orchestrator::default_rewards(),
    ));

    let resolver: Arc<dyn PartyResolver> = demo_resolver();

    let domain = pickup_router(PickupRouterState {
        service: pickups,
        resolver: resolver.clone(),
    })
    .merge(market_router(MarketRouterState {
        service: market,
        resolver: resolver.clone(),
        listing_ttl_days: config.rewards.listing_ttl_days,
    }))
    .merge(catalog_router(CatalogRouterState {
        categories: catalog.clone(),
        listings: catalog.clone(),
    }))
    .merge(ledger_router(LedgerRouterState {
        service: ledger,
        resolver: resolver.clone(),
    }))
    .merge(rewards_router(RewardsRouterState {
        orchestrator,
        resolver,
    }));

    let app = with_platform_routes(domain)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "waste collection platform ready");

    axum::serve(listener, app).await?;
    Ok(())
}
