use crate::infra::seed_categories;
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use trashbin::catalog::{CategoryId, InMemoryCatalog, ListingCondition, NewListing};
use trashbin::error::AppError;
use trashbin::ledger::{
    CurrencyRatePolicy, InMemoryLedger, LedgerService, PartyId, Stream,
};
use trashbin::marketplace::{InMemoryOrderRepository, MarketService, NewOrder};
use trashbin::money::{Money, Quantity};
use trashbin::orchestrator::{default_rewards, CollectionOrchestrator};
use trashbin::pickup::{
    GeoPoint, InMemoryPickupRepository, ItemWeight, NewPickupRequest, PickupItemDraft,
    PickupService, PickupStatus,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the marketplace portion of the demo.
    #[arg(long)]
    pub(crate) skip_market: bool,
    /// Skip the reward redemption at the end of the demo.
    #[arg(long)]
    pub(crate) skip_redeem: bool,
    /// Points credited per 1,000 rupiah of pickup value.
    #[arg(long, default_value_t = 1)]
    pub(crate) points_per_thousand: i64,
}

type DemoOrchestrator = CollectionOrchestrator<
    InMemoryPickupRepository,
    InMemoryCatalog,
    InMemoryOrderRepository,
    InMemoryCatalog,
    InMemoryLedger,
>;

fn build_orchestrator(points_per_thousand: i64) -> Result<DemoOrchestrator, AppError> {
    let catalog = Arc::new(InMemoryCatalog::default());
    seed_categories(catalog.as_ref())?;

    let ledger = Arc::new(LedgerService::new(Arc::new(InMemoryLedger::default())));
    let pickups = Arc::new(PickupService::new(
        Arc::new(InMemoryPickupRepository::default()),
        catalog.clone(),
        ledger.clone(),
        Arc::new(CurrencyRatePolicy {
            points_per_thousand_minor: points_per_thousand,
        }),
    ));
    let market = Arc::new(MarketService::new(
        Arc::new(InMemoryOrderRepository::default()),
        catalog.clone(),
        ledger.clone(),
    ));
    Ok(CollectionOrchestrator::new(
        pickups,
        market,
        ledger,
        catalog.clone(),
        catalog,
        default_rewards(),
    ))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let orchestrator = build_orchestrator(args.points_per_thousand)?;
    let household = PartyId("household-1".to_string());
    let collector = PartyId("collector-1".to_string());
    let buyer = PartyId("buyer-1".to_string());

    println!("=== TrashBin demo ===\n");
    println!("Waste categories:");
    for category in orchestrator.categories()? {
        println!(
            "  {:<18} Rp {:>9} per {}",
            category.name,
            category.price_per_unit,
            category.unit.label()
        );
    }

    println!("\n--- Pickup ---");
    let request = orchestrator.pickups().create(
        household.clone(),
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
        },
    )?;
    println!("{} requested by {}", request.id.0, household.0);

    orchestrator
        .pickups()
        .assign_collector(&request.id, collector.clone())?;
    orchestrator
        .pickups()
        .advance(&request.id, &collector, PickupStatus::OnTheWay)?;
    orchestrator
        .pickups()
        .advance(&request.id, &collector, PickupStatus::PickedUp)?;
    let completed = orchestrator.pickups().confirm_weights(
        &request.id,
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
    )?;
    println!(
        "{} completed: {} kg weighed, Rp {} value, {} points awarded",
        completed.request.id.0,
        completed.request.total_weight.unwrap_or(Quantity::ZERO),
        completed.request.total_price.unwrap_or(Money::ZERO),
        completed.points_earned,
    );

    if !args.skip_market {
        println!("\n--- Marketplace ---");
        let now = Utc::now();
        let listing = orchestrator.market().publish_listing(
            household.clone(),
            NewListing {
                category: CategoryId("plastik-pet".to_string()),
                title: "Pressed PET bales".to_string(),
                quantity: Quantity::from_whole(5),
                unit_price: Money::from_major(5000),
                condition: ListingCondition::Clean,
            },
            now,
            Duration::days(30),
        )?;
        println!(
            "{} listed: {} kg at Rp {} per kg",
            listing.id.0, listing.quantity, listing.unit_price
        );

        let order = orchestrator.market().place_order(
            buyer.clone(),
            NewOrder {
                listing: listing.id.clone(),
                quantity: Quantity::from_whole(5),
                shipping_address: Some("Jl. Kenanga No. 12, Jakarta".to_string()),
                notes: None,
            },
            now,
        )?;
        orchestrator.market().confirm(&order.id, &household)?;
        orchestrator.market().ship(&order.id, &household)?;
        let sale = orchestrator.market().complete(&order.id, &buyer)?;
        println!(
            "{} completed: Rp {} credited to {}",
            sale.order.id.0, sale.order.total_price, sale.order.seller.0
        );
    }

    if !args.skip_redeem {
        println!("\n--- Rewards ---");
        for reward in orchestrator.rewards() {
            println!("  [{}] {:<28} {} points", reward.id, reward.name, reward.cost_points);
        }
        let points = orchestrator.ledger().balance(&household, Stream::Points)?;
        if let Some(affordable) = orchestrator
            .rewards()
            .iter()
            .filter(|reward| reward.cost_points <= points)
            .max_by_key(|reward| reward.cost_points)
        {
            let (reward, entry) = orchestrator.redeem(&household, affordable.id)?;
            println!(
                "{} redeemed {} ({} points, {} remaining)",
                household.0, reward.name, reward.cost_points, entry.balance_after
            );
        } else {
            println!("{} has {} points, not enough for any reward yet", household.0, points);
        }
    }

    println!("\n--- Ledger ---");
    for stream in [Stream::Points, Stream::Cash] {
        let balance = orchestrator.ledger().balance(&household, stream)?;
        println!("{} balance for {}: {}", stream.label(), household.0, balance);
        let page = orchestrator.ledger().history(&household, stream, 1)?;
        for entry in &page.entries {
            println!(
                "  {:>10}  {:<28} balance {}",
                entry.amount, entry.description, entry.balance_after
            );
        }
    }

    Ok(())
}
