//! Marketplace order lifecycle over published listings, with quantity
//! reservation and the seller cash credit on completion.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{NewOrder, Order, OrderId, OrderStatus};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use router::{market_router, MarketRouterState};
pub use service::{CompletedOrder, MarketError, MarketService};
