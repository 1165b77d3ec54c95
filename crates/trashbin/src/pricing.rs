//! Pure subtotal computation for pickup items and marketplace orders.
//!
//! No I/O, no clock reads; callers pass `now` where expiry matters.

use chrono::{DateTime, Utc};

use crate::catalog::{MarketplaceListing, WasteCategory};
use crate::money::{Money, Quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("quantity must be positive and the priced item active")]
    InvalidQuantity,
}

/// Subtotal for a weighed pickup item priced from live category data.
pub fn price_item(category: &WasteCategory, weight: Quantity) -> Result<Money, PricingError> {
    if !category.active || !weight.is_positive() {
        return Err(PricingError::InvalidQuantity);
    }
    Ok(category.price_per_unit.scale(weight))
}

/// Subtotal for a pickup item priced from its snapshotted price-per-unit.
pub fn price_snapshot(price_per_unit: Money, weight: Quantity) -> Result<Money, PricingError> {
    if !weight.is_positive() {
        return Err(PricingError::InvalidQuantity);
    }
    Ok(price_per_unit.scale(weight))
}

/// Subtotal for an order against an open listing.
pub fn price_order(
    listing: &MarketplaceListing,
    quantity: Quantity,
    now: DateTime<Utc>,
) -> Result<Money, PricingError> {
    if !listing.is_open(now) || !quantity.is_positive() {
        return Err(PricingError::InvalidQuantity);
    }
    Ok(listing.unit_price.scale(quantity))
}
