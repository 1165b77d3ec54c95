use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ListingId;
use crate::ledger::PartyId;
use crate::money::{Money, Quantity};

/// Identifier wrapper for marketplace orders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Lifecycle of an order. Forward-only; `Cancelled` is reachable only from
/// `Pending` and `Confirmed`, since a shipped sale can no longer be unwound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub const fn next_in_line(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }
}

/// A buyer's reservation against one listing.
///
/// The seller is denormalized from the listing at order time and the total
/// price snapshotted, so the audit trail survives later listing changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub listing: ListingId,
    pub buyer: PartyId,
    pub seller: PartyId,
    pub quantity: Quantity,
    pub total_price: Money,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

/// Buyer-provided fields for placing an order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub listing: ListingId,
    pub quantity: Quantity,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
