use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CategoryId;
use crate::ledger::PartyId;
use crate::money::{Money, Quantity};

/// Identifier wrapper for pickup requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PickupId(pub String);

/// WGS84 coordinates of the pickup address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Lifecycle of a pickup request. Forward-only along the linear chain;
/// `Cancelled` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    Pending,
    Accepted,
    OnTheWay,
    PickedUp,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Accepted => "accepted",
            PickupStatus::OnTheWay => "on_the_way",
            PickupStatus::PickedUp => "picked_up",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PickupStatus::Completed | PickupStatus::Cancelled)
    }

    /// The only state reachable by a forward move, if any.
    pub const fn next_in_line(self) -> Option<PickupStatus> {
        match self {
            PickupStatus::Pending => Some(PickupStatus::Accepted),
            PickupStatus::Accepted => Some(PickupStatus::OnTheWay),
            PickupStatus::OnTheWay => Some(PickupStatus::PickedUp),
            PickupStatus::PickedUp => Some(PickupStatus::Completed),
            PickupStatus::Completed | PickupStatus::Cancelled => None,
        }
    }
}

/// One priced line of a pickup request.
///
/// `price_per_unit` is snapshotted from the category at creation and never
/// recomputed; `subtotal` is always derived through
/// [`PickupItem::weighed_quantity`] times that snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupItem {
    /// Ordinal within the request, assigned at creation.
    pub id: u32,
    pub category: CategoryId,
    pub estimated_weight: Quantity,
    pub actual_weight: Option<Quantity>,
    pub price_per_unit: Money,
    pub subtotal: Money,
}

impl PickupItem {
    /// Actual weight once confirmed, estimated weight before that.
    pub fn weighed_quantity(&self) -> Quantity {
        self.actual_weight.unwrap_or(self.estimated_weight)
    }

    /// Re-derives the subtotal from the current weight fields. Called on
    /// every weight change so the stored subtotal is never hand-set.
    pub fn recompute_subtotal(&mut self) {
        self.subtotal = self.price_per_unit.scale(self.weighed_quantity());
    }
}

/// A user's request to have categorized waste collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub id: PickupId,
    pub requester: PartyId,
    pub collector: Option<PartyId>,
    pub address: String,
    pub location: GeoPoint,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: PickupStatus,
    pub items: Vec<PickupItem>,
    pub total_weight: Option<Quantity>,
    pub total_price: Option<Money>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

/// Requester-provided fields for creating a pickup.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPickupRequest {
    pub address: String,
    pub location: GeoPoint,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<PickupItemDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupItemDraft {
    pub category: CategoryId,
    pub estimated_weight: Quantity,
}

/// Collector-confirmed scale reading for one item.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemWeight {
    pub item: u32,
    pub actual_weight: Quantity,
}
