use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::PartyId;
use crate::money::{Money, Quantity};

/// Identifier wrapper for waste categories.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

/// Identifier wrapper for marketplace listings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Unit of measure a category is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryUnit {
    Mass,
    Count,
    Volume,
}

impl CategoryUnit {
    pub const fn label(self) -> &'static str {
        match self {
            CategoryUnit::Mass => "kg",
            CategoryUnit::Count => "pcs",
            CategoryUnit::Volume => "liter",
        }
    }
}

/// Reference data for one recyclable waste category.
///
/// `price_per_unit` is advisory for future items only: priced pickup items
/// snapshot it at creation time and never see later edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteCategory {
    pub id: CategoryId,
    pub name: String,
    pub unit: CategoryUnit,
    pub price_per_unit: Money,
    pub active: bool,
}

/// Physical condition declared by the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingCondition {
    Clean,
    NeedsCleaning,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Available,
    Reserved,
    Sold,
    Expired,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Reserved => "reserved",
            ListingStatus::Sold => "sold",
            ListingStatus::Expired => "expired",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ListingStatus::Sold | ListingStatus::Expired)
    }
}

/// A seller's offer of recyclable material.
///
/// `version` guards optimistic updates to `quantity`/`status`; `expires_at`
/// is enforced through [`MarketplaceListing::effective_status`] rather than a
/// write at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub id: ListingId,
    pub seller: PartyId,
    pub category: CategoryId,
    pub title: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub condition: ListingCondition,
    pub status: ListingStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl MarketplaceListing {
    /// Status with expiry applied: once `now` passes `expires_at` a listing
    /// that is not already sold reads as expired, whatever is stored.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ListingStatus {
        if self.status == ListingStatus::Sold {
            return self.status;
        }
        if now >= self.expires_at {
            return ListingStatus::Expired;
        }
        self.status
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ListingStatus::Available
    }
}

/// Seller-provided fields for publishing a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub category: CategoryId,
    pub title: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub condition: ListingCondition,
}
