use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::domain::OrderId;
use crate::pickup::domain::PickupId;

/// Identifier for any actor holding a ledger balance: requester, collector,
/// buyer, or seller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(pub String);

/// Store-assigned, strictly increasing entry identifier; the history
/// tie-breaker for entries recorded in the same instant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

/// The two balance streams. Modeled identically, never mixed: points earned
/// from pickups cannot offset cash owed from sales.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Points,
    Cash,
}

impl Stream {
    pub const fn label(self) -> &'static str {
        match self {
            Stream::Points => "points",
            Stream::Cash => "cash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Earned,
    Spent,
}

impl EntryType {
    pub const fn label(self) -> &'static str {
        match self {
            EntryType::Earned => "earned",
            EntryType::Spent => "spent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    PickupCompleted,
    ItemSold,
    Redeem,
    Bonus,
    Adjustment,
}

/// Tagged reference to the unit of work that produced an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LedgerRef {
    Pickup(PickupId),
    Order(OrderId),
    Reward(u32),
}

/// One immutable, balance-affecting event. Entries are append-only;
/// corrections are new entries with `source = Adjustment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub party: PartyId,
    pub stream: Stream,
    /// Signed amount: minor currency units on the cash stream, whole points
    /// on the points stream.
    pub amount: i64,
    pub entry_type: EntryType,
    pub source: EntrySource,
    pub reference: Option<LedgerRef>,
    pub description: String,
    /// The party's stream balance immediately after this entry applied.
    pub balance_after: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Entry fields the service computes; the store assigns the id on commit.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub party: PartyId,
    pub stream: Stream,
    pub amount: i64,
    pub entry_type: EntryType,
    pub source: EntrySource,
    pub reference: Option<LedgerRef>,
    pub description: String,
    pub balance_after: i64,
    pub recorded_at: DateTime<Utc>,
}

/// A party's ledger tail: the cached balance and the entry count used as the
/// optimistic-commit guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub balance: i64,
    pub version: u64,
}

/// One page of reverse-chronological history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<LedgerEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}
