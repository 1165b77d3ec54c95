//! The append-only points/cash ledger and its single-writer service.

pub mod domain;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    BalanceSnapshot, EntryDraft, EntryId, EntrySource, EntryType, HistoryPage, LedgerEntry,
    LedgerRef, PartyId, Stream,
};
pub use router::{ledger_router, LedgerRouterState};
pub use service::{CurrencyRatePolicy, LedgerError, LedgerService, PerKgPolicy, PointsPolicy};
pub use store::{InMemoryLedger, LedgerStore};
