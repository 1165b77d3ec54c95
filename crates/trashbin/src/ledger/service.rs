use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    EntryDraft, EntrySource, EntryType, HistoryPage, LedgerEntry, LedgerRef, PartyId, Stream,
};
use super::store::LedgerStore;
use crate::money::{Money, Quantity};
use crate::store::{StoreError, MAX_COMMIT_ATTEMPTS};

const HISTORY_PAGE_SIZE: u32 = 10;

/// Error raised by ledger writes and reads.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("amount sign does not match entry type")]
    SignMismatch,
    #[error("insufficient balance: have {balance}, attempted {amount}")]
    InsufficientBalance { balance: i64, amount: i64 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Converts a completed pickup's totals into awarded points.
///
/// The conversion rate is deployment configuration, not domain logic; the
/// lifecycle services only ever see this trait.
pub trait PointsPolicy: Send + Sync {
    fn points_for_pickup(&self, total_price: Money, total_weight: Quantity) -> i64;
}

/// Awards points proportional to the pickup's monetary value.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyRatePolicy {
    /// Points granted per 1000 minor currency units.
    pub points_per_thousand_minor: i64,
}

impl PointsPolicy for CurrencyRatePolicy {
    fn points_for_pickup(&self, total_price: Money, _total_weight: Quantity) -> i64 {
        let minor = total_price.minor() as i128;
        (minor * self.points_per_thousand_minor as i128 / 1000) as i64
    }
}

/// Awards a flat rate per kilogram collected, ignoring price.
#[derive(Debug, Clone, Copy)]
pub struct PerKgPolicy {
    pub points_per_kg: i64,
}

impl PointsPolicy for PerKgPolicy {
    fn points_for_pickup(&self, _total_price: Money, total_weight: Quantity) -> i64 {
        total_weight.hundredths() * self.points_per_kg / 100
    }
}

/// The single writer of balance-affecting events.
///
/// `record` is the only path that mutates a party's balance; everything else
/// in the crate goes through it.
pub struct LedgerService<S> {
    store: Arc<S>,
}

impl<S> LedgerService<S>
where
    S: LedgerStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Appends one entry, computing `balance_after` from the current tail.
    ///
    /// Earned entries must carry a positive amount and spent entries a
    /// negative one; a spend may never take the balance below zero. The
    /// read-check-commit cycle retries on lost optimistic writes so two
    /// concurrent records cannot drift the cached balance.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        party: &PartyId,
        stream: Stream,
        amount: i64,
        entry_type: EntryType,
        source: EntrySource,
        reference: Option<LedgerRef>,
        description: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let sign_ok = match entry_type {
            EntryType::Earned => amount > 0,
            EntryType::Spent => amount < 0,
        };
        if !sign_ok {
            return Err(LedgerError::SignMismatch);
        }

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let tail = self.store.tail(party, stream)?;
            let balance_after = tail.balance + amount;
            if entry_type == EntryType::Spent && balance_after < 0 {
                return Err(LedgerError::InsufficientBalance {
                    balance: tail.balance,
                    amount,
                });
            }

            let draft = EntryDraft {
                party: party.clone(),
                stream,
                amount,
                entry_type,
                source,
                reference: reference.clone(),
                description: description.to_string(),
                balance_after,
                recorded_at: Utc::now(),
            };
            match self.store.commit(draft, tail.version) {
                Ok(entry) => {
                    tracing::debug!(
                        party = %party.0,
                        stream = stream.label(),
                        amount,
                        balance_after,
                        "ledger entry recorded"
                    );
                    return Ok(entry);
                }
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// The cached balance: `balance_after` of the most recent entry.
    pub fn balance(&self, party: &PartyId, stream: Stream) -> Result<i64, LedgerError> {
        Ok(self.store.tail(party, stream)?.balance)
    }

    /// Reverse-chronological history, ties broken by entry id ascending.
    /// Pages are 1-based and restartable.
    pub fn history(
        &self,
        party: &PartyId,
        stream: Stream,
        page: u32,
    ) -> Result<HistoryPage, LedgerError> {
        let mut entries = self.store.entries(party, stream)?;
        entries.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then(a.id.cmp(&b.id))
        });

        let total = entries.len() as u64;
        let page = page.max(1);
        let start = (page as usize - 1) * HISTORY_PAGE_SIZE as usize;
        let page_entries = entries
            .into_iter()
            .skip(start)
            .take(HISTORY_PAGE_SIZE as usize)
            .collect();

        Ok(HistoryPage {
            entries: page_entries,
            page,
            per_page: HISTORY_PAGE_SIZE,
            total,
        })
    }
}
