use std::sync::Arc;

use crate::ledger::domain::{EntrySource, EntryType, LedgerEntry, PartyId, Stream};
use crate::ledger::service::{LedgerError, LedgerService};
use crate::ledger::store::InMemoryLedger;

pub(super) fn service() -> LedgerService<InMemoryLedger> {
    LedgerService::new(Arc::new(InMemoryLedger::default()))
}

pub(super) fn party(name: &str) -> PartyId {
    PartyId(name.to_string())
}

pub(super) fn earn(
    service: &LedgerService<InMemoryLedger>,
    party: &PartyId,
    stream: Stream,
    amount: i64,
) -> Result<LedgerEntry, LedgerError> {
    service.record(
        party,
        stream,
        amount,
        EntryType::Earned,
        EntrySource::Bonus,
        None,
        "test credit",
    )
}

pub(super) fn spend(
    service: &LedgerService<InMemoryLedger>,
    party: &PartyId,
    stream: Stream,
    amount: i64,
) -> Result<LedgerEntry, LedgerError> {
    service.record(
        party,
        stream,
        amount,
        EntryType::Spent,
        EntrySource::Redeem,
        None,
        "test debit",
    )
}
