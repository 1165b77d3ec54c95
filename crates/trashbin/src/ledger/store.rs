use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{BalanceSnapshot, EntryDraft, EntryId, LedgerEntry, PartyId, Stream};
use crate::store::StoreError;

/// Append-only persistence for ledger entries.
///
/// `commit` is the single atomic bookkeeping step: it appends the entry and
/// advances the party's cached balance in one guarded operation,
/// refusing the write when `expected_version` no longer matches the stream's
/// entry count. The cached balance is therefore always the `balance_after`
/// of the most recent entry.
pub trait LedgerStore: Send + Sync {
    fn tail(&self, party: &PartyId, stream: Stream) -> Result<BalanceSnapshot, StoreError>;
    fn commit(&self, draft: EntryDraft, expected_version: u64) -> Result<LedgerEntry, StoreError>;
    /// All entries for a party's stream, ascending by entry id.
    fn entries(&self, party: &PartyId, stream: Stream) -> Result<Vec<LedgerEntry>, StoreError>;
}

#[derive(Default)]
struct LedgerCells {
    next_id: u64,
    streams: BTreeMap<(PartyId, Stream), Vec<LedgerEntry>>,
}

/// In-memory ledger; one mutex serializes every read-modify-write.
#[derive(Default)]
pub struct InMemoryLedger {
    cells: Mutex<LedgerCells>,
}

impl LedgerStore for InMemoryLedger {
    fn tail(&self, party: &PartyId, stream: Stream) -> Result<BalanceSnapshot, StoreError> {
        let cells = self.cells.lock().expect("ledger mutex poisoned");
        let snapshot = cells
            .streams
            .get(&(party.clone(), stream))
            .map(|entries| BalanceSnapshot {
                balance: entries.last().map_or(0, |entry| entry.balance_after),
                version: entries.len() as u64,
            })
            .unwrap_or_default();
        Ok(snapshot)
    }

    fn commit(&self, draft: EntryDraft, expected_version: u64) -> Result<LedgerEntry, StoreError> {
        let mut cells = self.cells.lock().expect("ledger mutex poisoned");
        let key = (draft.party.clone(), draft.stream);
        let current = cells.streams.get(&key).map_or(0, |entries| entries.len() as u64);
        if current != expected_version {
            return Err(StoreError::VersionConflict);
        }
        cells.next_id += 1;
        let id = EntryId(cells.next_id);
        let entry = LedgerEntry {
            id,
            party: draft.party,
            stream: draft.stream,
            amount: draft.amount,
            entry_type: draft.entry_type,
            source: draft.source,
            reference: draft.reference,
            description: draft.description,
            balance_after: draft.balance_after,
            recorded_at: draft.recorded_at,
        };
        cells.streams.entry(key).or_default().push(entry.clone());
        Ok(entry)
    }

    fn entries(&self, party: &PartyId, stream: Stream) -> Result<Vec<LedgerEntry>, StoreError> {
        let cells = self.cells.lock().expect("ledger mutex poisoned");
        Ok(cells
            .streams
            .get(&(party.clone(), stream))
            .cloned()
            .unwrap_or_default())
    }
}
