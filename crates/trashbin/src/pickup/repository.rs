use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{PickupId, PickupRequest, PickupStatus};
use crate::ledger::PartyId;
use crate::store::StoreError;

/// Storage abstraction for pickup requests.
///
/// A request and its items are one record, so a guarded `update` commits
/// item weights, totals, and status as a single atomic unit.
pub trait PickupRepository: Send + Sync {
    fn insert(&self, request: PickupRequest) -> Result<PickupRequest, StoreError>;
    fn fetch(&self, id: &PickupId) -> Result<Option<PickupRequest>, StoreError>;
    fn update(
        &self,
        request: PickupRequest,
        expected_version: u64,
    ) -> Result<PickupRequest, StoreError>;
    fn list_for_requester(&self, party: &PartyId) -> Result<Vec<PickupRequest>, StoreError>;
    /// Unassigned requests, the collector-facing feed.
    fn list_pending(&self) -> Result<Vec<PickupRequest>, StoreError>;
}

/// In-memory repository used by tests and the default service wiring.
#[derive(Default)]
pub struct InMemoryPickupRepository {
    records: Mutex<BTreeMap<PickupId, PickupRequest>>,
}

impl PickupRepository for InMemoryPickupRepository {
    fn insert(&self, request: PickupRequest) -> Result<PickupRequest, StoreError> {
        let mut guard = self.records.lock().expect("pickup mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch(&self, id: &PickupId) -> Result<Option<PickupRequest>, StoreError> {
        let guard = self.records.lock().expect("pickup mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        mut request: PickupRequest,
        expected_version: u64,
    ) -> Result<PickupRequest, StoreError> {
        let mut guard = self.records.lock().expect("pickup mutex poisoned");
        let stored = guard.get(&request.id).ok_or(StoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        request.version = expected_version + 1;
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn list_for_requester(&self, party: &PartyId) -> Result<Vec<PickupRequest>, StoreError> {
        let guard = self.records.lock().expect("pickup mutex poisoned");
        let mut requests: Vec<_> = guard
            .values()
            .filter(|request| &request.requester == party)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    fn list_pending(&self) -> Result<Vec<PickupRequest>, StoreError> {
        let guard = self.records.lock().expect("pickup mutex poisoned");
        Ok(guard
            .values()
            .filter(|request| request.status == PickupStatus::Pending)
            .cloned()
            .collect())
    }
}
