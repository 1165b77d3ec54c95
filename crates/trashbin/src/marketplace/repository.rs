use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{Order, OrderId};
use crate::ledger::PartyId;
use crate::store::StoreError;

/// Storage abstraction for marketplace orders.
pub trait OrderRepository: Send + Sync {
    fn insert(&self, order: Order) -> Result<Order, StoreError>;
    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;
    fn update(&self, order: Order, expected_version: u64) -> Result<Order, StoreError>;
    fn list_for_buyer(&self, party: &PartyId) -> Result<Vec<Order>, StoreError>;
    fn list_for_seller(&self, party: &PartyId) -> Result<Vec<Order>, StoreError>;
}

/// In-memory repository used by tests and the default service wiring.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    records: Mutex<BTreeMap<OrderId, Order>>,
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: Order) -> Result<Order, StoreError> {
        let mut guard = self.records.lock().expect("order mutex poisoned");
        if guard.contains_key(&order.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let guard = self.records.lock().expect("order mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, mut order: Order, expected_version: u64) -> Result<Order, StoreError> {
        let mut guard = self.records.lock().expect("order mutex poisoned");
        let stored = guard.get(&order.id).ok_or(StoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        order.version = expected_version + 1;
        guard.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn list_for_buyer(&self, party: &PartyId) -> Result<Vec<Order>, StoreError> {
        let guard = self.records.lock().expect("order mutex poisoned");
        let mut orders: Vec<_> = guard
            .values()
            .filter(|order| &order.buyer == party)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn list_for_seller(&self, party: &PartyId) -> Result<Vec<Order>, StoreError> {
        let guard = self.records.lock().expect("order mutex poisoned");
        let mut orders: Vec<_> = guard
            .values()
            .filter(|order| &order.seller == party)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
