use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::domain::{CategoryId, ListingId, ListingStatus, MarketplaceListing, WasteCategory};
use crate::money::Money;
use crate::store::StoreError;

/// Read-mostly storage for waste categories.
pub trait CategoryStore: Send + Sync {
    fn insert(&self, category: WasteCategory) -> Result<(), StoreError>;
    fn fetch(&self, id: &CategoryId) -> Result<Option<WasteCategory>, StoreError>;
    fn list(&self) -> Result<Vec<WasteCategory>, StoreError>;
    /// Reprices a category for future items; existing snapshots are untouched.
    fn set_price(&self, id: &CategoryId, price: Money) -> Result<(), StoreError>;
}

/// Storage for marketplace listings.
///
/// `update` is a compare-and-swap on the listing's `version`: the write is
/// refused with [`StoreError::VersionConflict`] unless the stored version
/// still matches, which is what keeps concurrent reservations honest.
pub trait ListingStore: Send + Sync {
    fn insert(&self, listing: MarketplaceListing) -> Result<MarketplaceListing, StoreError>;
    fn fetch(&self, id: &ListingId) -> Result<Option<MarketplaceListing>, StoreError>;
    fn list(&self) -> Result<Vec<MarketplaceListing>, StoreError>;
    fn list_open(&self, now: DateTime<Utc>) -> Result<Vec<MarketplaceListing>, StoreError>;
    fn update(
        &self,
        listing: MarketplaceListing,
        expected_version: u64,
    ) -> Result<MarketplaceListing, StoreError>;
}

/// In-memory catalog backing both storage traits.
#[derive(Default)]
pub struct InMemoryCatalog {
    categories: Mutex<BTreeMap<CategoryId, WasteCategory>>,
    listings: Mutex<BTreeMap<ListingId, MarketplaceListing>>,
}

impl CategoryStore for InMemoryCatalog {
    fn insert(&self, category: WasteCategory) -> Result<(), StoreError> {
        let mut guard = self.categories.lock().expect("catalog mutex poisoned");
        if guard.contains_key(&category.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(category.id.clone(), category);
        Ok(())
    }

    fn fetch(&self, id: &CategoryId) -> Result<Option<WasteCategory>, StoreError> {
        let guard = self.categories.lock().expect("catalog mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<WasteCategory>, StoreError> {
        let guard = self.categories.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn set_price(&self, id: &CategoryId, price: Money) -> Result<(), StoreError> {
        let mut guard = self.categories.lock().expect("catalog mutex poisoned");
        let category = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        category.price_per_unit = price;
        Ok(())
    }
}

impl ListingStore for InMemoryCatalog {
    fn insert(&self, listing: MarketplaceListing) -> Result<MarketplaceListing, StoreError> {
        let mut guard = self.listings.lock().expect("catalog mutex poisoned");
        if guard.contains_key(&listing.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn fetch(&self, id: &ListingId) -> Result<Option<MarketplaceListing>, StoreError> {
        let guard = self.listings.lock().expect("catalog mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<MarketplaceListing>, StoreError> {
        let guard = self.listings.lock().expect("catalog mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn list_open(&self, now: DateTime<Utc>) -> Result<Vec<MarketplaceListing>, StoreError> {
        let guard = self.listings.lock().expect("catalog mutex poisoned");
        Ok(guard
            .values()
            .filter(|listing| listing.effective_status(now) == ListingStatus::Available)
            .cloned()
            .collect())
    }

    fn update(
        &self,
        mut listing: MarketplaceListing,
        expected_version: u64,
    ) -> Result<MarketplaceListing, StoreError> {
        let mut guard = self.listings.lock().expect("catalog mutex poisoned");
        let stored = guard.get(&listing.id).ok_or(StoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        listing.version = expected_version + 1;
        guard.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }
}
