use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    ItemWeight, NewPickupRequest, PickupId, PickupItem, PickupRequest, PickupStatus,
};
use super::repository::PickupRepository;
use crate::catalog::{CategoryId, CategoryStore};
use crate::ledger::{
    EntrySource, EntryType, LedgerEntry, LedgerError, LedgerRef, LedgerService, LedgerStore,
    PartyId, PointsPolicy, Stream,
};
use crate::pricing::{self, PricingError};
use crate::store::{StoreError, MAX_COMMIT_ATTEMPTS};

/// Error raised by the pickup lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum PickupError {
    #[error("pickup must contain at least one item")]
    EmptyItemList,
    #[error("category '{}' is unknown or inactive", .0 .0)]
    InvalidCategory(CategoryId),
    #[error("cancellation reason is required")]
    MissingReason,
    #[error("invalid transition from {} to {}", from.label(), to.label())]
    InvalidTransition {
        from: PickupStatus,
        to: PickupStatus,
    },
    #[error("item {0} has no confirmed weight")]
    MissingWeight(u32),
    #[error("item {0} does not belong to this pickup")]
    UnknownItem(u32),
    #[error("pickup request not found")]
    NotFound,
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a confirmed weighing: the terminal request plus the award.
#[derive(Debug)]
pub struct CompletedPickup {
    pub request: PickupRequest,
    pub points_earned: i64,
    pub ledger_entry: Option<LedgerEntry>,
}

static PICKUP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_pickup_id() -> PickupId {
    let id = PICKUP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PickupId(format!("pickup-{id:06}"))
}

/// State machine for pickup requests: creation, collector assignment,
/// weighing, completion, cancellation.
///
/// The only side effect beyond state updates is the single ledger credit on
/// completion.
pub struct PickupService<R, C, S> {
    repository: Arc<R>,
    categories: Arc<C>,
    ledger: Arc<LedgerService<S>>,
    points: Arc<dyn PointsPolicy>,
}

impl<R, C, S> PickupService<R, C, S>
where
    R: PickupRepository,
    C: CategoryStore,
    S: LedgerStore,
{
    pub fn new(
        repository: Arc<R>,
        categories: Arc<C>,
        ledger: Arc<LedgerService<S>>,
        points: Arc<dyn PointsPolicy>,
    ) -> Self {
        Self {
            repository,
            categories,
            ledger,
            points,
        }
    }

    /// Creates a `pending` request, snapshotting each item's price-per-unit
    /// and pricing the estimated weights.
    pub fn create(
        &self,
        requester: PartyId,
        input: NewPickupRequest,
    ) -> Result<PickupRequest, PickupError> {
        if input.items.is_empty() {
            return Err(PickupError::EmptyItemList);
        }

        let mut items = Vec::with_capacity(input.items.len());
        for (index, draft) in input.items.iter().enumerate() {
            let category = self
                .categories
                .fetch(&draft.category)?
                .filter(|category| category.active)
                .ok_or_else(|| PickupError::InvalidCategory(draft.category.clone()))?;
            let subtotal = pricing::price_item(&category, draft.estimated_weight)?;
            items.push(PickupItem {
                id: index as u32 + 1,
                category: category.id,
                estimated_weight: draft.estimated_weight,
                actual_weight: None,
                price_per_unit: category.price_per_unit,
                subtotal,
            });
        }

        let request = PickupRequest {
            id: next_pickup_id(),
            requester,
            collector: None,
            address: input.address,
            location: input.location,
            scheduled_at: input.scheduled_at,
            notes: input.notes,
            status: PickupStatus::Pending,
            items,
            total_weight: None,
            total_price: None,
            cancellation_reason: None,
            created_at: Utc::now(),
            version: 0,
        };

        Ok(self.repository.insert(request)?)
    }

    /// Assigns a collector; only a `pending` request can be claimed, and a
    /// lost race surfaces as the same `InvalidTransition` the late caller
    /// would have seen anyway.
    pub fn assign_collector(
        &self,
        id: &PickupId,
        collector: PartyId,
    ) -> Result<PickupRequest, PickupError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut request = self.repository.fetch(id)?.ok_or(PickupError::NotFound)?;
            if request.status != PickupStatus::Pending {
                return Err(PickupError::InvalidTransition {
                    from: request.status,
                    to: PickupStatus::Accepted,
                });
            }
            let version = request.version;
            request.collector = Some(collector.clone());
            request.status = PickupStatus::Accepted;
            match self.repository.update(request, version) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Moves the assigned collector's request one step along
    /// `accepted → on_the_way → picked_up`. Completion is reserved for
    /// [`PickupService::confirm_weights`].
    pub fn advance(
        &self,
        id: &PickupId,
        collector: &PartyId,
        next: PickupStatus,
    ) -> Result<PickupRequest, PickupError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut request = self.fetch_for_collector(id, collector)?;
            let allowed = matches!(next, PickupStatus::OnTheWay | PickupStatus::PickedUp)
                && request.status.next_in_line() == Some(next);
            if !allowed {
                return Err(PickupError::InvalidTransition {
                    from: request.status,
                    to: next,
                });
            }
            let version = request.version;
            request.status = next;
            match self.repository.update(request, version) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Confirms actual weights for every item, reprices them from their
    /// snapshots, completes the request, and credits the requester's points
    /// balance exactly once.
    pub fn confirm_weights(
        &self,
        id: &PickupId,
        collector: &PartyId,
        weights: &[ItemWeight],
    ) -> Result<CompletedPickup, PickupError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut request = self.fetch_for_collector(id, collector)?;
            if request.status != PickupStatus::PickedUp {
                return Err(PickupError::InvalidTransition {
                    from: request.status,
                    to: PickupStatus::Completed,
                });
            }

            let rollback = request.clone();
            for reading in weights {
                let item = request
                    .items
                    .iter_mut()
                    .find(|item| item.id == reading.item)
                    .ok_or(PickupError::UnknownItem(reading.item))?;
                // Validates positivity before the weight is written back.
                pricing::price_snapshot(item.price_per_unit, reading.actual_weight)?;
                item.actual_weight = Some(reading.actual_weight);
                item.recompute_subtotal();
            }
            if let Some(unweighed) = request.items.iter().find(|item| item.actual_weight.is_none())
            {
                return Err(PickupError::MissingWeight(unweighed.id));
            }

            let total_weight = request.items.iter().map(|item| item.weighed_quantity()).sum();
            let total_price = request.items.iter().map(|item| item.subtotal).sum();
            request.total_weight = Some(total_weight);
            request.total_price = Some(total_price);
            request.status = PickupStatus::Completed;

            let version = request.version;
            let stored = match self.repository.update(request, version) {
                Ok(stored) => stored,
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            };

            let points_earned = self.points.points_for_pickup(total_price, total_weight);
            // A failed credit unwinds the completion so the weighing can be
            // retried in full: the request and its ledger entry persist
            // together or not at all.
            let ledger_entry = match self.credit_requester(&stored, points_earned) {
                Ok(entry) => entry,
                Err(err) => {
                    if let Err(revert) = self.repository.update(rollback, stored.version) {
                        tracing::error!(
                            pickup = %stored.id.0,
                            error = %revert,
                            "completion rollback failed"
                        );
                    }
                    return Err(err.into());
                }
            };
            tracing::info!(
                pickup = %stored.id.0,
                total_price = %total_price,
                points_earned,
                "pickup completed"
            );
            return Ok(CompletedPickup {
                request: stored,
                points_earned,
                ledger_entry,
            });
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Cancels a non-terminal request; the reason is mandatory and no ledger
    /// entry is produced.
    pub fn cancel(
        &self,
        id: &PickupId,
        party: &PartyId,
        reason: &str,
    ) -> Result<PickupRequest, PickupError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PickupError::MissingReason);
        }

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let mut request = self.repository.fetch(id)?.ok_or(PickupError::NotFound)?;
            let involved = &request.requester == party || request.collector.as_ref() == Some(party);
            if !involved {
                return Err(PickupError::NotFound);
            }
            if request.status.is_terminal() {
                return Err(PickupError::InvalidTransition {
                    from: request.status,
                    to: PickupStatus::Cancelled,
                });
            }
            let version = request.version;
            request.status = PickupStatus::Cancelled;
            request.cancellation_reason = Some(reason.to_string());
            match self.repository.update(request, version) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::VersionConflict) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(StoreError::VersionConflict.into())
    }

    /// Fetches a request visible to `party` (its requester or collector).
    pub fn get_for(&self, id: &PickupId, party: &PartyId) -> Result<PickupRequest, PickupError> {
        let request = self.repository.fetch(id)?.ok_or(PickupError::NotFound)?;
        let involved = &request.requester == party || request.collector.as_ref() == Some(party);
        if !involved {
            return Err(PickupError::NotFound);
        }
        Ok(request)
    }

    pub fn list_for_requester(&self, party: &PartyId) -> Result<Vec<PickupRequest>, PickupError> {
        Ok(self.repository.list_for_requester(party)?)
    }

    /// The collector-facing feed of unclaimed requests.
    pub fn list_pending(&self) -> Result<Vec<PickupRequest>, PickupError> {
        Ok(self.repository.list_pending()?)
    }

    fn fetch_for_collector(
        &self,
        id: &PickupId,
        collector: &PartyId,
    ) -> Result<PickupRequest, PickupError> {
        let request = self.repository.fetch(id)?.ok_or(PickupError::NotFound)?;
        if request.collector.as_ref() != Some(collector) {
            return Err(PickupError::NotFound);
        }
        Ok(request)
    }

    fn credit_requester(
        &self,
        request: &PickupRequest,
        points_earned: i64,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        if points_earned <= 0 {
            return Ok(None);
        }
        let entry = self.ledger.record(
            &request.requester,
            Stream::Points,
            points_earned,
            EntryType::Earned,
            EntrySource::PickupCompleted,
            Some(LedgerRef::Pickup(request.id.clone())),
            "Points earned from completed pickup",
        )?;
        Ok(Some(entry))
    }
}
