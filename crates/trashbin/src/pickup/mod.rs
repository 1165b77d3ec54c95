//! Pickup-request lifecycle: creation, collector assignment, progress
//! updates, weight confirmation, and the resulting points award.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    GeoPoint, ItemWeight, NewPickupRequest, PickupId, PickupItem, PickupItemDraft, PickupRequest,
    PickupStatus,
};
pub use repository::{InMemoryPickupRepository, PickupRepository};
pub use router::{pickup_router, PickupRouterState};
pub use service::{CompletedPickup, PickupError, PickupService};
