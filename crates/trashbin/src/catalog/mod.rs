//! Reference data: waste categories and marketplace listings.

pub mod domain;
pub mod router;
pub mod store;

pub use domain::{
    CategoryId, CategoryUnit, ListingCondition, ListingId, ListingStatus, MarketplaceListing,
    NewListing, WasteCategory,
};
pub use router::{catalog_router, CatalogRouterState};
pub use store::{CategoryStore, InMemoryCatalog, ListingStore};
