//! Core domain for a community waste-collection platform: households request
//! doorstep pickups of sorted recyclables, collectors weigh and complete them,
//! recovered material circulates through a second-hand marketplace, and every
//! point or cash movement lands on an append-only per-party ledger.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod marketplace;
pub mod money;
pub mod orchestrator;
pub mod pickup;
pub mod pricing;
pub mod store;
pub mod telemetry;
