//! Data models for the EcoRide application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Named gazetteer entries and input roles
//! - User: Account data exposed by the session store
//! - Ride: Ride listings and per-user ride history

pub mod location;
pub mod ride;
pub mod user;

// Re-export all public types for convenient access
pub use location::{LocationRole, NamedLocation};
pub use ride::{Driver, Ride, RideHistoryEntry, RideKind};
pub use user::{ProfileUpdate, User};
