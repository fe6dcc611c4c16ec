//! `EcoRide` - carpooling marketplace core
//!
//! This library provides carbon savings estimation for shared trips,
//! address matching against a fixed gazetteer, a mock session store and
//! the ride board, plus the HTTP API exposing them.

pub mod api;
pub mod config;
pub mod emissions;
pub mod error;
pub mod location_matcher;
pub mod models;
pub mod rides;
pub mod session;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use config::EcoRideConfig;
pub use emissions::{EmissionsResult, TripInput, VehicleType, estimate, estimate_str};
pub use error::EcoRideError;
pub use location_matcher::{LocationField, MatchOutcome, default_gazetteer, match_location, suggest};
pub use models::{LocationRole, NamedLocation, User};
pub use rides::RideBoard;
pub use session::{MockSessionStore, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EcoRideError>;
