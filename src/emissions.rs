//! Carbon savings estimation for shared trips
//!
//! Converts a trip (distance, vehicle category, number of people in the car)
//! into the CO2 each person is responsible for, the CO2 avoided compared with
//! everybody driving alone, and how many trees would need a year to absorb
//! that avoided amount.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

use crate::{EcoRideError, Result};

/// One tree absorbs roughly 25 kg of CO2 per year
pub const TREE_ABSORPTION_GRAMS_PER_YEAR: f64 = 25_000.0;
pub const GRAMS_PER_KG: f64 = 1_000.0;

/// Trip distances accepted by the calculator
pub const DISTANCE_RANGE_KM: RangeInclusive<f64> = 1.0..=1000.0;
/// People in the car, driver included
pub const PASSENGER_RANGE: RangeInclusive<u32> = 1..=6;

/// Vehicle categories with a known emission factor
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VehicleType {
    Sedan,
    Suv,
    Hatchback,
    Minivan,
    Truck,
}

impl VehicleType {
    /// Grams of CO2 emitted per kilometer
    #[must_use]
    pub const fn emission_factor(self) -> f64 {
        match self {
            Self::Sedan => 120.0,
            Self::Suv => 180.0,
            Self::Hatchback => 110.0,
            Self::Minivan => 160.0,
            Self::Truck => 200.0,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Sedan,
            Self::Suv,
            Self::Hatchback,
            Self::Minivan,
            Self::Truck,
        ]
    }

    /// Parse a vehicle key such as `"sedan"` or `" SUV "`
    pub fn parse(value: &str) -> Result<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| EcoRideError::invalid_vehicle(value))
    }
}

impl Default for VehicleType {
    fn default() -> Self {
        Self::Sedan
    }
}

/// Outcome of a single estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsResult {
    /// CO2 each person in the car is responsible for
    pub per_person_emissions_kg: f64,
    /// CO2 avoided compared with everyone driving separately
    pub saved_emissions_kg: f64,
    /// Trees needed for a year to absorb the avoided CO2
    pub tree_equivalent: f64,
}

impl EmissionsResult {
    #[must_use]
    pub fn format_per_person(&self) -> String {
        format!("{:.2} kg", self.per_person_emissions_kg)
    }

    #[must_use]
    pub fn format_saved(&self) -> String {
        format!("{:.2} kg", self.saved_emissions_kg)
    }

    #[must_use]
    pub fn format_trees(&self) -> String {
        format!("{:.4}", self.tree_equivalent)
    }
}

/// Estimate per-person and saved emissions for one trip.
///
/// A passenger count of zero is treated as one so the per-person share is
/// always defined. Distance is used as given; range clamping belongs to
/// [`TripInput::clamped`].
#[must_use]
pub fn estimate(distance_km: f64, vehicle: VehicleType, passenger_count: u32) -> EmissionsResult {
    let passengers = f64::from(passenger_count.max(1));

    let total_grams = vehicle.emission_factor() * distance_km;
    let per_person_grams = total_grams / passengers;
    let saved_grams = total_grams - per_person_grams;

    debug!(
        %vehicle,
        distance_km,
        passengers,
        total_grams,
        saved_grams,
        "Estimated trip emissions"
    );

    EmissionsResult {
        per_person_emissions_kg: per_person_grams / GRAMS_PER_KG,
        saved_emissions_kg: saved_grams / GRAMS_PER_KG,
        tree_equivalent: saved_grams / TREE_ABSORPTION_GRAMS_PER_YEAR,
    }
}

/// String-keyed variant of [`estimate`] for callers holding raw form input
pub fn estimate_str(
    distance_km: f64,
    vehicle_type: &str,
    passenger_count: u32,
) -> Result<EmissionsResult> {
    let vehicle = VehicleType::parse(vehicle_type)?;
    Ok(estimate(distance_km, vehicle, passenger_count))
}

/// Calculator input after range clamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    pub distance_km: f64,
    pub vehicle: VehicleType,
    pub passenger_count: u32,
}

impl TripInput {
    /// Build an input with distance and passengers clamped to the calculator ranges
    #[must_use]
    pub fn clamped(distance_km: f64, vehicle: VehicleType, passenger_count: u32) -> Self {
        Self {
            distance_km: clamp_distance(distance_km),
            vehicle,
            passenger_count: passenger_count
                .clamp(*PASSENGER_RANGE.start(), *PASSENGER_RANGE.end()),
        }
    }

    #[must_use]
    pub fn estimate(&self) -> EmissionsResult {
        estimate(self.distance_km, self.vehicle, self.passenger_count)
    }
}

/// Clamp a distance to [`DISTANCE_RANGE_KM`]; NaN falls back to the minimum
#[must_use]
pub fn clamp_distance(distance_km: f64) -> f64 {
    if distance_km.is_nan() {
        return *DISTANCE_RANGE_KM.start();
    }
    distance_km.clamp(*DISTANCE_RANGE_KM.start(), *DISTANCE_RANGE_KM.end())
}
