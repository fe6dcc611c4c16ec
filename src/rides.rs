//! Ride board
//!
//! Holds the listed rides and each user's ride history, validates new ride
//! offers and works out how much CO2 an offered ride saves.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emissions::{TripInput, VehicleType};
use crate::location_matcher::{self, default_gazetteer};
use crate::models::ride::hour_minute;
use crate::models::{Driver, NamedLocation, Ride, RideHistoryEntry, RideKind, User};
use crate::{EcoRideError, Result};

pub const SEAT_RANGE: RangeInclusive<u8> = 1..=6;
pub const DEFAULT_SEATS: u8 = 2;
/// Price per seat in INR
pub const DEFAULT_PRICE: u32 = 500;
pub const MAX_PRICE: u32 = 2000;
pub const PRICE_STEP: u32 = 50;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A ride as submitted from the offer form. Everything is optional so that
/// missing fields surface as validation messages rather than decode errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOffer {
    pub source: Option<NamedLocation>,
    pub destination: Option<NamedLocation>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub seats: Option<u8>,
    pub price: Option<u32>,
    pub vehicle: Option<VehicleType>,
}

/// Search criteria for listed rides; unset fields match everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RideFilter {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

impl RideFilter {
    fn accepts(&self, ride: &Ride) -> bool {
        let source_ok = self
            .source
            .as_deref()
            .is_none_or(|address| ride.source.same_address(address));
        let destination_ok = self
            .destination
            .as_deref()
            .is_none_or(|address| ride.destination.same_address(address));
        let date_ok = self.date.is_none_or(|date| ride.date == date);
        source_ok && destination_ok && date_ok
    }
}

/// A user's rides split around "today"
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MyRides {
    /// Soonest first
    pub upcoming: Vec<RideHistoryEntry>,
    /// Most recent first
    pub past: Vec<RideHistoryEntry>,
}

#[derive(Debug, Default)]
pub struct RideBoard {
    rides: Vec<Ride>,
    history: HashMap<String, Vec<RideHistoryEntry>>,
}

impl RideBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Board seeded with the sample listings and the demo user's history
    #[must_use]
    pub fn with_mock_rides() -> Self {
        let place = |address: &str| {
            default_gazetteer()
                .iter()
                .find(|location| location.address == address)
                .cloned()
                .unwrap_or_else(|| NamedLocation::new(address, 0.0, 0.0))
        };
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
        let driver = |name: &str, rating, trips| Driver {
            name: name.to_string(),
            rating,
            trips,
        };

        let rides = vec![
            Ride {
                id: "1".to_string(),
                driver: driver("John D.", 4.8, 42),
                source: place("Central Park, New York"),
                destination: place("Brooklyn Bridge, New York"),
                date: day(2023, 8, 15),
                time: at(8, 30),
                seats: 3,
                price: 12,
                carbon_saved_kg: 4.3,
                driver_id: None,
            },
            Ride {
                id: "2".to_string(),
                driver: driver("Sarah M.", 4.9, 78),
                source: place("Times Square, New York"),
                destination: place("Grand Central Terminal, New York"),
                date: day(2023, 8, 15),
                time: at(9, 15),
                seats: 2,
                price: 8,
                carbon_saved_kg: 2.1,
                driver_id: None,
            },
            Ride {
                id: "3".to_string(),
                driver: driver("Michael R.", 4.7, 23),
                source: place("Central Park, New York"),
                destination: place("Grand Central Terminal, New York"),
                date: day(2023, 8, 16),
                time: at(10, 0),
                seats: 4,
                price: 15,
                carbon_saved_kg: 5.2,
                driver_id: None,
            },
        ];

        let demo_history = vec![
            RideHistoryEntry {
                id: "1".to_string(),
                kind: RideKind::Offered,
                source: "Central Park, New York".to_string(),
                destination: "Brooklyn Bridge, New York".to_string(),
                date: day(2023, 7, 25),
                time: at(8, 30),
                passengers: Some(2),
                driver: None,
                carbon_saved_kg: 3.2,
            },
            RideHistoryEntry {
                id: "2".to_string(),
                kind: RideKind::Booked,
                source: "Times Square, New York".to_string(),
                destination: "Grand Central Terminal, New York".to_string(),
                date: day(2023, 7, 20),
                time: at(9, 15),
                passengers: None,
                driver: Some("Sarah M.".to_string()),
                carbon_saved_kg: 1.8,
            },
        ];

        Self {
            rides,
            history: HashMap::from([("1".to_string(), demo_history)]),
        }
    }

    #[must_use]
    pub fn rides(&self) -> &[Ride] {
        &self.rides
    }

    /// Listed rides matching the filter, in listing order
    #[must_use]
    pub fn search(&self, filter: &RideFilter) -> Vec<&Ride> {
        let found: Vec<&Ride> = self.rides.iter().filter(|ride| filter.accepts(ride)).collect();
        debug!("{} of {} rides match {:?}", found.len(), self.rides.len(), filter);
        found
    }

    /// Validate an offer and list it under `driver`'s name
    #[tracing::instrument(level = "debug", skip(self, driver), fields(driver = %driver.id))]
    pub fn offer_ride(&mut self, driver: &User, offer: RideOffer, today: NaiveDate) -> Result<&Ride> {
        let (Some(source), Some(destination)) = (offer.source, offer.destination) else {
            return Err(EcoRideError::validation(
                "Please select both pickup and drop-off locations",
            ));
        };
        let (Some(date), Some(time)) = (
            offer.date.filter(|d| !d.trim().is_empty()),
            offer.time.filter(|t| !t.trim().is_empty()),
        ) else {
            return Err(EcoRideError::validation(
                "Please select both date and time for your ride",
            ));
        };

        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| {
            EcoRideError::validation(format!("'{date}' is not a valid date (expected YYYY-MM-DD)"))
        })?;
        let time = NaiveTime::parse_from_str(time.trim(), hour_minute::FORMAT).map_err(|_| {
            EcoRideError::validation(format!("'{time}' is not a valid time (expected HH:MM)"))
        })?;
        if date < today {
            return Err(EcoRideError::validation("Ride date cannot be in the past"));
        }
        if source.same_address(&destination.address) {
            return Err(EcoRideError::validation(
                "Pickup and drop-off locations must be different",
            ));
        }

        let seats = offer
            .seats
            .unwrap_or(DEFAULT_SEATS)
            .clamp(*SEAT_RANGE.start(), *SEAT_RANGE.end());
        let price = snap_price(offer.price.unwrap_or(DEFAULT_PRICE));
        let vehicle = offer.vehicle.unwrap_or_default();
        let carbon_saved_kg = carbon_saved_kg(&source, &destination, vehicle, seats);

        let ride = Ride {
            id: (self.rides.len() + 1).to_string(),
            driver: Driver {
                name: driver.name.clone(),
                rating: 0.0,
                trips: 0,
            },
            source,
            destination,
            date,
            time,
            seats,
            price,
            carbon_saved_kg,
            driver_id: Some(driver.id.clone()),
        };
        info!(
            "Ride {} offered: {} -> {} on {}",
            ride.id, ride.source.address, ride.destination.address, ride.date
        );

        self.rides.push(ride);
        let index = self.rides.len() - 1;
        Ok(&self.rides[index])
    }

    /// Rides offered or booked by `user`, split into upcoming and past
    #[must_use]
    pub fn my_rides(&self, user: &User, today: NaiveDate) -> MyRides {
        let offered = self
            .rides
            .iter()
            .filter(|ride| ride.driver_id.as_deref() == Some(user.id.as_str()))
            .map(RideHistoryEntry::from);
        let recorded = self.history.get(&user.id).into_iter().flatten().cloned();

        let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
            offered.chain(recorded).partition(|entry| entry.date >= today);

        upcoming.sort_by_key(|entry| (entry.date, entry.time));
        past.sort_by_key(|entry| std::cmp::Reverse((entry.date, entry.time)));

        MyRides { upcoming, past }
    }
}

/// Clamp to `0..=MAX_PRICE` and round to the nearest `PRICE_STEP`
#[must_use]
pub fn snap_price(price: u32) -> u32 {
    let clamped = price.min(MAX_PRICE);
    ((clamped + PRICE_STEP / 2) / PRICE_STEP * PRICE_STEP).min(MAX_PRICE)
}

/// CO2 saved by filling every seat compared with each occupant driving alone,
/// rounded to one decimal. Occupants (seats plus the driver) are capped like
/// any other calculator input.
#[must_use]
pub fn carbon_saved_kg(
    source: &NamedLocation,
    destination: &NamedLocation,
    vehicle: VehicleType,
    seats: u8,
) -> f64 {
    let distance = location_matcher::distance_km(source, destination);
    let saved = TripInput::clamped(distance, vehicle, u32::from(seats) + 1)
        .estimate()
        .saved_emissions_kg;
    (saved * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            name: format!("Driver {id}"),
            profile_picture: None,
        }
    }

    fn place(address: &str) -> NamedLocation {
        default_gazetteer()
            .iter()
            .find(|l| l.address == address)
            .cloned()
            .unwrap()
    }

    fn offer() -> RideOffer {
        RideOffer {
            source: Some(place("Pune, Maharashtra, India")),
            destination: Some(place("Mumbai, Maharashtra, India")),
            date: Some("2024-03-10".to_string()),
            time: Some("07:45".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_search_without_filter_returns_all() {
        let board = RideBoard::with_mock_rides();
        let ids: Vec<&str> = board
            .search(&RideFilter::default())
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_search_by_source_and_date() {
        let board = RideBoard::with_mock_rides();
        let filter = RideFilter {
            source: Some("central park, new york".to_string()),
            ..Default::default()
        };
        assert_eq!(board.search(&filter).len(), 2);

        let filter = RideFilter {
            source: Some("Central Park, New York".to_string()),
            date: NaiveDate::from_ymd_opt(2023, 8, 16),
            ..Default::default()
        };
        let found = board.search(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].driver.name, "Michael R.");
    }

    #[test]
    fn test_offer_ride_with_defaults() {
        let mut board = RideBoard::with_mock_rides();
        let ride = board.offer_ride(&user("7"), offer(), today()).unwrap().clone();

        assert_eq!(ride.id, "4");
        assert_eq!(ride.seats, DEFAULT_SEATS);
        assert_eq!(ride.price, DEFAULT_PRICE);
        assert_eq!(ride.driver.name, "Driver 7");
        assert_eq!(ride.time, NaiveTime::from_hms_opt(7, 45, 0).unwrap());
        assert!(ride.carbon_saved_kg > 0.0);
        assert_eq!(board.rides().len(), 4);
    }

    #[rstest]
    #[case(RideOffer { source: None, ..offer() }, "pickup and drop-off")]
    #[case(RideOffer { destination: None, ..offer() }, "pickup and drop-off")]
    #[case(RideOffer { date: None, ..offer() }, "date and time")]
    #[case(RideOffer { time: Some(" ".to_string()), ..offer() }, "date and time")]
    #[case(RideOffer { date: Some("10/03/2024".to_string()), ..offer() }, "not a valid date")]
    #[case(RideOffer { time: Some("7pm".to_string()), ..offer() }, "not a valid time")]
    #[case(RideOffer { date: Some("2024-02-28".to_string()), ..offer() }, "in the past")]
    #[case(RideOffer { destination: Some(place("Pune, Maharashtra, India")), ..offer() }, "must be different")]
    fn test_offer_validation(#[case] offer: RideOffer, #[case] expected: &str) {
        let mut board = RideBoard::new();
        let err = board.offer_ride(&user("7"), offer, today()).unwrap_err();
        assert!(matches!(err, EcoRideError::Validation { .. }));
        assert!(err.to_string().contains(expected), "{err}");
        assert!(board.rides().is_empty());
    }

    #[test]
    fn test_offer_clamps_seats_and_price() {
        let mut board = RideBoard::new();
        let ride = board
            .offer_ride(
                &user("7"),
                RideOffer {
                    seats: Some(12),
                    price: Some(9_999),
                    ..offer()
                },
                today(),
            )
            .unwrap();
        assert_eq!(ride.seats, 6);
        assert_eq!(ride.price, MAX_PRICE);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(24, 0)]
    #[case(25, 50)]
    #[case(510, 500)]
    #[case(1_990, 2_000)]
    #[case(5_000, 2_000)]
    fn test_snap_price(#[case] raw: u32, #[case] expected: u32) {
        assert_eq!(snap_price(raw), expected);
    }

    #[test]
    fn test_carbon_saved_uses_estimator() {
        let source = place("Times Square, New York");
        let destination = place("Times Square, New York");
        // Same spot clamps to the 1 km minimum: 120 g/km, 3 people -> 80 g saved
        assert_eq!(
            carbon_saved_kg(&source, &destination, VehicleType::Sedan, 2),
            0.1
        );
    }

    #[rstest]
    #[case(5, 12.0)]
    #[case(6, 12.0)]
    fn test_carbon_saved_caps_occupants(#[case] seats: u8, #[case] expected: f64) {
        let saved = carbon_saved_kg(
            &place("Pune, Maharashtra, India"),
            &place("Mumbai, Maharashtra, India"),
            VehicleType::Sedan,
            seats,
        );
        assert_eq!(saved, expected);
    }

    #[test]
    fn test_my_rides_splits_history() {
        let mut board = RideBoard::with_mock_rides();
        let demo = user("1");
        board.offer_ride(&demo, offer(), today()).unwrap();

        let mine = board.my_rides(&demo, today());
        assert_eq!(mine.upcoming.len(), 1);
        assert_eq!(mine.upcoming[0].kind, RideKind::Offered);
        let past_dates: Vec<String> = mine.past.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(past_dates, ["2023-07-25", "2023-07-20"]);

        assert_eq!(board.my_rides(&user("9"), today()), MyRides::default());
    }
}
