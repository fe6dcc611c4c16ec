//! Ride listings and ride history

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::NamedLocation;

/// Public driver summary shown on a listing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Driver {
    pub name: String,
    pub rating: f32,
    pub trips: u32,
}

/// A ride offered on the board
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: String,
    pub driver: Driver,
    pub source: NamedLocation,
    pub destination: NamedLocation,
    pub date: NaiveDate,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    /// Free seats
    pub seats: u8,
    /// Price per seat in INR
    pub price: u32,
    pub carbon_saved_kg: f64,
    /// Account that offered the ride, if it was offered through the board
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RideKind {
    Offered,
    Booked,
}

/// One line in a user's ride history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideHistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RideKind,
    pub source: String,
    pub destination: String,
    pub date: NaiveDate,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
    /// Passengers that joined an offered ride
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passengers: Option<u8>,
    /// Driver name for a booked ride
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    pub carbon_saved_kg: f64,
}

impl From<&Ride> for RideHistoryEntry {
    fn from(ride: &Ride) -> Self {
        Self {
            id: ride.id.clone(),
            kind: RideKind::Offered,
            source: ride.source.address.clone(),
            destination: ride.destination.address.clone(),
            date: ride.date,
            time: ride.time,
            passengers: Some(0),
            driver: None,
            carbon_saved_kg: ride.carbon_saved_kg,
        }
    }
}

/// `HH:MM` wire format for ride times
pub mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
    }
}
