//! Location Matching Module
//!
//! Resolves free-text address queries against a fixed gazetteer of named
//! places. Matching is case-insensitive: a full-string match wins, otherwise
//! substring containment decides between a unique hit, an ambiguous list that
//! the user has to pick from, or nothing at all.

use haversine::{Location as HaversineLocation, Units, distance};
use serde::Serialize;
use tracing::debug;

use crate::models::{LocationRole, NamedLocation};
use crate::{EcoRideError, Result};

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a location to search";
pub const NOT_FOUND_MESSAGE: &str = "Try searching for a major city or landmark";

const GAZETTEER: [(&str, f64, f64); 16] = [
    ("Mumbai, Maharashtra, India", 19.076, 72.8777),
    ("Delhi, India", 28.7041, 77.1025),
    ("Bangalore, Karnataka, India", 12.9716, 77.5946),
    ("Chennai, Tamil Nadu, India", 13.0827, 80.2707),
    ("Kolkata, West Bengal, India", 22.5726, 88.3639),
    ("Hyderabad, Telangana, India", 17.385, 78.4867),
    ("Pune, Maharashtra, India", 18.5204, 73.8567),
    ("Jaipur, Rajasthan, India", 26.9124, 75.7873),
    ("Central Park, New York", 40.785091, -73.968285),
    ("Brooklyn Bridge, New York", 40.7061, -73.9969),
    ("Times Square, New York", 40.7580, -73.9855),
    ("Grand Central Terminal, New York", 40.7527, -73.9772),
    ("London, United Kingdom", 51.5074, -0.1278),
    ("Paris, France", 48.8566, 2.3522),
    ("Tokyo, Japan", 35.6762, 139.6503),
    ("Sydney, Australia", -33.8688, 151.2093),
];

static DEFAULT_GAZETTEER: std::sync::LazyLock<Vec<NamedLocation>> =
    std::sync::LazyLock::new(|| {
        GAZETTEER
            .iter()
            .map(|&(address, lat, lng)| NamedLocation::new(address, lat, lng))
            .collect()
    });

/// The built-in gazetteer used by the map picker
#[must_use]
pub fn default_gazetteer() -> &'static [NamedLocation] {
    &DEFAULT_GAZETTEER
}

/// Result of matching one query against a gazetteer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "locations", rename_all = "snake_case")]
pub enum MatchOutcome<'a> {
    Exact(&'a NamedLocation),
    Unique(&'a NamedLocation),
    /// Two or more candidates, in gazetteer order
    Ambiguous(Vec<&'a NamedLocation>),
    NotFound,
}

impl<'a> MatchOutcome<'a> {
    /// The location to select without asking the user, if any
    #[must_use]
    pub fn resolved(&self) -> Option<&'a NamedLocation> {
        match self {
            MatchOutcome::Exact(location) | MatchOutcome::Unique(location) => Some(*location),
            MatchOutcome::Ambiguous(_) | MatchOutcome::NotFound => None,
        }
    }
}

/// Match a free-text query against the gazetteer
#[must_use]
pub fn match_location<'a>(query: &str, gazetteer: &'a [NamedLocation]) -> MatchOutcome<'a> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        debug!("Empty location query");
        return MatchOutcome::NotFound;
    }

    let exact: Vec<&NamedLocation> = gazetteer
        .iter()
        .filter(|location| location.address.to_lowercase() == needle)
        .collect();
    if let &[location] = exact.as_slice() {
        debug!("Exact match for '{}': {}", query, location.address);
        return MatchOutcome::Exact(location);
    }

    let mut candidates = contains(&needle, gazetteer);
    debug!("{} candidates for '{}'", candidates.len(), query);

    match candidates.len() {
        0 => MatchOutcome::NotFound,
        1 => MatchOutcome::Unique(candidates.remove(0)),
        _ => MatchOutcome::Ambiguous(candidates),
    }
}

/// Type-ahead suggestions; an empty query lists the whole gazetteer
#[must_use]
pub fn suggest<'a>(query: &str, gazetteer: &'a [NamedLocation]) -> Vec<&'a NamedLocation> {
    contains(&query.trim().to_lowercase(), gazetteer)
}

fn contains<'a>(needle: &str, gazetteer: &'a [NamedLocation]) -> Vec<&'a NamedLocation> {
    gazetteer
        .iter()
        .filter(|location| location.address.to_lowercase().contains(needle))
        .collect()
}

/// Great-circle distance between two locations in kilometers
#[must_use]
pub fn distance_km(from: &NamedLocation, to: &NamedLocation) -> f64 {
    let from = HaversineLocation {
        latitude: from.latitude,
        longitude: from.longitude,
    };
    let to = HaversineLocation {
        latitude: to.latitude,
        longitude: to.longitude,
    };
    distance(from, to, Units::Kilometers)
}

/// Where an address input currently stands
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "locations", rename_all = "snake_case")]
pub enum FieldState {
    Idle,
    Typing,
    /// Waiting for the user to pick one candidate
    Ambiguous(Vec<NamedLocation>),
    NotFound,
    Selected(NamedLocation),
}

/// One address input (source or destination) and its match state
#[derive(Debug, Clone)]
pub struct LocationField {
    role: LocationRole,
    query: String,
    state: FieldState,
    message: Option<String>,
}

impl LocationField {
    #[must_use]
    pub fn new(role: LocationRole) -> Self {
        Self {
            role,
            query: String::new(),
            state: FieldState::Idle,
            message: None,
        }
    }

    #[must_use]
    pub fn role(&self) -> LocationRole {
        self.role
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn state(&self) -> &FieldState {
        &self.state
    }

    /// Validation or "not found" message to show next to the input
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NamedLocation> {
        match &self.state {
            FieldState::Selected(location) => Some(location),
            _ => None,
        }
    }

    /// Replace the query text. Any previous selection is dropped.
    pub fn edit<S: Into<String>>(&mut self, text: S) {
        self.query = text.into();
        self.message = None;
        self.state = if self.query.is_empty() {
            FieldState::Idle
        } else {
            FieldState::Typing
        };
    }

    /// Run the matcher on the current query and advance the state
    pub fn search(&mut self, gazetteer: &[NamedLocation]) -> &FieldState {
        if self.query.trim().is_empty() {
            self.state = FieldState::NotFound;
            self.message = Some(EMPTY_QUERY_MESSAGE.to_string());
            return &self.state;
        }

        match match_location(&self.query, gazetteer) {
            MatchOutcome::Exact(location) | MatchOutcome::Unique(location) => {
                self.select(location.clone());
            }
            MatchOutcome::Ambiguous(candidates) => {
                self.message = None;
                self.state =
                    FieldState::Ambiguous(candidates.into_iter().cloned().collect());
            }
            MatchOutcome::NotFound => {
                self.message = Some(NOT_FOUND_MESSAGE.to_string());
                self.state = FieldState::NotFound;
            }
        }
        &self.state
    }

    /// Pick one of the ambiguous candidates
    pub fn choose(&mut self, index: usize) -> Result<&NamedLocation> {
        let FieldState::Ambiguous(candidates) = &self.state else {
            return Err(EcoRideError::validation(format!(
                "{} location has no suggestions to choose from",
                self.role.label()
            )));
        };
        let location = candidates.get(index).cloned().ok_or_else(|| {
            EcoRideError::validation(format!(
                "Suggestion {index} is out of range ({} available)",
                candidates.len()
            ))
        })?;

        self.select(location);
        self.selected()
            .ok_or_else(|| EcoRideError::validation("No location selected"))
    }

    fn select(&mut self, location: NamedLocation) {
        debug!("{} location set: {}", self.role.label(), location.address);
        self.query = location.address.clone();
        self.message = None;
        self.state = FieldState::Selected(location);
    }
}
