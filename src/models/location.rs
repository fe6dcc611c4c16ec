//! Location model for named places and their coordinates

use serde::{Deserialize, Serialize};

/// A named place from the gazetteer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NamedLocation {
    /// Unique display label, e.g. "Paris, France"
    pub address: String,
    /// Latitude in decimal degrees
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl NamedLocation {
    /// Create a new named location
    #[must_use]
    pub fn new<S: Into<String>>(address: S, latitude: f64, longitude: f64) -> Self {
        Self {
            address: address.into(),
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Case-insensitive address comparison
    #[must_use]
    pub fn same_address(&self, other: &str) -> bool {
        self.address.to_lowercase() == other.trim().to_lowercase()
    }
}

/// Which address field a query belongs to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    Source,
    Destination,
}

impl LocationRole {
    /// Label used in user-facing confirmations
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LocationRole::Source => "Source",
            LocationRole::Destination => "Destination",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coordinates() {
        let location = NamedLocation::new("Paris, France", 48.8566, 2.3522);
        assert_eq!(location.format_coordinates(), "48.8566, 2.3522");
    }

    #[test]
    fn test_same_address_ignores_case_and_padding() {
        let location = NamedLocation::new("Delhi, India", 28.7041, 77.1025);
        assert!(location.same_address("  delhi, INDIA "));
        assert!(!location.same_address("Delhi"));
    }

    #[test]
    fn test_deserialize_short_coordinate_names() {
        let location: NamedLocation =
            serde_json::from_str(r#"{"address":"Tokyo, Japan","lat":35.6762,"lng":139.6503}"#)
                .unwrap();
        assert_eq!(location.latitude, 35.6762);
        assert_eq!(location.longitude, 139.6503);
    }
}
