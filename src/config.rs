//! Configuration management for the `EcoRide` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::EcoRideError;
use crate::emissions::{self, VehicleType};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `EcoRide` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcoRideConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Session storage configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Carbon calculator defaults
    #[serde(default)]
    pub calculator: CalculatorConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the built front end, served when present
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Session storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage backend (memory or persistent)
    #[serde(default = "default_session_backend")]
    pub backend: String,
    /// Directory for the persistent backend
    #[serde(default = "default_session_data_dir")]
    pub data_dir: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Values the carbon calculator starts from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    #[serde(default = "default_vehicle")]
    pub default_vehicle: String,
    #[serde(default = "default_distance_km")]
    pub default_distance_km: f64,
    #[serde(default = "default_passengers")]
    pub default_passengers: u32,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "frontend/dist".to_string()
}

fn default_session_backend() -> String {
    "memory".to_string()
}

fn default_session_data_dir() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("ecoride").join("session"))
        .unwrap_or_else(|| PathBuf::from(".ecoride/session"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_vehicle() -> String {
    "sedan".to_string()
}

fn default_distance_km() -> f64 {
    10.0
}

fn default_passengers() -> u32 {
    1
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: default_session_backend(),
            data_dir: default_session_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_vehicle: default_vehicle(),
            default_distance_km: default_distance_km(),
            default_passengers: default_passengers(),
        }
    }
}

impl Default for EcoRideConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            calculator: CalculatorConfig::default(),
        }
    }
}

impl EcoRideConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ECORIDE_SERVER__PORT=9000 overrides server.port
        builder = builder.add_source(
            Environment::with_prefix("ECORIDE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: EcoRideConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ecoride").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.session.backend.is_empty() {
            self.session.backend = default_session_backend();
        }
        if self.session.data_dir.is_empty() {
            self.session.data_dir = default_session_data_dir();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.calculator.default_vehicle.is_empty() {
            self.calculator.default_vehicle = default_vehicle();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_server()?;
        self.validate_calculator()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(EcoRideError::config("Server port must be between 1 and 65535").into());
        }
        Ok(())
    }

    /// Validate calculator defaults against the calculator ranges
    fn validate_calculator(&self) -> Result<()> {
        VehicleType::parse(&self.calculator.default_vehicle).map_err(|_| {
            EcoRideError::config(format!(
                "Invalid default vehicle '{}'. Must be one of: {}",
                self.calculator.default_vehicle,
                VehicleType::all()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<String>>()
                    .join(", ")
            ))
        })?;

        if !emissions::DISTANCE_RANGE_KM.contains(&self.calculator.default_distance_km) {
            return Err(EcoRideError::config(
                "Default distance must be between 1 and 1000 km",
            )
            .into());
        }

        if !emissions::PASSENGER_RANGE.contains(&self.calculator.default_passengers) {
            return Err(EcoRideError::config(
                "Default passengers must be between 1 and 6",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EcoRideError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EcoRideError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_backends = ["memory", "persistent"];
        if !valid_backends.contains(&self.session.backend.as_str()) {
            return Err(EcoRideError::config(format!(
                "Invalid session backend '{}'. Must be one of: {}",
                self.session.backend,
                valid_backends.join(", ")
            ))
            .into());
        }

        Ok(())
    }

    /// Calculator default vehicle, already validated
    #[must_use]
    pub fn default_vehicle(&self) -> VehicleType {
        VehicleType::parse(&self.calculator.default_vehicle).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EcoRideConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.backend, "memory");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.calculator.default_vehicle, "sedan");
        assert_eq!(config.default_vehicle(), VehicleType::Sedan);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = EcoRideConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_invalid_backend() {
        let mut config = EcoRideConfig::default();
        config.session.backend = "redis".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid session backend"));
    }

    #[test]
    fn test_config_validation_calculator_ranges() {
        let mut config = EcoRideConfig::default();
        config.calculator.default_passengers = 9;
        assert!(config.validate().unwrap_err().to_string().contains("passengers"));

        let mut config = EcoRideConfig::default();
        config.calculator.default_vehicle = "bicycle".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("bicycle"));
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = EcoRideConfig::default();
        config.logging.format = String::new();
        config.server.host = String::new();
        config.apply_defaults();
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[calculator]\ndefault_vehicle = \"suv\"\ndefault_passengers = 3"
        )
        .unwrap();

        let config = EcoRideConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.default_vehicle(), VehicleType::Suv);
        assert_eq!(config.calculator.default_passengers, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = EcoRideConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("ecoride"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
