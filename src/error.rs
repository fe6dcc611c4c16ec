//! Error types and handling for the `EcoRide` core

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the `EcoRide` application
#[derive(Error, Debug)]
pub enum EcoRideError {
    /// Vehicle category outside the fixed emission factor table
    #[error("Invalid vehicle type: '{value}'")]
    InvalidVehicleType { value: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Credential and account errors from the session store
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Operation requires a logged-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl EcoRideError {
    /// Create a new invalid vehicle type error
    pub fn invalid_vehicle<S: Into<String>>(value: S) -> Self {
        Self::InvalidVehicleType {
            value: value.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EcoRideError::InvalidVehicleType { value } => format!(
                "Unknown vehicle type '{value}'. Choose one of: sedan, suv, hatchback, minivan, truck."
            ),
            EcoRideError::Validation { message } | EcoRideError::Auth { message } => {
                message.clone()
            }
            EcoRideError::NotAuthenticated => {
                "Please log in or register to continue.".to_string()
            }
            EcoRideError::Storage { .. } => {
                "Session storage failed. You may need to log in again.".to_string()
            }
            EcoRideError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            EcoRideError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// HTTP status the API layer answers with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            EcoRideError::InvalidVehicleType { .. } | EcoRideError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            EcoRideError::Auth { .. } | EcoRideError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            EcoRideError::Storage { .. } | EcoRideError::Config { .. } | EcoRideError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            EcoRideError::InvalidVehicleType { .. } => "invalid_vehicle_type",
            EcoRideError::Validation { .. } => "validation",
            EcoRideError::Auth { .. } => "auth",
            EcoRideError::NotAuthenticated => "not_authenticated",
            EcoRideError::Storage { .. } => "storage",
            EcoRideError::Config { .. } => "config",
            EcoRideError::Io { .. } => "io",
        }
    }
}

impl From<fjall::Error> for EcoRideError {
    fn from(err: fjall::Error) -> Self {
        EcoRideError::storage(err.to_string())
    }
}
