use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Deserialization,
    GeocodeFailed,
    DataFetchFailed,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
    MapUnavailable,
    InvalidConfig,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::GeocodeFailed => "GEOCODE_FAILED",
            Self::DataFetchFailed => "DATA_FETCH_FAILED",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::LocationUnavailable => "LOCATION_UNAVAILABLE",
            Self::LocationTimeout => "LOCATION_TIMEOUT",
            Self::MapUnavailable => "MAP_UNAVAILABLE",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::GeocodeFailed
            | Self::DataFetchFailed
            | Self::LocationUnavailable
            | Self::LocationTimeout => ErrorSeverity::Transient,

            Self::Deserialization | Self::InvalidConfig | Self::Internal => ErrorSeverity::Fatal,

            Self::Validation
            | Self::NotFound
            | Self::LocationPermissionDenied
            | Self::MapUnavailable => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network
                | Self::Timeout
                | Self::GeocodeFailed
                | Self::DataFetchFailed
                | Self::LocationUnavailable
                | Self::LocationTimeout
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "No matching location was found.".into(),
            ErrorKind::Deserialization => {
                "The server sent data we could not read. Please try again later.".into()
            }
            ErrorKind::GeocodeFailed => {
                "We couldn't find that address. Please check it or pick a region instead.".into()
            }
            ErrorKind::DataFetchFailed => {
                "Couldn't load results. Pull to refresh or try again.".into()
            }
            ErrorKind::LocationPermissionDenied => {
                "Location access is off. Showing the whole country instead.".into()
            }
            ErrorKind::LocationUnavailable => {
                "Your location is unavailable right now. Showing the whole country instead.".into()
            }
            ErrorKind::LocationTimeout => {
                "Finding your location took too long. Showing the whole country instead.".into()
            }
            ErrorKind::MapUnavailable => {
                "The map couldn't be loaded. Results are still available as a list.".into()
            }
            ErrorKind::InvalidConfig | ErrorKind::Internal => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}
