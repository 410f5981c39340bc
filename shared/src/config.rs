use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::http::ApiBase;
use crate::proximity::RankOptions;
use crate::{
    AppError, ErrorKind, DEFAULT_API_BASE_URL, DEFAULT_NEARBY_RADIUS_M, DEFAULT_PAGE_SIZE,
    DEFAULT_RESULT_LIMIT, GEOCODE_CACHE_SIZE, GEOLOCATION_TIMEOUT_MS, IDLE_DEBOUNCE_MS,
    MARKER_BATCH_SIZE, MARKER_CAP, SETTLE_EPSILON_DEG,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteProfile {
    #[default]
    Optimal,
    Fastest,
}

impl RouteProfile {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Fastest => "fastest",
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Optimal => Self::Fastest,
            Self::Fastest => Self::Optimal,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("settle epsilon {0} must be a positive finite number of degrees")]
    InvalidEpsilon(f64),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::InvalidConfig, "Invalid map configuration").with_internal(e.to_string())
    }
}

/// Runtime settings supplied by the shell. Missing fields take their
/// defaults, so a shell only sends what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub api_base_url: String,
    pub idle_debounce_ms: u64,
    pub settle_epsilon_deg: f64,
    pub nearby_radius_m: u32,
    pub result_limit: usize,
    pub page_size: u32,
    pub marker_cap: usize,
    pub marker_batch_size: usize,
    pub geocode_cache_size: usize,
    pub geolocation_timeout_ms: u64,
    pub route_profile: RouteProfile,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            idle_debounce_ms: IDLE_DEBOUNCE_MS,
            settle_epsilon_deg: SETTLE_EPSILON_DEG,
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
            result_limit: DEFAULT_RESULT_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            marker_cap: MARKER_CAP,
            marker_batch_size: MARKER_BATCH_SIZE,
            geocode_cache_size: GEOCODE_CACHE_SIZE,
            geolocation_timeout_ms: GEOLOCATION_TIMEOUT_MS,
            route_profile: RouteProfile::Optimal,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ApiBase::parse(&self.api_base_url)?;

        if !self.settle_epsilon_deg.is_finite() || self.settle_epsilon_deg <= 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.settle_epsilon_deg));
        }

        let sizes = [
            ("result_limit", self.result_limit),
            ("marker_cap", self.marker_cap),
            ("marker_batch_size", self.marker_batch_size),
            ("geocode_cache_size", self.geocode_cache_size),
        ];
        if let Some(&(field, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Zero { field: "page_size" });
        }
        if self.geolocation_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "geolocation_timeout_ms",
            });
        }
        Ok(())
    }

    /// Ranking for the nearby view: radius-bounded.
    #[must_use]
    pub fn nearby_rank_options(&self) -> RankOptions {
        RankOptions {
            radius_m: self.nearby_radius_m,
            limit: self.result_limit,
        }
    }

    /// Ranking inside a chosen region: everything in the region counts, up to
    /// what the map can draw.
    #[must_use]
    pub fn region_rank_options(&self) -> RankOptions {
        RankOptions::unbounded(self.marker_cap)
    }
}
