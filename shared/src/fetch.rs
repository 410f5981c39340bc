//! Request sequencing and parsing of collaborator responses.
//!
//! Every outbound request is tagged with a [`FetchToken`] from a
//! [`RequestSequencer`]; only a response carrying the latest token is applied.
//! The backend is lenient about types (numbers sometimes arrive as strings),
//! so parsing works on `serde_json::Value` rather than strict structs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::RouteProfile;
use crate::model::{LocationRecord, RouteSummary};
use crate::{AppError, ErrorKind, LatLng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FetchToken(u64);

impl FetchToken {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tokens for one logical operation.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes every token issued before.
    pub fn issue(&mut self) -> FetchToken {
        self.latest += 1;
        FetchToken(self.latest)
    }

    #[must_use]
    pub fn is_latest(&self, token: FetchToken) -> bool {
        token.0 == self.latest
    }

    /// Sequencer for state that replaces ours while our requests may still
    /// be in flight. Nothing it issues collides with a token we issued, and
    /// none of ours is latest for it.
    #[must_use]
    pub const fn successor(&self) -> Self {
        Self {
            latest: self.latest + 1,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl From<FetchFailure> for AppError {
    fn from(e: FetchFailure) -> Self {
        let kind = match e {
            FetchFailure::Network(_) => ErrorKind::Network,
            FetchFailure::Malformed(_) => ErrorKind::DataFetchFailed,
        };
        AppError::new(kind, "Failed to load results").with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodeFailure {
    #[error("address is empty")]
    EmptyQuery,
    #[error("no coordinates for '{address}'")]
    NoResult { address: String },
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
}

impl From<GeocodeFailure> for AppError {
    fn from(e: GeocodeFailure) -> Self {
        match &e {
            GeocodeFailure::EmptyQuery => AppError::new(ErrorKind::Validation, "Enter an address to search"),
            GeocodeFailure::NoResult { address } => {
                AppError::new(ErrorKind::GeocodeFailed, "Address not found").with_context("address", address.clone())
            }
            GeocodeFailure::Fetch(_) => {
                AppError::new(ErrorKind::GeocodeFailed, "Geocoding request failed").with_internal(e.to_string())
            }
        }
    }
}

/// Outcome of one geocoding call, already reduced to what the resolver needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub success: bool,
    pub coordinates: Option<LatLng>,
    pub raw_address: Option<String>,
}

impl GeocodeResult {
    #[must_use]
    pub fn found(coordinates: LatLng) -> Self {
        Self {
            success: true,
            coordinates: Some(coordinates),
            raw_address: None,
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self {
            success: false,
            coordinates: None,
            raw_address: None,
        }
    }

    /// Coordinates, if the call succeeded and both axes are usable.
    #[must_use]
    pub fn usable_coordinates(&self) -> Option<LatLng> {
        if !self.success {
            return None;
        }
        self.coordinates.filter(|c| c.validate().is_ok())
    }
}

/// A JSON number or a numeric string.
#[must_use]
pub fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_field<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| object.get(*k))
        .find(|v| !v.is_null())
}

fn lenient_coordinates(object: &Value) -> Option<LatLng> {
    let lat = first_field(object, &["latitude", "lat"]).and_then(lenient_f64)?;
    let lng = first_field(object, &["longitude", "lng", "lon"]).and_then(lenient_f64)?;
    Some(LatLng::new(lat, lng))
}

/// `{success, latitude, longitude, address}`. A missing `success` is treated
/// as success; anything without two numeric coordinates is a failure.
#[must_use]
pub fn parse_geocode(body: &Value) -> GeocodeResult {
    let success = body.get("success").and_then(Value::as_bool).unwrap_or(true);
    let source = body.get("data").filter(|d| d.is_object()).unwrap_or(body);
    let coordinates = lenient_coordinates(source);
    let raw_address = first_field(source, &["address", "roadAddress"]).and_then(lenient_string);

    GeocodeResult {
        success: success && coordinates.is_some(),
        coordinates,
        raw_address,
    }
}

#[must_use]
pub fn parse_reverse_geocode(body: &Value) -> Option<String> {
    let source = body.get("data").filter(|d| d.is_object()).unwrap_or(body);
    first_field(source, &["address", "roadAddress", "jibunAddress"]).and_then(lenient_string)
}

/// Rounds a non-negative finite quantity; negatives clamp to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_units(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

fn route_summary(body: &Value, profile: RouteProfile) -> Option<RouteSummary> {
    let summary = body
        .pointer(&format!("/data/route/{}/0/summary", profile.as_str()))?;
    let duration = summary.get("duration_ms").or_else(|| summary.get("duration")).and_then(lenient_f64)?;
    let distance = summary.get("distance_m").or_else(|| summary.get("distance")).and_then(lenient_f64)?;

    Some(RouteSummary {
        profile,
        duration_ms: whole_units(duration),
        distance_m: whole_units(distance),
    })
}

/// Prefers the requested profile, else whichever other profile is present.
#[must_use]
pub fn parse_directions(body: &Value, preferred: RouteProfile) -> Option<RouteSummary> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    route_summary(body, preferred).or_else(|| route_summary(body, preferred.other()))
}

/// One record from the data service. Records without an id are unusable.
/// Records without usable coordinates are kept; they just cannot be placed.
#[must_use]
pub fn parse_record(value: &Value) -> Option<LocationRecord> {
    let id = first_field(value, &["id", "_id"]).and_then(lenient_string)?;
    let coordinates = lenient_coordinates(value).filter(|c| c.validate().is_ok());

    let text = |key: &str| value.get(key).and_then(lenient_string);
    // A "distance" field is ignored: it is measured from wherever the
    // server thought the user was, and the ranker measures its own.
    let record = LocationRecord::new(&id, coordinates)
        .in_region(
            text("province").unwrap_or_default(),
            text("city").unwrap_or_default(),
            text("district").unwrap_or_default(),
        )
        .with_categories(text("category1"), text("category2"), text("category3"));
    Some(record)
}

/// Accepts a bare array or `{ "data": [...] }`.
pub fn parse_records(body: &Value) -> Result<Vec<LocationRecord>, FetchFailure> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(_) => body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| FetchFailure::Malformed("missing data array".into()))?,
        _ => return Err(FetchFailure::Malformed("expected an array of records".into())),
    };

    let records: Vec<LocationRecord> = items.iter().filter_map(parse_record).collect();
    let skipped = items.len() - records.len();
    if skipped > 0 {
        debug!(skipped, "dropped records without an id");
    }
    Ok(records)
}
