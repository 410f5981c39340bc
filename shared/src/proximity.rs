//! Great-circle distance, radius filtering and distance labels.

use crate::model::LocationRecord;
use crate::{LatLng, ValidatedCoordinate, DEFAULT_NEARBY_RADIUS_M, DEFAULT_RESULT_LIMIT, EARTH_RADIUS_M};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    pub radius_m: u32,
    pub limit: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_NEARBY_RADIUS_M,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl RankOptions {
    /// Rank by distance without dropping anything for being far away.
    #[must_use]
    pub const fn unbounded(limit: usize) -> Self {
        Self {
            radius_m: u32::MAX,
            limit,
        }
    }
}

#[must_use]
pub fn haversine_distance(p1: ValidatedCoordinate, p2: ValidatedCoordinate) -> f64 {
    let lat1_rad = p1.lat().to_radians();
    let lat2_rad = p2.lat().to_radians();
    let delta_lat = (p2.lat() - p1.lat()).to_radians();
    let delta_lng = (p2.lng() - p1.lng()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);

    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Distance in whole meters, or `None` when either point is not a usable
/// coordinate.
#[must_use]
pub fn distance(a: LatLng, b: LatLng) -> Option<u32> {
    let a = ValidatedCoordinate::try_from(a).ok()?;
    let b = ValidatedCoordinate::try_from(b).ok()?;
    let meters = haversine_distance(a, b).round();
    // Half the circumference fits comfortably in u32.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let meters = meters as u32;
    Some(meters)
}

/// Attach distances from `anchor`, drop what is too far or unplaceable, sort
/// nearest first and keep at most `options.limit` records.
///
/// Distances are always measured from `anchor`; whatever a record carried
/// before is overwritten.
#[must_use]
pub fn rank_nearby(records: &[LocationRecord], anchor: LatLng, options: RankOptions) -> Vec<LocationRecord> {
    let mut ranked: Vec<LocationRecord> = records
        .iter()
        .filter_map(|record| {
            let meters = record.coordinates.and_then(|c| distance(anchor, c))?;
            (meters <= options.radius_m).then(|| record.with_distance(meters))
        })
        .collect();

    ranked.sort_by_key(|r| r.distance);
    ranked.truncate(options.limit);
    ranked
}

#[must_use]
pub fn format_label(meters: u32) -> String {
    if meters < 1000 {
        format!("{meters} m")
    } else {
        format!("{:.1} km", f64::from(meters) / 1000.0)
    }
}
