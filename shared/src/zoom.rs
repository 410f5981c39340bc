//! Translation between the app's zoom levels and the map widget's native zoom.
//!
//! Levels run 1 (street) to 14 (whole country); the widget's native zoom runs
//! the other way, 21 (street) down to 8. There is exactly one table and it is
//! its own inverse.

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 14;
pub const MIN_NATIVE_ZOOM: u8 = 8;
pub const MAX_NATIVE_ZOOM: u8 = 21;

/// Native zoom handed to the widget for a level outside the table.
pub const FALLBACK_NATIVE_ZOOM: u8 = 7;
/// Level assumed for a native zoom outside the table.
pub const FALLBACK_LEVEL: u8 = 14;

pub const NATIONWIDE_LEVEL: u8 = 13;
/// Used for provinces missing from the static table.
pub const PROVINCE_LEVEL: u8 = 11;
pub const CITY_LEVEL: u8 = 7;
pub const DISTRICT_LEVEL: u8 = 5;
pub const MY_LOCATION_LEVEL: u8 = 5;

/// Index `i` holds the native zoom for level `i + 1`.
const LEVEL_TO_NATIVE: [u8; 14] = [21, 20, 19, 18, 17, 16, 15, 14, 13, 12, 11, 10, 9, 8];

#[must_use]
pub fn to_native_zoom(level: u8) -> u8 {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        LEVEL_TO_NATIVE[usize::from(level - MIN_LEVEL)]
    } else {
        FALLBACK_NATIVE_ZOOM
    }
}

#[must_use]
pub fn to_level(native_zoom: u8) -> u8 {
    LEVEL_TO_NATIVE
        .iter()
        .position(|&z| z == native_zoom)
        .and_then(|idx| u8::try_from(idx).ok())
        .map_or(FALLBACK_LEVEL, |idx| idx + MIN_LEVEL)
}

/// Widgets report fractional zoom mid-animation; snap to the nearest native
/// step before translating.
#[must_use]
pub fn level_for_fractional_zoom(native_zoom: f64) -> u8 {
    if !native_zoom.is_finite() {
        return FALLBACK_LEVEL;
    }
    let clamped = native_zoom
        .round()
        .clamp(f64::from(MIN_NATIVE_ZOOM), f64::from(MAX_NATIVE_ZOOM));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let native_zoom = clamped as u8;
    to_level(native_zoom)
}

#[must_use]
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(MIN_LEVEL, MAX_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_for_every_level() {
        for level in MIN_LEVEL..=MAX_LEVEL {
            assert_eq!(to_level(to_native_zoom(level)), level, "level {level}");
        }
    }

    #[test]
    fn test_round_trip_for_every_native_zoom() {
        for zoom in MIN_NATIVE_ZOOM..=MAX_NATIVE_ZOOM {
            assert_eq!(to_native_zoom(to_level(zoom)), zoom, "zoom {zoom}");
        }
    }

    #[test]
    fn test_lower_level_is_more_zoomed_in() {
        assert_eq!(to_native_zoom(1), 21);
        assert_eq!(to_native_zoom(14), 8);
        assert!(to_native_zoom(DISTRICT_LEVEL) > to_native_zoom(CITY_LEVEL));
    }

    #[test]
    fn test_out_of_table_fallbacks() {
        assert_eq!(to_native_zoom(0), FALLBACK_NATIVE_ZOOM);
        assert_eq!(to_native_zoom(15), FALLBACK_NATIVE_ZOOM);
        assert_eq!(to_level(7), FALLBACK_LEVEL);
        assert_eq!(to_level(22), FALLBACK_LEVEL);
        assert_eq!(to_level(0), FALLBACK_LEVEL);
    }

    #[test]
    fn test_fractional_zoom_snaps() {
        assert_eq!(level_for_fractional_zoom(15.4), to_level(15));
        assert_eq!(level_for_fractional_zoom(15.6), to_level(16));
        assert_eq!(level_for_fractional_zoom(3.0), to_level(MIN_NATIVE_ZOOM));
        assert_eq!(level_for_fractional_zoom(f64::NAN), FALLBACK_LEVEL);
    }

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(0), MIN_LEVEL);
        assert_eq!(clamp_level(20), MAX_LEVEL);
        assert_eq!(clamp_level(9), 9);
    }
}
