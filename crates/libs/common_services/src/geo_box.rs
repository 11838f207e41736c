use app_state::GeoSettings;
use std::fmt;
use std::fmt::Display;

pub const BOUNDING_BOX_HALF_WIDTH: f64 = 1.0;
pub const BOUNDING_BOX_HALF_HEIGHT: f64 = 1.0;

const LAT_MIN: f64 = -90.0;
const LAT_MAX: f64 = 90.0;
const LON_MIN: f64 = -180.0;
const LON_MAX: f64 = 180.0;

/// A lon/lat rectangle used to scope a photo search, clamped to valid coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Box of one degree in each direction around a coordinate.
    #[must_use]
    pub fn around(latitude: f64, longitude: f64) -> Self {
        Self::with_half_extent(
            latitude,
            longitude,
            BOUNDING_BOX_HALF_WIDTH,
            BOUNDING_BOX_HALF_HEIGHT,
        )
    }

    #[must_use]
    pub fn from_settings(latitude: f64, longitude: f64, geo: &GeoSettings) -> Self {
        Self::with_half_extent(latitude, longitude, geo.half_width, geo.half_height)
    }

    #[must_use]
    pub fn with_half_extent(
        latitude: f64,
        longitude: f64,
        half_width: f64,
        half_height: f64,
    ) -> Self {
        Self {
            lon_min: (longitude - half_width).max(LON_MIN),
            lat_min: (latitude - half_height).max(LAT_MIN),
            lon_max: (longitude + half_width).min(LON_MAX),
            lat_max: (latitude + half_height).min(LAT_MAX),
        }
    }
}

/// Formats as `lonMin,latMin,lonMax,latMax`, the form the search endpoint expects.
impl Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

/// Bounding box string for a coordinate.
#[must_use]
pub fn bounding_box(latitude: f64, longitude: f64) -> String {
    BoundingBox::around(latitude, longitude).to_string()
}
