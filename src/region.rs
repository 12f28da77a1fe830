//! Culling regions: a geographic bounding box plus level-of-detail limits.

use serde::{Deserialize, Serialize};

use crate::enums::AnyAltitudeMode;
use crate::object::impl_kml_object;
use crate::types::{Angle180, Angle90};

/// The geographic extent of a [`Region`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLonAltBox {
    pub north: Angle90,
    pub south: Angle90,
    pub east: Angle180,
    pub west: Angle180,
    /// Lower altitude bound in meters. Default 0.
    pub min_altitude: f64,
    /// Upper altitude bound in meters. Default 0.
    pub max_altitude: f64,
    pub altitude_mode: AnyAltitudeMode,
}

/// Projected-size limits controlling when a region is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lod {
    /// Minimum on-screen size in pixels for the region to be active.
    pub min_lod_pixels: f64,
    /// Maximum on-screen size; -1 means no upper limit.
    pub max_lod_pixels: f64,
    pub min_fade_extent: f64,
    pub max_fade_extent: f64,
}

impl Default for Lod {
    fn default() -> Self {
        Self {
            min_lod_pixels: 0.0,
            max_lod_pixels: -1.0,
            min_fade_extent: 0.0,
            max_fade_extent: 0.0,
        }
    }
}

/// A culling region attachable to any feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub lat_lon_alt_box: LatLonAltBox,
    pub lod: Option<Lod>,
}

impl_kml_object!(Region);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_defaults() {
        let lod = Lod::default();
        assert_eq!(lod.min_lod_pixels, 0.0);
        assert_eq!(lod.max_lod_pixels, -1.0);
    }
}
