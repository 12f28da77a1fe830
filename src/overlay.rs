//! The overlay family: images fixed to the ground, the screen, or a photo
//! frustum.

use serde::{Deserialize, Serialize};

use crate::enums::{AnyAltitudeMode, GridOrigin, Shape};
use crate::feature::FeatureCommon;
use crate::geometry::Point;
use crate::gx;
use crate::link::Icon;
use crate::object::impl_kml_object;
use crate::types::{Angle180, Angle90, Color, Xy};

/// Fields shared by every overlay variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayCommon {
    /// Blend color/opacity applied to the image. Default opaque white.
    pub color: Color,
    /// Stacking order among overlapping overlays. Default 0.
    pub draw_order: i32,
    /// The overlay image resource.
    pub icon: Option<Icon>,
}

/// An axis-aligned geographic rectangle with an independent rotation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLonBox {
    pub north: Angle90,
    pub south: Angle90,
    pub east: Angle180,
    pub west: Angle180,
    /// Counter-clockwise rotation about the box center, in degrees.
    /// Default 0.
    pub rotation: Angle180,
}

/// An image draped over terrain.
///
/// Positioned by exactly one of `lat_lon_box` or `lat_lon_quad`. Both
/// present, or neither, is representable but rejected by validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundOverlay {
    pub common: FeatureCommon,
    pub overlay: OverlayCommon,
    /// Height above terrain in meters. Default 0.
    pub altitude: f64,
    pub altitude_mode: AnyAltitudeMode,
    pub lat_lon_box: Option<LatLonBox>,
    pub lat_lon_quad: Option<gx::LatLonQuad>,
}

/// An image fixed to the screen, positioned by three unit-tagged points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenOverlay {
    pub common: FeatureCommon,
    pub overlay: OverlayCommon,
    /// Point on the image matched to `screen_xy`.
    pub overlay_xy: Option<Xy>,
    /// Point on the screen the image is pinned to.
    pub screen_xy: Option<Xy>,
    /// Point the rotation is applied about.
    pub rotation_xy: Option<Xy>,
    /// Rendered size. On either axis, -1 means the image's native size and
    /// 0 means preserve the aspect ratio; both pass through unchanged.
    pub size: Option<Xy>,
    /// Rotation in degrees about `rotation_xy`. Default 0.
    pub rotation: Angle180,
}

/// The field-of-view frustum of a [`PhotoOverlay`], in degrees from the
/// camera's view vector, plus the near-plane distance in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewVolume {
    pub left_fov: Angle180,
    pub right_fov: Angle180,
    pub bottom_fov: Angle90,
    pub top_fov: Angle90,
    pub near: f64,
}

/// Tiling description for a very large photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePyramid {
    /// Tile edge length in pixels; must be a power of two. Default 256.
    pub tile_size: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub grid_origin: GridOrigin,
}

impl Default for ImagePyramid {
    fn default() -> Self {
        Self {
            tile_size: 256,
            max_width: 0,
            max_height: 0,
            grid_origin: GridOrigin::LowerLeft,
        }
    }
}

/// A photograph placed in 3D space and viewed through a frustum.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotoOverlay {
    pub common: FeatureCommon,
    pub overlay: OverlayCommon,
    /// Rotation of the photo within its frame, in degrees. Default 0.
    pub rotation: Angle180,
    pub view_volume: Option<ViewVolume>,
    pub image_pyramid: Option<ImagePyramid>,
    /// Where the overlay's icon is drawn in the viewer.
    pub point: Option<Point>,
    /// Surface the photo is projected onto. Default rectangle.
    pub shape: Shape,
}

impl_kml_object!(via common: GroundOverlay, ScreenOverlay, PhotoOverlay);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_overlay_stores_either_footprint() {
        let boxed = GroundOverlay {
            lat_lon_box: Some(LatLonBox {
                north: 37.83,
                south: 37.70,
                east: -122.35,
                west: -122.52,
                rotation: 0.0,
            }),
            ..Default::default()
        };
        assert!(boxed.lat_lon_box.is_some());
        assert!(boxed.lat_lon_quad.is_none());

        // Both present is representable; validation flags it later.
        let conflicted = GroundOverlay {
            lat_lon_quad: Some(gx::LatLonQuad::default()),
            ..boxed
        };
        assert!(conflicted.lat_lon_box.is_some() && conflicted.lat_lon_quad.is_some());
    }

    #[test]
    fn test_overlays_expose_object_identity() {
        use crate::object::KmlObject;
        let mut overlay = ScreenOverlay::default();
        overlay.common.id = Some("hud".to_string());
        assert_eq!(overlay.id(), Some("hud"));
        assert_eq!(overlay.target_id(), None);
        assert_eq!(GroundOverlay::default().id(), None);
        assert_eq!(PhotoOverlay::default().id(), None);
    }

    #[test]
    fn test_image_pyramid_default() {
        let pyramid = ImagePyramid::default();
        assert_eq!(pyramid.tile_size, 256);
        assert!(pyramid.tile_size.is_power_of_two());
        assert_eq!(pyramid.grid_origin, GridOrigin::LowerLeft);
    }
}
