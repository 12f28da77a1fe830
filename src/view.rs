//! Camera viewpoint specifications.

use serde::{Deserialize, Serialize};

use crate::enums::AnyAltitudeMode;
use crate::object::impl_kml_object;
use crate::types::{Angle180, Angle360, Angle90};

/// A free camera defined by its own position and orientation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub longitude: Angle180,
    pub latitude: Angle90,
    /// Camera altitude in meters, interpreted per `altitude_mode`.
    pub altitude: f64,
    /// Compass direction of the view in degrees. Default 0 (north).
    pub heading: Angle360,
    /// Rotation off the vertical, in degrees; 0 looks straight down.
    pub tilt: f64,
    /// Rotation about the view axis, in degrees. Default 0.
    pub roll: Angle180,
    pub altitude_mode: AnyAltitudeMode,
}

/// A camera positioned relative to a point being looked at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LookAt {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub longitude: Angle180,
    pub latitude: Angle90,
    /// Altitude of the point looked at, in meters.
    pub altitude: f64,
    pub heading: Angle360,
    pub tilt: f64,
    /// Distance from the point to the camera, in meters.
    pub range: f64,
    pub altitude_mode: AnyAltitudeMode,
}

/// Either viewpoint specification a feature may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbstractView {
    Camera(Camera),
    LookAt(LookAt),
}

impl_kml_object!(Camera, LookAt);
