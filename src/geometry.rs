//! The closed geometry family referenced by placemarks and photo overlays.

use serde::{Deserialize, Serialize};

use crate::enums::AnyAltitudeMode;
use crate::link::Link;
use crate::object::impl_kml_object;
use crate::types::{Angle180, Angle360, Angle90, Coord};
use crate::{gx, object::KmlObject};

/// A single geographic position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub id: Option<String>,
    pub target_id: Option<String>,
    /// Whether to drop a line from the point to the ground. Default false.
    pub extrude: bool,
    pub altitude_mode: AnyAltitudeMode,
    pub coord: Coord,
}

impl Point {
    pub fn new(coord: Coord) -> Self {
        Self {
            coord,
            ..Default::default()
        }
    }
}

/// An open path of two or more positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub extrude: bool,
    /// Whether the path follows terrain between vertices. Default false.
    pub tessellate: bool,
    pub altitude_mode: AnyAltitudeMode,
    pub coords: Vec<Coord>,
}

/// A closed path; the first and last coordinates must coincide.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearRing {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub extrude: bool,
    pub tessellate: bool,
    pub altitude_mode: AnyAltitudeMode,
    pub coords: Vec<Coord>,
}

impl LinearRing {
    /// True when the ring has enough points and closes on itself.
    pub fn is_closed(&self) -> bool {
        self.coords.len() >= 4 && self.coords.first() == self.coords.last()
    }
}

/// An outer ring with optional holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub extrude: bool,
    pub tessellate: bool,
    pub altitude_mode: AnyAltitudeMode,
    pub outer: LinearRing,
    pub inner: Vec<LinearRing>,
}

/// An ordered group of child geometries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiGeometry {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub geometries: Vec<Geometry>,
}

/// Geographic position of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub longitude: Angle180,
    pub latitude: Angle90,
    pub altitude: f64,
}

/// Rotation of a [`Model`] about its local axes, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub heading: Angle360,
    pub tilt: Angle180,
    pub roll: Angle180,
}

/// Per-axis scale factors of a [`Model`]. Default 1 on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

/// Maps a texture path inside a model file to a fetchable location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alias {
    pub target_href: String,
    pub source_href: String,
}

/// A textured 3D resource placed on the earth.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub altitude_mode: AnyAltitudeMode,
    pub location: Location,
    pub orientation: Orientation,
    pub scale: Scale,
    /// The model resource itself, with the usual refresh protocol.
    pub link: Option<Link>,
    pub resource_map: Vec<Alias>,
}

/// Every kind of geometry a feature can carry, including the `gx` tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    LinearRing(LinearRing),
    Polygon(Polygon),
    MultiGeometry(MultiGeometry),
    Model(Model),
    Track(gx::Track),
    MultiTrack(gx::MultiTrack),
}

impl Geometry {
    /// The KML element name of the concrete variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::LinearRing(_) => "LinearRing",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiGeometry(_) => "MultiGeometry",
            Geometry::Model(_) => "Model",
            Geometry::Track(_) => "gx:Track",
            Geometry::MultiTrack(_) => "gx:MultiTrack",
        }
    }
}

impl KmlObject for Geometry {
    fn id(&self) -> Option<&str> {
        match self {
            Geometry::Point(g) => g.id.as_deref(),
            Geometry::LineString(g) => g.id.as_deref(),
            Geometry::LinearRing(g) => g.id.as_deref(),
            Geometry::Polygon(g) => g.id.as_deref(),
            Geometry::MultiGeometry(g) => g.id.as_deref(),
            Geometry::Model(g) => g.id.as_deref(),
            Geometry::Track(g) => g.id.as_deref(),
            Geometry::MultiTrack(g) => g.id.as_deref(),
        }
    }

    fn target_id(&self) -> Option<&str> {
        match self {
            Geometry::Point(g) => g.target_id.as_deref(),
            Geometry::LineString(g) => g.target_id.as_deref(),
            Geometry::LinearRing(g) => g.target_id.as_deref(),
            Geometry::Polygon(g) => g.target_id.as_deref(),
            Geometry::MultiGeometry(g) => g.target_id.as_deref(),
            Geometry::Model(g) => g.target_id.as_deref(),
            Geometry::Track(g) => g.target_id.as_deref(),
            Geometry::MultiTrack(g) => g.target_id.as_deref(),
        }
    }
}

impl_kml_object!(Point, LineString, LinearRing, Polygon, MultiGeometry, Model);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_closure() {
        let mut ring = LinearRing {
            coords: vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(1.0, 1.0),
                Coord::new(0.0, 0.0),
            ],
            ..Default::default()
        };
        assert!(ring.is_closed());
        ring.coords.pop();
        assert!(!ring.is_closed());
    }

    #[test]
    fn test_model_scale_default() {
        let model = Model::default();
        assert_eq!(model.scale, Scale { x: 1.0, y: 1.0, z: 1.0 });
    }
}
