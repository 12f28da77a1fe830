//! Typed object model for OGC KML 2.2 documents, including the Google
//! `gx` extension namespace.
//!
//! The model mirrors the KML element hierarchy as plain Rust structs and
//! enums: features ([`Placemark`], containers, overlays, network links and
//! `gx` tours), geometries, styles, views, regions and time primitives.
//! Fields with documented KML defaults are stored concretely and come back
//! from [`Default`] already holding them; the serializer omits
//! default-valued elements, and the parser fills them in when absent, so a
//! round trip preserves the tree.
//!
//! # Features
//!
//! - Full KML 2.2 feature, geometry and style hierarchies
//! - `gx` extension support: tours, tracks, multi-tracks, quads
//! - Pull parsing with quick-xml
//! - Semantic validation with path-addressed findings
//!
//! # Example
//!
//! ```rust
//! use kml_dom::{parse_kml, serialize_kml, Feature};
//!
//! let xml = r#"<kml xmlns="http://www.opengis.net/kml/2.2">
//!     <Placemark id="pm-1">
//!         <name>Golden Gate</name>
//!         <Point><coordinates>-122.4783,37.8199,67</coordinates></Point>
//!     </Placemark>
//! </kml>"#;
//!
//! let doc = parse_kml(xml).expect("failed to parse KML");
//! let Some(Feature::Placemark(pm)) = &doc.feature else {
//!     panic!("expected a Placemark root");
//! };
//! assert_eq!(pm.common.name.as_deref(), Some("Golden Gate"));
//! assert!(pm.common.visibility);
//!
//! let rendered = serialize_kml(&doc);
//! assert!(rendered.contains("<coordinates>"));
//! ```

pub mod enums;
pub mod feature;
pub mod geometry;
pub mod gx;
pub mod link;
pub mod object;
pub mod overlay;
pub mod parser;
pub mod region;
pub mod serializer;
pub mod style;
pub mod time;
pub mod types;
pub mod validate;
pub mod view;

pub use enums::{
    AltitudeMode, AnyAltitudeMode, ColorMode, GridOrigin, RefreshMode, Shape, Units,
    ViewRefreshMode,
};
pub use feature::{
    Document, ExtendedData, Feature, FeatureCommon, Folder, Kml, NetworkLink, Placemark, Schema,
};
pub use geometry::{Geometry, LineString, LinearRing, Model, MultiGeometry, Point, Polygon};
pub use link::{Icon, Link};
pub use object::KmlObject;
pub use overlay::{GroundOverlay, PhotoOverlay, ScreenOverlay};
pub use parser::{parse_kml, parse_kml_bytes, ParseError};
pub use region::Region;
pub use serializer::{serialize_feature, serialize_kml};
pub use style::{Style, StyleMap, StyleSelector};
pub use time::{TimePrimitive, TimeSpan, TimeStamp};
pub use types::{Color, Coord, LatLon, Xy};
pub use validate::{validate_feature, validate_kml, ValidationError};
pub use view::{AbstractView, Camera, LookAt};
