//! The feature hierarchy: everything a viewer renders, plus the containers
//! that hold features and the `Kml` document root.

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::gx;
use crate::link::Link;
use crate::object::{impl_kml_object, KmlObject};
use crate::overlay::{GroundOverlay, PhotoOverlay, ScreenOverlay};
use crate::region::Region;
use crate::style::StyleSelector;
use crate::time::TimePrimitive;
use crate::view::AbstractView;

/// Author attribution in the Atom namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AtomAuthor {
    pub name: String,
}

/// Source-document link in the Atom namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AtomLink {
    pub href: String,
}

/// Short description shown in list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub text: String,
    /// Maximum lines shown. Default 2.
    pub max_lines: u32,
}

impl Snippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_lines: 2,
        }
    }
}

/// An untyped supplementary name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Data {
    pub name: String,
    pub display_name: Option<String>,
    pub value: String,
}

/// A value typed against a [`Schema`] field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimpleData {
    pub name: String,
    pub value: String,
}

/// Values typed against a schema referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaData {
    /// Fragment or full URI of the governing [`Schema`].
    pub schema_url: String,
    pub values: Vec<SimpleData>,
}

/// Supplementary data attached to a feature.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtendedData {
    pub data: Vec<Data>,
    pub schema_data: Vec<SchemaData>,
    /// Markup this model does not understand, preserved verbatim in order
    /// so a round trip reproduces it byte-for-byte.
    pub other: Vec<String>,
}

impl ExtendedData {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.schema_data.is_empty() && self.other.is_empty()
    }
}

/// One typed field declared by a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimpleField {
    /// One of `string`, `int`, `uint`, `short`, `ushort`, `float`,
    /// `double`, `bool`; membership is checked by validation.
    pub field_type: String,
    pub name: String,
    pub display_name: Option<String>,
}

/// A custom-data schema declared at document level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub id: Option<String>,
    pub name: Option<String>,
    pub fields: Vec<SimpleField>,
}

/// The fields shared by every feature variant.
///
/// This is the single polymorphic read surface: traversal and serialization
/// code reads these through [`Feature::common`] without branching on the
/// concrete kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCommon {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub name: Option<String>,
    /// Whether the feature is drawn. Default true.
    pub visibility: bool,
    /// Whether a container starts expanded in the places list.
    /// Default false.
    pub open: bool,
    pub atom_author: Option<AtomAuthor>,
    pub atom_link: Option<AtomLink>,
    /// Unstructured address. Coexists with point geometry; when both are
    /// present the geometry wins for display, a consumer-side rule.
    pub address: Option<String>,
    /// Structured xAL address markup, preserved verbatim.
    pub address_details: Option<String>,
    pub phone_number: Option<String>,
    pub snippet: Option<Snippet>,
    pub description: Option<String>,
    pub abstract_view: Option<AbstractView>,
    pub time_primitive: Option<TimePrimitive>,
    /// Style reference: a `#id` fragment into this document or a full URI.
    /// Never resolved by this crate.
    pub style_url: Option<String>,
    pub style_selectors: Vec<StyleSelector>,
    pub region: Option<Region>,
    pub extended_data: Option<ExtendedData>,
}

impl FeatureCommon {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

impl Default for FeatureCommon {
    fn default() -> Self {
        Self {
            id: None,
            target_id: None,
            name: None,
            visibility: true,
            open: false,
            atom_author: None,
            atom_link: None,
            address: None,
            address_details: None,
            phone_number: None,
            snippet: None,
            description: None,
            abstract_view: None,
            time_primitive: None,
            style_url: None,
            style_selectors: Vec::new(),
            region: None,
            extended_data: None,
        }
    }
}

/// A feature carrying geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Placemark {
    pub common: FeatureCommon,
    pub geometry: Option<Geometry>,
}

/// A feature whose content is fetched from elsewhere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkLink {
    pub common: FeatureCommon,
    /// Whether fetched content inherits this link's visibility toggles.
    /// Default false.
    pub refresh_visibility: bool,
    /// Whether the viewer flies to the fetched content's view on refresh.
    /// Default false.
    pub fly_to_view: bool,
    pub link: Option<Link>,
}

/// An unstructured container of features.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Folder {
    pub common: FeatureCommon,
    /// Child features, in rendering order.
    pub features: Vec<Feature>,
}

/// The top-level container; also hosts shared schemas and, through its
/// common style selectors, the document's shared style table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub common: FeatureCommon,
    pub schemas: Vec<Schema>,
    /// Child features, in rendering order.
    pub features: Vec<Feature>,
}

/// Every kind of feature a document can contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    Placemark(Placemark),
    NetworkLink(NetworkLink),
    Folder(Folder),
    Document(Document),
    GroundOverlay(GroundOverlay),
    ScreenOverlay(ScreenOverlay),
    PhotoOverlay(PhotoOverlay),
    Tour(gx::Tour),
}

impl Feature {
    /// The shared fields, regardless of concrete variant.
    pub fn common(&self) -> &FeatureCommon {
        match self {
            Feature::Placemark(f) => &f.common,
            Feature::NetworkLink(f) => &f.common,
            Feature::Folder(f) => &f.common,
            Feature::Document(f) => &f.common,
            Feature::GroundOverlay(f) => &f.common,
            Feature::ScreenOverlay(f) => &f.common,
            Feature::PhotoOverlay(f) => &f.common,
            Feature::Tour(f) => &f.common,
        }
    }

    /// The KML element name of the concrete variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Feature::Placemark(_) => "Placemark",
            Feature::NetworkLink(_) => "NetworkLink",
            Feature::Folder(_) => "Folder",
            Feature::Document(_) => "Document",
            Feature::GroundOverlay(_) => "GroundOverlay",
            Feature::ScreenOverlay(_) => "ScreenOverlay",
            Feature::PhotoOverlay(_) => "PhotoOverlay",
            Feature::Tour(_) => "gx:Tour",
        }
    }

    /// Child features of a container variant, empty otherwise.
    pub fn children(&self) -> &[Feature] {
        match self {
            Feature::Folder(f) => &f.features,
            Feature::Document(f) => &f.features,
            _ => &[],
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.common().name.as_deref()
    }

    pub fn visibility(&self) -> bool {
        self.common().visibility
    }

    pub fn style_url(&self) -> Option<&str> {
        self.common().style_url.as_deref()
    }
}

impl KmlObject for Feature {
    fn id(&self) -> Option<&str> {
        self.common().id.as_deref()
    }

    fn target_id(&self) -> Option<&str> {
        self.common().target_id.as_deref()
    }
}

impl_kml_object!(via common: Placemark, NetworkLink, Folder, Document);

/// The `<kml>` document root: at most one feature plus the processing hint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Kml {
    /// The root element's `hint` attribute, passed through untouched.
    pub hint: Option<String>,
    pub feature: Option<Feature>,
}

impl Kml {
    pub fn new(feature: Feature) -> Self {
        Self {
            hint: None,
            feature: Some(feature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::types::Coord;

    fn sample_variants() -> Vec<Feature> {
        let common = FeatureCommon {
            id: Some("f".into()),
            name: Some("shared".into()),
            ..Default::default()
        };
        vec![
            Feature::Placemark(Placemark {
                common: common.clone(),
                geometry: Some(Geometry::Point(Point::new(Coord::new(-122.0, 37.0)))),
            }),
            Feature::NetworkLink(NetworkLink {
                common: common.clone(),
                link: Some(Link::new("http://example.com/net.kml")),
                ..Default::default()
            }),
            Feature::Folder(Folder {
                common: common.clone(),
                features: Vec::new(),
            }),
            Feature::Document(Document {
                common: common.clone(),
                ..Default::default()
            }),
            Feature::GroundOverlay(GroundOverlay {
                common: common.clone(),
                ..Default::default()
            }),
            Feature::ScreenOverlay(ScreenOverlay {
                common: common.clone(),
                ..Default::default()
            }),
            Feature::PhotoOverlay(PhotoOverlay {
                common: common.clone(),
                ..Default::default()
            }),
            Feature::Tour(gx::Tour {
                common,
                playlist: Vec::new(),
            }),
        ]
    }

    #[test]
    fn test_common_surface_is_uniform() {
        // Reading shared fields never requires knowing the variant.
        for feature in sample_variants() {
            assert_eq!(feature.id(), Some("f"));
            assert_eq!(feature.name(), Some("shared"));
            assert!(feature.visibility());
            assert!(!feature.common().open);
        }
    }

    #[test]
    fn test_serde_representation_roundtrips() {
        for feature in sample_variants() {
            let json = serde_json::to_string(&feature).unwrap();
            let back: Feature = serde_json::from_str(&json).unwrap();
            assert_eq!(feature, back);
        }
    }

    #[test]
    fn test_container_ownership_preserves_order() {
        let folder = Folder {
            common: FeatureCommon::named("ordered"),
            features: vec![
                Feature::Placemark(Placemark {
                    common: FeatureCommon::named("first"),
                    geometry: None,
                }),
                Feature::Placemark(Placemark {
                    common: FeatureCommon::named("second"),
                    geometry: None,
                }),
            ],
        };
        let feature = Feature::Folder(folder);
        let names: Vec<_> = feature.children().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec![Some("first"), Some("second")]);
    }

    #[test]
    fn test_address_and_geometry_coexist() {
        let placemark = Placemark {
            common: FeatureCommon {
                address: Some("1600 Amphitheatre Pkwy".into()),
                ..Default::default()
            },
            geometry: Some(Geometry::Point(Point::new(Coord::new(-122.08, 37.42)))),
        };
        // Both stored; display precedence belongs to the consumer.
        assert!(placemark.common.address.is_some());
        assert!(placemark.geometry.is_some());
    }
}
