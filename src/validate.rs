//! Semantic validation of a document tree.
//!
//! The serializer and parser accept anything the model can represent;
//! validation is the separate pass that reports where a representable tree
//! violates KML semantics. All findings are collected rather than stopping
//! at the first, and each carries the slash-joined path of element kinds
//! from the root to the offending node.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::enums::{RefreshMode, ViewRefreshMode};
use crate::feature::{Feature, FeatureCommon, Kml, Schema};
use crate::geometry::{Geometry, LinearRing, Model};
use crate::gx;
use crate::link::Link;
use crate::object::KmlObject;
use crate::overlay::{GroundOverlay, ImagePyramid, LatLonBox, PhotoOverlay, ViewVolume};
use crate::region::Region;
use crate::style::{Style, StyleMap, StyleSelector};
use crate::time::TimePrimitive;
use crate::types::Coord;
use crate::view::AbstractView;

/// Legal values of a `SimpleField` type attribute.
const SIMPLE_FIELD_TYPES: &[&str] = &[
    "string", "int", "uint", "short", "ushort", "float", "double", "bool",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A structural rule is broken, such as a required companion element
    /// missing or mutually exclusive elements both present.
    #[error("{path}: {detail}")]
    Structural { path: String, detail: String },

    /// A string field holds a value outside its closed set.
    #[error("{path}: {value:?} is not a member of the {set} set")]
    Enumeration {
        path: String,
        set: &'static str,
        value: String,
    },

    /// A numeric field is outside its documented bounds.
    #[error("{path}: {field} = {value} is outside {bounds}")]
    Range {
        path: String,
        field: &'static str,
        value: f64,
        bounds: &'static str,
    },

    /// A styleUrl fragment or targetId that resolves to nothing in this
    /// document.
    #[error("{path}: unresolved reference {reference:?}")]
    Reference { path: String, reference: String },
}

/// Validate a whole document, reference resolution included.
pub fn validate_kml(kml: &Kml) -> Vec<ValidationError> {
    let mut v = Validator::default();
    if let Some(feature) = &kml.feature {
        v.feature(feature);
    }
    v.resolve_references();
    debug!(findings = v.errors.len(), "validation finished");
    v.errors
}

/// Validate a detached subtree. Same element-level checks as
/// [`validate_kml`], but references are resolved only against ids present
/// in the subtree itself.
pub fn validate_feature(feature: &Feature) -> Vec<ValidationError> {
    let mut v = Validator::default();
    v.feature(feature);
    v.resolve_references();
    v.errors
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
    path: Vec<String>,
    /// Every object id seen, for duplicate detection and targetId lookup.
    ids: HashSet<String>,
    /// Ids of shared style selectors, the targets of styleUrl fragments.
    style_ids: HashSet<String>,
    /// Deferred (path, fragment) styleUrl references.
    style_refs: Vec<(String, String)>,
    /// Deferred (path, id) targetId references.
    target_refs: Vec<(String, String)>,
}

impl Validator {
    fn path(&self) -> String {
        self.path.join("/")
    }

    fn structural(&mut self, detail: impl Into<String>) {
        self.errors.push(ValidationError::Structural {
            path: self.path(),
            detail: detail.into(),
        });
    }

    fn range(&mut self, field: &'static str, value: f64, bounds: &'static str) {
        self.errors.push(ValidationError::Range {
            path: self.path(),
            field,
            value,
            bounds,
        });
    }

    fn record_id(&mut self, id: &Option<String>) {
        if let Some(id) = id {
            if !self.ids.insert(id.clone()) {
                self.structural(format!("duplicate id {id:?}"));
            }
        }
    }

    fn record_target_id(&mut self, target_id: &Option<String>) {
        if let Some(target) = target_id {
            self.target_refs.push((self.path(), target.clone()));
        }
    }

    fn resolve_references(&mut self) {
        for (path, fragment) in std::mem::take(&mut self.style_refs) {
            let id = fragment.trim_start_matches('#');
            if !self.style_ids.contains(id) {
                self.errors.push(ValidationError::Reference {
                    path,
                    reference: fragment,
                });
            }
        }
        for (path, target) in std::mem::take(&mut self.target_refs) {
            if !self.ids.contains(&target) {
                self.errors.push(ValidationError::Reference {
                    path,
                    reference: target,
                });
            }
        }
    }

    // -- features -----------------------------------------------------------

    fn feature(&mut self, feature: &Feature) {
        self.path.push(feature.kind().to_string());
        self.common(feature.common());
        match feature {
            Feature::Placemark(p) => {
                if let Some(geometry) = &p.geometry {
                    self.geometry(geometry);
                }
            }
            Feature::NetworkLink(n) => match &n.link {
                Some(link) => self.link(link),
                None => self.structural("NetworkLink has no Link"),
            },
            Feature::Folder(f) => {
                for child in &f.features {
                    self.feature(child);
                }
            }
            Feature::Document(d) => {
                for schema in &d.schemas {
                    self.schema(schema);
                }
                for child in &d.features {
                    self.feature(child);
                }
            }
            Feature::GroundOverlay(g) => self.ground_overlay(g),
            Feature::ScreenOverlay(s) => {
                if let Some(icon) = &s.overlay.icon {
                    self.link(&icon.link);
                }
                self.angle(s.rotation, "rotation", 180.0);
            }
            Feature::PhotoOverlay(p) => self.photo_overlay(p),
            Feature::Tour(t) => self.tour(t),
        }
        self.path.pop();
    }

    fn common(&mut self, common: &FeatureCommon) {
        self.record_id(&common.id);
        self.record_target_id(&common.target_id);
        if let Some(url) = &common.style_url {
            if let Some(fragment) = url.strip_prefix('#') {
                if fragment.is_empty() {
                    self.structural("empty styleUrl fragment");
                } else {
                    self.style_refs.push((self.path(), url.clone()));
                }
            }
            // Remote styleUrls cannot be resolved locally and pass as-is.
        }
        for selector in &common.style_selectors {
            match selector {
                StyleSelector::Style(style) => self.style(style),
                StyleSelector::StyleMap(map) => self.style_map(map),
            }
        }
        if let Some(view) = &common.abstract_view {
            self.abstract_view(view);
        }
        if let Some(time) = &common.time_primitive {
            self.time_primitive(time);
        }
        if let Some(region) = &common.region {
            self.region(region);
        }
        if let Some(extended) = &common.extended_data {
            for schema_data in &extended.schema_data {
                if schema_data.schema_url.starts_with('#') {
                    self.style_protect_schema_ref(&schema_data.schema_url);
                }
            }
        }
    }

    fn style_protect_schema_ref(&mut self, url: &str) {
        // Schema ids live in the same id space as every other object.
        self.target_refs
            .push((self.path(), url.trim_start_matches('#').to_string()));
    }

    fn schema(&mut self, schema: &Schema) {
        self.path.push("Schema".to_string());
        if let Some(id) = &schema.id {
            if !self.ids.insert(id.clone()) {
                self.structural(format!("duplicate id {id:?}"));
            }
        }
        for field in &schema.fields {
            if !SIMPLE_FIELD_TYPES.contains(&field.field_type.as_str()) {
                self.errors.push(ValidationError::Enumeration {
                    path: self.path(),
                    set: "SimpleField type",
                    value: field.field_type.clone(),
                });
            }
        }
        self.path.pop();
    }

    fn tour(&mut self, tour: &gx::Tour) {
        for primitive in &tour.playlist {
            self.path.push(primitive.kind().to_string());
            match primitive {
                gx::TourPrimitive::AnimatedUpdate(a) => {
                    self.non_negative(a.duration, "gx:duration");
                }
                gx::TourPrimitive::FlyTo(f) => {
                    self.non_negative(f.duration, "gx:duration");
                    if let Some(view) = &f.view {
                        self.abstract_view(view);
                    }
                }
                gx::TourPrimitive::SoundCue(s) => {
                    if s.href.is_empty() {
                        self.structural("SoundCue has an empty href");
                    }
                    self.non_negative(s.delayed_start, "gx:delayedStart");
                }
                gx::TourPrimitive::Wait(w) => self.non_negative(w.duration, "gx:duration"),
            }
            self.path.pop();
        }
    }

    // -- overlays -----------------------------------------------------------

    fn ground_overlay(&mut self, g: &GroundOverlay) {
        if let Some(icon) = &g.overlay.icon {
            self.link(&icon.link);
        }
        match (&g.lat_lon_box, &g.lat_lon_quad) {
            (Some(_), Some(_)) => {
                self.structural("both LatLonBox and gx:LatLonQuad present")
            }
            (None, None) => {
                self.structural("neither LatLonBox nor gx:LatLonQuad present")
            }
            (Some(bbox), None) => self.lat_lon_box(bbox),
            (None, Some(quad)) => self.lat_lon_quad(quad),
        }
    }

    fn lat_lon_box(&mut self, b: &LatLonBox) {
        self.latitude(b.north, "north");
        self.latitude(b.south, "south");
        self.angle(b.east, "east", 180.0);
        self.angle(b.west, "west", 180.0);
        self.angle(b.rotation, "rotation", 180.0);
        if b.north <= b.south {
            self.structural("north must be greater than south");
        }
    }

    fn lat_lon_quad(&mut self, quad: &gx::LatLonQuad) {
        self.record_id(&quad.id);
        for corner in &quad.coords {
            self.latitude(corner.lat, "latitude");
            self.angle(corner.lon, "longitude", 180.0);
        }
    }

    fn photo_overlay(&mut self, p: &PhotoOverlay) {
        if let Some(icon) = &p.overlay.icon {
            self.link(&icon.link);
        }
        self.angle(p.rotation, "rotation", 180.0);
        if let Some(volume) = &p.view_volume {
            self.view_volume(volume);
        }
        if let Some(pyramid) = &p.image_pyramid {
            self.image_pyramid(pyramid);
        }
        if let Some(point) = &p.point {
            self.path.push("Point".to_string());
            self.record_id(&point.id);
            self.coord(&point.coord);
            self.path.pop();
        }
    }

    fn view_volume(&mut self, v: &ViewVolume) {
        self.path.push("ViewVolume".to_string());
        self.angle(v.left_fov, "leftFov", 180.0);
        self.angle(v.right_fov, "rightFov", 180.0);
        self.angle(v.bottom_fov, "bottomFov", 90.0);
        self.angle(v.top_fov, "topFov", 90.0);
        self.non_negative(v.near, "near");
        self.path.pop();
    }

    fn image_pyramid(&mut self, p: &ImagePyramid) {
        self.path.push("ImagePyramid".to_string());
        if !p.tile_size.is_power_of_two() {
            self.range("tileSize", p.tile_size as f64, "powers of two");
        }
        self.path.pop();
    }

    // -- links and styles ---------------------------------------------------

    fn link(&mut self, link: &Link) {
        self.path.push("Link".to_string());
        self.record_id(&link.id);
        self.record_target_id(&link.target_id);
        if link.href.is_empty() {
            self.structural("empty href");
        }
        if link.refresh_mode == RefreshMode::OnInterval {
            match link.refresh_interval {
                None => self.structural("refreshMode onInterval without refreshInterval"),
                Some(interval) if interval <= 0.0 => {
                    self.range("refreshInterval", interval, "(0, inf)")
                }
                Some(_) => {}
            }
        }
        if link.view_refresh_mode == ViewRefreshMode::OnStop
            && link.view_refresh_time.is_none()
        {
            self.structural("viewRefreshMode onStop without viewRefreshTime");
        }
        if link.view_bound_scale <= 0.0 {
            self.range("viewBoundScale", link.view_bound_scale, "(0, inf)");
        }
        self.path.pop();
    }

    fn style(&mut self, style: &Style) {
        self.path.push("Style".to_string());
        if let Some(id) = &style.id {
            self.style_ids.insert(id.clone());
        }
        self.record_id(&style.id);
        self.record_target_id(&style.target_id);
        if let Some(icon_style) = &style.icon_style {
            if let Some(icon) = &icon_style.icon {
                self.link(&icon.link);
            }
            self.non_negative(icon_style.scale, "scale");
            self.angle(icon_style.heading, "heading", 360.0);
        }
        if let Some(label_style) = &style.label_style {
            self.non_negative(label_style.scale, "scale");
        }
        if let Some(line_style) = &style.line_style {
            self.non_negative(line_style.width, "width");
        }
        self.path.pop();
    }

    fn style_map(&mut self, map: &StyleMap) {
        self.path.push("StyleMap".to_string());
        if let Some(id) = &map.id {
            self.style_ids.insert(id.clone());
        }
        self.record_id(&map.id);
        self.record_target_id(&map.target_id);
        for pair in &map.pairs {
            match (&pair.style_url, &pair.style) {
                (None, None) => {
                    self.structural("Pair has neither styleUrl nor inline Style")
                }
                (Some(url), _) => {
                    if url.starts_with('#') {
                        self.style_refs.push((self.path(), url.clone()));
                    }
                }
                (None, Some(style)) => self.style(style),
            }
        }
        self.path.pop();
    }

    // -- geometry -----------------------------------------------------------

    fn geometry(&mut self, geometry: &Geometry) {
        self.path.push(geometry.kind().to_string());
        self.record_id(&geometry.id().map(str::to_string));
        match geometry {
            Geometry::Point(p) => self.coord(&p.coord),
            Geometry::LineString(l) => {
                if l.coords.len() < 2 {
                    self.structural("LineString needs at least two coordinates");
                }
                self.coords(&l.coords);
            }
            Geometry::LinearRing(r) => self.linear_ring(r),
            Geometry::Polygon(p) => {
                self.path.push("outerBoundaryIs".to_string());
                self.linear_ring(&p.outer);
                self.path.pop();
                for ring in &p.inner {
                    self.path.push("innerBoundaryIs".to_string());
                    self.linear_ring(ring);
                    self.path.pop();
                }
            }
            Geometry::MultiGeometry(m) => {
                for child in &m.geometries {
                    self.geometry(child);
                }
            }
            Geometry::Model(m) => self.model(m),
            Geometry::Track(t) => self.track(t),
            Geometry::MultiTrack(m) => {
                for track in &m.tracks {
                    self.path.push("gx:Track".to_string());
                    self.track_fields(track);
                    self.path.pop();
                }
            }
        }
        self.path.pop();
    }

    fn linear_ring(&mut self, ring: &LinearRing) {
        if !ring.is_closed() {
            self.structural(
                "LinearRing must have at least four coordinates with first == last",
            );
        }
        self.coords(&ring.coords);
    }

    fn model(&mut self, model: &Model) {
        self.latitude(model.location.latitude, "latitude");
        self.angle(model.location.longitude, "longitude", 180.0);
        if let Some(link) = &model.link {
            self.link(link);
        }
        for alias in &model.resource_map {
            if alias.target_href.is_empty() || alias.source_href.is_empty() {
                self.structural("Alias must carry both targetHref and sourceHref");
            }
        }
    }

    fn track(&mut self, track: &gx::Track) {
        self.record_id(&track.id);
        self.track_fields(track);
    }

    fn track_fields(&mut self, track: &gx::Track) {
        if track.when.len() != track.coords.len() {
            self.structural(format!(
                "when count {} does not match coord count {}",
                track.when.len(),
                track.coords.len()
            ));
        }
        if !track.angles.is_empty() && track.angles.len() != track.coords.len() {
            self.structural(format!(
                "angles count {} does not match coord count {}",
                track.angles.len(),
                track.coords.len()
            ));
        }
        if track.when.windows(2).any(|w| w[0] > w[1]) {
            self.structural("when values must be in non-decreasing order");
        }
        self.coords(&track.coords);
    }

    // -- views, time, region ------------------------------------------------

    fn abstract_view(&mut self, view: &AbstractView) {
        match view {
            AbstractView::Camera(c) => {
                self.path.push("Camera".to_string());
                self.record_id(&c.id);
                self.latitude(c.latitude, "latitude");
                self.angle(c.longitude, "longitude", 180.0);
                self.angle(c.heading, "heading", 360.0);
                self.tilt(c.tilt, 180.0);
                self.angle(c.roll, "roll", 180.0);
                self.path.pop();
            }
            AbstractView::LookAt(l) => {
                self.path.push("LookAt".to_string());
                self.record_id(&l.id);
                self.latitude(l.latitude, "latitude");
                self.angle(l.longitude, "longitude", 180.0);
                self.angle(l.heading, "heading", 360.0);
                self.tilt(l.tilt, 90.0);
                self.non_negative(l.range, "range");
                self.path.pop();
            }
        }
    }

    fn time_primitive(&mut self, time: &TimePrimitive) {
        if let TimePrimitive::TimeSpan(span) = time {
            if let (Some(begin), Some(end)) = (&span.begin, &span.end) {
                if begin > end {
                    self.path.push("TimeSpan".to_string());
                    self.structural("begin is after end");
                    self.path.pop();
                }
            }
        }
    }

    fn region(&mut self, region: &Region) {
        self.path.push("Region".to_string());
        self.record_id(&region.id);
        let b = &region.lat_lon_alt_box;
        self.latitude(b.north, "north");
        self.latitude(b.south, "south");
        self.angle(b.east, "east", 180.0);
        self.angle(b.west, "west", 180.0);
        if b.north <= b.south {
            self.structural("north must be greater than south");
        }
        if b.min_altitude > b.max_altitude {
            self.structural("minAltitude is greater than maxAltitude");
        }
        if let Some(lod) = &region.lod {
            if lod.max_lod_pixels >= 0.0 && lod.min_lod_pixels > lod.max_lod_pixels {
                self.structural("minLodPixels is greater than maxLodPixels");
            }
        }
        self.path.pop();
    }

    // -- scalar helpers -----------------------------------------------------

    fn coord(&mut self, coord: &Coord) {
        self.latitude(coord.lat, "latitude");
        self.angle(coord.lon, "longitude", 180.0);
    }

    fn coords(&mut self, coords: &[Coord]) {
        for coord in coords {
            self.coord(coord);
        }
    }

    fn latitude(&mut self, value: f64, field: &'static str) {
        if !(-90.0..=90.0).contains(&value) {
            self.range(field, value, "[-90, 90]");
        }
    }

    fn angle(&mut self, value: f64, field: &'static str, half_span: f64) {
        if value.abs() > half_span {
            let bounds = match half_span as i64 {
                90 => "[-90, 90]",
                360 => "[-360, 360]",
                _ => "[-180, 180]",
            };
            self.range(field, value, bounds);
        }
    }

    fn tilt(&mut self, value: f64, max: f64) {
        if !(0.0..=max).contains(&value) {
            let bounds = if max as i64 == 90 { "[0, 90]" } else { "[0, 180]" };
            self.range("tilt", value, bounds);
        }
    }

    fn non_negative(&mut self, value: f64, field: &'static str) {
        if value < 0.0 {
            self.range(field, value, "[0, inf)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Document, Placemark, SimpleField};
    use crate::geometry::Point;
    use crate::link::Icon;
    use crate::types::LatLon;

    fn placemark_named(id: &str) -> Feature {
        let mut p = Placemark::default();
        p.common.id = Some(id.to_string());
        Feature::Placemark(p)
    }

    #[test]
    fn test_valid_document_has_no_findings() {
        let mut doc = Document::default();
        let mut style = Style::default();
        style.id = Some("pin".to_string());
        doc.common
            .style_selectors
            .push(StyleSelector::Style(style));
        let mut p = Placemark::default();
        p.common.style_url = Some("#pin".to_string());
        p.geometry = Some(Geometry::Point(Point::new(Coord::new(-122.3, 37.6))));
        doc.features.push(Feature::Placemark(p));

        let kml = Kml {
            hint: None,
            feature: Some(Feature::Document(doc)),
        };
        assert_eq!(validate_kml(&kml), Vec::new());
    }

    #[test]
    fn test_ground_overlay_footprint_is_exactly_one() {
        let mut g = GroundOverlay::default();
        let errors = validate_feature(&Feature::GroundOverlay(g.clone()));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("neither"))));

        g.lat_lon_box = Some(LatLonBox {
            north: 10.0,
            south: 9.0,
            ..Default::default()
        });
        g.lat_lon_quad = Some(gx::LatLonQuad {
            coords: [LatLon::new(0.0, 0.0); 4],
            ..Default::default()
        });
        let errors = validate_feature(&Feature::GroundOverlay(g));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("both"))));
    }

    #[test]
    fn test_refresh_mode_companions() {
        let mut n = crate::feature::NetworkLink::default();
        let mut link = Link::new("http://example.com/data.kml");
        link.refresh_mode = crate::enums::RefreshMode::OnInterval;
        n.link = Some(link);
        let errors = validate_feature(&Feature::NetworkLink(n.clone()));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("refreshInterval"))));

        if let Some(link) = &mut n.link {
            link.refresh_interval = Some(30.0);
        }
        assert_eq!(validate_feature(&Feature::NetworkLink(n)), Vec::new());
    }

    #[test]
    fn test_tile_size_must_be_a_power_of_two() {
        let mut p = PhotoOverlay::default();
        p.image_pyramid = Some(ImagePyramid {
            tile_size: 300,
            ..Default::default()
        });
        let errors = validate_feature(&Feature::PhotoOverlay(p));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::Range { field: "tileSize", value, .. } if *value == 300.0
        )));
    }

    #[test]
    fn test_duplicate_ids_and_unresolved_references() {
        let mut doc = Document::default();
        doc.features.push(placemark_named("a"));
        doc.features.push(placemark_named("a"));
        let mut p = Placemark::default();
        p.common.style_url = Some("#missing".to_string());
        doc.features.push(Feature::Placemark(p));

        let errors = validate_feature(&Feature::Document(doc));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("duplicate id"))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Reference { reference, .. }
                if reference == "#missing")));
    }

    #[test]
    fn test_unresolved_target_id() {
        let mut doc = Document::default();
        let mut p = Placemark::default();
        p.common.target_id = Some("ghost".to_string());
        doc.features.push(Feature::Placemark(p));
        let errors = validate_feature(&Feature::Document(doc));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Reference { reference, .. }
                if reference == "ghost")));
    }

    #[test]
    fn test_linear_ring_closure() {
        let ring = LinearRing {
            coords: vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(1.0, 1.0),
            ],
            ..Default::default()
        };
        let mut p = Placemark::default();
        p.geometry = Some(Geometry::LinearRing(ring));
        let errors = validate_feature(&Feature::Placemark(p));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("LinearRing"))));
    }

    #[test]
    fn test_track_when_coord_pairing() {
        let mut track = gx::Track::default();
        track.when.push(chrono::Utc::now());
        track.coords.push(Coord::new(0.0, 0.0));
        track.coords.push(Coord::new(0.1, 0.1));
        let mut p = Placemark::default();
        p.geometry = Some(Geometry::Track(track));
        let errors = validate_feature(&Feature::Placemark(p));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("does not match"))));
    }

    #[test]
    fn test_coordinate_ranges() {
        let mut p = Placemark::default();
        p.geometry = Some(Geometry::Point(Point::new(Coord::new(-200.0, 95.0))));
        let errors = validate_feature(&Feature::Placemark(p));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Range { field: "latitude", .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Range { field: "longitude", .. })));
    }

    #[test]
    fn test_simple_field_type_set() {
        let mut doc = Document::default();
        doc.schemas.push(Schema {
            id: Some("s".to_string()),
            name: None,
            fields: vec![SimpleField {
                field_type: "decimal".to_string(),
                name: "depth".to_string(),
                display_name: None,
            }],
        });
        let errors = validate_feature(&Feature::Document(doc));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::Enumeration { set: "SimpleField type", value, .. }
                if value == "decimal"
        )));
    }

    #[test]
    fn test_style_map_pair_needs_a_style() {
        let mut map = StyleMap::default();
        map.pairs.push(crate::style::Pair::default());
        let mut doc = Document::default();
        doc.common
            .style_selectors
            .push(StyleSelector::StyleMap(map));
        let errors = validate_feature(&Feature::Document(doc));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("Pair"))));
    }

    #[test]
    fn test_overlay_icon_href_checked() {
        let mut g = GroundOverlay::default();
        g.overlay.icon = Some(Icon::default());
        g.lat_lon_box = Some(LatLonBox {
            north: 1.0,
            south: 0.0,
            ..Default::default()
        });
        let errors = validate_feature(&Feature::GroundOverlay(g));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Structural { detail, .. }
                if detail.contains("empty href"))));
    }
}
