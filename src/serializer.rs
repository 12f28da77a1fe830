//! XML serialization for KML document trees.
//!
//! Element names equal the KML element names of the model, `id`/`targetId`
//! map to attributes, fields equal to their documented default are omitted,
//! and the `atom`, `xal`, and `gx` namespaces are declared only when an
//! element from them is present.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::enums::{AnyAltitudeMode, ColorMode, GridOrigin, RefreshMode, Shape, ViewRefreshMode};
use crate::feature::{
    Document, ExtendedData, Feature, FeatureCommon, Folder, Kml, NetworkLink, Placemark, Schema,
    Snippet,
};
use crate::geometry::{
    Geometry, LineString, LinearRing, Model, MultiGeometry, Orientation, Point, Polygon,
};
use crate::gx;
use crate::link::{Icon, Link};
use crate::overlay::{
    GroundOverlay, ImagePyramid, LatLonBox, OverlayCommon, PhotoOverlay, ScreenOverlay, ViewVolume,
};
use crate::region::Region;
use crate::style::{
    BalloonStyle, ColorStyle, DisplayMode, IconStyle, LabelStyle, LineStyle, ListItemType,
    ListStyle, Pair, PolyStyle, Style, StyleMap, StyleSelector, StyleState,
};
use crate::time::TimePrimitive;
use crate::types::{format_coords, Color, Xy};
use crate::view::{AbstractView, Camera, LookAt};

const KML_NS: &str = "http://www.opengis.net/kml/2.2";
const GX_NS: &str = "http://www.google.com/kml/ext/2.2";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const XAL_NS: &str = "urn:oasis:names:tc:ciq:xsdschema:xAL:2.0";

/// Serialize a full document, with the XML declaration and the `<kml>` root.
pub fn serialize_kml(kml: &Kml) -> String {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#).unwrap();
    write!(out, r#"<kml xmlns="{KML_NS}""#).unwrap();
    if let Some(feature) = &kml.feature {
        if scan::feature_uses_gx(feature) {
            write!(out, r#" xmlns:gx="{GX_NS}""#).unwrap();
        }
        if scan::feature_uses_atom(feature) {
            write!(out, r#" xmlns:atom="{ATOM_NS}""#).unwrap();
        }
        if scan::feature_uses_xal(feature) {
            write!(out, r#" xmlns:xal="{XAL_NS}""#).unwrap();
        }
    }
    if let Some(hint) = &kml.hint {
        write!(out, r#" hint="{}""#, escape(hint)).unwrap();
    }
    out.push('>');
    if let Some(feature) = &kml.feature {
        write_feature(&mut out, feature);
    }
    out.push_str("</kml>");
    out
}

/// Serialize a single feature as a document fragment.
pub fn serialize_feature(feature: &Feature) -> String {
    let mut out = String::new();
    write_feature(&mut out, feature);
    out
}

fn open_tag(out: &mut String, name: &str, id: &Option<String>, target_id: &Option<String>) {
    write!(out, "<{name}").unwrap();
    if let Some(id) = id {
        write!(out, r#" id="{}""#, escape(id)).unwrap();
    }
    if let Some(target_id) = target_id {
        write!(out, r#" targetId="{}""#, escape(target_id)).unwrap();
    }
    out.push('>');
}

fn text_elem(out: &mut String, name: &str, value: &str) {
    write!(out, "<{name}>{}</{name}>", escape(value)).unwrap();
}

fn f64_elem(out: &mut String, name: &str, value: f64) {
    write!(out, "<{name}>{value}</{name}>").unwrap();
}

/// Writes a float element only when it differs from its default.
fn f64_elem_nondefault(out: &mut String, name: &str, value: f64, default: f64) {
    if value != default {
        f64_elem(out, name, value);
    }
}

fn bool_elem(out: &mut String, name: &str, value: bool) {
    write!(out, "<{name}>{}</{name}>", if value { 1 } else { 0 }).unwrap();
}

fn datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn altitude_mode_elem(out: &mut String, mode: AnyAltitudeMode) {
    match mode {
        AnyAltitudeMode::Kml(m) if m == crate::enums::AltitudeMode::ClampToGround => {}
        AnyAltitudeMode::Kml(m) => text_elem(out, "altitudeMode", m.as_kml()),
        AnyAltitudeMode::Gx(m) => text_elem(out, "gx:altitudeMode", m.as_kml()),
    }
}

fn xy_elem(out: &mut String, name: &str, xy: &Xy) {
    write!(
        out,
        r#"<{name} x="{}" y="{}" xunits="{}" yunits="{}"/>"#,
        xy.x,
        xy.y,
        xy.xunits.as_kml(),
        xy.yunits.as_kml()
    )
    .unwrap();
}

fn color_elem(out: &mut String, name: &str, color: Color) {
    write!(out, "<{name}>{color}</{name}>").unwrap();
}

fn write_feature(out: &mut String, feature: &Feature) {
    match feature {
        Feature::Placemark(f) => write_placemark(out, f),
        Feature::NetworkLink(f) => write_network_link(out, f),
        Feature::Folder(f) => write_folder(out, f),
        Feature::Document(f) => write_document(out, f),
        Feature::GroundOverlay(f) => write_ground_overlay(out, f),
        Feature::ScreenOverlay(f) => write_screen_overlay(out, f),
        Feature::PhotoOverlay(f) => write_photo_overlay(out, f),
        Feature::Tour(f) => write_tour(out, f),
    }
}

fn write_feature_common(out: &mut String, c: &FeatureCommon) {
    if let Some(name) = &c.name {
        text_elem(out, "name", name);
    }
    if !c.visibility {
        bool_elem(out, "visibility", false);
    }
    if c.open {
        bool_elem(out, "open", true);
    }
    if let Some(author) = &c.atom_author {
        out.push_str("<atom:author>");
        text_elem(out, "atom:name", &author.name);
        out.push_str("</atom:author>");
    }
    if let Some(link) = &c.atom_link {
        write!(out, r#"<atom:link href="{}"/>"#, escape(&link.href)).unwrap();
    }
    if let Some(address) = &c.address {
        text_elem(out, "address", address);
    }
    if let Some(details) = &c.address_details {
        // Verbatim xAL markup, not escaped.
        write!(out, "<xal:AddressDetails>{details}</xal:AddressDetails>").unwrap();
    }
    if let Some(phone) = &c.phone_number {
        text_elem(out, "phoneNumber", phone);
    }
    if let Some(snippet) = &c.snippet {
        write_snippet(out, snippet);
    }
    if let Some(description) = &c.description {
        text_elem(out, "description", description);
    }
    if let Some(view) = &c.abstract_view {
        write_abstract_view(out, view);
    }
    if let Some(time) = &c.time_primitive {
        write_time_primitive(out, time);
    }
    if let Some(style_url) = &c.style_url {
        text_elem(out, "styleUrl", style_url);
    }
    for selector in &c.style_selectors {
        write_style_selector(out, selector);
    }
    if let Some(region) = &c.region {
        write_region(out, region);
    }
    if let Some(extended) = &c.extended_data {
        write_extended_data(out, extended);
    }
}

fn write_snippet(out: &mut String, snippet: &Snippet) {
    out.push_str("<Snippet");
    if snippet.max_lines != 2 {
        write!(out, r#" maxLines="{}""#, snippet.max_lines).unwrap();
    }
    write!(out, ">{}</Snippet>", escape(&snippet.text)).unwrap();
}

fn write_placemark(out: &mut String, f: &Placemark) {
    open_tag(out, "Placemark", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    if let Some(geometry) = &f.geometry {
        write_geometry(out, geometry);
    }
    out.push_str("</Placemark>");
}

fn write_network_link(out: &mut String, f: &NetworkLink) {
    open_tag(out, "NetworkLink", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    if f.refresh_visibility {
        bool_elem(out, "refreshVisibility", true);
    }
    if f.fly_to_view {
        bool_elem(out, "flyToView", true);
    }
    if let Some(link) = &f.link {
        write_link(out, "Link", link);
    }
    out.push_str("</NetworkLink>");
}

fn write_folder(out: &mut String, f: &Folder) {
    open_tag(out, "Folder", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    for child in &f.features {
        write_feature(out, child);
    }
    out.push_str("</Folder>");
}

fn write_document(out: &mut String, f: &Document) {
    open_tag(out, "Document", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    for schema in &f.schemas {
        write_schema(out, schema);
    }
    for child in &f.features {
        write_feature(out, child);
    }
    out.push_str("</Document>");
}

fn write_schema(out: &mut String, schema: &Schema) {
    out.push_str("<Schema");
    if let Some(id) = &schema.id {
        write!(out, r#" id="{}""#, escape(id)).unwrap();
    }
    if let Some(name) = &schema.name {
        write!(out, r#" name="{}""#, escape(name)).unwrap();
    }
    out.push('>');
    for field in &schema.fields {
        write!(
            out,
            r#"<SimpleField type="{}" name="{}">"#,
            escape(&field.field_type),
            escape(&field.name)
        )
        .unwrap();
        if let Some(display) = &field.display_name {
            text_elem(out, "displayName", display);
        }
        out.push_str("</SimpleField>");
    }
    out.push_str("</Schema>");
}

fn write_extended_data(out: &mut String, extended: &ExtendedData) {
    out.push_str("<ExtendedData>");
    for data in &extended.data {
        write!(out, r#"<Data name="{}">"#, escape(&data.name)).unwrap();
        if let Some(display) = &data.display_name {
            text_elem(out, "displayName", display);
        }
        text_elem(out, "value", &data.value);
        out.push_str("</Data>");
    }
    for schema_data in &extended.schema_data {
        write!(
            out,
            r#"<SchemaData schemaUrl="{}">"#,
            escape(&schema_data.schema_url)
        )
        .unwrap();
        for value in &schema_data.values {
            write!(
                out,
                r#"<SimpleData name="{}">{}</SimpleData>"#,
                escape(&value.name),
                escape(&value.value)
            )
            .unwrap();
        }
        out.push_str("</SchemaData>");
    }
    for other in &extended.other {
        // Opaque markup preserved byte-for-byte.
        out.push_str(other);
    }
    out.push_str("</ExtendedData>");
}

fn write_link(out: &mut String, name: &str, link: &Link) {
    open_tag(out, name, &link.id, &link.target_id);
    write_link_fields(out, link);
    write!(out, "</{name}>").unwrap();
}

fn write_link_fields(out: &mut String, link: &Link) {
    text_elem(out, "href", &link.href);
    if link.refresh_mode != RefreshMode::OnChange {
        text_elem(out, "refreshMode", link.refresh_mode.as_kml());
    }
    if let Some(interval) = link.refresh_interval {
        f64_elem(out, "refreshInterval", interval);
    }
    if link.view_refresh_mode != ViewRefreshMode::Never {
        text_elem(out, "viewRefreshMode", link.view_refresh_mode.as_kml());
    }
    if let Some(time) = link.view_refresh_time {
        f64_elem(out, "viewRefreshTime", time);
    }
    f64_elem_nondefault(out, "viewBoundScale", link.view_bound_scale, 1.0);
    if let Some(format) = &link.view_format {
        text_elem(out, "viewFormat", format);
    }
    if let Some(query) = &link.http_query {
        text_elem(out, "httpQuery", query);
    }
}

fn write_icon(out: &mut String, icon: &Icon) {
    open_tag(out, "Icon", &icon.link.id, &icon.link.target_id);
    write_link_fields(out, &icon.link);
    if icon.x != 0 {
        write!(out, "<gx:x>{}</gx:x>", icon.x).unwrap();
    }
    if icon.y != 0 {
        write!(out, "<gx:y>{}</gx:y>", icon.y).unwrap();
    }
    if icon.w != -1 {
        write!(out, "<gx:w>{}</gx:w>", icon.w).unwrap();
    }
    if icon.h != -1 {
        write!(out, "<gx:h>{}</gx:h>", icon.h).unwrap();
    }
    out.push_str("</Icon>");
}

fn write_overlay_common(out: &mut String, overlay: &OverlayCommon) {
    if overlay.color != Color::WHITE {
        color_elem(out, "color", overlay.color);
    }
    if overlay.draw_order != 0 {
        write!(out, "<drawOrder>{}</drawOrder>", overlay.draw_order).unwrap();
    }
    if let Some(icon) = &overlay.icon {
        write_icon(out, icon);
    }
}

fn write_ground_overlay(out: &mut String, f: &GroundOverlay) {
    open_tag(out, "GroundOverlay", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    write_overlay_common(out, &f.overlay);
    f64_elem_nondefault(out, "altitude", f.altitude, 0.0);
    altitude_mode_elem(out, f.altitude_mode);
    if let Some(b) = &f.lat_lon_box {
        write_lat_lon_box(out, b);
    }
    if let Some(q) = &f.lat_lon_quad {
        write_lat_lon_quad(out, q);
    }
    out.push_str("</GroundOverlay>");
}

fn write_lat_lon_box(out: &mut String, b: &LatLonBox) {
    out.push_str("<LatLonBox>");
    f64_elem(out, "north", b.north);
    f64_elem(out, "south", b.south);
    f64_elem(out, "east", b.east);
    f64_elem(out, "west", b.west);
    f64_elem_nondefault(out, "rotation", b.rotation, 0.0);
    out.push_str("</LatLonBox>");
}

fn write_lat_lon_quad(out: &mut String, q: &gx::LatLonQuad) {
    open_tag(out, "gx:LatLonQuad", &q.id, &q.target_id);
    let coords = q
        .coords
        .iter()
        .map(|c| format!("{},{}", c.lon, c.lat))
        .collect::<Vec<_>>()
        .join(" ");
    text_elem(out, "coordinates", &coords);
    out.push_str("</gx:LatLonQuad>");
}

fn write_screen_overlay(out: &mut String, f: &ScreenOverlay) {
    open_tag(out, "ScreenOverlay", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    write_overlay_common(out, &f.overlay);
    if let Some(xy) = &f.overlay_xy {
        xy_elem(out, "overlayXY", xy);
    }
    if let Some(xy) = &f.screen_xy {
        xy_elem(out, "screenXY", xy);
    }
    if let Some(xy) = &f.rotation_xy {
        xy_elem(out, "rotationXY", xy);
    }
    if let Some(xy) = &f.size {
        xy_elem(out, "size", xy);
    }
    f64_elem_nondefault(out, "rotation", f.rotation, 0.0);
    out.push_str("</ScreenOverlay>");
}

fn write_photo_overlay(out: &mut String, f: &PhotoOverlay) {
    open_tag(out, "PhotoOverlay", &f.common.id, &f.common.target_id);
    write_feature_common(out, &f.common);
    write_overlay_common(out, &f.overlay);
    f64_elem_nondefault(out, "rotation", f.rotation, 0.0);
    if let Some(v) = &f.view_volume {
        write_view_volume(out, v);
    }
    if let Some(p) = &f.image_pyramid {
        write_image_pyramid(out, p);
    }
    if let Some(point) = &f.point {
        write_point(out, point);
    }
    if f.shape != Shape::Rectangle {
        text_elem(out, "shape", f.shape.as_kml());
    }
    out.push_str("</PhotoOverlay>");
}

fn write_view_volume(out: &mut String, v: &ViewVolume) {
    out.push_str("<ViewVolume>");
    f64_elem_nondefault(out, "leftFov", v.left_fov, 0.0);
    f64_elem_nondefault(out, "rightFov", v.right_fov, 0.0);
    f64_elem_nondefault(out, "bottomFov", v.bottom_fov, 0.0);
    f64_elem_nondefault(out, "topFov", v.top_fov, 0.0);
    f64_elem_nondefault(out, "near", v.near, 0.0);
    out.push_str("</ViewVolume>");
}

fn write_image_pyramid(out: &mut String, p: &ImagePyramid) {
    out.push_str("<ImagePyramid>");
    if p.tile_size != 256 {
        write!(out, "<tileSize>{}</tileSize>", p.tile_size).unwrap();
    }
    if p.max_width != 0 {
        write!(out, "<maxWidth>{}</maxWidth>", p.max_width).unwrap();
    }
    if p.max_height != 0 {
        write!(out, "<maxHeight>{}</maxHeight>", p.max_height).unwrap();
    }
    if p.grid_origin != GridOrigin::LowerLeft {
        text_elem(out, "gridOrigin", p.grid_origin.as_kml());
    }
    out.push_str("</ImagePyramid>");
}

fn write_abstract_view(out: &mut String, view: &AbstractView) {
    match view {
        AbstractView::Camera(v) => write_camera(out, v),
        AbstractView::LookAt(v) => write_look_at(out, v),
    }
}

fn write_camera(out: &mut String, v: &Camera) {
    open_tag(out, "Camera", &v.id, &v.target_id);
    f64_elem_nondefault(out, "longitude", v.longitude, 0.0);
    f64_elem_nondefault(out, "latitude", v.latitude, 0.0);
    f64_elem_nondefault(out, "altitude", v.altitude, 0.0);
    f64_elem_nondefault(out, "heading", v.heading, 0.0);
    f64_elem_nondefault(out, "tilt", v.tilt, 0.0);
    f64_elem_nondefault(out, "roll", v.roll, 0.0);
    altitude_mode_elem(out, v.altitude_mode);
    out.push_str("</Camera>");
}

fn write_look_at(out: &mut String, v: &LookAt) {
    open_tag(out, "LookAt", &v.id, &v.target_id);
    f64_elem_nondefault(out, "longitude", v.longitude, 0.0);
    f64_elem_nondefault(out, "latitude", v.latitude, 0.0);
    f64_elem_nondefault(out, "altitude", v.altitude, 0.0);
    f64_elem_nondefault(out, "heading", v.heading, 0.0);
    f64_elem_nondefault(out, "tilt", v.tilt, 0.0);
    f64_elem_nondefault(out, "range", v.range, 0.0);
    altitude_mode_elem(out, v.altitude_mode);
    out.push_str("</LookAt>");
}

fn write_time_primitive(out: &mut String, time: &TimePrimitive) {
    match time {
        TimePrimitive::TimeSpan(t) => {
            open_tag(out, "TimeSpan", &t.id, &t.target_id);
            if let Some(begin) = &t.begin {
                text_elem(out, "begin", &datetime(begin));
            }
            if let Some(end) = &t.end {
                text_elem(out, "end", &datetime(end));
            }
            out.push_str("</TimeSpan>");
        }
        TimePrimitive::TimeStamp(t) => {
            open_tag(out, "TimeStamp", &t.id, &t.target_id);
            text_elem(out, "when", &datetime(&t.when));
            out.push_str("</TimeStamp>");
        }
    }
}

fn write_region(out: &mut String, region: &Region) {
    open_tag(out, "Region", &region.id, &region.target_id);
    let b = &region.lat_lon_alt_box;
    out.push_str("<LatLonAltBox>");
    f64_elem(out, "north", b.north);
    f64_elem(out, "south", b.south);
    f64_elem(out, "east", b.east);
    f64_elem(out, "west", b.west);
    f64_elem_nondefault(out, "minAltitude", b.min_altitude, 0.0);
    f64_elem_nondefault(out, "maxAltitude", b.max_altitude, 0.0);
    altitude_mode_elem(out, b.altitude_mode);
    out.push_str("</LatLonAltBox>");
    if let Some(lod) = &region.lod {
        out.push_str("<Lod>");
        f64_elem_nondefault(out, "minLodPixels", lod.min_lod_pixels, 0.0);
        f64_elem_nondefault(out, "maxLodPixels", lod.max_lod_pixels, -1.0);
        f64_elem_nondefault(out, "minFadeExtent", lod.min_fade_extent, 0.0);
        f64_elem_nondefault(out, "maxFadeExtent", lod.max_fade_extent, 0.0);
        out.push_str("</Lod>");
    }
    out.push_str("</Region>");
}

fn write_style_selector(out: &mut String, selector: &StyleSelector) {
    match selector {
        StyleSelector::Style(s) => write_style(out, s),
        StyleSelector::StyleMap(s) => write_style_map(out, s),
    }
}

fn write_style(out: &mut String, style: &Style) {
    open_tag(out, "Style", &style.id, &style.target_id);
    if let Some(s) = &style.icon_style {
        write_icon_style(out, s);
    }
    if let Some(s) = &style.label_style {
        write_label_style(out, s);
    }
    if let Some(s) = &style.line_style {
        write_line_style(out, s);
    }
    if let Some(s) = &style.poly_style {
        write_poly_style(out, s);
    }
    if let Some(s) = &style.balloon_style {
        write_balloon_style(out, s);
    }
    if let Some(s) = &style.list_style {
        write_list_style(out, s);
    }
    out.push_str("</Style>");
}

fn write_color_style(out: &mut String, c: &ColorStyle) {
    if c.color != Color::WHITE {
        color_elem(out, "color", c.color);
    }
    if c.color_mode != ColorMode::Normal {
        text_elem(out, "colorMode", c.color_mode.as_kml());
    }
}

fn write_icon_style(out: &mut String, s: &IconStyle) {
    open_tag(out, "IconStyle", &s.id, &s.target_id);
    write_color_style(out, &s.color_style);
    f64_elem_nondefault(out, "scale", s.scale, 1.0);
    f64_elem_nondefault(out, "heading", s.heading, 0.0);
    if let Some(icon) = &s.icon {
        write_icon(out, icon);
    }
    if let Some(hot_spot) = &s.hot_spot {
        xy_elem(out, "hotSpot", hot_spot);
    }
    out.push_str("</IconStyle>");
}

fn write_label_style(out: &mut String, s: &LabelStyle) {
    open_tag(out, "LabelStyle", &s.id, &s.target_id);
    write_color_style(out, &s.color_style);
    f64_elem_nondefault(out, "scale", s.scale, 1.0);
    out.push_str("</LabelStyle>");
}

fn write_line_style(out: &mut String, s: &LineStyle) {
    open_tag(out, "LineStyle", &s.id, &s.target_id);
    write_color_style(out, &s.color_style);
    f64_elem_nondefault(out, "width", s.width, 1.0);
    out.push_str("</LineStyle>");
}

fn write_poly_style(out: &mut String, s: &PolyStyle) {
    open_tag(out, "PolyStyle", &s.id, &s.target_id);
    write_color_style(out, &s.color_style);
    if !s.fill {
        bool_elem(out, "fill", false);
    }
    if !s.outline {
        bool_elem(out, "outline", false);
    }
    out.push_str("</PolyStyle>");
}

fn write_balloon_style(out: &mut String, s: &BalloonStyle) {
    open_tag(out, "BalloonStyle", &s.id, &s.target_id);
    if let Some(color) = s.bg_color {
        color_elem(out, "bgColor", color);
    }
    if let Some(color) = s.text_color {
        color_elem(out, "textColor", color);
    }
    if let Some(text) = &s.text {
        text_elem(out, "text", text);
    }
    if s.display_mode != DisplayMode::Default {
        text_elem(out, "displayMode", s.display_mode.as_kml());
    }
    out.push_str("</BalloonStyle>");
}

fn write_list_style(out: &mut String, s: &ListStyle) {
    open_tag(out, "ListStyle", &s.id, &s.target_id);
    if s.list_item_type != ListItemType::Check {
        text_elem(out, "listItemType", s.list_item_type.as_kml());
    }
    if let Some(color) = s.bg_color {
        color_elem(out, "bgColor", color);
    }
    for item in &s.item_icons {
        out.push_str("<ItemIcon>");
        if let Some(state) = &item.state {
            text_elem(out, "state", state);
        }
        text_elem(out, "href", &item.href);
        out.push_str("</ItemIcon>");
    }
    out.push_str("</ListStyle>");
}

fn write_style_map(out: &mut String, map: &StyleMap) {
    open_tag(out, "StyleMap", &map.id, &map.target_id);
    for pair in &map.pairs {
        write_pair(out, pair);
    }
    out.push_str("</StyleMap>");
}

fn write_pair(out: &mut String, pair: &Pair) {
    open_tag(out, "Pair", &pair.id, &pair.target_id);
    if pair.key != StyleState::Normal {
        text_elem(out, "key", pair.key.as_kml());
    }
    if let Some(url) = &pair.style_url {
        text_elem(out, "styleUrl", url);
    }
    if let Some(style) = &pair.style {
        write_style(out, style);
    }
    out.push_str("</Pair>");
}

fn write_geometry(out: &mut String, geometry: &Geometry) {
    match geometry {
        Geometry::Point(g) => write_point(out, g),
        Geometry::LineString(g) => write_line_string(out, g),
        Geometry::LinearRing(g) => write_linear_ring(out, g),
        Geometry::Polygon(g) => write_polygon(out, g),
        Geometry::MultiGeometry(g) => write_multi_geometry(out, g),
        Geometry::Model(g) => write_model(out, g),
        Geometry::Track(g) => write_track(out, g),
        Geometry::MultiTrack(g) => write_multi_track(out, g),
    }
}

fn write_point(out: &mut String, g: &Point) {
    open_tag(out, "Point", &g.id, &g.target_id);
    if g.extrude {
        bool_elem(out, "extrude", true);
    }
    altitude_mode_elem(out, g.altitude_mode);
    text_elem(out, "coordinates", &g.coord.to_string());
    out.push_str("</Point>");
}

fn write_line_string(out: &mut String, g: &LineString) {
    open_tag(out, "LineString", &g.id, &g.target_id);
    if g.extrude {
        bool_elem(out, "extrude", true);
    }
    if g.tessellate {
        bool_elem(out, "tessellate", true);
    }
    altitude_mode_elem(out, g.altitude_mode);
    text_elem(out, "coordinates", &format_coords(&g.coords));
    out.push_str("</LineString>");
}

fn write_linear_ring(out: &mut String, g: &LinearRing) {
    open_tag(out, "LinearRing", &g.id, &g.target_id);
    if g.extrude {
        bool_elem(out, "extrude", true);
    }
    if g.tessellate {
        bool_elem(out, "tessellate", true);
    }
    altitude_mode_elem(out, g.altitude_mode);
    text_elem(out, "coordinates", &format_coords(&g.coords));
    out.push_str("</LinearRing>");
}

fn write_polygon(out: &mut String, g: &Polygon) {
    open_tag(out, "Polygon", &g.id, &g.target_id);
    if g.extrude {
        bool_elem(out, "extrude", true);
    }
    if g.tessellate {
        bool_elem(out, "tessellate", true);
    }
    altitude_mode_elem(out, g.altitude_mode);
    out.push_str("<outerBoundaryIs>");
    write_linear_ring(out, &g.outer);
    out.push_str("</outerBoundaryIs>");
    for ring in &g.inner {
        out.push_str("<innerBoundaryIs>");
        write_linear_ring(out, ring);
        out.push_str("</innerBoundaryIs>");
    }
    out.push_str("</Polygon>");
}

fn write_multi_geometry(out: &mut String, g: &MultiGeometry) {
    open_tag(out, "MultiGeometry", &g.id, &g.target_id);
    for child in &g.geometries {
        write_geometry(out, child);
    }
    out.push_str("</MultiGeometry>");
}

fn write_model(out: &mut String, g: &Model) {
    open_tag(out, "Model", &g.id, &g.target_id);
    altitude_mode_elem(out, g.altitude_mode);
    out.push_str("<Location>");
    f64_elem_nondefault(out, "longitude", g.location.longitude, 0.0);
    f64_elem_nondefault(out, "latitude", g.location.latitude, 0.0);
    f64_elem_nondefault(out, "altitude", g.location.altitude, 0.0);
    out.push_str("</Location>");
    if g.orientation != Orientation::default() {
        out.push_str("<Orientation>");
        f64_elem_nondefault(out, "heading", g.orientation.heading, 0.0);
        f64_elem_nondefault(out, "tilt", g.orientation.tilt, 0.0);
        f64_elem_nondefault(out, "roll", g.orientation.roll, 0.0);
        out.push_str("</Orientation>");
    }
    if g.scale != crate::geometry::Scale::default() {
        out.push_str("<Scale>");
        f64_elem_nondefault(out, "x", g.scale.x, 1.0);
        f64_elem_nondefault(out, "y", g.scale.y, 1.0);
        f64_elem_nondefault(out, "z", g.scale.z, 1.0);
        out.push_str("</Scale>");
    }
    if let Some(link) = &g.link {
        write_link(out, "Link", link);
    }
    if !g.resource_map.is_empty() {
        out.push_str("<ResourceMap>");
        for alias in &g.resource_map {
            out.push_str("<Alias>");
            text_elem(out, "targetHref", &alias.target_href);
            text_elem(out, "sourceHref", &alias.source_href);
            out.push_str("</Alias>");
        }
        out.push_str("</ResourceMap>");
    }
    out.push_str("</Model>");
}

fn write_track(out: &mut String, g: &gx::Track) {
    open_tag(out, "gx:Track", &g.id, &g.target_id);
    altitude_mode_elem(out, g.altitude_mode);
    for when in &g.when {
        text_elem(out, "when", &datetime(when));
    }
    for coord in &g.coords {
        let text = match coord.alt {
            Some(alt) => format!("{} {} {}", coord.lon, coord.lat, alt),
            None => format!("{} {}", coord.lon, coord.lat),
        };
        text_elem(out, "gx:coord", &text);
    }
    for angles in &g.angles {
        text_elem(
            out,
            "gx:angles",
            &format!("{} {} {}", angles.heading, angles.tilt, angles.roll),
        );
    }
    if let Some(model) = &g.model {
        write_model(out, model);
    }
    if let Some(extended) = &g.extended_data {
        write_extended_data(out, extended);
    }
    out.push_str("</gx:Track>");
}

fn write_multi_track(out: &mut String, g: &gx::MultiTrack) {
    open_tag(out, "gx:MultiTrack", &g.id, &g.target_id);
    altitude_mode_elem(out, g.altitude_mode);
    if g.interpolate {
        bool_elem(out, "gx:interpolate", true);
    }
    for track in &g.tracks {
        write_track(out, track);
    }
    out.push_str("</gx:MultiTrack>");
}

fn write_tour(out: &mut String, tour: &gx::Tour) {
    open_tag(out, "gx:Tour", &tour.common.id, &tour.common.target_id);
    write_feature_common(out, &tour.common);
    out.push_str("<gx:Playlist>");
    for primitive in &tour.playlist {
        write_tour_primitive(out, primitive);
    }
    out.push_str("</gx:Playlist>");
    out.push_str("</gx:Tour>");
}

fn write_tour_primitive(out: &mut String, primitive: &gx::TourPrimitive) {
    match primitive {
        gx::TourPrimitive::AnimatedUpdate(p) => {
            open_tag(out, "gx:AnimatedUpdate", &p.id, &p.target_id);
            f64_elem_nondefault(out, "gx:duration", p.duration, 0.0);
            out.push_str("<Update>");
            text_elem(out, "targetHref", &p.update.target_href);
            for op in &p.update.operations {
                out.push_str(op);
            }
            out.push_str("</Update>");
            out.push_str("</gx:AnimatedUpdate>");
        }
        gx::TourPrimitive::FlyTo(p) => {
            open_tag(out, "gx:FlyTo", &p.id, &p.target_id);
            f64_elem_nondefault(out, "gx:duration", p.duration, 0.0);
            if p.mode != gx::FlyToMode::Bounce {
                text_elem(out, "gx:flyToMode", p.mode.as_kml());
            }
            if let Some(view) = &p.view {
                write_abstract_view(out, view);
            }
            out.push_str("</gx:FlyTo>");
        }
        gx::TourPrimitive::SoundCue(p) => {
            open_tag(out, "gx:SoundCue", &p.id, &p.target_id);
            text_elem(out, "href", &p.href);
            f64_elem_nondefault(out, "gx:delayedStart", p.delayed_start, 0.0);
            out.push_str("</gx:SoundCue>");
        }
        gx::TourPrimitive::Wait(p) => {
            open_tag(out, "gx:Wait", &p.id, &p.target_id);
            f64_elem_nondefault(out, "gx:duration", p.duration, 0.0);
            out.push_str("</gx:Wait>");
        }
    }
}

/// Detects which extension namespaces a tree actually uses, so the root
/// element only declares the ones needed.
mod scan {
    use super::*;

    pub fn feature_uses_atom(feature: &Feature) -> bool {
        let c = feature.common();
        if c.atom_author.is_some() || c.atom_link.is_some() {
            return true;
        }
        feature.children().iter().any(feature_uses_atom)
    }

    pub fn feature_uses_xal(feature: &Feature) -> bool {
        if feature.common().address_details.is_some() {
            return true;
        }
        feature.children().iter().any(feature_uses_xal)
    }

    pub fn feature_uses_gx(feature: &Feature) -> bool {
        if common_uses_gx(feature.common()) {
            return true;
        }
        match feature {
            Feature::Tour(_) => true,
            Feature::Placemark(f) => f.geometry.as_ref().is_some_and(geometry_uses_gx),
            Feature::GroundOverlay(f) => {
                f.lat_lon_quad.is_some()
                    || f.altitude_mode.is_gx()
                    || overlay_uses_gx(&f.overlay)
            }
            Feature::ScreenOverlay(f) => overlay_uses_gx(&f.overlay),
            Feature::PhotoOverlay(f) => {
                overlay_uses_gx(&f.overlay)
                    || f.point.as_ref().is_some_and(|p| p.altitude_mode.is_gx())
            }
            Feature::Folder(_) | Feature::Document(_) => {
                feature.children().iter().any(feature_uses_gx)
            }
            Feature::NetworkLink(_) => false,
        }
    }

    fn common_uses_gx(c: &FeatureCommon) -> bool {
        if let Some(view) = &c.abstract_view {
            if view_uses_gx(view) {
                return true;
            }
        }
        if let Some(region) = &c.region {
            if region.lat_lon_alt_box.altitude_mode.is_gx() {
                return true;
            }
        }
        c.style_selectors.iter().any(selector_uses_gx)
    }

    fn view_uses_gx(view: &AbstractView) -> bool {
        match view {
            AbstractView::Camera(v) => v.altitude_mode.is_gx(),
            AbstractView::LookAt(v) => v.altitude_mode.is_gx(),
        }
    }

    fn selector_uses_gx(selector: &StyleSelector) -> bool {
        match selector {
            StyleSelector::Style(s) => style_uses_gx(s),
            StyleSelector::StyleMap(m) => m
                .pairs
                .iter()
                .any(|p| p.style.as_ref().is_some_and(|s| style_uses_gx(s))),
        }
    }

    fn style_uses_gx(style: &Style) -> bool {
        style
            .icon_style
            .as_ref()
            .and_then(|s| s.icon.as_ref())
            .is_some_and(|icon| !icon.is_full_image())
    }

    fn overlay_uses_gx(overlay: &OverlayCommon) -> bool {
        overlay.icon.as_ref().is_some_and(|icon| !icon.is_full_image())
    }

    pub fn geometry_uses_gx(geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Track(_) | Geometry::MultiTrack(_) => true,
            Geometry::Point(g) => g.altitude_mode.is_gx(),
            Geometry::LineString(g) => g.altitude_mode.is_gx(),
            Geometry::LinearRing(g) => g.altitude_mode.is_gx(),
            Geometry::Polygon(g) => g.altitude_mode.is_gx(),
            Geometry::Model(g) => g.altitude_mode.is_gx(),
            Geometry::MultiGeometry(g) => g.geometries.iter().any(geometry_uses_gx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Units;
    use crate::feature::FeatureCommon;
    use crate::types::Coord;

    #[test]
    fn test_size_sentinels_serialize_verbatim() {
        let overlay = ScreenOverlay {
            size: Some(Xy::new(-1.0, 0.0, Units::Pixels, Units::Fraction)),
            ..Default::default()
        };
        let xml = serialize_feature(&Feature::ScreenOverlay(overlay));
        assert!(xml.contains(r#"<size x="-1" y="0" xunits="pixels" yunits="fraction"/>"#));
    }

    #[test]
    fn test_defaults_are_omitted() {
        let placemark = Placemark {
            common: FeatureCommon::named("home"),
            geometry: Some(Geometry::Point(Point::new(Coord::new(-122.08, 37.42)))),
        };
        let xml = serialize_feature(&Feature::Placemark(placemark));
        assert!(xml.contains("<name>home</name>"));
        assert!(!xml.contains("visibility"));
        assert!(!xml.contains("open"));
        assert!(!xml.contains("altitudeMode"));
        assert!(xml.contains("<coordinates>-122.08,37.42</coordinates>"));

        let link = Link::new("http://example.com/a.kml");
        let mut out = String::new();
        write_link(&mut out, "Link", &link);
        assert!(!out.contains("refreshMode"));
        assert!(!out.contains("viewRefreshMode"));
        assert!(!out.contains("viewBoundScale"));
    }

    #[test]
    fn test_nondefaults_are_written() {
        let link = Link {
            view_refresh_mode: ViewRefreshMode::OnStop,
            view_refresh_time: Some(7.0),
            view_bound_scale: 0.75,
            ..Link::on_interval("http://example.com/a.kml", 30.0)
        };
        let mut out = String::new();
        write_link(&mut out, "Link", &link);
        assert!(out.contains("<refreshMode>onInterval</refreshMode>"));
        assert!(out.contains("<refreshInterval>30</refreshInterval>"));
        assert!(out.contains("<viewRefreshMode>onStop</viewRefreshMode>"));
        assert!(out.contains("<viewRefreshTime>7</viewRefreshTime>"));
        assert!(out.contains("<viewBoundScale>0.75</viewBoundScale>"));
    }

    #[test]
    fn test_namespaces_declared_only_when_used() {
        let plain = Kml::new(Feature::Placemark(Placemark::default()));
        let xml = serialize_kml(&plain);
        assert!(xml.contains(r#"xmlns="http://www.opengis.net/kml/2.2""#));
        assert!(!xml.contains("xmlns:gx"));
        assert!(!xml.contains("xmlns:atom"));
        assert!(!xml.contains("xmlns:xal"));

        let toured = Kml::new(Feature::Tour(gx::Tour::default()));
        let xml = serialize_kml(&toured);
        assert!(xml.contains(r#"xmlns:gx="http://www.google.com/kml/ext/2.2""#));

        let attributed = Kml::new(Feature::Placemark(Placemark {
            common: FeatureCommon {
                atom_author: Some(crate::feature::AtomAuthor {
                    name: "Cartographer".into(),
                }),
                ..Default::default()
            },
            geometry: None,
        }));
        let xml = serialize_kml(&attributed);
        assert!(xml.contains(r#"xmlns:atom="http://www.w3.org/2005/Atom""#));
        assert!(xml.contains("<atom:name>Cartographer</atom:name>"));
    }

    #[test]
    fn test_gx_altitude_mode_element_name() {
        let point = Point {
            altitude_mode: gx::AltitudeMode::RelativeToSeaFloor.into(),
            coord: Coord::with_alt(151.27, -33.85, -20.0),
            ..Default::default()
        };
        let mut out = String::new();
        write_point(&mut out, &point);
        assert!(out.contains("<gx:altitudeMode>relativeToSeaFloor</gx:altitudeMode>"));
        assert!(!out.contains("<altitudeMode>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let placemark = Placemark {
            common: FeatureCommon::named("Fish & Chips <best>"),
            geometry: None,
        };
        let xml = serialize_feature(&Feature::Placemark(placemark));
        assert!(xml.contains("<name>Fish &amp; Chips &lt;best&gt;</name>"));
    }

    #[test]
    fn test_closed_sets_serialize() {
        for mode in RefreshMode::ALL {
            let link = Link {
                refresh_mode: *mode,
                refresh_interval: Some(1.0),
                ..Link::new("x")
            };
            let mut out = String::new();
            write_link(&mut out, "Link", &link);
            if *mode != RefreshMode::OnChange {
                assert!(out.contains(mode.as_kml()));
            }
        }
        for mode in ViewRefreshMode::ALL {
            let link = Link {
                view_refresh_mode: *mode,
                ..Link::new("x")
            };
            let mut out = String::new();
            write_link(&mut out, "Link", &link);
            if *mode != ViewRefreshMode::Never {
                assert!(out.contains(mode.as_kml()));
            }
        }
        for shape in Shape::ALL {
            let overlay = PhotoOverlay {
                shape: *shape,
                ..Default::default()
            };
            let xml = serialize_feature(&Feature::PhotoOverlay(overlay));
            if *shape != Shape::Rectangle {
                assert!(xml.contains(shape.as_kml()));
            }
        }
        for origin in GridOrigin::ALL {
            let mut out = String::new();
            write_image_pyramid(
                &mut out,
                &ImagePyramid {
                    grid_origin: *origin,
                    ..Default::default()
                },
            );
            if *origin != GridOrigin::LowerLeft {
                assert!(out.contains(origin.as_kml()));
            }
        }
        for units in Units::ALL {
            let mut out = String::new();
            xy_elem(&mut out, "size", &Xy::new(0.5, 0.5, *units, *units));
            assert!(out.contains(units.as_kml()));
        }
    }
}
