//! XML parser for KML documents.
//!
//! Inverse of the serializer: fields absent from the markup come back as
//! their documented defaults, unknown values of closed enumerations are
//! rejected with the offending element and field named, and markup the model
//! does not understand inside `ExtendedData` is preserved verbatim.

use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use thiserror::Error;
use tracing::trace;

use crate::enums::{AltitudeMode, AnyAltitudeMode, GridOrigin, RefreshMode, Shape, Units, ViewRefreshMode};
use crate::feature::{
    AtomAuthor, AtomLink, Data, Document, ExtendedData, Feature, FeatureCommon, Folder, Kml,
    NetworkLink, Placemark, Schema, SchemaData, SimpleData, SimpleField, Snippet,
};
use crate::geometry::{
    Alias, Geometry, LineString, LinearRing, Location, Model, MultiGeometry, Orientation, Point,
    Polygon, Scale,
};
use crate::gx;
use crate::link::{Icon, Link};
use crate::overlay::{
    GroundOverlay, ImagePyramid, LatLonBox, OverlayCommon, PhotoOverlay, ScreenOverlay, ViewVolume,
};
use crate::region::{LatLonAltBox, Lod, Region};
use crate::style::{
    BalloonStyle, ColorStyle, DisplayMode, IconStyle, ItemIcon, LabelStyle, LineStyle,
    ListItemType, ListStyle, Pair, PolyStyle, Style, StyleMap, StyleSelector, StyleState,
};
use crate::time::{TimePrimitive, TimeSpan, TimeStamp};
use crate::types::{parse_coords, Color, Coord, LatLon, Xy};
use crate::view::{AbstractView, Camera, LookAt};

type R<'a> = Reader<&'a [u8]>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("<{element}>: missing required field {field}")]
    MissingField {
        element: &'static str,
        field: &'static str,
    },

    #[error("<{element}> {field}: {value:?} is not a member of the closed set")]
    UnknownEnumValue {
        element: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("<{element}> {field}: invalid number {value:?}")]
    InvalidNumber {
        element: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("<{element}> {field}: invalid date-time {value:?}")]
    InvalidDateTime {
        element: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("<{element}> {field}: malformed coordinate string")]
    InvalidCoordinates {
        element: &'static str,
        field: &'static str,
    },

    #[error("<{element}> {field}: invalid color {value:?} (expected aabbggrr)")]
    InvalidColor {
        element: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("unexpected end of document")]
    UnexpectedEof,

    #[error("document has no <kml> or feature root element")]
    NoRootElement,
}

/// Parse a complete KML document from a string.
pub fn parse_kml(xml: &str) -> Result<Kml, ParseError> {
    parse_kml_bytes(xml.as_bytes())
}

/// Parse a complete KML document from bytes. The root may be a `<kml>`
/// wrapper or a bare feature element.
pub fn parse_kml_bytes(data: &[u8]) -> Result<Kml, ParseError> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(e) => {
                if e.name().as_ref() == b"kml" {
                    let hint = attr(&e, b"hint")?;
                    let feature = parse_kml_children(&mut reader)?;
                    return Ok(Kml { hint, feature });
                }
                if is_feature_element(e.name().as_ref()) {
                    let feature = parse_feature(&mut reader, &e, false)?;
                    return Ok(Kml {
                        hint: None,
                        feature: Some(feature),
                    });
                }
                return Err(ParseError::NoRootElement);
            }
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"kml" {
                    let hint = attr(&e, b"hint")?;
                    return Ok(Kml {
                        hint,
                        feature: None,
                    });
                }
                if is_feature_element(e.name().as_ref()) {
                    let feature = parse_feature(&mut reader, &e, true)?;
                    return Ok(Kml {
                        hint: None,
                        feature: Some(feature),
                    });
                }
                return Err(ParseError::NoRootElement);
            }
            XmlEvent::Eof => return Err(ParseError::NoRootElement),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_kml_children(reader: &mut R) -> Result<Option<Feature>, ParseError> {
    let mut feature = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if feature.is_none() && is_feature_element(child.name().as_ref()) {
                    feature = Some(parse_feature(reader, &child, false)?);
                } else {
                    trace!(
                        element = %String::from_utf8_lossy(child.name().as_ref()),
                        "skipping unhandled element under <kml>"
                    );
                    skip_element(reader)?;
                }
            }
            XmlEvent::Empty(child) => {
                if feature.is_none() && is_feature_element(child.name().as_ref()) {
                    feature = Some(parse_feature(reader, &child, true)?);
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(feature)
}

fn is_feature_element(name: &[u8]) -> bool {
    matches!(
        name,
        b"Placemark"
            | b"NetworkLink"
            | b"Folder"
            | b"Document"
            | b"GroundOverlay"
            | b"ScreenOverlay"
            | b"PhotoOverlay"
            | b"gx:Tour"
    )
}

fn is_geometry_element(name: &[u8]) -> bool {
    matches!(
        name,
        b"Point"
            | b"LineString"
            | b"LinearRing"
            | b"Polygon"
            | b"MultiGeometry"
            | b"Model"
            | b"gx:Track"
            | b"gx:MultiTrack"
    )
}

/// Parse any feature element, dispatching on the element name.
fn parse_feature(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<Feature, ParseError> {
    match e.name().as_ref() {
        b"Placemark" => Ok(Feature::Placemark(parse_placemark(reader, e, empty)?)),
        b"NetworkLink" => Ok(Feature::NetworkLink(parse_network_link(reader, e, empty)?)),
        b"Folder" => Ok(Feature::Folder(parse_folder(reader, e, empty)?)),
        b"Document" => Ok(Feature::Document(parse_document(reader, e, empty)?)),
        b"GroundOverlay" => Ok(Feature::GroundOverlay(parse_ground_overlay(reader, e, empty)?)),
        b"ScreenOverlay" => Ok(Feature::ScreenOverlay(parse_screen_overlay(reader, e, empty)?)),
        b"PhotoOverlay" => Ok(Feature::PhotoOverlay(parse_photo_overlay(reader, e, empty)?)),
        b"gx:Tour" => Ok(Feature::Tour(parse_tour(reader, e, empty)?)),
        _ => Err(ParseError::NoRootElement),
    }
}

// ---------------------------------------------------------------------------
// Low-level helpers
// ---------------------------------------------------------------------------

fn attr(e: &BytesStart, key: &[u8]) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(quick_xml::Error::InvalidAttr(err)))?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn object_attrs(e: &BytesStart) -> Result<(Option<String>, Option<String>), ParseError> {
    Ok((attr(e, b"id")?, attr(e, b"targetId")?))
}

/// Reads the text content of the current element, consuming its end tag.
/// Unexpected nested markup inside a scalar element is skipped.
fn element_text(reader: &mut R) -> Result<String, ParseError> {
    let mut text = String::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Text(t) => text.push_str(&t.unescape()?),
            XmlEvent::CData(c) => text.push_str(&String::from_utf8_lossy(c.as_ref())),
            XmlEvent::Start(_) => skip_element(reader)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(text.trim().to_string())
}

fn text_of(reader: &mut R, empty: bool) -> Result<String, ParseError> {
    if empty {
        Ok(String::new())
    } else {
        element_text(reader)
    }
}

/// Consumes events until the end tag matching the already-read start tag.
fn skip_element(reader: &mut R) -> Result<(), ParseError> {
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(_) => depth += 1,
            XmlEvent::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

fn raw_start_tag(e: &BytesStart, empty: bool) -> String {
    let mut s = format!("<{}", String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().flatten() {
        s.push_str(&format!(
            " {}=\"{}\"",
            String::from_utf8_lossy(attr.key.as_ref()),
            String::from_utf8_lossy(attr.value.as_ref())
        ));
    }
    s.push_str(if empty { "/>" } else { ">" });
    s
}

/// Re-emits the content of the current element verbatim, consuming its end
/// tag. The closing tag itself is not included.
fn capture_until_end(reader: &mut R) -> Result<String, ParseError> {
    let mut out = String::new();
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                depth += 1;
                out.push_str(&raw_start_tag(&child, false));
            }
            XmlEvent::Empty(child) => out.push_str(&raw_start_tag(&child, true)),
            XmlEvent::End(end) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(out);
                }
                out.push_str(&format!("</{}>", String::from_utf8_lossy(end.name().as_ref())));
            }
            // Raw (still-escaped) text, so the re-emit is byte-faithful.
            XmlEvent::Text(t) => out.push_str(&String::from_utf8_lossy(t.as_ref())),
            XmlEvent::CData(c) => {
                out.push_str("<![CDATA[");
                out.push_str(&String::from_utf8_lossy(c.as_ref()));
                out.push_str("]]>");
            }
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
}

/// Re-emits an entire unrecognized element, wrapper tags included.
fn capture_element(reader: &mut R, e: &BytesStart, empty: bool) -> Result<String, ParseError> {
    let mut out = raw_start_tag(e, empty);
    if !empty {
        out.push_str(&capture_until_end(reader)?);
        out.push_str(&format!("</{}>", String::from_utf8_lossy(e.name().as_ref())));
    }
    Ok(out)
}

fn parse_f64(element: &'static str, field: &'static str, s: &str) -> Result<f64, ParseError> {
    s.trim().parse().map_err(|_| ParseError::InvalidNumber {
        element,
        field,
        value: s.to_string(),
    })
}

fn parse_i32(element: &'static str, field: &'static str, s: &str) -> Result<i32, ParseError> {
    s.trim().parse().map_err(|_| ParseError::InvalidNumber {
        element,
        field,
        value: s.to_string(),
    })
}

fn parse_u32(element: &'static str, field: &'static str, s: &str) -> Result<u32, ParseError> {
    s.trim().parse().map_err(|_| ParseError::InvalidNumber {
        element,
        field,
        value: s.to_string(),
    })
}

fn parse_bool(element: &'static str, field: &'static str, s: &str) -> Result<bool, ParseError> {
    match s.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ParseError::InvalidNumber {
            element,
            field,
            value: s.to_string(),
        }),
    }
}

/// Accepts full RFC 3339 date-times and date-only values (midnight UTC).
fn parse_datetime(
    element: &'static str,
    field: &'static str,
    s: &str,
) -> Result<DateTime<Utc>, ParseError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(ParseError::InvalidDateTime {
        element,
        field,
        value: s.to_string(),
    })
}

fn parse_color(
    element: &'static str,
    field: &'static str,
    s: &str,
) -> Result<Color, ParseError> {
    Color::from_kml(s.trim()).ok_or_else(|| ParseError::InvalidColor {
        element,
        field,
        value: s.to_string(),
    })
}

fn parse_altitude_mode(
    element: &'static str,
    name: &[u8],
    text: &str,
) -> Result<AnyAltitudeMode, ParseError> {
    if name == b"gx:altitudeMode" {
        gx::AltitudeMode::from_kml(text)
            .map(Into::into)
            .ok_or_else(|| ParseError::UnknownEnumValue {
                element,
                field: "gx:altitudeMode",
                value: text.to_string(),
            })
    } else {
        AltitudeMode::from_kml(text)
            .map(Into::into)
            .ok_or_else(|| ParseError::UnknownEnumValue {
                element,
                field: "altitudeMode",
                value: text.to_string(),
            })
    }
}

fn parse_xy(element: &'static str, e: &BytesStart) -> Result<Xy, ParseError> {
    let mut xy = Xy::default();
    if let Some(x) = attr(e, b"x")? {
        xy.x = parse_f64(element, "x", &x)?;
    }
    if let Some(y) = attr(e, b"y")? {
        xy.y = parse_f64(element, "y", &y)?;
    }
    if let Some(units) = attr(e, b"xunits")? {
        xy.xunits = Units::from_kml(&units).ok_or_else(|| ParseError::UnknownEnumValue {
            element,
            field: "xunits",
            value: units,
        })?;
    }
    if let Some(units) = attr(e, b"yunits")? {
        xy.yunits = Units::from_kml(&units).ok_or_else(|| ParseError::UnknownEnumValue {
            element,
            field: "yunits",
            value: units,
        })?;
    }
    Ok(xy)
}

// ---------------------------------------------------------------------------
// Shared feature fields
// ---------------------------------------------------------------------------

/// Handles one child element common to every feature variant. Returns false
/// when the element is not part of the shared surface, leaving it to the
/// variant parser.
fn feature_common_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    common: &mut FeatureCommon,
) -> Result<bool, ParseError> {
    match child.name().as_ref() {
        b"name" => common.name = Some(text_of(reader, empty)?),
        b"visibility" => {
            common.visibility = parse_bool("Feature", "visibility", &text_of(reader, empty)?)?
        }
        b"open" => common.open = parse_bool("Feature", "open", &text_of(reader, empty)?)?,
        b"atom:author" => common.atom_author = Some(parse_atom_author(reader, empty)?),
        b"atom:link" => {
            let href = attr(child, b"href")?.unwrap_or_default();
            if !empty {
                skip_element(reader)?;
            }
            common.atom_link = Some(AtomLink { href });
        }
        b"address" => common.address = Some(text_of(reader, empty)?),
        b"xal:AddressDetails" => {
            common.address_details = Some(if empty {
                String::new()
            } else {
                capture_until_end(reader)?
            })
        }
        b"phoneNumber" => common.phone_number = Some(text_of(reader, empty)?),
        b"Snippet" | b"snippet" => {
            let max_lines = match attr(child, b"maxLines")? {
                Some(v) => parse_u32("Snippet", "maxLines", &v)?,
                None => 2,
            };
            common.snippet = Some(Snippet {
                text: text_of(reader, empty)?,
                max_lines,
            });
        }
        b"description" => common.description = Some(text_of(reader, empty)?),
        b"Camera" => {
            common.abstract_view = Some(AbstractView::Camera(parse_camera(reader, child, empty)?))
        }
        b"LookAt" => {
            common.abstract_view = Some(AbstractView::LookAt(parse_look_at(reader, child, empty)?))
        }
        b"TimeSpan" => {
            common.time_primitive =
                Some(TimePrimitive::TimeSpan(parse_time_span(reader, child, empty)?))
        }
        b"TimeStamp" => {
            common.time_primitive =
                Some(TimePrimitive::TimeStamp(parse_time_stamp(reader, child, empty)?))
        }
        b"styleUrl" => common.style_url = Some(text_of(reader, empty)?),
        b"Style" => common
            .style_selectors
            .push(StyleSelector::Style(parse_style(reader, child, empty)?)),
        b"StyleMap" => common
            .style_selectors
            .push(StyleSelector::StyleMap(parse_style_map(reader, child, empty)?)),
        b"Region" => common.region = Some(parse_region(reader, child, empty)?),
        b"ExtendedData" => common.extended_data = Some(parse_extended_data(reader, empty)?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_atom_author(reader: &mut R, empty: bool) -> Result<AtomAuthor, ParseError> {
    let mut author = AtomAuthor::default();
    if empty {
        return Ok(author);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"atom:name" {
                    author.name = element_text(reader)?;
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(author)
}

fn skip_unhandled(reader: &mut R, child: &BytesStart, empty: bool) -> Result<(), ParseError> {
    trace!(
        element = %String::from_utf8_lossy(child.name().as_ref()),
        "skipping unhandled element"
    );
    if !empty {
        skip_element(reader)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Feature variants
// ---------------------------------------------------------------------------

fn parse_placemark(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Placemark, ParseError> {
    let mut p = Placemark::default();
    (p.common.id, p.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(p);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => placemark_child(reader, &child, false, &mut p)?,
            XmlEvent::Empty(child) => placemark_child(reader, &child, true, &mut p)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(p)
}

fn placemark_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    p: &mut Placemark,
) -> Result<(), ParseError> {
    if feature_common_child(reader, child, empty, &mut p.common)? {
        return Ok(());
    }
    if is_geometry_element(child.name().as_ref()) {
        p.geometry = Some(parse_geometry(reader, child, empty)?);
        return Ok(());
    }
    skip_unhandled(reader, child, empty)
}

fn parse_network_link(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<NetworkLink, ParseError> {
    let mut n = NetworkLink::default();
    (n.common.id, n.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(n);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => network_link_child(reader, &child, false, &mut n)?,
            XmlEvent::Empty(child) => network_link_child(reader, &child, true, &mut n)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(n)
}

fn network_link_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    n: &mut NetworkLink,
) -> Result<(), ParseError> {
    if feature_common_child(reader, child, empty, &mut n.common)? {
        return Ok(());
    }
    match child.name().as_ref() {
        b"refreshVisibility" => {
            n.refresh_visibility =
                parse_bool("NetworkLink", "refreshVisibility", &text_of(reader, empty)?)?
        }
        b"flyToView" => {
            n.fly_to_view = parse_bool("NetworkLink", "flyToView", &text_of(reader, empty)?)?
        }
        b"Link" => n.link = Some(parse_link(reader, child, empty, "Link")?),
        _ => skip_unhandled(reader, child, empty)?,
    }
    Ok(())
}

fn parse_folder(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Folder, ParseError> {
    let mut folder = Folder::default();
    (folder.common.id, folder.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(folder);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => folder_child(reader, &child, false, &mut folder)?,
            XmlEvent::Empty(child) => folder_child(reader, &child, true, &mut folder)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(folder)
}

fn folder_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    folder: &mut Folder,
) -> Result<(), ParseError> {
    if is_feature_element(child.name().as_ref()) {
        folder.features.push(parse_feature(reader, child, empty)?);
        return Ok(());
    }
    if feature_common_child(reader, child, empty, &mut folder.common)? {
        return Ok(());
    }
    skip_unhandled(reader, child, empty)
}

fn parse_document(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Document, ParseError> {
    let mut doc = Document::default();
    (doc.common.id, doc.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(doc);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => document_child(reader, &child, false, &mut doc)?,
            XmlEvent::Empty(child) => document_child(reader, &child, true, &mut doc)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(doc)
}

fn document_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    doc: &mut Document,
) -> Result<(), ParseError> {
    if is_feature_element(child.name().as_ref()) {
        doc.features.push(parse_feature(reader, child, empty)?);
        return Ok(());
    }
    if child.name().as_ref() == b"Schema" {
        doc.schemas.push(parse_schema(reader, child, empty)?);
        return Ok(());
    }
    if feature_common_child(reader, child, empty, &mut doc.common)? {
        return Ok(());
    }
    skip_unhandled(reader, child, empty)
}

fn parse_schema(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Schema, ParseError> {
    let mut schema = Schema {
        id: attr(e, b"id")?,
        name: attr(e, b"name")?,
        fields: Vec::new(),
    };
    if empty {
        return Ok(schema);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"SimpleField" {
                    schema.fields.push(parse_simple_field(reader, &child)?);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::Empty(child) => {
                if child.name().as_ref() == b"SimpleField" {
                    schema.fields.push(SimpleField {
                        field_type: attr(&child, b"type")?.unwrap_or_default(),
                        name: attr(&child, b"name")?.unwrap_or_default(),
                        display_name: None,
                    });
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(schema)
}

fn parse_simple_field(reader: &mut R, e: &BytesStart) -> Result<SimpleField, ParseError> {
    // Attributes carry the definition; the only child is displayName.
    let mut field = SimpleField {
        field_type: attr(e, b"type")?.unwrap_or_default(),
        name: attr(e, b"name")?.unwrap_or_default(),
        display_name: None,
    };
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"displayName" {
                    field.display_name = Some(element_text(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(field)
}

fn parse_extended_data(reader: &mut R, empty: bool) -> Result<ExtendedData, ParseError> {
    let mut extended = ExtendedData::default();
    if empty {
        return Ok(extended);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => extended_data_child(reader, &child, false, &mut extended)?,
            XmlEvent::Empty(child) => extended_data_child(reader, &child, true, &mut extended)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(extended)
}

fn extended_data_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    extended: &mut ExtendedData,
) -> Result<(), ParseError> {
    match child.name().as_ref() {
        b"Data" => {
            let mut data = Data {
                name: attr(child, b"name")?.unwrap_or_default(),
                ..Default::default()
            };
            if !empty {
                let mut buf = Vec::new();
                loop {
                    match reader.read_event_into(&mut buf)? {
                        XmlEvent::Start(inner) => match inner.name().as_ref() {
                            b"displayName" => data.display_name = Some(element_text(reader)?),
                            b"value" => data.value = element_text(reader)?,
                            _ => skip_element(reader)?,
                        },
                        XmlEvent::End(_) => break,
                        XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
                        _ => {}
                    }
                    buf.clear();
                }
            }
            extended.data.push(data);
        }
        b"SchemaData" => {
            let mut schema_data = SchemaData {
                schema_url: attr(child, b"schemaUrl")?.unwrap_or_default(),
                values: Vec::new(),
            };
            if !empty {
                let mut buf = Vec::new();
                loop {
                    match reader.read_event_into(&mut buf)? {
                        XmlEvent::Start(inner) => {
                            if inner.name().as_ref() == b"SimpleData" {
                                let name = attr(&inner, b"name")?.unwrap_or_default();
                                let value = element_text(reader)?;
                                schema_data.values.push(SimpleData { name, value });
                            } else {
                                skip_element(reader)?;
                            }
                        }
                        XmlEvent::End(_) => break,
                        XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
                        _ => {}
                    }
                    buf.clear();
                }
            }
            extended.schema_data.push(schema_data);
        }
        _ => {
            // The escape hatch: anything else is preserved verbatim.
            extended.other.push(capture_element(reader, child, empty)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Link / Icon
// ---------------------------------------------------------------------------

fn parse_link(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
    element: &'static str,
) -> Result<Link, ParseError> {
    let mut link = Link::default();
    (link.id, link.target_id) = object_attrs(e)?;
    if empty {
        return Ok(link);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if !link_child(reader, &child, false, &mut link, element)? {
                    skip_unhandled(reader, &child, false)?;
                }
            }
            XmlEvent::Empty(child) => {
                if !link_child(reader, &child, true, &mut link, element)? {
                    skip_unhandled(reader, &child, true)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(link)
}

fn link_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    link: &mut Link,
    element: &'static str,
) -> Result<bool, ParseError> {
    match child.name().as_ref() {
        b"href" => link.href = text_of(reader, empty)?,
        b"refreshMode" => {
            let text = text_of(reader, empty)?;
            link.refresh_mode =
                RefreshMode::from_kml(&text).ok_or_else(|| ParseError::UnknownEnumValue {
                    element,
                    field: "refreshMode",
                    value: text,
                })?;
        }
        b"refreshInterval" => {
            link.refresh_interval =
                Some(parse_f64(element, "refreshInterval", &text_of(reader, empty)?)?)
        }
        b"viewRefreshMode" => {
            let text = text_of(reader, empty)?;
            link.view_refresh_mode =
                ViewRefreshMode::from_kml(&text).ok_or_else(|| ParseError::UnknownEnumValue {
                    element,
                    field: "viewRefreshMode",
                    value: text,
                })?;
        }
        b"viewRefreshTime" => {
            link.view_refresh_time =
                Some(parse_f64(element, "viewRefreshTime", &text_of(reader, empty)?)?)
        }
        b"viewBoundScale" => {
            link.view_bound_scale = parse_f64(element, "viewBoundScale", &text_of(reader, empty)?)?
        }
        b"viewFormat" => link.view_format = Some(text_of(reader, empty)?),
        b"httpQuery" => link.http_query = Some(text_of(reader, empty)?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_icon(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Icon, ParseError> {
    let mut icon = Icon::default();
    (icon.link.id, icon.link.target_id) = object_attrs(e)?;
    if empty {
        return Ok(icon);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => icon_child(reader, &child, false, &mut icon)?,
            XmlEvent::Empty(child) => icon_child(reader, &child, true, &mut icon)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(icon)
}

fn icon_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    icon: &mut Icon,
) -> Result<(), ParseError> {
    match child.name().as_ref() {
        b"gx:x" => icon.x = parse_i32("Icon", "gx:x", &text_of(reader, empty)?)?,
        b"gx:y" => icon.y = parse_i32("Icon", "gx:y", &text_of(reader, empty)?)?,
        b"gx:w" => icon.w = parse_i32("Icon", "gx:w", &text_of(reader, empty)?)?,
        b"gx:h" => icon.h = parse_i32("Icon", "gx:h", &text_of(reader, empty)?)?,
        _ => {
            if !link_child(reader, child, empty, &mut icon.link, "Icon")? {
                skip_unhandled(reader, child, empty)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn overlay_common_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    overlay: &mut OverlayCommon,
    element: &'static str,
) -> Result<bool, ParseError> {
    match child.name().as_ref() {
        b"color" => overlay.color = parse_color(element, "color", &text_of(reader, empty)?)?,
        b"drawOrder" => {
            overlay.draw_order = parse_i32(element, "drawOrder", &text_of(reader, empty)?)?
        }
        b"Icon" => overlay.icon = Some(parse_icon(reader, child, empty)?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_ground_overlay(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<GroundOverlay, ParseError> {
    let mut g = GroundOverlay::default();
    (g.common.id, g.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(g);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => ground_overlay_child(reader, &child, false, &mut g)?,
            XmlEvent::Empty(child) => ground_overlay_child(reader, &child, true, &mut g)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(g)
}

fn ground_overlay_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    g: &mut GroundOverlay,
) -> Result<(), ParseError> {
    if feature_common_child(reader, child, empty, &mut g.common)? {
        return Ok(());
    }
    if overlay_common_child(reader, child, empty, &mut g.overlay, "GroundOverlay")? {
        return Ok(());
    }
    match child.name().as_ref() {
        b"altitude" => g.altitude = parse_f64("GroundOverlay", "altitude", &text_of(reader, empty)?)?,
        b"altitudeMode" | b"gx:altitudeMode" => {
            let name = child.name().as_ref().to_vec();
            g.altitude_mode =
                parse_altitude_mode("GroundOverlay", &name, &text_of(reader, empty)?)?;
        }
        b"LatLonBox" => g.lat_lon_box = Some(parse_lat_lon_box(reader, empty)?),
        b"gx:LatLonQuad" => g.lat_lon_quad = Some(parse_lat_lon_quad(reader, child, empty)?),
        _ => skip_unhandled(reader, child, empty)?,
    }
    Ok(())
}

fn parse_lat_lon_box(reader: &mut R, empty: bool) -> Result<LatLonBox, ParseError> {
    let mut b = LatLonBox::default();
    if empty {
        return Ok(b);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"north" => b.north = parse_f64("LatLonBox", "north", &text)?,
                    b"south" => b.south = parse_f64("LatLonBox", "south", &text)?,
                    b"east" => b.east = parse_f64("LatLonBox", "east", &text)?,
                    b"west" => b.west = parse_f64("LatLonBox", "west", &text)?,
                    b"rotation" => b.rotation = parse_f64("LatLonBox", "rotation", &text)?,
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(b)
}

fn parse_lat_lon_quad(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<gx::LatLonQuad, ParseError> {
    let mut quad = gx::LatLonQuad::default();
    (quad.id, quad.target_id) = object_attrs(e)?;
    if empty {
        return Ok(quad);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"coordinates" {
                    let text = element_text(reader)?;
                    let coords =
                        parse_coords(&text).ok_or(ParseError::InvalidCoordinates {
                            element: "gx:LatLonQuad",
                            field: "coordinates",
                        })?;
                    if coords.len() != 4 {
                        return Err(ParseError::InvalidCoordinates {
                            element: "gx:LatLonQuad",
                            field: "coordinates",
                        });
                    }
                    for (slot, coord) in quad.coords.iter_mut().zip(coords) {
                        *slot = LatLon::new(coord.lat, coord.lon);
                    }
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(quad)
}

fn parse_screen_overlay(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<ScreenOverlay, ParseError> {
    let mut s = ScreenOverlay::default();
    (s.common.id, s.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => screen_overlay_child(reader, &child, false, &mut s)?,
            XmlEvent::Empty(child) => screen_overlay_child(reader, &child, true, &mut s)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn screen_overlay_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    s: &mut ScreenOverlay,
) -> Result<(), ParseError> {
    if feature_common_child(reader, child, empty, &mut s.common)? {
        return Ok(());
    }
    if overlay_common_child(reader, child, empty, &mut s.overlay, "ScreenOverlay")? {
        return Ok(());
    }
    match child.name().as_ref() {
        b"overlayXY" => {
            s.overlay_xy = Some(parse_xy("overlayXY", child)?);
            if !empty {
                skip_element(reader)?;
            }
        }
        b"screenXY" => {
            s.screen_xy = Some(parse_xy("screenXY", child)?);
            if !empty {
                skip_element(reader)?;
            }
        }
        b"rotationXY" => {
            s.rotation_xy = Some(parse_xy("rotationXY", child)?);
            if !empty {
                skip_element(reader)?;
            }
        }
        b"size" => {
            s.size = Some(parse_xy("size", child)?);
            if !empty {
                skip_element(reader)?;
            }
        }
        b"rotation" => {
            s.rotation = parse_f64("ScreenOverlay", "rotation", &text_of(reader, empty)?)?
        }
        _ => skip_unhandled(reader, child, empty)?,
    }
    Ok(())
}

fn parse_photo_overlay(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<PhotoOverlay, ParseError> {
    let mut p = PhotoOverlay::default();
    (p.common.id, p.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(p);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => photo_overlay_child(reader, &child, false, &mut p)?,
            XmlEvent::Empty(child) => photo_overlay_child(reader, &child, true, &mut p)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(p)
}

fn photo_overlay_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    p: &mut PhotoOverlay,
) -> Result<(), ParseError> {
    if feature_common_child(reader, child, empty, &mut p.common)? {
        return Ok(());
    }
    if overlay_common_child(reader, child, empty, &mut p.overlay, "PhotoOverlay")? {
        return Ok(());
    }
    match child.name().as_ref() {
        b"rotation" => {
            p.rotation = parse_f64("PhotoOverlay", "rotation", &text_of(reader, empty)?)?
        }
        b"ViewVolume" => p.view_volume = Some(parse_view_volume(reader, empty)?),
        b"ImagePyramid" => p.image_pyramid = Some(parse_image_pyramid(reader, empty)?),
        b"Point" => p.point = Some(parse_point(reader, child, empty)?),
        b"shape" => {
            let text = text_of(reader, empty)?;
            p.shape = Shape::from_kml(&text).ok_or_else(|| ParseError::UnknownEnumValue {
                element: "PhotoOverlay",
                field: "shape",
                value: text,
            })?;
        }
        _ => skip_unhandled(reader, child, empty)?,
    }
    Ok(())
}

fn parse_view_volume(reader: &mut R, empty: bool) -> Result<ViewVolume, ParseError> {
    let mut v = ViewVolume::default();
    if empty {
        return Ok(v);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"leftFov" => v.left_fov = parse_f64("ViewVolume", "leftFov", &text)?,
                    b"rightFov" => v.right_fov = parse_f64("ViewVolume", "rightFov", &text)?,
                    b"bottomFov" => v.bottom_fov = parse_f64("ViewVolume", "bottomFov", &text)?,
                    b"topFov" => v.top_fov = parse_f64("ViewVolume", "topFov", &text)?,
                    b"near" => v.near = parse_f64("ViewVolume", "near", &text)?,
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(v)
}

fn parse_image_pyramid(reader: &mut R, empty: bool) -> Result<ImagePyramid, ParseError> {
    let mut p = ImagePyramid::default();
    if empty {
        return Ok(p);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"tileSize" => p.tile_size = parse_u32("ImagePyramid", "tileSize", &text)?,
                    b"maxWidth" => p.max_width = parse_u32("ImagePyramid", "maxWidth", &text)?,
                    b"maxHeight" => p.max_height = parse_u32("ImagePyramid", "maxHeight", &text)?,
                    b"gridOrigin" => {
                        p.grid_origin = GridOrigin::from_kml(&text).ok_or_else(|| {
                            ParseError::UnknownEnumValue {
                                element: "ImagePyramid",
                                field: "gridOrigin",
                                value: text.clone(),
                            }
                        })?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(p)
}

// ---------------------------------------------------------------------------
// Views / time / region
// ---------------------------------------------------------------------------

fn parse_camera(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Camera, ParseError> {
    let mut v = Camera::default();
    (v.id, v.target_id) = object_attrs(e)?;
    if empty {
        return Ok(v);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"longitude" => v.longitude = parse_f64("Camera", "longitude", &text)?,
                    b"latitude" => v.latitude = parse_f64("Camera", "latitude", &text)?,
                    b"altitude" => v.altitude = parse_f64("Camera", "altitude", &text)?,
                    b"heading" => v.heading = parse_f64("Camera", "heading", &text)?,
                    b"tilt" => v.tilt = parse_f64("Camera", "tilt", &text)?,
                    b"roll" => v.roll = parse_f64("Camera", "roll", &text)?,
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        v.altitude_mode = parse_altitude_mode("Camera", &name, &text)?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(v)
}

fn parse_look_at(reader: &mut R, e: &BytesStart, empty: bool) -> Result<LookAt, ParseError> {
    let mut v = LookAt::default();
    (v.id, v.target_id) = object_attrs(e)?;
    if empty {
        return Ok(v);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"longitude" => v.longitude = parse_f64("LookAt", "longitude", &text)?,
                    b"latitude" => v.latitude = parse_f64("LookAt", "latitude", &text)?,
                    b"altitude" => v.altitude = parse_f64("LookAt", "altitude", &text)?,
                    b"heading" => v.heading = parse_f64("LookAt", "heading", &text)?,
                    b"tilt" => v.tilt = parse_f64("LookAt", "tilt", &text)?,
                    b"range" => v.range = parse_f64("LookAt", "range", &text)?,
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        v.altitude_mode = parse_altitude_mode("LookAt", &name, &text)?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(v)
}

fn parse_time_span(reader: &mut R, e: &BytesStart, empty: bool) -> Result<TimeSpan, ParseError> {
    let mut span = TimeSpan::default();
    (span.id, span.target_id) = object_attrs(e)?;
    if empty {
        return Ok(span);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"begin" => span.begin = Some(parse_datetime("TimeSpan", "begin", &text)?),
                    b"end" => span.end = Some(parse_datetime("TimeSpan", "end", &text)?),
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(span)
}

fn parse_time_stamp(reader: &mut R, e: &BytesStart, empty: bool) -> Result<TimeStamp, ParseError> {
    let (id, target_id) = object_attrs(e)?;
    let mut when = None;
    if !empty {
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                XmlEvent::Start(child) => {
                    if child.name().as_ref() == b"when" {
                        when = Some(parse_datetime("TimeStamp", "when", &element_text(reader)?)?);
                    } else {
                        skip_element(reader)?;
                    }
                }
                XmlEvent::End(_) => break,
                XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
                _ => {}
            }
            buf.clear();
        }
    }
    Ok(TimeStamp {
        id,
        target_id,
        when: when.ok_or(ParseError::MissingField {
            element: "TimeStamp",
            field: "when",
        })?,
    })
}

fn parse_region(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Region, ParseError> {
    let mut region = Region::default();
    (region.id, region.target_id) = object_attrs(e)?;
    if empty {
        return Ok(region);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"LatLonAltBox" => region.lat_lon_alt_box = parse_lat_lon_alt_box(reader)?,
                b"Lod" => region.lod = Some(parse_lod(reader)?),
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(region)
}

fn parse_lat_lon_alt_box(reader: &mut R) -> Result<LatLonAltBox, ParseError> {
    let mut b = LatLonAltBox::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"north" => b.north = parse_f64("LatLonAltBox", "north", &text)?,
                    b"south" => b.south = parse_f64("LatLonAltBox", "south", &text)?,
                    b"east" => b.east = parse_f64("LatLonAltBox", "east", &text)?,
                    b"west" => b.west = parse_f64("LatLonAltBox", "west", &text)?,
                    b"minAltitude" => {
                        b.min_altitude = parse_f64("LatLonAltBox", "minAltitude", &text)?
                    }
                    b"maxAltitude" => {
                        b.max_altitude = parse_f64("LatLonAltBox", "maxAltitude", &text)?
                    }
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        b.altitude_mode = parse_altitude_mode("LatLonAltBox", &name, &text)?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(b)
}

fn parse_lod(reader: &mut R) -> Result<Lod, ParseError> {
    let mut lod = Lod::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"minLodPixels" => lod.min_lod_pixels = parse_f64("Lod", "minLodPixels", &text)?,
                    b"maxLodPixels" => lod.max_lod_pixels = parse_f64("Lod", "maxLodPixels", &text)?,
                    b"minFadeExtent" => {
                        lod.min_fade_extent = parse_f64("Lod", "minFadeExtent", &text)?
                    }
                    b"maxFadeExtent" => {
                        lod.max_fade_extent = parse_f64("Lod", "maxFadeExtent", &text)?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(lod)
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

fn parse_style(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Style, ParseError> {
    let mut style = Style::default();
    (style.id, style.target_id) = object_attrs(e)?;
    if empty {
        return Ok(style);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => style_child(reader, &child, false, &mut style)?,
            XmlEvent::Empty(child) => style_child(reader, &child, true, &mut style)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(style)
}

fn style_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    style: &mut Style,
) -> Result<(), ParseError> {
    match child.name().as_ref() {
        b"IconStyle" => style.icon_style = Some(parse_icon_style(reader, child, empty)?),
        b"LabelStyle" => style.label_style = Some(parse_label_style(reader, child, empty)?),
        b"LineStyle" => style.line_style = Some(parse_line_style(reader, child, empty)?),
        b"PolyStyle" => style.poly_style = Some(parse_poly_style(reader, child, empty)?),
        b"BalloonStyle" => style.balloon_style = Some(parse_balloon_style(reader, child, empty)?),
        b"ListStyle" => style.list_style = Some(parse_list_style(reader, child, empty)?),
        _ => skip_unhandled(reader, child, empty)?,
    }
    Ok(())
}

fn color_style_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    cs: &mut ColorStyle,
    element: &'static str,
) -> Result<bool, ParseError> {
    match child.name().as_ref() {
        b"color" => cs.color = parse_color(element, "color", &text_of(reader, empty)?)?,
        b"colorMode" => {
            let text = text_of(reader, empty)?;
            cs.color_mode = crate::enums::ColorMode::from_kml(&text).ok_or_else(|| {
                ParseError::UnknownEnumValue {
                    element,
                    field: "colorMode",
                    value: text,
                }
            })?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_icon_style(reader: &mut R, e: &BytesStart, empty: bool) -> Result<IconStyle, ParseError> {
    let mut s = IconStyle::default();
    (s.id, s.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => icon_style_child(reader, &child, false, &mut s)?,
            XmlEvent::Empty(child) => icon_style_child(reader, &child, true, &mut s)?,
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn icon_style_child(
    reader: &mut R,
    child: &BytesStart,
    empty: bool,
    s: &mut IconStyle,
) -> Result<(), ParseError> {
    if color_style_child(reader, child, empty, &mut s.color_style, "IconStyle")? {
        return Ok(());
    }
    match child.name().as_ref() {
        b"scale" => s.scale = parse_f64("IconStyle", "scale", &text_of(reader, empty)?)?,
        b"heading" => s.heading = parse_f64("IconStyle", "heading", &text_of(reader, empty)?)?,
        b"Icon" => s.icon = Some(parse_icon(reader, child, empty)?),
        b"hotSpot" => {
            s.hot_spot = Some(parse_xy("hotSpot", child)?);
            if !empty {
                skip_element(reader)?;
            }
        }
        _ => skip_unhandled(reader, child, empty)?,
    }
    Ok(())
}

fn parse_label_style(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<LabelStyle, ParseError> {
    let mut s = LabelStyle::default();
    (s.id, s.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if !color_style_child(reader, &child, false, &mut s.color_style, "LabelStyle")? {
                    if child.name().as_ref() == b"scale" {
                        s.scale = parse_f64("LabelStyle", "scale", &element_text(reader)?)?;
                    } else {
                        skip_unhandled(reader, &child, false)?;
                    }
                }
            }
            XmlEvent::Empty(child) => {
                let _ = color_style_child(reader, &child, true, &mut s.color_style, "LabelStyle")?;
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn parse_line_style(reader: &mut R, e: &BytesStart, empty: bool) -> Result<LineStyle, ParseError> {
    let mut s = LineStyle::default();
    (s.id, s.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if !color_style_child(reader, &child, false, &mut s.color_style, "LineStyle")? {
                    if child.name().as_ref() == b"width" {
                        s.width = parse_f64("LineStyle", "width", &element_text(reader)?)?;
                    } else {
                        skip_unhandled(reader, &child, false)?;
                    }
                }
            }
            XmlEvent::Empty(child) => {
                let _ = color_style_child(reader, &child, true, &mut s.color_style, "LineStyle")?;
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn parse_poly_style(reader: &mut R, e: &BytesStart, empty: bool) -> Result<PolyStyle, ParseError> {
    let mut s = PolyStyle::default();
    (s.id, s.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if !color_style_child(reader, &child, false, &mut s.color_style, "PolyStyle")? {
                    match child.name().as_ref() {
                        b"fill" => s.fill = parse_bool("PolyStyle", "fill", &element_text(reader)?)?,
                        b"outline" => {
                            s.outline = parse_bool("PolyStyle", "outline", &element_text(reader)?)?
                        }
                        _ => skip_unhandled(reader, &child, false)?,
                    }
                }
            }
            XmlEvent::Empty(child) => {
                let _ = color_style_child(reader, &child, true, &mut s.color_style, "PolyStyle")?;
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn parse_balloon_style(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<BalloonStyle, ParseError> {
    let mut s = BalloonStyle::default();
    (s.id, s.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"bgColor" => s.bg_color = Some(parse_color("BalloonStyle", "bgColor", &text)?),
                    b"textColor" => {
                        s.text_color = Some(parse_color("BalloonStyle", "textColor", &text)?)
                    }
                    b"text" => s.text = Some(text),
                    b"displayMode" => {
                        s.display_mode = DisplayMode::from_kml(&text).ok_or_else(|| {
                            ParseError::UnknownEnumValue {
                                element: "BalloonStyle",
                                field: "displayMode",
                                value: text.clone(),
                            }
                        })?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn parse_list_style(reader: &mut R, e: &BytesStart, empty: bool) -> Result<ListStyle, ParseError> {
    let mut s = ListStyle::default();
    (s.id, s.target_id) = object_attrs(e)?;
    if empty {
        return Ok(s);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"listItemType" => {
                    let text = element_text(reader)?;
                    s.list_item_type = ListItemType::from_kml(&text).ok_or_else(|| {
                        ParseError::UnknownEnumValue {
                            element: "ListStyle",
                            field: "listItemType",
                            value: text,
                        }
                    })?;
                }
                b"bgColor" => {
                    s.bg_color = Some(parse_color("ListStyle", "bgColor", &element_text(reader)?)?)
                }
                b"ItemIcon" => s.item_icons.push(parse_item_icon(reader)?),
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(s)
}

fn parse_item_icon(reader: &mut R) -> Result<ItemIcon, ParseError> {
    let mut item = ItemIcon::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"state" => item.state = Some(element_text(reader)?),
                b"href" => item.href = element_text(reader)?,
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(item)
}

fn parse_style_map(reader: &mut R, e: &BytesStart, empty: bool) -> Result<StyleMap, ParseError> {
    let mut map = StyleMap::default();
    (map.id, map.target_id) = object_attrs(e)?;
    if empty {
        return Ok(map);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"Pair" {
                    map.pairs.push(parse_pair(reader, &child)?);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(map)
}

fn parse_pair(reader: &mut R, e: &BytesStart) -> Result<Pair, ParseError> {
    let mut pair = Pair::default();
    (pair.id, pair.target_id) = object_attrs(e)?;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"key" => {
                    let text = element_text(reader)?;
                    pair.key = StyleState::from_kml(&text).ok_or_else(|| {
                        ParseError::UnknownEnumValue {
                            element: "Pair",
                            field: "key",
                            value: text,
                        }
                    })?;
                }
                b"styleUrl" => pair.style_url = Some(element_text(reader)?),
                b"Style" => pair.style = Some(Box::new(parse_style(reader, &child, false)?)),
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(pair)
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Parse any geometry element, dispatching on the element name.
fn parse_geometry(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<Geometry, ParseError> {
    match e.name().as_ref() {
        b"Point" => Ok(Geometry::Point(parse_point(reader, e, empty)?)),
        b"LineString" => Ok(Geometry::LineString(parse_line_string(reader, e, empty)?)),
        b"LinearRing" => Ok(Geometry::LinearRing(parse_linear_ring(reader, e, empty)?)),
        b"Polygon" => Ok(Geometry::Polygon(parse_polygon(reader, e, empty)?)),
        b"MultiGeometry" => Ok(Geometry::MultiGeometry(parse_multi_geometry(reader, e, empty)?)),
        b"Model" => Ok(Geometry::Model(parse_model(reader, e, empty)?)),
        b"gx:Track" => Ok(Geometry::Track(parse_track(reader, e, empty)?)),
        b"gx:MultiTrack" => Ok(Geometry::MultiTrack(parse_multi_track(reader, e, empty)?)),
        _ => Err(ParseError::NoRootElement),
    }
}

fn parse_point(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Point, ParseError> {
    let mut point = Point::default();
    (point.id, point.target_id) = object_attrs(e)?;
    if empty {
        return Ok(point);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"extrude" => point.extrude = parse_bool("Point", "extrude", &text)?,
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        point.altitude_mode = parse_altitude_mode("Point", &name, &text)?
                    }
                    b"coordinates" => {
                        let coords = parse_coords(&text).ok_or(ParseError::InvalidCoordinates {
                            element: "Point",
                            field: "coordinates",
                        })?;
                        point.coord =
                            *coords.first().ok_or(ParseError::MissingField {
                                element: "Point",
                                field: "coordinates",
                            })?;
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(point)
}

/// Shared line-geometry fields; `LineString` and `LinearRing` differ only in
/// element name and closure semantics.
struct LineFields {
    extrude: bool,
    tessellate: bool,
    altitude_mode: AnyAltitudeMode,
    coords: Vec<Coord>,
}

fn parse_line_fields(
    reader: &mut R,
    element: &'static str,
    empty: bool,
) -> Result<LineFields, ParseError> {
    let mut fields = LineFields {
        extrude: false,
        tessellate: false,
        altitude_mode: AnyAltitudeMode::default(),
        coords: Vec::new(),
    };
    if empty {
        return Ok(fields);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                let text = element_text(reader)?;
                match name.as_slice() {
                    b"extrude" => fields.extrude = parse_bool(element, "extrude", &text)?,
                    b"tessellate" => fields.tessellate = parse_bool(element, "tessellate", &text)?,
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        fields.altitude_mode = parse_altitude_mode(element, &name, &text)?
                    }
                    b"coordinates" => {
                        fields.coords =
                            parse_coords(&text).ok_or(ParseError::InvalidCoordinates {
                                element,
                                field: "coordinates",
                            })?
                    }
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(fields)
}

fn parse_line_string(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<LineString, ParseError> {
    let (id, target_id) = object_attrs(e)?;
    let fields = parse_line_fields(reader, "LineString", empty)?;
    Ok(LineString {
        id,
        target_id,
        extrude: fields.extrude,
        tessellate: fields.tessellate,
        altitude_mode: fields.altitude_mode,
        coords: fields.coords,
    })
}

fn parse_linear_ring(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<LinearRing, ParseError> {
    let (id, target_id) = object_attrs(e)?;
    let fields = parse_line_fields(reader, "LinearRing", empty)?;
    Ok(LinearRing {
        id,
        target_id,
        extrude: fields.extrude,
        tessellate: fields.tessellate,
        altitude_mode: fields.altitude_mode,
        coords: fields.coords,
    })
}

fn parse_polygon(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Polygon, ParseError> {
    let mut polygon = Polygon::default();
    (polygon.id, polygon.target_id) = object_attrs(e)?;
    if empty {
        return Ok(polygon);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                match name.as_slice() {
                    b"outerBoundaryIs" => {
                        if let Some(ring) = parse_boundary(reader)? {
                            polygon.outer = ring;
                        }
                    }
                    b"innerBoundaryIs" => {
                        if let Some(ring) = parse_boundary(reader)? {
                            polygon.inner.push(ring);
                        }
                    }
                    b"extrude" => {
                        polygon.extrude =
                            parse_bool("Polygon", "extrude", &element_text(reader)?)?
                    }
                    b"tessellate" => {
                        polygon.tessellate =
                            parse_bool("Polygon", "tessellate", &element_text(reader)?)?
                    }
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        polygon.altitude_mode =
                            parse_altitude_mode("Polygon", &name, &element_text(reader)?)?
                    }
                    _ => skip_element(reader)?,
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(polygon)
}

fn parse_boundary(reader: &mut R) -> Result<Option<LinearRing>, ParseError> {
    let mut ring = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"LinearRing" {
                    ring = Some(parse_linear_ring(reader, &child, false)?);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::Empty(child) => {
                if child.name().as_ref() == b"LinearRing" {
                    ring = Some(parse_linear_ring(reader, &child, true)?);
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(ring)
}

fn parse_multi_geometry(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<MultiGeometry, ParseError> {
    let mut multi = MultiGeometry::default();
    (multi.id, multi.target_id) = object_attrs(e)?;
    if empty {
        return Ok(multi);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if is_geometry_element(child.name().as_ref()) {
                    multi.geometries.push(parse_geometry(reader, &child, false)?);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::Empty(child) => {
                if is_geometry_element(child.name().as_ref()) {
                    multi.geometries.push(parse_geometry(reader, &child, true)?);
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(multi)
}

fn parse_model(reader: &mut R, e: &BytesStart, empty: bool) -> Result<Model, ParseError> {
    let mut model = Model::default();
    (model.id, model.target_id) = object_attrs(e)?;
    if empty {
        return Ok(model);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                match name.as_slice() {
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        model.altitude_mode =
                            parse_altitude_mode("Model", &name, &element_text(reader)?)?
                    }
                    b"Location" => model.location = parse_location(reader)?,
                    b"Orientation" => model.orientation = parse_orientation(reader, "Model")?,
                    b"Scale" => model.scale = parse_scale(reader)?,
                    b"Link" => model.link = Some(parse_link(reader, &child, false, "Link")?),
                    b"ResourceMap" => model.resource_map = parse_resource_map(reader)?,
                    _ => skip_element(reader)?,
                }
            }
            XmlEvent::Empty(child) => {
                if child.name().as_ref() == b"Link" {
                    model.link = Some(parse_link(reader, &child, true, "Link")?);
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(model)
}

fn parse_location(reader: &mut R) -> Result<Location, ParseError> {
    let mut location = Location::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"longitude" => location.longitude = parse_f64("Location", "longitude", &text)?,
                    b"latitude" => location.latitude = parse_f64("Location", "latitude", &text)?,
                    b"altitude" => location.altitude = parse_f64("Location", "altitude", &text)?,
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(location)
}

fn parse_orientation(reader: &mut R, element: &'static str) -> Result<Orientation, ParseError> {
    let mut orientation = Orientation::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"heading" => orientation.heading = parse_f64(element, "heading", &text)?,
                    b"tilt" => orientation.tilt = parse_f64(element, "tilt", &text)?,
                    b"roll" => orientation.roll = parse_f64(element, "roll", &text)?,
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(orientation)
}

fn parse_scale(reader: &mut R) -> Result<Scale, ParseError> {
    let mut scale = Scale::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"x" => scale.x = parse_f64("Scale", "x", &text)?,
                    b"y" => scale.y = parse_f64("Scale", "y", &text)?,
                    b"z" => scale.z = parse_f64("Scale", "z", &text)?,
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(scale)
}

fn parse_resource_map(reader: &mut R) -> Result<Vec<Alias>, ParseError> {
    let mut aliases = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"Alias" {
                    aliases.push(parse_alias(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(aliases)
}

fn parse_alias(reader: &mut R) -> Result<Alias, ParseError> {
    let mut alias = Alias::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let text = element_text(reader)?;
                match child.name().as_ref() {
                    b"targetHref" => alias.target_href = text,
                    b"sourceHref" => alias.source_href = text,
                    _ => {}
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(alias)
}

// ---------------------------------------------------------------------------
// gx: tours and tracks
// ---------------------------------------------------------------------------

fn parse_tour(reader: &mut R, e: &BytesStart, empty: bool) -> Result<gx::Tour, ParseError> {
    let mut tour = gx::Tour::default();
    (tour.common.id, tour.common.target_id) = object_attrs(e)?;
    if empty {
        return Ok(tour);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"gx:Playlist" {
                    tour.playlist = parse_playlist(reader)?;
                } else if !feature_common_child(reader, &child, false, &mut tour.common)? {
                    skip_unhandled(reader, &child, false)?;
                }
            }
            XmlEvent::Empty(child) => {
                if !feature_common_child(reader, &child, true, &mut tour.common)? {
                    skip_unhandled(reader, &child, true)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(tour)
}

fn parse_playlist(reader: &mut R) -> Result<Vec<gx::TourPrimitive>, ParseError> {
    let mut playlist = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if let Some(primitive) = parse_tour_primitive(reader, &child, false)? {
                    playlist.push(primitive);
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::Empty(child) => {
                if let Some(primitive) = parse_tour_primitive(reader, &child, true)? {
                    playlist.push(primitive);
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(playlist)
}

fn parse_tour_primitive(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<Option<gx::TourPrimitive>, ParseError> {
    let primitive = match e.name().as_ref() {
        b"gx:AnimatedUpdate" => Some(gx::TourPrimitive::AnimatedUpdate(parse_animated_update(
            reader, e, empty,
        )?)),
        b"gx:FlyTo" => Some(gx::TourPrimitive::FlyTo(parse_fly_to(reader, e, empty)?)),
        b"gx:SoundCue" => Some(gx::TourPrimitive::SoundCue(parse_sound_cue(reader, e, empty)?)),
        b"gx:Wait" => Some(gx::TourPrimitive::Wait(parse_wait(reader, e, empty)?)),
        _ => None,
    };
    Ok(primitive)
}

fn parse_animated_update(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<gx::AnimatedUpdate, ParseError> {
    let mut update = gx::AnimatedUpdate::default();
    (update.id, update.target_id) = object_attrs(e)?;
    if empty {
        return Ok(update);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"gx:duration" => {
                    update.duration =
                        parse_f64("gx:AnimatedUpdate", "gx:duration", &element_text(reader)?)?
                }
                b"Update" => update.update = parse_update(reader)?,
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(update)
}

fn parse_update(reader: &mut R) -> Result<gx::Update, ParseError> {
    let mut update = gx::Update::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"targetHref" {
                    update.target_href = element_text(reader)?;
                } else {
                    // Change/Create/Delete payloads belong to the external
                    // update protocol; carried verbatim.
                    update.operations.push(capture_element(reader, &child, false)?);
                }
            }
            XmlEvent::Empty(child) => {
                if child.name().as_ref() != b"targetHref" {
                    update.operations.push(capture_element(reader, &child, true)?);
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(update)
}

fn parse_fly_to(reader: &mut R, e: &BytesStart, empty: bool) -> Result<gx::FlyTo, ParseError> {
    let mut fly_to = gx::FlyTo::default();
    (fly_to.id, fly_to.target_id) = object_attrs(e)?;
    if empty {
        return Ok(fly_to);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"gx:duration" => {
                    fly_to.duration = parse_f64("gx:FlyTo", "gx:duration", &element_text(reader)?)?
                }
                b"gx:flyToMode" => {
                    let text = element_text(reader)?;
                    fly_to.mode = gx::FlyToMode::from_kml(&text).ok_or_else(|| {
                        ParseError::UnknownEnumValue {
                            element: "gx:FlyTo",
                            field: "gx:flyToMode",
                            value: text,
                        }
                    })?;
                }
                b"Camera" => {
                    fly_to.view =
                        Some(AbstractView::Camera(parse_camera(reader, &child, false)?))
                }
                b"LookAt" => {
                    fly_to.view =
                        Some(AbstractView::LookAt(parse_look_at(reader, &child, false)?))
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(fly_to)
}

fn parse_sound_cue(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<gx::SoundCue, ParseError> {
    let mut cue = gx::SoundCue::default();
    (cue.id, cue.target_id) = object_attrs(e)?;
    if empty {
        return Ok(cue);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => match child.name().as_ref() {
                b"href" => cue.href = element_text(reader)?,
                b"gx:delayedStart" => {
                    cue.delayed_start =
                        parse_f64("gx:SoundCue", "gx:delayedStart", &element_text(reader)?)?
                }
                _ => skip_element(reader)?,
            },
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(cue)
}

fn parse_wait(reader: &mut R, e: &BytesStart, empty: bool) -> Result<gx::Wait, ParseError> {
    let mut wait = gx::Wait::default();
    (wait.id, wait.target_id) = object_attrs(e)?;
    if empty {
        return Ok(wait);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                if child.name().as_ref() == b"gx:duration" {
                    wait.duration = parse_f64("gx:Wait", "gx:duration", &element_text(reader)?)?;
                } else {
                    skip_element(reader)?;
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(wait)
}

fn parse_track(reader: &mut R, e: &BytesStart, empty: bool) -> Result<gx::Track, ParseError> {
    let mut track = gx::Track::default();
    (track.id, track.target_id) = object_attrs(e)?;
    if empty {
        return Ok(track);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                match name.as_slice() {
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        track.altitude_mode =
                            parse_altitude_mode("gx:Track", &name, &element_text(reader)?)?
                    }
                    b"when" => track
                        .when
                        .push(parse_datetime("gx:Track", "when", &element_text(reader)?)?),
                    b"gx:coord" => track.coords.push(parse_gx_coord(&element_text(reader)?)?),
                    b"gx:angles" => track.angles.push(parse_gx_angles(&element_text(reader)?)?),
                    b"Model" => {
                        track.model = Some(Box::new(parse_model(reader, &child, false)?))
                    }
                    b"ExtendedData" => {
                        track.extended_data = Some(parse_extended_data(reader, false)?)
                    }
                    _ => skip_element(reader)?,
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(track)
}

fn parse_gx_coord(text: &str) -> Result<Coord, ParseError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let invalid = ParseError::InvalidCoordinates {
        element: "gx:Track",
        field: "gx:coord",
    };
    match parts.as_slice() {
        [lon, lat] => Ok(Coord::new(
            lon.parse().map_err(|_| invalid_coord())?,
            lat.parse().map_err(|_| invalid_coord())?,
        )),
        [lon, lat, alt] => Ok(Coord::with_alt(
            lon.parse().map_err(|_| invalid_coord())?,
            lat.parse().map_err(|_| invalid_coord())?,
            alt.parse().map_err(|_| invalid_coord())?,
        )),
        _ => Err(invalid),
    }
}

fn invalid_coord() -> ParseError {
    ParseError::InvalidCoordinates {
        element: "gx:Track",
        field: "gx:coord",
    }
}

fn parse_gx_angles(text: &str) -> Result<Orientation, ParseError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if let [heading, tilt, roll] = parts.as_slice() {
        return Ok(Orientation {
            heading: parse_f64("gx:Track", "gx:angles", heading)?,
            tilt: parse_f64("gx:Track", "gx:angles", tilt)?,
            roll: parse_f64("gx:Track", "gx:angles", roll)?,
        });
    }
    Err(ParseError::InvalidCoordinates {
        element: "gx:Track",
        field: "gx:angles",
    })
}

fn parse_multi_track(
    reader: &mut R,
    e: &BytesStart,
    empty: bool,
) -> Result<gx::MultiTrack, ParseError> {
    let mut multi = gx::MultiTrack::default();
    (multi.id, multi.target_id) = object_attrs(e)?;
    if empty {
        return Ok(multi);
    }
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(child) => {
                let name = child.name().as_ref().to_vec();
                match name.as_slice() {
                    b"altitudeMode" | b"gx:altitudeMode" => {
                        multi.altitude_mode =
                            parse_altitude_mode("gx:MultiTrack", &name, &element_text(reader)?)?
                    }
                    b"gx:interpolate" => {
                        multi.interpolate = parse_bool(
                            "gx:MultiTrack",
                            "gx:interpolate",
                            &element_text(reader)?,
                        )?
                    }
                    b"gx:Track" => multi.tracks.push(parse_track(reader, &child, false)?),
                    _ => skip_element(reader)?,
                }
            }
            XmlEvent::End(_) => break,
            XmlEvent::Eof => return Err(ParseError::UnexpectedEof),
            _ => {}
        }
        buf.clear();
    }
    Ok(multi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::serialize_kml;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document id="doc-1">
    <name>Sample</name>
    <open>1</open>
    <Style id="pin">
      <IconStyle>
        <color>ff0000ff</color>
        <scale>1.2</scale>
        <Icon><href>http://example.com/pin.png</href></Icon>
      </IconStyle>
      <LineStyle><color>7f00ffff</color><width>4</width></LineStyle>
    </Style>
    <Folder>
      <name>Sights</name>
      <Placemark id="pm-1">
        <name>Golden Gate</name>
        <styleUrl>#pin</styleUrl>
        <Point>
          <coordinates>-122.4783,37.8199,67</coordinates>
        </Point>
      </Placemark>
      <Placemark>
        <name>Hidden</name>
        <visibility>0</visibility>
        <LineString>
          <tessellate>1</tessellate>
          <coordinates>-122.1,37.1 -122.2,37.2,10</coordinates>
        </LineString>
      </Placemark>
    </Folder>
  </Document>
</kml>"#;

    #[test]
    fn test_parse_document_tree() {
        let kml = parse_kml(SAMPLE).expect("parse failed");
        let Some(Feature::Document(doc)) = kml.feature else {
            panic!("expected Document root");
        };
        assert_eq!(doc.common.id.as_deref(), Some("doc-1"));
        assert_eq!(doc.common.name.as_deref(), Some("Sample"));
        assert!(doc.common.open);
        assert_eq!(doc.common.style_selectors.len(), 1);
        assert_eq!(doc.features.len(), 1);

        let Feature::Folder(folder) = &doc.features[0] else {
            panic!("expected Folder");
        };
        assert_eq!(folder.features.len(), 2);

        let Feature::Placemark(first) = &folder.features[0] else {
            panic!("expected Placemark");
        };
        assert_eq!(first.common.style_url.as_deref(), Some("#pin"));
        let Some(Geometry::Point(point)) = &first.geometry else {
            panic!("expected Point");
        };
        assert_eq!(point.coord, Coord::with_alt(-122.4783, 37.8199, 67.0));

        let Feature::Placemark(second) = &folder.features[1] else {
            panic!("expected Placemark");
        };
        assert!(!second.common.visibility);
        let Some(Geometry::LineString(line)) = &second.geometry else {
            panic!("expected LineString");
        };
        assert!(line.tessellate);
        assert_eq!(line.coords.len(), 2);
    }

    #[test]
    fn test_absent_fields_get_documented_defaults() {
        let kml = parse_kml("<kml><Placemark><name>p</name></Placemark></kml>").unwrap();
        let Some(Feature::Placemark(p)) = kml.feature else {
            panic!("expected Placemark");
        };
        assert!(p.common.visibility);
        assert!(!p.common.open);

        let kml = parse_kml(
            "<kml><NetworkLink><Link><href>u</href></Link></NetworkLink></kml>",
        )
        .unwrap();
        let Some(Feature::NetworkLink(n)) = kml.feature else {
            panic!("expected NetworkLink");
        };
        let link = n.link.unwrap();
        assert_eq!(link.refresh_mode, RefreshMode::OnChange);
        assert_eq!(link.view_refresh_mode, ViewRefreshMode::Never);
        assert_eq!(link.view_bound_scale, 1.0);
        assert_eq!(link.refresh_interval, None);
    }

    #[test]
    fn test_unknown_enum_value_is_a_structured_error() {
        let err = parse_kml(
            "<kml><NetworkLink><Link><refreshMode>whenever</refreshMode></Link></NetworkLink></kml>",
        )
        .unwrap_err();
        match err {
            ParseError::UnknownEnumValue {
                element,
                field,
                value,
            } => {
                assert_eq!(element, "Link");
                assert_eq!(field, "refreshMode");
                assert_eq!(value, "whenever");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_kml(
            "<kml><Placemark><Point><altitudeMode>floating</altitudeMode></Point></Placemark></kml>",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnknownEnumValue { field: "altitudeMode", .. }));
    }

    #[test]
    fn test_screen_overlay_units() {
        let kml = parse_kml(
            r#"<kml><ScreenOverlay><size x="-1" y="0" xunits="pixels" yunits="fraction"/></ScreenOverlay></kml>"#,
        )
        .unwrap();
        let Some(Feature::ScreenOverlay(s)) = kml.feature else {
            panic!("expected ScreenOverlay");
        };
        let size = s.size.unwrap();
        assert_eq!(size.x, -1.0);
        assert_eq!(size.y, 0.0);
        assert_eq!(size.xunits, Units::Pixels);
        assert_eq!(size.yunits, Units::Fraction);
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let kml =
            parse_kml(r#"<kml><Placemark id="a&amp;b"><name>entity</name></Placemark></kml>"#)
                .unwrap();
        let Some(Feature::Placemark(p)) = &kml.feature else {
            panic!("expected Placemark");
        };
        assert_eq!(p.common.id.as_deref(), Some("a&b"));

        // Re-serializing escapes once, never twice.
        let xml = crate::serializer::serialize_kml(&kml);
        assert!(xml.contains(r#"id="a&amp;b""#));
        assert!(!xml.contains("&amp;amp;"));
    }

    #[test]
    fn test_extended_data_escape_hatch() {
        let kml = parse_kml(
            r#"<kml><Placemark><ExtendedData>
                <Data name="depth"><value>12.5</value></Data>
                <custom:level xmlns:custom="http://example.com">7</custom:level>
            </ExtendedData></Placemark></kml>"#,
        )
        .unwrap();
        let Some(Feature::Placemark(p)) = kml.feature else {
            panic!("expected Placemark");
        };
        let extended = p.common.extended_data.unwrap();
        assert_eq!(extended.data[0].name, "depth");
        assert_eq!(extended.data[0].value, "12.5");
        assert_eq!(extended.other.len(), 1);
        assert!(extended.other[0].contains("custom:level"));
        assert!(extended.other[0].contains('7'));
    }

    #[test]
    fn test_gx_track() {
        let kml = parse_kml(
            r#"<kml><Placemark><gx:Track>
                <gx:altitudeMode>relativeToSeaFloor</gx:altitudeMode>
                <when>2024-06-01T10:00:00Z</when>
                <when>2024-06-01T10:00:10Z</when>
                <gx:coord>-122.2 37.4 50</gx:coord>
                <gx:coord>-122.21 37.41 52</gx:coord>
                <gx:angles>45 0 0</gx:angles>
            </gx:Track></Placemark></kml>"#,
        )
        .unwrap();
        let Some(Feature::Placemark(p)) = kml.feature else {
            panic!("expected Placemark");
        };
        let Some(Geometry::Track(track)) = p.geometry else {
            panic!("expected gx:Track");
        };
        assert_eq!(track.when.len(), 2);
        assert_eq!(track.coords.len(), 2);
        assert_eq!(track.coords[0], Coord::with_alt(-122.2, 37.4, 50.0));
        assert_eq!(track.angles[0].heading, 45.0);
        assert!(track.altitude_mode.is_gx());
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(matches!(
            parse_kml("not xml at all"),
            Err(ParseError::NoRootElement)
        ));
        assert!(parse_kml("<kml><Placemark><Point><coordinates>a,b</coordinates></Point></Placemark></kml>").is_err());
        assert!(parse_kml("<kml><Placemark><TimeStamp></TimeStamp></Placemark></kml>").is_err());
    }

    #[test]
    fn test_roundtrip_through_serializer() {
        let kml = parse_kml(SAMPLE).expect("parse failed");
        let xml = serialize_kml(&kml);
        let reparsed = parse_kml(&xml).expect("reparse failed");
        assert_eq!(kml, reparsed);
    }
}
