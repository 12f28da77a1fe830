//! End-to-end tests: build a rich document tree, serialize it, parse it
//! back, and check the result is the same tree. Also covers default
//! omission on output, default population on input, and conditional
//! namespace declarations.

use chrono::{TimeZone, Utc};
use kml_dom::feature::{
    AtomAuthor, AtomLink, Data, ExtendedData, Schema, SchemaData, SimpleData, SimpleField, Snippet,
};
use kml_dom::geometry::{Alias, Model, MultiGeometry, Scale};
use kml_dom::gx;
use kml_dom::overlay::{ImagePyramid, LatLonBox, ViewVolume};
use kml_dom::style::{IconStyle, LineStyle, Pair, PolyStyle, StyleState};
use kml_dom::{
    parse_kml, serialize_kml, validate_kml, AltitudeMode, Camera, Color, Coord, Document, Feature,
    Folder, Geometry, GroundOverlay, Icon, Kml, LineString, LinearRing, Link, LookAt, NetworkLink,
    PhotoOverlay, Placemark, Point, Polygon, RefreshMode, ScreenOverlay, Style, StyleMap,
    StyleSelector, TimePrimitive, TimeSpan, ViewRefreshMode, Xy,
};

fn closed_ring(origin_lon: f64, origin_lat: f64) -> LinearRing {
    LinearRing {
        coords: vec![
            Coord::new(origin_lon, origin_lat),
            Coord::new(origin_lon + 0.01, origin_lat),
            Coord::new(origin_lon + 0.01, origin_lat + 0.01),
            Coord::new(origin_lon, origin_lat),
        ],
        ..Default::default()
    }
}

/// A document exercising every feature variant, most geometry kinds, shared
/// styles and schemas, and the gx extension elements.
fn sample_tree() -> Kml {
    let mut doc = Document::default();
    doc.common.id = Some("doc".to_string());
    doc.common.name = Some("Bay Area survey".to_string());
    doc.common.open = true;
    doc.common.snippet = Some(Snippet::new("Field notes, June 2024"));
    doc.common.atom_author = Some(AtomAuthor {
        name: "Trail Team".to_string(),
    });
    doc.common.atom_link = Some(AtomLink {
        href: "http://example.com/source".to_string(),
    });

    let mut base = Style::default();
    base.id = Some("base".to_string());
    base.icon_style = Some(IconStyle {
        scale: 1.4,
        icon: Some(Icon {
            link: Link::new("http://example.com/pin.png"),
            ..Default::default()
        }),
        hot_spot: Some(Xy::fraction(0.5, 0.5)),
        ..Default::default()
    });
    base.line_style = Some(LineStyle {
        width: 3.0,
        ..Default::default()
    });
    base.poly_style = Some(PolyStyle {
        outline: false,
        ..Default::default()
    });
    doc.common.style_selectors.push(StyleSelector::Style(base));

    let mut map = StyleMap::default();
    map.id = Some("base-map".to_string());
    map.pairs.push(Pair {
        key: StyleState::Normal,
        style_url: Some("#base".to_string()),
        ..Default::default()
    });
    map.pairs.push(Pair {
        key: StyleState::Highlight,
        style: Some(Box::new(Style {
            line_style: Some(LineStyle {
                color_style: kml_dom::style::ColorStyle {
                    color: Color::new(0xff, 0x00, 0x00, 0xff),
                    ..Default::default()
                },
                width: 5.0,
                ..Default::default()
            }),
            ..Default::default()
        })),
        ..Default::default()
    });
    doc.common.style_selectors.push(StyleSelector::StyleMap(map));

    doc.schemas.push(Schema {
        id: Some("trail".to_string()),
        name: Some("trail".to_string()),
        fields: vec![SimpleField {
            field_type: "double".to_string(),
            name: "grade".to_string(),
            display_name: Some("Average grade".to_string()),
        }],
    });

    let mut folder = Folder::default();
    folder.common.name = Some("Features".to_string());

    let mut point_pm = Placemark::default();
    point_pm.common.id = Some("pm-point".to_string());
    point_pm.common.name = Some("Summit".to_string());
    point_pm.common.style_url = Some("#base-map".to_string());
    point_pm.common.time_primitive = Some(TimePrimitive::TimeSpan(TimeSpan {
        begin: Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
        end: Some(Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()),
        ..Default::default()
    }));
    point_pm.common.extended_data = Some(ExtendedData {
        data: vec![Data {
            name: "surface".to_string(),
            display_name: None,
            value: "granite".to_string(),
        }],
        schema_data: vec![SchemaData {
            schema_url: "#trail".to_string(),
            values: vec![SimpleData {
                name: "grade".to_string(),
                value: "0.08".to_string(),
            }],
        }],
        other: vec!["<camp:sites xmlns:camp=\"http://example.com/camp\">3</camp:sites>".to_string()],
    });
    point_pm.geometry = Some(Geometry::Point(Point {
        altitude_mode: AltitudeMode::Absolute.into(),
        coord: Coord::with_alt(-121.76, 46.85, 4392.0),
        ..Default::default()
    }));
    folder.features.push(Feature::Placemark(point_pm));

    let mut line_pm = Placemark::default();
    line_pm.common.name = Some("Approach".to_string());
    line_pm.common.visibility = false;
    line_pm.geometry = Some(Geometry::LineString(LineString {
        tessellate: true,
        coords: vec![
            Coord::new(-121.9, 46.7),
            Coord::new(-121.85, 46.75),
            Coord::with_alt(-121.8, 46.8, 1200.0),
        ],
        ..Default::default()
    }));
    folder.features.push(Feature::Placemark(line_pm));

    let mut poly_pm = Placemark::default();
    poly_pm.common.name = Some("Permit zone".to_string());
    poly_pm.geometry = Some(Geometry::Polygon(Polygon {
        outer: closed_ring(-121.9, 46.7),
        inner: vec![closed_ring(-121.897, 46.702)],
        ..Default::default()
    }));
    folder.features.push(Feature::Placemark(poly_pm));

    let mut multi_pm = Placemark::default();
    multi_pm.common.name = Some("Camps".to_string());
    multi_pm.geometry = Some(Geometry::MultiGeometry(MultiGeometry {
        geometries: vec![
            Geometry::Point(Point::new(Coord::new(-121.88, 46.72))),
            Geometry::Point(Point::new(Coord::new(-121.87, 46.73))),
        ],
        ..Default::default()
    }));
    folder.features.push(Feature::Placemark(multi_pm));

    let mut model_pm = Placemark::default();
    model_pm.common.name = Some("Ranger hut".to_string());
    model_pm.geometry = Some(Geometry::Model(Model {
        altitude_mode: AltitudeMode::RelativeToGround.into(),
        location: kml_dom::geometry::Location {
            longitude: -121.86,
            latitude: 46.74,
            altitude: 2.0,
        },
        scale: Scale {
            x: 2.0,
            y: 2.0,
            z: 2.0,
        },
        link: Some(Link::new("http://example.com/hut.dae")),
        resource_map: vec![Alias {
            target_href: "textures/roof.jpg".to_string(),
            source_href: "../roof.jpg".to_string(),
        }],
        ..Default::default()
    }));
    folder.features.push(Feature::Placemark(model_pm));

    doc.features.push(Feature::Folder(folder));

    let mut ground = GroundOverlay::default();
    ground.common.name = Some("Shaded relief".to_string());
    ground.overlay.color = Color::new(0xcc, 0xff, 0xff, 0xff);
    ground.overlay.draw_order = 1;
    ground.overlay.icon = Some(Icon {
        link: Link::new("http://example.com/relief.png"),
        ..Default::default()
    });
    ground.lat_lon_box = Some(LatLonBox {
        north: 46.9,
        south: 46.6,
        east: -121.6,
        west: -122.0,
        rotation: 0.0,
    });
    doc.features.push(Feature::GroundOverlay(ground));

    let mut screen = ScreenOverlay::default();
    screen.common.name = Some("Legend".to_string());
    screen.overlay.icon = Some(Icon {
        link: Link::new("http://example.com/legend.png"),
        ..Default::default()
    });
    screen.overlay_xy = Some(Xy::fraction(0.0, 1.0));
    screen.screen_xy = Some(Xy::fraction(0.02, 0.98));
    screen.size = Some(Xy::new(
        -1.0,
        0.0,
        kml_dom::Units::Pixels,
        kml_dom::Units::Fraction,
    ));
    doc.features.push(Feature::ScreenOverlay(screen));

    let mut photo = PhotoOverlay::default();
    photo.common.name = Some("Summit cam".to_string());
    photo.overlay.icon = Some(Icon {
        link: Link::new("http://example.com/cam/$[level]/$[x]_$[y].jpg"),
        ..Default::default()
    });
    photo.view_volume = Some(ViewVolume {
        left_fov: -30.0,
        right_fov: 30.0,
        bottom_fov: -20.0,
        top_fov: 20.0,
        near: 10.0,
    });
    photo.image_pyramid = Some(ImagePyramid {
        tile_size: 512,
        max_width: 4096,
        max_height: 2048,
        ..Default::default()
    });
    photo.point = Some(Point::new(Coord::new(-121.76, 46.85)));
    doc.features.push(Feature::PhotoOverlay(photo));

    let mut network = NetworkLink::default();
    network.common.name = Some("Live conditions".to_string());
    network.fly_to_view = true;
    network.link = Some(Link {
        href: "http://example.com/conditions.kml".to_string(),
        refresh_mode: RefreshMode::OnInterval,
        refresh_interval: Some(120.0),
        view_refresh_mode: ViewRefreshMode::OnStop,
        view_refresh_time: Some(4.0),
        view_format: Some("BBOX=[bboxWest],[bboxSouth],[bboxEast],[bboxNorth]".to_string()),
        ..Default::default()
    });
    doc.features.push(Feature::NetworkLink(network));

    let mut tour = gx::Tour::default();
    tour.common.name = Some("Flyover".to_string());
    tour.playlist.push(gx::TourPrimitive::FlyTo(gx::FlyTo {
        duration: 5.0,
        mode: gx::FlyToMode::Smooth,
        view: Some(kml_dom::AbstractView::LookAt(LookAt {
            longitude: -121.76,
            latitude: 46.85,
            altitude: 4392.0,
            heading: 15.0,
            tilt: 60.0,
            range: 2000.0,
            ..Default::default()
        })),
        ..Default::default()
    }));
    tour.playlist.push(gx::TourPrimitive::Wait(gx::Wait {
        duration: 2.0,
        ..Default::default()
    }));
    tour.playlist.push(gx::TourPrimitive::SoundCue(gx::SoundCue {
        href: "http://example.com/narration.mp3".to_string(),
        delayed_start: 0.5,
        ..Default::default()
    }));
    doc.features.push(Feature::Tour(tour));

    let mut track_pm = Placemark::default();
    track_pm.common.name = Some("Ascent".to_string());
    let mut track = gx::Track::default();
    track.altitude_mode = AltitudeMode::Absolute.into();
    for (i, (lon, lat, alt)) in [
        (-121.9, 46.7, 1500.0),
        (-121.85, 46.75, 2400.0),
        (-121.8, 46.8, 3300.0),
    ]
    .into_iter()
    .enumerate()
    {
        track
            .when
            .push(Utc.with_ymd_and_hms(2024, 6, 1, 8 + i as u32, 0, 0).unwrap());
        track.coords.push(Coord::with_alt(lon, lat, alt));
    }
    track_pm.geometry = Some(Geometry::Track(track));
    doc.features.push(Feature::Placemark(track_pm));

    Kml {
        hint: None,
        feature: Some(Feature::Document(doc)),
    }
}

#[test]
fn test_sample_tree_is_valid() {
    assert_eq!(validate_kml(&sample_tree()), Vec::new());
}

#[test]
fn test_serialize_parse_roundtrip_preserves_tree() {
    let tree = sample_tree();
    let xml = serialize_kml(&tree);
    let reparsed = parse_kml(&xml).expect("failed to reparse serialized document");
    assert_eq!(tree, reparsed);
}

#[test]
fn test_parse_serialize_parse_reaches_fixpoint() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
  <Folder>
    <name>mixed</name>
    <Placemark>
      <name>a &amp; b</name>
      <Point><coordinates>1.5,2.5</coordinates></Point>
    </Placemark>
    <Placemark>
      <gx:Track>
        <when>2024-01-01T00:00:00Z</when>
        <gx:coord>1 2 3</gx:coord>
      </gx:Track>
    </Placemark>
  </Folder>
</kml>"#;
    let first = parse_kml(xml).expect("first parse failed");
    let rendered = serialize_kml(&first);
    let second = parse_kml(&rendered).expect("second parse failed");
    assert_eq!(first, second);
    assert_eq!(serialize_kml(&second), rendered);
}

#[test]
fn test_defaults_omitted_on_output_and_restored_on_input() {
    let mut pm = Placemark::default();
    pm.common.name = Some("plain".to_string());
    pm.geometry = Some(Geometry::Point(Point::new(Coord::new(1.0, 2.0))));
    let kml = Kml {
        hint: None,
        feature: Some(Feature::Placemark(pm)),
    };
    let xml = serialize_kml(&kml);
    assert!(!xml.contains("<visibility>"));
    assert!(!xml.contains("<open>"));
    assert!(!xml.contains("<altitudeMode>"));
    assert!(!xml.contains("<extrude>"));

    let reparsed = parse_kml(&xml).unwrap();
    let Some(Feature::Placemark(p)) = reparsed.feature else {
        panic!("expected Placemark");
    };
    assert!(p.common.visibility);
    assert!(!p.common.open);
    let Some(Geometry::Point(point)) = p.geometry else {
        panic!("expected Point");
    };
    assert!(!point.altitude_mode.is_gx());
}

#[test]
fn test_namespace_declarations_are_conditional() {
    let mut plain = Placemark::default();
    plain.geometry = Some(Geometry::Point(Point::new(Coord::new(0.0, 0.0))));
    let xml = serialize_kml(&Kml {
        hint: None,
        feature: Some(Feature::Placemark(plain)),
    });
    assert!(xml.contains("xmlns=\"http://www.opengis.net/kml/2.2\""));
    assert!(!xml.contains("xmlns:gx"));
    assert!(!xml.contains("xmlns:atom"));

    let xml = serialize_kml(&sample_tree());
    assert!(xml.contains("xmlns:gx=\"http://www.google.com/kml/ext/2.2\""));
    assert!(xml.contains("xmlns:atom=\"http://www.w3.org/2005/Atom\""));
}

#[test]
fn test_extended_data_passthrough_survives_roundtrip() {
    let tree = sample_tree();
    let xml = serialize_kml(&tree);
    assert!(xml.contains("<camp:sites xmlns:camp=\"http://example.com/camp\">3</camp:sites>"));
    let reparsed = parse_kml(&xml).unwrap();
    assert_eq!(serialize_kml(&reparsed), xml);
}

#[test]
fn test_refresh_descriptor_roundtrip_keeps_companions() {
    let tree = sample_tree();
    let xml = serialize_kml(&tree);
    let reparsed = parse_kml(&xml).unwrap();
    let Some(Feature::Document(doc)) = reparsed.feature else {
        panic!("expected Document");
    };
    let network = doc
        .features
        .iter()
        .find_map(|f| match f {
            Feature::NetworkLink(n) => Some(n),
            _ => None,
        })
        .expect("NetworkLink missing");
    let link = network.link.as_ref().unwrap();
    assert_eq!(link.refresh_mode, RefreshMode::OnInterval);
    assert_eq!(link.refresh_interval, Some(120.0));
    assert_eq!(link.view_refresh_mode, ViewRefreshMode::OnStop);
    assert_eq!(link.view_refresh_time, Some(4.0));
}

#[test]
fn test_camera_roundtrip_with_gx_altitude_mode() {
    let mut pm = Placemark::default();
    pm.common.abstract_view = Some(kml_dom::AbstractView::Camera(Camera {
        longitude: -121.0,
        latitude: 46.0,
        altitude: 500.0,
        tilt: 30.0,
        altitude_mode: gx::AltitudeMode::RelativeToSeaFloor.into(),
        ..Default::default()
    }));
    let kml = Kml {
        hint: None,
        feature: Some(Feature::Placemark(pm)),
    };
    let xml = serialize_kml(&kml);
    assert!(xml.contains("<gx:altitudeMode>relativeToSeaFloor</gx:altitudeMode>"));
    assert!(xml.contains("xmlns:gx"));
    let reparsed = parse_kml(&xml).unwrap();
    assert_eq!(kml, reparsed);
}
