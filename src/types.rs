//! Scalar primitives and small value types shared across the model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::Units;

/// Latitude-like angle, logically restricted to [-90, 90] degrees.
///
/// The restriction is a validation concern; storage is a plain float.
pub type Angle90 = f64;

/// Longitude-like angle, logically restricted to [-180, 180] degrees.
pub type Angle180 = f64;

/// Heading-like angle, logically restricted to [-360, 360] degrees.
pub type Angle360 = f64;

/// A 2D geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: Angle90,
    pub lon: Angle180,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A geographic coordinate tuple as used in `<coordinates>` strings:
/// longitude, latitude, and an optional altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub lon: Angle180,
    pub lat: Angle90,
    pub alt: Option<f64>,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            alt: None,
        }
    }

    pub fn with_alt(lon: f64, lat: f64, alt: f64) -> Self {
        Self {
            lon,
            lat,
            alt: Some(alt),
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alt {
            Some(alt) => write!(f, "{},{},{}", self.lon, self.lat, alt),
            None => write!(f, "{},{}", self.lon, self.lat),
        }
    }
}

/// Formats a coordinate sequence as a KML `<coordinates>` string
/// (comma-separated tuples, whitespace-separated points).
pub fn format_coords(coords: &[Coord]) -> String {
    coords
        .iter()
        .map(Coord::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a KML `<coordinates>` string. Returns `None` on any malformed
/// tuple; the parser maps that to a structured error with element context.
pub fn parse_coords(text: &str) -> Option<Vec<Coord>> {
    let mut coords = Vec::new();
    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',');
        let lon = parts.next()?.parse().ok()?;
        let lat = parts.next()?.parse().ok()?;
        let alt = match parts.next() {
            Some(a) => Some(a.parse().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        coords.push(Coord { lon, lat, alt });
    }
    Some(coords)
}

/// A screen/image point whose axes are independently unit-tagged.
///
/// Used for `hotSpot`, `overlayXY`, `screenXY`, `rotationXY`, and `size`.
/// On `size`, an axis value of `-1` means "use the image's native size" and
/// `0` means "preserve the aspect ratio"; both are sentinels on an otherwise
/// continuous domain and are passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
    pub xunits: Units,
    pub yunits: Units,
}

impl Xy {
    pub fn new(x: f64, y: f64, xunits: Units, yunits: Units) -> Self {
        Self {
            x,
            y,
            xunits,
            yunits,
        }
    }

    /// Both axes expressed as fractions of the overlay/screen extent.
    pub fn fraction(x: f64, y: f64) -> Self {
        Self::new(x, y, Units::Fraction, Units::Fraction)
    }
}

impl Default for Xy {
    fn default() -> Self {
        Self::fraction(0.0, 0.0)
    }
}

/// An `aabbggrr` color, the byte order KML inherited from its origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const WHITE: Color = Color {
        a: 0xff,
        b: 0xff,
        g: 0xff,
        r: 0xff,
    };

    pub fn new(a: u8, b: u8, g: u8, r: u8) -> Self {
        Self { a, b, g, r }
    }

    /// Parses the eight-hex-digit `aabbggrr` form used throughout KML.
    pub fn from_kml(s: &str) -> Option<Self> {
        if s.len() != 8 || !s.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Self {
            a: byte(0)?,
            b: byte(2)?,
            g: byte(4)?,
            r: byte(6)?,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}{:02x}", self.a, self.b, self.g, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_roundtrip() {
        let coords = vec![
            Coord::with_alt(-122.4194, 37.7749, 100.0),
            Coord::new(-122.42, 37.78),
        ];
        let text = format_coords(&coords);
        assert_eq!(text, "-122.4194,37.7749,100 -122.42,37.78");
        assert_eq!(parse_coords(&text), Some(coords));
    }

    #[test]
    fn test_parse_coords_malformed() {
        assert_eq!(parse_coords("1,2,3,4"), None);
        assert_eq!(parse_coords("1"), None);
        assert_eq!(parse_coords("a,b"), None);
        assert_eq!(parse_coords(""), Some(Vec::new()));
    }

    #[test]
    fn test_color_hex() {
        let c = Color::from_kml("7f00ff00").unwrap();
        assert_eq!(c, Color::new(0x7f, 0x00, 0xff, 0x00));
        assert_eq!(c.to_string(), "7f00ff00");
        assert_eq!(Color::from_kml("xyz"), None);
        assert_eq!(Color::from_kml("7f00ff0"), None);
        assert_eq!(Color::default(), Color::WHITE);
    }

    #[test]
    fn test_xy_default_units() {
        let xy = Xy::default();
        assert_eq!(xy.xunits, Units::Fraction);
        assert_eq!(xy.yunits, Units::Fraction);
    }
}
