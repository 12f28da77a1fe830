//! Closed enumerations used across the model.
//!
//! Every set here is closed: the parser rejects any other value rather than
//! carrying an open string through.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines a closed KML enumeration with its wire spellings and default.
macro_rules! kml_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $kml:literal),+ $(,)? }
        default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All members of the set, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The spelling used in KML markup.
            pub fn as_kml(self) -> &'static str {
                match self {
                    $($name::$variant => $kml),+
                }
            }

            /// Parses the KML spelling; any other value is outside the set.
            pub fn from_kml(s: &str) -> Option<Self> {
                match s {
                    $($kml => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_kml())
            }
        }
    };
}

pub(crate) use kml_enum;

kml_enum! {
    /// How altitude values are interpreted against the terrain.
    AltitudeMode {
        ClampToGround => "clampToGround",
        RelativeToGround => "relativeToGround",
        Absolute => "absolute",
    }
    default ClampToGround
}

kml_enum! {
    /// Time-based refresh trigger for a [`Link`](crate::link::Link).
    RefreshMode {
        OnChange => "onChange",
        OnInterval => "onInterval",
        OnExpire => "onExpire",
    }
    default OnChange
}

kml_enum! {
    /// View-based refresh trigger for a [`Link`](crate::link::Link).
    ViewRefreshMode {
        Never => "never",
        OnStop => "onStop",
        OnRequest => "onRequest",
        OnRegion => "onRegion",
    }
    default Never
}

kml_enum! {
    /// Projection surface of a [`PhotoOverlay`](crate::overlay::PhotoOverlay).
    Shape {
        Rectangle => "rectangle",
        Cylinder => "cylinder",
        Sphere => "sphere",
    }
    default Rectangle
}

kml_enum! {
    /// Tile numbering origin of an
    /// [`ImagePyramid`](crate::overlay::ImagePyramid).
    GridOrigin {
        LowerLeft => "lowerLeft",
        UpperLeft => "upperLeft",
    }
    default LowerLeft
}

kml_enum! {
    /// Unit tag for one axis of an [`Xy`](crate::types::Xy) point.
    Units {
        Fraction => "fraction",
        Pixels => "pixels",
        InsetPixels => "insetPixels",
    }
    default Fraction
}

kml_enum! {
    /// Whether a sub-style color is applied as-is or randomized.
    ColorMode {
        Normal => "normal",
        Random => "random",
    }
    default Normal
}

/// An altitude mode drawn from either the base set or the `gx` extension.
///
/// Fields that accept an altitude mode accept either namespace, so both are
/// carried behind one value; `From` impls let either substitute directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnyAltitudeMode {
    Kml(AltitudeMode),
    Gx(crate::gx::AltitudeMode),
}

impl AnyAltitudeMode {
    pub fn as_kml(self) -> &'static str {
        match self {
            AnyAltitudeMode::Kml(m) => m.as_kml(),
            AnyAltitudeMode::Gx(m) => m.as_kml(),
        }
    }

    /// True for the `gx` members, which serialize as `<gx:altitudeMode>`.
    pub fn is_gx(self) -> bool {
        matches!(self, AnyAltitudeMode::Gx(_))
    }
}

impl Default for AnyAltitudeMode {
    fn default() -> Self {
        AnyAltitudeMode::Kml(AltitudeMode::ClampToGround)
    }
}

impl From<AltitudeMode> for AnyAltitudeMode {
    fn from(m: AltitudeMode) -> Self {
        AnyAltitudeMode::Kml(m)
    }
}

impl From<crate::gx::AltitudeMode> for AnyAltitudeMode {
    fn from(m: crate::gx::AltitudeMode) -> Self {
        AnyAltitudeMode::Gx(m)
    }
}

impl fmt::Display for AnyAltitudeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_kml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_sets_roundtrip() {
        for m in RefreshMode::ALL {
            assert_eq!(RefreshMode::from_kml(m.as_kml()), Some(*m));
        }
        for m in ViewRefreshMode::ALL {
            assert_eq!(ViewRefreshMode::from_kml(m.as_kml()), Some(*m));
        }
        for m in AltitudeMode::ALL {
            assert_eq!(AltitudeMode::from_kml(m.as_kml()), Some(*m));
        }
        for s in Shape::ALL {
            assert_eq!(Shape::from_kml(s.as_kml()), Some(*s));
        }
        for o in GridOrigin::ALL {
            assert_eq!(GridOrigin::from_kml(o.as_kml()), Some(*o));
        }
        for u in Units::ALL {
            assert_eq!(Units::from_kml(u.as_kml()), Some(*u));
        }
        for c in ColorMode::ALL {
            assert_eq!(ColorMode::from_kml(c.as_kml()), Some(*c));
        }
    }

    #[test]
    fn test_open_values_rejected() {
        assert_eq!(RefreshMode::from_kml("onchange"), None);
        assert_eq!(Units::from_kml("percent"), None);
        assert_eq!(AltitudeMode::from_kml("clampToSeaFloor"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(RefreshMode::default(), RefreshMode::OnChange);
        assert_eq!(ViewRefreshMode::default(), ViewRefreshMode::Never);
        assert_eq!(AltitudeMode::default(), AltitudeMode::ClampToGround);
        assert_eq!(Units::default(), Units::Fraction);
        assert_eq!(GridOrigin::default(), GridOrigin::LowerLeft);
        assert!(!AnyAltitudeMode::default().is_gx());
    }

    #[test]
    fn test_any_altitude_mode_substitution() {
        let base: AnyAltitudeMode = AltitudeMode::Absolute.into();
        let gx: AnyAltitudeMode = crate::gx::AltitudeMode::RelativeToSeaFloor.into();
        assert!(!base.is_gx());
        assert!(gx.is_gx());
        assert_eq!(gx.as_kml(), "relativeToSeaFloor");
    }
}
