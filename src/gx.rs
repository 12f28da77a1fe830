//! Google's `gx` extension namespace.
//!
//! Mirrors the base model's hierarchy pattern: tour primitives, extended
//! altitude modes, multi-track geometry, and the quadrilateral ground-overlay
//! footprint. Elements here serialize under the `gx:` prefix, and the
//! namespace is only declared on documents that use them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::{kml_enum, AnyAltitudeMode};
use crate::feature::{ExtendedData, FeatureCommon};
use crate::geometry::{Model, Orientation};
use crate::object::impl_kml_object;
use crate::types::{Coord, LatLon};
use crate::view::AbstractView;

kml_enum! {
    /// Sea-floor-relative altitude interpretations; substitutes for the base
    /// mode through [`AnyAltitudeMode`](crate::enums::AnyAltitudeMode).
    AltitudeMode {
        ClampToSeaFloor => "clampToSeaFloor",
        RelativeToSeaFloor => "relativeToSeaFloor",
    }
    default ClampToSeaFloor
}

kml_enum! {
    /// Camera transition used by a [`FlyTo`].
    FlyToMode {
        Bounce => "bounce",
        Smooth => "smooth",
    }
    default Bounce
}

/// A partial-document update carried by an [`AnimatedUpdate`].
///
/// The operations themselves (`Change`/`Create`/`Delete` payloads) belong to
/// the external update protocol; they are preserved as verbatim markup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Update {
    /// URL of the document the update applies to.
    pub target_href: String,
    /// Ordered, opaque operation elements, round-tripped untouched.
    pub operations: Vec<String>,
}

/// Applies an [`Update`] over a duration during a tour.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimatedUpdate {
    pub id: Option<String>,
    pub target_id: Option<String>,
    /// Seconds over which the update is interpolated. Default 0.
    pub duration: f64,
    pub update: Update,
}

/// Moves the camera to a new viewpoint during a tour.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlyTo {
    pub id: Option<String>,
    pub target_id: Option<String>,
    /// Seconds the flight takes. Default 0.
    pub duration: f64,
    pub mode: FlyToMode,
    pub view: Option<AbstractView>,
}

/// Starts an audio file during a tour; playback overlaps later primitives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SoundCue {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub href: String,
    /// Seconds to wait before playback starts. Default 0.
    pub delayed_start: f64,
}

/// Pauses the tour timeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wait {
    pub id: Option<String>,
    pub target_id: Option<String>,
    /// Seconds to hold the current view. Default 0.
    pub duration: f64,
}

/// One step of a tour playlist, executed in sequence by a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TourPrimitive {
    AnimatedUpdate(AnimatedUpdate),
    FlyTo(FlyTo),
    SoundCue(SoundCue),
    Wait(Wait),
}

impl TourPrimitive {
    /// The `gx` element name of the concrete variant.
    pub fn kind(&self) -> &'static str {
        match self {
            TourPrimitive::AnimatedUpdate(_) => "gx:AnimatedUpdate",
            TourPrimitive::FlyTo(_) => "gx:FlyTo",
            TourPrimitive::SoundCue(_) => "gx:SoundCue",
            TourPrimitive::Wait(_) => "gx:Wait",
        }
    }
}

/// A scripted camera tour; a feature whose payload is a playlist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tour {
    pub common: FeatureCommon,
    pub playlist: Vec<TourPrimitive>,
}

/// A time-stamped path: parallel arrays of instants, positions, and
/// optional orientations, interpolated by the viewer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub altitude_mode: AnyAltitudeMode,
    /// Sample instants; must pair one-to-one with `coords`.
    pub when: Vec<DateTime<Utc>>,
    pub coords: Vec<Coord>,
    /// Optional per-sample orientations (`heading tilt roll`).
    pub angles: Vec<Orientation>,
    pub model: Option<Box<Model>>,
    pub extended_data: Option<ExtendedData>,
}

/// Several tracks treated as one logical entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiTrack {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub altitude_mode: AnyAltitudeMode,
    /// Whether positions are interpolated across gaps between member
    /// tracks. Default false.
    pub interpolate: bool,
    pub tracks: Vec<Track>,
}

/// A four-corner convex ground-overlay footprint, counter-clockwise from
/// the lower-left corner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLonQuad {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub coords: [LatLon; 4],
}

impl_kml_object!(AnimatedUpdate, FlyTo, SoundCue, Wait, Track, MultiTrack, LatLonQuad);
impl_kml_object!(via common: Tour);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tour_is_a_feature() {
        use crate::object::KmlObject;
        let tour = Tour {
            common: FeatureCommon {
                id: Some("tour-1".into()),
                name: Some("Flyover".into()),
                ..Default::default()
            },
            playlist: vec![
                TourPrimitive::FlyTo(FlyTo {
                    duration: 5.0,
                    mode: FlyToMode::Smooth,
                    ..Default::default()
                }),
                TourPrimitive::Wait(Wait {
                    duration: 1.5,
                    ..Default::default()
                }),
            ],
        };
        assert_eq!(tour.id(), Some("tour-1"));
        assert_eq!(tour.playlist[0].kind(), "gx:FlyTo");
    }

    #[test]
    fn test_extension_altitude_modes() {
        for m in AltitudeMode::ALL {
            assert_eq!(AltitudeMode::from_kml(m.as_kml()), Some(*m));
        }
        assert_eq!(AltitudeMode::from_kml("absolute"), None);
    }
}
