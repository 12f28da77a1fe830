//! Style selectors and the sub-styles they compose.

use serde::{Deserialize, Serialize};

use crate::enums::{kml_enum, ColorMode};
use crate::link::Icon;
use crate::object::{impl_kml_object, KmlObject};
use crate::types::{Angle360, Color, Xy};
use std::fmt;

/// The color fields every color-carrying sub-style shares.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorStyle {
    /// Default opaque white (`ffffffff`).
    pub color: Color,
    pub color_mode: ColorMode,
}

/// Styling of point icons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub color_style: ColorStyle,
    /// Icon size multiplier. Default 1.0.
    pub scale: f64,
    /// Icon rotation in degrees about the hot spot. Default 0.
    pub heading: Angle360,
    pub icon: Option<Icon>,
    /// Anchor point within the icon; defaults to the viewer's choice.
    pub hot_spot: Option<Xy>,
}

impl Default for IconStyle {
    fn default() -> Self {
        Self {
            id: None,
            target_id: None,
            color_style: ColorStyle::default(),
            scale: 1.0,
            heading: 0.0,
            icon: None,
            hot_spot: None,
        }
    }
}

/// Styling of feature name labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub color_style: ColorStyle,
    /// Label size multiplier. Default 1.0.
    pub scale: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            id: None,
            target_id: None,
            color_style: ColorStyle::default(),
            scale: 1.0,
        }
    }
}

/// Styling of line geometry and polygon outlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub color_style: ColorStyle,
    /// Line width in pixels. Default 1.0.
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            id: None,
            target_id: None,
            color_style: ColorStyle::default(),
            width: 1.0,
        }
    }
}

/// Styling of polygon interiors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyStyle {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub color_style: ColorStyle,
    /// Whether to fill the polygon. Default true.
    pub fill: bool,
    /// Whether to outline the polygon with the line style. Default true.
    pub outline: bool,
}

impl Default for PolyStyle {
    fn default() -> Self {
        Self {
            id: None,
            target_id: None,
            color_style: ColorStyle::default(),
            fill: true,
            outline: true,
        }
    }
}

kml_enum! {
    /// Whether a description balloon is shown at all.
    DisplayMode {
        Default => "default",
        Hide => "hide",
    }
    default Default
}

/// Styling of the description balloon.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalloonStyle {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub bg_color: Option<Color>,
    pub text_color: Option<Color>,
    /// Balloon template text; `$[name]`-style entity substitution is the
    /// viewer's concern.
    pub text: Option<String>,
    pub display_mode: DisplayMode,
}

kml_enum! {
    /// How a container's children appear in the places list.
    ListItemType {
        Check => "check",
        CheckOffOnly => "checkOffOnly",
        CheckHideChildren => "checkHideChildren",
        RadioFolder => "radioFolder",
    }
    default Check
}

/// An icon shown next to a list entry in a given state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemIcon {
    /// Space-separated state keywords (`open`, `closed`, `error`, ...).
    pub state: Option<String>,
    pub href: String,
}

/// Styling of the feature's entry in the places list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListStyle {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub list_item_type: ListItemType,
    pub bg_color: Option<Color>,
    pub item_icons: Vec<ItemIcon>,
}

/// A complete style: any subset of the six sub-styles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub icon_style: Option<IconStyle>,
    pub label_style: Option<LabelStyle>,
    pub line_style: Option<LineStyle>,
    pub poly_style: Option<PolyStyle>,
    pub balloon_style: Option<BalloonStyle>,
    pub list_style: Option<ListStyle>,
}

kml_enum! {
    /// Which interaction state a [`Pair`] styles.
    StyleState {
        Normal => "normal",
        Highlight => "highlight",
    }
    default Normal
}

/// One state's style within a [`StyleMap`]: a reference or an inline style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pair {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub key: StyleState,
    pub style_url: Option<String>,
    pub style: Option<Box<Style>>,
}

/// Maps interaction states to styles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleMap {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub pairs: Vec<Pair>,
}

/// Either style selector a feature (or a document's style table) may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StyleSelector {
    Style(Style),
    StyleMap(StyleMap),
}

impl KmlObject for StyleSelector {
    fn id(&self) -> Option<&str> {
        match self {
            StyleSelector::Style(s) => s.id.as_deref(),
            StyleSelector::StyleMap(s) => s.id.as_deref(),
        }
    }

    fn target_id(&self) -> Option<&str> {
        match self {
            StyleSelector::Style(s) => s.target_id.as_deref(),
            StyleSelector::StyleMap(s) => s.target_id.as_deref(),
        }
    }
}

impl_kml_object!(
    IconStyle,
    LabelStyle,
    LineStyle,
    PolyStyle,
    BalloonStyle,
    ListStyle,
    Style,
    StyleMap,
    Pair,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substyle_defaults() {
        assert_eq!(IconStyle::default().scale, 1.0);
        assert_eq!(LabelStyle::default().scale, 1.0);
        assert_eq!(LineStyle::default().width, 1.0);
        let poly = PolyStyle::default();
        assert!(poly.fill);
        assert!(poly.outline);
        assert_eq!(poly.color_style.color, Color::WHITE);
        assert_eq!(poly.color_style.color_mode, ColorMode::Normal);
    }

    #[test]
    fn test_selector_id_surface() {
        let style = StyleSelector::Style(Style {
            id: Some("s1".into()),
            ..Default::default()
        });
        let map = StyleSelector::StyleMap(StyleMap {
            id: Some("m1".into()),
            ..Default::default()
        });
        assert_eq!(style.id(), Some("s1"));
        assert_eq!(map.id(), Some("m1"));
    }
}
