//! The shared resource descriptor: `Link` and `Icon`.
//!
//! One structure serves network links, overlay images, and model resources.
//! It records two independent refresh configurations, one time-based and one
//! view-based; executing either is the fetch layer's job, never this crate's.

use serde::{Deserialize, Serialize};

use crate::enums::{RefreshMode, ViewRefreshMode};
use crate::object::impl_kml_object;

/// A fetchable, refreshable resource reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: Option<String>,
    pub target_id: Option<String>,
    /// Resource URI. Required; an empty href is a structural violation.
    pub href: String,
    /// Time-based refresh trigger. Default `OnChange`.
    pub refresh_mode: RefreshMode,
    /// Refresh period in seconds. Meaningful only under
    /// [`RefreshMode::OnInterval`]; its absence under that mode is a
    /// structural violation, so absence stays representable here.
    pub refresh_interval: Option<f64>,
    /// View-based refresh trigger. Default `Never`.
    pub view_refresh_mode: ViewRefreshMode,
    /// Seconds after camera movement stops before refreshing. Meaningful
    /// only under [`ViewRefreshMode::OnStop`]; treated as 0 when absent.
    pub view_refresh_time: Option<f64>,
    /// Scale factor applied to the view bounding box in view-based
    /// requests. Default 1.0.
    pub view_bound_scale: f64,
    /// Format string for the view-based query appended to `href`.
    pub view_format: Option<String>,
    /// Extra query parameters appended to `href`.
    pub http_query: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    /// Shorthand for a periodically refreshed link.
    pub fn on_interval(href: impl Into<String>, seconds: f64) -> Self {
        Self {
            href: href.into(),
            refresh_mode: RefreshMode::OnInterval,
            refresh_interval: Some(seconds),
            ..Default::default()
        }
    }
}

impl Default for Link {
    fn default() -> Self {
        Self {
            id: None,
            target_id: None,
            href: String::new(),
            refresh_mode: RefreshMode::OnChange,
            refresh_interval: None,
            view_refresh_mode: ViewRefreshMode::Never,
            view_refresh_time: None,
            view_bound_scale: 1.0,
            view_format: None,
            http_query: None,
        }
    }
}

/// A [`Link`] plus the pixel-rectangle sub-selector used to address one icon
/// inside a palette image (`gx:x`/`gx:y`/`gx:w`/`gx:h`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub link: Link,
    /// Left edge of the sub-rectangle, in pixels from the palette origin.
    pub x: i32,
    /// Bottom edge of the sub-rectangle, in pixels from the palette origin.
    pub y: i32,
    /// Sub-rectangle width in pixels; -1 selects the full image width.
    pub w: i32,
    /// Sub-rectangle height in pixels; -1 selects the full image height.
    pub h: i32,
}

impl Icon {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            link: Link::new(href),
            ..Default::default()
        }
    }

    /// True when no palette sub-rectangle is selected.
    pub fn is_full_image(&self) -> bool {
        self.x == 0 && self.y == 0 && self.w == -1 && self.h == -1
    }
}

impl Default for Icon {
    fn default() -> Self {
        Self {
            link: Link::default(),
            x: 0,
            y: 0,
            w: -1,
            h: -1,
        }
    }
}

impl_kml_object!(Link);

impl crate::object::KmlObject for Icon {
    fn id(&self) -> Option<&str> {
        self.link.id.as_deref()
    }
    fn target_id(&self) -> Option<&str> {
        self.link.target_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_defaults() {
        let link = Link::new("http://example.com/data.kml");
        assert_eq!(link.refresh_mode, RefreshMode::OnChange);
        assert_eq!(link.view_refresh_mode, ViewRefreshMode::Never);
        assert_eq!(link.view_bound_scale, 1.0);
        assert_eq!(link.refresh_interval, None);
        assert_eq!(link.view_refresh_time, None);
    }

    #[test]
    fn test_on_interval_carries_period() {
        let link = Link::on_interval("http://example.com/feed.kml", 30.0);
        assert_eq!(link.refresh_mode, RefreshMode::OnInterval);
        assert_eq!(link.refresh_interval, Some(30.0));
    }

    #[test]
    fn test_icon_palette_defaults() {
        let icon = Icon::new("icons/palette.png");
        assert!(icon.is_full_image());
        let selected = Icon {
            x: 32,
            y: 64,
            w: 32,
            h: 32,
            ..Icon::new("icons/palette.png")
        };
        assert!(!selected.is_full_image());
    }
}
