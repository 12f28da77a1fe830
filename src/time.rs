//! Time primitives attachable to a feature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object::impl_kml_object;

/// A period with an open or closed start and end.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSpan {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStamp {
    pub id: Option<String>,
    pub target_id: Option<String>,
    pub when: DateTime<Utc>,
}

impl TimeStamp {
    pub fn new(when: DateTime<Utc>) -> Self {
        Self {
            id: None,
            target_id: None,
            when,
        }
    }
}

/// Either time primitive a feature may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimePrimitive {
    TimeSpan(TimeSpan),
    TimeStamp(TimeStamp),
}

impl_kml_object!(TimeSpan, TimeStamp);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_ended_span() {
        let span = TimeSpan {
            begin: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(span.end.is_none());
    }
}
