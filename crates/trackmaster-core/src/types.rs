//! Core data model
//!
//! A [`Reading`] is produced once by an acquisition backend and then only
//! read: the validator borrows it, the sink receives it unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Owner of every stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One position sample
///
/// Latitude and longitude are degrees, accuracy and altitude are meters,
/// speed is meters per second and heading is degrees from true north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
}

impl Reading {
    /// Reading without kinematic fields
    #[inline]
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            altitude: None,
            speed: None,
            heading: None,
        }
    }

    /// With altitude in meters
    #[inline]
    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// With ground speed in m/s
    #[inline]
    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// With heading in degrees
    #[inline]
    #[must_use]
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Speed converted to km/h, as shown on the dashboard
    #[inline]
    #[must_use]
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed.map(|s| s * 3.6)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Category of an activity-feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Location,
    Time,
    Task,
}

impl ActivityKind {
    /// Storage name of the kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Location => "location",
            ActivityKind::Time => "time",
            ActivityKind::Task => "task",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_builder_sets_optional_fields() {
        let r = Reading::new(1.0, 2.0, 3.0)
            .with_altitude(4.0)
            .with_speed(5.0)
            .with_heading(6.0);

        assert_eq!(r.altitude, Some(4.0));
        assert_eq!(r.speed, Some(5.0));
        assert_eq!(r.heading, Some(6.0));
    }

    #[test]
    fn reading_display_uses_six_decimals() {
        let r = Reading::new(45.0, -122.123_456_78, 5.0);
        assert_eq!(r.to_string(), "45.000000, -122.123457");
    }

    #[test]
    fn speed_kmh_converts() {
        let r = Reading::new(0.0, 0.0, 1.0).with_speed(10.0);
        assert_eq!(r.speed_kmh(), Some(36.0));
        assert_eq!(Reading::new(0.0, 0.0, 1.0).speed_kmh(), None);
    }

    #[test]
    fn reading_serializes_absent_fields_as_null() {
        let r = Reading::new(45.0, -122.0, 5.0);
        let json = serde_json::to_value(r).unwrap();
        assert!(json["altitude"].is_null());
        assert_eq!(json["accuracy"], 5.0);
    }

    #[test]
    fn activity_kind_storage_names() {
        assert_eq!(ActivityKind::Location.as_str(), "location");
        assert_eq!(
            serde_json::to_string(&ActivityKind::Task).unwrap(),
            "\"task\""
        );
    }
}
