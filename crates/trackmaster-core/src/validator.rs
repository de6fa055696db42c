//! Reading bounds check
//!
//! Total and side-effect free: any NaN field fails its comparison and the
//! reading is rejected.

use crate::error::ValidationError;
use crate::types::Reading;

/// Latitude bound in degrees
pub const MAX_LATITUDE: f64 = 90.0;
/// Longitude bound in degrees
pub const MAX_LONGITUDE: f64 = 180.0;
/// Exclusive altitude magnitude bound in meters
pub const MAX_ALTITUDE_M: f64 = 100_000.0;

/// Geometric and instrumental bounds for a [`Reading`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationValidator;

impl LocationValidator {
    /// `true` iff every bound holds
    #[inline]
    #[must_use]
    pub fn is_valid(reading: &Reading) -> bool {
        Self::check(reading).is_ok()
    }

    /// First violated bound, in field order
    ///
    /// # Errors
    /// The [`ValidationError`] naming the offending field and value.
    pub fn check(reading: &Reading) -> Result<(), ValidationError> {
        let Reading {
            latitude,
            longitude,
            accuracy,
            altitude,
            ..
        } = *reading;

        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        if !(accuracy > 0.0) {
            return Err(ValidationError::NonPositiveAccuracy(accuracy));
        }
        if let Some(alt) = altitude {
            if !(alt.abs() < MAX_ALTITUDE_M) {
                return Err(ValidationError::AltitudeOutOfRange(alt));
            }
        }
        Ok(())
    }
}
