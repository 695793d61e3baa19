//! Common validation utilities.

use chrono::NaiveTime;
use validator::ValidationError;

/// Minimum number of participants a match may be created with (host included).
pub const MIN_MATCH_CAPACITY: i32 = 4;

/// Maximum number of participants a match may be created with.
pub const MAX_MATCH_CAPACITY: i32 = 100;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that a search radius is positive and not absurdly large.
pub fn validate_radius_meters(radius: f64) -> Result<(), ValidationError> {
    if radius > 0.0 && radius <= 100_000.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be between 0 and 100000 meters".into());
        Err(err)
    }
}

/// Validates that a match capacity is within the allowed business range.
pub fn validate_capacity(capacity: i32) -> Result<(), ValidationError> {
    if (MIN_MATCH_CAPACITY..=MAX_MATCH_CAPACITY).contains(&capacity) {
        Ok(())
    } else {
        let mut err = ValidationError::new("capacity_range");
        err.message = Some(
            format!(
                "Max participants must be between {} and {}",
                MIN_MATCH_CAPACITY, MAX_MATCH_CAPACITY
            )
            .into(),
        );
        Err(err)
    }
}

/// Validates that a start time precedes an end time on the same day.
pub fn validate_time_order(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if start < end {
        Ok(())
    } else {
        let mut err = ValidationError::new("time_order");
        err.message = Some("Start time must be before end time".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_validate_latitude_valid() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(37.5665).is_ok());
    }

    #[test]
    fn test_validate_latitude_invalid() {
        assert!(validate_latitude(-90.1).is_err());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_longitude_valid() {
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(126.978).is_ok());
    }

    #[test]
    fn test_validate_longitude_invalid() {
        assert!(validate_longitude(-180.1).is_err());
        assert!(validate_longitude(180.1).is_err());
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius_meters(500.0).is_ok());
        assert!(validate_radius_meters(100_000.0).is_ok());
        assert!(validate_radius_meters(0.0).is_err());
        assert!(validate_radius_meters(-1.0).is_err());
        assert!(validate_radius_meters(100_001.0).is_err());
    }

    #[test]
    fn test_validate_capacity_bounds() {
        assert!(validate_capacity(4).is_ok());
        assert!(validate_capacity(22).is_ok());
        assert!(validate_capacity(100).is_ok());
        assert!(validate_capacity(3).is_err());
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(101).is_err());
    }

    #[test]
    fn test_validate_time_order() {
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert!(validate_time_order(ten, noon).is_ok());
        assert!(validate_time_order(noon, ten).is_err());
        assert!(validate_time_order(noon, noon).is_err());
    }
}
