//! Geographic and magnitude filter criteria.

use serde::Serialize;

use super::EarthquakeRecord;

/// Which records qualify for a notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "base", rename_all = "snake_case")]
pub enum FilterCriteria {
    /// Latitude and longitude tokens must start with the given text.
    ByCoordinates {
        latitude: String,
        longitude: String,
        min_magnitude: f64,
    },
    /// Region label must contain the given text.
    ByRegion { region: String, min_magnitude: f64 },
}

impl FilterCriteria {
    pub fn min_magnitude(&self) -> f64 {
        match self {
            Self::ByCoordinates { min_magnitude, .. } | Self::ByRegion { min_magnitude, .. } => {
                *min_magnitude
            }
        }
    }

    /// Geographic predicate only.
    pub fn matches_location(&self, record: &EarthquakeRecord) -> bool {
        match self {
            Self::ByCoordinates {
                latitude,
                longitude,
                ..
            } => record.latitude.starts_with(latitude.as_str())
                && record.longitude.starts_with(longitude.as_str()),
            Self::ByRegion { region, .. } => record.region.contains(region.as_str()),
        }
    }

    /// Geographic predicate and inclusive magnitude threshold.
    pub fn matches(&self, record: &EarthquakeRecord) -> bool {
        record.magnitude >= self.min_magnitude() && self.matches_location(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn record(latitude: &str, longitude: &str, magnitude: f64, region: &str) -> EarthquakeRecord {
        EarthquakeRecord {
            row: 7,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            depth_km: Some(5.0),
            md: None,
            magnitude,
            mw: None,
            region: region.to_string(),
            raw: String::new(),
        }
    }

    #[test]
    fn test_coordinates_are_prefix_matched() {
        let criteria = FilterCriteria::ByCoordinates {
            latitude: "38.4".to_string(),
            longitude: "27.1".to_string(),
            min_magnitude: 3.0,
        };
        assert!(criteria.matches(&record("38.4512", "27.1433", 3.5, "IZMIR (KONAK)")));
        assert!(!criteria.matches(&record("38.5512", "27.1433", 3.5, "IZMIR (KONAK)")));
        assert!(!criteria.matches(&record("38.4512", "26.1433", 3.5, "IZMIR (KONAK)")));
    }

    #[test]
    fn test_coordinates_are_not_numeric_ranges() {
        let criteria = FilterCriteria::ByCoordinates {
            latitude: "38".to_string(),
            longitude: "27".to_string(),
            min_magnitude: 0.0,
        };
        // 37.99 is numerically close but does not share the prefix
        assert!(!criteria.matches(&record("37.9999", "27.0000", 4.0, "AEGEAN SEA")));
    }

    #[test]
    fn test_region_is_substring_matched() {
        let criteria = FilterCriteria::ByRegion {
            region: "AEGEAN".to_string(),
            min_magnitude: 4.5,
        };
        assert!(criteria.matches(&record("38.00", "27.00", 5.1, "AEGEAN SEA")));
        assert!(criteria.matches(&record("38.00", "27.00", 4.5, "NORTH AEGEAN")));
        assert!(!criteria.matches(&record("38.00", "27.00", 4.49, "AEGEAN SEA")));
        assert!(!criteria.matches(&record("38.00", "27.00", 6.0, "MARMARA SEA")));
    }
}
