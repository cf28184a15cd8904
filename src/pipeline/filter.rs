//! Record filtering over the new-data range.

use std::ops::Range;

use crate::models::{EarthquakeRecord, FilterCriteria};

/// Applies [`FilterCriteria`] to a slice of the bulletin.
#[derive(Debug, Clone)]
pub struct RecordFilter<'a> {
    criteria: &'a FilterCriteria,
}

impl<'a> RecordFilter<'a> {
    pub fn new(criteria: &'a FilterCriteria) -> Self {
        Self { criteria }
    }

    /// Matching records within `range`, in bulletin order.
    ///
    /// The range is clamped to the slice; an empty result is not an error.
    pub fn filter(&self, records: &[EarthquakeRecord], range: Range<usize>) -> Vec<EarthquakeRecord> {
        let end = range.end.min(records.len());
        let start = range.start.min(end);

        records[start..end]
            .iter()
            .filter(|record| self.criteria.matches(record))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::BulletinParser;

    fn parse(lines: &[&str]) -> Vec<EarthquakeRecord> {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| BulletinParser::decode_line(i + 7, line).unwrap())
            .collect()
    }

    fn region(pattern: &str, min_magnitude: f64) -> FilterCriteria {
        FilterCriteria::ByRegion {
            region: pattern.to_string(),
            min_magnitude,
        }
    }

    #[test]
    fn test_only_range_is_considered() {
        let records = parse(&[
            "2024.01.01 12:00:00 38.00 27.00 5.0 -.- 4.8 -.- AEGEAN SEA",
            "2024.01.01 11:00:00 38.00 27.00 5.0 -.- 5.1 -.- AEGEAN SEA",
            "2024.01.01 10:00:00 38.00 27.00 5.0 -.- 6.0 -.- AEGEAN SEA",
        ]);
        let criteria = region("AEGEAN", 4.5);
        let matched = RecordFilter::new(&criteria).filter(&records, 0..2);

        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].row, 7);
        assert_eq!(matched[1].row, 8);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let records = parse(&[
            "2024.01.01 12:00:00 38.00 27.00 5.0 -.- 4.5 -.- AEGEAN SEA",
            "2024.01.01 11:00:00 38.00 27.00 5.0 -.- 4.4 -.- AEGEAN SEA",
        ]);
        let criteria = region("AEGEAN", 4.5);
        let matched = RecordFilter::new(&criteria).filter(&records, 0..2);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].magnitude, 4.5);
    }

    #[test]
    fn test_by_coordinates() {
        let records = parse(&[
            "2024.01.01 12:00:00 38.4512 27.1433 5.0 -.- 3.2 -.- IZMIR (KONAK)",
            "2024.01.01 11:00:00 39.1201 27.1433 5.0 -.- 3.9 -.- MANISA (SOMA)",
            "2024.01.01 10:00:00 38.4011 27.1900 5.0 -.- 2.1 -.- IZMIR (BORNOVA)",
        ]);
        let criteria = FilterCriteria::ByCoordinates {
            latitude: "38.4".to_string(),
            longitude: "27.1".to_string(),
            min_magnitude: 3.0,
        };
        let matched = RecordFilter::new(&criteria).filter(&records, 0..3);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].region, "IZMIR (KONAK)");
    }

    #[test]
    fn test_empty_and_oversized_ranges() {
        let records = parse(&["2024.01.01 12:00:00 38.00 27.00 5.0 -.- 5.0 -.- AEGEAN SEA"]);
        let criteria = region("AEGEAN", 0.0);
        let filter = RecordFilter::new(&criteria);

        assert!(filter.filter(&records, 0..0).is_empty());
        assert_eq!(filter.filter(&records, 0..50).len(), 1);
        assert!(filter.filter(&records, 5..9).is_empty());
    }
}
