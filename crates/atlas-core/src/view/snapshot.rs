use std::collections::BTreeSet;

use crate::country::Country;
use crate::format::{group_digits, group_float};

/// A country plus its pre-rendered display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub country: Country,
    pub population_display: String,
    pub area_display: String,
}

impl From<Country> for SnapshotRow {
    fn from(country: Country) -> Self {
        Self {
            population_display: group_digits(country.population),
            area_display: group_float(country.area),
            country,
        }
    }
}

/// Read-only copy of the countries table, taken once at dashboard startup.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    rows: Vec<SnapshotRow>,
    regions: Vec<String>,
}

impl Snapshot {
    pub fn new(countries: Vec<Country>) -> Self {
        let regions: BTreeSet<String> = countries
            .iter()
            .filter_map(|c| c.region.clone())
            .collect();

        Self {
            rows: countries.into_iter().map(SnapshotRow::from).collect(),
            regions: regions.into_iter().collect(),
        }
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted distinct regions, for the filter dropdown.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Rows in the given region, or every row when `region` is `None`.
    pub fn filter_by_region(&self, region: Option<&str>) -> Vec<&SnapshotRow> {
        match region {
            Some(region) => self
                .rows
                .iter()
                .filter(|r| r.country.region.as_deref() == Some(region))
                .collect(),
            None => self.rows.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::sample_countries;

    #[test]
    fn test_display_strings() {
        let snapshot = Snapshot::new(sample_countries());
        let canada = &snapshot.rows()[0];
        assert_eq!(canada.population_display, "38,005,238");
        assert_eq!(canada.area_display, "9,984,670.0");
        // Raw values stay numeric
        assert_eq!(canada.country.population, 38005238);
    }

    #[test]
    fn test_regions_sorted_distinct_without_nulls() {
        let snapshot = Snapshot::new(sample_countries());
        assert_eq!(snapshot.regions(), ["Americas", "Europe"]);
    }

    #[test]
    fn test_filter_by_region() {
        let snapshot = Snapshot::new(sample_countries());

        let europe = snapshot.filter_by_region(Some("Europe"));
        assert_eq!(europe.len(), 2);
        assert!(europe
            .iter()
            .all(|r| r.country.region.as_deref() == Some("Europe")));

        assert_eq!(snapshot.filter_by_region(None).len(), snapshot.len());
        assert!(snapshot.filter_by_region(Some("Atlantis")).is_empty());
    }
}
