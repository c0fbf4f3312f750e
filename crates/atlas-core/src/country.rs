//! The country record, as served by the source API and as stored.

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// Capital used when the source lists none.
pub const UNKNOWN_CAPITAL: &str = "Unknown";

/// One row of the `countries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Common display name.
    pub country: String,
    pub official_name: Option<String>,
    /// First listed capital, or [`UNKNOWN_CAPITAL`].
    pub capital: String,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub population: i64,
    /// Area in km².
    pub area: f64,
    pub flag_url: Option<String>,
}

/// A country object exactly as the source API returns it.
///
/// Only the fields the table needs are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub name: RawName,
    #[serde(default)]
    pub capital: Option<serde_json::Value>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub flags: RawFlags,
}

/// Nested `name` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawName {
    #[serde(default)]
    pub common: Option<String>,
    #[serde(default)]
    pub official: Option<String>,
}

/// Nested `flags` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFlags {
    #[serde(default)]
    pub png: Option<String>,
}

impl RawCountry {
    /// Flatten into a table row.
    pub fn normalize(self) -> Result<Country> {
        let country = self
            .name
            .common
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AtlasError::Decode("record is missing name.common".to_string()))?;

        let capital = first_capital(self.capital.as_ref());
        if capital == UNKNOWN_CAPITAL {
            tracing::debug!(country = %country, "No capital listed");
        }

        Ok(Country {
            country,
            official_name: self.name.official,
            capital,
            region: self.region,
            subregion: self.subregion,
            population: self.population.map(|p| p.round() as i64).unwrap_or(0),
            area: self.area.unwrap_or(0.0),
            flag_url: self.flags.png,
        })
    }
}

/// Normalize a whole payload, preserving order.
///
/// Fails on the first record that cannot be flattened; the error names its
/// position in the payload.
pub fn normalize(records: Vec<RawCountry>) -> Result<Vec<Country>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            raw.normalize().map_err(|e| match e {
                AtlasError::Decode(msg) => AtlasError::Decode(format!("record {}: {}", i, msg)),
                other => other,
            })
        })
        .collect()
}

fn first_capital(value: Option<&serde_json::Value>) -> String {
    match value.and_then(|v| v.as_array()).and_then(|a| a.first()) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => UNKNOWN_CAPITAL.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: serde_json::Value) -> RawCountry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_full_record() {
        let country = raw(json!({
            "name": {"common": "Canada", "official": "Canada", "nativeName": {}},
            "capital": ["Ottawa"],
            "region": "Americas",
            "subregion": "North America",
            "population": 38005238,
            "area": 9984670.0,
            "flags": {"png": "https://flagcdn.com/w320/ca.png", "svg": "x.svg"},
            "cca2": "CA"
        }))
        .normalize()
        .unwrap();

        assert_eq!(country.country, "Canada");
        assert_eq!(country.capital, "Ottawa");
        assert_eq!(country.region.as_deref(), Some("Americas"));
        assert_eq!(country.population, 38005238);
        assert_eq!(country.area, 9984670.0);
        assert_eq!(
            country.flag_url.as_deref(),
            Some("https://flagcdn.com/w320/ca.png")
        );
    }

    #[test]
    fn test_capital_takes_first_element() {
        let country = raw(json!({
            "name": {"common": "South Africa"},
            "capital": ["Pretoria", "Bloemfontein", "Cape Town"]
        }))
        .normalize()
        .unwrap();
        assert_eq!(country.capital, "Pretoria");
    }

    #[test]
    fn test_capital_unknown_when_empty_missing_or_not_a_list() {
        for capital in [json!([]), json!(null), json!("Nowhere")] {
            let country = raw(json!({"name": {"common": "X"}, "capital": capital}))
                .normalize()
                .unwrap();
            assert_eq!(country.capital, UNKNOWN_CAPITAL);
        }

        let country = raw(json!({"name": {"common": "Antarctica"}}))
            .normalize()
            .unwrap();
        assert_eq!(country.capital, UNKNOWN_CAPITAL);
        assert!(country.subregion.is_none());
        assert_eq!(country.population, 0);
    }

    #[test]
    fn test_normalize_preserves_count_and_order() {
        let records: Vec<RawCountry> = serde_json::from_value(json!([
            {"name": {"common": "B"}, "capital": ["b"]},
            {"name": {"common": "A"}, "capital": []},
            {"name": {"common": "C"}}
        ]))
        .unwrap();

        let rows = normalize(records).unwrap();
        assert_eq!(rows.len(), 3);
        let names: Vec<_> = rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert_eq!(rows[1].capital, UNKNOWN_CAPITAL);
    }

    #[test]
    fn test_normalize_reports_bad_record_position() {
        let records: Vec<RawCountry> = serde_json::from_value(json!([
            {"name": {"common": "A"}},
            {"name": {"official": "Nameless"}}
        ]))
        .unwrap();

        let err = normalize(records).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }
}
