use serde::Serialize;

use super::snapshot::SnapshotRow;

pub const NO_SELECTION_FLAG: &str = "No country selected";
pub const NO_SELECTION_INFO: &str = "Select a country from the table";

/// Details shown in the info panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryInfo {
    pub name: String,
    pub capital: String,
    pub region: Option<String>,
    pub population: String,
    /// Grouped area followed by `km²`.
    pub area: String,
}

/// What the flag and info panels show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Country {
        index: usize,
        flag_url: Option<String>,
        info: CountryInfo,
    },
    Placeholder {
        flag_message: &'static str,
        info_message: &'static str,
    },
}

impl Selection {
    fn placeholder() -> Self {
        Selection::Placeholder {
            flag_message: NO_SELECTION_FLAG,
            info_message: NO_SELECTION_INFO,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Selection::Country { index, .. } => Some(*index),
            Selection::Placeholder { .. } => None,
        }
    }
}

/// Resolve a selected index against the region-filtered rows.
///
/// No selection and an out-of-range index both fall back to the placeholder.
pub fn select(rows: &[&SnapshotRow], selected: Option<usize>) -> Selection {
    let Some(index) = selected else {
        return Selection::placeholder();
    };
    let Some(row) = rows.get(index) else {
        return Selection::placeholder();
    };

    let c = &row.country;
    Selection::Country {
        index,
        flag_url: c.flag_url.clone(),
        info: CountryInfo {
            name: c.country.clone(),
            capital: c.capital.clone(),
            region: c.region.clone(),
            population: row.population_display.clone(),
            area: format!("{} km²", row.area_display),
        },
    }
}
