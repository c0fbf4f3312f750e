use std::cmp::Ordering;

use serde::Serialize;

use super::snapshot::SnapshotRow;
use crate::error::{AtlasError, Result};

/// Grid columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Country,
    Capital,
    Region,
    Subregion,
    Population,
    Area,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Country,
        Column::Capital,
        Column::Region,
        Column::Subregion,
        Column::Population,
        Column::Area,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Column::Country => "country",
            Column::Capital => "capital",
            Column::Region => "region",
            Column::Subregion => "subregion",
            Column::Population => "population",
            Column::Area => "area",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Country => "Country",
            Column::Capital => "Capital",
            Column::Region => "Region",
            Column::Subregion => "Subregion",
            Column::Population => "Population",
            Column::Area => "Area (km)",
        }
    }

    pub fn from_id(id: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Population | Column::Area)
    }

    /// Displayed text of this column for a row.
    pub fn text<'a>(&self, row: &'a SnapshotRow) -> &'a str {
        let c = &row.country;
        match self {
            Column::Country => &c.country,
            Column::Capital => &c.capital,
            Column::Region => c.region.as_deref().unwrap_or(""),
            Column::Subregion => c.subregion.as_deref().unwrap_or(""),
            Column::Population => &row.population_display,
            Column::Area => &row.area_display,
        }
    }

    fn compare(&self, a: &SnapshotRow, b: &SnapshotRow) -> Ordering {
        match self {
            Column::Population => a.country.population.cmp(&b.country.population),
            Column::Area => a.country.area.total_cmp(&b.country.area),
            Column::Region | Column::Subregion => {
                let (a, b) = (self.optional(a), self.optional(b));
                // Empty cells sort last
                match (a, b) {
                    (Some(a), Some(b)) => a.cmp(b),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            _ => self.text(a).cmp(self.text(b)),
        }
    }

    fn optional<'a>(&self, row: &'a SnapshotRow) -> Option<&'a str> {
        match self {
            Column::Region => row.country.region.as_deref(),
            Column::Subregion => row.country.subregion.as_deref(),
            _ => Some(self.text(row)),
        }
    }
}

/// Column header sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridColumn {
    pub name: &'static str,
    pub id: &'static str,
    pub numeric: bool,
}

impl From<Column> for GridColumn {
    fn from(column: Column) -> Self {
        Self {
            name: column.name(),
            id: column.id(),
            numeric: column.is_numeric(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One key of a multi-column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortKey {
    /// Render back to the `column:dir` form.
    pub fn to_param(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.column.id().to_string(),
            SortDirection::Desc => format!("{}:desc", self.column.id()),
        }
    }
}

/// Parse `population:desc,country` into sort keys.
///
/// A key without a direction sorts ascending. Empty segments are ignored.
pub fn parse_sort(spec: &str) -> Result<Vec<SortKey>> {
    let mut keys: Vec<SortKey> = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (id, dir) = part.split_once(':').unwrap_or((part, "asc"));
        let column = Column::from_id(id.trim())
            .ok_or_else(|| AtlasError::InvalidArgument(format!("Unknown sort column: {}", id)))?;
        let direction = match dir.trim().to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(AtlasError::InvalidArgument(format!(
                    "Unknown sort direction: {}",
                    other
                )))
            }
        };
        // A repeated column keeps its first position
        if !keys.iter().any(|k| k.column == column) {
            keys.push(SortKey { column, direction });
        }
    }
    Ok(keys)
}

/// Next sort after clicking a column header.
///
/// An unsorted column is appended ascending, an ascending column flips to
/// descending in place, and a descending column is removed.
pub fn toggle_sort(keys: &[SortKey], column: Column) -> Vec<SortKey> {
    let mut next = Vec::with_capacity(keys.len() + 1);
    let mut found = false;
    for key in keys {
        if key.column != column {
            next.push(*key);
            continue;
        }
        found = true;
        if key.direction == SortDirection::Asc {
            next.push(SortKey {
                column,
                direction: SortDirection::Desc,
            });
        }
    }
    if !found {
        next.push(SortKey {
            column,
            direction: SortDirection::Asc,
        });
    }
    next
}

/// Display state of the grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridQuery {
    pub sort: Vec<SortKey>,
    /// Case-insensitive text matched against every displayed cell.
    pub filter: Option<String>,
    /// Zero-based page.
    pub page: usize,
}

/// A displayed grid row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    /// Position in the region-filtered rows; this is what selection refers to.
    pub index: usize,
    pub country: String,
    pub capital: String,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub population: String,
    pub area: String,
    pub flag_url: Option<String>,
}

impl GridRow {
    fn new(index: usize, row: &SnapshotRow) -> Self {
        let c = &row.country;
        Self {
            index,
            country: c.country.clone(),
            capital: c.capital.clone(),
            region: c.region.clone(),
            subregion: c.subregion.clone(),
            population: row.population_display.clone(),
            area: row.area_display.clone(),
            flag_url: c.flag_url.clone(),
        }
    }
}

/// One page of the grid after text filtering and sorting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPage {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    /// Zero-based page actually shown.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Rows matching the text filter, across all pages.
    pub matching_rows: usize,
}

/// Build the visible page.
///
/// `rows` are the region-filtered rows in snapshot order. Text filtering,
/// sorting and paging only change what is displayed; every row keeps the
/// index it has in `rows`. Out-of-range pages show the last page.
pub fn build_page(rows: &[&SnapshotRow], query: &GridQuery, page_size: usize) -> GridPage {
    let page_size = page_size.max(1);
    let needle = query
        .filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let mut visible: Vec<(usize, &SnapshotRow)> = rows
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, row)| match &needle {
            Some(needle) => Column::ALL
                .iter()
                .any(|c| c.text(row).to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();

    if !query.sort.is_empty() {
        // Stable, so ties keep snapshot order
        visible.sort_by(|(_, a), (_, b)| {
            query
                .sort
                .iter()
                .map(|key| {
                    let ord = key.column.compare(a, b);
                    match key.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    let matching_rows = visible.len();
    let page_count = matching_rows.div_ceil(page_size).max(1);
    let page = query.page.min(page_count - 1);

    let rows = visible
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .map(|(index, row)| GridRow::new(index, row))
        .collect();

    GridPage {
        columns: Column::ALL.into_iter().map(GridColumn::from).collect(),
        rows,
        page,
        page_count,
        page_size,
        matching_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::snapshot::Snapshot;
    use crate::view::tests::sample_countries;

    fn names(page: &GridPage) -> Vec<&str> {
        page.rows.iter().map(|r| r.country.as_str()).collect()
    }

    #[test]
    fn test_columns() {
        let ids: Vec<_> = Column::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(
            ids,
            ["country", "capital", "region", "subregion", "population", "area"]
        );
        assert_eq!(Column::Area.name(), "Area (km)");
        assert_eq!(Column::from_id("capital"), Some(Column::Capital));
        assert_eq!(Column::from_id("flag_url"), None);
    }

    #[test]
    fn test_parse_sort() {
        let keys = parse_sort("population:desc, country ,,").unwrap();
        assert_eq!(
            keys,
            vec![
                SortKey {
                    column: Column::Population,
                    direction: SortDirection::Desc
                },
                SortKey {
                    column: Column::Country,
                    direction: SortDirection::Asc
                },
            ]
        );
        assert_eq!(keys[0].to_param(), "population:desc");
        assert_eq!(keys[1].to_param(), "country");
        assert!(parse_sort("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_sort_rejects_unknown() {
        assert!(matches!(
            parse_sort("flag_url"),
            Err(AtlasError::InvalidArgument(_))
        ));
        assert!(parse_sort("country:sideways").is_err());
    }

    #[test]
    fn test_toggle_sort_cycle() {
        let keys = toggle_sort(&[], Column::Population);
        assert_eq!(keys, parse_sort("population").unwrap());

        let keys = toggle_sort(&keys, Column::Country);
        assert_eq!(keys, parse_sort("population,country").unwrap());

        let keys = toggle_sort(&keys, Column::Population);
        assert_eq!(keys, parse_sort("population:desc,country").unwrap());

        let keys = toggle_sort(&keys, Column::Population);
        assert_eq!(keys, parse_sort("country").unwrap());
    }

    #[test]
    fn test_unsorted_page_keeps_snapshot_order() {
        let snapshot = Snapshot::new(sample_countries());
        let rows = snapshot.filter_by_region(None);
        let page = build_page(&rows, &GridQuery::default(), 15);

        assert_eq!(names(&page), ["Canada", "France", "Antarctica", "Malta", "Brazil"]);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.columns.len(), 6);
        let indices: Vec<_> = page.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sort_population_is_numeric() {
        let snapshot = Snapshot::new(sample_countries());
        let rows = snapshot.filter_by_region(None);
        let query = GridQuery {
            sort: parse_sort("population:desc").unwrap(),
            ..Default::default()
        };

        let page = build_page(&rows, &query, 15);
        assert_eq!(names(&page), ["Brazil", "France", "Canada", "Malta", "Antarctica"]);
        // Indices still point at the unsorted rows
        assert_eq!(page.rows[0].index, 4);
    }

    #[test]
    fn test_multi_sort_and_missing_region_last() {
        let snapshot = Snapshot::new(sample_countries());
        let rows = snapshot.filter_by_region(None);
        let query = GridQuery {
            sort: parse_sort("region,area:desc").unwrap(),
            ..Default::default()
        };

        let page = build_page(&rows, &query, 15);
        assert_eq!(names(&page), ["Canada", "Brazil", "France", "Malta", "Antarctica"]);
    }

    #[test]
    fn test_text_filter() {
        let snapshot = Snapshot::new(sample_countries());
        let rows = snapshot.filter_by_region(None);
        let query = GridQuery {
            filter: Some("  PARIS ".to_string()),
            ..Default::default()
        };

        let page = build_page(&rows, &query, 15);
        assert_eq!(names(&page), ["France"]);
        assert_eq!(page.rows[0].index, 1);
        assert_eq!(page.matching_rows, 1);
    }

    #[test]
    fn test_paging_and_clamping() {
        let snapshot = Snapshot::new(sample_countries());
        let rows = snapshot.filter_by_region(None);

        let second = build_page(
            &rows,
            &GridQuery {
                page: 1,
                ..Default::default()
            },
            2,
        );
        assert_eq!(second.page_count, 3);
        assert_eq!(names(&second), ["Antarctica", "Malta"]);

        let beyond = build_page(
            &rows,
            &GridQuery {
                page: 99,
                ..Default::default()
            },
            2,
        );
        assert_eq!(beyond.page, 2);
        assert_eq!(names(&beyond), ["Brazil"]);
    }

    #[test]
    fn test_empty_rows_single_page() {
        let page = build_page(&[], &GridQuery::default(), 15);
        assert!(page.rows.is_empty());
        assert_eq!(page.page_count, 1);
        assert_eq!(page.page, 0);
    }
}
