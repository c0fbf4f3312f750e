//! Dashboard view model.
//!
//! Everything the dashboard shows for one interaction is computed here from
//! the startup [`Snapshot`] and a fresh set of region totals. The runtime
//! only fetches the totals and renders the result.

mod grid;
mod selection;
mod snapshot;

pub use grid::{
    build_page, parse_sort, toggle_sort, Column, GridColumn, GridPage, GridQuery, GridRow,
    SortDirection, SortKey,
};
pub use selection::{select, CountryInfo, Selection, NO_SELECTION_FLAG, NO_SELECTION_INFO};
pub use snapshot::{Snapshot, SnapshotRow};

use serde::{Deserialize, Serialize};

use crate::aggregate::RegionTotal;
use crate::chart::BarChart;
use crate::error::{AtlasError, Result};

/// Raw query parameters of a dashboard request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    /// Region filter. Empty means all regions.
    pub region: Option<String>,
    /// Selected row index. Absent means the first row, empty means none.
    pub selected: Option<String>,
    /// Sort keys, e.g. `population:desc,country`.
    pub sort: Option<String>,
    /// Text filter across all cells.
    pub filter: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<String>,
}

impl DashboardParams {
    /// Validate and convert into a request.
    pub fn into_request(self) -> Result<DashboardRequest> {
        let region = self.region.filter(|r| !r.trim().is_empty());

        let selected = match self.selected.as_deref().map(str::trim) {
            None => Some(0),
            Some("") => None,
            Some(s) => Some(s.parse::<usize>().map_err(|_| {
                AtlasError::InvalidArgument(format!("Invalid selected row: {}", s))
            })?),
        };

        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(s) => s
                .parse::<usize>()
                .map_err(|_| AtlasError::InvalidArgument(format!("Invalid page: {}", s)))?
                .saturating_sub(1),
        };

        let sort = match self.sort.as_deref() {
            Some(spec) => parse_sort(spec)?,
            None => Vec::new(),
        };

        Ok(DashboardRequest {
            region,
            selected,
            grid: GridQuery {
                sort,
                filter: self.filter.filter(|f| !f.trim().is_empty()),
                page,
            },
        })
    }
}

/// One dashboard interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub region: Option<String>,
    pub selected: Option<usize>,
    pub grid: GridQuery,
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            region: None,
            selected: Some(0),
            grid: GridQuery::default(),
        }
    }
}

impl DashboardRequest {
    /// Query string reproducing this request, for links and the client.
    pub fn to_query(&self) -> String {
        let mut parts: Vec<(&str, String)> = Vec::new();
        if let Some(region) = &self.region {
            parts.push(("region", region.clone()));
        }
        parts.push((
            "selected",
            self.selected.map(|s| s.to_string()).unwrap_or_default(),
        ));
        if !self.grid.sort.is_empty() {
            let sort: Vec<String> = self.grid.sort.iter().map(|k| k.to_param()).collect();
            parts.push(("sort", sort.join(",")));
        }
        if let Some(filter) = &self.grid.filter {
            parts.push(("filter", filter.clone()));
        }
        if self.grid.page > 0 {
            parts.push(("page", (self.grid.page + 1).to_string()));
        }

        parts
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, encode_component(&v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Everything the dashboard renders for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub region: Option<String>,
    pub regions: Vec<String>,
    /// Rows after the region filter, before text filtering and paging.
    pub filtered_rows: usize,
    pub grid: GridPage,
    pub chart: BarChart,
    pub selection: Selection,
}

impl DashboardView {
    /// Recompute the view for `request`.
    ///
    /// `totals` must be freshly aggregated over the whole table; they are
    /// independent of the region filter.
    pub fn build(
        snapshot: &Snapshot,
        request: &DashboardRequest,
        totals: &[RegionTotal],
        page_size: usize,
    ) -> Self {
        let rows = snapshot.filter_by_region(request.region.as_deref());

        Self {
            region: request.region.clone(),
            regions: snapshot.regions().to_vec(),
            filtered_rows: rows.len(),
            grid: build_page(&rows, &request.grid, page_size),
            chart: BarChart::population_by_region(totals),
            selection: select(&rows, request.selected),
        }
    }
}

/// Percent-encode a query component.
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b',' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
