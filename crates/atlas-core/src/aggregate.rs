//! Per-region population totals behind the dashboard chart.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::Result;

/// Total population of one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionTotal {
    pub region: String,
    pub population: i64,
}

/// Somewhere the dashboard can re-read region totals from on every
/// interaction.
pub trait RegionTotalsSource: Send + Sync + 'static {
    fn region_totals(&self) -> Pin<Box<dyn Future<Output = Result<Vec<RegionTotal>>> + Send + '_>>;
}

/// Sum population per region.
///
/// Rows without a region are skipped. The result is sorted by region name.
pub fn region_totals<I, S>(rows: I) -> Vec<RegionTotal>
where
    I: IntoIterator<Item = (Option<S>, i64)>,
    S: Into<String>,
{
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for (region, population) in rows {
        if let Some(region) = region {
            *totals.entry(region.into()).or_insert(0) += population;
        }
    }

    totals
        .into_iter()
        .map(|(region, population)| RegionTotal { region, population })
        .collect()
}
