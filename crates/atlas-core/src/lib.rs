pub mod aggregate;
pub mod chart;
pub mod config;
pub mod country;
pub mod error;
pub mod format;
pub mod schema;
pub mod view;

pub use aggregate::{region_totals, RegionTotal, RegionTotalsSource};
pub use chart::BarChart;
pub use config::AtlasConfig;
pub use country::{Country, RawCountry};
pub use error::{AtlasError, Result};
pub use view::{DashboardParams, DashboardRequest, DashboardView, Snapshot};
