pub mod dashboard;
pub mod db;
pub mod loader;
pub mod server;

pub use dashboard::{DashboardApi, DashboardAssets, DashboardPages, DashboardState};
pub use db::{CountryStore, Database};
pub use loader::{CountryLoader, LoadReport};
pub use server::DashboardServer;
