mod api;
mod assets;
mod pages;

pub use api::{DashboardApi, DashboardPayload};
pub use assets::DashboardAssets;
pub use pages::{DashboardPages, Fragments};

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use atlas_core::aggregate::RegionTotalsSource;
use atlas_core::config::DashboardConfig;
use atlas_core::error::Result;
use atlas_core::view::{DashboardParams, DashboardRequest, DashboardView, Snapshot};

/// Dashboard state shared across handlers.
#[derive(Clone)]
pub struct DashboardState {
    /// Table contents read once at startup.
    pub snapshot: Arc<Snapshot>,
    /// Re-queried on every interaction for the chart.
    pub totals: Arc<dyn RegionTotalsSource>,
    pub config: Arc<DashboardConfig>,
}

impl DashboardState {
    pub fn new(
        snapshot: Snapshot,
        totals: impl RegionTotalsSource,
        config: DashboardConfig,
    ) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            totals: Arc::new(totals),
            config: Arc::new(config),
        }
    }

    /// Handle one interaction: filter the snapshot, re-aggregate region
    /// totals from the database and resolve the selection.
    pub async fn interact(
        &self,
        params: DashboardParams,
    ) -> Result<(DashboardRequest, DashboardView)> {
        let request = params.into_request()?;
        let totals = self.totals.region_totals().await?;
        tracing::debug!(
            region = ?request.region,
            selected = ?request.selected,
            regions = totals.len(),
            "Dashboard interaction"
        );

        let view = DashboardView::build(&self.snapshot, &request, &totals, self.config.page_size);
        Ok((request, view))
    }
}

/// Create the dashboard router.
pub fn create_dashboard_router(state: DashboardState) -> Router {
    Router::new()
        // Dashboard page
        .route("/", get(pages::index))
        // Static assets
        .route("/assets/styles.css", get(assets::styles_css))
        .route("/assets/main.js", get(assets::main_js))
        .with_state(state)
}

/// Create the JSON API router used by the page script.
pub fn create_api_router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/dashboard", get(api::dashboard))
        .route("/regions", get(api::regions))
        .layer(cors)
        .with_state(state)
}
