use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

use atlas_core::error::AtlasError;
use atlas_core::view::{DashboardParams, DashboardView};

use super::pages::Fragments;
use super::DashboardState;

/// Dashboard API handlers.
pub struct DashboardApi;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Response to one dashboard interaction.
#[derive(Debug, Serialize)]
pub struct DashboardPayload {
    /// Canonical query string of the request, for the browser history.
    pub query: String,
    pub view: DashboardView,
    pub fragments: Fragments,
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

/// Recompute the dashboard for the given parameters.
pub async fn dashboard(
    State(state): State<DashboardState>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<DashboardPayload> {
    match state.interact(params).await {
        Ok((request, view)) => {
            let fragments = Fragments::render(&state.config.title, &request, &view);
            let payload = DashboardPayload {
                query: request.to_query(),
                view,
                fragments,
            };
            (StatusCode::OK, Json(ApiResponse::success(payload)))
        }
        Err(AtlasError::InvalidArgument(msg)) => {
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)))
        }
        Err(e) => {
            tracing::error!(error = %e, "Dashboard API request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to compute dashboard")),
            )
        }
    }
}

/// Distinct regions of the loaded snapshot.
pub async fn regions(State(state): State<DashboardState>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(state.snapshot.regions().to_vec()))
}
