use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::Recommendation,
    routes::recommendations::{sanitize_pipeline_error, RecommendationsBody},
    services::recommendations::Resolution,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub recommendations: Vec<Recommendation>,
    #[serde(rename = "fromMock")]
    pub from_mock: bool,
    #[serde(rename = "filtersAppliedButNoMatch")]
    pub filters_applied_but_no_match: bool,
}

impl From<Resolution> for DiscoverResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            from_mock: resolution.origin.is_mock(),
            filters_applied_but_no_match: resolution.filters_applied_but_no_match,
            recommendations: resolution.recommendations,
        }
    }
}

/// Handler for insights-backed discovery; same request shape as the
/// primary endpoint, provenance reported as a mock flag instead
pub async fn discover(
    State(state): State<AppState>,
    Json(body): Json<RecommendationsBody>,
) -> AppResult<Json<DiscoverResponse>> {
    let request = body.into_resolve_request();
    let resolution = state
        .discover
        .resolve(&request)
        .await
        .map_err(sanitize_pipeline_error)?;

    Ok(Json(resolution.into()))
}
