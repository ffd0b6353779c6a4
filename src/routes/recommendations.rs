use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Category, Mode, Recommendation},
    services::recommendations::{ResolveRequest, Resolution},
    state::AppState,
};

/// Request body shared by the recommendation and discover endpoints.
/// Field names match the client contract; every field is optional here so
/// the pipeline can produce the canonical required-fields error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsBody {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default, rename = "type")]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub rating_filter: Option<f64>,
    #[serde(default)]
    pub language_filter: Option<String>,
}

impl RecommendationsBody {
    pub fn into_resolve_request(self) -> ResolveRequest {
        ResolveRequest {
            input: self.input.unwrap_or_default(),
            category: self.category,
            mode: self.mode.unwrap_or_default(),
            min_rating: self.rating_filter,
            language_filter: self.language_filter,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    #[serde(rename = "fromLLM")]
    pub from_llm: bool,
    #[serde(rename = "filtersAppliedButNoMatch")]
    pub filters_applied_but_no_match: bool,
}

impl From<Resolution> for RecommendationsResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            from_llm: resolution.origin.is_generative(),
            filters_applied_but_no_match: resolution.filters_applied_but_no_match,
            recommendations: resolution.recommendations,
        }
    }
}

/// Handler for the primary recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendationsBody>,
) -> AppResult<Json<RecommendationsResponse>> {
    let request = body.into_resolve_request();
    let resolution = state
        .recommendations
        .resolve(&request)
        .await
        .map_err(sanitize_pipeline_error)?;

    Ok(Json(resolution.into()))
}

/// Keeps validation errors intact and collapses everything else into a
/// generic 500; the real fault is logged server-side only.
pub fn sanitize_pipeline_error(error: AppError) -> AppError {
    match error {
        AppError::InvalidInput(_) => error,
        other => {
            tracing::error!(error = %other, "Recommendation pipeline failed");
            AppError::Internal("Failed to generate recommendations".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::Origin;

    #[test]
    fn test_body_field_names_match_contract() {
        let body: RecommendationsBody = serde_json::from_str(
            r#"{
                "input": "Inception",
                "category": "movies",
                "type": "genre",
                "ratingFilter": 8.5,
                "languageFilter": "English"
            }"#,
        )
        .unwrap();

        assert_eq!(body.input.as_deref(), Some("Inception"));
        assert_eq!(body.category, Some(Category::Movies));
        assert_eq!(body.mode, Some(Mode::Genre));
        assert_eq!(body.rating_filter, Some(8.5));
        assert_eq!(body.language_filter.as_deref(), Some("English"));
    }

    #[test]
    fn test_body_defaults_when_fields_absent() {
        let body: RecommendationsBody = serde_json::from_str("{}").unwrap();
        let request = body.into_resolve_request();
        assert!(request.input.is_empty());
        assert_eq!(request.category, None);
        assert_eq!(request.mode, Mode::Specific);
    }

    #[test]
    fn test_response_envelope_field_names() {
        let response = RecommendationsResponse {
            recommendations: vec![],
            from_llm: true,
            filters_applied_but_no_match: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fromLLM"], true);
        assert_eq!(json["filtersAppliedButNoMatch"], false);
        assert!(json["recommendations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_from_llm_true_only_for_live_generative() {
        for (origin, expected) in [
            (Origin::Generative, true),
            (Origin::GenerativeFallback, false),
            (Origin::Insights, false),
            (Origin::Mock, false),
        ] {
            let response: RecommendationsResponse = Resolution {
                recommendations: vec![],
                origin,
                filters_applied_but_no_match: false,
            }
            .into();
            assert_eq!(response.from_llm, expected);
        }
    }

    #[test]
    fn test_sanitize_keeps_invalid_input() {
        let err = sanitize_pipeline_error(AppError::InvalidInput("nope".to_string()));
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_sanitize_hides_upstream_detail() {
        let err = sanitize_pipeline_error(AppError::ExternalApi("secret upstream".to_string()));
        match err {
            AppError::Internal(msg) => assert_eq!(msg, "Failed to generate recommendations"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
