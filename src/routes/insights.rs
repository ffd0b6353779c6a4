use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    services::providers::insights::{TasteInsightsParams, TasteTag},
    state::AppState,
};

/// Query parameters for the taste-insights endpoint; all optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsQuery {
    pub tag_types: Option<String>,
    pub parent_types: Option<String>,
    pub audiences: Option<String>,
    pub interest_entities: Option<String>,
    pub interest_tags: Option<String>,
    pub location: Option<String>,
    pub location_query: Option<String>,
    pub limit: Option<u32>,
}

impl From<InsightsQuery> for TasteInsightsParams {
    fn from(query: InsightsQuery) -> Self {
        Self {
            tag_types: query.tag_types,
            parent_types: query.parent_types,
            audiences: query.audiences,
            interest_entities: query.interest_entities,
            interest_tags: query.interest_tags,
            location: query.location,
            location_query: query.location_query,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub tags: Vec<TasteTag>,
}

/// Handler for direct tag-style insights queries.
///
/// Unlike the recommendation paths this has no fallback: configuration and
/// upstream failures propagate to the client as errors.
pub async fn insights(
    State(state): State<AppState>,
    Query(query): Query<InsightsQuery>,
) -> AppResult<Json<InsightsResponse>> {
    let tags = state.insights.taste_insights(&query.into()).await?;
    Ok(Json(InsightsResponse { tags }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_field_names_match_contract() {
        let query: InsightsQuery = serde_json::from_str(
            r#"{"tagTypes": "urn:tag:keyword:media", "audiences": "urn:audience:millennials", "limit": 5}"#,
        )
        .unwrap();
        assert_eq!(query.tag_types.as_deref(), Some("urn:tag:keyword:media"));
        assert_eq!(query.audiences.as_deref(), Some("urn:audience:millennials"));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.location, None);
    }

    #[test]
    fn test_query_converts_to_params() {
        let query = InsightsQuery {
            interest_entities: Some("urn:entity:movie:inception".to_string()),
            limit: Some(10),
            ..Default::default()
        };
        let params: TasteInsightsParams = query.into();
        assert_eq!(
            params.interest_entities.as_deref(),
            Some("urn:entity:movie:inception")
        );
        assert_eq!(params.limit, Some(10));
        assert_eq!(params.tag_types, None);
    }
}
