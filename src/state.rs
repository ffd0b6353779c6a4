use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        providers::{generative::GenerativeProvider, insights::InsightsProvider},
        recommendations::RecommendationPipeline,
    },
};

/// Shared application state
///
/// Built once at startup from immutable configuration and cloned into
/// handlers. The generative provider drives the primary recommendation
/// pipeline; the insights provider backs both the discover pipeline and
/// the direct taste-insights queries.
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationPipeline>,
    pub discover: Arc<RecommendationPipeline>,
    pub insights: Arc<InsightsProvider>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let generative = Arc::new(GenerativeProvider::new(config));
        let insights = Arc::new(InsightsProvider::new(config));

        Self {
            recommendations: Arc::new(RecommendationPipeline::new(generative)),
            discover: Arc::new(RecommendationPipeline::new(insights.clone())),
            insights,
        }
    }
}
