/// Resolution pipeline
///
/// Orchestrates one candidate source into a uniform response: validate the
/// request, fetch candidates, guarantee enriched media on every record,
/// apply the user's post-filters, and report honestly when those filters
/// eliminated everything. Stateless per call; provider fallback chains are
/// the sources' own concern.
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Category, Mode, Recommendation},
    services::{
        enrichment,
        providers::{CandidateSource, Origin},
    },
};

/// Validated-enough request for one resolution run. Category stays optional
/// so the pipeline owns the required-field check and its canonical error.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub input: String,
    pub category: Option<Category>,
    pub mode: Mode,
    pub min_rating: Option<f64>,
    pub language_filter: Option<String>,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct Resolution {
    pub recommendations: Vec<Recommendation>,
    pub origin: Origin,
    pub filters_applied_but_no_match: bool,
}

pub struct RecommendationPipeline {
    source: Arc<dyn CandidateSource>,
}

impl RecommendationPipeline {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self { source }
    }

    /// Resolves a request into a response envelope.
    ///
    /// Filters run after enrichment, in a fixed order: rating first, then
    /// language. When filters were requested and wiped out a non-empty
    /// candidate list, the empty list is returned with the no-match flag
    /// set rather than silently ignoring the filter.
    pub async fn resolve(&self, request: &ResolveRequest) -> AppResult<Resolution> {
        let input = request.input.trim();
        let Some(category) = request.category else {
            return Err(AppError::InvalidInput(
                "Input and category are required".to_string(),
            ));
        };
        if input.is_empty() {
            return Err(AppError::InvalidInput(
                "Input and category are required".to_string(),
            ));
        }

        let set = self.source.candidates(input, category, request.mode).await?;
        let origin = set.origin;
        let mut candidates = set.recommendations;

        tracing::debug!(
            source = self.source.name(),
            candidates = candidates.len(),
            category = category.as_str(),
            "Candidates fetched"
        );

        for candidate in &mut candidates {
            enrichment::apply(candidate, category);
        }

        let had_candidates = !candidates.is_empty();
        let filters_requested =
            request.min_rating.is_some() || request.language_filter.is_some();

        if let Some(min_rating) = request.min_rating {
            candidates.retain(|rec| rec.rating >= min_rating);
        }
        if let Some(language) = &request.language_filter {
            // Case-sensitive match; records that never carry a language
            // (anything outside movies/music) pass through untouched.
            candidates.retain(|rec| {
                rec.details
                    .language
                    .as_deref()
                    .map_or(true, |l| l == language)
            });
        }

        let filters_applied_but_no_match =
            filters_requested && had_candidates && candidates.is_empty();

        if filters_applied_but_no_match {
            tracing::info!(
                source = self.source.name(),
                "Filters eliminated every candidate"
            );
        }

        Ok(Resolution {
            recommendations: candidates,
            origin,
            filters_applied_but_no_match,
        })
    }
}
