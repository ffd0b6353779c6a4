/// Structured insights provider
///
/// Queries a remote taste-insights API with an ordered list of search
/// strategies, stopping at the first one that yields entities. Exhaustion,
/// a missing API key, or any unexpected fault degrades to a curated static
/// list per category. The companion tags query has no such fallback and
/// propagates its errors.
use std::time::Duration;

use rand::Rng;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Category, Mode, Recommendation, RecommendationDetails},
    services::providers::{CandidateSet, CandidateSource, Origin},
};

/// Entities requested per strategy attempt
const ENTITY_LIMIT: u32 = 6;
/// Default tag count for the insights query
const DEFAULT_TAG_LIMIT: u32 = 20;

const USER_AGENT: &str = "taste-api/1.0";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct InsightsResponse {
    #[allow(dead_code)]
    success: bool,
    #[serde(default)]
    results: InsightsResults,
    #[serde(default)]
    warnings: Vec<InsightsWarning>,
    #[allow(dead_code)]
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Default, Deserialize)]
struct InsightsResults {
    #[serde(default)]
    entities: Vec<ApiEntity>,
    #[serde(default)]
    tags: Vec<TasteTag>,
}

#[derive(Debug, Deserialize)]
struct InsightsWarning {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    warning_type: String,
    #[serde(default)]
    parameter: String,
    message: String,
}

/// Raw entity record as the API returns it
#[derive(Debug, Deserialize)]
struct ApiEntity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    entity_type: String,
    #[serde(default)]
    metadata: Option<EntityMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct EntityMetadata {
    #[serde(default)]
    year: Option<u16>,
    #[serde(default)]
    genre: Option<Vec<String>>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

/// Tag-style insight record, passed through to the client unchanged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasteTag {
    pub tag_id: String,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub tag_value: String,
}

/// Normalized recommendation record from the insights provider
#[derive(Debug, Clone, PartialEq)]
pub struct InsightEntry {
    pub id: String,
    pub name: String,
    /// App-level tag where the entity type maps back to one, otherwise the
    /// provider's raw token
    pub category: String,
    pub year: Option<u16>,
    pub genre: Option<Vec<String>>,
    pub rating: f64,
    pub description: String,
}

/// Optional filters for the tags query; absent fields are omitted from the
/// request entirely
#[derive(Debug, Default, Clone)]
pub struct TasteInsightsParams {
    pub tag_types: Option<String>,
    pub parent_types: Option<String>,
    pub audiences: Option<String>,
    pub interest_entities: Option<String>,
    pub interest_tags: Option<String>,
    pub location: Option<String>,
    pub location_query: Option<String>,
    pub limit: Option<u32>,
}

// ============================================================================
// Search strategies
// ============================================================================

/// One concrete request-construction approach against the insights API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    ByName,
    ByInterests,
    WithContext,
    ByTags,
    WithGenreContext,
    GeneralTrending,
}

impl Strategy {
    /// Ordered attempt list for a mode; a general trending search is always
    /// the last resort
    fn for_mode(mode: Mode) -> &'static [Strategy] {
        match mode {
            Mode::Specific => &[
                Strategy::ByName,
                Strategy::ByInterests,
                Strategy::WithContext,
                Strategy::GeneralTrending,
            ],
            Mode::Genre => &[
                Strategy::ByTags,
                Strategy::WithGenreContext,
                Strategy::GeneralTrending,
            ],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Strategy::ByName => "name search",
            Strategy::ByInterests => "interests search",
            Strategy::WithContext => "context search",
            Strategy::ByTags => "tags search",
            Strategy::WithGenreContext => "genre context search",
            Strategy::GeneralTrending => "general trending search",
        }
    }

    /// Query parameters for one attempt
    fn query(&self, input: &str, entity_type: &str) -> Vec<(&'static str, String)> {
        let filter_type = format!("urn:entity:{}", entity_type);
        let mut params = vec![("filter.type", filter_type)];

        match self {
            Strategy::ByName => {
                params.push(("filter.name", input.to_string()));
            }
            Strategy::ByInterests => {
                params.push(("signal.interests.query", input.to_string()));
            }
            Strategy::WithContext => {
                params.push(("signal.interests.query", input.to_string()));
                params.push(("signal.context.time", "recent".to_string()));
                params.push(("signal.context.popularity", "trending".to_string()));
            }
            Strategy::ByTags => {
                params.push(("filter.tags", input.to_string()));
            }
            Strategy::WithGenreContext => {
                params.push(("filter.tags", input.to_string()));
                params.push(("signal.context.time", "recent".to_string()));
            }
            Strategy::GeneralTrending => {
                params.push(("signal.context.popularity", "trending".to_string()));
            }
        }

        params.push(("limit", ENTITY_LIMIT.to_string()));
        params
    }
}

// ============================================================================
// Provider
// ============================================================================

#[derive(Clone)]
pub struct InsightsProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl InsightsProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: HttpClient::new(),
            // an empty key counts as absent
            api_key: config.insights_api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.insights_api_url.clone(),
            timeout: Duration::from_secs(config.insights_timeout_secs),
        }
    }

    /// Runs the strategy ladder for the input. Returns the normalized
    /// entries plus a flag telling whether curated mock data was used.
    pub async fn get_recommendations(
        &self,
        input: &str,
        category: Category,
        mode: Mode,
    ) -> (Vec<InsightEntry>, bool) {
        let Some(api_key) = self.api_key.clone() else {
            tracing::warn!(
                category = category.as_str(),
                provider = "insights",
                "API key not configured, using curated recommendations"
            );
            return (mock_recommendations(category), true);
        };

        let entity_type = category.entity_type();

        for strategy in Strategy::for_mode(mode) {
            match self
                .run_strategy(&api_key, *strategy, input, entity_type)
                .await
            {
                Ok(entries) if !entries.is_empty() => {
                    tracing::info!(
                        strategy = strategy.label(),
                        results = entries.len(),
                        provider = "insights",
                        "Strategy succeeded"
                    );
                    return (entries, false);
                }
                Ok(_) => {
                    tracing::debug!(
                        strategy = strategy.label(),
                        "Strategy returned no entities, trying next"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        strategy = strategy.label(),
                        error = %e,
                        "Strategy failed, trying next"
                    );
                }
            }
        }

        tracing::warn!(
            input = %input,
            category = category.as_str(),
            provider = "insights",
            "All strategies exhausted, using curated recommendations"
        );
        (mock_recommendations(category), true)
    }

    /// One bounded attempt with one strategy; zero entities is a failure so
    /// the ladder moves on
    async fn run_strategy(
        &self,
        api_key: &str,
        strategy: Strategy,
        input: &str,
        entity_type: &str,
    ) -> AppResult<Vec<InsightEntry>> {
        let url = format!("{}/v2/insights/", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .header("X-Api-Key", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&strategy.query(input, entity_type))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "{} returned status {}: {}",
                strategy.label(),
                status,
                body
            )));
        }

        let data: InsightsResponse = response.json().await?;
        log_warnings(&data.warnings);

        Ok(normalize_entities(data.results.entities))
    }

    /// Direct tag-style insights query. No mock fallback: a missing key,
    /// an upstream failure, or an empty tag list all propagate as errors.
    pub async fn taste_insights(&self, params: &TasteInsightsParams) -> AppResult<Vec<TasteTag>> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(AppError::Configuration(
                "INSIGHTS_API_KEY is not configured".to_string(),
            ));
        };

        let url = format!("{}/v2/insights/", self.base_url);
        let query = build_insights_query(params);

        tracing::debug!(params = query.len(), "Sending taste insights request");

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .header("X-Api-Key", &api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Taste insights query returned status {}: {}",
                status, body
            )));
        }

        let data: InsightsResponse = response.json().await?;
        log_warnings(&data.warnings);

        let tags = data.results.tags;
        if tags.is_empty() {
            return Err(AppError::ExternalApi(
                "Taste insights query returned no tags".to_string(),
            ));
        }

        tracing::info!(tags = tags.len(), provider = "insights", "Taste insights fetched");
        Ok(tags)
    }
}

#[async_trait::async_trait]
impl CandidateSource for InsightsProvider {
    async fn candidates(
        &self,
        input: &str,
        category: Category,
        mode: Mode,
    ) -> AppResult<CandidateSet> {
        let (entries, from_mock) = self.get_recommendations(input, category, mode).await;
        let recommendations = entries
            .into_iter()
            .map(|entry| entry.into_recommendation(input, category))
            .collect();

        Ok(CandidateSet {
            recommendations,
            origin: if from_mock {
                Origin::Mock
            } else {
                Origin::Insights
            },
        })
    }

    fn name(&self) -> &'static str {
        "insights"
    }
}

fn log_warnings(warnings: &[InsightsWarning]) {
    for warning in warnings {
        tracing::warn!(
            parameter = %warning.parameter,
            message = %warning.message,
            "Insights API warning"
        );
    }
}

/// Tags query parameters; optional filters are appended only when present
fn build_insights_query(params: &TasteInsightsParams) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("filter.type", "urn:tag".to_string()),
        ("limit", params.limit.unwrap_or(DEFAULT_TAG_LIMIT).to_string()),
    ];

    if let Some(tag_types) = &params.tag_types {
        query.push(("filter.tag.types", tag_types.clone()));
    }
    if let Some(parent_types) = &params.parent_types {
        query.push(("filter.parents.types", parent_types.clone()));
    }
    if let Some(audiences) = &params.audiences {
        query.push(("signal.demographics.audiences", audiences.clone()));
    }
    if let Some(entities) = &params.interest_entities {
        query.push(("signal.interests.entities", entities.clone()));
    }
    if let Some(tags) = &params.interest_tags {
        query.push(("signal.interests.tags", tags.clone()));
    }
    if let Some(location) = &params.location {
        query.push(("signal.location", location.clone()));
    }
    if let Some(location_query) = &params.location_query {
        query.push(("signal.location.query", location_query.clone()));
    }

    query
}

/// Maps raw API entities into normalized entries, defaulting every absent
/// field: positional ids and names, a random rating in [7, 9), generic
/// description text
fn normalize_entities(entities: Vec<ApiEntity>) -> Vec<InsightEntry> {
    let mut rng = rand::thread_rng();

    entities
        .into_iter()
        .enumerate()
        .map(|(index, entity)| {
            let metadata = entity.metadata.unwrap_or_default();
            let token = entity
                .entity_type
                .trim_start_matches("urn:entity:")
                .to_string();

            InsightEntry {
                id: entity
                    .id
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("entity_{}", index)),
                name: entity
                    .name
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("Recommendation {}", index + 1)),
                category: Category::from_entity_type(&token)
                    .map(|c| c.as_str().to_string())
                    .unwrap_or(token),
                year: metadata.year,
                genre: metadata.genre,
                rating: metadata.rating.unwrap_or_else(|| rng.gen_range(7.0..9.0)),
                description: metadata
                    .description
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "A great recommendation for you.".to_string()),
            }
        })
        .collect()
}

impl InsightEntry {
    /// Lifts a normalized entry into the canonical response entity. The
    /// requested category labels the card; narrative details are built from
    /// whatever metadata the entry carries so they are never empty. Media
    /// is left for the enrichment pass.
    pub fn into_recommendation(self, input: &str, requested: Category) -> Recommendation {
        let reason = match self.genre.as_deref() {
            Some(genres) if !genres.is_empty() => format!(
                "A strong match for your interest in \"{}\", with its {} sensibilities.",
                input,
                genres.join(", ")
            ),
            _ => format!("A strong match for your interest in \"{}\".", input),
        };
        let tips = match self.year {
            Some(year) => format!("Start with its {} release to see why it endures.", year),
            None => "Add it to your shortlist and give it a proper try.".to_string(),
        };

        Recommendation {
            id: self.id,
            name: self.name,
            category: requested.as_str().to_string(),
            image: String::new(),
            rating: self.rating,
            description: self.description.clone(),
            details: RecommendationDetails {
                reason,
                tips,
                summary: self.description,
                language: None,
                trailer: None,
                preview: None,
            },
        }
    }
}

// ============================================================================
// Curated mock data
// ============================================================================

/// Fixed per-category records used when the live API is unavailable
pub fn mock_recommendations(category: Category) -> Vec<InsightEntry> {
    tracing::debug!(category = category.as_str(), "Building curated recommendations");

    match category {
        Category::Movies => vec![
            InsightEntry {
                id: "movie_mock_1".to_string(),
                name: "The Matrix".to_string(),
                category: "movie".to_string(),
                year: Some(1999),
                genre: Some(vec!["Sci-Fi".to_string(), "Action".to_string()]),
                rating: 8.7,
                description:
                    "A computer hacker learns from mysterious rebels about the true nature of his reality."
                        .to_string(),
            },
            InsightEntry {
                id: "movie_mock_2".to_string(),
                name: "Inception".to_string(),
                category: "movie".to_string(),
                year: Some(2010),
                genre: Some(vec![
                    "Sci-Fi".to_string(),
                    "Action".to_string(),
                    "Thriller".to_string(),
                ]),
                rating: 8.8,
                description:
                    "A thief who steals information by entering people's dreams is given the inverse task."
                        .to_string(),
            },
            InsightEntry {
                id: "movie_mock_3".to_string(),
                name: "Dune".to_string(),
                category: "movie".to_string(),
                year: Some(2021),
                genre: Some(vec![
                    "Sci-Fi".to_string(),
                    "Adventure".to_string(),
                    "Drama".to_string(),
                ]),
                rating: 8.0,
                description:
                    "A gifted young man must travel to the most dangerous planet in the universe to ensure the future of his family and his people."
                        .to_string(),
            },
        ],
        Category::Music => vec![
            InsightEntry {
                id: "music_mock_1".to_string(),
                name: "Blinding Lights".to_string(),
                category: "song".to_string(),
                year: None,
                genre: Some(vec!["Pop".to_string(), "Synthwave".to_string()]),
                rating: 8.5,
                description: "A hit song by The Weeknd, known for its retro-futuristic sound."
                    .to_string(),
            },
            InsightEntry {
                id: "music_mock_2".to_string(),
                name: "Daft Punk".to_string(),
                category: "artist".to_string(),
                year: None,
                genre: Some(vec!["Electronic".to_string(), "House".to_string()]),
                rating: 9.0,
                description: "Iconic French electronic music duo.".to_string(),
            },
        ],
        Category::Books => vec![InsightEntry {
            id: "book_mock_1".to_string(),
            name: "1984".to_string(),
            category: "book".to_string(),
            year: Some(1949),
            genre: Some(vec!["Dystopian".to_string(), "Sci-Fi".to_string()]),
            rating: 8.6,
            description: "George Orwell's classic dystopian novel.".to_string(),
        }],
        Category::Places => vec![InsightEntry {
            id: "place_mock_1".to_string(),
            name: "Tokyo".to_string(),
            category: "city".to_string(),
            year: None,
            genre: None,
            rating: 9.2,
            description:
                "A vibrant metropolis blending traditional culture with cutting-edge technology."
                    .to_string(),
        }],
        Category::Food => vec![InsightEntry {
            id: "food_mock_1".to_string(),
            name: "Sushi".to_string(),
            category: "cuisine".to_string(),
            year: None,
            genre: None,
            rating: 9.0,
            description: "Traditional Japanese dish of prepared vinegared rice.".to_string(),
        }],
        Category::Fashion => vec![InsightEntry {
            id: "fashion_mock_1".to_string(),
            name: "Streetwear".to_string(),
            category: "style".to_string(),
            year: None,
            genre: None,
            rating: 8.0,
            description: "A casual clothing style that became global in the 1990s.".to_string(),
        }],
        Category::Games => vec![
            InsightEntry {
                id: "game_mock_1".to_string(),
                name: "The Legend of Zelda: Breath of the Wild".to_string(),
                category: "game".to_string(),
                year: None,
                genre: None,
                rating: 9.7,
                description: "An open-world action-adventure game developed by Nintendo."
                    .to_string(),
            },
            InsightEntry {
                id: "game_mock_2".to_string(),
                name: "Grand Theft Auto V".to_string(),
                category: "game".to_string(),
                year: None,
                genre: None,
                rating: 9.5,
                description:
                    "An action-adventure game played from either a third-person or first-person perspective."
                        .to_string(),
            },
        ],
        Category::Art => vec![InsightEntry {
            id: "art_mock_1".to_string(),
            name: "Starry Night".to_string(),
            category: "painting".to_string(),
            year: None,
            genre: None,
            rating: 9.5,
            description:
                "An oil on canvas by the Dutch Post-Impressionist painter Vincent van Gogh."
                    .to_string(),
        }],
        Category::Mood => vec![InsightEntry {
            id: "mood_mock_1".to_string(),
            name: "Lo-fi Beats".to_string(),
            category: "music_genre".to_string(),
            year: None,
            genre: None,
            rating: 8.0,
            description: "Relaxing instrumental music, often used for studying or chilling."
                .to_string(),
        }],
    }
}
