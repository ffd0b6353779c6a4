/// Generative text provider
///
/// Talks to a locally-hosted text-generation endpoint, asks for a fenced
/// JSON array of five well-known entities, and validates the result into
/// canonical recommendations. Never fails outward: any network, timeout,
/// or parse problem degrades to synthetic fallback records, surfaced to
/// the caller through [`Origin::GenerativeFallback`].
use std::time::Duration;

use rand::Rng;
use regex::Regex;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Category, Mode, Recommendation, RecommendationDetails},
    services::providers::{CandidateSet, CandidateSource, Origin},
};

/// How many recommendations a single generation is asked for
const RECOMMENDATION_COUNT: usize = 5;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    num_ctx: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 4096,
            num_ctx: 4096,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

/// Raw element of the model's JSON array, before validation
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    id: Option<String>,
    name: Option<String>,
    category: Option<String>,
    image: Option<String>,
    rating: Option<f64>,
    description: Option<String>,
    details: Option<RawDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDetails {
    reason: Option<String>,
    tips: Option<String>,
    summary: Option<String>,
    language: Option<String>,
    trailer: Option<String>,
    preview: Option<String>,
}

#[derive(Clone)]
pub struct GenerativeProvider {
    http_client: HttpClient,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GenerativeProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: config.ollama_base_url.clone(),
            model: config.ollama_model.clone(),
            timeout: Duration::from_secs(config.generation_timeout_secs),
        }
    }

    /// Generates candidate recommendations. Always resolves to a list:
    /// a real one on success, fallback records on any failure.
    pub async fn generate(&self, input: &str, category: Category, mode: Mode) -> CandidateSet {
        match self.request_candidates(input, category, mode).await {
            Ok(recommendations) => {
                tracing::info!(
                    count = recommendations.len(),
                    category = category.as_str(),
                    provider = "generative",
                    "Generation succeeded"
                );
                CandidateSet {
                    recommendations,
                    origin: Origin::Generative,
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    category = category.as_str(),
                    provider = "generative",
                    "Generation failed, using fallback recommendations"
                );
                CandidateSet {
                    recommendations: fallback_recommendations(input, category),
                    origin: Origin::GenerativeFallback,
                }
            }
        }
    }

    /// Single bounded attempt against the generation endpoint. The timeout
    /// cancels the in-flight request; a late response is never observed.
    async fn request_candidates(
        &self,
        input: &str,
        category: Category,
        mode: Mode,
    ) -> AppResult<Vec<Recommendation>> {
        let prompt = build_prompt(input, category, mode);
        let url = format!("{}/api/generate", self.base_url);

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generation request");

        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(&GenerateRequest {
                model: &self.model,
                prompt: &prompt,
                stream: false,
                options: GenerateOptions::default(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Generation endpoint returned status {}: {}",
                status, body
            )));
        }

        let data: GenerateResponse = response.json().await?;
        tracing::debug!(response_chars = data.response.len(), "Raw generation output received");

        parse_recommendations(&data.response)
    }
}

#[async_trait::async_trait]
impl CandidateSource for GenerativeProvider {
    async fn candidates(
        &self,
        input: &str,
        category: Category,
        mode: Mode,
    ) -> AppResult<CandidateSet> {
        Ok(self.generate(input, category, mode).await)
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

/// Builds the generation prompt: persona, the user's taste anchor, a strict
/// per-field schema, and a category-conditional extension (language for
/// movies/music, trailer for movies, preview for music).
fn build_prompt(input: &str, category: Category, mode: Mode) -> String {
    let tag = category.as_str();
    let emoji = category.emoji();

    let anchor = match mode {
        Mode::Specific => format!("The user likes \"{input}\" in the category \"{tag}\" {emoji}."),
        Mode::Genre => format!(
            "The user is drawn to the \"{input}\" genre within the category \"{tag}\" {emoji}."
        ),
    };

    let mut prompt = format!(
        "You are an AI-powered lifestyle discovery assistant. Your task is to generate personalized recommendations based on user input.\n\
{anchor}\n\
\n\
Generate exactly {RECOMMENDATION_COUNT} recommendations. For each recommendation, provide the name of a **well-known, existing entity** (e.g., a real movie title, a real artist, a real book title).\n\
Each recommendation must include:\n\
- \"id\": A unique string identifier (e.g., \"rec_1\", \"rec_2\").\n\
- \"name\": The name of the well-known, existing recommendation.\n\
- \"category\": The category (e.g., \"movies\", \"music\", \"books\").\n\
- \"image\": A generic placeholder image URL (e.g., \"/placeholder.svg?height=300&width=200\").\n\
- \"rating\": A numerical rating between 7.0 and 9.9.\n\
- \"description\": A concise description (1-2 sentences).\n\
- \"details\": An object containing:\n\
  - \"reason\": Why the user will love this, connecting it to \"{input}\" (1-2 sentences).\n\
  - \"tips\": One practical pro tip for enjoying this recommendation.\n\
  - \"summary\": A brief summary (1-2 sentences)."
    );

    if matches!(category, Category::Movies | Category::Music) {
        prompt.push_str(
            "\n  - \"language\": The primary language of the content (e.g., \"English\", \"Spanish\", \"French\").",
        );
    }
    if category == Category::Movies {
        prompt.push_str(
            "\n  - \"trailer\": A placeholder URL for a trailer (e.g., \"https://www.youtube.com/watch?v=dQw4w9WgXcQ\").",
        );
    }
    if category == Category::Music {
        prompt.push_str(
            "\n  - \"preview\": A placeholder URL for a music preview (e.g., \"https://example.com/preview.mp3\").",
        );
    }

    prompt.push_str(
        "\nConstraints:\n\
- Ensure all fields are present and correctly formatted.\n\
- Ratings must be between 7.0 and 9.9.\n\
- The \"name\" field MUST be a real, existing, and well-known entity.\n\
- Do NOT include any text outside the JSON array.\n\
- The JSON array MUST be complete and end with a closing ']' character.\n\
- Do NOT include any comments (like //) inside the JSON.\n\
- Wrap the JSON array in a markdown code block like this:\n\
```json\n\
[\n\
  { ... },\n\
  { ... }\n\
]\n\
```\n\
\n\
Generate the JSON array:",
    );

    prompt
}

/// Extracts the first fenced ```json block, or falls back to the whole text
fn extract_json(raw: &str) -> &str {
    let fence = Regex::new(r"(?s)```json\s*(.*?)```").expect("fence pattern is valid");
    match fence.captures(raw).and_then(|caps| caps.get(1)) {
        Some(block) => block.as_str().trim(),
        None => {
            tracing::debug!("No fenced JSON block found, parsing raw output");
            raw.trim()
        }
    }
}

/// Parses free-form model output into validated recommendations.
///
/// Fails if the text is not a JSON array or any element lacks a required
/// field; the caller treats that as a fallback trigger, so a single bad
/// record poisons the whole batch rather than shipping partial output.
fn parse_recommendations(raw: &str) -> AppResult<Vec<Recommendation>> {
    let json = extract_json(raw);

    let records: Vec<RawRecord> = serde_json::from_str(json).map_err(|e| {
        AppError::ExternalApi(format!("Generation output is not a JSON array: {}", e))
    })?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| validate_record(index, record))
        .collect()
}

fn validate_record(index: usize, record: RawRecord) -> AppResult<Recommendation> {
    let details = record
        .details
        .ok_or_else(|| missing_field(index, "details"))?;
    let rating = record.rating.ok_or_else(|| missing_field(index, "rating"))?;
    let description = require(index, "description", record.description)?;

    Ok(Recommendation {
        id: require(index, "id", record.id)?,
        name: require(index, "name", record.name)?,
        category: require(index, "category", record.category)?,
        image: require(index, "image", record.image)?,
        rating: rating.clamp(0.0, 10.0),
        description: description.clone(),
        details: RecommendationDetails {
            reason: details
                .reason
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "No reason provided.".to_string()),
            tips: details
                .tips
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "No tips provided.".to_string()),
            summary: details
                .summary
                .filter(|s| !s.is_empty())
                .unwrap_or(description),
            language: details.language,
            trailer: details.trailer,
            preview: details.preview,
        },
    })
}

fn require(index: usize, field: &str, value: Option<String>) -> AppResult<String> {
    value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing_field(index, field))
}

fn missing_field(index: usize, field: &str) -> AppError {
    AppError::ExternalApi(format!(
        "Invalid recommendation structure at index {}: missing {}",
        index, field
    ))
}

/// Deterministic-shape synthetic records used when generation fails.
///
/// Ratings are randomized in [8.0, 9.5); movies and music alternate
/// between English and Spanish so language filtering stays exercisable.
fn fallback_recommendations(input: &str, category: Category) -> Vec<Recommendation> {
    let mut rng = rand::thread_rng();
    let tag = category.as_str();
    let has_language = matches!(category, Category::Movies | Category::Music);

    (0..RECOMMENDATION_COUNT)
        .map(|i| {
            let rating = (rng.gen_range(8.0..9.5) * 10.0_f64).round() / 10.0;
            Recommendation {
                id: format!("fallback_{}", i + 1),
                name: format!("AI Recommended {} {}", category.display_name(), i + 1),
                category: tag.to_string(),
                image: "/placeholder.svg?height=300&width=200".to_string(),
                rating,
                description: format!(
                    "A unique {tag} experience that resonates with your taste in \"{input}\"."
                ),
                details: RecommendationDetails {
                    reason: format!(
                        "This recommendation is a great match for your interest in \"{input}\" due to its compelling {tag} elements."
                    ),
                    tips: "Consider diving deep into its unique aspects for a richer experience."
                        .to_string(),
                    summary: format!(
                        "An excellent choice for those who appreciate {tag} with a twist."
                    ),
                    language: has_language
                        .then(|| if i % 2 == 0 { "English" } else { "Spanish" }.to_string()),
                    trailer: (category == Category::Movies)
                        .then(|| "/placeholder.svg".to_string()),
                    preview: (category == Category::Music)
                        .then(|| "/placeholder.svg".to_string()),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ARRAY: &str = r#"[
        {
            "id": "rec_1",
            "name": "Interstellar",
            "category": "movies",
            "image": "/placeholder.svg?height=300&width=200",
            "rating": 8.7,
            "description": "A team travels through a wormhole in search of a new home.",
            "details": {
                "reason": "Mind-bending structure like the film you liked.",
                "tips": "Watch it on the biggest screen you can find.",
                "summary": "Epic sci-fi about love and time.",
                "language": "English",
                "trailer": "https://www.youtube.com/watch?v=zSWdZVtXT7E"
            }
        }
    ]"#;

    #[test]
    fn test_prompt_mentions_input_and_count() {
        let prompt = build_prompt("Inception", Category::Movies, Mode::Specific);
        assert!(prompt.contains("\"Inception\""));
        assert!(prompt.contains("Generate exactly 5 recommendations"));
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn test_prompt_conditional_schema_movies() {
        let prompt = build_prompt("Inception", Category::Movies, Mode::Specific);
        assert!(prompt.contains("\"language\""));
        assert!(prompt.contains("\"trailer\""));
        assert!(!prompt.contains("\"preview\""));
    }

    #[test]
    fn test_prompt_conditional_schema_music() {
        let prompt = build_prompt("Daft Punk", Category::Music, Mode::Specific);
        assert!(prompt.contains("\"language\""));
        assert!(prompt.contains("\"preview\""));
        assert!(!prompt.contains("\"trailer\""));
    }

    #[test]
    fn test_prompt_conditional_schema_books() {
        let prompt = build_prompt("1984", Category::Books, Mode::Specific);
        assert!(!prompt.contains("\"language\""));
        assert!(!prompt.contains("\"trailer\""));
        assert!(!prompt.contains("\"preview\""));
    }

    #[test]
    fn test_prompt_genre_mode_phrasing() {
        let specific = build_prompt("jazz", Category::Music, Mode::Specific);
        let genre = build_prompt("jazz", Category::Music, Mode::Genre);
        assert!(specific.contains("The user likes \"jazz\""));
        assert!(genre.contains("drawn to the \"jazz\" genre"));
    }

    #[test]
    fn test_extract_json_fenced_block() {
        let raw = "Here you go:\n```json\n[{\"a\": 1}]\n```\nEnjoy!";
        assert_eq!(extract_json(raw), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_json_without_fence_returns_raw() {
        assert_eq!(extract_json("  [1, 2, 3]  "), "[1, 2, 3]");
    }

    #[test]
    fn test_parse_valid_fenced_array() {
        let raw = format!("```json\n{}\n```", VALID_ARRAY);
        let recs = parse_recommendations(&raw).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, "rec_1");
        assert_eq!(recs[0].name, "Interstellar");
        assert_eq!(recs[0].rating, 8.7);
        assert_eq!(recs[0].details.language.as_deref(), Some("English"));
    }

    #[test]
    fn test_parse_defaults_missing_detail_text() {
        let raw = r#"[{
            "id": "rec_1",
            "name": "Dune",
            "category": "movies",
            "image": "/placeholder.svg",
            "rating": 8.0,
            "description": "Desert planet epic.",
            "details": {}
        }]"#;
        let recs = parse_recommendations(raw).unwrap();
        assert_eq!(recs[0].details.reason, "No reason provided.");
        assert_eq!(recs[0].details.tips, "No tips provided.");
        // summary falls back to the description
        assert_eq!(recs[0].details.summary, "Desert planet epic.");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_recommendations("{\"not\": \"an array\"}").is_err());
        assert!(parse_recommendations("plain prose, no JSON at all").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        let raw = r#"[{
            "id": "rec_1",
            "category": "movies",
            "image": "/placeholder.svg",
            "rating": 8.0,
            "description": "No name here.",
            "details": {}
        }]"#;
        let err = parse_recommendations(raw).unwrap_err();
        assert!(err.to_string().contains("missing name"));
    }

    #[test]
    fn test_parse_rejects_non_numeric_rating() {
        let raw = r#"[{
            "id": "rec_1",
            "name": "Dune",
            "category": "movies",
            "image": "/placeholder.svg",
            "rating": "great",
            "description": "Desert planet epic.",
            "details": {}
        }]"#;
        assert!(parse_recommendations(raw).is_err());
    }

    #[test]
    fn test_parse_clamps_out_of_range_rating() {
        let raw = r#"[{
            "id": "rec_1",
            "name": "Dune",
            "category": "movies",
            "image": "/placeholder.svg",
            "rating": 11.4,
            "description": "Desert planet epic.",
            "details": {}
        }]"#;
        let recs = parse_recommendations(raw).unwrap();
        assert_eq!(recs[0].rating, 10.0);
    }

    #[test]
    fn test_fallback_shape_for_movies() {
        let recs = fallback_recommendations("Inception", Category::Movies);
        assert_eq!(recs.len(), 5);
        for (i, rec) in recs.iter().enumerate() {
            assert_eq!(rec.id, format!("fallback_{}", i + 1));
            assert!(rec.name.starts_with("AI Recommended Movies"));
            assert!(rec.rating >= 8.0 && rec.rating <= 9.5);
            assert!(rec.description.contains("\"Inception\""));
            assert!(!rec.details.reason.is_empty());
            assert!(!rec.details.tips.is_empty());
            assert!(!rec.details.summary.is_empty());
            assert_eq!(rec.details.trailer.as_deref(), Some("/placeholder.svg"));
            assert!(rec.details.preview.is_none());
        }
        // languages alternate so a language filter has something to bite on
        assert_eq!(recs[0].details.language.as_deref(), Some("English"));
        assert_eq!(recs[1].details.language.as_deref(), Some("Spanish"));
    }

    #[test]
    fn test_fallback_omits_language_outside_movies_music() {
        let recs = fallback_recommendations("Tokyo", Category::Places);
        assert!(recs.iter().all(|r| r.details.language.is_none()));
        assert!(recs.iter().all(|r| r.details.trailer.is_none()));
        assert!(recs.iter().all(|r| r.details.preview.is_none()));
    }

    #[tokio::test]
    async fn test_generate_falls_back_when_endpoint_unreachable() {
        let config = crate::config::Config {
            ollama_base_url: "http://127.0.0.1:9".to_string(),
            ollama_model: "gemma:2b".to_string(),
            generation_timeout_secs: 5,
            insights_api_key: None,
            insights_api_url: String::new(),
            insights_timeout_secs: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let provider = GenerativeProvider::new(&config);

        let set = provider
            .generate("Inception", Category::Movies, Mode::Specific)
            .await;
        assert_eq!(set.origin, Origin::GenerativeFallback);
        assert_eq!(set.recommendations.len(), 5);
        assert!(set.recommendations[0].name.starts_with("AI Recommended Movies"));
    }
}
