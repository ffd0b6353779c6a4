use serde::{Deserialize, Serialize};

/// One of the nine fixed domain tags the app recommends within.
///
/// The tag scopes prompt construction, insights entity-type mapping, and
/// media enrichment dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movies,
    Music,
    Books,
    Places,
    Food,
    Fashion,
    Games,
    Art,
    Mood,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Movies,
        Category::Music,
        Category::Books,
        Category::Places,
        Category::Food,
        Category::Fashion,
        Category::Games,
        Category::Art,
        Category::Mood,
    ];

    /// Lowercase tag used on the wire and in templated text
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movies => "movies",
            Category::Music => "music",
            Category::Books => "books",
            Category::Places => "places",
            Category::Food => "food",
            Category::Fashion => "fashion",
            Category::Games => "games",
            Category::Art => "art",
            Category::Mood => "mood",
        }
    }

    /// Capitalized form used in fallback record names
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Movies => "Movies",
            Category::Music => "Music",
            Category::Books => "Books",
            Category::Places => "Places",
            Category::Food => "Food",
            Category::Fashion => "Fashion",
            Category::Games => "Games",
            Category::Art => "Art",
            Category::Mood => "Mood",
        }
    }

    /// Emoji shown alongside the category in generation prompts
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Movies => "\u{1F3AC}",
            Category::Music => "\u{1F3A7}",
            Category::Books => "\u{1F4D6}",
            Category::Places => "\u{1F4CD}",
            Category::Food => "\u{1F371}",
            Category::Fashion => "\u{1F455}",
            Category::Games => "\u{1F3AE}",
            Category::Art => "\u{1F3A8}",
            Category::Mood => "\u{1F9D8}",
        }
    }

    /// Entity-type token the insights provider expects for this category.
    ///
    /// Artists are represented as persons upstream; moods map to music.
    pub fn entity_type(&self) -> &'static str {
        match self {
            Category::Movies => "movie",
            Category::Music => "music",
            Category::Books => "book",
            Category::Places => "place",
            Category::Food => "restaurant",
            Category::Fashion => "fashion",
            Category::Games => "game",
            Category::Art => "person",
            Category::Mood => "music",
        }
    }

    /// Inverse of [`entity_type`](Self::entity_type). The music token maps
    /// back to the music category, so a mood request round-trips as music.
    pub fn from_entity_type(token: &str) -> Option<Category> {
        match token {
            "movie" => Some(Category::Movies),
            "music" => Some(Category::Music),
            "book" => Some(Category::Books),
            "place" => Some(Category::Places),
            "restaurant" => Some(Category::Food),
            "fashion" => Some(Category::Fashion),
            "game" => Some(Category::Games),
            "person" => Some(Category::Art),
            _ => None,
        }
    }
}

/// Whether the user named a specific known entity or a genre/style tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Specific,
    Genre,
}

/// Narrative detail attached to every recommendation.
///
/// The reason/tips/summary fields are always non-empty; missing upstream
/// values are replaced with fixed human-readable defaults at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDetails {
    pub reason: String,
    pub tips: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Canonical recommendation entity returned to the client.
///
/// Constructed fresh per request from a validated provider record or a
/// generated fallback record; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Unique within a single response, not globally
    pub id: String,
    pub name: String,
    /// App-level category tag (kept as text: provider records may carry
    /// tokens outside the fixed set)
    pub category: String,
    /// Always populated; a placeholder URL when no real media exists
    pub image: String,
    /// In [0, 10]; defaulted upstream when missing
    pub rating: f64,
    pub description: String,
    pub details: RecommendationDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_round_trip() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
            let back: Category = serde_json::from_str(&json).unwrap();
            assert_eq!(back, category);
        }
    }

    #[test]
    fn test_category_rejects_unknown_tag() {
        let result: Result<Category, _> = serde_json::from_str("\"podcasts\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_entity_type_mapping() {
        assert_eq!(Category::Movies.entity_type(), "movie");
        assert_eq!(Category::Food.entity_type(), "restaurant");
        assert_eq!(Category::Art.entity_type(), "person");
        assert_eq!(Category::Mood.entity_type(), "music");
    }

    #[test]
    fn test_inverse_entity_type_mapping() {
        assert_eq!(Category::from_entity_type("movie"), Some(Category::Movies));
        assert_eq!(Category::from_entity_type("restaurant"), Some(Category::Food));
        assert_eq!(Category::from_entity_type("person"), Some(Category::Art));
        // music token resolves to the music category, not mood
        assert_eq!(Category::from_entity_type("music"), Some(Category::Music));
        assert_eq!(Category::from_entity_type("podcast"), None);
    }

    #[test]
    fn test_mode_defaults_to_specific() {
        assert_eq!(Mode::default(), Mode::Specific);
        let parsed: Mode = serde_json::from_str("\"genre\"").unwrap();
        assert_eq!(parsed, Mode::Genre);
    }

    #[test]
    fn test_details_skip_absent_media_fields() {
        let details = RecommendationDetails {
            reason: "r".to_string(),
            tips: "t".to_string(),
            summary: "s".to_string(),
            language: None,
            trailer: None,
            preview: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("language").is_none());
        assert!(json.get("trailer").is_none());
        assert!(json.get("preview").is_none());
    }
}
