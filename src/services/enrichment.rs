use crate::models::{Category, Recommendation};

/// Placeholder media attached to a recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEnrichment {
    pub image: String,
    pub trailer: Option<String>,
    pub preview: Option<String>,
}

/// Selects placeholder media for a category. Deterministic, no network.
///
/// Square art for music and food, wide for places, portrait otherwise.
/// Trailers exist only for movies, previews only for music.
pub fn enrich(category: Category) -> MediaEnrichment {
    let (width, height) = match category {
        Category::Music | Category::Food => (300, 300),
        Category::Places => (400, 300),
        _ => (200, 300),
    };

    MediaEnrichment {
        image: format!("/placeholder.svg?height={}&width={}", height, width),
        trailer: (category == Category::Movies).then(|| "/placeholder.svg".to_string()),
        preview: (category == Category::Music).then(|| "/placeholder.svg".to_string()),
    }
}

/// Ensures a candidate carries enriched media.
///
/// The image is replaced only when the provider left it empty or supplied
/// a placeholder; real media URLs pass through untouched. Missing trailer
/// and preview slots are filled for the categories that have them.
pub fn apply(recommendation: &mut Recommendation, category: Category) {
    let media = enrich(category);

    if recommendation.image.is_empty() || recommendation.image.starts_with("/placeholder.svg") {
        recommendation.image = media.image;
    }
    if recommendation.details.trailer.is_none() {
        recommendation.details.trailer = media.trailer;
    }
    if recommendation.details.preview.is_none() {
        recommendation.details.preview = media.preview;
    }
}
