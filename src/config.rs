use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the local text-generation endpoint
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    /// Model name passed to the generation endpoint
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Upper bound on a single generation request, in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Taste-insights API key; recommendation paths degrade to curated
    /// data without it, the insights query path requires it
    #[serde(default)]
    pub insights_api_key: Option<String>,

    /// Taste-insights API base URL
    #[serde(default = "default_insights_api_url")]
    pub insights_api_url: String,

    /// Per-attempt bound on an insights request, in seconds
    #[serde(default = "default_insights_timeout_secs")]
    pub insights_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma:2b".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    300
}

fn default_insights_api_url() -> String {
    "https://hackathon.api.qloo.com".to_string()
}

fn default_insights_timeout_secs() -> u64 {
    15
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
