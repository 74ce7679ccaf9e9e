use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Application configuration structure
///
/// Layered: defaults -> config.yaml -> APP_-prefixed environment variables.
/// Secrets (Gemini key, YouTube keys) come from plain environment variables
/// so they never have to live in the config file.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub youtube: YouTubeConfig,
    pub transcript: TranscriptConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub debug: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub name: String,
}

/// YouTube Data API configuration. The API keys themselves are read from the
/// numbered YOUTUBE_API_KEY env vars, not from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    pub base_url: String,
    pub max_results: u32,
}

/// Caption retrieval service (keyless, independent of the YouTube key pool)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "coursegen".to_string(),
                version: "0.1.0".to_string(),
                debug: true,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "mongodb://localhost:27017".to_string(),
                name: "coursegen".to_string(),
            },
            youtube: YouTubeConfig {
                base_url: "https://www.googleapis.com/youtube/v3".to_string(),
                max_results: 5,
            },
            transcript: TranscriptConfig {
                base_url: "https://www.youtube.com/api/timedtext".to_string(),
            },
            gemini: GeminiConfig {
                api_key: None,
                model: "gemini-2.0-flash-001".to_string(),
                max_output_tokens: 2048,
                temperature: 0.9,
                timeout_seconds: 60,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        info!("Loading application configuration...");

        let mut config: AppConfig = Figment::new()
            // Start with default values
            .merge(Serialized::defaults(Self::default()))
            // Override with config file if present
            .merge(Yaml::file("config.yaml"))
            // Override with environment variables
            .merge(Env::prefixed("APP_").split("_"))
            .extract()?;

        if config.gemini.api_key.is_none() {
            config.gemini.api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        info!("Configuration loaded successfully");
        info!("name: {:?}", config.app.name);
        info!("Database: {}", config.database.name);
        info!("YouTube API: {}", config.youtube.base_url);
        info!("Gemini model: {}", config.gemini.model);

        Ok(config)
    }
}
