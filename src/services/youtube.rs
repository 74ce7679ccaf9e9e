use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::YouTubeConfig;

/// Health state of a single API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    /// Key is working normally
    Active,
    /// Key has hit its quota limit
    QuotaExceeded,
    /// Key has been demoted after repeated errors
    Error,
}

/// Consecutive error count at which a key is demoted to `Error`
const KEY_ERROR_THRESHOLD: u32 = 3;

#[derive(Debug, Clone)]
struct ApiKeyData {
    key: String,
    label: String,
    status: ApiKeyStatus,
    last_used: Option<DateTime<Utc>>,
    error_count: u32,
    last_error: Option<String>,
}

/// Redacted key state for observability. Never carries the raw key value.
#[derive(Debug, Clone, Serialize)]
pub struct KeyStatusView {
    pub index: usize,
    pub label: String,
    pub status: ApiKeyStatus,
    pub last_used: Option<DateTime<Utc>>,
    pub error_count: u32,
    pub last_error: Option<String>,
}

struct PoolState {
    keys: Vec<ApiKeyData>,
    current: usize,
}

/// Rotating pool of YouTube Data API keys.
///
/// Quota limits are per key and independent, so a key that reports quota
/// exhaustion is parked and the pool moves on instead of burning retries on
/// it. Quota exhaustion and repeated errors are tracked separately: the first
/// is externally imposed, the second usually means the key itself is bad.
///
/// Built once at startup and injected wherever YouTube calls are made; state
/// lives for the process lifetime and can be reset through the admin surface.
pub struct ApiKeyManager {
    state: Mutex<PoolState>,
}

impl ApiKeyManager {
    pub fn new(keys: Vec<(String, String)>) -> Self {
        if keys.is_empty() {
            error!("No YouTube API keys configured");
        }

        let keys = keys
            .into_iter()
            .map(|(label, key)| ApiKeyData {
                key,
                label,
                status: ApiKeyStatus::Active,
                last_used: None,
                error_count: 0,
                last_error: None,
            })
            .collect();

        Self {
            state: Mutex::new(PoolState { keys, current: 0 }),
        }
    }

    /// Load keys from the numbered YOUTUBE_API_KEY environment variables
    /// (YOUTUBE_API_KEY, YOUTUBE_API_KEY_2 ... YOUTUBE_API_KEY_10).
    pub fn from_env() -> Self {
        let mut keys = Vec::new();
        for n in 1..=10u32 {
            let name = if n == 1 {
                "YOUTUBE_API_KEY".to_string()
            } else {
                format!("YOUTUBE_API_KEY_{}", n)
            };
            if let Ok(value) = std::env::var(&name) {
                if !value.trim().is_empty() {
                    keys.push((name, value));
                }
            }
        }
        Self::new(keys)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState> {
        // A poisoned pool lock means a panic mid-mutation; the state is plain
        // data, so continuing with it is safe.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current key if it is active, otherwise adopts any active
    /// key. None when the whole pool is exhausted.
    pub fn current_key(&self) -> Option<String> {
        let mut state = self.lock();
        if state.keys.is_empty() {
            return None;
        }

        if state.keys[state.current].status == ApiKeyStatus::Active {
            let idx = state.current;
            state.keys[idx].last_used = Some(Utc::now());
            debug!("Using API key {}", state.keys[idx].label);
            return Some(state.keys[idx].key.clone());
        }

        if let Some(idx) = state
            .keys
            .iter()
            .position(|k| k.status == ApiKeyStatus::Active)
        {
            state.current = idx;
            state.keys[idx].last_used = Some(Utc::now());
            debug!("Switched to API key {}", state.keys[idx].label);
            return Some(state.keys[idx].key.clone());
        }

        debug!("No active API keys available");
        None
    }

    /// Advances past the current key (wrapping) to the next active one.
    pub fn rotate_to_next_key(&self) -> Option<String> {
        let mut state = self.lock();
        if state.keys.is_empty() {
            return None;
        }

        let len = state.keys.len();
        for _ in 0..len {
            state.current = (state.current + 1) % len;
            let idx = state.current;
            if state.keys[idx].status == ApiKeyStatus::Active {
                state.keys[idx].last_used = Some(Utc::now());
                debug!("Rotated to API key {}", state.keys[idx].label);
                return Some(state.keys[idx].key.clone());
            }
        }

        debug!("No active API keys found during rotation");
        None
    }

    /// Mark the current key as having exhausted its quota
    pub fn mark_quota_exceeded(&self, detail: Option<&str>) {
        let mut state = self.lock();
        if state.keys.is_empty() {
            return;
        }
        let idx = state.current;
        state.keys[idx].status = ApiKeyStatus::QuotaExceeded;
        state.keys[idx].last_error = detail.map(str::to_string);
        warn!("Quota exceeded for API key {}", state.keys[idx].label);
    }

    /// Record an error against the current key; repeated errors demote it
    pub fn mark_error(&self, detail: Option<&str>) {
        let mut state = self.lock();
        if state.keys.is_empty() {
            return;
        }
        let idx = state.current;
        state.keys[idx].error_count += 1;
        state.keys[idx].last_error = detail.map(str::to_string);

        if state.keys[idx].error_count >= KEY_ERROR_THRESHOLD {
            state.keys[idx].status = ApiKeyStatus::Error;
            error!(
                "API key {} marked as error after {} errors",
                state.keys[idx].label, state.keys[idx].error_count
            );
        }
    }

    /// Restore one key to active. Operational recovery, never automatic.
    pub fn reset_key(&self, index: usize) {
        let mut state = self.lock();
        if let Some(key) = state.keys.get_mut(index) {
            key.status = ApiKeyStatus::Active;
            key.error_count = 0;
            key.last_error = None;
        }
    }

    /// Restore every key to active
    pub fn reset_all(&self) {
        let mut state = self.lock();
        for key in &mut state.keys {
            key.status = ApiKeyStatus::Active;
            key.error_count = 0;
            key.last_error = None;
        }
    }

    /// Redacted view of the pool for the status endpoint
    pub fn key_statuses(&self) -> Vec<KeyStatusView> {
        let state = self.lock();
        state
            .keys
            .iter()
            .enumerate()
            .map(|(index, key)| KeyStatusView {
                index,
                label: key.label.clone(),
                status: key.status,
                last_used: key.last_used,
                error_count: key.error_count,
                last_error: key.last_error.clone(),
            })
            .collect()
    }

    pub fn has_active_keys(&self) -> bool {
        let state = self.lock();
        state.keys.iter().any(|k| k.status == ApiKeyStatus::Active)
    }
}

/// Classified outcome of a failed YouTube API call. Determines whether the
/// failure costs the key (quota/auth), the request (4xx), or nothing but
/// time (5xx/network).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YouTubeApiErrorKind {
    QuotaExceeded,
    InvalidRequest,
    AuthError,
    NotFound,
    ServerError,
    NetworkError,
    Unknown,
}

impl YouTubeApiErrorKind {
    /// Classify an error response from the YouTube Data API.
    ///
    /// 403 bodies are inspected for machine-readable reason codes; the API
    /// reports both quota exhaustion and auth failures as 403, and the two
    /// must be handled differently.
    pub fn classify(status: u16, body: &Value) -> Self {
        if status == 403 {
            let reasons: Vec<&str> = body["error"]["errors"]
                .as_array()
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e["reason"].as_str())
                        .collect()
                })
                .unwrap_or_default();
            let message = body["error"]["message"].as_str().unwrap_or_default();

            let quota_reasons = ["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];
            if reasons.iter().any(|r| quota_reasons.contains(r))
                || message.contains("quota")
                || message.contains("limit exceeded")
            {
                return Self::QuotaExceeded;
            }

            let auth_reasons = ["authError", "invalid_grant", "forbidden"];
            if reasons.iter().any(|r| auth_reasons.contains(r))
                || message.contains("auth")
                || message.contains("permission")
                || message.contains("access")
            {
                return Self::AuthError;
            }

            // 403 without a recognizable reason is treated as auth
            return Self::AuthError;
        }

        match status {
            400 => Self::InvalidRequest,
            404 => Self::NotFound,
            s if s >= 500 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Bounded exponential backoff policy for transport-level retries
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_factor: 2,
            max_delay_ms: 10000,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (zero-based), capped at the maximum
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.saturating_pow(retry);
        let delay = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

/// Free-text to video id resolution, the seam the chapter pipeline depends on
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// YouTube Data API client with key rotation and bounded retry.
///
/// Transport retry (backoff on transient and server errors) and credential
/// rotation (switching keys on quota/auth errors) are kept separate: a 500
/// does not cost a key, and a quota error does not consume the backoff budget
/// of a healthy key.
pub struct YouTubeClient {
    client: reqwest::Client,
    keys: Arc<ApiKeyManager>,
    base_url: String,
    max_results: u32,
}

impl YouTubeClient {
    pub fn new(config: &YouTubeConfig, keys: Arc<ApiKeyManager>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            keys,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    fn acquire_key(&self) -> Option<String> {
        self.keys
            .current_key()
            .or_else(|| self.keys.rotate_to_next_key())
    }

    /// React to a classified API error: update pool state and report whether
    /// a retry might succeed.
    fn handle_api_error(&self, kind: YouTubeApiErrorKind, body: &Value) -> bool {
        let message = body["error"]["message"].as_str();

        match kind {
            YouTubeApiErrorKind::QuotaExceeded => {
                self.keys
                    .mark_quota_exceeded(message.or(Some("Quota exceeded")));
                self.keys.rotate_to_next_key().is_some()
            }
            YouTubeApiErrorKind::AuthError => {
                self.keys.mark_error(message.or(Some("Authentication error")));
                self.keys.rotate_to_next_key().is_some()
            }
            // Client-side defects; retrying the same request cannot help
            YouTubeApiErrorKind::InvalidRequest | YouTubeApiErrorKind::NotFound => false,
            YouTubeApiErrorKind::ServerError | YouTubeApiErrorKind::NetworkError => true,
            YouTubeApiErrorKind::Unknown => {
                self.keys.mark_error(message.or(Some("Unknown error")));
                self.keys.has_active_keys()
            }
        }
    }

    /// Issue a GET against the API with key injection, classification and
    /// bounded retry. Returns None once retries are exhausted, the error is
    /// not retryable, or no key is available at all.
    pub async fn get_json(&self, url: &str, retry_config: &RetryConfig) -> Option<Value> {
        let mut retries: u32 = 0;

        loop {
            let Some(api_key) = self.acquire_key() else {
                error!("No YouTube API keys available");
                return None;
            };

            let separator = if url.contains('?') { '&' } else { '?' };
            let api_url = format!("{}{}key={}", url, separator, api_key);

            let outcome = match self.client.get(&api_url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match response.json::<Value>().await {
                        Ok(body) if (200..300).contains(&status) => return Some(body),
                        Ok(body) => {
                            let kind = YouTubeApiErrorKind::classify(status, &body);
                            error!("YouTube API error: {} ({:?})", status, kind);
                            if !self.handle_api_error(kind, &body) {
                                error!("YouTube API error cannot be retried: {}", status);
                                return None;
                            }
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(e),
            };

            if let Err(e) = outcome {
                warn!("YouTube API request failed: {}", e);
            }

            if retries >= retry_config.max_retries {
                error!("YouTube API max retries exceeded");
                return None;
            }

            tokio::time::sleep(retry_config.delay_for(retries)).await;
            retries += 1;
        }
    }

    /// Search for the best-matching educational video for a free-text query.
    ///
    /// The query is reduced to its significant words; among the top results
    /// the first candidate whose title+description covers at least half of
    /// those words wins, falling back to the first result.
    pub async fn search_video(&self, query: &str) -> Option<String> {
        let clean_query = normalize_query(query);
        if clean_query.is_empty() {
            warn!("Query reduced to nothing after normalization: {:?}", query);
            return None;
        }

        debug!("Searching YouTube for: {:?}", clean_query);

        let url = reqwest::Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[
                ("part", "snippet"),
                ("q", clean_query.as_str()),
                ("type", "video"),
                ("maxResults", &self.max_results.to_string()),
                ("videoDuration", "any"),
                ("videoEmbeddable", "true"),
                ("relevanceLanguage", "en"),
            ],
        )
        .ok()?;

        let body = self
            .get_json(url.as_str(), &RetryConfig::default())
            .await?;

        let response: SearchResponse = match serde_json::from_value(body) {
            Ok(r) => r,
            Err(e) => {
                error!("Malformed YouTube search response: {}", e);
                return None;
            }
        };

        debug!("YouTube search results count: {}", response.items.len());
        if response.items.is_empty() {
            warn!("No videos found for query: {:?}", clean_query);
            return None;
        }

        let selected = select_best_match(&response.items, &clean_query)
            .or_else(|| response.items.first());
        let video_id = selected.and_then(|item| item.id.video_id.clone());

        if let (Some(item), Some(_)) = (selected, video_id.as_ref()) {
            debug!("Selected video: {}", item.snippet.title);
        }
        video_id
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str) -> Option<String> {
        self.search_video(query).await
    }
}

/// Strip punctuation and drop short words so the search query carries only
/// significant terms.
fn normalize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| word.len() > 2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First candidate whose title+description contains at least 50% of the
/// query's words, case-insensitive.
fn select_best_match<'a>(items: &'a [SearchItem], clean_query: &str) -> Option<&'a SearchItem> {
    let query_words: Vec<String> = clean_query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if query_words.is_empty() {
        return None;
    }
    let required = query_words.len().div_ceil(2);

    items.iter().find(|item| {
        let haystack = format!(
            "{} {}",
            item.snippet.title.to_lowercase(),
            item.snippet.description.to_lowercase()
        );
        let matching = query_words.iter().filter(|w| haystack.contains(*w)).count();
        matching >= required
    })
}
