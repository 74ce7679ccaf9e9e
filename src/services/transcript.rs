use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::TranscriptConfig;

/// Outcome of a caption lookup. Missing captions are a common, expected
/// outcome (many videos have none), so this is a value, not an error.
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    pub text: String,
    pub ok: bool,
}

impl TranscriptResult {
    fn unavailable() -> Self {
        Self {
            text: String::new(),
            ok: false,
        }
    }
}

/// Caption retrieval seam for the chapter pipeline
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> TranscriptResult;
}

// Timed-text payload: events carry segments, segments carry text runs.
#[derive(Debug, Deserialize)]
struct TimedTextResponse {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

/// Client for the caption service. Independent of the YouTube API key pool:
/// the endpoint is keyless, so there is nothing to rotate.
///
/// Results are memoized per video id for the lifetime of the process;
/// sibling chapters that resolve to the same video fetch its captions once.
pub struct TranscriptService {
    client: reqwest::Client,
    base_url: String,
    cache: RwLock<HashMap<String, TranscriptResult>>,
}

impl TranscriptService {
    pub fn new(config: &TranscriptConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub async fn fetch_transcript(&self, video_id: &str) -> TranscriptResult {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(video_id) {
                debug!("Transcript cache hit for {}", video_id);
                return cached.clone();
            }
        }

        let result = self.fetch_remote(video_id).await;

        let mut cache = self.cache.write().await;
        cache.insert(video_id.to_string(), result.clone());
        result
    }

    async fn fetch_remote(&self, video_id: &str) -> TranscriptResult {
        let url = match reqwest::Url::parse_with_params(
            &self.base_url,
            &[("v", video_id), ("lang", "en"), ("fmt", "json3")],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("Invalid transcript service URL: {}", e);
                return TranscriptResult::unavailable();
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Transcript fetch failed for {}: {}", video_id, e);
                return TranscriptResult::unavailable();
            }
        };

        if !response.status().is_success() {
            warn!(
                "Transcript service returned {} for {}",
                response.status(),
                video_id
            );
            return TranscriptResult::unavailable();
        }

        let payload: TimedTextResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!("Malformed transcript payload for {}: {}", video_id, e);
                return TranscriptResult::unavailable();
            }
        };

        let text = flatten_events(payload);
        if text.is_empty() {
            debug!("No English captions for {}", video_id);
            return TranscriptResult::unavailable();
        }

        debug!("Fetched transcript for {} ({} chars)", video_id, text.len());
        TranscriptResult { text, ok: true }
    }
}

#[async_trait]
impl TranscriptSource for TranscriptService {
    async fn fetch(&self, video_id: &str) -> TranscriptResult {
        self.fetch_transcript(video_id).await
    }
}

/// Concatenate caption fragments with spaces, collapsing embedded newlines
fn flatten_events(payload: TimedTextResponse) -> String {
    payload
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .map(|seg| seg.utf8.replace('\n', " "))
        .map(|fragment| fragment.trim().to_string())
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_joins_fragments_and_collapses_newlines() {
        let payload = TimedTextResponse {
            events: vec![
                TimedTextEvent {
                    segs: vec![
                        TimedTextSegment {
                            utf8: "hello\nworld".to_string(),
                        },
                        TimedTextSegment {
                            utf8: "\n".to_string(),
                        },
                    ],
                },
                TimedTextEvent {
                    segs: vec![TimedTextSegment {
                        utf8: "again".to_string(),
                    }],
                },
            ],
        };

        assert_eq!(flatten_events(payload), "hello world again");
    }

    #[test]
    fn flatten_empty_payload_is_empty() {
        let payload = TimedTextResponse { events: vec![] };
        assert_eq!(flatten_events(payload), "");
    }
}
