use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::youtube::KeyStatusView;

/// Key pool observability DTOs. Key values themselves never cross this
/// boundary; only labels and health state do.

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyStatusResponse {
    pub index: usize,
    pub label: String,
    pub status: String,
    pub last_used: Option<String>,
    pub error_count: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct YouTubeStatusResponse {
    pub key_statuses: Vec<KeyStatusResponse>,
    pub has_active_keys: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetKeysRequest {
    /// Reset one key by index, or every key when absent
    pub index: Option<usize>,
}

impl KeyStatusResponse {
    pub fn from_view(view: &KeyStatusView) -> Self {
        Self {
            index: view.index,
            label: view.label.clone(),
            status: match view.status {
                crate::services::youtube::ApiKeyStatus::Active => "active",
                crate::services::youtube::ApiKeyStatus::QuotaExceeded => "quota_exceeded",
                crate::services::youtube::ApiKeyStatus::Error => "error",
            }
            .to_string(),
            last_used: view.last_used.map(|dt| dt.to_rfc3339()),
            error_count: view.error_count,
            last_error: view.last_error.clone(),
        }
    }
}
