use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::youtube::{KeyStatusResponse, ResetKeysRequest, YouTubeStatusResponse},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/youtube/status",
    responses(
        (status = 200, description = "Key pool health", body = YouTubeStatusResponse)
    ),
    tag = "youtube"
)]
pub async fn youtube_status(State(state): State<AppState>) -> impl IntoResponse {
    let key_statuses = state
        .youtube_keys
        .key_statuses()
        .iter()
        .map(KeyStatusResponse::from_view)
        .collect();

    (
        StatusCode::OK,
        Json(YouTubeStatusResponse {
            key_statuses,
            has_active_keys: state.youtube_keys.has_active_keys(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/youtube/reset",
    request_body = ResetKeysRequest,
    responses(
        (status = 200, description = "Key state reset", body = YouTubeStatusResponse)
    ),
    tag = "youtube"
)]
pub async fn reset_youtube_keys(
    State(state): State<AppState>,
    Json(request): Json<ResetKeysRequest>,
) -> impl IntoResponse {
    match request.index {
        Some(index) => {
            tracing::info!("Resetting YouTube API key {}", index);
            state.youtube_keys.reset_key(index);
        }
        None => {
            tracing::info!("Resetting all YouTube API keys");
            state.youtube_keys.reset_all();
        }
    }

    let key_statuses = state
        .youtube_keys
        .key_statuses()
        .iter()
        .map(KeyStatusResponse::from_view)
        .collect();

    (
        StatusCode::OK,
        Json(YouTubeStatusResponse {
            key_statuses,
            has_active_keys: state.youtube_keys.has_active_keys(),
        }),
    )
        .into_response()
}
