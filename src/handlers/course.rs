use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::error;

use crate::{
    dto::course::{
        ChapterOutcomeResponse, CourseListResponse, CourseResponse, CreateCourseRequest,
        GenerationReportResponse,
    },
    services::store::StoreError,
    AppState,
};

fn store_error_response(context: &str, e: StoreError) -> axum::response::Response {
    match e {
        StoreError::NotFound(_) | StoreError::InvalidId(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Course not found"})),
        )
            .into_response(),
        e => {
            error!("{} failed: {}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("{} failed: {}", context, e)})),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course outline drafted", body = CourseResponse),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "course"
)]
pub async fn create_course(
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> impl IntoResponse {
    if request.topic.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing required field: topic"})),
        )
            .into_response();
    }

    let course = match state
        .synthesis
        .draft_outline(&request.topic, &request.units)
        .await
    {
        Ok(course) => course,
        Err(e) => {
            error!("Outline drafting failed: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Outline drafting failed: {}", e)})),
            )
                .into_response();
        }
    };

    match state.store.insert_course(&course).await {
        Ok(id) => {
            let mut response = CourseResponse::from_model(&course);
            response.id = id;
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => store_error_response("Create course", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found", body = CourseResponse),
        (status = 404, description = "Course not found")
    ),
    tag = "course"
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_course(&id).await {
        Ok(course) => (StatusCode::OK, Json(CourseResponse::from_model(&course))).into_response(),
        Err(e) => store_error_response("Get course", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Public courses listed", body = CourseListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "course"
)]
pub async fn list_courses(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_public_courses().await {
        Ok(courses) => {
            let courses: Vec<CourseResponse> =
                courses.iter().map(CourseResponse::from_model).collect();
            let total_count = courses.len();
            (
                StatusCode::OK,
                Json(CourseListResponse {
                    courses,
                    total_count,
                }),
            )
                .into_response()
        }
        Err(e) => store_error_response("List courses", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/generate",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Generation settled for every chapter", body = GenerationReportResponse),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "course"
)]
pub async fn generate_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.generation.generate_course(&id).await {
        Ok(report) => (
            StatusCode::OK,
            Json(GenerationReportResponse::from_report(&report)),
        )
            .into_response(),
        Err(e) => store_error_response("Generate course", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/units/{unit_id}/chapters/{chapter_id}/regenerate",
    params(
        ("id" = String, Path, description = "Course id"),
        ("unit_id" = String, Path, description = "Unit id"),
        ("chapter_id" = String, Path, description = "Chapter id")
    ),
    responses(
        (status = 200, description = "Chapter pipeline settled", body = ChapterOutcomeResponse)
    ),
    tag = "course"
)]
pub async fn regenerate_chapter(
    State(state): State<AppState>,
    Path((id, unit_id, chapter_id)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let outcome = state
        .generation
        .regenerate_chapter(&id, &unit_id, &chapter_id)
        .await;
    (
        StatusCode::OK,
        Json(ChapterOutcomeResponse::from_outcome(&outcome)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/publish",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course published"),
        (status = 404, description = "Course not found")
    ),
    tag = "course"
)]
pub async fn publish_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.set_public(&id, true).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true})),
        )
            .into_response(),
        Err(e) => store_error_response("Publish course", e),
    }
}
