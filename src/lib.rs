pub mod config;
pub mod dto;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;
use utoipa::OpenApi;

pub use config::AppConfig;
use services::generation::GenerationService;
use services::store::CourseStore;
use services::synthesis::SynthesisService;
use services::youtube::ApiKeyManager;

#[derive(Clone)]
pub struct AppState {
    /// Course document store
    pub store: Arc<dyn CourseStore>,
    /// Chapter pipeline orchestrator
    pub generation: Arc<GenerationService>,
    /// Outline/summary/quiz synthesis
    pub synthesis: Arc<SynthesisService>,
    /// YouTube API key pool, exposed for the health endpoints
    pub youtube_keys: Arc<ApiKeyManager>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::course::create_course,
        handlers::course::get_course,
        handlers::course::list_courses,
        handlers::course::generate_course,
        handlers::course::regenerate_chapter,
        handlers::course::publish_course,
        handlers::youtube::youtube_status,
        handlers::youtube::reset_youtube_keys,
    ),
    components(schemas(
        dto::course::CreateCourseRequest,
        dto::course::CourseResponse,
        dto::course::UnitResponse,
        dto::course::ChapterResponse,
        dto::course::QuizResponse,
        dto::course::QuizQuestionResponse,
        dto::course::CourseListResponse,
        dto::course::GenerationReportResponse,
        dto::course::ChapterOutcomeResponse,
        dto::youtube::KeyStatusResponse,
        dto::youtube::YouTubeStatusResponse,
        dto::youtube::ResetKeysRequest,
    )),
    tags(
        (name = "course", description = "Course creation and generation API"),
        (name = "youtube", description = "YouTube API key pool health")
    )
)]
pub struct ApiDoc;
