use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use coursegen::config::AppConfig;
use coursegen::handlers::{course, youtube};
use coursegen::services::database::Database;
use coursegen::services::generation::GenerationService;
use coursegen::services::llm::GeminiClient;
use coursegen::services::store::MongoCourseStore;
use coursegen::services::synthesis::SynthesisService;
use coursegen::services::transcript::TranscriptService;
use coursegen::services::youtube::{ApiKeyManager, YouTubeClient};
use coursegen::{utils, ApiDoc, AppState};

/// Graceful shutdown signal handler
///
/// Handles shutdown signals gracefully, allowing in-flight requests to complete
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    utils::logging::init_logging()?;

    let config = Arc::new(AppConfig::load()?);

    let database = Database::new(&config.database.url, &config.database.name).await?;
    let store = Arc::new(MongoCourseStore::new(database));

    // The key pool is built once here and injected everywhere it is needed
    let youtube_keys = Arc::new(ApiKeyManager::from_env());
    let youtube_client = Arc::new(YouTubeClient::new(&config.youtube, youtube_keys.clone())?);
    let transcripts = Arc::new(TranscriptService::new(&config.transcript)?);

    let llm = Arc::new(GeminiClient::new(&config.gemini)?);
    let synthesis = Arc::new(SynthesisService::new(llm));

    let generation = Arc::new(GenerationService::new(
        store.clone(),
        youtube_client,
        transcripts,
        synthesis.clone(),
    ));

    let state = AppState {
        store,
        generation,
        synthesis,
        youtube_keys,
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = shutdown_signal();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // Course creation and generation API
    let course_routes = Router::new()
        .route("/api/courses", post(course::create_course))
        .route("/api/courses", get(course::list_courses))
        .route("/api/courses/:id", get(course::get_course))
        .route("/api/courses/:id/generate", post(course::generate_course))
        .route("/api/courses/:id/publish", post(course::publish_course))
        .route(
            "/api/courses/:id/units/:unit_id/chapters/:chapter_id/regenerate",
            post(course::regenerate_chapter),
        );

    // Key pool health for operational visibility
    let youtube_routes = Router::new()
        .route("/api/youtube/status", get(youtube::youtube_status))
        .route("/api/youtube/reset", post(youtube::reset_youtube_keys));

    // API Documentation - Swagger UI
    let api_docs_routes = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    Router::new()
        .merge(course_routes)
        .merge(youtube_routes)
        .merge(api_docs_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
