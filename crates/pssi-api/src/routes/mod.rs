use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{cors, error::ApiError, handlers, state::ApiState};

pub fn create_router(state: ApiState) -> Router {
    let api = Router::new()
        // AI gateway
        .route("/ai/health", get(handlers::ai::ai_health))
        .route("/ai/providers", get(handlers::ai::list_providers))
        .route("/ai/chat", post(handlers::ai::chat))
        .route("/ai/test", post(handlers::ai::test_prompt))
        .route("/ai/council", post(handlers::ai::council))

        // Capabilities
        .route("/capabilities", get(handlers::capability::list_capabilities))
        .route("/capabilities/:name", post(handlers::capability::run_capability))

        // Media
        .route("/media/image", post(handlers::media::generate_image))
        .route("/media/voice", post(handlers::media::generate_voice))

        // Task endpoints
        .route("/tasks", get(handlers::task::list_tasks))
        .route("/tasks/automate", post(handlers::task::automate_task))
        .route("/tasks/:task_id", get(handlers::task::get_task))

        // Host
        .route("/system/optimize", post(handlers::system::optimize))
        .route("/stats", get(handlers::stats::get_stats))
        .route("/stats/summary", get(handlers::stats::get_summary))

        // Source control
        .route("/repo/heal", post(handlers::repo::heal))
        .route("/repo/scan", post(handlers::repo::scan))

        // Deploy
        .route("/deploy/hook", post(handlers::deploy::hook))
        .route("/deploy/:platform", post(handlers::deploy::trigger));

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api)
        .fallback(|| async { ApiError::not_found("Not found") })

        // Add state
        .with_state(state);

    cors::apply(router).layer(TraceLayer::new_for_http())
}
