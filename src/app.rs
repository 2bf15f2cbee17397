use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/survey-dashboard", get(handlers::survey_dashboard))
        .route("/top-insights", get(handlers::top_insights))
        .route("/smart-analytics", get(handlers::smart_analytics))
        .route(
            "/smart-analytics/conclusion",
            post(handlers::generate_conclusion),
        )
        .route("/my-insights", get(handlers::my_insights))
        .route("/bookmarks/toggle", post(handlers::toggle_bookmark))
        .route("/settings", get(handlers::settings))
        .route("/chat", get(handlers::chat_page).post(handlers::chat_send))
        .route("/chat/clear", post(handlers::chat_clear))
        .with_state(state)
}
