use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

/// Photos travel inline as data URIs, so allow bodies well above axum's 2 MB default.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/profile", get(handlers::get_profile))
        .route("/api/draft", get(handlers::get_draft).put(handlers::update_draft))
        .route(
            "/api/draft/photo",
            put(handlers::upload_photo).delete(handlers::remove_photo),
        )
        .route("/api/reports", get(handlers::list_reports).post(handlers::submit))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/insight", post(handlers::insight))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
