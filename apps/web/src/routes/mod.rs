pub mod form;
pub mod health;
pub mod letters;
pub mod views;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Form surface
        .route("/", get(form::show_form).post(form::submit_form))
        // JSON / PDF API
        .route("/api/v1/cover-letters", post(letters::handle_create))
        .route("/api/v1/cover-letters/pdf", post(letters::handle_create_pdf))
        .route("/api/v1/signature", get(letters::handle_signature))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
