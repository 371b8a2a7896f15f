use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Html,
};

use crate::errors::AppError;
use crate::pipeline::{self, Failure, Submission};
use crate::routes::views::{render_page, PageBody, PageSettings};
use crate::state::AppState;

fn page_settings(state: &AppState) -> PageSettings {
    PageSettings {
        default_creativity: state.config.default_creativity,
        api_key_missing: !state.llm.has_api_key(),
        model: state.llm.model().to_string(),
    }
}

/// GET /
pub async fn show_form(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&page_settings(&state), PageBody::Empty))
}

/// POST /
/// Runs the pipeline and renders the result under a fresh form. On failure the
/// error is shown with whatever the run produced before it.
pub async fn submit_form(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let settings = page_settings(&state);

    let result = match Submission::from_multipart(multipart).await {
        Ok(submission) => pipeline::run_keeping_partial(&state, submission).await,
        Err(e) => Err(AppError::from(e).into()),
    };

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Html(render_page(&settings, PageBody::Result(&outcome))),
        ),
        Err(Failure { error, partial }) => {
            let (status, _) = error.status_and_code();
            let message = error.user_message();
            let body = match &partial {
                Some(partial) => PageBody::Partial {
                    error: &message,
                    partial,
                },
                None => PageBody::Error(&message),
            };
            (status, Html(render_page(&settings, body)))
        }
    }
}
