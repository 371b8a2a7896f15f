use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{JobDescriptionSource, RenderedPdf};
use crate::pipeline::{self, Outcome, Submission};
use crate::render::render_signature;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub submission_id: Uuid,
    pub resume_text: String,
    pub job_description: String,
    pub job_description_source: JobDescriptionSource,
    pub cover_letter: String,
    pub file_name: &'static str,
    pub pdf_base64: String,
    pub warnings: Vec<String>,
}

impl From<Outcome> for CoverLetterResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            submission_id: outcome.submission_id,
            resume_text: outcome.resume.text,
            job_description: outcome.job_description.text,
            job_description_source: outcome.job_description.source,
            cover_letter: outcome.cover_letter,
            file_name: RenderedPdf::FILE_NAME,
            pdf_base64: STANDARD.encode(&outcome.pdf.bytes),
            warnings: outcome.warnings,
        }
    }
}

/// POST /api/v1/cover-letters
pub async fn handle_create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let submission = Submission::from_multipart(multipart).await?;
    let outcome = pipeline::run(&state, submission).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/cover-letters/pdf
pub async fn handle_create_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let submission = Submission::from_multipart(multipart).await?;
    let outcome = pipeline::run(&state, submission).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", RenderedPdf::FILE_NAME),
            ),
        ],
        outcome.pdf.bytes,
    ))
}

#[derive(Debug, Deserialize)]
pub struct SignatureQuery {
    pub name: Option<String>,
}

/// GET /api/v1/signature?name=
pub async fn handle_signature(
    State(state): State<AppState>,
    Query(query): Query<SignatureQuery>,
) -> Result<impl IntoResponse, AppError> {
    let name = query
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("name is required".into()))?;

    let font = state.signature_font.clone();
    let png = tokio::task::spawn_blocking(move || render_signature(&name, &font))
        .await
        .map_err(|e| anyhow::anyhow!("signature task failed: {e}"))?
        .map_err(|e| AppError::Render(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
