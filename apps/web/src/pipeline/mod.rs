//! One cover letter run: validate → extract → job description → generate →
//! signature → compose. Every stage is awaited before the next one starts.

pub mod submission;

pub use submission::Submission;

use anyhow::anyhow;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{extract_text, fetch_job_description};
use crate::letter::{generate_cover_letter, GenerationRequest};
use crate::models::{Creativity, JobDescription, RenderedPdf, ResumeDocument, SignatureAsset};
use crate::render::{compose_cover_letter, render_signature};
use crate::state::AppState;

/// Everything produced by a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub submission_id: Uuid,
    pub resume: ResumeDocument,
    pub job_description: JobDescription,
    pub cover_letter: String,
    pub signature: Option<SignatureAsset>,
    pub pdf: RenderedPdf,
    /// Recoverable problems the user should see next to the result.
    pub warnings: Vec<String>,
}

/// What had been produced when a later stage failed.
#[derive(Debug, Clone)]
pub struct Partial {
    pub resume: ResumeDocument,
    pub job_description: JobDescription,
    /// Present when only composition failed.
    pub cover_letter: Option<String>,
    pub warnings: Vec<String>,
}

/// A failed run: the error plus whatever the earlier stages produced.
#[derive(Debug)]
pub struct Failure {
    pub error: AppError,
    pub partial: Option<Partial>,
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err).into()
    }
}

pub async fn run(state: &AppState, submission: Submission) -> Result<Outcome, AppError> {
    run_keeping_partial(state, submission)
        .await
        .map_err(|failure| failure.error)
}

/// Like [`run`], but a failure after the inputs were read still carries the
/// extracted texts and, if generated, the letter.
pub async fn run_keeping_partial(
    state: &AppState,
    submission: Submission,
) -> Result<Outcome, Failure> {
    let submission_id = Uuid::new_v4();
    run_stages(state, submission, submission_id)
        .instrument(info_span!("submission", id = %submission_id))
        .await
}

/// Pasted text always wins; the URL is then never fetched.
enum JobSource {
    Pasted {
        text: String,
        skipped_url: Option<String>,
    },
    Url(String),
}

async fn run_stages(
    state: &AppState,
    submission: Submission,
    submission_id: Uuid,
) -> Result<Outcome, Failure> {
    let Submission {
        resume,
        signature,
        signature_name,
        job_url,
        job_description,
        creativity,
    } = submission;

    // Validate before any work
    let resume_bytes =
        resume.ok_or_else(|| AppError::Validation("Please upload your resume PDF.".into()))?;
    let job_source = match (job_description, job_url) {
        (Some(text), skipped_url) => JobSource::Pasted { text, skipped_url },
        (None, Some(url)) => JobSource::Url(url),
        (None, None) => {
            return Err(AppError::Validation(
                "Please provide either a job URL or paste the job description.".into(),
            )
            .into())
        }
    };
    let creativity = Creativity::try_from(creativity.unwrap_or(state.config.default_creativity))?;

    let mut warnings = Vec::new();

    let pdf_bytes = resume_bytes.clone();
    let resume_text = tokio::task::spawn_blocking(move || extract_text(&pdf_bytes))
        .await
        .map_err(|e| anyhow!("resume extraction task failed: {e}"))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Error extracting text from PDF: {e}")))?;
    if resume_text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the resume PDF.".into(),
        )
        .into());
    }
    info!("Resume text extracted: {} chars", resume_text.chars().count());
    let resume = ResumeDocument {
        bytes: resume_bytes,
        text: resume_text,
    };

    let job_description = match job_source {
        JobSource::Pasted { text, skipped_url } => {
            if let Some(url) = skipped_url {
                warn!("Both URL and pasted description supplied; using pasted text");
                warnings.push(format!(
                    "Using the pasted job description; {url} was not fetched."
                ));
            }
            JobDescription::pasted(text)
        }
        JobSource::Url(url) => {
            let text = fetch_job_description(&state.http, &url)
                .await
                .map_err(|e| {
                    warn!("Job description fetch failed for {url}: {e}");
                    AppError::UnprocessableEntity(format!(
                        "Could not extract job description from URL ({e}). \
                         Please paste the job description manually."
                    ))
                })?;
            if text.is_empty() {
                return Err(AppError::UnprocessableEntity(
                    "The job posting page contained no text. \
                     Please paste the job description manually."
                        .into(),
                )
                .into());
            }
            info!("Job description fetched: {} chars", text.chars().count());
            JobDescription::fetched(url, text)
        }
    };

    let request = GenerationRequest::new(&resume.text, &job_description.text, creativity);
    let cover_letter = match generate_cover_letter(&state.llm, &request).await {
        Ok(letter) => letter,
        Err(e) => {
            return Err(Failure {
                error: e.into(),
                partial: Some(Partial {
                    resume,
                    job_description,
                    cover_letter: None,
                    warnings,
                }),
            })
        }
    };

    let signature = match (signature, signature_name) {
        (Some(bytes), _) => Some(SignatureAsset::Uploaded(bytes)),
        (None, Some(name)) => {
            let font = state.signature_font.clone();
            let render_name = name.clone();
            match tokio::task::spawn_blocking(move || render_signature(&render_name, &font))
                .await
                .map_err(|e| anyhow!("signature task failed: {e}"))?
            {
                Ok(png) => Some(SignatureAsset::Rendered { name, png }),
                Err(e) => {
                    warn!("Signature rendering failed: {e}");
                    warnings.push(format!("Could not render a signature for {name}: {e}"));
                    None
                }
            }
        }
        (None, None) => None,
    };

    let letter = cover_letter.clone();
    let signature_bytes = signature.as_ref().map(|s| s.bytes().to_vec());
    let composed = tokio::task::spawn_blocking(move || {
        compose_cover_letter(&letter, signature_bytes.as_deref())
    })
    .await
    .map_err(|e| anyhow!("PDF composition task failed: {e}"))?;
    let pdf = match composed {
        Ok(pdf) => pdf,
        Err(e) => {
            return Err(Failure {
                error: AppError::Render(e.to_string()),
                partial: Some(Partial {
                    resume,
                    job_description,
                    cover_letter: Some(cover_letter),
                    warnings,
                }),
            })
        }
    };
    info!("Cover letter PDF composed: {} bytes", pdf.len());

    Ok(Outcome {
        submission_id,
        resume,
        job_description,
        cover_letter,
        signature,
        pdf: RenderedPdf { bytes: pdf },
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::LlmError;
    use crate::models::JobDescriptionSource;
    use crate::render::SignatureFont;
    use crate::test_support::{spawn_server, Recorded};
    use axum::{
        http::StatusCode,
        response::Html,
        routing::{get, post},
        Json, Router,
    };
    use bytes::Bytes;
    use serde_json::{json, Value};

    const LETTER: &str = "Dear Hiring Manager,\n\nI am excited to apply.\n\nSincerely,\nJane Doe";

    fn resume_pdf() -> Bytes {
        Bytes::from(compose_cover_letter("Jane Doe\nSenior Rust Engineer\nTokio, Axum", None).unwrap())
    }

    /// Completion endpoint plus a job page, both recording their calls.
    async fn mock_services() -> (String, Recorded<Value>, Recorded<()>) {
        let completions: Recorded<Value> = Recorded::default();
        let pages: Recorded<()> = Recorded::default();
        let (c, p) = (completions.clone(), pages.clone());
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(move |Json(req): Json<Value>| {
                    let c = c.clone();
                    async move {
                        c.push(req);
                        Json(json!({"choices":[{"message":{"content": LETTER}}]}))
                    }
                }),
            )
            .route(
                "/job",
                get(move || {
                    let p = p.clone();
                    async move {
                        p.push(());
                        Html("<html><body><h1>Platform Engineer</h1><p>Rust and Kubernetes</p></body></html>")
                    }
                }),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        (spawn_server(router).await, completions, pages)
    }

    fn state_for(base: &str, api_key: Option<&str>) -> AppState {
        let mut config = Config::for_tests();
        config.groq_api_key = api_key.map(String::from);
        config.completion_api_url = format!("{base}/v1/chat/completions");
        AppState::new(config, SignatureFont::Bitmap)
    }

    #[tokio::test]
    async fn test_missing_resume_is_rejected_without_io() {
        let (base, completions, pages) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            job_url: Some(format!("{base}/job")),
            ..Default::default()
        };

        let err = run(&state, submission).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Please upload your resume PDF."));
        assert_eq!(completions.len(), 0);
        assert_eq!(pages.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_job_source_is_rejected() {
        let (base, completions, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            ..Default::default()
        };

        let err = run(&state, submission).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("job URL")));
        assert_eq!(completions.len(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_creativity_is_rejected() {
        let (base, _, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_description: Some("Rust role".into()),
            creativity: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            run(&state, submission).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_pasted_description_wins_over_url() {
        let (base, completions, pages) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_url: Some(format!("{base}/job")),
            job_description: Some("Pasted: Staff Rust Engineer".into()),
            creativity: Some(0.7),
            ..Default::default()
        };

        let outcome = run(&state, submission).await.unwrap();
        assert_eq!(outcome.job_description.source, JobDescriptionSource::Pasted);
        assert_eq!(outcome.job_description.text, "Pasted: Staff Rust Engineer");
        assert_eq!(pages.len(), 0);
        assert_eq!(outcome.warnings.len(), 1);

        let request = &completions.all()[0];
        assert!((request["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        let prompt = request["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("Pasted: Staff Rust Engineer"));
        assert!(prompt.contains("Senior Rust Engineer"));
    }

    #[tokio::test]
    async fn test_url_is_fetched_and_letter_composed() {
        let (base, completions, pages) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let url = format!("{base}/job");
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_url: Some(url.clone()),
            ..Default::default()
        };

        let outcome = run(&state, submission).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(completions.len(), 1);
        assert_eq!(
            outcome.job_description,
            JobDescription::fetched(url, "Platform Engineer Rust and Kubernetes")
        );
        assert_eq!(outcome.cover_letter, LETTER);
        assert!(outcome.pdf.bytes.starts_with(b"%PDF"));
        assert!(outcome.signature.is_none());
        assert!(outcome.warnings.is_empty());

        // Default creativity comes from configuration
        let temperature = completions.all()[0]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_failed_fetch_asks_for_manual_paste() {
        let (base, completions, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_url: Some(format!("{base}/missing")),
            ..Default::default()
        };

        let err = run(&state, submission).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(ref m) if m.contains("paste")));
        assert_eq!(completions.len(), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_resume_is_unprocessable() {
        let (base, completions, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(Bytes::from_static(b"plain text, not a pdf")),
            job_description: Some("Rust role".into()),
            ..Default::default()
        };

        let err = run(&state, submission).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert_eq!(completions.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_generation() {
        let (base, completions, _) = mock_services().await;
        let state = state_for(&base, None);
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_description: Some("Rust role".into()),
            ..Default::default()
        };

        let err = run(&state, submission).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::MissingApiKey)));
        assert_eq!(completions.len(), 0);
    }

    #[tokio::test]
    async fn test_signature_name_renders_png_signature() {
        let (base, _, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_description: Some("Rust role".into()),
            signature_name: Some("Jane Doe".into()),
            ..Default::default()
        };

        let outcome = run(&state, submission).await.unwrap();
        match outcome.signature {
            Some(SignatureAsset::Rendered { ref name, ref png }) => {
                assert_eq!(name, "Jane Doe");
                assert!(png.starts_with(b"\x89PNG"));
            }
            other => panic!("expected rendered signature, got {other:?}"),
        }
        let doc = lopdf::Document::load_mem(&outcome.pdf.bytes).unwrap();
        let has_image = doc.objects.values().any(|obj| {
            obj.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|v| v.as_name().ok())
                == Some(b"Image".as_slice())
        });
        assert!(has_image);
    }

    #[tokio::test]
    async fn test_invalid_uploaded_signature_is_render_error() {
        let (base, _, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_description: Some("Rust role".into()),
            signature: Some(Bytes::from_static(b"not an image")),
            ..Default::default()
        };

        assert!(matches!(
            run(&state, submission).await,
            Err(AppError::Render(_))
        ));
    }

    #[tokio::test]
    async fn test_composition_failure_keeps_generated_letter() {
        let (base, _, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_description: Some("Rust role".into()),
            signature: Some(Bytes::from_static(b"not an image")),
            ..Default::default()
        };

        let failure = run_keeping_partial(&state, submission).await.unwrap_err();
        assert!(matches!(failure.error, AppError::Render(_)));
        let partial = failure.partial.expect("letter kept after composition failure");
        assert_eq!(partial.cover_letter.as_deref(), Some(LETTER));
        assert_eq!(partial.job_description.text, "Rust role");
        assert!(partial.resume.text.contains("Senior Rust Engineer"));
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_extracted_texts() {
        let (base, _, _) = mock_services().await;
        let state = state_for(&base, None);
        let submission = Submission {
            resume: Some(resume_pdf()),
            job_description: Some("Rust role".into()),
            ..Default::default()
        };

        let failure = run_keeping_partial(&state, submission).await.unwrap_err();
        assert!(matches!(failure.error, AppError::Llm(LlmError::MissingApiKey)));
        let partial = failure.partial.expect("texts kept after generation failure");
        assert!(partial.cover_letter.is_none());
        assert!(partial.resume.text.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_validation_failure_has_nothing_to_show() {
        let (base, _, _) = mock_services().await;
        let state = state_for(&base, Some("key"));
        let failure = run_keeping_partial(&state, Submission::default())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, AppError::Validation(_)));
        assert!(failure.partial.is_none());
    }
}
