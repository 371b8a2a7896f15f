use axum::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

/// Raw form input for one cover letter run. Empty fields are `None`.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub resume: Option<Bytes>,
    pub signature: Option<Bytes>,
    pub signature_name: Option<String>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub creativity: Option<f32>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Could not read form data: {0}")]
    Multipart(#[from] MultipartError),

    #[error("creativity must be a number, got {0:?}")]
    InvalidCreativity(String),
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl Submission {
    /// Reads every multipart field. Unknown fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, SubmissionError> {
        let mut submission = Submission::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" => submission.resume = non_empty_bytes(field.bytes().await?),
                "signature" => submission.signature = non_empty_bytes(field.bytes().await?),
                "signature_name" => submission.signature_name = non_empty_text(field.text().await?),
                "job_url" => submission.job_url = non_empty_text(field.text().await?),
                "job_description" => {
                    submission.job_description = non_empty_text(field.text().await?)
                }
                "creativity" => {
                    if let Some(raw) = non_empty_text(field.text().await?) {
                        let value = raw
                            .parse::<f32>()
                            .map_err(|_| SubmissionError::InvalidCreativity(raw.clone()))?;
                        submission.creativity = Some(value);
                    }
                }
                other => debug!("Ignoring unknown form field {other:?}"),
            }
        }

        debug!(
            "Submission received: resume={}B signature={}B url={} pasted_chars={}",
            submission.resume.as_ref().map_or(0, Bytes::len),
            submission.signature.as_ref().map_or(0, Bytes::len),
            submission.job_url.is_some(),
            submission
                .job_description
                .as_ref()
                .map_or(0, |t| t.chars().count()),
        );

        Ok(submission)
    }
}

fn non_empty_bytes(bytes: Bytes) -> Option<Bytes> {
    (!bytes.is_empty()).then_some(bytes)
}

fn non_empty_text(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_absent() {
        assert_eq!(non_empty_text("   \n\t".into()), None);
        assert_eq!(non_empty_text("".into()), None);
        assert_eq!(
            non_empty_text("  https://jobs.example.com/1 ".into()).as_deref(),
            Some("https://jobs.example.com/1")
        );
    }

    #[test]
    fn test_zero_length_file_is_absent() {
        assert!(non_empty_bytes(Bytes::new()).is_none());
        assert!(non_empty_bytes(Bytes::from_static(b"%PDF")).is_some());
    }

    #[test]
    fn test_submission_error_maps_to_validation() {
        let err: AppError = SubmissionError::InvalidCreativity("hot".into()).into();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("hot")));
    }
}
