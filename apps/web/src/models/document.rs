use bytes::Bytes;
use serde::Serialize;

/// An uploaded résumé: the raw PDF and the text extracted from it.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub bytes: Bytes,
    pub text: String,
}

/// Where the job description text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobDescriptionSource {
    /// Scraped from a job posting URL.
    Fetched { url: String },
    /// Typed or pasted by the user. Always wins over a fetched page.
    Pasted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescription {
    pub text: String,
    pub source: JobDescriptionSource,
}

impl JobDescription {
    pub fn pasted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: JobDescriptionSource::Pasted,
        }
    }

    pub fn fetched(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: JobDescriptionSource::Fetched { url: url.into() },
        }
    }
}
