use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::llm_client::{DEFAULT_COMPLETION_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; a missing API key is reported as a warning.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: Option<String>,
    pub completion_api_url: String,
    pub completion_model: String,
    /// Slider default for the sampling temperature, within `0.0..=1.0`.
    pub default_creativity: f32,
    pub signature_font_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_creativity = optional_env("DEFAULT_CREATIVITY")
            .map(|v| {
                v.parse::<f32>()
                    .context("DEFAULT_CREATIVITY must be a number")
            })
            .transpose()?
            .unwrap_or(0.4);
        if !(0.0..=1.0).contains(&default_creativity) {
            bail!("DEFAULT_CREATIVITY must be between 0.0 and 1.0, got {default_creativity}");
        }

        Ok(Config {
            groq_api_key: optional_env("GROQ_API_KEY"),
            completion_api_url: optional_env("COMPLETION_API_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
            completion_model: optional_env("COMPLETION_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            default_creativity,
            signature_font_path: optional_env("SIGNATURE_FONT_PATH").map(PathBuf::from),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")
                .map(|v| {
                    v.parse::<usize>()
                        .context("MAX_UPLOAD_BYTES must be a byte count")
                })
                .transpose()?
                .unwrap_or(10 * 1024 * 1024),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Configuration used by tests: no key, defaults everywhere.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            groq_api_key: None,
            completion_api_url: DEFAULT_COMPLETION_URL.to_string(),
            completion_model: DEFAULT_MODEL.to_string(),
            default_creativity: 0.4,
            signature_font_path: None,
            max_upload_bytes: 10 * 1024 * 1024,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

/// Reads an environment variable, treating empty or whitespace-only values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
