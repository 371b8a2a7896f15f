use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::render::SignatureFont;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Client for job posting fetches; separate from the completion client.
    pub http: Client,
    pub config: Config,
    pub signature_font: Arc<SignatureFont>,
}

impl AppState {
    pub fn new(config: Config, signature_font: SignatureFont) -> Self {
        let llm = LlmClient::new(
            config.groq_api_key.clone(),
            config.completion_api_url.clone(),
            config.completion_model.clone(),
        );
        Self {
            llm,
            http: Client::new(),
            config,
            signature_font: Arc::new(signature_font),
        }
    }
}
