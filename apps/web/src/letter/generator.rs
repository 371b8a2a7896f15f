//! Cover letter generation.
//!
//! Flow: truncate sources → fill the prompt template → one completion call.
//! The returned text is used as-is; no structural validation is applied.

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::letter::prompts::{COVER_LETTER_PROMPT_TEMPLATE, SOURCE_CHAR_BUDGET};
use crate::llm_client::prompts::NO_META_COMMENTARY;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::Creativity;

/// Inputs to one generation call. Both texts are already cut to the prompt budget.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub resume_text: String,
    pub job_description: String,
    pub creativity: Creativity,
}

impl GenerationRequest {
    /// Builds a request, silently keeping only the first `SOURCE_CHAR_BUDGET`
    /// characters of each text (may cut mid-sentence).
    pub fn new(resume_text: &str, job_description: &str, creativity: Creativity) -> Self {
        Self {
            resume_text: truncate_chars(resume_text, SOURCE_CHAR_BUDGET).to_string(),
            job_description: truncate_chars(job_description, SOURCE_CHAR_BUDGET).to_string(),
            creativity,
        }
    }

    /// Renders the prompt, dated `today`.
    pub fn prompt(&self, today: NaiveDate) -> String {
        let today = today.format("%B %-d, %Y").to_string();
        fill_template(
            COVER_LETTER_PROMPT_TEMPLATE,
            &[
                ("resume_text", &self.resume_text),
                ("job_description", &self.job_description),
                ("today", &today),
                ("closing_instruction", NO_META_COMMENTARY),
            ],
        )
    }
}

/// Generates the letter text with a single completion request.
///
/// Fails with `LlmError::MissingApiKey` before any network I/O when no key is configured.
pub async fn generate_cover_letter(
    llm: &LlmClient,
    request: &GenerationRequest,
) -> Result<String, LlmError> {
    if !llm.has_api_key() {
        return Err(LlmError::MissingApiKey);
    }

    let prompt = request.prompt(Local::now().date_naive());
    info!(
        "Requesting cover letter: model={}, temperature={:.1}, prompt_chars={}",
        llm.model(),
        request.creativity.value(),
        prompt.chars().count()
    );

    let letter = llm.complete(&prompt, request.creativity.value()).await?;
    info!("Cover letter generated: {} chars", letter.chars().count());
    Ok(letter)
}

/// Returns the prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Substitutes `{name}` placeholders in a single pass, so substituted text is
/// never scanned for further placeholders. Unknown placeholders are kept verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
