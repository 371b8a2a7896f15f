//! Server-rendered HTML for the form surface.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::models::{
    Creativity, JobDescription, JobDescriptionSource, RenderedPdf, ResumeDocument, SignatureAsset,
};
use crate::pipeline::{Outcome, Partial};

/// What appears under the form.
pub enum PageBody<'a> {
    Empty,
    Error(&'a str),
    Result(&'a Outcome),
    /// A late stage failed; show what was produced before it.
    Partial {
        error: &'a str,
        partial: &'a Partial,
    },
}

pub struct PageSettings {
    pub default_creativity: f32,
    pub api_key_missing: bool,
    pub model: String,
}

pub fn render_page(settings: &PageSettings, body: PageBody<'_>) -> String {
    let banner = if settings.api_key_missing {
        r#"<div class="alert error">Groq API key is missing! Set GROQ_API_KEY in the environment or .env file.</div>"#
    } else {
        ""
    };
    let body = match body {
        PageBody::Empty => String::new(),
        PageBody::Error(message) => format!(r#"<div class="alert error">{}</div>"#, escape_html(message)),
        PageBody::Result(outcome) => result_section(outcome),
        PageBody::Partial { error, partial } => partial_section(error, partial),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ATS Cover Letter Generator</title>
<style>{STYLE}</style>
</head>
<body>
<aside>
{banner}
<h2>App Information</h2>
<div class="alert info">This app uses:
<ul><li>{model} for content generation</li><li>PDF processing for document handling</li><li>ATS optimization techniques</li></ul></div>
</aside>
<main>
<h1>ATS Cover Letter Generator</h1>
<p>Generate ATS-optimized, professional cover letters tailored to specific job applications using AI.
Upload your CV, provide the job description, and get a customized cover letter in seconds.</p>
{form}
{body}
{TIPS}
</main>
</body>
</html>"#,
        model = escape_html(&settings.model),
        form = form_section(settings.default_creativity),
    )
}

fn form_section(default_creativity: f32) -> String {
    format!(
        r#"<form method="post" action="/" enctype="multipart/form-data">
<div class="columns">
<section>
<h3>Resume Upload</h3>
<label>Upload your Resume/CV (PDF)<input type="file" name="resume" accept="application/pdf,.pdf"></label>
<label>Upload signature image (optional)<input type="file" name="signature" accept=".png,.jpg,.jpeg"></label>
<label>Or sign with your name (optional)<input type="text" name="signature_name"></label>
</section>
<section>
<h3>Job Description</h3>
<label>Job Posting URL (optional)<input type="url" name="job_url"></label>
<label>Or paste the job description here<textarea name="job_description" rows="8"></textarea></label>
</section>
</div>
<label>AI Creativity (Temperature)
<input type="range" name="creativity" min="{min}" max="{max}" step="{step}" value="{default_creativity:.1}" oninput="this.nextElementSibling.value=this.value">
<output>{default_creativity:.1}</output></label>
<button type="submit">Generate Cover Letter</button>
</form>"#,
        min = Creativity::MIN,
        max = Creativity::MAX,
        step = Creativity::STEP,
    )
}

fn warnings_html(warnings: &[String]) -> String {
    warnings
        .iter()
        .map(|w| format!(r#"<div class="alert warning">{}</div>"#, escape_html(w)))
        .collect()
}

/// Résumé preview and text next to the job description.
fn inputs_html(resume: &ResumeDocument, job_description: &JobDescription) -> String {
    let source = match &job_description.source {
        JobDescriptionSource::Fetched { url } => format!("Fetched from {}", escape_html(url)),
        JobDescriptionSource::Pasted => "Pasted".to_string(),
    };

    format!(
        r#"<div class="columns">
<section>
<h3>Your Resume</h3>
<iframe title="resume" src="data:application/pdf;base64,{resume_b64}" width="100%" height="500"></iframe>
<details><summary>View Resume as Text</summary><textarea rows="12" readonly>{resume_text}</textarea></details>
</section>
<section>
<h3>Job Description</h3>
<p class="muted">{source}</p>
<details><summary>View Job Description</summary><textarea rows="12" readonly>{job_text}</textarea></details>
</section>
</div>"#,
        resume_b64 = STANDARD.encode(&resume.bytes),
        resume_text = escape_html(&resume.text),
        job_text = escape_html(&job_description.text),
    )
}

fn letter_html(letter: &str) -> String {
    format!(
        r#"<h3>Your Cover Letter</h3>
<pre class="letter">{}</pre>"#,
        escape_html(letter)
    )
}

fn result_section(outcome: &Outcome) -> String {
    let signature = match &outcome.signature {
        Some(SignatureAsset::Rendered { name, png }) => format!(
            r#"<h4>Generated signature</h4><img class="signature" alt="Signature of {}" src="data:image/png;base64,{}">"#,
            escape_html(name),
            STANDARD.encode(png)
        ),
        _ => String::new(),
    };

    let pdf_b64 = STANDARD.encode(&outcome.pdf.bytes);

    format!(
        r#"{warnings}
{inputs}
<div class="alert success">Cover letter generated successfully!</div>
{letter}
{signature}
<a class="button" download="{file_name}" href="data:application/pdf;base64,{pdf_b64}">Download Cover Letter as PDF</a>
<iframe title="cover letter" src="data:application/pdf;base64,{pdf_b64}" width="700" height="600"></iframe>"#,
        warnings = warnings_html(&outcome.warnings),
        inputs = inputs_html(&outcome.resume, &outcome.job_description),
        letter = letter_html(&outcome.cover_letter),
        file_name = RenderedPdf::FILE_NAME,
    )
}

/// No download is offered: there is no PDF.
fn partial_section(error: &str, partial: &Partial) -> String {
    let letter = partial
        .cover_letter
        .as_deref()
        .map(letter_html)
        .unwrap_or_default();

    format!(
        r#"{warnings}
{inputs}
<div class="alert error">{error}</div>
{letter}"#,
        warnings = warnings_html(&partial.warnings),
        inputs = inputs_html(&partial.resume, &partial.job_description),
        error = escape_html(error),
    )
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = "body{display:flex;font-family:sans-serif;margin:0}\
aside{width:18rem;padding:1rem;background:#f0f2f6}\
main{flex:1;padding:1rem 2rem;max-width:60rem}\
.columns{display:flex;gap:2rem}.columns section{flex:1}\
label{display:block;margin:.5rem 0}input[type=text],input[type=url],textarea{width:100%}\
.alert{padding:.75rem;border-radius:.25rem;margin:.5rem 0}\
.error{background:#fde2e2}.warning{background:#fff4d6}.success{background:#e2f7e2}.info{background:#e2ecfd}\
.letter{white-space:pre-wrap;font-family:inherit}.muted{color:#666}.signature{max-width:200px}\
.button{display:inline-block;margin:1rem 0;padding:.5rem 1rem;background:#ff4b4b;color:#fff;text-decoration:none}";

const TIPS: &str = r#"<details>
<summary>Tips for Better Results</summary>
<ol>
<li><strong>Ensure your resume is up-to-date</strong> and includes relevant skills and experience for the position.</li>
<li><strong>Use a detailed job description</strong>: the more information provided, the better the tailored cover letter.</li>
<li><strong>Adjust the AI Creativity setting</strong>: lower values (0.1 to 0.3) produce more formal, conservative letters; higher values (0.6 to 0.9) produce more unique, creative letters.</li>
<li><strong>Review and personalize</strong> the generated cover letter before submitting it to employers.</li>
<li><strong>Always proofread</strong> the final output to ensure it accurately represents your qualifications.</li>
</ol>
</details>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key_missing: bool) -> PageSettings {
        PageSettings {
            default_creativity: 0.4,
            api_key_missing,
            model: "llama-3.1-8b-instant".into(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_form_has_all_fields_and_slider_default() {
        let html = render_page(&settings(false), PageBody::Empty);
        for name in ["resume", "signature", "signature_name", "job_url", "job_description", "creativity"] {
            assert!(html.contains(&format!(r#"name="{name}""#)), "missing field {name}");
        }
        assert!(html.contains(r#"min="0" max="1" step="0.1" value="0.4""#));
        assert!(!html.contains("API key is missing"));
        assert!(html.contains("Tips for Better Results"));
    }

    #[test]
    fn test_missing_key_banner() {
        let html = render_page(&settings(true), PageBody::Empty);
        assert!(html.contains("GROQ_API_KEY"));
    }

    fn partial(cover_letter: Option<&str>) -> Partial {
        Partial {
            resume: ResumeDocument {
                bytes: bytes::Bytes::from_static(b"%PDF-1.5"),
                text: "Jane Doe, Rust engineer".into(),
            },
            job_description: JobDescription::pasted("Platform role"),
            cover_letter: cover_letter.map(String::from),
            warnings: vec![],
        }
    }

    #[test]
    fn test_partial_page_shows_letter_without_download() {
        let partial = partial(Some("Dear Hiring Manager, <hello>"));
        let html = render_page(
            &settings(false),
            PageBody::Partial {
                error: "Error creating PDF: bad image",
                partial: &partial,
            },
        );
        assert!(html.contains("Dear Hiring Manager, &lt;hello&gt;"));
        assert!(html.contains("Error creating PDF: bad image"));
        assert!(html.contains("Jane Doe, Rust engineer"));
        assert!(html.contains("Platform role"));
        assert!(!html.contains("download="));
        assert!(!html.contains("generated successfully"));
    }

    #[test]
    fn test_partial_page_without_letter_shows_inputs() {
        let partial = partial(None);
        let html = render_page(
            &settings(true),
            PageBody::Partial {
                error: "GROQ_API_KEY is not configured",
                partial: &partial,
            },
        );
        assert!(html.contains("Jane Doe, Rust engineer"));
        assert!(!html.contains("Your Cover Letter"));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let html = render_page(&settings(false), PageBody::Error("bad <input>"));
        assert!(html.contains("bad &lt;input&gt;"));
    }
}
