//! Job posting scraper: fetch a page and reduce it to single-spaced plain text.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header::USER_AGENT, Client, Url};
use scraper::{Html, Node};
use thiserror::Error;
use tracing::debug;

/// Desktop browser UA; many job boards reject obvious bot clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Elements whose text content is never part of the readable page.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid job URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("job page returned HTTP {0}")]
    Status(u16),
}

/// Fetches `url` with a single GET and returns its visible text, whitespace-collapsed.
pub async fn fetch_job_description(client: &Client, url: &str) -> Result<String, FetchError> {
    let parsed = parse_job_url(url)?;

    let response = client
        .get(parsed)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    debug!("Fetched job page: {} bytes", body.len());

    Ok(html_to_text(&body))
}

/// Strips all markup from an HTML document.
///
/// Text nodes are trimmed and joined with single spaces, so tag boundaries
/// never glue words together; every remaining whitespace run becomes one space.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let pieces: Vec<&str> = document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some((node, &**text)),
            _ => None,
        })
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
            })
        })
        .map(|(_, text)| text.trim())
        .filter(|text| !text.is_empty())
        .collect();

    WHITESPACE_RUN
        .replace_all(&pieces.join(" "), " ")
        .trim()
        .to_string()
}

fn parse_job_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_server, Recorded};
    use axum::{
        http::{HeaderMap, StatusCode},
        response::Html as HtmlResponse,
        routing::get,
        Router,
    };

    #[test]
    fn test_html_to_text_simple_page() {
        let html = "<html><body><p>Job description here</p></body></html>";
        assert_eq!(html_to_text(html), "Job description here");
    }

    #[test]
    fn test_html_to_text_separates_adjacent_tags() {
        let html = "<ul><li>Rust</li><li>Tokio</li></ul><p>Remote<br>friendly</p>";
        assert_eq!(html_to_text(html), "Rust Tokio Remote friendly");
    }

    #[test]
    fn test_html_to_text_has_no_tags_or_double_whitespace() {
        let html = r#"
            <html>
              <head><title>Senior   Engineer</title>
                <style>body { color: red; }</style>
                <script>var tracking = "<b>x</b>";</script>
              </head>
              <body>
                <h1>Senior
                    Engineer</h1>
                <div>  Build &amp; ship   services.	Tabs	too. </div>
              </body>
            </html>"#;
        let text = html_to_text(html);
        assert_eq!(
            text,
            "Senior Engineer Senior Engineer Build & ship services. Tabs too."
        );
        assert!(!text.contains('<') && !text.contains('>'));
        assert!(!text.chars().zip(text.chars().skip(1)).any(|(a, b)| a.is_whitespace() && b.is_whitespace()));
    }

    #[test]
    fn test_html_to_text_empty_document() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<html><body>   </body></html>"), "");
    }

    #[test]
    fn test_parse_job_url_rejects_non_http_schemes() {
        assert!(matches!(
            parse_job_url("file:///etc/passwd"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_job_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(parse_job_url(" https://jobs.example.com/42 ").is_ok());
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent_and_strips_markup() {
        let agents: Recorded<String> = Recorded::default();
        let recorded = agents.clone();
        let router = Router::new().route(
            "/job",
            get(move |headers: HeaderMap| {
                let recorded = recorded.clone();
                async move {
                    let ua = headers
                        .get("user-agent")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    recorded.push(ua);
                    HtmlResponse("<html><body><h2>Backend Engineer</h2>\n<p>Rust,\n\n Postgres</p></body></html>")
                }
            }),
        );
        let base = spawn_server(router).await;

        let text = fetch_job_description(&Client::new(), &format!("{base}/job"))
            .await
            .unwrap();
        assert_eq!(text, "Backend Engineer Rust, Postgres");
        assert_eq!(agents.all(), vec![BROWSER_USER_AGENT.to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let router = Router::new().route("/gone", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn_server(router).await;

        let err = fetch_job_description(&Client::new(), &format!("{base}/gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_http_error() {
        let err = fetch_job_description(&Client::new(), "http://127.0.0.1:9/job")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }
}
