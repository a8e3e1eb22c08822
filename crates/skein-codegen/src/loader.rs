//! Loading API descriptions from local files or remote URLs

use crate::document::Document;
use crate::error::{CodegenError, Result};
use std::path::Path;
use std::time::Duration;

/// Default bound on remote fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Serialization of the raw document text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Detect by extension, then by the first non-whitespace character
    pub fn detect(origin: &str, text: &str) -> Self {
        let path = origin.split(['?', '#']).next().unwrap_or(origin);
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            Some("json") => Self::Json,
            _ if text.trim_start().starts_with(['{', '[']) => Self::Json,
            _ => Self::Yaml,
        }
    }
}

fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a document from a path or `http(s)` URL
pub async fn load(input: &str, timeout: Duration) -> Result<Document> {
    let text = if is_remote(input) {
        fetch(input, timeout).await?
    } else {
        tracing::debug!(path = input, "reading local document");
        std::fs::read_to_string(input)?
    };
    parse_document(&text, input)
}

async fn fetch(url: &str, timeout: Duration) -> Result<String> {
    tracing::debug!(url, ?timeout, "fetching remote document");
    let fetch_err = |source| CodegenError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_err)?;
    let resp = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;
    resp.text().await.map_err(fetch_err)
}

/// Parse raw text into a [`Document`]
///
/// Fails when the text is not JSON/YAML, or parses but is neither an
/// OpenAPI nor a Swagger document.
pub fn parse_document(text: &str, origin: &str) -> Result<Document> {
    let doc: Document = match Format::detect(origin, text) {
        Format::Json => serde_json::from_str(text)
            .map_err(|e| CodegenError::from_json(e, origin, text.to_string()))?,
        Format::Yaml => serde_yaml::from_str(text)
            .map_err(|e| CodegenError::from_yaml(e, origin, text.to_string()))?,
    };

    if doc.openapi.is_none() && doc.swagger.is_none() {
        return Err(CodegenError::parse_error(
            "document declares neither `openapi` nor `swagger` version",
            origin,
        ));
    }

    tracing::debug!(
        origin,
        version = doc.openapi.as_deref().or(doc.swagger.as_deref()),
        paths = doc.paths.len(),
        schemas = doc.schemas().len(),
        "parsed document"
    );
    Ok(doc)
}
