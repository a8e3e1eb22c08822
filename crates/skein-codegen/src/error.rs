use miette::{Diagnostic, NamedSource, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a generation run
///
/// Anything that only affects one schema or operation is an
/// [`Issue`](crate::diagnostics::Issue) instead, and degrades locally.
#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    /// IO error when reading input or writing output
    #[error("IO error: {0}")]
    #[diagnostic(code(skein::io))]
    Io(#[from] io::Error),

    /// The top-level document could not be parsed at all
    #[error("Failed to parse API description from {origin}: {message}")]
    #[diagnostic(
        code(skein::parse_error),
        help("Check that the document is valid JSON or YAML and follows the OpenAPI or Swagger layout")
    )]
    ParseError {
        /// Path or URL the document came from
        origin: String,
        message: String,
        /// Source text that failed to parse
        #[source_code]
        src: Option<NamedSource<String>>,
        /// Location of the error in the source
        #[label("parse error here")]
        span: Option<SourceSpan>,
    },

    /// Remote document could not be downloaded
    #[error("Failed to fetch {url}")]
    #[diagnostic(
        code(skein::fetch),
        help("Check the URL and your network connection, or download the document and pass a local path")
    )]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A custom template is missing required placeholders
    #[error("Template {} is missing required placeholders: {}", path.display(), missing.join(", "))]
    #[diagnostic(
        code(skein::template_missing_placeholder),
        help("Start from the backend's default template and keep every placeholder and import block")
    )]
    TemplateMissingPlaceholder {
        path: PathBuf,
        missing: Vec<String>,
    },

    /// A custom template could not be read
    #[error("Template {} could not be read", path.display())]
    #[diagnostic(code(skein::template_unavailable))]
    TemplateUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Requested backend does not exist
    #[error("Unknown target backend: {name}")]
    #[diagnostic(code(skein::unknown_target), help("Available targets: {available:?}"))]
    UnknownTarget {
        name: String,
        available: Vec<String>,
    },

    /// Invalid KDL configuration
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(skein::config))]
    Config { message: String },

    /// Generic error with context
    #[error("{message}")]
    #[diagnostic(code(skein::error))]
    Other {
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CodegenError {
    /// Create a parse error from a JSON failure, pointing at the offending location
    pub fn from_json(source: serde_json::Error, origin: impl Into<String>, text: String) -> Self {
        let offset = line_col_offset(&text, source.line(), source.column());
        Self::parse_error_with_source(source.to_string(), origin, text, offset)
    }

    /// Create a parse error from a YAML failure, pointing at the offending location
    pub fn from_yaml(source: serde_yaml::Error, origin: impl Into<String>, text: String) -> Self {
        let offset = source.location().map(|loc| loc.index());
        Self::parse_error_with_source(source.to_string(), origin, text, offset)
    }

    /// Create a parse error without source text
    pub fn parse_error(message: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::ParseError {
            origin: origin.into(),
            message: message.into(),
            src: None,
            span: None,
        }
    }

    fn parse_error_with_source(
        message: String,
        origin: impl Into<String>,
        text: String,
        offset: Option<usize>,
    ) -> Self {
        let origin = origin.into();
        let span = offset.map(|at| SourceSpan::from((at.min(text.len()), 1)));
        Self::ParseError {
            src: Some(NamedSource::new(origin.clone(), text)),
            origin,
            message,
            span,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a generic error with context
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }
}

/// Byte offset of a 1-based line/column pair, if it lies inside `text`
fn line_col_offset(text: &str, line: usize, column: usize) -> Option<usize> {
    let line = line.checked_sub(1)?;
    let start: usize = text.split_inclusive('\n').take(line).map(str::len).sum();
    Some(start + column.saturating_sub(1))
}

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_point_at_the_offending_line() {
        let text = "{\n  \"openapi\": \"3.0.0\",\n  oops\n}".to_string();
        let source = serde_json::from_str::<serde_json::Value>(&text).unwrap_err();
        match CodegenError::from_json(source, "api.json", text) {
            CodegenError::ParseError { span, origin, .. } => {
                assert_eq!(origin, "api.json");
                let span = span.expect("span");
                // third line starts at byte 24
                assert!((24..31).contains(&span.offset()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_placeholders_are_listed() {
        let err = CodegenError::TemplateMissingPlaceholder {
            path: PathBuf::from("custom.tera"),
            missing: vec!["types".into(), "requests".into()],
        };
        assert_eq!(
            err.to_string(),
            "Template custom.tera is missing required placeholders: types, requests"
        );
    }
}
