//! Security schemes and base URL selection

use crate::document::{Document, Operation, SecurityScheme};
use std::collections::BTreeSet;

/// Base URL when the document declares no usable server
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Credential slot on the client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialKind {
    ApiKey,
    Bearer,
    Basic,
}

impl CredentialKind {
    /// Neutral field name, cased by the target profile
    pub fn field(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::Bearer => "bearer_token",
            Self::Basic => "basic_auth",
        }
    }

    /// Default value written into the generated configuration
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::ApiKey => "YOUR_API_KEY",
            Self::Bearer => "YOUR_BEARER_TOKEN",
            Self::Basic => "YOUR_BASIC_CREDENTIALS",
        }
    }
}

/// Header an operation attaches before sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    ApiKeyHeader { header: String },
    Bearer,
    Basic,
}

impl AuthStep {
    pub fn credential(&self) -> CredentialKind {
        match self {
            Self::ApiKeyHeader { .. } => CredentialKind::ApiKey,
            Self::Bearer => CredentialKind::Bearer,
            Self::Basic => CredentialKind::Basic,
        }
    }
}

/// Supported shape of one security scheme, if any
///
/// API keys outside headers, OAuth2 and OpenID Connect are skipped.
pub fn classify_scheme(key: &str, scheme: &SecurityScheme) -> Option<AuthStep> {
    match scheme.kind.as_str() {
        "apiKey" if scheme.location.as_deref() == Some("header") => Some(AuthStep::ApiKeyHeader {
            header: scheme.name.clone().unwrap_or_else(|| key.to_string()),
        }),
        "http" => match scheme.scheme.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("bearer") => Some(AuthStep::Bearer),
            Some("basic") => Some(AuthStep::Basic),
            _ => None,
        },
        // Swagger 2.0
        "basic" => Some(AuthStep::Basic),
        _ => None,
    }
}

/// Auth steps for one operation: its own requirements, else the document's
pub fn operation_auth(doc: &Document, op: &Operation) -> Vec<AuthStep> {
    let requirements = op.security.as_ref().unwrap_or(&doc.security);
    let schemes = doc.security_schemes();
    let mut steps: Vec<AuthStep> = Vec::new();
    for key in requirements.iter().flat_map(|req| req.keys()) {
        let Some(scheme) = schemes.get(key) else {
            tracing::debug!(scheme = %key, "security requirement names an undeclared scheme");
            continue;
        };
        match classify_scheme(key, scheme) {
            Some(step) if !steps.contains(&step) => steps.push(step),
            Some(_) => {}
            None => tracing::debug!(scheme = %key, kind = %scheme.kind, "skipping unsupported security scheme"),
        }
    }
    steps
}

/// Every credential kind declared anywhere in the document
pub fn credential_kinds(doc: &Document) -> BTreeSet<CredentialKind> {
    doc.security_schemes()
        .iter()
        .filter_map(|(key, scheme)| classify_scheme(key, scheme))
        .map(|step| step.credential())
        .collect()
}

/// First declared server, resolved against the default for relative URLs
pub fn base_url(doc: &Document) -> String {
    let Some(first) = doc.base_urls().into_iter().find(|u| !u.trim().is_empty()) else {
        return DEFAULT_BASE_URL.to_string();
    };
    let absolute = match url::Url::parse(&first) {
        Ok(url) => url.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match url::Url::parse(DEFAULT_BASE_URL).and_then(|base| base.join(&first)) {
                Ok(url) => url.to_string(),
                Err(_) => DEFAULT_BASE_URL.to_string(),
            }
        }
        Err(err) => {
            tracing::warn!(server = %first, "unusable server URL: {err}");
            DEFAULT_BASE_URL.to_string()
        }
    };
    absolute.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> Document {
        serde_json::from_str(json).expect("parse document")
    }

    #[test]
    fn api_key_header_uses_declared_name() {
        let d = doc(
            r#"{"openapi": "3.0.0", "paths": {},
                "security": [{"key": []}],
                "components": {"securitySchemes": {
                    "key": {"type": "apiKey", "in": "header", "name": "X-API-Key"},
                    "cookie": {"type": "apiKey", "in": "cookie", "name": "sid"},
                    "jwt": {"type": "http", "scheme": "Bearer"}
                }}}"#,
        );
        let op = Operation::default();
        assert_eq!(
            operation_auth(&d, &op),
            vec![AuthStep::ApiKeyHeader {
                header: "X-API-Key".into()
            }]
        );

        let op = Operation {
            security: Some(vec![
                [("jwt".to_string(), vec![])].into_iter().collect(),
                [("cookie".to_string(), vec![])].into_iter().collect(),
            ]),
            ..Operation::default()
        };
        assert_eq!(operation_auth(&d, &op), vec![AuthStep::Bearer]);

        let kinds: Vec<_> = credential_kinds(&d).into_iter().collect();
        assert_eq!(kinds, vec![CredentialKind::ApiKey, CredentialKind::Bearer]);
    }

    #[test]
    fn empty_operation_security_disables_auth() {
        let d = doc(
            r#"{"openapi": "3.0.0", "paths": {},
                "security": [{"basic": []}],
                "components": {"securitySchemes": {"basic": {"type": "http", "scheme": "basic"}}}}"#,
        );
        let op = Operation {
            security: Some(Vec::new()),
            ..Operation::default()
        };
        assert!(operation_auth(&d, &op).is_empty());
    }

    #[test]
    fn base_url_selection() {
        assert_eq!(base_url(&doc(r#"{"openapi": "3.0.0", "paths": {}}"#)), "http://localhost");
        assert_eq!(
            base_url(&doc(r#"{"openapi": "3.0.0", "paths": {}, "servers": [{"url": "/api/v2"}]}"#)),
            "http://localhost/api/v2"
        );
        assert_eq!(
            base_url(&doc(
                r#"{"openapi": "3.0.0", "paths": {}, "servers": [{"url": "https://api.example.com/"}]}"#
            )),
            "https://api.example.com"
        );
        assert_eq!(
            base_url(&doc(
                r#"{"swagger": "2.0", "paths": {}, "host": "petstore.io", "basePath": "/v1", "schemes": ["http", "https"]}"#
            )),
            "https://petstore.io/v1"
        );
    }
}
