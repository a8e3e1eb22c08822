use crate::bind::auth::{AuthStep, CredentialKind};
use crate::document::HttpMethod;
use crate::imports::ImportSet;
use crate::synth::ir::TypeExpr;

/// One HTTP operation, ready for a backend to render
#[derive(Debug, Clone, PartialEq)]
pub struct OperationBinding {
    /// Final function identifier
    pub function_name: String,
    /// `METHOD /path`, used in diagnostics and docs
    pub label: String,
    pub method: HttpMethod,
    pub path: String,
    pub path_segments: Vec<PathSegment>,
    pub parameters: Vec<BoundParameter>,
    pub body: RequestBody,
    /// Every declared numeric status, in declaration order
    pub responses: Vec<ResponseCase>,
    /// Canonical success payload, optional when some 2xx carries no content
    pub success: TypeExpr,
    /// Per-operation error type, absent when no error status is declared
    pub error_type: Option<ErrorType>,
    pub auth: Vec<AuthStep>,
    pub summary: Option<String>,
    pub deprecated: bool,
    pub imports: ImportSet,
}

impl OperationBinding {
    pub fn path_params(&self) -> impl Iterator<Item = &BoundParameter> {
        self.parameters.iter().filter(|p| p.location == ParamLocation::Path)
    }

    pub fn query_params(&self) -> impl Iterator<Item = &BoundParameter> {
        self.parameters.iter().filter(|p| p.location == ParamLocation::Query)
    }

    pub fn header_params(&self) -> impl Iterator<Item = &BoundParameter> {
        self.parameters.iter().filter(|p| p.location == ParamLocation::Header)
    }

    pub fn success_statuses(&self) -> impl Iterator<Item = &ResponseCase> {
        self.responses.iter().filter(|r| r.is_success())
    }

    /// 2xx statuses declared without content while the success value has one
    pub fn empty_statuses(&self) -> impl Iterator<Item = u16> + '_ {
        let typed = self.success != TypeExpr::Unit;
        self.success_statuses()
            .filter(move |r| typed && r.payload == TypeExpr::Unit)
            .map(|r| r.status)
    }

    pub fn error_statuses(&self) -> impl Iterator<Item = &ResponseCase> {
        self.responses.iter().filter(|r| r.is_error())
    }

    /// Every declaration this operation's signature or dispatch mentions
    pub fn references(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.parameters.iter().flat_map(|p| p.ty.named()).collect();
        if let RequestBody::Json { ty, .. } = &self.body {
            out.extend(ty.named());
        }
        out.extend(self.success.named());
        for case in self.error_type.iter().flat_map(|e| e.cases.iter()) {
            if let ErrorPayload::Typed(ty) = &case.payload {
                out.extend(ty.named());
            }
        }
        out
    }
}

/// One `/`-separated piece of the path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub parts: Vec<PathPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    Literal(String),
    /// Substituted from the parameter with this identifier
    Param { name: String, ident: String },
}

impl PathSegment {
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, PathPart::Literal(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Name on the wire
    pub name: String,
    pub ident: String,
    pub location: ParamLocation,
    pub ty: TypeExpr,
    pub required: bool,
    pub stringifier: Stringifier,
    pub doc: Option<String>,
}

/// How a parameter value becomes text in a URL or header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stringifier {
    Integer,
    Number,
    Boolean,
    /// Already a string
    Identity,
    /// A format alias wrapping a string
    Format,
    /// Anything else, through the JSON encoder
    Encoded,
}

impl Stringifier {
    pub fn for_type(ty: &TypeExpr) -> Self {
        match ty {
            TypeExpr::Optional(inner) | TypeExpr::Deferred(inner) => Self::for_type(inner),
            TypeExpr::Integer(_) => Self::Integer,
            TypeExpr::Number(_) => Self::Number,
            TypeExpr::Boolean => Self::Boolean,
            TypeExpr::String => Self::Identity,
            TypeExpr::Format(_) => Self::Format,
            _ => Self::Encoded,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json {
        ident: String,
        ty: TypeExpr,
        content_type: String,
    },
    /// No body is sent
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCase {
    pub status: u16,
    pub payload: TypeExpr,
}

impl ResponseCase {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Error type with one case per declared error status
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorType {
    pub ident: String,
    pub cases: Vec<ErrorCase>,
    /// Case for statuses nobody declared
    pub unknown_ident: String,
}

impl ErrorType {
    pub fn case_for(&self, status: u16) -> Option<&ErrorCase> {
        self.cases.iter().find(|c| c.status == status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCase {
    pub ident: String,
    pub status: u16,
    pub payload: ErrorPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// Decoded into a declared schema
    Typed(TypeExpr),
    /// Body kept as text
    Raw,
}

/// Shared connection settings for every operation
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfiguration {
    pub base_url: String,
    pub credentials: Vec<Credential>,
    pub custom_headers: Vec<(String, String)>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub kind: CredentialKind,
    pub ident: String,
}

/// Binder output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundOperations {
    pub operations: Vec<OperationBinding>,
    pub config: ClientConfiguration,
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            base_url: crate::bind::auth::DEFAULT_BASE_URL.to_string(),
            credentials: Vec::new(),
            custom_headers: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfiguration {
    pub fn credential(&self, kind: CredentialKind) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.kind == kind)
    }
}
