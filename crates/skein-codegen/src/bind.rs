//! Operation binding
//!
//! Turns each path + method into an [`OperationBinding`]: a function name,
//! typed parameters, a request body plan, a status dispatch table and the
//! auth headers to attach. Binding is target-neutral except for identifier
//! spelling, which goes through the [`LanguageProfile`].
//!
//! Issues recorded here:
//! - [`Issue::MissingOperationField`] for a missing `operationId`, missing
//!   `responses`, or a path placeholder with no declared parameter
//! - [`Issue::UnresolvedReference`] for parameter, body or response refs
//!   that point nowhere
//! - [`Issue::UnsupportedSchemaConstruct`] for form and non-JSON bodies

pub mod auth;
pub mod ir;

pub use auth::{AuthStep, CredentialKind, DEFAULT_BASE_URL};
pub use ir::{
    BoundOperations, BoundParameter, ClientConfiguration, Credential, ErrorCase, ErrorPayload,
    ErrorType, OperationBinding, ParamLocation, PathPart, PathSegment, RequestBody, ResponseCase,
    Stringifier,
};

use crate::backend::profile::LanguageProfile;
use crate::diagnostics::{Diagnostics, Issue, Outcome};
use crate::document::{
    self, Document, HttpMethod, Operation, Parameter, ParameterLocation, PathItem, RefOr, Response,
};
use crate::imports::{Import, ImportSet};
use crate::resolve::{ResolvedSchemas, SchemaKind, SchemaNode, SchemaResolver, Scope};
use crate::synth::{NameRegistry, SynthesizedTypes, TypeExpr};
use regex::Regex;
use std::sync::LazyLock;

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("path parameter pattern"));

/// Identifiers generated request functions use for their own locals
const RESERVED_LOCALS: &[&str] = &[
    "config", "body", "url", "client", "request", "response", "status", "text", "segments",
    "segment", "headers", "payload", "sent",
];

/// Settings copied onto the generated client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDefaults {
    pub timeout_secs: u64,
    pub headers: Vec<(String, String)>,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            headers: Vec::new(),
        }
    }
}

/// Name used when an operation has no `operationId`: the lower-cased
/// method followed by each path segment capitalized, braces dropped
pub fn fallback_name(method: HttpMethod, path: &str) -> String {
    let mut name = method.as_str().to_string();
    for segment in path.split('/') {
        let mut chars = segment.chars().filter(|c| c.is_alphanumeric());
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.extend(chars);
        }
    }
    name
}

pub struct OperationBinder<'a> {
    doc: &'a Document,
    resolver: SchemaResolver<'a>,
    resolved: &'a ResolvedSchemas,
    types: &'a SynthesizedTypes,
    profile: &'a LanguageProfile,
    defaults: &'a ClientDefaults,
}

impl<'a> OperationBinder<'a> {
    pub fn new(
        doc: &'a Document,
        resolved: &'a ResolvedSchemas,
        types: &'a SynthesizedTypes,
        profile: &'a LanguageProfile,
        defaults: &'a ClientDefaults,
    ) -> Self {
        Self {
            doc,
            resolver: SchemaResolver::new(doc),
            resolved,
            types,
            profile,
            defaults,
        }
    }

    /// Bind every operation in document order
    ///
    /// Error type names are claimed from `type_names` so they never collide
    /// with synthesized declarations.
    pub fn bind_all(&self, type_names: &mut NameRegistry) -> Outcome<BoundOperations> {
        let mut diags = Diagnostics::new();
        let mut functions =
            NameRegistry::with_reserved(self.profile.reserved_functions.iter().copied());
        let operations: Vec<_> = self
            .doc
            .operations()
            .map(|(path, item, method, op)| {
                self.bind(path, item, method, op, &mut functions, type_names, &mut diags)
            })
            .collect();
        tracing::debug!(operations = operations.len(), "bound operations");

        Outcome::new(
            BoundOperations {
                operations,
                config: self.client_configuration(),
            },
            diags,
        )
    }

    fn client_configuration(&self) -> ClientConfiguration {
        ClientConfiguration {
            base_url: auth::base_url(self.doc),
            credentials: auth::credential_kinds(self.doc)
                .into_iter()
                .map(|kind| Credential {
                    kind,
                    ident: self.profile.field_name(kind.field()),
                })
                .collect(),
            custom_headers: self.defaults.headers.clone(),
            timeout_secs: self.defaults.timeout_secs,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn bind(
        &self,
        path: &str,
        item: &PathItem,
        method: HttpMethod,
        op: &Operation,
        functions: &mut NameRegistry,
        type_names: &mut NameRegistry,
        diags: &mut Diagnostics,
    ) -> OperationBinding {
        let label = format!("{method} {path}");
        let raw_name = match op.operation_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let fallback = fallback_name(method, path);
                diags.push(Issue::missing_field(&label, "operationId", &fallback));
                fallback
            }
        };
        let function_name = functions.claim(&self.profile.function_name(&raw_name));

        let mut locals = NameRegistry::with_reserved(RESERVED_LOCALS.iter().copied());
        let mut body = RequestBody::Empty;
        let mut parameters = Vec::new();

        for param in self.merged_parameters(item, op, &label, diags) {
            match param.location {
                ParameterLocation::Body => {
                    let schema = param.effective_schema();
                    let scope = Scope::hint("body", format!("{label}.body"));
                    let node = self.resolver.resolve(&schema, &scope, diags);
                    body = self.json_body(&node, param.required, "application/json");
                }
                ParameterLocation::FormData => {
                    diags.push(Issue::unsupported(
                        format!("form parameter `{}`", param.name),
                        &label,
                    ));
                }
                ParameterLocation::Cookie => {
                    tracing::debug!(
                        operation = %label,
                        parameter = %param.name,
                        "skipping cookie parameter"
                    );
                }
                location => {
                    let bound = self.bind_parameter(param, location, &mut locals, &label, diags);
                    parameters.push(bound);
                }
            }
        }

        let path_segments = self.path_segments(path, &mut parameters, &mut locals, &label, diags);

        if let Some(request_body) = &op.request_body {
            body = self.request_body(request_body, &label, diags);
        }

        let responses = self.responses(op, &label, diags);
        let mut success = responses
            .iter()
            .find(|r| r.status == 200)
            .or_else(|| responses.iter().find(|r| r.status == 201))
            .or_else(|| responses.iter().find(|r| r.is_success()))
            .map(|r| r.payload.clone())
            .unwrap_or(TypeExpr::Json);
        // a no-content 2xx next to a typed one answers with an absent value
        if success != TypeExpr::Unit
            && responses.iter().any(|r| r.is_success() && r.payload == TypeExpr::Unit)
        {
            success = success.optional();
        }

        let error_type = self.error_type(&raw_name, &responses, type_names);

        let mut imports: ImportSet = [Import::Http, Import::Url, Import::Decode]
            .into_iter()
            .collect();
        for param in &parameters {
            param.ty.declare_imports(&mut imports);
            if param.stringifier == Stringifier::Encoded {
                imports.insert(Import::Encode);
            }
        }
        if let RequestBody::Json { ty, .. } = &body {
            imports.insert(Import::Encode);
            ty.declare_imports(&mut imports);
        }
        success.declare_imports(&mut imports);
        for case in error_type.iter().flat_map(|e| e.cases.iter()) {
            if let ErrorPayload::Typed(ty) = &case.payload {
                ty.declare_imports(&mut imports);
            }
        }

        OperationBinding {
            function_name,
            label,
            method,
            path: path.to_string(),
            path_segments,
            parameters,
            body,
            responses,
            success,
            error_type,
            auth: auth::operation_auth(self.doc, op),
            summary: op.summary.clone().or_else(|| op.description.clone()),
            deprecated: op.deprecated,
            imports,
        }
    }

    /// Path-level parameters overlaid by operation-level ones with the same
    /// name and location
    fn merged_parameters<'p>(
        &'p self,
        item: &'p PathItem,
        op: &'p Operation,
        label: &str,
        diags: &mut Diagnostics,
    ) -> Vec<&'p Parameter> {
        let mut merged: Vec<&Parameter> = Vec::new();
        for param in item.parameters.iter().chain(op.parameters.iter().flatten()) {
            let Some(resolved) = self.doc.parameter(param) else {
                if let RefOr::Ref { reference } = param {
                    diags.push(Issue::unresolved(reference, label));
                }
                continue;
            };
            match merged
                .iter_mut()
                .find(|p| p.name == resolved.name && p.location == resolved.location)
            {
                Some(slot) => *slot = resolved,
                None => merged.push(resolved),
            }
        }
        merged
    }

    fn bind_parameter(
        &self,
        param: &Parameter,
        location: ParameterLocation,
        locals: &mut NameRegistry,
        label: &str,
        diags: &mut Diagnostics,
    ) -> BoundParameter {
        let location = match location {
            ParameterLocation::Path => ParamLocation::Path,
            ParameterLocation::Header => ParamLocation::Header,
            _ => ParamLocation::Query,
        };
        let required = param.required || location == ParamLocation::Path;
        let schema = param.effective_schema();
        let scope = Scope::hint(&param.name, format!("{label}.{}", param.name));
        let node = self.resolver.resolve(&schema, &scope, diags);
        let ty = self.parameter_type(&node);
        BoundParameter {
            name: param.name.clone(),
            ident: locals.claim(&self.profile.field_name(&param.name)),
            location,
            stringifier: Stringifier::for_type(&ty),
            ty: if required { ty } else { ty.optional() },
            required,
            doc: param.description.clone(),
        }
    }

    /// Inline enums are sent as plain strings rather than opaque JSON
    fn parameter_type(&self, node: &SchemaNode) -> TypeExpr {
        match &node.kind {
            SchemaKind::Enum(_) => TypeExpr::String,
            SchemaKind::Array(element) if matches!(element.kind, SchemaKind::Enum(_)) => {
                TypeExpr::Array(Box::new(TypeExpr::String))
            }
            _ => self.types.use_site(node, self.resolved),
        }
    }

    fn path_segments(
        &self,
        path: &str,
        parameters: &mut Vec<BoundParameter>,
        locals: &mut NameRegistry,
        label: &str,
        diags: &mut Diagnostics,
    ) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            let mut parts = Vec::new();
            let mut last = 0;
            for captures in PATH_PARAM.captures_iter(raw) {
                let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                if whole.start() > last {
                    parts.push(PathPart::Literal(raw[last..whole.start()].to_string()));
                }
                last = whole.end();

                let name = name.as_str();
                let existing = parameters
                    .iter()
                    .find(|p| p.location == ParamLocation::Path && p.name == name);
                let ident = match existing {
                    Some(param) => param.ident.clone(),
                    None => {
                        diags.push(Issue::missing_field(
                            label,
                            format!("declaration for path parameter `{name}`"),
                            "a string parameter",
                        ));
                        let ident = locals.claim(&self.profile.field_name(name));
                        parameters.push(BoundParameter {
                            name: name.to_string(),
                            ident: ident.clone(),
                            location: ParamLocation::Path,
                            ty: TypeExpr::String,
                            required: true,
                            stringifier: Stringifier::Identity,
                            doc: None,
                        });
                        ident
                    }
                };
                parts.push(PathPart::Param {
                    name: name.to_string(),
                    ident,
                });
            }
            if last < raw.len() {
                parts.push(PathPart::Literal(raw[last..].to_string()));
            }
            segments.push(PathSegment { parts });
        }
        segments
    }

    fn request_body(
        &self,
        body: &RefOr<document::RequestBody>,
        label: &str,
        diags: &mut Diagnostics,
    ) -> RequestBody {
        let Some(body) = self.doc.request_body(body) else {
            if let RefOr::Ref { reference } = body {
                diags.push(Issue::unresolved(reference, label));
            }
            return RequestBody::Empty;
        };
        let json = body
            .content
            .iter()
            .find(|(media, _)| document::is_json_media_type(media));
        match json {
            Some((media, media_type)) => {
                let node = match &media_type.schema {
                    Some(schema) => self.resolver.resolve(
                        schema,
                        &Scope::hint("body", format!("{label}.requestBody")),
                        diags,
                    ),
                    None => SchemaNode::any(),
                };
                let content_type = if media.contains('*') {
                    "application/json"
                } else {
                    media.as_str()
                };
                self.json_body(&node, body.required, content_type)
            }
            None if body.content.is_empty() => RequestBody::Empty,
            None => {
                let media: Vec<_> = body.content.keys().map(String::as_str).collect();
                diags.push(Issue::unsupported(
                    format!("request body media types [{}]", media.join(", ")),
                    label,
                ));
                RequestBody::Empty
            }
        }
    }

    fn json_body(&self, node: &SchemaNode, required: bool, content_type: &str) -> RequestBody {
        let ty = self.types.use_site(node, self.resolved);
        RequestBody::Json {
            ident: "body".to_string(),
            ty: if required { ty } else { ty.optional() },
            content_type: content_type.to_string(),
        }
    }

    fn responses(&self, op: &Operation, label: &str, diags: &mut Diagnostics) -> Vec<ResponseCase> {
        let Some(responses) = op.responses.as_ref().filter(|r| !r.is_empty()) else {
            diags.push(Issue::missing_field(label, "responses", "an untyped JSON success"));
            return Vec::new();
        };

        let mut cases = Vec::new();
        for (key, response) in responses {
            let Ok(status) = key.parse::<u16>() else {
                if key != "default" {
                    tracing::debug!(operation = label, status = %key, "skipping status range");
                }
                continue;
            };
            let payload = match self.doc.response(response) {
                Some(response) => self.response_payload(response, status, label, diags),
                None => {
                    if let RefOr::Ref { reference } = response {
                        diags.push(Issue::unresolved(reference, label));
                    }
                    TypeExpr::Json
                }
            };
            cases.push(ResponseCase { status, payload });
        }
        cases
    }

    fn response_payload(
        &self,
        response: &Response,
        status: u16,
        label: &str,
        diags: &mut Diagnostics,
    ) -> TypeExpr {
        let schema = document::json_schema(&response.content).or(response.schema.as_ref());
        match schema {
            Some(schema) => {
                let scope = Scope::hint("response", format!("{label}.responses.{status}"));
                let node = self.resolver.resolve(schema, &scope, diags);
                self.types.use_site(&node, self.resolved)
            }
            None if response.content.is_empty() => TypeExpr::Unit,
            None => TypeExpr::Json,
        }
    }

    fn error_type(
        &self,
        raw_name: &str,
        responses: &[ResponseCase],
        type_names: &mut NameRegistry,
    ) -> Option<ErrorType> {
        let errors: Vec<_> = responses.iter().filter(|r| r.is_error()).collect();
        if errors.is_empty() {
            return None;
        }
        let mut case_names = NameRegistry::new();
        let cases = errors
            .into_iter()
            .map(|r| ErrorCase {
                ident: case_names.claim(&self.profile.variant_name(&format!("status{}", r.status))),
                status: r.status,
                payload: if r.payload.named().is_empty() {
                    ErrorPayload::Raw
                } else {
                    ErrorPayload::Typed(r.payload.clone())
                },
            })
            .collect();
        Some(ErrorType {
            ident: type_names.claim(&self.profile.type_name(&format!("{raw_name} error"))),
            unknown_ident: case_names.claim(&self.profile.variant_name("unknown")),
            cases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::profile::{RUST, TYPESCRIPT};
    use crate::diagnostics::IssueKind;
    use crate::synth::TypeSynthesizer;

    fn bind_with(json: &str, profile: &LanguageProfile) -> (BoundOperations, Diagnostics) {
        let doc: Document = serde_json::from_str(json).expect("parse document");
        let mut diags = Diagnostics::new();
        let resolved = SchemaResolver::new(&doc).resolve_all().drain_into(&mut diags);
        let mut types = TypeSynthesizer::new(&resolved, profile, &diags)
            .synthesize()
            .drain_into(&mut Diagnostics::new());
        let mut names = std::mem::take(&mut types.names);
        let defaults = ClientDefaults {
            timeout_secs: 45,
            headers: vec![("X-Client".into(), "skein".into())],
        };
        let bound = OperationBinder::new(&doc, &resolved, &types, profile, &defaults)
            .bind_all(&mut names)
            .drain_into(&mut diags);
        (bound, diags)
    }

    fn bind(json: &str) -> (BoundOperations, Diagnostics) {
        bind_with(json, &RUST)
    }

    const USERS: &str = r##"{
        "openapi": "3.0.0",
        "servers": [{"url": "https://api.example.com/v1"}],
        "paths": {
            "/users/{id}": {
                "get": {
                    "operationId": "getUser",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}},
                        {"name": "expand", "in": "query", "schema": {"type": "boolean"}},
                        {"name": "X-Trace", "in": "header", "schema": {"type": "string"}}
                    ],
                    "responses": {
                        "200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}},
                        "404": {"description": "missing"}
                    }
                }
            }
        },
        "components": {"schemas": {"User": {"type": "object", "properties": {"id": {"type": "integer"}}}}}
    }"##;

    #[test]
    fn binds_get_user() {
        let (bound, diags) = bind(USERS);
        assert!(diags.is_empty(), "{diags:?}");
        let op = &bound.operations[0];
        assert_eq!(op.function_name, "get_user");
        assert_eq!(op.method, HttpMethod::Get);
        assert_eq!(op.success, TypeExpr::Named("User".into()));

        let params: Vec<_> = op
            .parameters
            .iter()
            .map(|p| (p.ident.as_str(), p.location, p.stringifier))
            .collect();
        assert_eq!(
            params,
            vec![
                ("id", ParamLocation::Path, Stringifier::Integer),
                ("expand", ParamLocation::Query, Stringifier::Boolean),
                ("x_trace", ParamLocation::Header, Stringifier::Identity),
            ]
        );
        assert!(op.parameters[1].ty.is_optional());
        assert_eq!(
            op.path_segments[1].parts,
            vec![PathPart::Param {
                name: "id".into(),
                ident: "id".into()
            }]
        );

        let error = op.error_type.as_ref().expect("error type");
        assert_eq!(error.ident, "GetUserError");
        assert_eq!(error.cases[0].ident, "Status404");
        assert_eq!(error.cases[0].payload, ErrorPayload::Raw);
        assert_eq!(error.unknown_ident, "Unknown");
        assert_eq!(op.body, RequestBody::Empty);

        assert_eq!(bound.config.base_url, "https://api.example.com/v1");
        assert_eq!(bound.config.timeout_secs, 45);
        assert!(op.imports.contains(Import::Http));
    }

    #[test]
    fn missing_operation_id_falls_back_deterministically() {
        let doc = r#"{"openapi": "3.0.0", "paths": {
            "/users/{id}": {"get": {"responses": {"200": {"description": "ok"}}}}
        }}"#;
        let (first, diags) = bind_with(doc, &TYPESCRIPT);
        let (second, _) = bind_with(doc, &TYPESCRIPT);
        assert_eq!(first.operations[0].function_name, "getUsersId");
        assert_eq!(first.operations[0].function_name, second.operations[0].function_name);
        assert_eq!(diags.of_kind(IssueKind::MissingOperationField).count(), 2);
        // undeclared placeholder is still bound, as a string
        assert_eq!(first.operations[0].parameters[0].ty, TypeExpr::String);
        assert_eq!(first.operations[0].success, TypeExpr::Unit);
    }

    #[test]
    fn no_content_status_makes_success_optional() {
        let (bound, _) = bind(
            r##"{"openapi": "3.0.0", "paths": {"/latest": {"get": {
                "operationId": "latest",
                "responses": {
                    "200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}},
                    "204": {"description": "nothing yet"}
                }
            }}}, "components": {"schemas": {"User": {"type": "object"}}}}"##,
        );
        let op = &bound.operations[0];
        assert_eq!(op.success, TypeExpr::Named("User".into()).optional());
        assert_eq!(op.empty_statuses().collect::<Vec<_>>(), vec![204]);
    }

    #[test]
    fn cookie_parameters_are_left_out() {
        let (bound, diags) = bind(
            r#"{"openapi": "3.0.0", "paths": {"/me": {"get": {
                "operationId": "me",
                "parameters": [
                    {"name": "session", "in": "cookie", "schema": {"type": "string"}},
                    {"name": "verbose", "in": "query", "schema": {"type": "boolean"}}
                ],
                "responses": {"204": {"description": "ok"}}
            }}}}"#,
        );
        let op = &bound.operations[0];
        let names: Vec<_> = op.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["verbose"]);
        assert_eq!(op.success, TypeExpr::Unit);
        assert_eq!(op.empty_statuses().count(), 0);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn duplicate_names_get_suffixes() {
        let (bound, _) = bind(
            r#"{"openapi": "3.0.0", "paths": {
                "/a": {"get": {"operationId": "list", "responses": {"200": {"description": "ok"}}}},
                "/b": {"get": {"operationId": "list", "responses": {"200": {"description": "ok"}}}}
            }}"#,
        );
        let names: Vec<_> = bound.operations.iter().map(|o| o.function_name.as_str()).collect();
        assert_eq!(names, vec!["list", "list2"]);
    }

    #[test]
    fn missing_responses_default_to_json() {
        let (bound, diags) = bind(
            r#"{"openapi": "3.0.0", "paths": {"/ping": {"post": {"operationId": "ping"}}}}"#,
        );
        let op = &bound.operations[0];
        assert_eq!(op.success, TypeExpr::Json);
        assert!(op.error_type.is_none());
        assert_eq!(diags.of_kind(IssueKind::MissingOperationField).count(), 1);
    }

    #[test]
    fn swagger_body_parameter_and_typed_errors() {
        let (bound, _) = bind(
            r##"{"swagger": "2.0", "host": "pets.io", "paths": {"/pets": {"post": {
                "operationId": "addPet",
                "parameters": [{"name": "pet", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Pet"}}],
                "responses": {
                    "201": {"description": "created", "schema": {"$ref": "#/definitions/Pet"}},
                    "422": {"description": "invalid", "schema": {"$ref": "#/definitions/Problem"}}
                }
            }}}, "definitions": {
                "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
                "Problem": {"type": "object", "properties": {"detail": {"type": "string"}}}
            }}"##,
        );
        let op = &bound.operations[0];
        assert_eq!(
            op.body,
            RequestBody::Json {
                ident: "body".into(),
                ty: TypeExpr::Named("Pet".into()),
                content_type: "application/json".into(),
            }
        );
        assert_eq!(op.success, TypeExpr::Named("Pet".into()));
        let error = op.error_type.as_ref().expect("error type");
        assert_eq!(
            error.cases[0].payload,
            ErrorPayload::Typed(TypeExpr::Named("Problem".into()))
        );
        assert_eq!(bound.config.base_url, "https://pets.io");
    }

    #[test]
    fn parameter_idents_avoid_generated_locals() {
        let (bound, _) = bind(
            r#"{"openapi": "3.0.0", "paths": {"/search": {"get": {
                "operationId": "search",
                "parameters": [
                    {"name": "url", "in": "query", "schema": {"type": "string"}},
                    {"name": "status", "in": "query", "schema": {"type": "string", "enum": ["a", "b"]}}
                ],
                "responses": {"200": {"description": "ok"}}
            }}}}"#,
        );
        let op = &bound.operations[0];
        assert_eq!(op.parameters[0].ident, "url2");
        assert_eq!(op.parameters[1].ident, "status2");
        assert_eq!(op.parameters[1].ty, TypeExpr::String.optional());
    }

    #[test]
    fn error_type_names_do_not_collide_with_schemas() {
        let (bound, _) = bind(
            r#"{"openapi": "3.0.0", "paths": {"/x": {"get": {
                "operationId": "getThing",
                "responses": {"500": {"description": "boom"}}
            }}}, "components": {"schemas": {"GetThingError": {"type": "string"}}}}"#,
        );
        let error = bound.operations[0].error_type.as_ref().expect("error type");
        assert_eq!(error.ident, "GetThingError2");
        assert_eq!(bound.operations[0].success, TypeExpr::Json);
    }
}
