//! Input object model for OpenAPI 3.x and Swagger 2.0 documents
//!
//! Only the parts the generator reads are modeled. Unknown keys are ignored,
//! and every collection defaults to empty so partial documents still load.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{OneOrMany, formats::PreferOne, serde_as};
use std::borrow::Cow;
use std::fmt;

/// Security requirement: scheme name to scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A parsed API description
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub openapi: Option<String>,
    pub swagger: Option<String>,
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,

    // Swagger 2.0
    pub host: Option<String>,
    pub base_path: Option<String>,
    #[serde(default)]
    pub schemes: Vec<String>,
    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    #[serde(default)]
    pub security_definitions: IndexMap<String, SecurityScheme>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerVariable {
    pub default: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default)]
    pub request_bodies: IndexMap<String, RequestBody>,
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    #[serde(default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

/// Either an inline value or a `$ref` to one declared in components
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

impl PathItem {
    /// Declared operations in a fixed method order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Options, &self.options),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Trace, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// A single path + method
///
/// `operationId`, `parameters` and `responses` stay optional so the binder
/// can tell "absent or null" apart from "empty" and report it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub parameters: Option<Vec<RefOr<Parameter>>>,
    pub request_body: Option<RefOr<RequestBody>>,
    pub responses: Option<IndexMap<String, RefOr<Response>>>,
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub consumes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ParameterLocation {
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "header")]
    Header,
    #[serde(rename = "cookie")]
    Cookie,
    #[serde(rename = "body")]
    Body,
    #[serde(rename = "formData")]
    FormData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<Schema>,

    // Swagger 2.0 non-body parameters carry their type inline
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub format: Option<String>,
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

impl Parameter {
    /// The parameter's schema, synthesized from inline Swagger fields when absent
    pub fn effective_schema(&self) -> Cow<'_, Schema> {
        match &self.schema {
            Some(schema) => Cow::Borrowed(schema),
            None => Cow::Owned(Schema {
                types: self.param_type.iter().cloned().collect(),
                format: self.format.clone(),
                items: self.items.clone(),
                enum_values: self.enum_values.clone(),
                ..Schema::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    /// Swagger 2.0 response body
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

/// Whether a media type carries JSON
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    essence == "application/json" || essence.ends_with("+json") || essence == "*/*"
}

/// Pick the JSON schema out of a content map
pub fn json_schema(content: &IndexMap<String, MediaType>) -> Option<&Schema> {
    content
        .iter()
        .find(|(media, _)| is_json_media_type(media))
        .and_then(|(_, media)| media.schema.as_ref())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub description: Option<String>,
}

/// A raw JSON Schema node, as written in the document
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde_as(as = "OneOrMany<_, PreferOne>")]
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, Schema>,
    #[serde(default)]
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const")]
    pub const_value: Option<Value>,
    pub one_of: Option<Vec<Schema>>,
    pub any_of: Option<Vec<Schema>>,
    pub all_of: Option<Vec<Schema>>,
    #[serde(rename = "if")]
    pub if_schema: Option<Box<Schema>>,
    #[serde(rename = "then")]
    pub then_schema: Option<Box<Schema>>,
    #[serde(rename = "else")]
    pub else_schema: Option<Box<Schema>>,
    pub discriminator: Option<Discriminator>,
    pub nullable: Option<bool>,
    #[serde(rename = "x-nullable")]
    pub x_nullable: Option<bool>,
    #[serde(default)]
    pub deprecated: bool,
}

impl Schema {
    /// Non-null entries of `type`
    pub fn concrete_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str).filter(|t| *t != "null")
    }

    /// Declared nullable by any of the three spellings
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
            || self.x_nullable.unwrap_or(false)
            || self.types.iter().any(|t| t == "null")
    }

    /// `{type: null}` and nothing else
    pub fn is_null_only(&self) -> bool {
        !self.types.is_empty() && self.types.iter().all(|t| t == "null")
    }

    pub fn has_type(&self, ty: &str) -> bool {
        self.types.iter().any(|t| t == ty)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

const SCHEMA_PREFIXES: &[&str] = &["#/components/schemas/", "#/definitions/"];
const PARAMETER_PREFIXES: &[&str] = &["#/components/parameters/", "#/parameters/"];
const RESPONSE_PREFIXES: &[&str] = &["#/components/responses/", "#/responses/"];
const REQUEST_BODY_PREFIXES: &[&str] = &["#/components/requestBodies/"];

/// Local name a reference points at, with JSON pointer escapes decoded
fn pointer_name(reference: &str, prefixes: &[&str]) -> Option<String> {
    prefixes
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
        .map(|rest| rest.replace("~1", "/").replace("~0", "~"))
}

impl Document {
    /// Named schemas, from `components.schemas` or Swagger `definitions`
    pub fn schemas(&self) -> &IndexMap<String, Schema> {
        if self.components.schemas.is_empty() {
            &self.definitions
        } else {
            &self.components.schemas
        }
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas().get(name)
    }

    pub fn security_schemes(&self) -> &IndexMap<String, SecurityScheme> {
        if self.components.security_schemes.is_empty() {
            &self.security_definitions
        } else {
            &self.components.security_schemes
        }
    }

    /// Schema name a `$ref` points at, if it is a local schema pointer
    pub fn schema_ref_name(reference: &str) -> Option<String> {
        pointer_name(reference, SCHEMA_PREFIXES)
    }

    pub fn parameter<'a>(&'a self, param: &'a RefOr<Parameter>) -> Option<&'a Parameter> {
        match param {
            RefOr::Item(p) => Some(p),
            RefOr::Ref { reference } => {
                let name = pointer_name(reference, PARAMETER_PREFIXES)?;
                self.components
                    .parameters
                    .get(&name)
                    .or_else(|| self.parameters.get(&name))
            }
        }
    }

    pub fn request_body<'a>(&'a self, body: &'a RefOr<RequestBody>) -> Option<&'a RequestBody> {
        match body {
            RefOr::Item(b) => Some(b),
            RefOr::Ref { reference } => {
                let name = pointer_name(reference, REQUEST_BODY_PREFIXES)?;
                self.components.request_bodies.get(&name)
            }
        }
    }

    pub fn response<'a>(&'a self, response: &'a RefOr<Response>) -> Option<&'a Response> {
        match response {
            RefOr::Item(r) => Some(r),
            RefOr::Ref { reference } => {
                let name = pointer_name(reference, RESPONSE_PREFIXES)?;
                self.components
                    .responses
                    .get(&name)
                    .or_else(|| self.responses.get(&name))
            }
        }
    }

    /// Every (path, path item, method, operation) in document order
    pub fn operations(&self) -> impl Iterator<Item = (&str, &PathItem, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .map(move |(method, op)| (path.as_str(), item, method, op))
        })
    }

    /// Candidate base URLs, with server variables substituted by their defaults
    pub fn base_urls(&self) -> Vec<String> {
        if !self.servers.is_empty() {
            return self
                .servers
                .iter()
                .map(|server| {
                    let mut url = server.url.clone();
                    for (name, var) in &server.variables {
                        url = url.replace(&format!("{{{name}}}"), &var.default);
                    }
                    url
                })
                .collect();
        }

        match &self.host {
            Some(host) => {
                let scheme = self
                    .schemes
                    .iter()
                    .find(|s| s.as_str() == "https")
                    .or_else(|| self.schemes.first())
                    .map(String::as_str)
                    .unwrap_or("https");
                let base_path = self.base_path.as_deref().unwrap_or("");
                vec![format!("{scheme}://{host}{base_path}")]
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_openapi_three() {
        let doc: Document = serde_json::from_str(
            r##"{
                "openapi": "3.1.0",
                "info": {"title": "Pets", "version": "1"},
                "servers": [{"url": "https://{region}.example.com/v1", "variables": {"region": {"default": "eu"}}}],
                "paths": {
                    "/pets/{id}": {
                        "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}],
                        "get": {
                            "operationId": "getPet",
                            "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}}
                        }
                    }
                },
                "components": {
                    "schemas": {
                        "Pet": {"type": "object", "properties": {"name": {"type": ["string", "null"]}}}
                    }
                }
            }"##,
        )
        .expect("parse");

        assert_eq!(doc.base_urls(), vec!["https://eu.example.com/v1".to_string()]);
        let (path, item, method, op) = doc.operations().next().expect("operation");
        assert_eq!(path, "/pets/{id}");
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(op.operation_id.as_deref(), Some("getPet"));

        let name = &doc.schema("Pet").expect("pet").properties["name"];
        assert!(name.is_nullable());
        assert_eq!(name.concrete_types().collect::<Vec<_>>(), vec!["string"]);
    }

    #[test]
    fn parses_swagger_two() {
        let doc: Document = serde_json::from_str(
            r##"{
                "swagger": "2.0",
                "host": "api.example.com",
                "basePath": "/v2",
                "schemes": ["http", "https"],
                "securityDefinitions": {"key": {"type": "apiKey", "name": "X-Key", "in": "header"}},
                "definitions": {"User": {"type": "object"}},
                "paths": {
                    "/users": {
                        "post": {
                            "parameters": [{"name": "body", "in": "body", "schema": {"$ref": "#/definitions/User"}}],
                            "responses": {"201": {"description": "created", "schema": {"$ref": "#/definitions/User"}}}
                        }
                    }
                }
            }"##,
        )
        .expect("parse");

        assert_eq!(doc.base_urls(), vec!["https://api.example.com/v2".to_string()]);
        assert!(doc.schema("User").is_some());
        assert_eq!(doc.security_schemes()["key"].name.as_deref(), Some("X-Key"));
        let (_, _, _, op) = doc.operations().next().expect("operation");
        let params = op.parameters.as_ref().expect("params");
        let body = doc.parameter(&params[0]).expect("body param");
        assert_eq!(body.location, ParameterLocation::Body);
    }

    #[test]
    fn schema_refs_decode_pointer_escapes() {
        assert_eq!(
            Document::schema_ref_name("#/components/schemas/User"),
            Some("User".to_string())
        );
        assert_eq!(
            Document::schema_ref_name("#/definitions/a~1b~0c"),
            Some("a/b~c".to_string())
        );
        assert_eq!(Document::schema_ref_name("other.yaml#/User"), None);
        assert_eq!(Document::schema_ref_name("#/components/schemas/"), None);
    }

    #[test]
    fn parameter_refs_resolve_through_components() {
        let doc: Document = serde_json::from_str(
            r##"{
                "openapi": "3.0.0",
                "paths": {},
                "components": {"parameters": {"Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}}}
            }"##,
        )
        .expect("parse");
        let param = RefOr::Ref {
            reference: "#/components/parameters/Limit".to_string(),
        };
        let resolved = doc.parameter(&param).expect("resolved");
        assert_eq!(resolved.name, "limit");
        assert_eq!(resolved.location, ParameterLocation::Query);
    }

    #[test]
    fn json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
        assert!(!is_json_media_type("application/octet-stream"));
    }
}
