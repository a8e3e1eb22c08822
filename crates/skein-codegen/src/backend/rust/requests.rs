//! Client configuration, error types and async request functions

use super::{doc_attrs, format_items, ident, type_tokens};
use crate::bind::{
    AuthStep, BoundParameter, ClientConfiguration, ErrorPayload, ErrorType, OperationBinding,
    PathPart, RequestBody, Stringifier,
};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

pub(super) fn client_config(config: &ClientConfiguration) -> String {
    let base_url = config.base_url.as_str();
    let timeout = config.timeout_secs;

    let fields = config.credentials.iter().map(|c| {
        let field = ident(&c.ident);
        quote! { pub #field: String }
    });
    let defaults = config.credentials.iter().map(|c| {
        let field = ident(&c.ident);
        let placeholder = c.kind.placeholder();
        quote! { #field: #placeholder.to_owned() }
    });
    let headers = config.custom_headers.iter().map(|(name, value)| {
        quote! { (#name.to_owned(), #value.to_owned()) }
    });

    let tokens = quote! {
        /// Connection settings shared by every request function
        #[derive(Debug, Clone, PartialEq)]
        pub struct ClientConfig {
            pub base_url: String,
            #(#fields,)*
            /// Sent with every request
            pub custom_headers: Vec<(String, String)>,
            pub timeout: Duration,
        }

        impl Default for ClientConfig {
            fn default() -> Self {
                Self {
                    base_url: #base_url.to_owned(),
                    #(#defaults,)*
                    custom_headers: vec![#(#headers),*],
                    timeout: Duration::from_secs(#timeout),
                }
            }
        }

        impl ClientConfig {
            pub fn client(&self) -> Result<reqwest::Client, TransportError> {
                reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(TransportError::from)
            }
        }
    };
    format_items(tokens, "ClientConfig")
}

pub(super) fn error_type(error: &ErrorType) -> String {
    let name = ident(&error.ident);
    let unknown = ident(&error.unknown_ident);
    let cases = error.cases.iter().map(|case| {
        let variant = ident(&case.ident);
        let doc = format!(" HTTP {}", case.status);
        match &case.payload {
            ErrorPayload::Typed(ty) => {
                let ty = type_tokens(ty);
                quote! { #[doc = #doc] #variant(#ty) }
            }
            ErrorPayload::Raw => quote! { #[doc = #doc] #variant { body: String } },
        }
    });
    let tokens = quote! {
        #[derive(Debug, Clone, PartialEq)]
        pub enum #name {
            #(#cases,)*
            /// A status the operation doesn't declare
            #unknown { status: u16, body: String },
        }
    };
    format_items(tokens, &error.ident)
}

/// Signature and body of one request function
pub(super) fn operation(op: &OperationBinding, config: &ClientConfiguration) -> (String, String) {
    let function = ident(&op.function_name);
    let params = op.parameters.iter().map(|p| {
        let name = ident(&p.ident);
        let ty = type_tokens(&p.ty);
        quote! { #name: #ty }
    });
    let body_param = match &op.body {
        RequestBody::Json { ident: body, ty, .. } => {
            let body = ident(body);
            let ty = type_tokens(ty);
            Some(quote! { #body: &#ty })
        }
        RequestBody::Empty => None,
    };
    let success = type_tokens(&op.success);
    let failure = match &op.error_type {
        Some(error) => {
            let error = ident(&error.ident);
            quote! { OperationError<#error> }
        }
        None => quote! { TransportError },
    };

    let mut doc = op.summary.clone().unwrap_or_default();
    if !doc.is_empty() {
        doc.push_str("\n\n");
    }
    doc.push_str(&format!("`{}`", op.label));
    let doc = doc_attrs(Some(&doc));
    let deprecated = op.deprecated.then(|| quote! { #[deprecated] });

    let statements = statements(op, config);
    let tokens = quote! {
        #doc
        #deprecated
        pub async fn #function(
            config: &ClientConfig,
            #(#params,)*
            #body_param
        ) -> Result<#success, #failure> {
            #statements
        }
    };

    let text = format_items(tokens, &op.function_name);
    // The body starts at the first brace after the return type
    let split = text.find("pub async fn").and_then(|start| {
        let arrow = start + text[start..].find(") -> ")?;
        Some(arrow + text[arrow..].find('{')?)
    });
    match split {
        Some(split) => (
            text[..split].trim_end().to_string(),
            text[split..].to_string(),
        ),
        None => (text, String::new()),
    }
}

fn statements(op: &OperationBinding, config: &ClientConfiguration) -> TokenStream {
    let method = format_ident!("{}", op.method.to_string());

    let pushes = op.path_segments.iter().map(|segment| {
        let pieces = segment.parts.iter().map(|part| match part {
            PathPart::Literal(text) => quote! { segment.push_str(#text); },
            PathPart::Param { ident: param, .. } => {
                let text = stringify(op, param);
                quote! { segment.push_str(&#text); }
            }
        });
        match segment.parts.as_slice() {
            [PathPart::Literal(text)] => quote! { segments.push(#text); },
            [PathPart::Param { ident: param, .. }] => {
                let text = stringify(op, param);
                quote! { segments.push(&#text); }
            }
            _ => quote! {
                let mut segment = String::new();
                #(#pieces)*
                segments.push(&segment);
            },
        }
    });

    let queries = op.query_params().map(|p| {
        let key = p.name.as_str();
        optional_step(p, |value| quote! { url.query_pairs_mut().append_pair(#key, &#value); })
    });

    let auth = op.auth.iter().filter_map(|step| {
        let field = ident(&config.credential(step.credential())?.ident);
        Some(match step {
            AuthStep::ApiKeyHeader { header } => {
                quote! { request = request.header(#header, config.#field.as_str()); }
            }
            AuthStep::Bearer => quote! {
                request = request.header("Authorization", format!("Bearer {}", config.#field));
            },
            AuthStep::Basic => quote! {
                request = request.header("Authorization", format!("Basic {}", config.#field));
            },
        })
    });

    let headers = op.header_params().map(|p| {
        let name = p.name.as_str();
        optional_step(p, |value| quote! { request = request.header(#name, #value); })
    });

    let body = match &op.body {
        RequestBody::Json {
            ident: body,
            ty,
            content_type,
        } => {
            let body = ident(body);
            let encode = if ty.is_optional() {
                quote! {
                    if let Some(body) = #body {
                        request = request
                            .header("Content-Type", #content_type)
                            .body(body.encode().to_string());
                    }
                }
            } else {
                quote! {
                    request = request
                        .header("Content-Type", #content_type)
                        .body(#body.encode().to_string());
                }
            };
            Some(encode)
        }
        RequestBody::Empty => None,
    };

    let dispatch = dispatch(op);
    quote! {
        let mut url = Url::parse(&config.base_url)
            .map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(config.base_url.clone()))?;
            segments.pop_if_empty();
            #(#pushes)*
        }
        #(#queries)*

        let client = config.client()?;
        let mut request = client.request(reqwest::Method::#method, url);
        #(#auth)*
        for (name, value) in &config.custom_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        #(#headers)*
        #body

        let response = request.send().await.map_err(TransportError::from)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(TransportError::from)?;
        #dispatch
    }
}

/// Text of a required parameter, by identifier
fn stringify(op: &OperationBinding, param: &str) -> TokenStream {
    let name = ident(param);
    match op.parameters.iter().find(|p| p.ident == param) {
        Some(p) => text_of(p.stringifier, quote! { #name }, false),
        None => quote! { #name.to_string() },
    }
}

/// `borrowed` values are already references
fn text_of(stringifier: Stringifier, value: TokenStream, borrowed: bool) -> TokenStream {
    match stringifier {
        Stringifier::Encoded if borrowed => quote! { param_text(#value) },
        Stringifier::Encoded => quote! { param_text(&#value) },
        Stringifier::Integer
        | Stringifier::Number
        | Stringifier::Boolean
        | Stringifier::Identity
        | Stringifier::Format => quote! { #value.to_string() },
    }
}

/// Run `step` with the parameter's text, skipping absent optional values
fn optional_step(p: &BoundParameter, step: impl Fn(TokenStream) -> TokenStream) -> TokenStream {
    let name = ident(&p.ident);
    if p.ty.is_optional() {
        let text = text_of(p.stringifier, quote! { value }, true);
        let action = step(text);
        quote! {
            if let Some(value) = &#name {
                #action
            }
        }
    } else {
        step(text_of(p.stringifier, quote! { #name }, false))
    }
}

/// One match over every declared status
fn dispatch(op: &OperationBinding) -> TokenStream {
    let success = type_tokens(&op.success);
    let mut arms = Vec::new();
    let empty: Vec<u16> = op.empty_statuses().collect();
    let ok_statuses: Vec<Literal> = op
        .success_statuses()
        .map(|r| r.status)
        .filter(|status| !empty.contains(status))
        .map(Literal::u16_unsuffixed)
        .collect();
    if !ok_statuses.is_empty() {
        arms.push(quote! {
            #(#ok_statuses)|* => Ok(decode_body::<#success>(status, &text)?)
        });
    }
    if !empty.is_empty() {
        let empty = empty.into_iter().map(Literal::u16_unsuffixed);
        arms.push(quote! { #(#empty)|* => Ok(None) });
    }

    let Some(error) = &op.error_type else {
        return quote! {
            match status {
                #(#arms,)*
                _ => Err(TransportError::Status { status, body: text }),
            }
        };
    };

    let error_name = ident(&error.ident);
    let unknown = ident(&error.unknown_ident);
    arms.extend(error.cases.iter().map(|case| {
        let status = Literal::u16_unsuffixed(case.status);
        let variant = ident(&case.ident);
        match &case.payload {
            ErrorPayload::Typed(ty) => {
                let ty = type_tokens(ty);
                quote! {
                    #status => Err(OperationError::Api(#error_name::#variant(
                        decode_body::<#ty>(status, &text)?,
                    )))
                }
            }
            ErrorPayload::Raw => quote! {
                #status => Err(OperationError::Api(#error_name::#variant { body: text }))
            },
        }
    }));
    quote! {
        match status {
            #(#arms,)*
            _ => Err(OperationError::Api(#error_name::#unknown { status, body: text })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{
        BoundParameter, CredentialKind, Credential, ErrorCase, ParamLocation, PathSegment,
        ResponseCase,
    };
    use crate::document::HttpMethod;
    use crate::imports::ImportSet;
    use crate::synth::{IntWidth, TypeExpr};

    fn get_user() -> OperationBinding {
        OperationBinding {
            function_name: "get_user".into(),
            label: "GET /users/{id}".into(),
            method: HttpMethod::Get,
            path: "/users/{id}".into(),
            path_segments: vec![
                PathSegment {
                    parts: vec![PathPart::Literal("users".into())],
                },
                PathSegment {
                    parts: vec![PathPart::Param {
                        name: "id".into(),
                        ident: "id".into(),
                    }],
                },
            ],
            parameters: vec![
                BoundParameter {
                    name: "id".into(),
                    ident: "id".into(),
                    location: ParamLocation::Path,
                    ty: TypeExpr::Integer(IntWidth::I64),
                    required: true,
                    stringifier: Stringifier::Integer,
                    doc: None,
                },
                BoundParameter {
                    name: "expand".into(),
                    ident: "expand".into(),
                    location: ParamLocation::Query,
                    ty: TypeExpr::Boolean.optional(),
                    required: false,
                    stringifier: Stringifier::Boolean,
                    doc: None,
                },
            ],
            body: RequestBody::Empty,
            responses: vec![
                ResponseCase {
                    status: 200,
                    payload: TypeExpr::Named("User".into()),
                },
                ResponseCase {
                    status: 404,
                    payload: TypeExpr::Unit,
                },
            ],
            success: TypeExpr::Named("User".into()),
            error_type: Some(ErrorType {
                ident: "GetUserError".into(),
                cases: vec![ErrorCase {
                    ident: "Status404".into(),
                    status: 404,
                    payload: ErrorPayload::Raw,
                }],
                unknown_ident: "Unknown".into(),
            }),
            auth: vec![AuthStep::Bearer],
            summary: Some("Fetch one user".into()),
            deprecated: false,
            imports: ImportSet::new(),
        }
    }

    fn config() -> ClientConfiguration {
        ClientConfiguration {
            credentials: vec![Credential {
                kind: CredentialKind::Bearer,
                ident: "bearer_token".into(),
            }],
            ..ClientConfiguration::default()
        }
    }

    #[test]
    fn request_function_shape() {
        let (signature, body) = operation(&get_user(), &config());
        assert!(signature.contains("pub async fn get_user("));
        assert!(signature.contains("config: &ClientConfig,"));
        assert!(signature.contains("id: i64,"));
        assert!(signature.contains("expand: Option<bool>,"));
        assert!(signature.contains("-> Result<User, OperationError<GetUserError>>"));
        assert!(body.starts_with('{'));
        assert!(body.contains("segments.push(\"users\");"));
        assert!(body.contains("segments.push(&id.to_string());"));
        assert!(body.contains("if let Some(value) = &expand {"));
        assert!(body.contains("reqwest::Method::GET"));
        assert!(body.contains("format!(\"Bearer {}\", config.bearer_token)"));
        assert!(body.contains("200 => Ok(decode_body::<User>(status, &text)?)"));
        assert!(body.contains("404 => Err(OperationError::Api(GetUserError::Status404 { body: text }))"));
        assert!(body.contains("GetUserError::Unknown { status, body: text }"));
    }

    #[test]
    fn error_type_has_unknown_case() {
        let text = error_type(get_user().error_type.as_ref().expect("error type"));
        assert!(text.contains("pub enum GetUserError {"));
        assert!(text.contains("Status404 { body: String },"));
        assert!(text.contains("Unknown { status: u16, body: String },"));
    }

    #[test]
    fn operation_without_error_statuses_uses_transport_error() {
        let mut op = get_user();
        op.error_type = None;
        let (signature, body) = operation(&op, &config());
        assert!(signature.contains("-> Result<User, TransportError>"));
        assert!(body.contains("_ => Err(TransportError::Status { status, body: text })"));
    }

    #[test]
    fn no_content_success_answers_none() {
        let mut op = get_user();
        op.responses.insert(
            1,
            ResponseCase {
                status: 204,
                payload: TypeExpr::Unit,
            },
        );
        op.success = TypeExpr::Named("User".into()).optional();
        let (signature, body) = operation(&op, &config());
        assert!(signature.contains("-> Result<Option<User>, OperationError<GetUserError>>"));
        assert!(body.contains("200 => Ok(decode_body::<Option<User>>(status, &text)?)"));
        assert!(body.contains("204 => Ok(None)"));
        assert!(!body.contains("200 | 204"));
    }

    #[test]
    fn config_defaults() {
        let text = client_config(&config());
        assert!(text.contains("pub struct ClientConfig {"));
        assert!(text.contains("pub bearer_token: String,"));
        assert!(text.contains("base_url: \"http://localhost\".to_owned(),"));
        assert!(text.contains("bearer_token: \"YOUR_BEARER_TOKEN\".to_owned(),"));
        assert!(text.contains("timeout: Duration::from_secs(30u64),"));
    }
}
