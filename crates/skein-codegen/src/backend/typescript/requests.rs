//! Client configuration, error unions and `fetch`-based request functions

use super::{decoder_expr, doc_comment, encoder_expr, literal, ts_type};
use crate::bind::{
    AuthStep, BoundParameter, ClientConfiguration, ErrorPayload, ErrorType, OperationBinding,
    PathPart, RequestBody, Stringifier,
};
use crate::synth::TypeExpr;

pub(super) fn client_config(config: &ClientConfiguration) -> String {
    let mut fields = String::from("  baseUrl: string;\n");
    let mut defaults = format!("    baseUrl: {},\n", literal(&config.base_url));
    for c in &config.credentials {
        fields.push_str(&format!("  {}: string;\n", c.ident));
        defaults.push_str(&format!("    {}: {},\n", c.ident, literal(c.kind.placeholder())));
    }
    let headers: Vec<String> = config
        .custom_headers
        .iter()
        .map(|(name, value)| format!("[{}, {}]", literal(name), literal(value)))
        .collect();
    defaults.push_str(&format!("    customHeaders: [{}],\n", headers.join(", ")));
    defaults.push_str(&format!("    timeoutMs: {},\n", config.timeout_secs * 1000));

    format!(
        "/** Connection settings shared by every request function */\n\
         export interface ClientConfig {{\n\
         {fields}\
         \x20 /** Sent with every request */\n\
         \x20 customHeaders: Array<[string, string]>;\n\
         \x20 timeoutMs: number;\n\
         }}\n\n\
         export function defaultClientConfig(): ClientConfig {{\n\
         \x20 return {{\n\
         {defaults}\
         \x20 }};\n\
         }}"
    )
}

pub(super) fn error_type(error: &ErrorType) -> String {
    let mut arms: Vec<String> = error
        .cases
        .iter()
        .map(|case| {
            let kind = literal(&case.ident);
            match &case.payload {
                ErrorPayload::Typed(ty) => format!(
                    "  | {{ kind: {kind}; status: {}; value: {} }}",
                    case.status,
                    ts_type(ty)
                ),
                ErrorPayload::Raw => {
                    format!("  | {{ kind: {kind}; status: {}; body: string }}", case.status)
                }
            }
        })
        .collect();
    arms.push(format!(
        "  | {{ kind: {}; status: number; body: string }}",
        literal(&error.unknown_ident)
    ));
    format!(
        "/** Declared error statuses of one operation */\nexport type {} =\n{};",
        error.ident,
        arms.join("\n")
    )
}

/// Signature and body of one request function
pub(super) fn operation(op: &OperationBinding, config: &ClientConfiguration) -> (String, String) {
    let mut doc = op.summary.clone().unwrap_or_default();
    if !doc.is_empty() {
        doc.push_str("\n\n");
    }
    doc.push_str(&format!("`{}`", op.label));
    if op.deprecated {
        doc.push_str("\n@deprecated");
    }

    let mut params = vec!["config: ClientConfig".to_string()];
    params.extend(op.parameters.iter().map(|p| format!("{}: {}", p.ident, ts_type(&p.ty))));
    if let RequestBody::Json { ident, ty, .. } = &op.body {
        params.push(format!("{ident}: {}", ts_type(ty)));
    }
    let failure = match &op.error_type {
        Some(error) => format!("OperationError<{}>", error.ident),
        None => "TransportError".to_string(),
    };
    let signature = format!(
        "{}export async function {}(\n{}\n): Promise<Result<{}, {failure}>>",
        doc_comment(Some(&doc), ""),
        op.function_name,
        params.iter().map(|p| format!("  {p},")).collect::<Vec<_>>().join("\n"),
        ts_type(&op.success),
    );
    (signature, statements(op, config))
}

fn statements(op: &OperationBinding, config: &ClientConfiguration) -> String {
    let mut out = String::from(
        "{\n  const url = new URL(config.baseUrl);\n  const segments: string[] = [];\n",
    );
    for segment in &op.path_segments {
        let pieces: Vec<String> = segment
            .parts
            .iter()
            .map(|part| match part {
                PathPart::Literal(text) => literal(text),
                PathPart::Param { ident, .. } => stringify(op, ident),
            })
            .collect();
        out.push_str(&format!("  segments.push({});\n", pieces.join(" + ")));
    }
    out.push_str(
        "  url.pathname = [url.pathname.replace(/\\/+$/, \"\"), ...segments.map(encodeURIComponent)].join(\"/\");\n",
    );

    for p in op.query_params() {
        let key = literal(&p.name);
        out.push_str(&optional_step(p, |value| {
            format!("url.searchParams.append({key}, {value});")
        }));
    }

    out.push_str("  const headers: { [name: string]: string } = {};\n");
    for step in &op.auth {
        let Some(credential) = config.credential(step.credential()) else {
            continue;
        };
        let field = &credential.ident;
        let line = match step {
            AuthStep::ApiKeyHeader { header } => {
                format!("  headers[{}] = config.{field};\n", literal(header))
            }
            AuthStep::Bearer => {
                format!("  headers[\"Authorization\"] = \"Bearer \" + config.{field};\n")
            }
            AuthStep::Basic => {
                format!("  headers[\"Authorization\"] = \"Basic \" + config.{field};\n")
            }
        };
        out.push_str(&line);
    }
    out.push_str(
        "  for (const [name, value] of config.customHeaders) {\n    headers[name] = value;\n  }\n",
    );
    for p in op.header_params() {
        let name = literal(&p.name);
        out.push_str(&optional_step(p, |value| format!("headers[{name}] = {value};")));
    }

    let payload = match &op.body {
        RequestBody::Json {
            ident: body,
            ty,
            content_type,
        } => {
            let content_type = literal(content_type);
            match ty {
                TypeExpr::Optional(inner) => out.push_str(&format!(
                    "  let payload: string | undefined;\n\
                     \x20 if ({body} !== undefined) {{\n\
                     \x20   headers[\"Content-Type\"] = {content_type};\n\
                     \x20   payload = JSON.stringify({}({body}));\n\
                     \x20 }}\n",
                    encoder_expr(inner)
                )),
                ty => out.push_str(&format!(
                    "  headers[\"Content-Type\"] = {content_type};\n\
                     \x20 const payload = JSON.stringify({}({body}));\n",
                    encoder_expr(ty)
                )),
            }
            "payload"
        }
        RequestBody::Empty => "undefined",
    };

    let typed = op.error_type.is_some();
    let transport = |error: &str| {
        if typed {
            format!("return transportFailure({error});")
        } else {
            format!("return {{ ok: false, error: {error} }};")
        }
    };
    out.push_str(&format!(
        "  const sent = await send(url, {}, headers, {payload}, config.timeoutMs);\n\
         \x20 if (!sent.ok) {{\n\
         \x20   {}\n\
         \x20 }}\n\
         \x20 const {{ status, text }} = sent.value;\n\
         \x20 try {{\n\
         \x20   switch (status) {{\n",
        literal(&op.method.to_string()),
        transport("sent.error"),
    ));
    out.push_str(&dispatch(op, &transport));
    out.push_str(&format!(
        "    }}\n\
         \x20 }} catch (error) {{\n\
         \x20   {}\n\
         \x20 }}\n\
         }}",
        transport("{ kind: \"decode\", status, message: String(error) }")
    ));
    out
}

/// Switch arms over every declared status
fn dispatch(op: &OperationBinding, transport: &dyn Fn(&str) -> String) -> String {
    let mut out = String::new();
    let empty: Vec<u16> = op.empty_statuses().collect();
    let ok_statuses: Vec<u16> = op
        .success_statuses()
        .map(|r| r.status)
        .filter(|status| !empty.contains(status))
        .collect();
    if !ok_statuses.is_empty() {
        for status in &ok_statuses {
            out.push_str(&format!("      case {status}:\n"));
        }
        out.push_str(&format!(
            "        return {{ ok: true, value: readBody(text, {}) }};\n",
            decoder_expr(&op.success)
        ));
    }
    if !empty.is_empty() {
        for status in &empty {
            out.push_str(&format!("      case {status}:\n"));
        }
        out.push_str("        return { ok: true, value: undefined };\n");
    }

    let Some(error) = &op.error_type else {
        out.push_str(&format!(
            "      default:\n        {}\n",
            transport("{ kind: \"status\", status, body: text }")
        ));
        return out;
    };

    let api = |payload: String| {
        format!("return {{ ok: false, error: {{ kind: \"api\", error: {payload} }} }};")
    };
    for case in &error.cases {
        let kind = literal(&case.ident);
        let payload = match &case.payload {
            ErrorPayload::Typed(ty) => format!(
                "{{ kind: {kind}, status, value: readBody(text, {}) }}",
                decoder_expr(ty)
            ),
            ErrorPayload::Raw => format!("{{ kind: {kind}, status, body: text }}"),
        };
        out.push_str(&format!("      case {}:\n        {}\n", case.status, api(payload)));
    }
    let unknown = format!("{{ kind: {}, status, body: text }}", literal(&error.unknown_ident));
    out.push_str(&format!("      default:\n        {}\n", api(unknown)));
    out
}

/// Text of a required parameter, by identifier
fn stringify(op: &OperationBinding, param: &str) -> String {
    match op.parameters.iter().find(|p| p.ident == param) {
        Some(p) => text_of(p, param),
        None => format!("String({param})"),
    }
}

fn text_of(p: &BoundParameter, value: &str) -> String {
    match p.stringifier {
        Stringifier::Encoded => {
            let inner = match &p.ty {
                TypeExpr::Optional(inner) => inner,
                ty => ty,
            };
            format!("paramText({}({value}))", encoder_expr(inner))
        }
        Stringifier::Integer
        | Stringifier::Number
        | Stringifier::Boolean
        | Stringifier::Identity
        | Stringifier::Format => format!("String({value})"),
    }
}

/// Run `step` with the parameter's text, skipping absent optional values
fn optional_step(p: &BoundParameter, step: impl Fn(String) -> String) -> String {
    let action = step(text_of(p, &p.ident));
    if p.ty.is_optional() {
        format!("  if ({} !== undefined) {{\n    {action}\n  }}\n", p.ident)
    } else {
        format!("  {action}\n")
    }
}
