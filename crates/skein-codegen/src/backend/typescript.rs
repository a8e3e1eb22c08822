//! TypeScript backend
//!
//! Emits plain strings: interfaces and union types, `decodeX` / `encodeX`
//! function pairs over a `Json` value type, and `fetch`-based request
//! functions returning a `Result` union. No packages are required at the
//! use site beyond the DOM `fetch` and `URL` globals.

mod codec;
mod requests;
mod runtime;
mod types;

use super::profile::{LanguageProfile, TYPESCRIPT};
use super::{Backend, Validation, fallback_sections};
use crate::assemble::{ModuleContext, ModuleUnit, UnitRole};
use crate::synth::TypeExpr;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

pub const TEMPLATE: &str = include_str!("../../templates/typescript.tera");

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptBackend;

impl Backend for TypeScriptBackend {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn default_module_prefix(&self) -> &'static str {
        "api"
    }

    fn module_separator(&self) -> &'static str {
        "/"
    }

    fn profile(&self) -> &'static LanguageProfile {
        &TYPESCRIPT
    }

    fn default_template(&self) -> &'static str {
        TEMPLATE
    }

    fn generate_types(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.decls().map(types::declaration).collect()
    }

    // Aliases and placeholders get forwarding codecs here, since other
    // declarations call `decodeX` by name
    fn generate_decoders(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.decls().map(codec::decoder).collect()
    }

    fn generate_encoders(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.decls().map(codec::encoder).collect()
    }

    fn generate_error_types(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.operations()
            .filter_map(|op| op.error_type.as_ref())
            .map(requests::error_type)
            .collect()
    }

    fn generate_config(&self, ctx: &ModuleContext<'_>) -> String {
        requests::client_config(&ctx.bound.config)
    }

    fn generate_requests(&self, ctx: &ModuleContext<'_>) -> Vec<(String, String)> {
        ctx.operations()
            .map(|op| requests::operation(op, &ctx.bound.config))
            .collect()
    }

    fn generate_runtime(&self, ctx: &ModuleContext<'_>) -> String {
        runtime::runtime(ctx.runtime_imports)
    }

    fn import_lines(&self, ctx: &ModuleContext<'_>) -> BTreeMap<String, String> {
        let mut lines = BTreeMap::new();
        let prefix = ctx.module_prefix;
        match &ctx.plan.role {
            UnitRole::Root { submodules } => {
                for name in submodules {
                    let from = literal(&format!("./{prefix}/{name}"));
                    lines.insert(name.clone(), format!("export * from {from};"));
                }
            }
            UnitRole::Types | UnitRole::Operations => {
                let names = runtime::exported_names(ctx.runtime_imports).join(", ");
                let from = literal(&format!("../{prefix}"));
                lines.insert("..".to_string(), format!("import {{ {names} }} from {from};"));
                for (module, idents) in &ctx.plan.dependencies {
                    let names = idents
                        .iter()
                        .map(|ident| format!("{ident}, decode{ident}, encode{ident}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let from = literal(&format!("./{module}"));
                    lines.insert(module.clone(), format!("import {{ {names} }} from {from};"));
                }
            }
            UnitRole::Single => {}
        }
        lines
    }

    fn validate_output(&self, unit: &ModuleUnit, source: &str) -> Validation {
        let mut validation = Validation::ok();
        if let Err(problem) = check_delimiters(source) {
            validation.problem(problem);
            return validation;
        }

        let mut decoders = BTreeSet::new();
        let mut encoders = BTreeSet::new();
        for line in source.lines() {
            let Some(rest) = line.strip_prefix("export function ") else {
                continue;
            };
            let name: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            let (seen, ty) = if let Some(ty) = name.strip_prefix("decode") {
                (&mut decoders, ty.to_string())
            } else if let Some(ty) = name.strip_prefix("encode") {
                (&mut encoders, ty.to_string())
            } else {
                continue;
            };
            if !seen.insert(ty) {
                validation.problem(format!("duplicate function {name}"));
            }
        }
        for missing in decoders.symmetric_difference(&encoders) {
            validation.problem(format!("{missing} has only one of decode and encode"));
        }

        if matches!(unit.role, UnitRole::Single | UnitRole::Root { .. })
            && !source.contains("export class DecodeError")
        {
            validation.problem("runtime class DecodeError is missing");
        }
        if matches!(unit.role, UnitRole::Single | UnitRole::Operations)
            && !source.contains("export interface ClientConfig")
        {
            validation.problem("ClientConfig is missing");
        }
        validation
    }

    fn fallback_module(&self, unit: &ModuleUnit) -> String {
        let mut out = String::from(
            "// @generated by skein. DO NOT EDIT.\n\
             // Rendered with the minimal fallback template.\n\n/* eslint-disable */\n",
        );
        for section in fallback_sections(unit) {
            out.push('\n');
            out.push_str(section);
            out.push('\n');
        }
        out
    }
}

/// Double-quoted string literal
pub(crate) fn literal(text: &str) -> String {
    Value::String(text.to_owned()).to_string()
}

pub(crate) fn ts_type(ty: &TypeExpr) -> String {
    TYPESCRIPT.render_type(ty)
}

/// Decoder expression for a type use-site
pub(crate) fn decoder_expr(ty: &TypeExpr) -> String {
    codec_expr(ty, "decode")
}

/// Encoder expression for a type use-site
pub(crate) fn encoder_expr(ty: &TypeExpr) -> String {
    codec_expr(ty, "encode")
}

fn codec_expr(ty: &TypeExpr, verb: &str) -> String {
    match ty {
        TypeExpr::String => format!("{verb}String"),
        TypeExpr::Integer(_) => format!("{verb}Integer"),
        TypeExpr::Number(_) => format!("{verb}Number"),
        TypeExpr::Boolean => format!("{verb}Boolean"),
        TypeExpr::Format(format) => format!("{verb}{}", format.type_name()),
        TypeExpr::Named(name) => format!("{verb}{name}"),
        TypeExpr::Array(inner) => format!("{verb}Array({})", codec_expr(inner, verb)),
        TypeExpr::Map(inner) => format!("{verb}Map({})", codec_expr(inner, verb)),
        TypeExpr::Optional(inner) => format!("{verb}Optional({})", codec_expr(inner, verb)),
        TypeExpr::Deferred(inner) => format!("{verb}Lazy(() => {})", codec_expr(inner, verb)),
        TypeExpr::Json => format!("{verb}Json"),
        TypeExpr::Unit => format!("{verb}Null"),
    }
}

/// JSDoc block, or nothing
pub(crate) fn doc_comment(doc: Option<&str>, indent: &str) -> String {
    let Some(doc) = doc.filter(|d| !d.trim().is_empty()) else {
        return String::new();
    };
    let mut out = format!("{indent}/**\n");
    for line in doc.lines() {
        let line = line.trim_end().replace("*/", "*\\/");
        if line.is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {line}\n"));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

/// Brackets, braces and parens balance outside strings and comments
fn check_delimiters(source: &str) -> Result<(), String> {
    #[derive(PartialEq)]
    enum State {
        Code,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut state = State::Code;
    let mut stack = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' | '\'' | '`' => state = State::Quoted(c),
                '/' if chars.peek() == Some(&'/') => state = State::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '{' | '(' | '[' => stack.push(c),
                '}' | ')' | ']' => {
                    let open = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    if stack.pop() != Some(open) {
                        return Err(format!("unbalanced `{c}`"));
                    }
                }
                _ => {}
            },
            State::Quoted(quote) => match c {
                '\\' => {
                    chars.next();
                }
                c if c == quote => state = State::Code,
                _ => {}
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }
    match stack.last() {
        Some(open) => Err(format!("unclosed `{open}`")),
        None if matches!(state, State::Quoted(_) | State::BlockComment) => {
            Err("unterminated string or comment".to_string())
        }
        None => Ok(()),
    }
}
