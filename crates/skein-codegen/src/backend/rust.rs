//! Rust backend
//!
//! Declarations are built as token streams with `quote!`, parsed back into
//! a `syn::File` and pretty-printed one item group at a time. The emitted
//! code depends on `serde_json` for values and `reqwest` for transport.

mod codec;
mod requests;
mod runtime;
mod types;

use super::profile::{LanguageProfile, RUST};
use super::{Backend, Validation, fallback_sections};
use crate::assemble::{ModuleContext, ModuleUnit, UnitRole};
use crate::synth::TypeExpr;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::{BTreeMap, BTreeSet};

pub const TEMPLATE: &str = include_str!("../../templates/rust.tera");

#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_extension(&self) -> &'static str {
        "rs"
    }

    fn default_module_prefix(&self) -> &'static str {
        "api"
    }

    fn module_separator(&self) -> &'static str {
        "::"
    }

    fn profile(&self) -> &'static LanguageProfile {
        &RUST
    }

    fn default_template(&self) -> &'static str {
        TEMPLATE
    }

    fn generate_types(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.decls().map(types::declaration).collect()
    }

    fn generate_decoders(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.decls()
            .filter(|decl| decl.has_codec())
            .map(codec::decoder)
            .collect()
    }

    fn generate_encoders(&self, ctx: &ModuleContext<'_>) -> Vec<String> {
        ctx.decls()
            .filter(|decl| decl.has_codec())
            .map(codec::encoder)
            .collect()
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
        match &ctx.plan.role {
            UnitRole::Root { submodules } => {
                for name in submodules {
                    let module = ident(name);
                    lines.insert(
                        name.clone(),
                        format_items(quote! { pub mod #module; pub use #module::*; }, name),
                    );
                }
            }
            UnitRole::Types | UnitRole::Operations => {
                lines.insert("super".to_string(), "use super::*;".to_string());
            }
            UnitRole::Single => {}
        }
        lines
    }

    fn validate_output(&self, unit: &ModuleUnit, source: &str) -> Validation {
        let mut validation = Validation::ok();
        let file = match syn::parse_file(source) {
            Ok(file) => file,
            Err(err) => {
                validation.problem(format!("does not parse as Rust: {err}"));
                return validation;
            }
        };

        let mut decoders: BTreeSet<String> = BTreeSet::new();
        let mut encoders: BTreeSet<String> = BTreeSet::new();
        let mut items: BTreeSet<String> = BTreeSet::new();
        for item in &file.items {
            match item {
                syn::Item::Impl(imp) => {
                    let Some((_, path, _)) = &imp.trait_ else {
                        continue;
                    };
                    let Some(trait_name) = path.segments.last().map(|s| s.ident.to_string())
                    else {
                        continue;
                    };
                    let self_ty = type_key(&imp.self_ty);
                    let seen = match trait_name.as_str() {
                        "Decode" => &mut decoders,
                        "Encode" => &mut encoders,
                        _ => continue,
                    };
                    if !seen.insert(self_ty.clone()) {
                        validation.problem(format!("duplicate {trait_name} impl for {self_ty}"));
                    }
                }
                syn::Item::Struct(s) => {
                    items.insert(s.ident.to_string());
                }
                syn::Item::Trait(t) => {
                    items.insert(t.ident.to_string());
                }
                _ => {}
            }
        }

        for missing in decoders.symmetric_difference(&encoders) {
            validation.problem(format!("{missing} has only one of Decode and Encode"));
        }
        if matches!(unit.role, UnitRole::Single | UnitRole::Root { .. }) {
            for expected in ["Decode", "Encode"] {
                if !items.contains(expected) {
                    validation.problem(format!("runtime trait {expected} is missing"));
                }
            }
        }
        if matches!(unit.role, UnitRole::Single | UnitRole::Operations)
            && !items.contains("ClientConfig")
        {
            validation.problem("ClientConfig is missing");
        }
        validation
    }

    fn fallback_module(&self, unit: &ModuleUnit) -> String {
        let mut out = String::from(
            "// @generated by skein. DO NOT EDIT.\n// Rendered with the minimal fallback template.\n\n\
             #![allow(dead_code, unused_imports, non_camel_case_types, clippy::all)]\n\n\
             use std::collections::BTreeMap;\nuse serde_json::Value;\n"
        );
        if unit.imports.contains(crate::imports::Import::Http) {
            out.push_str("use std::time::Duration;\nuse reqwest::Url;\n");
        }
        for section in fallback_sections(unit) {
            out.push('\n');
            out.push_str(section);
            out.push('\n');
        }
        out
    }
}

/// A valid Rust identifier for an already-escaped name
pub(crate) fn ident(name: &str) -> syn::Ident {
    if let Ok(ident) = syn::parse_str::<syn::Ident>(name) {
        return ident;
    }
    let mut clean: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if clean.is_empty() || clean == "_" {
        clean = "unnamed".to_string();
    }
    if clean.starts_with(|c: char| c.is_ascii_digit()) {
        clean.insert(0, '_');
    }
    match syn::parse_str::<syn::Ident>(&clean) {
        Ok(ident) => ident,
        Err(_) => format_ident!("{}_", clean),
    }
}

/// Tokens for a type expression, spelled through the profile table
pub(crate) fn type_tokens(ty: &TypeExpr) -> TokenStream {
    let spelled = RUST.render_type(ty);
    match syn::parse_str::<syn::Type>(&spelled) {
        Ok(ty) => quote! { #ty },
        Err(_) => quote! { Value },
    }
}

/// `#[doc]` attributes for an optional description
pub(crate) fn doc_attrs(doc: Option<&str>) -> TokenStream {
    let Some(doc) = doc else {
        return quote! {};
    };
    let lines = doc.lines().map(|line| format!(" {}", line.trim_end()));
    quote! { #(#[doc = #lines])* }
}

/// Pretty-print a group of items
///
/// Tokens that don't form valid items become a comment naming `what`, so
/// one bad declaration never takes the module down with it.
pub(crate) fn format_items(tokens: TokenStream, what: &str) -> String {
    match syn::parse2::<syn::File>(tokens) {
        Ok(file) => space_items(&prettyplease::unparse(&file)),
        Err(err) => {
            tracing::warn!(item = %what, "generated tokens did not parse: {err}");
            format!("// skein: {what} could not be rendered: {err}")
        }
    }
}

/// Blank line after each top-level item
fn space_items(formatted: &str) -> String {
    let lines: Vec<&str> = formatted.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        out.push(*line);
        if (*line == "}" || line.starts_with("pub type "))
            && lines.get(i + 1).is_some_and(|next| !next.is_empty())
        {
            out.push("");
        }
    }
    out.join("\n")
}

fn type_key(ty: &syn::Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}
