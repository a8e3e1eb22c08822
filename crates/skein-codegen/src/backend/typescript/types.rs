use super::{doc_comment, literal, ts_type};
use crate::synth::{DeclKind, StructDecl, TypeDecl, TypeExpr};

/// Type declaration for one synthesized type
pub(super) fn declaration(decl: &TypeDecl) -> String {
    let name = decl.ident.as_str();
    let doc = doc_comment(decl.doc.as_deref(), "");

    match &decl.kind {
        DeclKind::Struct(s) => format!("{doc}{}", interface(name, s)),
        DeclKind::Enum(e) => {
            if e.cases.is_empty() {
                return format!(
                    "{doc}export type {name} = never;\n\nexport const {name} = {{}} as const;"
                );
            }
            let raws: Vec<String> = e.cases.iter().map(|c| literal(&c.raw)).collect();
            let mut out = format!("{doc}export type {name} = {};\n\n", raws.join(" | "));
            out.push_str(&format!("export const {name} = {{\n"));
            for (case, raw) in e.cases.iter().zip(&raws) {
                out.push_str(&format!("  {}: {raw},\n", case.ident));
            }
            out.push_str("} as const;");
            out
        }
        DeclKind::TaggedUnion(u) => {
            let variants = u.variants.iter().map(|v| (v.ident.as_str(), &v.ty));
            format!("{doc}{}", tagged(name, variants))
        }
        DeclKind::UntaggedUnion(u) => {
            let variants = u.variants.iter().map(|v| (v.ident.as_str(), &v.ty));
            format!("{doc}{}", tagged(name, variants))
        }
        DeclKind::Conditional(c) => {
            let variants = [
                ("Then", &c.then_ty),
                ("Else", &c.else_ty),
                ("Unknown", &TypeExpr::Json),
            ];
            format!(
                "{doc}/** Decoded as the `then` branch, else the `else` branch, else kept raw */\n{}",
                tagged(name, variants.into_iter())
            )
        }
        DeclKind::Alias(ty) | DeclKind::Newtype(ty) => {
            format!("{doc}export type {name} = {};", ts_type(ty))
        }
        DeclKind::Constant(value) => {
            let raw = value.to_string();
            let assertion = if value.is_null() { "" } else { " as const" };
            format!(
                "{doc}/** Singleton matching exactly one JSON value */\n\
                 export const {name} = {raw}{assertion};\n\n\
                 export type {name} = typeof {name};"
            )
        }
        DeclKind::Placeholder(reason) => {
            let note = format!("skein: could not be generated: {reason}");
            format!("{doc}{}export type {name} = Json;", doc_comment(Some(&note), ""))
        }
    }
}

fn interface(name: &str, s: &StructDecl) -> String {
    let mut out = format!("export interface {name} {{\n");
    for f in &s.fields {
        out.push_str(&doc_comment(f.doc.as_deref(), "  "));
        match (&f.ty, f.required) {
            (TypeExpr::Optional(inner), false) => {
                out.push_str(&format!("  {}?: {};\n", f.ident, ts_type(inner)));
            }
            (ty, false) => out.push_str(&format!("  {}?: {};\n", f.ident, ts_type(ty))),
            (ty, true) => out.push_str(&format!("  {}: {};\n", f.ident, ts_type(ty))),
        }
    }
    if let Some(a) = &s.additional {
        out.push_str("  /** Properties not declared by the schema */\n");
        out.push_str(&format!("  {}: JsonMap<{}>;\n", a.ident, ts_type(&a.value)));
    }
    out.push('}');
    out
}

/// `{ kind; value }` wrapper union
fn tagged<'a>(name: &str, variants: impl Iterator<Item = (&'a str, &'a TypeExpr)>) -> String {
    let arms: Vec<String> = variants
        .map(|(ident, ty)| format!("  | {{ kind: {}; value: {} }}", literal(ident), ts_type(ty)))
        .collect();
    if arms.is_empty() {
        return format!("export type {name} = never;");
    }
    format!("export type {name} =\n{};", arms.join("\n"))
}
