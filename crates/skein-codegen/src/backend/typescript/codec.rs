//! `decodeX` / `encodeX` function pairs

use super::{decoder_expr, encoder_expr, literal};
use crate::synth::{DeclKind, TypeDecl, TypeExpr};

pub(super) fn decoder(decl: &TypeDecl) -> String {
    let name = decl.ident.as_str();
    let type_name = literal(name);
    let body = match &decl.kind {
        DeclKind::Struct(s) => {
            let known: Vec<String> = s.fields.iter().map(|f| literal(&f.wire_name)).collect();
            let mut fields = Vec::new();
            for f in &s.fields {
                let key = literal(&f.wire_name);
                let line = if f.required {
                    format!("field(object, {type_name}, {key}, {})", decoder_expr(&f.ty))
                } else {
                    format!("optionalField(object, {key}, {})", decoder_expr(unwrap_optional(&f.ty)))
                };
                fields.push(format!("    {}: {line},", f.ident));
            }
            if let Some(a) = &s.additional {
                fields.push(format!(
                    "    {}: additional(object, [{}], {}),",
                    a.ident,
                    known.join(", "),
                    decoder_expr(&a.value)
                ));
            }
            if fields.is_empty() {
                format!("  expectObject(value, {type_name});\n  return {{}};")
            } else {
                format!(
                    "  const object = expectObject(value, {type_name});\n  return {{\n{}\n  }};",
                    fields.join("\n")
                )
            }
        }
        DeclKind::Enum(e) => {
            let mut out = String::from("  switch (value) {\n");
            for case in &e.cases {
                out.push_str(&format!("    case {}:\n", literal(&case.raw)));
            }
            if !e.cases.is_empty() {
                out.push_str(&format!("      return value as {name};\n"));
            }
            out.push_str(&format!(
                "    default:\n      throw new DecodeError({type_name}, \"unknown value \" + JSON.stringify(value));\n  }}"
            ));
            out
        }
        DeclKind::TaggedUnion(u) => {
            let field = literal(&u.field);
            let mut out = format!(
                "  const object = expectObject(value, {type_name});\n\
                 \x20 const tag = object[{field}];\n\
                 \x20 if (tag === undefined) {{\n\
                 \x20   throw new DecodeError({type_name}, {});\n\
                 \x20 }}\n\
                 \x20 switch (tag) {{\n",
                literal(&format!("missing field `{}`", u.field))
            );
            for v in u.variants.iter().filter(|v| !v.tags.is_empty()) {
                for tag in &v.tags {
                    out.push_str(&format!("    case {}:\n", literal(tag)));
                }
                out.push_str(&format!(
                    "      return {{ kind: {}, value: {}(value) }};\n",
                    literal(&v.ident),
                    decoder_expr(&v.ty)
                ));
            }
            out.push_str(&format!(
                "    default:\n      throw new DecodeError({type_name}, {} + JSON.stringify(tag));\n  }}",
                literal(&format!("unknown `{}` discriminator ", u.field))
            ));
            out
        }
        DeclKind::UntaggedUnion(u) => {
            let mut out = String::new();
            for v in &u.variants {
                out.push_str(&attempt(&v.ident, &v.ty));
            }
            out.push_str(&format!("  throw new DecodeError({type_name}, \"no variant matched\");"));
            out
        }
        DeclKind::Conditional(c) => {
            let mut out = attempt("Then", &c.then_ty);
            out.push_str(&attempt("Else", &c.else_ty));
            out.push_str("  return { kind: \"Unknown\", value };");
            out
        }
        DeclKind::Constant(_) => format!(
            "  if (JSON.stringify(value) !== JSON.stringify({name})) {{\n\
             \x20   throw new DecodeError({type_name}, \"constant mismatch\");\n\
             \x20 }}\n\
             \x20 return {name};"
        ),
        DeclKind::Alias(ty) | DeclKind::Newtype(ty) => {
            format!("  return {}(value);", decoder_expr(ty))
        }
        DeclKind::Placeholder(_) => "  return decodeJson(value);".to_string(),
    };
    format!("export function decode{name}(value: Json): {name} {{\n{body}\n}}")
}

pub(super) fn encoder(decl: &TypeDecl) -> String {
    let name = decl.ident.as_str();
    let body = match &decl.kind {
        DeclKind::Struct(s) => {
            let mut out = String::from("  const object: { [key: string]: Json } = {};\n");
            for f in &s.fields {
                let key = literal(&f.wire_name);
                if f.required {
                    out.push_str(&format!(
                        "  object[{key}] = {}(value.{});\n",
                        encoder_expr(&f.ty),
                        f.ident
                    ));
                } else {
                    out.push_str(&format!(
                        "  if (value.{field} !== undefined) {{\n    object[{key}] = {}(value.{field});\n  }}\n",
                        encoder_expr(unwrap_optional(&f.ty)),
                        field = f.ident
                    ));
                }
            }
            if let Some(a) = &s.additional {
                out.push_str(&format!(
                    "  for (const [key, item] of Object.entries(value.{})) {{\n    object[key] = {}(item);\n  }}\n",
                    a.ident,
                    encoder_expr(&a.value)
                ));
            }
            out.push_str("  return object;");
            out
        }
        DeclKind::Enum(_) => "  return value;".to_string(),
        DeclKind::TaggedUnion(u) => {
            let field = literal(&u.field);
            let arms = u.variants.iter().map(|v| {
                let encoded = format!("{}(value.value)", encoder_expr(&v.ty));
                match v.tags.first() {
                    Some(tag) => format!(
                        "    case {}:\n      return withTag({encoded}, {field}, {});",
                        literal(&v.ident),
                        literal(tag)
                    ),
                    None => format!("    case {}:\n      return {encoded};", literal(&v.ident)),
                }
            });
            switch_on_kind(arms.collect())
        }
        DeclKind::UntaggedUnion(u) => {
            let arms = u.variants.iter().map(|v| {
                format!(
                    "    case {}:\n      return {}(value.value);",
                    literal(&v.ident),
                    encoder_expr(&v.ty)
                )
            });
            switch_on_kind(arms.collect())
        }
        DeclKind::Conditional(c) => switch_on_kind(vec![
            format!("    case \"Then\":\n      return {}(value.value);", encoder_expr(&c.then_ty)),
            format!("    case \"Else\":\n      return {}(value.value);", encoder_expr(&c.else_ty)),
            "    case \"Unknown\":\n      return value.value;".to_string(),
        ]),
        DeclKind::Constant(_) => "  return JSON.parse(JSON.stringify(value)) as Json;".to_string(),
        DeclKind::Alias(ty) | DeclKind::Newtype(ty) => {
            format!("  return {}(value);", encoder_expr(ty))
        }
        DeclKind::Placeholder(_) => "  return encodeJson(value);".to_string(),
    };
    format!("export function encode{name}(value: {name}): Json {{\n{body}\n}}")
}

/// Try one variant, falling through to the next on failure
fn attempt(variant: &str, ty: &TypeExpr) -> String {
    format!(
        "  try {{\n    return {{ kind: {}, value: {}(value) }};\n  }} catch {{\n    // next variant\n  }}\n",
        literal(variant),
        decoder_expr(ty)
    )
}

fn switch_on_kind(arms: Vec<String>) -> String {
    if arms.is_empty() {
        return "  return value;".to_string();
    }
    format!("  switch (value.kind) {{\n{}\n  }}", arms.join("\n"))
}

fn unwrap_optional(ty: &TypeExpr) -> &TypeExpr {
    match ty {
        TypeExpr::Optional(inner) => inner,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportSet;
    use crate::synth::{
        AdditionalField, ConditionalDecl, FieldDecl, IntWidth, StructDecl, TaggedUnionDecl,
        TaggedVariant,
    };

    fn decl(ident: &str, kind: DeclKind) -> TypeDecl {
        TypeDecl {
            ident: ident.to_string(),
            schema_name: ident.to_string(),
            from_document: true,
            complex: false,
            doc: None,
            kind,
            imports: ImportSet::new(),
        }
    }

    #[test]
    fn struct_codec_pair() {
        let user = decl(
            "User",
            DeclKind::Struct(StructDecl {
                fields: vec![
                    FieldDecl {
                        wire_name: "id".into(),
                        ident: "id".into(),
                        ty: TypeExpr::Integer(IntWidth::I64),
                        required: true,
                        doc: None,
                    },
                    FieldDecl {
                        wire_name: "display_name".into(),
                        ident: "displayName".into(),
                        ty: TypeExpr::String.optional(),
                        required: false,
                        doc: None,
                    },
                ],
                additional: Some(AdditionalField {
                    ident: "additionalProperties".into(),
                    value: TypeExpr::Json,
                }),
            }),
        );
        let decode = decoder(&user);
        assert!(decode.starts_with("export function decodeUser(value: Json): User {"));
        assert!(decode.contains("id: field(object, \"User\", \"id\", decodeInteger),"));
        assert!(decode.contains("displayName: optionalField(object, \"display_name\", decodeString),"));
        assert!(decode.contains(
            "additionalProperties: additional(object, [\"id\", \"display_name\"], decodeJson),"
        ));

        let encode = encoder(&user);
        assert!(encode.starts_with("export function encodeUser(value: User): Json {"));
        assert!(encode.contains("object[\"id\"] = encodeInteger(value.id);"));
        assert!(encode.contains("if (value.displayName !== undefined) {"));
        assert!(encode.contains("object[key] = encodeJson(item);"));
    }

    #[test]
    fn tagged_union_dispatches_on_the_discriminator() {
        let pet = decl(
            "Pet",
            DeclKind::TaggedUnion(TaggedUnionDecl {
                field: "petType".into(),
                variants: vec![TaggedVariant {
                    ident: "Cat".into(),
                    ty: TypeExpr::Named("Cat".into()),
                    tags: vec!["kitty".into(), "cat".into()],
                }],
            }),
        );
        let decode = decoder(&pet);
        assert!(decode.contains("const tag = object[\"petType\"];"));
        assert!(decode.contains("    case \"kitty\":\n    case \"cat\":\n      return { kind: \"Cat\", value: decodeCat(value) };"));
        assert!(decode.contains("\"unknown `petType` discriminator \" + JSON.stringify(tag)"));

        let encode = encoder(&pet);
        assert!(encode.contains("return withTag(encodeCat(value.value), \"petType\", \"kitty\");"));
    }

    #[test]
    fn conditional_keeps_unknown_values() {
        let cond = decl(
            "Shape",
            DeclKind::Conditional(ConditionalDecl {
                then_ty: TypeExpr::Named("Circle".into()),
                else_ty: TypeExpr::Named("Square".into()),
            }),
        );
        let decode = decoder(&cond);
        assert!(decode.contains("return { kind: \"Then\", value: decodeCircle(value) };"));
        assert!(decode.contains("return { kind: \"Unknown\", value };"));
        assert!(encoder(&cond).contains("case \"Unknown\":\n      return value.value;"));
    }
}
