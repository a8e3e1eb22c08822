//! `Decode` / `Encode` impls
//!
//! Each declaration gets exactly one of each, and the encoder is the
//! inverse mapping of the decoder.

use super::{format_items, ident, type_tokens};
use crate::synth::{DeclKind, TypeDecl};
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn decoder(decl: &TypeDecl) -> String {
    let name = ident(&decl.ident);
    let type_name = decl.ident.as_str();
    let body = decode_body(decl, type_name);
    let tokens = quote! {
        impl Decode for #name {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                #body
            }
        }
    };
    format_items(tokens, &format!("Decode for {}", decl.ident))
}

pub(super) fn encoder(decl: &TypeDecl) -> String {
    let name = ident(&decl.ident);
    let body = encode_body(decl);
    let tokens = quote! {
        impl Encode for #name {
            fn encode(&self) -> Value {
                #body
            }
        }
    };
    format_items(tokens, &format!("Encode for {}", decl.ident))
}

fn decode_body(decl: &TypeDecl, type_name: &str) -> TokenStream {
    match &decl.kind {
        DeclKind::Struct(s) => {
            let known = s.fields.iter().map(|f| f.wire_name.as_str());
            let fields = s.fields.iter().map(|f| {
                let field = ident(&f.ident);
                let key = f.wire_name.as_str();
                if f.required {
                    quote! { #field: field(object, #type_name, #key)? }
                } else {
                    quote! { #field: optional_field(object, #key)? }
                }
            });
            let additional = s.additional.iter().map(|a| {
                let field = ident(&a.ident);
                let known = known.clone();
                quote! { #field: additional(object, &[#(#known),*])? }
            });
            let binding = if s.fields.is_empty() && s.additional.is_none() {
                quote! { expect_object(value, #type_name)?; }
            } else {
                quote! { let object = expect_object(value, #type_name)?; }
            };
            quote! {
                #binding
                Ok(Self {
                    #(#fields,)*
                    #(#additional,)*
                })
            }
        }
        DeclKind::Enum(e) => {
            let cases = e.cases.iter().map(|c| ident(&c.ident));
            let raws = e.cases.iter().map(|c| c.raw.as_str());
            quote! {
                match value.as_str() {
                    #(Some(#raws) => Ok(Self::#cases),)*
                    Some(other) => Err(DecodeError::UnknownEnumValue {
                        type_name: #type_name,
                        value: other.to_owned(),
                    }),
                    None => Err(DecodeError::unexpected(#type_name, value)),
                }
            }
        }
        DeclKind::TaggedUnion(u) => {
            let field = u.field.as_str();
            let arms = u.variants.iter().filter(|v| !v.tags.is_empty()).map(|v| {
                let variant = ident(&v.ident);
                let ty = type_tokens(&v.ty);
                let tags = v.tags.iter().map(String::as_str);
                quote! {
                    #(#tags)|* => Ok(Self::#variant(<#ty as Decode>::decode(value)?))
                }
            });
            quote! {
                let object = expect_object(value, #type_name)?;
                let tag = match object.get(#field) {
                    Some(Value::String(tag)) => tag.as_str(),
                    Some(other) => return Err(DecodeError::unexpected("string", other)),
                    None => {
                        return Err(DecodeError::MissingField {
                            type_name: #type_name,
                            field: #field,
                        })
                    }
                };
                match tag {
                    #(#arms,)*
                    other => Err(DecodeError::UnknownDiscriminator {
                        type_name: #type_name,
                        field: #field,
                        value: other.to_owned(),
                    }),
                }
            }
        }
        DeclKind::UntaggedUnion(u) => {
            let attempts = u.variants.iter().map(|v| {
                let variant = ident(&v.ident);
                let ty = type_tokens(&v.ty);
                quote! {
                    if let Ok(inner) = <#ty as Decode>::decode(value) {
                        return Ok(Self::#variant(inner));
                    }
                }
            });
            quote! {
                #(#attempts)*
                Err(DecodeError::NoMatchingVariant { type_name: #type_name })
            }
        }
        DeclKind::Conditional(c) => {
            let then_ty = type_tokens(&c.then_ty);
            let else_ty = type_tokens(&c.else_ty);
            quote! {
                if let Ok(inner) = <#then_ty as Decode>::decode(value) {
                    return Ok(Self::Then(inner));
                }
                if let Ok(inner) = <#else_ty as Decode>::decode(value) {
                    return Ok(Self::Else(inner));
                }
                Ok(Self::Unknown(value.clone()))
            }
        }
        DeclKind::Constant(_) => quote! {
            if *value == Self::value() {
                Ok(Self)
            } else {
                Err(DecodeError::ConstantMismatch { type_name: #type_name })
            }
        },
        DeclKind::Newtype(ty) => {
            let ty = type_tokens(ty);
            quote! { Ok(Self(<#ty as Decode>::decode(value)?)) }
        }
        DeclKind::Alias(_) | DeclKind::Placeholder(_) => quote! {
            Err(DecodeError::Malformed(format!("{} has no decoder", #type_name)))
        },
    }
}

fn encode_body(decl: &TypeDecl) -> TokenStream {
    match &decl.kind {
        DeclKind::Struct(s) => {
            if s.fields.is_empty() && s.additional.is_none() {
                return quote! { Value::Object(serde_json::Map::new()) };
            }
            let inserts = s.fields.iter().map(|f| {
                let field = ident(&f.ident);
                let key = f.wire_name.as_str();
                if f.required {
                    quote! { object.insert(#key.to_owned(), self.#field.encode()); }
                } else {
                    quote! {
                        if let Some(value) = &self.#field {
                            object.insert(#key.to_owned(), value.encode());
                        }
                    }
                }
            });
            let additional = s.additional.iter().map(|a| {
                let field = ident(&a.ident);
                quote! {
                    for (key, value) in &self.#field {
                        object.insert(key.clone(), value.encode());
                    }
                }
            });
            quote! {
                let mut object = serde_json::Map::new();
                #(#inserts)*
                #(#additional)*
                Value::Object(object)
            }
        }
        DeclKind::Enum(_) => quote! { Value::String(self.as_str().to_owned()) },
        DeclKind::TaggedUnion(u) => {
            if u.variants.is_empty() {
                return quote! { match *self {} };
            }
            let field = u.field.as_str();
            let arms = u.variants.iter().map(|v| {
                let variant = ident(&v.ident);
                match v.tags.first() {
                    Some(tag) => quote! {
                        Self::#variant(inner) => with_tag(inner.encode(), #field, #tag)
                    },
                    None => quote! { Self::#variant(inner) => inner.encode() },
                }
            });
            quote! {
                match self {
                    #(#arms,)*
                }
            }
        }
        DeclKind::UntaggedUnion(u) => {
            if u.variants.is_empty() {
                return quote! { match *self {} };
            }
            let arms = u.variants.iter().map(|v| {
                let variant = ident(&v.ident);
                quote! { Self::#variant(inner) => inner.encode() }
            });
            quote! {
                match self {
                    #(#arms,)*
                }
            }
        }
        DeclKind::Conditional(_) => quote! {
            match self {
                Self::Then(inner) => inner.encode(),
                Self::Else(inner) => inner.encode(),
                Self::Unknown(raw) => raw.clone(),
            }
        },
        DeclKind::Constant(_) => quote! { Self::value() },
        DeclKind::Newtype(_) => quote! { self.0.encode() },
        DeclKind::Alias(_) | DeclKind::Placeholder(_) => quote! { Value::Null },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportSet;
    use crate::synth::{
        EnumCase, EnumDecl, FieldDecl, StructDecl, TaggedUnionDecl, TaggedVariant, TypeExpr,
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

    fn pet() -> TypeDecl {
        decl(
            "Pet",
            DeclKind::TaggedUnion(TaggedUnionDecl {
                field: "petType".into(),
                variants: vec![
                    TaggedVariant {
                        ident: "Cat".into(),
                        ty: TypeExpr::Named("Cat".into()),
                        tags: vec!["kitty".into(), "cat".into()],
                    },
                    TaggedVariant {
                        ident: "Dog".into(),
                        ty: TypeExpr::Named("Dog".into()),
                        tags: vec!["dog".into()],
                    },
                ],
            }),
        )
    }

    #[test]
    fn struct_codec_is_symmetric() {
        let user = decl(
            "User",
            DeclKind::Struct(StructDecl {
                fields: vec![
                    FieldDecl {
                        wire_name: "id".into(),
                        ident: "id".into(),
                        ty: TypeExpr::String,
                        required: true,
                        doc: None,
                    },
                    FieldDecl {
                        wire_name: "displayName".into(),
                        ident: "display_name".into(),
                        ty: TypeExpr::String.optional(),
                        required: false,
                        doc: None,
                    },
                ],
                additional: None,
            }),
        );
        let decode = decoder(&user);
        assert!(decode.contains("impl Decode for User {"));
        assert!(decode.contains("id: field(object, \"User\", \"id\")?"));
        assert!(decode.contains("display_name: optional_field(object, \"displayName\")?"));

        let encode = encoder(&user);
        assert!(encode.contains("impl Encode for User {"));
        assert!(encode.contains("object.insert(\"id\".to_owned(), self.id.encode());"));
        assert!(encode.contains("if let Some(value) = &self.display_name {"));
        assert!(encode.contains("object.insert(\"displayName\".to_owned(), value.encode());"));
    }

    #[test]
    fn tagged_union_reports_unknown_discriminator() {
        let decode = decoder(&pet());
        assert!(decode.contains("match object.get(\"petType\")"));
        assert!(decode.contains("\"kitty\" | \"cat\" => Ok(Self::Cat(<Cat as Decode>::decode(value)?))"));
        assert!(decode.contains("DecodeError::UnknownDiscriminator"));
        assert!(decode.contains("DecodeError::MissingField"));

        let encode = encoder(&pet());
        assert!(encode.contains("Self::Cat(inner) => with_tag(inner.encode(), \"petType\", \"kitty\")"));
    }

    #[test]
    fn enum_codec_names_the_offending_value() {
        let status = decl(
            "Status",
            DeclKind::Enum(EnumDecl {
                cases: vec![EnumCase { ident: "Active".into(), raw: "active".into() }],
            }),
        );
        let decode = decoder(&status);
        assert!(decode.contains("Some(\"active\") => Ok(Self::Active)"));
        assert!(decode.contains("DecodeError::UnknownEnumValue"));
        assert!(encoder(&status).contains("Value::String(self.as_str().to_owned())"));
    }

    #[test]
    fn newtype_codec_forwards_to_its_payload() {
        let forest = decl(
            "Forest",
            DeclKind::Newtype(TypeExpr::Array(Box::new(TypeExpr::Deferred(Box::new(
                TypeExpr::Named("Forest".into()),
            ))))),
        );
        let decode = decoder(&forest);
        assert!(decode.contains("impl Decode for Forest {"));
        assert!(decode.contains("Ok(Self(<Vec<Box<Forest>> as Decode>::decode(value)?))"));

        let encode = encoder(&forest);
        assert!(encode.contains("impl Encode for Forest {"));
        assert!(encode.contains("self.0.encode()"));
    }
}
