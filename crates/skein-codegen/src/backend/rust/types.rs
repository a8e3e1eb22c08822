use super::{doc_attrs, format_items, ident, type_tokens};
use crate::synth::{DeclKind, EnumDecl, StructDecl, TypeDecl};
use proc_macro2::TokenStream;
use quote::quote;

/// Type declaration for one synthesized type, with inherent helpers
pub(super) fn declaration(decl: &TypeDecl) -> String {
    let name = ident(&decl.ident);
    let doc = doc_attrs(decl.doc.as_deref());

    let tokens = match &decl.kind {
        DeclKind::Struct(s) => structure(&name, s, doc),
        DeclKind::Enum(e) => enumeration(&name, e, doc),
        DeclKind::TaggedUnion(u) => {
            let variants = u.variants.iter().map(|v| {
                let variant = ident(&v.ident);
                let ty = type_tokens(&v.ty);
                quote! { #variant(#ty) }
            });
            quote! {
                #doc
                #[derive(Debug, Clone, PartialEq)]
                pub enum #name {
                    #(#variants,)*
                }
            }
        }
        DeclKind::UntaggedUnion(u) => {
            let variants = u.variants.iter().map(|v| {
                let variant = ident(&v.ident);
                let ty = type_tokens(&v.ty);
                quote! { #variant(#ty) }
            });
            quote! {
                #doc
                #[derive(Debug, Clone, PartialEq)]
                pub enum #name {
                    #(#variants,)*
                }
            }
        }
        DeclKind::Conditional(c) => {
            let then_ty = type_tokens(&c.then_ty);
            let else_ty = type_tokens(&c.else_ty);
            quote! {
                #doc
                /// Conditional schema, decoded as its `then` branch, then its `else`
                /// branch, then kept raw.
                #[derive(Debug, Clone, PartialEq)]
                pub enum #name {
                    Then(#then_ty),
                    Else(#else_ty),
                    Unknown(Value),
                }
            }
        }
        DeclKind::Alias(ty) => {
            let ty = type_tokens(ty);
            quote! {
                #doc
                pub type #name = #ty;
            }
        }
        DeclKind::Newtype(ty) => {
            let ty = type_tokens(ty);
            quote! {
                #doc
                #[derive(Debug, Clone, PartialEq)]
                pub struct #name(pub #ty);
            }
        }
        DeclKind::Constant(value) => {
            let raw = value.to_string();
            quote! {
                #doc
                /// Singleton matching exactly one JSON value
                #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
                pub struct #name;

                impl #name {
                    pub const RAW: &'static str = #raw;

                    pub fn value() -> Value {
                        serde_json::from_str(Self::RAW).unwrap_or(Value::Null)
                    }
                }
            }
        }
        DeclKind::Placeholder(reason) => {
            let note = format!(" skein: could not be generated: {reason}");
            quote! {
                #doc
                #[doc = #note]
                pub type #name = Value;
            }
        }
    };
    format_items(tokens, &decl.ident)
}

fn structure(name: &syn::Ident, s: &StructDecl, doc: TokenStream) -> TokenStream {
    let fields = s.fields.iter().map(|f| {
        let field = ident(&f.ident);
        let ty = type_tokens(&f.ty);
        let field_doc = doc_attrs(f.doc.as_deref());
        quote! {
            #field_doc
            pub #field: #ty
        }
    });
    let additional = s.additional.iter().map(|a| {
        let field = ident(&a.ident);
        let value = type_tokens(&a.value);
        quote! {
            /// Properties not declared by the schema
            pub #field: BTreeMap<String, #value>
        }
    });
    quote! {
        #doc
        #[derive(Debug, Clone, PartialEq)]
        pub struct #name {
            #(#fields,)*
            #(#additional,)*
        }
    }
}

fn enumeration(name: &syn::Ident, e: &EnumDecl, doc: TokenStream) -> TokenStream {
    let cases: Vec<_> = e.cases.iter().map(|c| ident(&c.ident)).collect();
    let raws = e.cases.iter().map(|c| c.raw.as_str());
    quote! {
        #doc
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum #name {
            #(#cases,)*
        }

        impl #name {
            /// Value on the wire
            pub fn as_str(&self) -> &'static str {
                match *self {
                    #(Self::#cases => #raws,)*
                }
            }
        }
    }
}
