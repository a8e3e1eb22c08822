//! Support code emitted once per output, in the single or root module

use super::{format_items, ident};
use crate::imports::{Import, ImportSet};
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn runtime(imports: &ImportSet) -> String {
    let mut sections = vec![format_items(codec(), "codec runtime")];
    let formats: Vec<TokenStream> = imports
        .formats()
        .map(|f| format_alias(f.type_name(), f.raw()))
        .collect();
    if !formats.is_empty() {
        sections.push(format_items(quote! { #(#formats)* }, "format aliases"));
    }
    if imports.contains(Import::Http) {
        sections.push(format_items(transport(), "transport runtime"));
    }
    sections.join("\n\n")
}

fn codec() -> TokenStream {
    quote! {
        /// Conversion from a JSON value
        pub trait Decode: Sized {
            fn decode(value: &Value) -> Result<Self, DecodeError>;
        }

        /// Conversion into a JSON value
        pub trait Encode {
            fn encode(&self) -> Value;
        }

        #[derive(Debug, Clone, PartialEq)]
        pub enum DecodeError {
            MissingField { type_name: &'static str, field: &'static str },
            UnexpectedType { expected: &'static str, found: &'static str },
            UnknownEnumValue { type_name: &'static str, value: String },
            UnknownDiscriminator { type_name: &'static str, field: &'static str, value: String },
            NoMatchingVariant { type_name: &'static str },
            ConstantMismatch { type_name: &'static str },
            Malformed(String),
        }

        impl DecodeError {
            pub fn unexpected(expected: &'static str, found: &Value) -> Self {
                let found = match found {
                    Value::Null => "null",
                    Value::Bool(_) => "boolean",
                    Value::Number(_) => "number",
                    Value::String(_) => "string",
                    Value::Array(_) => "array",
                    Value::Object(_) => "object",
                };
                Self::UnexpectedType { expected, found }
            }
        }

        impl std::fmt::Display for DecodeError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    Self::MissingField { type_name, field } => {
                        write!(f, "{type_name}: missing field `{field}`")
                    }
                    Self::UnexpectedType { expected, found } => {
                        write!(f, "expected {expected}, found {found}")
                    }
                    Self::UnknownEnumValue { type_name, value } => {
                        write!(f, "{type_name}: unknown value `{value}`")
                    }
                    Self::UnknownDiscriminator { type_name, field, value } => {
                        write!(f, "{type_name}: unknown `{field}` discriminator `{value}`")
                    }
                    Self::NoMatchingVariant { type_name } => {
                        write!(f, "{type_name}: no variant matched")
                    }
                    Self::ConstantMismatch { type_name } => {
                        write!(f, "{type_name}: value does not match the constant")
                    }
                    Self::Malformed(message) => write!(f, "malformed JSON: {message}"),
                }
            }
        }

        impl std::error::Error for DecodeError {}

        pub fn expect_object<'v>(
            value: &'v Value,
            type_name: &'static str,
        ) -> Result<&'v serde_json::Map<String, Value>, DecodeError> {
            value
                .as_object()
                .ok_or_else(|| DecodeError::unexpected(type_name, value))
        }

        pub fn field<T: Decode>(
            object: &serde_json::Map<String, Value>,
            type_name: &'static str,
            key: &'static str,
        ) -> Result<T, DecodeError> {
            match object.get(key) {
                Some(value) => T::decode(value),
                None => Err(DecodeError::MissingField { type_name, field: key }),
            }
        }

        /// Absent and `null` both decode to `None`
        pub fn optional_field<T: Decode>(
            object: &serde_json::Map<String, Value>,
            key: &str,
        ) -> Result<Option<T>, DecodeError> {
            match object.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(value) => T::decode(value).map(Some),
            }
        }

        /// Every property not in `known`
        pub fn additional<T: Decode>(
            object: &serde_json::Map<String, Value>,
            known: &[&str],
        ) -> Result<BTreeMap<String, T>, DecodeError> {
            object
                .iter()
                .filter(|(key, _)| !known.contains(&key.as_str()))
                .map(|(key, value)| Ok((key.clone(), T::decode(value)?)))
                .collect()
        }

        /// Write a union's discriminator into an encoded variant
        pub fn with_tag(mut value: Value, field: &str, tag: &str) -> Value {
            if let Value::Object(object) = &mut value {
                object.insert(field.to_owned(), Value::String(tag.to_owned()));
            }
            value
        }

        impl Decode for String {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| DecodeError::unexpected("string", value))
            }
        }

        impl Encode for String {
            fn encode(&self) -> Value {
                Value::String(self.clone())
            }
        }

        impl Decode for i64 {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_i64()
                    .ok_or_else(|| DecodeError::unexpected("integer", value))
            }
        }

        impl Encode for i64 {
            fn encode(&self) -> Value {
                Value::from(*self)
            }
        }

        impl Decode for i32 {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| DecodeError::unexpected("32-bit integer", value))
            }
        }

        impl Encode for i32 {
            fn encode(&self) -> Value {
                Value::from(*self)
            }
        }

        impl Decode for f64 {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_f64()
                    .ok_or_else(|| DecodeError::unexpected("number", value))
            }
        }

        impl Encode for f64 {
            fn encode(&self) -> Value {
                Value::from(*self)
            }
        }

        impl Decode for f32 {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_f64()
                    .map(|n| n as f32)
                    .ok_or_else(|| DecodeError::unexpected("number", value))
            }
        }

        impl Encode for f32 {
            fn encode(&self) -> Value {
                Value::from(*self)
            }
        }

        impl Decode for bool {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_bool()
                    .ok_or_else(|| DecodeError::unexpected("boolean", value))
            }
        }

        impl Encode for bool {
            fn encode(&self) -> Value {
                Value::Bool(*self)
            }
        }

        impl Decode for () {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                match value {
                    Value::Null => Ok(()),
                    other => Err(DecodeError::unexpected("null", other)),
                }
            }
        }

        impl Encode for () {
            fn encode(&self) -> Value {
                Value::Null
            }
        }

        impl Decode for Value {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                Ok(value.clone())
            }
        }

        impl Encode for Value {
            fn encode(&self) -> Value {
                self.clone()
            }
        }

        impl<T: Decode> Decode for Vec<T> {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                value
                    .as_array()
                    .ok_or_else(|| DecodeError::unexpected("array", value))?
                    .iter()
                    .map(T::decode)
                    .collect()
            }
        }

        impl<T: Encode> Encode for Vec<T> {
            fn encode(&self) -> Value {
                Value::Array(self.iter().map(Encode::encode).collect())
            }
        }

        impl<T: Decode> Decode for Option<T> {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                match value {
                    Value::Null => Ok(None),
                    other => T::decode(other).map(Some),
                }
            }
        }

        impl<T: Encode> Encode for Option<T> {
            fn encode(&self) -> Value {
                match self {
                    Some(inner) => inner.encode(),
                    None => Value::Null,
                }
            }
        }

        impl<T: Decode> Decode for Box<T> {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                T::decode(value).map(Box::new)
            }
        }

        impl<T: Encode> Encode for Box<T> {
            fn encode(&self) -> Value {
                (**self).encode()
            }
        }

        impl<T: Decode> Decode for BTreeMap<String, T> {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                expect_object(value, "object")?
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), T::decode(value)?)))
                    .collect()
            }
        }

        impl<T: Encode> Encode for BTreeMap<String, T> {
            fn encode(&self) -> Value {
                Value::Object(
                    self.iter()
                        .map(|(key, value)| (key.clone(), value.encode()))
                        .collect(),
                )
            }
        }
    }
}

/// String newtype for one `format`; values pass through unvalidated
fn format_alias(name: &str, raw: &str) -> TokenStream {
    let name = ident(name);
    let doc = format!(" String with `format: {raw}`");
    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct #name(pub String);

        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Decode for #name {
            fn decode(value: &Value) -> Result<Self, DecodeError> {
                String::decode(value).map(Self)
            }
        }

        impl Encode for #name {
            fn encode(&self) -> Value {
                Value::String(self.0.clone())
            }
        }
    }
}

fn transport() -> TokenStream {
    quote! {
        /// Failure below the API's own error responses
        #[derive(Debug)]
        pub enum TransportError {
            Network(reqwest::Error),
            InvalidUrl(String),
            Decode { status: u16, error: DecodeError },
            /// Status the operation declares no response for
            Status { status: u16, body: String },
        }

        impl std::fmt::Display for TransportError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    Self::Network(err) => write!(f, "network error: {err}"),
                    Self::InvalidUrl(url) => write!(f, "invalid URL: {url}"),
                    Self::Decode { status, error } => {
                        write!(f, "could not decode {status} response: {error}")
                    }
                    Self::Status { status, .. } => write!(f, "unexpected status {status}"),
                }
            }
        }

        impl std::error::Error for TransportError {}

        impl From<reqwest::Error> for TransportError {
            fn from(err: reqwest::Error) -> Self {
                Self::Network(err)
            }
        }

        /// Failure of an operation that declares error responses
        #[derive(Debug)]
        pub enum OperationError<E> {
            Transport(TransportError),
            /// A declared (or unknown) error status
            Api(E),
        }

        impl<E: std::fmt::Debug> std::fmt::Display for OperationError<E> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    Self::Transport(err) => std::fmt::Display::fmt(err, f),
                    Self::Api(err) => write!(f, "API error: {err:?}"),
                }
            }
        }

        impl<E: std::fmt::Debug> std::error::Error for OperationError<E> {}

        impl<E> From<TransportError> for OperationError<E> {
            fn from(err: TransportError) -> Self {
                Self::Transport(err)
            }
        }

        /// Decode a response body; an empty body reads as `null`
        pub fn decode_body<T: Decode>(status: u16, text: &str) -> Result<T, TransportError> {
            let value = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(text).map_err(|err| TransportError::Decode {
                    status,
                    error: DecodeError::Malformed(err.to_string()),
                })?
            };
            T::decode(&value).map_err(|error| TransportError::Decode { status, error })
        }

        /// Text form of a structured parameter value
        pub fn param_text<T: Encode + ?Sized>(value: &T) -> String {
            match value.encode() {
                Value::String(text) => text,
                other => other.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::StringFormat;

    #[test]
    fn runtime_carries_only_what_is_needed() {
        let bare = runtime(&ImportSet::new());
        assert!(bare.contains("pub trait Decode: Sized {"));
        assert!(bare.contains("pub trait Encode {"));
        assert!(bare.contains("UnknownDiscriminator {"));
        assert!(!bare.contains("TransportError"));
        assert!(!bare.contains("pub struct DateTime"));

        let mut imports = ImportSet::new().with(Import::Http);
        imports.require_format(StringFormat::DateTime);
        let full = runtime(&imports);
        assert!(full.contains("pub struct DateTime(pub String);"));
        assert!(full.contains("pub enum TransportError {"));
        assert!(full.contains("pub fn decode_body<T: Decode>"));
    }
}
