//! Per-language naming and type tables
//!
//! The resolver, synthesizer and binder are written once against
//! [`LanguageProfile`]; only the tables differ between targets.

use crate::synth::ir::{FloatWidth, IntWidth, TypeExpr};
use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Pascal,
    Camel,
    Snake,
}

impl Case {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Self::Pascal => raw.to_pascal_case(),
            Self::Camel => raw.to_lower_camel_case(),
            Self::Snake => raw.to_snake_case(),
        }
    }
}

/// Spellings of the primitive and container types
///
/// Container entries are patterns with `{}` standing in for the element.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveTable {
    pub string: &'static str,
    pub int32: &'static str,
    pub int64: &'static str,
    pub float32: &'static str,
    pub float64: &'static str,
    pub boolean: &'static str,
    pub json: &'static str,
    pub unit: &'static str,
    pub array: &'static str,
    pub map: &'static str,
    pub optional: &'static str,
    pub deferred: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    pub type_case: Case,
    pub field_case: Case,
    pub variant_case: Case,
    pub function_case: Case,
    /// Keyword → substitute
    pub reserved_words: &'static [(&'static str, &'static str)],
    /// Type names owned by the generated runtime or the language prelude
    pub reserved_types: &'static [&'static str],
    /// Appended to a document type name that hits `reserved_types`
    pub reserved_type_suffix: &'static str,
    /// Free functions owned by the generated runtime
    pub reserved_functions: &'static [&'static str],
    pub primitives: PrimitiveTable,
}

impl LanguageProfile {
    pub fn type_name(&self, raw: &str) -> String {
        let name = self.cased(self.type_case, raw, "Unnamed");
        if self.reserved_types.contains(&name.as_str()) {
            format!("{name}{}", self.reserved_type_suffix)
        } else {
            self.escape(name)
        }
    }

    pub fn field_name(&self, raw: &str) -> String {
        self.escape(self.cased(self.field_case, raw, "field"))
    }

    /// Enum case or union variant name
    ///
    /// Leading punctuation is dropped and separators normalized, so `-1`
    /// and `+json` become `_1` and `Json`.
    pub fn variant_name(&self, raw: &str) -> String {
        let clean = raw.trim_start_matches(|c: char| !c.is_alphanumeric());
        let normalized = clean.replace(['-', '.', '/', ' '], "_");
        self.escape(self.cased(self.variant_case, &normalized, "Unknown"))
    }

    pub fn function_name(&self, raw: &str) -> String {
        self.escape(self.cased(self.function_case, raw, "operation"))
    }

    fn cased(&self, case: Case, raw: &str, empty: &str) -> String {
        let cased: String = case
            .apply(raw)
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        match cased.chars().next() {
            None => empty.to_string(),
            Some(c) if c.is_ascii_digit() => format!("_{cased}"),
            Some(_) => cased,
        }
    }

    /// Swap reserved words for their substitutes
    pub fn escape(&self, ident: String) -> String {
        match self.reserved_words.iter().find(|(word, _)| *word == ident) {
            Some((_, substitute)) => substitute.to_string(),
            None => ident,
        }
    }

    pub fn is_reserved(&self, ident: &str) -> bool {
        self.reserved_words.iter().any(|(word, _)| *word == ident)
    }

    /// Spell a type expression in the target language
    pub fn render_type(&self, ty: &TypeExpr) -> String {
        let p = &self.primitives;
        match ty {
            TypeExpr::String => p.string.to_string(),
            TypeExpr::Integer(IntWidth::I32) => p.int32.to_string(),
            TypeExpr::Integer(IntWidth::I64) => p.int64.to_string(),
            TypeExpr::Number(FloatWidth::F32) => p.float32.to_string(),
            TypeExpr::Number(FloatWidth::F64) => p.float64.to_string(),
            TypeExpr::Boolean => p.boolean.to_string(),
            TypeExpr::Format(format) => format.type_name().to_string(),
            TypeExpr::Named(name) => name.clone(),
            TypeExpr::Array(inner) => p.array.replace("{}", &self.render_type(inner)),
            TypeExpr::Map(inner) => p.map.replace("{}", &self.render_type(inner)),
            TypeExpr::Optional(inner) => p.optional.replace("{}", &self.render_type(inner)),
            TypeExpr::Deferred(inner) => p.deferred.replace("{}", &self.render_type(inner)),
            TypeExpr::Json => p.json.to_string(),
            TypeExpr::Unit => p.unit.to_string(),
        }
    }
}

macro_rules! suffixed {
    ($suffix:literal; $($word:literal),* $(,)?) => {
        &[$(($word, concat!($word, $suffix))),*]
    };
}

pub const RUST: LanguageProfile = LanguageProfile {
    type_case: Case::Pascal,
    field_case: Case::Snake,
    variant_case: Case::Pascal,
    function_case: Case::Snake,
    reserved_words: suffixed!("_";
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
        "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
        "final", "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual",
        "yield",
    ),
    reserved_types: &[
        "Box", "BTreeMap", "ClientConfig", "Decode", "DecodeError", "Encode", "Err", "None", "Ok",
        "Option", "OperationError", "Result", "Some", "String", "TransportError", "Url", "Value",
        "Vec", "Date", "DateTime", "Time", "Uuid", "Uri", "UriReference", "Email", "Hostname",
        "Ipv4", "Ipv6", "Byte", "Binary", "Password",
    ],
    reserved_type_suffix: "Schema",
    reserved_functions: &[
        "additional", "decode_body", "expect_object", "field", "optional_field", "param_text",
        "with_tag",
    ],
    primitives: PrimitiveTable {
        string: "String",
        int32: "i32",
        int64: "i64",
        float32: "f32",
        float64: "f64",
        boolean: "bool",
        json: "Value",
        unit: "()",
        array: "Vec<{}>",
        map: "BTreeMap<String, {}>",
        optional: "Option<{}>",
        deferred: "Box<{}>",
    },
};

pub const TYPESCRIPT: LanguageProfile = LanguageProfile {
    type_case: Case::Pascal,
    field_case: Case::Camel,
    variant_case: Case::Pascal,
    function_case: Case::Camel,
    reserved_words: suffixed!("_";
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
        "true", "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
        "implements", "interface", "package", "private", "protected", "public", "await",
    ),
    reserved_types: &[
        "Array", "ClientConfig", "DecodeError", "Decoder", "Encoder", "Error", "Json", "JsonMap",
        "Map", "Object", "OperationError", "Promise", "Record", "Result", "String",
        "TransportError", "URL", "Body", "Boolean", "Integer", "Lazy", "Null", "Number",
        "Optional", "Date", "DateTime", "Time", "Uuid", "Uri", "UriReference", "Email", "Hostname", "Ipv4", "Ipv6",
        "Byte", "Binary", "Password",
    ],
    reserved_type_suffix: "Schema",
    reserved_functions: &[
        "additional", "defaultClientConfig", "expectObject", "field", "optionalField", "paramText",
        "readBody", "send", "transportFailure", "withTag",
    ],
    primitives: PrimitiveTable {
        string: "string",
        int32: "number",
        int64: "number",
        float32: "number",
        float64: "number",
        boolean: "boolean",
        json: "Json",
        unit: "null",
        array: "Array<{}>",
        map: "JsonMap<{}>",
        optional: "{} | undefined",
        deferred: "{}",
    },
};
