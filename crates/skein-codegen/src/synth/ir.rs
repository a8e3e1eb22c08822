use crate::imports::{Import, ImportSet};
use serde_json::Value;
use std::fmt;

/// A synthesized type use-site, independent of any target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    String,
    Integer(IntWidth),
    Number(FloatWidth),
    Boolean,
    /// Distinguishable string alias for a known `format`
    Format(StringFormat),
    /// A declaration, by its final identifier
    Named(String),
    Array(Box<TypeExpr>),
    /// Open string-keyed map
    Map(Box<TypeExpr>),
    Optional(Box<TypeExpr>),
    /// Lazy indirection for a reference that closes a cycle
    Deferred(Box<TypeExpr>),
    /// Opaque JSON value
    Json,
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I32,
    I64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl TypeExpr {
    pub fn optional(self) -> Self {
        match self {
            Self::Optional(_) => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Declarations this expression mentions
    pub fn named(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Named(name) => out.push(name),
            Self::Array(inner) | Self::Map(inner) | Self::Optional(inner) | Self::Deferred(inner) => {
                inner.collect_named(out)
            }
            _ => {}
        }
    }

    /// Record the imports rendering this expression needs
    pub fn declare_imports(&self, imports: &mut ImportSet) {
        match self {
            Self::Format(format) => imports.require_format(*format),
            Self::Map(inner) => {
                imports.insert(Import::Map);
                inner.declare_imports(imports);
            }
            Self::Json => imports.insert(Import::Decode),
            Self::Array(inner) | Self::Optional(inner) | Self::Deferred(inner) => {
                inner.declare_imports(imports)
            }
            _ => {}
        }
    }

    /// Wrap every reference accepted by `defer` in [`TypeExpr::Deferred`]
    pub fn defer_where(self, defer: &impl Fn(&str) -> bool) -> Self {
        match self {
            Self::Named(name) if defer(&name) => Self::Deferred(Box::new(Self::Named(name))),
            Self::Array(inner) => Self::Array(Box::new(inner.defer_where(defer))),
            Self::Map(inner) => Self::Map(Box::new(inner.defer_where(defer))),
            Self::Optional(inner) => Self::Optional(Box::new(inner.defer_where(defer))),
            other => other,
        }
    }

    pub fn is_deferred(&self) -> bool {
        match self {
            Self::Deferred(_) => true,
            Self::Array(inner) | Self::Map(inner) | Self::Optional(inner) => inner.is_deferred(),
            _ => false,
        }
    }
}

/// String formats that get their own alias type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StringFormat {
    DateTime,
    Date,
    Time,
    Uuid,
    Uri,
    UriReference,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Byte,
    Binary,
    Password,
}

impl StringFormat {
    pub const ALL: [StringFormat; 13] = [
        Self::DateTime,
        Self::Date,
        Self::Time,
        Self::Uuid,
        Self::Uri,
        Self::UriReference,
        Self::Email,
        Self::Hostname,
        Self::Ipv4,
        Self::Ipv6,
        Self::Byte,
        Self::Binary,
        Self::Password,
    ];

    pub fn parse(format: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.raw() == format)
    }

    /// Value of the `format` keyword
    pub fn raw(&self) -> &'static str {
        match self {
            Self::DateTime => "date-time",
            Self::Date => "date",
            Self::Time => "time",
            Self::Uuid => "uuid",
            Self::Uri => "uri",
            Self::UriReference => "uri-reference",
            Self::Email => "email",
            Self::Hostname => "hostname",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Byte => "byte",
            Self::Binary => "binary",
            Self::Password => "password",
        }
    }

    /// Name of the alias type
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Uuid => "Uuid",
            Self::Uri => "Uri",
            Self::UriReference => "UriReference",
            Self::Email => "Email",
            Self::Hostname => "Hostname",
            Self::Ipv4 => "Ipv4",
            Self::Ipv6 => "Ipv6",
            Self::Byte => "Byte",
            Self::Binary => "Binary",
            Self::Password => "Password",
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

/// One emitted type declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Final identifier in the target language
    pub ident: String,
    /// Name in the document's components, or the synthesized name for inline types
    pub schema_name: String,
    /// Declared under the document's named schemas rather than hoisted
    pub from_document: bool,
    /// Counts toward the split-layout complexity threshold
    pub complex: bool,
    pub doc: Option<String>,
    pub kind: DeclKind,
    pub imports: ImportSet,
}

impl TypeDecl {
    /// Every declaration this one refers to
    pub fn references(&self) -> Vec<&str> {
        self.type_exprs().flat_map(TypeExpr::named).collect()
    }

    pub fn type_exprs(&self) -> Box<dyn Iterator<Item = &TypeExpr> + '_> {
        match &self.kind {
            DeclKind::Struct(s) => Box::new(
                s.fields
                    .iter()
                    .map(|f| &f.ty)
                    .chain(s.additional.iter().map(|a| &a.value)),
            ),
            DeclKind::TaggedUnion(u) => Box::new(u.variants.iter().map(|v| &v.ty)),
            DeclKind::UntaggedUnion(u) => Box::new(u.variants.iter().map(|v| &v.ty)),
            DeclKind::Conditional(c) => Box::new([&c.then_ty, &c.else_ty].into_iter()),
            DeclKind::Alias(ty) | DeclKind::Newtype(ty) => Box::new(std::iter::once(ty)),
            DeclKind::Enum(_) | DeclKind::Constant(_) | DeclKind::Placeholder(_) => {
                Box::new(std::iter::empty())
            }
        }
    }

    fn type_exprs_mut(&mut self) -> Vec<&mut TypeExpr> {
        match &mut self.kind {
            DeclKind::Struct(s) => s
                .fields
                .iter_mut()
                .map(|f| &mut f.ty)
                .chain(s.additional.iter_mut().map(|a| &mut a.value))
                .collect(),
            DeclKind::TaggedUnion(u) => u.variants.iter_mut().map(|v| &mut v.ty).collect(),
            DeclKind::UntaggedUnion(u) => u.variants.iter_mut().map(|v| &mut v.ty).collect(),
            DeclKind::Conditional(c) => vec![&mut c.then_ty, &mut c.else_ty],
            DeclKind::Alias(ty) | DeclKind::Newtype(ty) => vec![ty],
            DeclKind::Enum(_) | DeclKind::Constant(_) | DeclKind::Placeholder(_) => Vec::new(),
        }
    }

    /// Rewrite references accepted by `defer` into deferred indirections
    pub fn defer_references(&mut self, defer: &impl Fn(&str) -> bool) {
        for ty in self.type_exprs_mut() {
            *ty = std::mem::replace(ty, TypeExpr::Unit).defer_where(defer);
        }
    }

    /// Gets one encode and one decode routine
    pub fn has_codec(&self) -> bool {
        !matches!(self.kind, DeclKind::Alias(_) | DeclKind::Placeholder(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Struct(StructDecl),
    Enum(EnumDecl),
    TaggedUnion(TaggedUnionDecl),
    UntaggedUnion(UntaggedUnionDecl),
    /// `Then` / `Else` / raw `Unknown`
    Conditional(ConditionalDecl),
    Alias(TypeExpr),
    /// Alias on a reference cycle, wrapped in a nominal type
    Newtype(TypeExpr),
    /// Singleton matching exactly one JSON value
    Constant(Value),
    /// Stand-in for a schema that couldn't be synthesized
    Placeholder(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructDecl {
    pub fields: Vec<FieldDecl>,
    pub additional: Option<AdditionalField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// JSON property name
    pub wire_name: String,
    pub ident: String,
    pub ty: TypeExpr,
    pub required: bool,
    pub doc: Option<String>,
}

/// The open map collecting undeclared properties
#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalField {
    pub ident: String,
    pub value: TypeExpr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumDecl {
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    pub ident: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedUnionDecl {
    /// Discriminator property
    pub field: String,
    pub variants: Vec<TaggedVariant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedVariant {
    pub ident: String,
    pub ty: TypeExpr,
    /// Discriminator values selecting this variant; the first is written on encode
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UntaggedUnionDecl {
    pub variants: Vec<UnionCase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    pub ident: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalDecl {
    pub then_ty: TypeExpr,
    pub else_ty: TypeExpr,
}
