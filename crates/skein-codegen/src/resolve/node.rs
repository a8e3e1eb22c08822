use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;

/// A resolved schema
///
/// `name` is set on document-level schemas and on every inline node that
/// will become its own declaration (inline objects, enums, unions and
/// conditionals, plus union variants). `inline` tells the two apart.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: Option<String>,
    pub kind: SchemaKind,
    /// Origin pointer if this node was reached through a `$ref`
    pub source_reference: Option<String>,
    pub nullable: bool,
    pub inline: bool,
    pub description: Option<String>,
}

/// Closed set of schema shapes
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive(Primitive),
    Object(ObjectType),
    Array(Box<SchemaNode>),
    Enum(EnumType),
    Union(UnionType),
    /// `allOf`, already merged into one object
    Composition(ObjectType),
    /// `if`/`then`/`else`, approximated as a three-way placeholder
    Conditional(ConditionalType),
    /// Pointer to a named schema, never expanded in place
    Reference(String),
    /// `const`: a singleton value
    Const(Value),
    /// `type: null`
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    String,
    Integer,
    Number,
    Boolean,
    /// `type: object` with no declared shape
    Object,
    /// No usable type information
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    pub base: BaseType,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectType {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: BTreeSet<String>,
    pub additional_properties: Option<Box<SchemaNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumType {
    pub raw_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub variants: Vec<UnionVariant>,
    pub discriminator: Option<DiscriminatorSpec>,
    /// `oneOf` when true, `anyOf` when false
    pub exclusive: bool,
}

impl UnionType {
    pub fn discriminator_field(&self) -> Option<&str> {
        self.discriminator.as_ref().map(|d| d.field.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    /// Referenced schema name, or the synthesized `<Parent>Option<N>` name
    pub name: String,
    pub node: SchemaNode,
}

/// Declared discriminator: property name and value → schema name table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatorSpec {
    pub field: String,
    pub mapping: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionalType {
    pub then_branch: Option<Box<SchemaNode>>,
    pub else_branch: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            name: None,
            kind,
            source_reference: None,
            nullable: false,
            inline: true,
            description: None,
        }
    }

    /// Opaque JSON value
    pub fn any() -> Self {
        Self::primitive(BaseType::Any, None)
    }

    pub fn primitive(base: BaseType, format: Option<String>) -> Self {
        Self::new(SchemaKind::Primitive(Primitive { base, format }))
    }

    pub fn reference(target: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            source_reference: Some(pointer.into()),
            ..Self::new(SchemaKind::Reference(target.into()))
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable |= nullable;
        self
    }

    /// Whether this node becomes a declaration of its own
    pub fn is_declaration(&self) -> bool {
        self.kind.is_declaration()
    }

    /// Names of every schema referenced anywhere beneath this node,
    /// without following the references themselves
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut BTreeSet<String>) {
        match &self.kind {
            SchemaKind::Reference(target) => {
                out.insert(target.clone());
            }
            SchemaKind::Object(obj) | SchemaKind::Composition(obj) => {
                for prop in obj.properties.values() {
                    prop.collect_references(out);
                }
                if let Some(extra) = &obj.additional_properties {
                    extra.collect_references(out);
                }
            }
            SchemaKind::Array(element) => element.collect_references(out),
            SchemaKind::Union(union) => {
                for variant in &union.variants {
                    variant.node.collect_references(out);
                }
            }
            SchemaKind::Conditional(cond) => {
                for branch in [&cond.then_branch, &cond.else_branch].into_iter().flatten() {
                    branch.collect_references(out);
                }
            }
            SchemaKind::Primitive(_)
            | SchemaKind::Enum(_)
            | SchemaKind::Const(_)
            | SchemaKind::Null => {}
        }
    }
}

impl SchemaKind {
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Self::Object(_)
                | Self::Composition(_)
                | Self::Enum(_)
                | Self::Union(_)
                | Self::Conditional(_)
        )
    }

    /// Counts toward the split-layout complexity threshold
    pub fn is_complex(&self) -> bool {
        match self {
            Self::Object(obj) => obj.properties.len() > 10,
            Self::Union(_) | Self::Composition(_) => true,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Enum(_) => "enum",
            Self::Union(u) if u.exclusive => "oneOf",
            Self::Union(_) => "anyOf",
            Self::Composition(_) => "allOf",
            Self::Conditional(_) => "conditional",
            Self::Reference(_) => "reference",
            Self::Const(_) => "const",
            Self::Null => "null",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_do_not_follow_targets() {
        let mut obj = ObjectType::default();
        obj.properties.insert(
            "owner".into(),
            SchemaNode::reference("User", "#/components/schemas/User"),
        );
        obj.properties.insert(
            "tags".into(),
            SchemaNode::new(SchemaKind::Array(Box::new(SchemaNode::reference(
                "Tag",
                "#/components/schemas/Tag",
            )))),
        );
        let node = SchemaNode::new(SchemaKind::Object(obj)).named("Pet");

        let refs: Vec<_> = node.references().into_iter().collect();
        assert_eq!(refs, vec!["Tag".to_string(), "User".to_string()]);
    }

    #[test]
    fn complexity() {
        let mut big = ObjectType::default();
        for i in 0..11 {
            big.properties.insert(format!("f{i}"), SchemaNode::any());
        }
        assert!(SchemaKind::Object(big).is_complex());
        assert!(!SchemaKind::Object(ObjectType::default()).is_complex());
        assert!(SchemaKind::Composition(ObjectType::default()).is_complex());
    }
}
