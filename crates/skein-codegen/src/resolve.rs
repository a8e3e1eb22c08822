//! Schema resolution
//!
//! Classifies raw JSON Schema nodes into the closed [`SchemaKind`] set.
//! Classification is an ordered dispatch where the first matching rule
//! wins:
//!
//! 1. `$ref` → [`SchemaKind::Reference`]
//! 2. `const` → [`SchemaKind::Const`]
//! 3. `type: null` → [`SchemaKind::Null`]
//! 4. `if` → [`SchemaKind::Conditional`]
//! 5. `oneOf` → exclusive [`SchemaKind::Union`]
//! 6. `anyOf` → non-exclusive [`SchemaKind::Union`]
//! 7. `allOf` → [`SchemaKind::Composition`]
//! 8. `enum` on a string type → [`SchemaKind::Enum`]
//! 9. `type: object` with properties → [`SchemaKind::Object`]
//! 10. `type: array` → [`SchemaKind::Array`]
//! 11. anything else → [`SchemaKind::Primitive`] keyed by type and format
//!
//! References are never expanded in place, so self-referential schemas
//! resolve in one pass. The only place references are followed is `allOf`
//! merging, which tracks the chain it is walking and stops at a cycle.

pub mod graph;
pub mod node;

pub use graph::{Cycles, ReferenceGraph};
pub use node::{
    BaseType, ConditionalType, DiscriminatorSpec, EnumType, ObjectType, Primitive, SchemaKind,
    SchemaNode, UnionType, UnionVariant,
};

use crate::diagnostics::{Diagnostics, Issue, Outcome};
use crate::document::{AdditionalProperties, Document, Schema};
use heck::ToPascalCase;
use indexmap::IndexMap;
use serde_json::Value;

/// Every named schema of a document, resolved
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchemas {
    pub named: IndexMap<String, SchemaNode>,
    /// Reference edges between named schemas
    pub graph: ReferenceGraph,
    pub cycles: Cycles,
}

impl ResolvedSchemas {
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.named.get(name)
    }

    pub fn is_recursive(&self, name: &str) -> bool {
        self.cycles.is_recursive(name)
    }
}

/// Which classification rule matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Reference,
    Const,
    Null,
    Conditional,
    OneOf,
    AnyOf,
    AllOf,
    Enum,
    Object,
    Array,
    Primitive,
}

fn non_empty(list: &Option<Vec<Schema>>) -> bool {
    list.as_ref().is_some_and(|l| !l.is_empty())
}

fn is_string_enum(raw: &Schema) -> bool {
    let Some(values) = &raw.enum_values else {
        return false;
    };
    if raw.has_type("string") {
        return true;
    }
    raw.concrete_types().next().is_none()
        && values.iter().any(Value::is_string)
        && values.iter().all(|v| v.is_string() || v.is_null())
}

fn is_object_like(raw: &Schema) -> bool {
    let has_shape = !raw.properties.is_empty()
        || matches!(
            raw.additional_properties,
            Some(AdditionalProperties::Bool(true)) | Some(AdditionalProperties::Schema(_))
        );
    let mut concrete = raw.concrete_types();
    match (concrete.next(), concrete.next()) {
        (Some("object"), None) => has_shape,
        (None, _) => has_shape,
        _ => false,
    }
}

fn classify(raw: &Schema) -> Rule {
    if raw.reference.is_some() {
        Rule::Reference
    } else if raw.const_value.is_some() {
        Rule::Const
    } else if raw.is_null_only() {
        Rule::Null
    } else if raw.if_schema.is_some() {
        Rule::Conditional
    } else if non_empty(&raw.one_of) {
        Rule::OneOf
    } else if non_empty(&raw.any_of) {
        Rule::AnyOf
    } else if non_empty(&raw.all_of) {
        Rule::AllOf
    } else if is_string_enum(raw) {
        Rule::Enum
    } else if is_object_like(raw) {
        Rule::Object
    } else if raw.has_type("array") || (raw.types.is_empty() && raw.items.is_some()) {
        Rule::Array
    } else {
        Rule::Primitive
    }
}

/// Naming context for the node being resolved
///
/// `exact` scopes name the node itself (document schemas, union variants);
/// otherwise the name is a base that gets a kind suffix, so an inline object
/// under property `address` becomes `AddressObject`.
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    exact: bool,
    location: String,
}

impl Scope {
    pub fn exact(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exact: true,
            location: location.into(),
        }
    }

    pub fn hint(base: &str, location: impl Into<String>) -> Self {
        Self {
            name: pascal_hint(base),
            exact: false,
            location: location.into(),
        }
    }

    fn decl_name(&self, suffix: &str) -> String {
        if self.exact {
            self.name.clone()
        } else {
            format!("{}{}", self.name, suffix)
        }
    }

    fn property(&self, field: &str) -> Self {
        Self::hint(field, format!("{}.{}", self.location, field))
    }

    fn items(&self) -> Self {
        Self {
            name: self.name.clone(),
            exact: false,
            location: format!("{}[]", self.location),
        }
    }
}

/// PascalCase base for synthesized names
pub fn pascal_hint(raw: &str) -> String {
    let pascal = raw.to_pascal_case();
    match pascal.chars().next() {
        None => "Field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("Field{pascal}"),
        Some(_) => pascal,
    }
}

fn decl_suffix(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::Enum(_) => "Enum",
        SchemaKind::Union(_) => "Union",
        SchemaKind::Conditional(_) => "Conditional",
        _ => "Object",
    }
}

/// Resolves raw schemas against one document
pub struct SchemaResolver<'d> {
    doc: &'d Document,
}

impl<'d> SchemaResolver<'d> {
    pub fn new(doc: &'d Document) -> Self {
        Self { doc }
    }

    /// Resolve every named schema and build the reference graph between them
    pub fn resolve_all(&self) -> Outcome<ResolvedSchemas> {
        let mut diags = Diagnostics::new();
        let mut named = IndexMap::new();

        for (name, raw) in self.doc.schemas() {
            named.insert(name.clone(), self.resolve_named(name, raw, &mut diags));
        }

        let mut graph = ReferenceGraph::new();
        for (name, node) in &named {
            graph.add_node(name);
            for target in node.references() {
                if named.contains_key(&target) {
                    graph.add_edge(name, &target);
                }
            }
        }
        let cycles = graph.cycles();
        for name in cycles.recursive_names() {
            tracing::debug!(schema = name, "recursive schema");
        }

        tracing::debug!(count = named.len(), "resolved named schemas");
        Outcome::new(
            ResolvedSchemas {
                named,
                graph,
                cycles,
            },
            diags,
        )
    }

    pub fn resolve_named(&self, name: &str, raw: &Schema, diags: &mut Diagnostics) -> SchemaNode {
        let mut node = self.resolve(raw, &Scope::exact(name, name), diags);
        node.name = Some(name.to_string());
        node.inline = false;
        node
    }

    /// Resolve one raw schema in `scope`
    pub fn resolve(&self, raw: &Schema, scope: &Scope, diags: &mut Diagnostics) -> SchemaNode {
        let mut node = match classify(raw) {
            Rule::Reference => self.resolve_reference(raw, scope, diags),
            Rule::Const => {
                SchemaNode::new(SchemaKind::Const(raw.const_value.clone().unwrap_or(Value::Null)))
            }
            Rule::Null => SchemaNode::new(SchemaKind::Null).with_nullable(true),
            Rule::Conditional => self.resolve_conditional(raw, scope, diags),
            Rule::OneOf => {
                let members = raw.one_of.as_deref().unwrap_or_default();
                self.resolve_union(raw, members, true, scope, diags)
            }
            Rule::AnyOf => {
                let members = raw.any_of.as_deref().unwrap_or_default();
                self.resolve_union(raw, members, false, scope, diags)
            }
            Rule::AllOf => self.resolve_composition(raw, scope, diags),
            Rule::Enum => resolve_enum(raw),
            Rule::Object => SchemaNode::new(SchemaKind::Object(self.resolve_object(raw, scope, diags))),
            Rule::Array => {
                let element = match &raw.items {
                    Some(items) => self.resolve(items, &scope.items(), diags),
                    None => SchemaNode::any(),
                };
                SchemaNode::new(SchemaKind::Array(Box::new(element)))
            }
            Rule::Primitive => resolve_primitive(raw, scope, diags),
        };

        if node.is_declaration() && node.name.is_none() {
            node.name = Some(scope.decl_name(decl_suffix(&node.kind)));
        }
        node.nullable |= raw.is_nullable();
        if node.description.is_none() {
            node.description = raw.description.clone().or_else(|| raw.title.clone());
        }
        node
    }

    fn resolve_reference(&self, raw: &Schema, scope: &Scope, diags: &mut Diagnostics) -> SchemaNode {
        let pointer = raw.reference.as_deref().unwrap_or_default();
        match Document::schema_ref_name(pointer) {
            Some(name) if self.doc.schema(&name).is_some() => SchemaNode::reference(name, pointer),
            _ => {
                diags.push(Issue::unresolved(pointer, &scope.location));
                SchemaNode {
                    source_reference: Some(pointer.to_string()),
                    ..SchemaNode::any()
                }
            }
        }
    }

    fn resolve_conditional(&self, raw: &Schema, scope: &Scope, diags: &mut Diagnostics) -> SchemaNode {
        let parent = scope.decl_name("Conditional");
        let mut branch = |schema: &Option<Box<Schema>>, label: &str| {
            schema.as_ref().map(|s| {
                let name = format!("{parent}{label}");
                let location = format!("{}.{}", scope.location, label.to_ascii_lowercase());
                Box::new(self.resolve(s, &Scope::exact(name, location), diags))
            })
        };
        let then_branch = branch(&raw.then_schema, "Then");
        let else_branch = branch(&raw.else_schema, "Else");
        SchemaNode::new(SchemaKind::Conditional(ConditionalType {
            then_branch,
            else_branch,
        }))
    }

    fn resolve_union(
        &self,
        raw: &Schema,
        members: &[Schema],
        exclusive: bool,
        scope: &Scope,
        diags: &mut Diagnostics,
    ) -> SchemaNode {
        let has_null = members.iter().any(Schema::is_null_only);
        let concrete: Vec<(usize, &Schema)> = members
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_null_only())
            .collect();

        match concrete.as_slice() {
            [] => return SchemaNode::new(SchemaKind::Null).with_nullable(true),
            [(_, only)] if has_null => return self.resolve(only, scope, diags).with_nullable(true),
            _ => {}
        }

        let parent = scope.decl_name("Union");
        let (label, keyword) = if exclusive {
            ("Option", "oneOf")
        } else {
            ("Variant", "anyOf")
        };

        let variants = concrete
            .into_iter()
            .map(|(index, member)| {
                let resolved_ref = member
                    .reference
                    .as_deref()
                    .and_then(Document::schema_ref_name)
                    .filter(|name| self.doc.schema(name).is_some());
                match (resolved_ref, &member.reference) {
                    (Some(target), Some(pointer)) => UnionVariant {
                        node: SchemaNode::reference(target.clone(), pointer.clone()),
                        name: target,
                    },
                    _ => {
                        let name = format!("{parent}{label}{}", index + 1);
                        let location = format!("{}.{}[{}]", scope.location, keyword, index);
                        let node = self
                            .resolve(member, &Scope::exact(name.clone(), location), diags)
                            .named(name.clone());
                        UnionVariant { name, node }
                    }
                }
            })
            .collect();

        let discriminator = raw.discriminator.as_ref().map(|d| DiscriminatorSpec {
            field: d.property_name.clone(),
            mapping: d
                .mapping
                .iter()
                .map(|(value, target)| {
                    let name = Document::schema_ref_name(target).unwrap_or_else(|| target.clone());
                    (value.clone(), name)
                })
                .collect(),
        });

        SchemaNode::new(SchemaKind::Union(UnionType {
            variants,
            discriminator,
            exclusive,
        }))
        .with_nullable(has_null)
    }

    fn resolve_composition(&self, raw: &Schema, scope: &Scope, diags: &mut Diagnostics) -> SchemaNode {
        let mut merged = ObjectType::default();
        let mut chain = Vec::new();
        self.merge_part(&mut merged, raw, scope, &mut chain, diags);
        SchemaNode::new(SchemaKind::Composition(merged))
    }

    /// Fold one `allOf` constituent into `merged`
    ///
    /// Later constituents overwrite earlier properties of the same name.
    fn merge_part(
        &self,
        merged: &mut ObjectType,
        part: &Schema,
        scope: &Scope,
        chain: &mut Vec<String>,
        diags: &mut Diagnostics,
    ) {
        if let Some(pointer) = &part.reference {
            let target = Document::schema_ref_name(pointer)
                .and_then(|name| self.doc.schema(&name).map(|schema| (name, schema)));
            let Some((name, schema)) = target else {
                diags.push(Issue::unresolved(pointer, &scope.location));
                return;
            };
            if chain.contains(&name) {
                diags.push(Issue::unsupported(
                    format!("allOf cycle through `{name}`"),
                    &scope.location,
                ));
                return;
            }
            chain.push(name);
            self.merge_part(merged, schema, scope, chain, diags);
            chain.pop();
            return;
        }

        if non_empty(&part.all_of) {
            for sub in part.all_of.iter().flatten() {
                self.merge_part(merged, sub, scope, chain, diags);
            }
            if !part.properties.is_empty() || part.additional_properties.is_some() {
                let own = self.resolve_object(part, scope, diags);
                absorb(merged, own);
            }
            return;
        }

        let node = self.resolve(part, scope, diags);
        match node.kind {
            SchemaKind::Object(obj) | SchemaKind::Composition(obj) => absorb(merged, obj),
            SchemaKind::Primitive(Primitive {
                base: BaseType::Any | BaseType::Object,
                ..
            }) => {}
            other => diags.push(Issue::unsupported(
                format!("allOf member of kind {}", other.label()),
                &scope.location,
            )),
        }
    }

    fn resolve_object(&self, raw: &Schema, scope: &Scope, diags: &mut Diagnostics) -> ObjectType {
        let parent = scope.decl_name("Object");
        let properties = raw
            .properties
            .iter()
            .map(|(field, schema)| (field.clone(), self.resolve(schema, &scope.property(field), diags)))
            .collect();

        let additional_properties = match &raw.additional_properties {
            Some(AdditionalProperties::Bool(true)) => Some(Box::new(SchemaNode::any())),
            Some(AdditionalProperties::Schema(schema)) => {
                let value_scope = Scope::exact(
                    format!("{parent}Value"),
                    format!("{}.additionalProperties", scope.location),
                );
                Some(Box::new(self.resolve(schema, &value_scope, diags)))
            }
            Some(AdditionalProperties::Bool(false)) | None => None,
        };

        ObjectType {
            properties,
            required: raw.required.iter().cloned().collect(),
            additional_properties,
        }
    }
}

fn absorb(merged: &mut ObjectType, part: ObjectType) {
    for (field, node) in part.properties {
        merged.properties.insert(field, node);
    }
    merged.required.extend(part.required);
    if part.additional_properties.is_some() {
        merged.additional_properties = part.additional_properties;
    }
}

fn resolve_enum(raw: &Schema) -> SchemaNode {
    let mut nullable = false;
    let raw_values = raw
        .enum_values
        .iter()
        .flatten()
        .filter_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => {
                nullable = true;
                None
            }
            other => Some(other.to_string()),
        })
        .collect();
    SchemaNode::new(SchemaKind::Enum(EnumType { raw_values })).with_nullable(nullable)
}

fn resolve_primitive(raw: &Schema, scope: &Scope, diags: &mut Diagnostics) -> SchemaNode {
    let concrete: Vec<&str> = raw.concrete_types().collect();
    let format = raw.format.clone();
    match concrete.as_slice() {
        [] if format.is_some() => SchemaNode::primitive(BaseType::String, format),
        [] => SchemaNode::any(),
        ["string"] => SchemaNode::primitive(BaseType::String, format),
        ["integer"] => SchemaNode::primitive(BaseType::Integer, format),
        ["number"] => SchemaNode::primitive(BaseType::Number, format),
        ["boolean"] => SchemaNode::primitive(BaseType::Boolean, format),
        ["object"] => SchemaNode::primitive(BaseType::Object, None),
        // Swagger 2.0 upload parameters
        ["file"] => SchemaNode::primitive(BaseType::String, Some("binary".to_string())),
        [other] => {
            diags.push(Issue::unsupported(format!("type `{other}`"), &scope.location));
            SchemaNode::any()
        }
        many => {
            diags.push(Issue::unsupported(
                format!("multiple types [{}]", many.join(", ")),
                &scope.location,
            ));
            SchemaNode::any()
        }
    }
}
