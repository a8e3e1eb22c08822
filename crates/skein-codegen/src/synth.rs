//! Type synthesis
//!
//! Turns resolved schemas into backend-neutral [`TypeDecl`]s: inline
//! declarations are hoisted under their resolver-assigned names, every
//! identifier is made unique and escaped through the target's
//! [`LanguageProfile`], and references that close a cycle are wrapped in a
//! deferred indirection.
//!
//! Issues recorded here:
//! - [`Issue::UnsupportedSchemaConstruct`] for discriminated unions whose
//!   variants can't carry a tag (they fall back to ordered alternation)

pub mod ir;
pub mod names;

pub use ir::{
    AdditionalField, ConditionalDecl, DeclKind, EnumCase, EnumDecl, FieldDecl, FloatWidth,
    IntWidth, StringFormat, StructDecl, TaggedUnionDecl, TaggedVariant, TypeDecl, TypeExpr,
    UnionCase, UntaggedUnionDecl,
};
pub use names::NameRegistry;

use crate::backend::profile::LanguageProfile;
use crate::diagnostics::{Diagnostics, Issue, IssueKind, Outcome};
use crate::imports::{Import, ImportSet};
use crate::resolve::{
    BaseType, ConditionalType, Cycles, EnumType, ObjectType, Primitive, ReferenceGraph,
    ResolvedSchemas, SchemaKind, SchemaNode, UnionType,
};
use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;

/// Discriminator property assumed when a tagged union declares none
pub const DEFAULT_DISCRIMINATOR: &str = "type";

/// All declarations for one document
#[derive(Debug, Clone, Default)]
pub struct SynthesizedTypes {
    /// Keyed by identifier, parents ahead of the types hoisted out of them
    pub decls: IndexMap<String, TypeDecl>,
    /// Document schema name → identifier
    pub idents: HashMap<String, String>,
    /// Reference edges between declarations, by identifier
    pub graph: ReferenceGraph,
    pub cycles: Cycles,
    /// Type namespace, handed on to the binder for error types
    pub names: NameRegistry,
}

impl SynthesizedTypes {
    pub fn get(&self, ident: &str) -> Option<&TypeDecl> {
        self.decls.get(ident)
    }

    pub fn ident_for(&self, schema: &str) -> Option<&str> {
        self.idents.get(schema).map(String::as_str)
    }

    pub fn is_recursive(&self, ident: &str) -> bool {
        self.cycles.is_recursive(ident)
    }

    /// Type for a schema used outside any declaration (parameters, bodies,
    /// responses). Nothing is hoisted: inline declarations become opaque JSON.
    pub fn use_site(&self, node: &SchemaNode, resolved: &ResolvedSchemas) -> TypeExpr {
        let ty = match &node.kind {
            SchemaKind::Reference(target) => reference_expr(target, &self.idents, resolved),
            SchemaKind::Array(element) => {
                TypeExpr::Array(Box::new(self.use_site(element, resolved)))
            }
            SchemaKind::Object(obj) if obj.properties.is_empty() => TypeExpr::Map(Box::new(
                obj.additional_properties
                    .as_ref()
                    .map(|value| self.use_site(value, resolved))
                    .unwrap_or(TypeExpr::Json),
            )),
            kind if kind.is_declaration() => TypeExpr::Json,
            kind => scalar_expr(kind),
        };
        nullable(ty, node.nullable)
    }
}

fn nullable(ty: TypeExpr, nullable: bool) -> TypeExpr {
    if nullable { ty.optional() } else { ty }
}

fn reference_expr(
    target: &str,
    idents: &HashMap<String, String>,
    resolved: &ResolvedSchemas,
) -> TypeExpr {
    let Some(ident) = idents.get(target) else {
        return TypeExpr::Json;
    };
    let named = TypeExpr::Named(ident.clone());
    match resolved.get(target) {
        Some(node) if node.nullable && node.is_declaration() => named.optional(),
        _ => named,
    }
}

/// Non-declaration, non-container kinds
fn scalar_expr(kind: &SchemaKind) -> TypeExpr {
    match kind {
        SchemaKind::Primitive(p) => primitive_expr(p),
        SchemaKind::Const(value) => const_expr(value),
        SchemaKind::Null => TypeExpr::Unit,
        _ => TypeExpr::Json,
    }
}

fn primitive_expr(p: &Primitive) -> TypeExpr {
    let format = p.format.as_deref();
    match p.base {
        BaseType::String => format
            .and_then(StringFormat::parse)
            .map(TypeExpr::Format)
            .unwrap_or(TypeExpr::String),
        BaseType::Integer if format == Some("int32") => TypeExpr::Integer(IntWidth::I32),
        BaseType::Integer => TypeExpr::Integer(IntWidth::I64),
        BaseType::Number if format == Some("float") => TypeExpr::Number(FloatWidth::F32),
        BaseType::Number => TypeExpr::Number(FloatWidth::F64),
        BaseType::Boolean => TypeExpr::Boolean,
        BaseType::Object => TypeExpr::Map(Box::new(TypeExpr::Json)),
        BaseType::Any => TypeExpr::Json,
    }
}

/// Inline `const` values are typed by the value they hold
fn const_expr(value: &Value) -> TypeExpr {
    match value {
        Value::String(_) => TypeExpr::String,
        Value::Bool(_) => TypeExpr::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => TypeExpr::Integer(IntWidth::I64),
        Value::Number(_) => TypeExpr::Number(FloatWidth::F64),
        _ => TypeExpr::Json,
    }
}

/// Builds [`SynthesizedTypes`] for one target
pub struct TypeSynthesizer<'a> {
    resolved: &'a ResolvedSchemas,
    profile: &'a LanguageProfile,
    /// Issues from resolution, used to spot degraded schemas
    upstream: &'a Diagnostics,
    names: NameRegistry,
    idents: HashMap<String, String>,
    decls: IndexMap<String, TypeDecl>,
    diags: Diagnostics,
}

impl<'a> TypeSynthesizer<'a> {
    pub fn new(
        resolved: &'a ResolvedSchemas,
        profile: &'a LanguageProfile,
        upstream: &'a Diagnostics,
    ) -> Self {
        Self {
            resolved,
            profile,
            upstream,
            names: NameRegistry::new(),
            idents: HashMap::new(),
            decls: IndexMap::new(),
            diags: Diagnostics::new(),
        }
    }

    pub fn synthesize(mut self) -> Outcome<SynthesizedTypes> {
        let resolved = self.resolved;

        // Document names are claimed first so hoisted types never take them
        for name in resolved.named.keys() {
            let ident = self.names.claim(&self.profile.type_name(name));
            self.idents.insert(name.clone(), ident);
        }

        for (name, node) in &resolved.named {
            let Some(ident) = self.idents.get(name).cloned() else {
                continue;
            };
            self.reserve(&ident, name, node, true);
            let kind = match self.placeholder_reason(name, node) {
                Some(reason) => DeclKind::Placeholder(reason),
                None => self.decl_kind(name, node),
            };
            self.insert(ident, name.clone(), node, true, kind);
        }

        let mut graph = ReferenceGraph::new();
        for decl in self.decls.values() {
            graph.add_node(&decl.ident);
            for target in decl.references() {
                graph.add_edge(&decl.ident, target);
            }
        }
        let cycles = graph.cycles();

        for decl in self.decls.values_mut() {
            let ident = decl.ident.clone();
            decl.defer_references(&|target| cycles.same_cycle(&ident, target));
            if cycles.is_recursive(&ident) {
                if let DeclKind::Alias(ty) = &mut decl.kind {
                    decl.kind = DeclKind::Newtype(std::mem::replace(ty, TypeExpr::Unit));
                }
            }
            decl.imports = declared_imports(decl);
        }

        tracing::debug!(
            declarations = self.decls.len(),
            recursive = cycles.recursive_names().len(),
            "synthesized types"
        );

        Outcome::new(
            SynthesizedTypes {
                decls: self.decls,
                idents: self.idents,
                graph,
                cycles,
                names: self.names,
            },
            self.diags,
        )
    }

    /// A named schema that resolution already gave up on
    fn placeholder_reason(&self, name: &str, node: &SchemaNode) -> Option<String> {
        let degraded = matches!(
            node.kind,
            SchemaKind::Primitive(Primitive {
                base: BaseType::Any,
                ..
            })
        );
        if !degraded {
            return None;
        }
        self.upstream
            .iter()
            .filter(|issue| {
                matches!(
                    issue.kind(),
                    IssueKind::UnsupportedSchemaConstruct | IssueKind::UnresolvedReference
                )
            })
            .find(|issue| issue.location() == name)
            .map(|issue| issue.to_string())
    }

    fn insert(
        &mut self,
        ident: String,
        schema_name: String,
        node: &SchemaNode,
        from_document: bool,
        kind: DeclKind,
    ) {
        self.decls.insert(
            ident.clone(),
            TypeDecl {
                ident,
                schema_name,
                from_document,
                complex: node.kind.is_complex(),
                doc: node.description.clone(),
                kind,
                imports: ImportSet::new(),
            },
        );
    }

    /// Take the declaration's slot so it is listed ahead of what it hoists
    fn reserve(&mut self, ident: &str, schema_name: &str, node: &SchemaNode, from_document: bool) {
        self.insert(
            ident.to_string(),
            schema_name.to_string(),
            node,
            from_document,
            DeclKind::Placeholder(String::new()),
        );
    }

    /// Hoist an inline declaration and return a reference to it
    fn hoist(&mut self, node: &SchemaNode) -> TypeExpr {
        let schema_name = node.name.clone().unwrap_or_else(|| "Inline".to_string());
        let ident = self.names.claim(&self.profile.type_name(&schema_name));
        self.reserve(&ident, &schema_name, node, false);
        let kind = self.decl_kind(&schema_name, node);
        self.insert(ident.clone(), schema_name, node, false, kind);
        TypeExpr::Named(ident)
    }

    fn use_site(&mut self, node: &SchemaNode) -> TypeExpr {
        let ty = match &node.kind {
            SchemaKind::Reference(target) => reference_expr(target, &self.idents, self.resolved),
            SchemaKind::Array(element) => TypeExpr::Array(Box::new(self.use_site(element))),
            SchemaKind::Object(obj) if obj.properties.is_empty() => TypeExpr::Map(Box::new(
                match &obj.additional_properties {
                    Some(value) => self.use_site(value),
                    None => TypeExpr::Json,
                },
            )),
            kind if kind.is_declaration() => self.hoist(node),
            kind => scalar_expr(kind),
        };
        nullable(ty, node.nullable)
    }

    fn decl_kind(&mut self, schema_name: &str, node: &SchemaNode) -> DeclKind {
        match &node.kind {
            SchemaKind::Object(obj) | SchemaKind::Composition(obj) => {
                DeclKind::Struct(self.struct_decl(obj))
            }
            SchemaKind::Enum(e) => DeclKind::Enum(self.enum_decl(e)),
            SchemaKind::Union(union) => self.union_decl(schema_name, union),
            SchemaKind::Conditional(cond) => DeclKind::Conditional(self.conditional_decl(cond)),
            SchemaKind::Const(value) => DeclKind::Constant(value.clone()),
            // Named aliases carry their own nullability
            _ => DeclKind::Alias(self.use_site(node)),
        }
    }

    fn struct_decl(&mut self, obj: &ObjectType) -> StructDecl {
        let mut field_names = NameRegistry::new();
        let mut fields = Vec::with_capacity(obj.properties.len());
        for (wire_name, prop) in &obj.properties {
            let required = obj.required.contains(wire_name);
            let ty = self.use_site(prop);
            fields.push(FieldDecl {
                wire_name: wire_name.clone(),
                ident: field_names.claim(&self.profile.field_name(wire_name)),
                ty: if required { ty } else { ty.optional() },
                required,
                doc: prop.description.clone(),
            });
        }

        let additional = match &obj.additional_properties {
            Some(value) => Some(AdditionalField {
                ident: field_names.claim(&self.profile.field_name("additional_properties")),
                value: self.use_site(value),
            }),
            None => None,
        };

        StructDecl { fields, additional }
    }

    fn enum_decl(&self, e: &EnumType) -> EnumDecl {
        let mut case_names = NameRegistry::new();
        let cases = e
            .raw_values
            .iter()
            .unique()
            .map(|raw| EnumCase {
                ident: case_names.claim(&self.profile.variant_name(raw)),
                raw: raw.clone(),
            })
            .collect();
        EnumDecl { cases }
    }

    fn conditional_decl(&mut self, cond: &ConditionalType) -> ConditionalDecl {
        let mut branch = |b: &Option<Box<SchemaNode>>| match b {
            Some(node) => self.use_site(node),
            None => TypeExpr::Json,
        };
        let then_ty = branch(&cond.then_branch);
        let else_ty = branch(&cond.else_branch);
        ConditionalDecl { then_ty, else_ty }
    }

    fn object_like(&self, node: &SchemaNode) -> bool {
        let kind = match &node.kind {
            SchemaKind::Reference(target) => match self.resolved.get(target) {
                Some(target) => &target.kind,
                None => return false,
            },
            kind => kind,
        };
        matches!(kind, SchemaKind::Object(_) | SchemaKind::Composition(_))
    }

    fn union_decl(&mut self, parent: &str, union: &UnionType) -> DeclKind {
        let mut case_names = NameRegistry::new();
        let mut cases = Vec::with_capacity(union.variants.len());
        let mut all_objects = true;

        for variant in &union.variants {
            all_objects &= self.object_like(&variant.node);
            let ty = self.use_site(&variant.node);
            let label = variant
                .name
                .strip_prefix(parent)
                .filter(|rest| !rest.is_empty())
                .unwrap_or(&variant.name);
            let ident = case_names.claim(&self.profile.variant_name(label));
            cases.push((ident, ty, variant.name.as_str()));
        }

        let tagged = union.exclusive && all_objects && !cases.is_empty();
        if union.discriminator.is_some() && !tagged {
            self.diags.push(Issue::unsupported(
                "discriminator over variants that are not all objects",
                parent,
            ));
        }

        if !tagged {
            return DeclKind::UntaggedUnion(UntaggedUnionDecl {
                variants: cases
                    .into_iter()
                    .map(|(ident, ty, _)| UnionCase { ident, ty })
                    .collect(),
            });
        }

        let field = union
            .discriminator_field()
            .unwrap_or(DEFAULT_DISCRIMINATOR)
            .to_string();
        let variants = cases
            .into_iter()
            .map(|(ident, ty, schema_name)| {
                let mut tags: Vec<String> = union
                    .discriminator
                    .iter()
                    .flat_map(|d| d.mapping.iter())
                    .filter(|(_, target)| target.as_str() == schema_name)
                    .map(|(value, _)| value.clone())
                    .collect();
                if tags.is_empty() {
                    tags.push(schema_name.to_lowercase());
                }
                TaggedVariant { ident, ty, tags }
            })
            .collect();
        DeclKind::TaggedUnion(TaggedUnionDecl { field, variants })
    }
}

fn declared_imports(decl: &TypeDecl) -> ImportSet {
    let mut imports = ImportSet::new();
    for ty in decl.type_exprs() {
        ty.declare_imports(&mut imports);
    }
    match &decl.kind {
        DeclKind::Placeholder(_) => imports.insert(Import::Decode),
        _ if decl.has_codec() => {
            imports.insert(Import::Decode);
            imports.insert(Import::Encode);
        }
        _ => {}
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::profile::{RUST, TYPESCRIPT};
    use crate::document::Document;
    use crate::resolve::SchemaResolver;

    fn synthesize(json: &str) -> (SynthesizedTypes, Diagnostics) {
        synthesize_for(json, &RUST)
    }

    fn synthesize_for(json: &str, profile: &LanguageProfile) -> (SynthesizedTypes, Diagnostics) {
        let doc: Document = serde_json::from_str(json).expect("parse document");
        let mut diags = Diagnostics::new();
        let resolved = SchemaResolver::new(&doc).resolve_all().drain_into(&mut diags);
        let types = TypeSynthesizer::new(&resolved, profile, &diags)
            .synthesize()
            .drain_into(&mut Diagnostics::new());
        (types, diags)
    }

    fn decl<'t>(types: &'t SynthesizedTypes, ident: &str) -> &'t TypeDecl {
        types
            .get(ident)
            .unwrap_or_else(|| panic!("no declaration {ident}; have {:?}", types.decls.keys()))
    }

    fn struct_of<'t>(types: &'t SynthesizedTypes, ident: &str) -> &'t StructDecl {
        match &decl(types, ident).kind {
            DeclKind::Struct(s) => s,
            other => panic!("{ident} is not a struct: {other:?}"),
        }
    }

    #[test]
    fn required_and_optional_fields() {
        let (types, _) = synthesize(
            r#"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "User": {"type": "object", "required": ["id", "nickname"], "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "nickname": {"type": "string", "nullable": true},
                    "email": {"type": "string", "format": "email"},
                    "type": {"type": "string"}
                }}
            }}}"#,
        );
        let user = struct_of(&types, "User");
        let fields: Vec<_> = user
            .fields
            .iter()
            .map(|f| (f.ident.as_str(), f.ty.clone(), f.required))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("id", TypeExpr::Integer(IntWidth::I64), true),
                ("nickname", TypeExpr::String.optional(), true),
                ("email", TypeExpr::Format(StringFormat::Email).optional(), false),
                ("type_", TypeExpr::String.optional(), false),
            ]
        );
        assert_eq!(user.fields[3].wire_name, "type");

        let imports = &decl(&types, "User").imports;
        assert!(imports.contains(Import::Decode));
        assert!(imports.contains(Import::Encode));
        assert_eq!(imports.formats().collect::<Vec<_>>(), vec![StringFormat::Email]);
    }

    #[test]
    fn open_map_only_object_has_one_field() {
        let (types, _) = synthesize(
            r#"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Metadata": {"type": "object", "additionalProperties": true}
            }}}"#,
        );
        let metadata = struct_of(&types, "Metadata");
        assert!(metadata.fields.is_empty());
        let extra = metadata.additional.as_ref().expect("open map field");
        assert_eq!(extra.ident, "additional_properties");
        assert_eq!(extra.value, TypeExpr::Json);
    }

    #[test]
    fn inline_objects_are_hoisted_after_their_parent() {
        let (types, _) = synthesize(
            r#"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Order": {"type": "object", "properties": {
                    "shipping": {"type": "object", "properties": {"street": {"type": "string"}}},
                    "status": {"type": "string", "enum": ["placed", "shipped", "placed"]}
                }},
                "ShippingObject": {"type": "string"}
            }}}"#,
        );
        let order = struct_of(&types, "Order");
        // the document already owns `ShippingObject`
        assert_eq!(order.fields[0].ty, TypeExpr::Named("ShippingObject2".into()).optional());
        assert_eq!(order.fields[1].ty, TypeExpr::Named("StatusEnum".into()).optional());

        let order_pos = types.decls.get_index_of("Order");
        let hoisted_pos = types.decls.get_index_of("ShippingObject2");
        assert!(order_pos < hoisted_pos);
        assert!(!decl(&types, "ShippingObject2").from_document);

        let DeclKind::Enum(status) = &decl(&types, "StatusEnum").kind else {
            panic!("expected enum");
        };
        let raws: Vec<_> = status.cases.iter().map(|c| c.raw.as_str()).collect();
        assert_eq!(raws, vec!["placed", "shipped"]);
    }

    #[test]
    fn recursion_is_deferred() {
        let (types, _) = synthesize(
            r##"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "TreeNode": {"type": "object", "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/TreeNode"}},
                    "meta": {"$ref": "#/components/schemas/Meta"}
                }},
                "Meta": {"type": "object", "properties": {"label": {"type": "string"}}}
            }}}"##,
        );
        let tree = struct_of(&types, "TreeNode");
        assert!(tree.fields[0].ty.is_deferred());
        assert!(!tree.fields[1].ty.is_deferred());
        assert!(types.is_recursive("TreeNode"));
        assert!(!types.is_recursive("Meta"));
    }

    #[test]
    fn recursive_alias_becomes_newtype() {
        let (types, _) = synthesize(
            r##"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Forest": {"type": "array", "items": {"$ref": "#/components/schemas/Forest"}},
                "Names": {"type": "array", "items": {"type": "string"}}
            }}}"##,
        );
        let forest = decl(&types, "Forest");
        let DeclKind::Newtype(inner) = &forest.kind else {
            panic!("expected newtype, got {:?}", forest.kind);
        };
        assert_eq!(
            *inner,
            TypeExpr::Array(Box::new(TypeExpr::Deferred(Box::new(TypeExpr::Named(
                "Forest".into()
            )))))
        );
        assert!(forest.has_codec());
        assert!(forest.imports.contains(Import::Decode));
        assert!(forest.imports.contains(Import::Encode));

        let names = decl(&types, "Names");
        assert!(matches!(names.kind, DeclKind::Alias(_)));
        assert!(!names.has_codec());
    }

    #[test]
    fn discriminated_union_uses_mapping_then_lowercased_names() {
        let (types, _) = synthesize(
            r##"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Cat": {"type": "object", "properties": {"petType": {"type": "string"}}},
                "Dog": {"type": "object", "properties": {"petType": {"type": "string"}}},
                "Pet": {
                    "oneOf": [{"$ref": "#/components/schemas/Cat"}, {"$ref": "#/components/schemas/Dog"}],
                    "discriminator": {"propertyName": "petType", "mapping": {"kitty": "#/components/schemas/Cat"}}
                }
            }}}"##,
        );
        let DeclKind::TaggedUnion(pet) = &decl(&types, "Pet").kind else {
            panic!("expected tagged union");
        };
        assert_eq!(pet.field, "petType");
        assert_eq!(pet.variants[0].ident, "Cat");
        assert_eq!(pet.variants[0].tags, vec!["kitty".to_string()]);
        assert_eq!(pet.variants[1].tags, vec!["dog".to_string()]);
    }

    #[test]
    fn union_of_primitives_is_untagged() {
        let (types, diags) = synthesize(
            r#"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Id": {"oneOf": [{"type": "string"}, {"type": "integer"}]}
            }}}"#,
        );
        let DeclKind::UntaggedUnion(id) = &decl(&types, "Id").kind else {
            panic!("expected untagged union");
        };
        let idents: Vec<_> = id.variants.iter().map(|v| v.ident.as_str()).collect();
        assert_eq!(idents, vec!["Option1", "Option2"]);
        assert_eq!(id.variants[0].ty, TypeExpr::String);
        assert!(diags.is_empty());
    }

    #[test]
    fn degraded_schema_becomes_placeholder() {
        let (types, diags) = synthesize(
            r#"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Weird": {"type": ["string", "integer"]}
            }}}"#,
        );
        let DeclKind::Placeholder(reason) = &decl(&types, "Weird").kind else {
            panic!("expected placeholder");
        };
        assert!(reason.contains("multiple types"));
        assert_eq!(diags.of_kind(IssueKind::UnsupportedSchemaConstruct).count(), 1);
    }

    #[test]
    fn reserved_type_names_are_escaped() {
        let (types, _) = synthesize_for(
            r#"{"openapi": "3.0.0", "paths": {}, "components": {"schemas": {
                "Result": {"type": "object", "properties": {"default": {"type": "boolean"}}}
            }}}"#,
            &TYPESCRIPT,
        );
        assert_eq!(types.ident_for("Result"), Some("ResultSchema"));
        let result = struct_of(&types, "ResultSchema");
        assert_eq!(result.fields[0].ident, "default_");
    }
}
