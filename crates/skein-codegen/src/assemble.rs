//! Module assembly
//!
//! Runs after every operation is bound. Computes the set of declarations
//! reachable from the operations, picks a layout and renders one
//! [`ModuleUnit`] per output file through the selected backend.
//!
//! Single layout puts everything into one module. Split layout kicks in
//! for large documents and produces:
//! - a root module holding the shared runtime and the submodule list
//! - one module per type group, keyed by the first character of the type name
//! - an `operations` module with the request functions, the client
//!   configuration and the per-operation error types

pub mod unit;

pub use unit::{
    ApiMeta, Assembly, Layout, ModuleContext, ModuleHeader, ModulePlan, ModuleUnit, UnitRole,
};

use crate::backend::{Backend, Template};
use crate::bind::BoundOperations;
use crate::diagnostics::Diagnostics;
use crate::imports::{Import, ImportSet};
use crate::synth::SynthesizedTypes;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Reachable document schemas above which the output is split
pub const SPLIT_SCHEMA_THRESHOLD: usize = 50;
/// Reachable complex schemas above which the output is split
pub const SPLIT_COMPLEX_THRESHOLD: usize = 20;
/// Characters of the type name used to pick its group module
pub const GROUP_PREFIX_LEN: usize = 1;

/// Name of the split-layout module carrying the operations
pub const OPERATIONS_MODULE: &str = "operations";

/// Declarations reachable from any operation's parameters, body or responses
pub fn reachable(types: &SynthesizedTypes, bound: &BoundOperations) -> BTreeSet<String> {
    let roots: Vec<&str> = bound
        .operations
        .iter()
        .flat_map(|op| op.references())
        .collect();
    types.graph.reachable_from(roots)
}

pub fn choose_layout(types: &SynthesizedTypes, reachable: &BTreeSet<String>) -> Layout {
    let decls = reachable.iter().filter_map(|ident| types.get(ident));
    let (mut named, mut complex) = (0, 0);
    for decl in decls {
        named += usize::from(decl.from_document);
        complex += usize::from(decl.complex);
    }
    if named > SPLIT_SCHEMA_THRESHOLD || complex > SPLIT_COMPLEX_THRESHOLD {
        tracing::debug!(named, complex, "switching to split layout");
        Layout::Split
    } else {
        Layout::Single
    }
}

/// Group module a type identifier lands in
pub fn group_of(ident: &str) -> String {
    let prefix: String = ident.chars().take(GROUP_PREFIX_LEN).collect();
    if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        format!("types_{}", prefix.to_ascii_lowercase())
    } else {
        "types_misc".to_string()
    }
}

/// Assembles the final module units for one backend
pub struct ModuleAssembler<'a> {
    backend: &'a dyn Backend,
    template: &'a Template,
    types: &'a SynthesizedTypes,
    bound: &'a BoundOperations,
    diagnostics: &'a Diagnostics,
    meta: ApiMeta,
    module_prefix: String,
    generated_at: String,
}

impl<'a> ModuleAssembler<'a> {
    pub fn new(
        backend: &'a dyn Backend,
        template: &'a Template,
        types: &'a SynthesizedTypes,
        bound: &'a BoundOperations,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            backend,
            template,
            types,
            bound,
            diagnostics,
            meta: ApiMeta::default(),
            module_prefix: backend.default_module_prefix().to_string(),
            generated_at: String::new(),
        }
    }

    pub fn meta(mut self, meta: ApiMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn module_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.module_prefix = prefix.into();
        self
    }

    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = timestamp.into();
        self
    }

    pub fn assemble(&self) -> Assembly {
        let reachable = reachable(self.types, self.bound);
        let pruned = self.types.decls.len().saturating_sub(reachable.len());
        if pruned > 0 {
            tracing::debug!(pruned, "dropping declarations no operation reaches");
        }

        let layout = choose_layout(self.types, &reachable);
        let plans = self.plan(layout, &reachable);
        let runtime_imports = self.runtime_imports(&plans);

        let units = plans
            .iter()
            .map(|plan| {
                let ctx = ModuleContext {
                    plan,
                    module_prefix: &self.module_prefix,
                    types: self.types,
                    bound: self.bound,
                    runtime_imports: &runtime_imports,
                };
                self.render(&ctx)
            })
            .collect();

        Assembly {
            units,
            layout,
            reachable,
        }
    }

    fn plan(&self, layout: Layout, reachable: &BTreeSet<String>) -> Vec<ModulePlan> {
        let decls: Vec<String> = self
            .types
            .decls
            .keys()
            .filter(|ident| reachable.contains(*ident))
            .cloned()
            .collect();
        let operations: Vec<usize> = (0..self.bound.operations.len()).collect();
        let sep = self.backend.module_separator();

        if layout == Layout::Single {
            let mut plan = ModulePlan::new(
                &self.module_prefix,
                self.module_prefix.clone(),
                self.backend.output_path(Path::new(""), &self.module_prefix),
                UnitRole::Single,
            );
            plan.decls = decls;
            plan.operations = operations;
            plan.imports = self.plan_imports(&plan);
            return vec![plan];
        }

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for ident in decls {
            groups.entry(group_of(&ident)).or_default().push(ident);
        }

        let mut children: Vec<ModulePlan> = groups
            .into_iter()
            .map(|(name, decls)| {
                let mut plan = self.child_plan(&name, UnitRole::Types, sep);
                plan.decls = decls;
                plan
            })
            .collect();
        let mut ops = self.child_plan(OPERATIONS_MODULE, UnitRole::Operations, sep);
        ops.operations = operations;
        children.push(ops);

        let home: HashMap<String, String> = children
            .iter()
            .flat_map(|plan| plan.decls.iter().map(|d| (d.clone(), plan.name.clone())))
            .collect();
        for plan in &mut children {
            plan.imports = self.plan_imports(plan);
            plan.dependencies = self.dependencies(plan, &home);
        }

        let mut root = ModulePlan::new(
            &self.module_prefix,
            self.module_prefix.clone(),
            self.backend.output_path(Path::new(""), &self.module_prefix),
            UnitRole::Root {
                submodules: children.iter().map(|c| c.name.clone()).collect(),
            },
        );
        root.imports = self.plan_imports(&root);

        let mut plans = vec![root];
        plans.extend(children);
        plans
    }

    fn child_plan(&self, name: &str, role: UnitRole, sep: &str) -> ModulePlan {
        ModulePlan::new(
            name,
            format!("{}{sep}{name}", self.module_prefix),
            self.backend.submodule_path(Path::new(""), &self.module_prefix, name),
            role,
        )
    }

    /// Union of the requirements declared by everything the module holds
    fn plan_imports(&self, plan: &ModulePlan) -> ImportSet {
        let mut imports = ImportSet::new();
        for decl in plan.decls.iter().filter_map(|ident| self.types.get(ident)) {
            imports.merge(&decl.imports);
        }
        for op in plan.operations.iter().filter_map(|&i| self.bound.operations.get(i)) {
            imports.merge(&op.imports);
        }
        if plan.has_config() {
            imports.insert(Import::Http);
        }
        if plan.has_runtime() {
            // The runtime defines the codec traits and their container impls
            imports.insert(Import::Map);
            imports.insert(Import::Decode);
            imports.insert(Import::Encode);
        }
        imports
    }

    /// What the runtime must define: every format in use, and HTTP support
    /// when any operation exists
    fn runtime_imports(&self, plans: &[ModulePlan]) -> ImportSet {
        let mut imports = ImportSet::new();
        for plan in plans {
            imports.merge(&plan.imports);
        }
        imports
    }

    /// Declarations a child module uses from its siblings, by module
    fn dependencies(
        &self,
        plan: &ModulePlan,
        home: &HashMap<String, String>,
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut used: Vec<&str> = plan
            .decls
            .iter()
            .filter_map(|ident| self.types.get(ident))
            .flat_map(|decl| decl.references())
            .collect();
        used.extend(
            plan.operations
                .iter()
                .filter_map(|&i| self.bound.operations.get(i))
                .flat_map(|op| op.references()),
        );

        let mut deps: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for ident in used {
            match home.get(ident) {
                Some(module) if *module != plan.name => {
                    deps.entry(module.clone()).or_default().insert(ident.to_string());
                }
                _ => {}
            }
        }
        deps
    }

    fn render(&self, ctx: &ModuleContext<'_>) -> ModuleUnit {
        let plan = ctx.plan;
        let backend = self.backend;

        let mut type_declarations = backend.generate_types(ctx);
        if plan.has_config() {
            type_declarations.push(backend.generate_config(ctx));
        }
        type_declarations.extend(backend.generate_error_types(ctx));

        let operation_declarations = backend
            .generate_requests(ctx)
            .into_iter()
            .map(|(signature, body)| format!("{signature} {body}"))
            .collect();

        let notes = if plan.has_runtime() {
            self.diagnostics.iter().map(|issue| issue.to_string()).collect()
        } else {
            Vec::new()
        };

        let mut unit = ModuleUnit {
            qualified_name: plan.qualified_name.clone(),
            relative_path: plan.relative_path.clone(),
            role: plan.role.clone(),
            header: ModuleHeader {
                module_name: plan.name.clone(),
                api_title: self.meta.title.clone(),
                api_description: self.meta.description.clone(),
                api_version: self.meta.version.clone(),
                generated_at: self.generated_at.clone(),
            },
            type_declarations,
            decode_declarations: backend.generate_decoders(ctx),
            encode_declarations: backend.generate_encoders(ctx),
            operation_declarations,
            runtime: if plan.has_runtime() {
                backend.generate_runtime(ctx)
            } else {
                String::new()
            },
            imports: plan.imports.clone(),
            import_lines: backend.import_lines(ctx),
            notes,
            source: String::new(),
            validation: Default::default(),
        };

        unit.source = backend.generate_module(&unit, self.template);
        unit.validation = backend.validate_output(&unit, &unit.source);
        for problem in &unit.validation.problems {
            tracing::warn!(
                module = %unit.qualified_name,
                "generated module failed validation: {problem}"
            );
        }
        unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RustBackend;
    use crate::bind::{ClientDefaults, OperationBinder};
    use crate::document::Document;
    use crate::resolve::SchemaResolver;
    use crate::synth::TypeSynthesizer;
    use serde_json::{Value, json};

    fn assemble(doc: Value) -> Assembly {
        let doc: Document = serde_json::from_value(doc).expect("parse document");
        let backend = RustBackend;
        let profile = backend.profile();
        let mut diags = Diagnostics::new();
        let resolved = SchemaResolver::new(&doc).resolve_all().drain_into(&mut diags);
        let mut types = TypeSynthesizer::new(&resolved, profile, &diags)
            .synthesize()
            .drain_into(&mut diags);
        let mut names = std::mem::take(&mut types.names);
        let bound = OperationBinder::new(&doc, &resolved, &types, profile, &ClientDefaults::default())
            .bind_all(&mut names)
            .drain_into(&mut diags);
        let template = backend.template().expect("builtin template");
        ModuleAssembler::new(&backend, &template, &types, &bound, &diags)
            .generated_at("2024-01-01T00:00:00Z")
            .assemble()
    }

    fn catalog(items: usize) -> Value {
        let mut schemas = serde_json::Map::new();
        let mut properties = serde_json::Map::new();
        for i in 0..items {
            schemas.insert(
                format!("Item{i}"),
                json!({"type": "object", "properties": {"label": {"type": "string"}}}),
            );
            properties.insert(
                format!("item{i}"),
                json!({"$ref": format!("#/components/schemas/Item{i}")}),
            );
        }
        properties.insert(
            "broken".into(),
            json!({"$ref": "#/components/schemas/Missing"}),
        );
        schemas.insert(
            "Catalog".into(),
            json!({"type": "object", "properties": properties}),
        );
        schemas.insert(
            "Orphan".into(),
            json!({"type": "object", "properties": {"id": {"type": "integer"}}}),
        );
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Catalog", "version": "1.0"},
            "paths": {
                "/catalog": {
                    "get": {
                        "operationId": "getCatalog",
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {"application/json": {
                                    "schema": {"$ref": "#/components/schemas/Catalog"}
                                }}
                            }
                        }
                    }
                }
            },
            "components": {"schemas": schemas}
        })
    }

    #[test]
    fn group_names() {
        assert_eq!(group_of("Pet"), "types_p");
        assert_eq!(group_of("user"), "types_u");
        assert_eq!(group_of("_Hidden"), "types_misc");
        assert_eq!(group_of(""), "types_misc");
    }

    #[test]
    fn small_document_is_one_module() {
        let assembly = assemble(catalog(3));
        assert_eq!(assembly.layout, Layout::Single);
        assert_eq!(assembly.units.len(), 1);

        let unit = &assembly.units[0];
        assert_eq!(unit.relative_path, Path::new("api.rs"));
        assert_eq!(unit.role, UnitRole::Single);
        assert!(unit.source.contains("pub struct Catalog"));
        assert!(unit.source.contains("pub struct Item2"));
        assert!(unit.source.contains("pub async fn get_catalog("));
    }

    #[test]
    fn unreachable_schemas_are_pruned() {
        let assembly = assemble(catalog(3));
        assert!(assembly.reachable.contains("Catalog"));
        assert!(assembly.reachable.contains("Item0"));
        assert!(!assembly.reachable.contains("Orphan"));
        assert!(!assembly.units[0].source.contains("pub struct Orphan"));
    }

    #[test]
    fn large_document_splits() {
        let assembly = assemble(catalog(60));
        assert_eq!(assembly.layout, Layout::Split);

        let root = &assembly.units[0];
        assert_eq!(root.relative_path, Path::new("api.rs"));
        let UnitRole::Root { submodules } = &root.role else {
            panic!("first unit should be the root, got {:?}", root.role);
        };
        assert!(submodules.contains(&"types_c".to_string()));
        assert!(submodules.contains(&"types_i".to_string()));
        assert!(submodules.contains(&OPERATIONS_MODULE.to_string()));
        assert_eq!(assembly.units.len(), submodules.len() + 1);

        let items = assembly
            .units
            .iter()
            .find(|u| u.qualified_name == "api::types_i")
            .expect("types_i module");
        assert_eq!(items.relative_path, Path::new("api/types_i.rs"));
        assert!(items.source.contains("pub struct Item59"));
        assert!(!items.source.contains("pub struct Catalog"));
    }

    #[test]
    fn notes_only_in_root() {
        let assembly = assemble(catalog(60));
        let root = &assembly.units[0];
        assert!(root.notes.iter().any(|note| note.contains("Missing")));
        for child in &assembly.units[1..] {
            assert!(child.notes.is_empty(), "{} has notes", child.qualified_name);
        }
    }
}
