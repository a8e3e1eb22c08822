use crate::backend::Validation;
use crate::bind::{BoundOperations, OperationBinding};
use crate::imports::ImportSet;
use crate::synth::{SynthesizedTypes, TypeDecl};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Everything in one module
    Single,
    /// Root runtime module, type group modules and an operations module
    Split,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitRole {
    Single,
    /// Split-layout parent of every other unit
    Root { submodules: Vec<String> },
    Types,
    Operations,
}

/// What goes into one module, before rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ModulePlan {
    /// Short module name
    pub name: String,
    pub qualified_name: String,
    /// Path relative to the output directory
    pub relative_path: PathBuf,
    pub role: UnitRole,
    /// Declaration identifiers, in emission order
    pub decls: Vec<String>,
    /// Indices into [`BoundOperations::operations`]
    pub operations: Vec<usize>,
    pub imports: ImportSet,
    /// Sibling module → declarations used from it
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl ModulePlan {
    pub fn new(
        name: &str,
        qualified_name: String,
        relative_path: PathBuf,
        role: UnitRole,
    ) -> Self {
        Self {
            name: name.to_string(),
            qualified_name,
            relative_path,
            role,
            decls: Vec::new(),
            operations: Vec::new(),
            imports: ImportSet::new(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Carries the client configuration type
    pub fn has_config(&self) -> bool {
        matches!(self.role, UnitRole::Single | UnitRole::Operations)
    }

    /// Carries the codec runtime, format aliases and HTTP support types
    pub fn has_runtime(&self) -> bool {
        matches!(self.role, UnitRole::Single | UnitRole::Root { .. })
    }

    pub fn is_child(&self) -> bool {
        matches!(self.role, UnitRole::Types | UnitRole::Operations)
    }
}

/// Document `info` copied into module headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiMeta {
    pub title: String,
    pub description: String,
    pub version: String,
}

/// Everything a backend sees while rendering one module
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    pub plan: &'a ModulePlan,
    pub module_prefix: &'a str,
    pub types: &'a SynthesizedTypes,
    pub bound: &'a BoundOperations,
    /// Requirements across the whole output; the runtime defines what these name
    pub runtime_imports: &'a ImportSet,
}

impl<'a> ModuleContext<'a> {
    pub fn decls(&self) -> impl Iterator<Item = &'a TypeDecl> + 'a {
        let types = self.types;
        self.plan.decls.iter().filter_map(move |ident| types.get(ident))
    }

    pub fn operations(&self) -> impl Iterator<Item = &'a OperationBinding> + 'a {
        let bound = self.bound;
        self.plan
            .operations
            .iter()
            .filter_map(move |&i| bound.operations.get(i))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleHeader {
    pub module_name: String,
    pub api_title: String,
    pub api_description: String,
    pub api_version: String,
    pub generated_at: String,
}

/// One emitted output file
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleUnit {
    pub qualified_name: String,
    pub relative_path: PathBuf,
    pub role: UnitRole,
    pub header: ModuleHeader,
    /// Data types, client configuration and error types
    pub type_declarations: Vec<String>,
    pub decode_declarations: Vec<String>,
    pub encode_declarations: Vec<String>,
    /// Request functions, signature and body joined
    pub operation_declarations: Vec<String>,
    /// Shared support code; empty outside the root or single module
    pub runtime: String,
    pub imports: ImportSet,
    /// Module wiring lines (submodule declarations, sibling imports), by key
    pub import_lines: BTreeMap<String, String>,
    /// Diagnostics rendered at the head of the module
    pub notes: Vec<String>,
    /// Rendered module text
    pub source: String,
    pub validation: Validation,
}

/// Assembler output
#[derive(Debug, Clone)]
pub struct Assembly {
    pub units: Vec<ModuleUnit>,
    pub layout: Layout,
    /// Identifiers of every emitted declaration
    pub reachable: BTreeSet<String>,
}
