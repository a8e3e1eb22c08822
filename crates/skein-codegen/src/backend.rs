//! Target backends
//!
//! A backend turns the shared, language-neutral declarations and bindings
//! into source text for one language. Naming, escaping and the primitive
//! table live in its [`LanguageProfile`]; the synthesizer and binder are
//! written once against that profile. Everything a backend emits goes
//! through a [`Template`].
//!
//! Every generation entry point is total. A declaration that can't be
//! rendered becomes a placeholder comment, and a template that fails to
//! render falls back to [`Backend::fallback_module`].

pub mod profile;
pub mod rust;
pub mod template;
pub mod typescript;

pub use profile::{Case, LanguageProfile, PrimitiveTable};
pub use rust::RustBackend;
pub use template::Template;
pub use typescript::TypeScriptBackend;

use crate::assemble::{ModuleContext, ModuleUnit};
use crate::error::{CodegenError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Structural check of one rendered module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub problems: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problem(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn default_module_prefix(&self) -> &'static str;

    /// Joins a module prefix and a submodule name in qualified names
    fn module_separator(&self) -> &'static str;

    fn profile(&self) -> &'static LanguageProfile;

    fn default_template(&self) -> &'static str;

    /// Data type declarations for the module's types
    fn generate_types(&self, ctx: &ModuleContext<'_>) -> Vec<String>;

    fn generate_decoders(&self, ctx: &ModuleContext<'_>) -> Vec<String>;

    fn generate_encoders(&self, ctx: &ModuleContext<'_>) -> Vec<String>;

    /// One error type per operation that declares error statuses
    fn generate_error_types(&self, ctx: &ModuleContext<'_>) -> Vec<String>;

    /// Client configuration type
    fn generate_config(&self, ctx: &ModuleContext<'_>) -> String;

    /// `(signature, body)` per operation
    fn generate_requests(&self, ctx: &ModuleContext<'_>) -> Vec<(String, String)>;

    /// Codec runtime, format aliases and transport support
    fn generate_runtime(&self, ctx: &ModuleContext<'_>) -> String;

    /// Lines wiring this module to its parent or siblings
    fn import_lines(&self, _ctx: &ModuleContext<'_>) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn validate_output(&self, unit: &ModuleUnit, source: &str) -> Validation;

    /// Module text used when the template fails to render
    fn fallback_module(&self, unit: &ModuleUnit) -> String;

    fn template(&self) -> Result<Template> {
        Template::parse(self.default_template(), format!("<builtin {}>", self.name()))
    }

    fn generate_module(&self, unit: &ModuleUnit, template: &Template) -> String {
        match template.render(unit) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(
                    module = %unit.qualified_name,
                    template = %template.origin().display(),
                    "template failed to render, using the minimal fallback: {err}"
                );
                self.fallback_module(unit)
            }
        }
    }

    /// File of the single or root module
    fn output_path(&self, base: &Path, prefix: &str) -> PathBuf {
        base.join(format!("{prefix}.{}", self.file_extension()))
    }

    /// File of a split-layout child module
    fn submodule_path(&self, base: &Path, prefix: &str, name: &str) -> PathBuf {
        base.join(prefix)
            .join(format!("{name}.{}", self.file_extension()))
    }
}

/// Names accepted by [`by_name`]
pub fn available() -> Vec<String> {
    vec!["rust".to_string(), "typescript".to_string()]
}

pub fn by_name(name: &str) -> Result<Box<dyn Backend>> {
    match name.to_ascii_lowercase().as_str() {
        "rust" | "rs" => Ok(Box::new(RustBackend)),
        "typescript" | "ts" => Ok(Box::new(TypeScriptBackend)),
        _ => Err(CodegenError::UnknownTarget {
            name: name.to_string(),
            available: available(),
        }),
    }
}

/// Sections shared by both fallback modules, in template order
pub(crate) fn fallback_sections(unit: &ModuleUnit) -> Vec<&str> {
    let mut sections: Vec<&str> = unit.import_lines.values().map(String::as_str).collect();
    sections.push(&unit.runtime);
    sections.extend(unit.type_declarations.iter().map(String::as_str));
    sections.extend(unit.decode_declarations.iter().map(String::as_str));
    sections.extend(unit.encode_declarations.iter().map(String::as_str));
    sections.extend(unit.operation_declarations.iter().map(String::as_str));
    sections.retain(|s| !s.trim().is_empty());
    sections
}
