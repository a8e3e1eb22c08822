//! Module templates
//!
//! A template is a tera document that lays out one output module. It must
//! reference every content placeholder and gate each import block on its
//! requirement flag; both are checked when the template is loaded.

use crate::assemble::ModuleUnit;
use crate::error::{CodegenError, Result};
use crate::imports::Import;
use regex::Regex;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Content placeholders every template must reference
pub const REQUIRED_PLACEHOLDERS: [&str; 8] = [
    "module_name",
    "api_description",
    "generated_at",
    "types",
    "decoders",
    "encoders",
    "requests",
    "runtime",
];

const TEMPLATE_NAME: &str = "module";

#[derive(Debug, Clone)]
pub struct Template {
    origin: PathBuf,
    tera: Tera,
}

impl Template {
    /// Parse and validate template text
    pub fn parse(source: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let origin = origin.into();
        let missing = missing_placeholders(source);
        if !missing.is_empty() {
            return Err(CodegenError::TemplateMissingPlaceholder {
                path: origin,
                missing,
            });
        }

        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| CodegenError::Other {
                message: format!("Failed to parse template {}", origin.display()),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { origin, tera })
    }

    /// Read a template from disk
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| {
            CodegenError::TemplateUnavailable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "loaded custom template");
        Self::parse(&source, path)
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn render(&self, unit: &ModuleUnit) -> std::result::Result<String, tera::Error> {
        self.tera.render(TEMPLATE_NAME, &context(unit))
    }
}

fn context(unit: &ModuleUnit) -> Context {
    let mut ctx = Context::new();
    ctx.insert("module_name", &unit.header.module_name);
    ctx.insert("qualified_name", &unit.qualified_name);
    ctx.insert("api_title", &unit.header.api_title);
    ctx.insert("api_version", &unit.header.api_version);
    ctx.insert("api_description", &one_line(&unit.header.api_description));
    ctx.insert("generated_at", &unit.header.generated_at);
    let notes: Vec<String> = unit.notes.iter().map(|note| one_line(note)).collect();
    ctx.insert("notes", &notes);
    ctx.insert("types", &unit.type_declarations.join("\n\n"));
    ctx.insert("decoders", &unit.decode_declarations.join("\n\n"));
    ctx.insert("encoders", &unit.encode_declarations.join("\n\n"));
    ctx.insert("requests", &unit.operation_declarations.join("\n\n"));
    ctx.insert("runtime", &unit.runtime);
    ctx.insert("imports", &unit.import_lines);
    for import in Import::ALL {
        ctx.insert(import.flag(), &unit.imports.contains(import));
    }
    ctx
}

/// Header text has to fit inside a line comment
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Placeholders and flags `source` fails to reference
pub fn missing_placeholders(source: &str) -> Vec<String> {
    let mut missing = Vec::new();
    for name in REQUIRED_PLACEHOLDERS {
        let pattern = format!(r"\{{\{{-?\s*{name}\s*(\|[^}}]*)?-?\}}\}}");
        if !matches(&pattern, source) {
            missing.push(name.to_string());
        }
    }
    for import in Import::ALL {
        let flag = import.flag();
        let pattern = format!(r"\{{%-?\s*(el)?if\s[^%]*\b{flag}\b[^%]*-?%\}}");
        if !matches(&pattern, source) {
            missing.push(format!("{{% if {flag} %}}"));
        }
    }
    missing
}

fn matches(pattern: &str, source: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(source))
}
