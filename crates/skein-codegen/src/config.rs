//! Optional `skein.kdl` configuration
//!
//! ```kdl
//! generate {
//!     input "openapi.yaml"
//!     output "generated"
//!     module-prefix "petstore"
//!     target "rust"
//!     force #true
//!     timeout 45
//!     headers {
//!         header "X-Client" "skein"
//!     }
//! }
//! ```

use crate::error::{CodegenError, Result};
use std::path::{Path, PathBuf};

/// Settings read from a config file. Anything unset falls back to CLI flags
/// or built-in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub input: Option<String>,
    pub output: Option<PathBuf>,
    pub module_prefix: Option<String>,
    pub target: Option<String>,
    pub template: Option<PathBuf>,
    pub force: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub headers: Vec<(String, String)>,
}

impl Config {
    pub fn from_kdl(text: &str) -> Result<Self> {
        let doc = text
            .parse::<kdl::KdlDocument>()
            .map_err(|e| CodegenError::config(format!("Failed to parse KDL: {}", e)))?;

        let mut config: Option<Config> = None;
        for node in doc.nodes() {
            match node.name().value() {
                "generate" => {
                    if config.is_some() {
                        return Err(CodegenError::config("Multiple generate blocks found"));
                    }
                    config = Some(parse_generate(node)?);
                }
                other => {
                    return Err(CodegenError::config(format!("Unknown config node: {}", other)));
                }
            }
        }

        config.ok_or_else(|| CodegenError::config("Missing generate block"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_kdl(&text)
    }
}

fn string_arg(node: &kdl::KdlNode) -> Result<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(str::to_string)
        .ok_or_else(|| {
            CodegenError::config(format!("{} expects a string value", node.name().value()))
        })
}

fn parse_generate(node: &kdl::KdlNode) -> Result<Config> {
    let children = node
        .children()
        .ok_or_else(|| CodegenError::config("generate block has no children"))?;

    let mut config = Config::default();
    for child in children.nodes() {
        match child.name().value() {
            "input" => config.input = Some(string_arg(child)?),
            "output" => config.output = Some(PathBuf::from(string_arg(child)?)),
            "module-prefix" => config.module_prefix = Some(string_arg(child)?),
            "target" => config.target = Some(string_arg(child)?),
            "template" => config.template = Some(PathBuf::from(string_arg(child)?)),
            "force" => {
                let val = child
                    .entries()
                    .first()
                    .and_then(|e| e.value().as_bool())
                    .ok_or_else(|| CodegenError::config("force expects a boolean value"))?;
                config.force = Some(val);
            }
            "timeout" => {
                let val = child
                    .entries()
                    .first()
                    .and_then(|e| e.value().as_integer())
                    .and_then(|v| u64::try_from(v).ok())
                    .ok_or_else(|| {
                        CodegenError::config("timeout expects a non-negative integer (seconds)")
                    })?;
                config.timeout_secs = Some(val);
            }
            "headers" => config.headers = parse_headers(child)?,
            other => {
                return Err(CodegenError::config(format!(
                    "Unknown field in generate block: {}",
                    other
                )));
            }
        }
    }

    Ok(config)
}

fn parse_headers(node: &kdl::KdlNode) -> Result<Vec<(String, String)>> {
    let Some(children) = node.children() else {
        return Ok(Vec::new());
    };

    children
        .nodes()
        .iter()
        .map(|header| {
            if header.name().value() != "header" {
                return Err(CodegenError::config(format!(
                    "Unknown field in headers block: {}",
                    header.name().value()
                )));
            }
            let mut values = header.entries().iter().filter_map(|e| e.value().as_string());
            match (values.next(), values.next()) {
                (Some(name), Some(value)) => Ok((name.to_string(), value.to_string())),
                _ => Err(CodegenError::config("header expects a name and a value")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::from_kdl(
            r#"
            generate {
                input "https://example.com/openapi.json"
                output "out"
                module-prefix "petstore"
                target "typescript"
                template "custom.tera"
                force #true
                timeout 45
                headers {
                    header "X-Client" "skein"
                }
            }
            "#,
        )
        .expect("parse");

        assert_eq!(config.input.as_deref(), Some("https://example.com/openapi.json"));
        assert_eq!(config.output, Some(PathBuf::from("out")));
        assert_eq!(config.module_prefix.as_deref(), Some("petstore"));
        assert_eq!(config.target.as_deref(), Some("typescript"));
        assert_eq!(config.force, Some(true));
        assert_eq!(config.timeout_secs, Some(45));
        assert_eq!(config.headers, vec![("X-Client".into(), "skein".into())]);
    }

    #[test]
    fn rejects_unknown_nodes() {
        assert!(Config::from_kdl("output \"x\"").is_err());
        assert!(Config::from_kdl("generate {\n  colour \"blue\"\n}").is_err());
        assert!(Config::from_kdl("generate {\n  force \"yes\"\n}").is_err());
    }

    #[test]
    fn requires_generate_block() {
        assert!(Config::from_kdl("").is_err());
    }
}
