//! # OpenAPI and Swagger client generation
//!
//! Reads an API description (Swagger 2.0 or OpenAPI 3.0/3.1, JSON or YAML)
//! and emits typed source modules for a target language: one declaration
//! per schema, a decoder and encoder per type, and one request function per
//! operation.
//!
//! ## Usage
//!
//! The `skein` binary takes a local path or an http(s) URL:
//!
//! ```bash
//! cargo run -p skein-codegen --bin skein -- \
//!     -i ./petstore.yaml \
//!     -o ./generated \
//!     -t rust
//! ```
//!
//! Settings can also live in a KDL file passed with `--config`; flags win
//! over the file.
//!
//! From code, parse a document and hand it to a [`generator::Generator`]:
//!
//! ```no_run
//! use skein_codegen::backend::RustBackend;
//! use skein_codegen::generator::Generator;
//! use skein_codegen::loader::parse_document;
//!
//! # fn main() -> skein_codegen::error::Result<()> {
//! let text = std::fs::read_to_string("petstore.yaml")?;
//! let doc = parse_document(&text, "petstore.yaml")?;
//! let generation = Generator::new(&RustBackend).generate(&doc)?;
//! for unit in &generation.units {
//!     println!("{}", unit.relative_path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`loader`] - Reads documents from disk or over HTTP
//! - [`resolve`] - `$ref` resolution, normalization and the reference graph
//! - [`synth`] - Turns resolved schemas into language-neutral type declarations
//! - [`bind`] - Turns operations into request bindings
//! - [`assemble`] - Groups declarations into modules and renders them
//! - [`backend`] - Target languages (Rust, TypeScript) and templates
//! - [`generator`] - The whole pipeline in one call
//! - [`output`] - Writes rendered modules to disk

pub mod assemble;
pub mod backend;
pub mod bind;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod generator;
pub mod imports;
pub mod loader;
pub mod output;
pub mod resolve;
pub mod synth;
