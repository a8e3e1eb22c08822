use miette::IntoDiagnostic;
use skein_codegen::backend::RustBackend;
use skein_codegen::generator::{Generator, GeneratorOptions};
use skein_codegen::loader::parse_document;
use skein_codegen::output::write_units;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const FIXTURE: &str = "../skein-codegen/tests/fixtures/users.yaml";
const MODULE: &str = "users_api";

fn main() -> miette::Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join(FIXTURE);

    let text = fs::read_to_string(&fixture).into_diagnostic()?;
    let doc = parse_document(&text, "users.yaml")?;
    let generation = Generator::new(&RustBackend)
        .with_options(GeneratorOptions {
            module_prefix: Some(MODULE.into()),
            generated_at: Some("2024-05-01T12:00:00Z".into()),
            ..Default::default()
        })
        .generate(&doc)?;
    write_units(&out_dir, &generation.units, true)?;

    // `include!` can't carry the module's inner attributes, so the crate
    // includes a `mod` declaration pointing at the generated file instead
    let module = out_dir.join(format!("{MODULE}.rs"));
    let wrapper = format!("#[path = {:?}]\npub mod {MODULE};\n", module.display().to_string());
    fs::write(out_dir.join(format!("{MODULE}_mod.rs")), wrapper).into_diagnostic()?;

    println!("cargo:rerun-if-changed={}", fixture.display());
    Ok(())
}
