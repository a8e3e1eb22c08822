use clap::Parser;
use skein_codegen::backend::{self, Template};
use skein_codegen::cli::CodegenArgs;
use skein_codegen::config::Config;
use skein_codegen::generator::{Generator, GeneratorOptions};
use skein_codegen::{loader, output};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let args = CodegenArgs::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            if args.verbose {
                println!("Reading config from {:?}...", path);
            }
            Config::load(path)?
        }
        None => Config::default(),
    };

    // CLI flags win over the config file
    let input = args
        .input
        .or(config.input)
        .ok_or_else(|| miette::miette!("No input given; pass --input or set it in the config"))?;
    let output_dir = args
        .output
        .or(config.output)
        .unwrap_or_else(|| PathBuf::from("."));
    let target = args
        .target
        .or(config.target)
        .unwrap_or_else(|| "rust".to_string());
    let timeout_secs = args
        .timeout
        .or(config.timeout_secs)
        .unwrap_or(loader::DEFAULT_FETCH_TIMEOUT.as_secs());
    let force = args.force || config.force.unwrap_or(false);
    let module_prefix = args.module_prefix.or(config.module_prefix);
    let template = match args.template.or(config.template) {
        Some(path) => Some(Template::load(&path)?),
        None => None,
    };

    let backend = backend::by_name(&target)?;

    println!("Loading {}...", input);
    let doc = loader::load(&input, Duration::from_secs(timeout_secs)).await?;
    println!(
        "Loaded {} {} ({} paths, {} schemas)",
        doc.info.title,
        doc.info.version,
        doc.paths.len(),
        doc.schemas().len()
    );

    println!("Generating {} code...", backend.name());
    let options = GeneratorOptions {
        module_prefix,
        timeout_secs,
        default_headers: config.headers,
        template,
        generated_at: None,
    };
    let generation = Generator::new(backend.as_ref())
        .with_options(options)
        .generate(&doc)?;

    if !generation.diagnostics.is_empty() {
        println!("{} issues degraded the output:", generation.diagnostics.len());
        for issue in generation.diagnostics.iter() {
            println!("  - {}", issue);
        }
    }

    let report = output::write_units(&output_dir, &generation.units, force)?;
    for path in report.written() {
        if args.verbose {
            println!("Wrote {}", path.display());
        }
    }
    let skipped: Vec<_> = report.skipped().collect();
    for path in &skipped {
        println!("Skipped {} (exists; use --force to overwrite)", path.display());
    }

    println!(
        "✨ Generated {} modules to {:?}",
        report.written().count(),
        output_dir
    );

    Ok(())
}
