use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate typed client code from OpenAPI and Swagger documents")]
pub struct CodegenArgs {
    /// Path or http(s) URL of the API description (JSON or YAML)
    #[arg(short = 'i', long)]
    pub input: Option<String>,

    /// Output directory for generated modules
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Root module name; defaults to the backend's prefix
    #[arg(short = 'm', long = "moduleprefix")]
    pub module_prefix: Option<String>,

    /// Target backend (rust, typescript)
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Custom module template; must keep every placeholder of the built-in one
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Overwrite files that already exist
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Timeout in seconds for fetching remote documents, also baked into
    /// the generated client
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to KDL config file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
