//! CLI entry point for `apirun`: argument parsing, logging init, and driving
//! the Document Loader → Definition Store → Assembler → Execution Context
//! pipeline.

mod http_driver;
mod loader;
mod report;
mod runner;

use std::path::PathBuf;

use apirun_config::ProjectConfig;
use apirun_core::definitions::DefinitionStore;
use apirun_core::registry::VariableMapping;
use clap::{Parser, Subcommand};

use http_driver::HttpDriver;
use report::{render, CaseReport};

#[derive(Parser)]
#[command(name = "apirun")]
#[command(about = "Data-driven HTTP API test runner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Set log level (error, warn, info, debug, trace).
    #[arg(short = 'v', long, global = true, default_value = "info")]
    log_level: String,

    /// Path to a project config file (defaults to the conventional `api/`,
    /// `suite/`, `testcases/`, `.env` layout under the current directory).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, assemble, and execute every test case under `testcases/`.
    Run {
        /// A single test-case file to run instead of the whole folder.
        path: Option<PathBuf>,
    },
    /// Load and assemble test cases without executing them, reporting
    /// pipeline defects (bad format, unresolved references) if any.
    Validate {
        /// A single test-case file to validate instead of the whole folder.
        path: Option<PathBuf>,
    },
    /// List every discovered API definition, suite, and test case.
    List,
}

fn init_logging(log_level: &str) {
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).finish().init();
}

fn load_project(config: &ProjectConfig) -> anyhow::Result<DefinitionStore> {
    let mut store = DefinitionStore::new();

    let env_mapping = loader::load_env_file(&config.env_file_path())?;
    loader::apply_env_to_process(&env_mapping);

    loader::load_api_folder(&config.api_path(), &mut store)?;
    loader::load_suite_folder(&config.suite_path(), &mut store)?;

    Ok(store)
}

/// Resolve a CLI-supplied test case path: used as-is if it exists relative to
/// the current directory, otherwise located by searching upward through
/// ancestor directories.
fn resolve_case_path(path: PathBuf) -> anyhow::Result<PathBuf> {
    if path.is_file() {
        return Ok(path);
    }
    let start = std::env::current_dir()?;
    let reference = path.to_string_lossy().into_owned();
    Ok(loader::locate_file(&start, &reference)?)
}

fn builtin_funcs() -> apirun_core::registry::FunctionMapping {
    let mut funcs = apirun_core::builtin_functions();
    apirun_core::csv_source::register_parameterize(&mut funcs, loader::FsCsvLoader);
    funcs
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };

    match cli.command {
        Commands::Run { path } => run(&config, path).await,
        Commands::Validate { path } => validate(&config, path),
        Commands::List => list(&config),
    }
}

async fn run(config: &ProjectConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut store = load_project(config)?;
    let funcs = builtin_funcs();
    let driver = HttpDriver::default();
    let base_vars = VariableMapping::new();

    let cases = match path {
        Some(file) => {
            let file = resolve_case_path(file)?;
            vec![(file.clone(), loader::load_testcase_file(&file, &mut store)?)]
        }
        None => loader::load_testcase_folder(&config.testcase_path(), &mut store)?,
    };

    let mut reports: Vec<CaseReport> = Vec::new();
    for (file, assembled) in &cases {
        let name = assembled
            .config
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_else(|| file.to_str().unwrap_or("<case>"))
            .to_string();
        reports.extend(runner::run_case(&name, &assembled.config, &assembled.teststeps, &base_vars, &funcs, &driver).await?);
    }

    print!("{}", render(&reports));
    if reports.iter().any(|c| !c.passed()) {
        std::process::exit(1);
    }
    Ok(())
}

fn validate(config: &ProjectConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut store = load_project(config)?;
    let cases = match path {
        Some(file) => {
            let file = resolve_case_path(file)?;
            vec![(file.clone(), loader::load_testcase_file(&file, &mut store)?)]
        }
        None => loader::load_testcase_folder(&config.testcase_path(), &mut store)?,
    };

    for (file, assembled) in &cases {
        println!("{}: {} step(s) resolved", file.display(), assembled.teststeps.len());
    }
    println!("{} case(s) loaded and assembled without error", cases.len());
    Ok(())
}

fn list(config: &ProjectConfig) -> anyhow::Result<()> {
    let store = load_project(config)?;
    println!("API definitions:");
    for api in store.apis() {
        println!("  {}", api.func_name);
    }
    println!("Suites:");
    for testcase in store.testcases() {
        if let Some(name) = &testcase.func_name {
            println!("  {name}");
        }
    }
    Ok(())
}
