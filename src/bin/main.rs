//! auditql CLI - Compile audit strategies to SQL
//!
//! Usage:
//!   auditql compile <strategy.json> [--link-tables <dir>] [--dialect <dialect>]
//!   auditql validate <strategy.json> [--link-tables <dir>]
//!
//! Examples:
//!   auditql compile strategies/login.json
//!   auditql compile strategies/joined.json --link-tables ./link_tables --dialect postgres
//!   auditql validate strategies/login.json

use auditql::compile::{compile_strategy, CompileOptions, CompileOutput};
use auditql::config::Settings;
use auditql::link_table::{DirectoryLinkTableStore, InMemoryLinkTableStore, LinkTableStore};
use auditql::sql::Dialect;
use auditql::strategy::Strategy;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "auditql")]
#[command(about = "auditql - Compile declarative audit strategies to SQL")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a settings file (overrides AUDITQL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a strategy to SQL
    Compile {
        /// Path to the strategy JSON file
        file: PathBuf,

        /// Directory holding link table definitions (<uid>/<version>.json)
        #[arg(short, long)]
        link_tables: Option<PathBuf>,

        /// SQL dialect to generate (defaults to the settings file)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Validate a strategy without printing SQL
    Validate {
        /// Path to the strategy JSON file
        file: PathBuf,

        /// Directory holding link table definitions (<uid>/<version>.json)
        #[arg(short, long)]
        link_tables: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Bkbase,
    Postgres,
    Mysql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Bkbase => Dialect::BkBase,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output the final SQL only
    Sql,
    /// Output the inner query only
    Inner,
    /// Output SQL with comments
    Verbose,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(settings) => settings,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Compile {
            file,
            link_tables,
            dialect,
            output,
        } => cmd_compile(&settings, file, link_tables, dialect, output),
        Commands::Validate { file, link_tables } => cmd_validate(&settings, file, link_tables),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("auditql={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, ExitCode> {
    let result = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    result.map_err(|e| {
        eprintln!("Error loading settings: {}", e);
        ExitCode::FAILURE
    })
}

fn cmd_compile(
    settings: &Settings,
    file: PathBuf,
    link_tables: Option<PathBuf>,
    dialect: Option<DialectArg>,
    output: OutputFormat,
) -> ExitCode {
    let mut options = CompileOptions::from(settings);
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }

    let compiled = match run(settings, &file, link_tables, &options) {
        Ok(compiled) => compiled,
        Err(code) => return code,
    };

    match output {
        OutputFormat::Sql => {
            println!("{}", compiled.sql);
        }
        OutputFormat::Inner => {
            println!("{}", compiled.inner_sql);
        }
        OutputFormat::Verbose => {
            println!("-- auditql Compiled SQL");
            println!("-- Source: {}", file.display());
            println!("-- Dialect: {}", compiled.dialect);
            println!("-- Inner query:");
            println!("--   {}", compiled.inner_sql);
            println!();
            println!("{}", compiled.sql);
        }
    }

    ExitCode::SUCCESS
}

fn cmd_validate(settings: &Settings, file: PathBuf, link_tables: Option<PathBuf>) -> ExitCode {
    let options = CompileOptions::from(settings);
    match run(settings, &file, link_tables, &options) {
        Ok(_) => {
            println!("✓ {} is valid", file.display());
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

/// Read, parse and compile the strategy at `file`, reporting errors on stderr.
fn run(
    settings: &Settings,
    file: &Path,
    link_tables: Option<PathBuf>,
    options: &CompileOptions,
) -> Result<CompileOutput, ExitCode> {
    let source = fs::read_to_string(file).map_err(|e| {
        eprintln!("Error reading file '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })?;

    let strategy = Strategy::from_json(&source).map_err(|e| {
        eprintln!("Invalid strategy '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })?;
    info!(
        file = %file.display(),
        strategy_id = strategy.strategy_id,
        "loaded strategy"
    );

    let dir = match link_tables {
        Some(dir) => Some(dir),
        None => settings.link_tables.resolved_dir().map_err(|e| {
            eprintln!("Error resolving link table directory: {}", e);
            ExitCode::FAILURE
        })?,
    };

    let store: Box<dyn LinkTableStore> = match dir {
        Some(dir) => {
            debug!(dir = %dir.display(), "using link table directory");
            Box::new(DirectoryLinkTableStore::new(dir))
        }
        None => Box::new(InMemoryLinkTableStore::new()),
    };

    compile_strategy(&strategy, store.as_ref(), options).map_err(|e| {
        eprintln!("Compilation error: {}", e);
        ExitCode::FAILURE
    })
}
