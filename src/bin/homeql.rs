//! homeql — the smart-home database CLI
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell
//! homeql
//!
//! # Check a statement without running it
//! homeql validate "SELECT * FROM users;"
//!
//! # Ask in natural language
//! homeql ask "显示所有客厅设备"
//! homeql ask "usage history" --dry-run
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use tracing_subscriber::EnvFilter;

use homeql::prelude::*;
use homeql::repl::{self, Format, Session};
use homeql::validator::select_shape;

#[derive(Parser)]
#[command(name = "homeql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "🏠 Query a smart-home database in SQL or plain language", long_about = None)]
#[command(after_help = "EXAMPLES:
    homeql validate 'SELECT * FROM devices;'
    homeql ask '显示所有客厅设备'
    homeql exec 'SELECT * FROM users;' --format json
    homeql plan 'SELECT * FROM users ORDER BY username;'")]
struct Cli {
    /// Config file (default: <config dir>/homeql/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database URL
    #[arg(long, env = "HOMEQL_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Text-generation endpoint for natural-language questions
    #[arg(long, env = "HOMEQL_MODEL_ENDPOINT", global = true)]
    model_endpoint: Option<String>,

    /// Use keyword rules only, even if a model endpoint is configured
    #[arg(long, global = true)]
    no_model: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(val: OutputFormat) -> Self {
        match val {
            OutputFormat::Table => Format::Table,
            OutputFormat::Json => Format::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a statement without executing it
    Validate { sql: String },
    /// Translate a question to SQL and run it
    Ask {
        question: String,
        /// Show the generated SQL only
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate and execute a statement
    Exec { sql: String },
    /// Show the simplified query plan for a statement
    Plan { sql: String },
    /// Interactive shell (default)
    Repl,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<HomeqlError>() {
            Some(err) => repl::report(err),
            None => eprintln!("{} {}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "homeql=debug" } else { "homeql=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }
    if let Some(endpoint) = &cli.model_endpoint {
        config.model.endpoint = Some(endpoint.clone());
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Validate { sql }) => validate_cmd(sql, cli.verbose),
        Some(Commands::Plan { sql }) => {
            let statement = check(sql)?;
            println!("{}", homeql::render::plan_text(statement.as_str()));
            Ok(())
        }
        Some(Commands::Ask { question, dry_run }) => {
            let session = open_session(&cli).await?;
            session.ask(question, *dry_run).await?;
            Ok(())
        }
        Some(Commands::Exec { sql }) => {
            let session = open_session(&cli).await?;
            session.run_sql(sql).await?;
            Ok(())
        }
        Some(Commands::Repl) | None => {
            let session = open_session(&cli).await?;
            repl::run_repl(&session).await;
            Ok(())
        }
    }
}

async fn open_session(cli: &Cli) -> Result<Session> {
    let config = load_config(cli)?;

    // The model is probed once; if that fails the rules are used for good.
    let model = if cli.no_model {
        None
    } else {
        ModelTranslator::acquire(&config.model).await
    };
    let pipeline = Pipeline::select(model);

    if cli.verbose {
        println!("{} {}", "Database:".dimmed(), config.database_url);
        println!("{} {}", "Translator:".dimmed(), pipeline.origin());
    }

    let store = Store::open(&config.database_url).await?;
    Ok(Session::new(pipeline, store, cli.format.into()))
}

fn validate_cmd(sql: &str, verbose: bool) -> Result<()> {
    let statement = check(sql)?;
    println!("{} {}", "✓ Valid:".green().bold(), statement);

    if verbose {
        let normalized = statement.normalized();
        if let Some(shape) = select_shape(&normalized) {
            println!("  {} {}", "targets:".dimmed(), shape.targets);
            println!("  {} {}", "source:".dimmed(), shape.source);
            for (name, part) in [
                ("where:", shape.predicate),
                ("group by:", shape.grouping),
                ("order by:", shape.ordering),
            ] {
                if let Some(part) = part {
                    println!("  {} {}", name.dimmed(), part);
                }
            }
        }
    }
    Ok(())
}
