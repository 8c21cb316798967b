//! # Intake CLI
//!
//! Command-line importer over `intake-core`.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          intake                                         │
//! │                                                                         │
//! │  validate --entity <kind> [--partial] [--format F] <FILE|->            │
//! │      JSON / NDJSON ──► SchemaRegistry ──► JSON lines on stdout         │
//! │                                                                         │
//! │  normalize <TEXT>...                                                   │
//! │      one canonical search key per argument                             │
//! │                                                                         │
//! │  entities                                                              │
//! │      known entity kinds and their declared fields                      │
//! │                                                                         │
//! │  stdout: report only     stderr: logs (RUST_LOG / [log] level)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod importer;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use intake_core::schema::Presence;
use intake_core::{normalize, EntityKind, SchemaRegistry};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{InputFormat, IntakeConfig, LogSettings};
use crate::error::{CliError, CliResult};
use crate::importer::{ImportOptions, Importer};

#[derive(Debug, Parser)]
#[command(name = "intake", version, about = "Validate and normalize inbound records")]
struct Cli {
    /// Config file (defaults to the platform config dir's intake.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate every record in a JSON or NDJSON file
    Validate {
        /// Entity kind, e.g. vehicle or work_ticket
        #[arg(long, short)]
        entity: EntityKind,

        /// Treat records as updates: every field optional
        #[arg(long)]
        partial: bool,

        /// Override the configured input format
        #[arg(long)]
        format: Option<InputFormat>,

        /// Input file, or `-` for stdin
        file: PathBuf,
    },

    /// Print the canonical search key for each argument
    Normalize {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List entity kinds and their fields (`*` marks required)
    Entities,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "intake failed");
            eprintln!("intake: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = IntakeConfig::load(cli.config)?;
    init_tracing(&config.log)?;
    config.log_loaded();

    match cli.command {
        Command::Validate {
            entity,
            partial,
            format,
            file,
        } => {
            let registry = SchemaRegistry::new(&config.schemas)?;

            let mut options = ImportOptions::new(entity, &config.import);
            options.partial = partial;
            if let Some(format) = format {
                options.format = format;
            }

            let text = read_input(&file)?;
            let importer = Importer::new(&registry, options);
            info!(run_id = %importer.run_id(), file = %file.display(), "Validating input");
            let stdout = io::stdout();
            let summary = importer.run(&text, &mut stdout.lock())?;
            summary.check(config.import.fail_on_reject)
        }

        Command::Normalize { text } => {
            let mut out = io::stdout().lock();
            for item in &text {
                writeln!(out, "{}", normalize(item))?;
            }
            Ok(())
        }

        Command::Entities => {
            let registry = SchemaRegistry::new(&config.schemas)?;
            let mut out = io::stdout().lock();
            for kind in EntityKind::ALL {
                let fields: Vec<String> = registry
                    .object(kind)
                    .fields()
                    .iter()
                    .map(|field| match field.presence() {
                        Presence::Required => format!("{}*", field.name()),
                        Presence::Optional | Presence::Default(_) => field.name().to_string(),
                    })
                    .collect();
                writeln!(out, "{:<18} {}", kind, fields.join(", "))?;
            }
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> CliResult<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(settings: &LogSettings) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| CliError::Logging(e.to_string()))
}
