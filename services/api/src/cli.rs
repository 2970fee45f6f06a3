use crate::console::{self, AreaEdits, CondoFields, ExportArgs, HistoryCommand, InspectArgs};
use crate::infra::{wire, Wiring};
use crate::server;
use clap::{Args, Parser, Subcommand};
use condo_inspect::config::AppConfig;
use condo_inspect::error::AppError;
use condo_inspect::telemetry;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "MS SUPERVISION",
    about = "Register condominiums, run guided inspections and export PDF reports",
    version
)]
struct Cli {
    /// Override the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Manage registered condominiums
    Condo {
        #[command(subcommand)]
        command: CondoCommand,
    },
    /// Walk through a condominium's areas and record an inspection
    Inspect(InspectArgs),
    /// Browse completed inspections
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Export an inspection report as PDF
    Export(ExportArgs),
    /// Share an inspection report link through the configured share command
    Share {
        /// Inspection identifier
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum CondoCommand {
    /// List registered condominiums
    List,
    /// Register a condominium; without --area the default catalog is used
    Add {
        #[command(flatten)]
        fields: CondoFields,
        /// Area name, repeat for several
        #[arg(long = "area")]
        areas: Vec<String>,
    },
    /// Edit a condominium's fields and areas
    Edit {
        /// Condominium identifier
        id: String,
        #[command(flatten)]
        fields: CondoFields,
        #[command(flatten)]
        areas: AreaEdits,
    },
    /// Remove a condominium (past inspections are kept)
    Remove {
        /// Condominium identifier
        id: String,
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
    /// Show a condominium with its areas
    Show {
        /// Condominium identifier
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Condo { command } => with_console(&config, |wiring, out| {
            console::run_condo(&mut wiring.app, command, out)
        }),
        Command::Inspect(args) => with_console(&config, |wiring, out| {
            console::run_inspection(&mut wiring.app, &args.condo_id, io::stdin().lock(), out)
                .map(|_| ())
        }),
        Command::History { command } => with_console(&config, |wiring, out| {
            console::run_history(&wiring.app, command, out)
        }),
        Command::Export(args) => with_console(&config, |wiring, out| {
            console::run_export(&wiring.app, &wiring.exporter, args, out)
        }),
        Command::Share { id } => with_console(&config, |wiring, out| {
            console::run_share(&wiring.app, wiring.share.as_ref(), &config.report, &id, out)
        }),
    }
}

/// Console commands log to stderr and print their results to stdout.
fn with_console(
    config: &AppConfig,
    command: impl FnOnce(&mut Wiring, &mut io::StdoutLock<'static>) -> Result<(), AppError>,
) -> Result<(), AppError> {
    telemetry::init_console(&config.telemetry)?;
    let mut wiring = wire(config);
    let mut out = io::stdout().lock();
    command(&mut wiring, &mut out)?;
    out.flush()?;
    Ok(())
}
