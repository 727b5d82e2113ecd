mod cli;
mod commands;
mod config;
mod docx;
mod error;
mod llm;
mod mail;
mod model;
mod pdf;
mod util;
mod validity;
mod workbook;

use anyhow::Result;
use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::agent::{self, Mode};
use crate::config::AppConfig;
use crate::model::{ErrorReport, Status};
use crate::util::print_json;

const USAGE_HINT: &str = "Usage: advisory-agent <mode> <payload>";

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(err),
    };

    let config = AppConfig::from_args(&cli.global);

    match cli.command {
        Commands::PdfFields(args) => print_json(&commands::pdf_fields::run(args, &config)),
        Commands::Extract(args) => print_json(&agent::extract(args, &config)),
        Commands::Save(args) => print_json(&agent::run_payload(Mode::Save, args, &config)),
        Commands::Nigo(args) => print_json(&agent::run_payload(Mode::Nigo, args, &config)),
        Commands::Status => print_json(&commands::status::run(&config)),
    }
}

/// Unknown modes are answered with a JSON error and exit 0; any other usage error exits 1.
fn report_parse_error(err: clap::Error) -> Result<()> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{err}");
            Ok(())
        }
        ErrorKind::InvalidSubcommand => {
            let mode = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(mode)) => mode.clone(),
                _ => String::new(),
            };
            print_json(&ErrorReport {
                error: format!("Unknown mode: {mode}"),
                error_kind: "input",
                status: Status::Failed,
            })
        }
        kind => {
            let error = match kind {
                ErrorKind::MissingRequiredArgument
                | ErrorKind::MissingSubcommand
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    format!("Missing arguments. {USAGE_HINT}")
                }
                _ => err.render().to_string().trim().to_string(),
            };
            print_json(&ErrorReport {
                error,
                error_kind: "input",
                status: Status::Failed,
            })?;
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
