use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "advisory-agent",
    version,
    about = "Advisory agreement field extraction, ledger and NIGO tooling",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a PDF for the rep code and fee and write them into the field sheet.
    PdfFields(PdfFieldsArgs),
    /// Read a DOCX agreement and extract its data points with the model.
    Extract(ExtractArgs),
    /// Append a field mapping to the master ledger and draft the summary email.
    Save(PayloadArgs),
    /// Append a field mapping to the NIGO sheet and draft the notice email.
    Nigo(PayloadArgs),
    /// Report on the configured ledgers and credential.
    Status,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Dotenv file holding GEMINI_API_KEY [default: .env.local next to the install directory]
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[arg(long, global = true)]
    pub ledger_path: Option<PathBuf>,

    #[arg(long, global = true)]
    pub nigo_ledger_path: Option<PathBuf>,

    #[arg(long, global = true)]
    pub field_sheet_path: Option<PathBuf>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Seconds before the model request is abandoned [default: 120]. The request
    /// fails with a remote error instead of blocking indefinitely.
    #[arg(long, global = true)]
    pub model_timeout_secs: Option<u64>,

    #[arg(long, global = true, default_value_t = false)]
    pub no_mail: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PdfFieldsArgs {
    pub pdf_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    pub doc_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PayloadArgs {
    pub payload: String,
}
