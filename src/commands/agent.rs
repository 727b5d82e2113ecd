use serde::Serialize;
use tracing::warn;

use crate::cli::{ExtractArgs, PayloadArgs};
use crate::config::{API_KEY_VAR, AppConfig};
use crate::error::FlowError;
use crate::llm::GeminiClient;
use crate::mail::mailer_for;
use crate::model::{
    ExtractReport, FieldMapping, NigoReport, PayloadErrorReport, SaveReport, Status,
};
use crate::util::truncate_chars;

mod analyze;
mod ledger;
mod nigo;
#[cfg(test)]
mod tests;

pub use analyze::analyze_document;
pub use ledger::save_to_ledger;
pub use nigo::{NIGO_SHEET, flag_nigo};

pub const PAYLOAD_SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Save,
    Nigo,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Nigo => "nigo",
        }
    }
}

pub fn extract(args: ExtractArgs, config: &AppConfig) -> ExtractReport {
    let Some(api_key) = config.api_key() else {
        let err = FlowError::Configuration(format!(
            "{API_KEY_VAR} not found in environment"
        ));
        warn!(error = %err, env_file = %config.env_file.display(), "model credential missing");
        return analyze::failed_report(err, Vec::new());
    };

    let model = match GeminiClient::new(
        api_key,
        &config.model,
        &config.api_base,
        config.model_timeout,
    ) {
        Ok(model) => model,
        Err(err) => return analyze::failed_report(FlowError::configuration(err), Vec::new()),
    };

    analyze_document(&args.doc_path, &model)
}

/// Parses a save/nigo payload and runs the flow, or reports the parse failure.
pub fn run_payload(mode: Mode, args: PayloadArgs, config: &AppConfig) -> PayloadOutcome {
    let mapping = match FieldMapping::from_payload(&args.payload) {
        Ok(mapping) => mapping,
        Err(err) => {
            warn!(mode = mode.as_str(), error = %err, "rejected payload");
            return PayloadOutcome::Rejected(PayloadErrorReport {
                error: format!("Invalid JSON payload for {} mode: {err}", mode.as_str()),
                error_kind: err.kind(),
                status: Status::Failed,
                payload_snippet: truncate_chars(&args.payload, PAYLOAD_SNIPPET_CHARS),
            });
        }
    };

    if mapping.is_empty() {
        warn!(mode = mode.as_str(), "payload carries no fields");
    }

    let mailer = mailer_for(config.mail_enabled);
    match mode {
        Mode::Save => PayloadOutcome::Saved(save_to_ledger(
            &mapping,
            &config.ledger_path,
            mailer.as_ref(),
        )),
        Mode::Nigo => PayloadOutcome::Flagged(flag_nigo(
            &mapping,
            &config.nigo_ledger_path,
            mailer.as_ref(),
        )),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PayloadOutcome {
    Rejected(PayloadErrorReport),
    Saved(SaveReport),
    Flagged(NigoReport),
}
