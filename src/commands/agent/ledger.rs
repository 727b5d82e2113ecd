use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::{FlowError, chain_message};
use crate::mail::Mailer;
use crate::model::{Field, FieldMapping, SaveReport, Status};
use crate::workbook;

pub const SUMMARY_SUBJECT: &str = "AA Updated - Analysis Complete";
const SUMMARY_HEADING: &str = "Advisory Agent Analysis Results:";
const NOT_FOUND: &str = "Not Found";

pub fn save_to_ledger(mapping: &FieldMapping, ledger_path: &Path, mailer: &dyn Mailer) -> SaveReport {
    let mut report = SaveReport {
        status: Status::Pending,
        error: None,
        error_kind: None,
        debug_notes: Vec::new(),
        row: None,
    };

    match append_to_ledger(mapping, ledger_path, &mut report.debug_notes) {
        Ok(row) => {
            info!(path = %ledger_path.display(), row, "ledger row appended");
            report.row = Some(row);
            report.status = Status::Success;
        }
        Err(err) => {
            let err = FlowError::io(err);
            warn!(path = %ledger_path.display(), error = %err, "ledger save failed");
            report.error = Some(err.to_string());
            report.error_kind = Some(err.kind());
            report.status = Status::Failed;
            return report;
        }
    }

    if let Err(err) = mailer.compose(SUMMARY_SUBJECT, &summary_body(mapping)) {
        let detail = chain_message(&err);
        warn!(error = %detail, "summary email not opened");
        report
            .debug_notes
            .push(format!("Failed to open mail client: {detail}"));
    }

    report
}

fn append_to_ledger(mapping: &FieldMapping, ledger_path: &Path, notes: &mut Vec<String>) -> Result<u32> {
    let mut opened = workbook::open_or_create(ledger_path);
    notes.extend(opened.recovery_note.take());

    let sheet = workbook::first_sheet_mut(&mut opened.book)?;
    if workbook::ensure_header(sheet) {
        info!(path = %ledger_path.display(), "wrote ledger header");
    }
    let row = workbook::append_row(sheet, mapping);
    workbook::apply_column_widths(sheet);

    workbook::save(&opened.book, ledger_path)?;
    Ok(row)
}

pub fn summary_body(mapping: &FieldMapping) -> String {
    let mut lines = vec![SUMMARY_HEADING.to_string(), String::new()];
    for field in Field::ALL {
        let value = mapping
            .text(field)
            .unwrap_or_else(|| NOT_FOUND.to_string());
        lines.push(format!("{}: {value}", field.summary_label()));
    }
    lines.join("\n")
}
