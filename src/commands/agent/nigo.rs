use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::chain_message;
use crate::mail::Mailer;
use crate::model::{Field, FieldMapping, NigoReport, Status};
use crate::validity::{flagged_fields, is_flagged_cell, missing_items};
use crate::workbook;

pub const NIGO_SHEET: &str = "NIGO";
pub const NOTICE_SUBJECT: &str = "Advisory Agreement NIGO";
const NOTICE_HEADING: &str = "Please see the following missing items that need to be corrected:";
const NOTICE_NOTHING_LISTED: &str =
    "No specific extracted fields marked as missing/error. Please review document manually.";
const NOTICE_CLOSING: &str = "Please resubmit once corrected.";

pub fn flag_nigo(mapping: &FieldMapping, nigo_path: &Path, mailer: &dyn Mailer) -> NigoReport {
    let flagged: Vec<String> = flagged_fields(mapping)
        .into_iter()
        .map(|field| field.header().to_string())
        .collect();
    let missing: Vec<String> = missing_items(mapping)
        .into_iter()
        .map(ToOwned::to_owned)
        .collect();

    let mut report = NigoReport {
        status: Status::Pending,
        error: None,
        error_kind: None,
        debug_notes: Vec::new(),
        excel_updated: false,
        row: None,
        flagged_fields: flagged,
        missing_items: missing,
    };

    match append_nigo_row(mapping, nigo_path, &mut report.debug_notes) {
        Ok(row) => {
            info!(
                path = %nigo_path.display(),
                row,
                flagged = report.flagged_fields.len(),
                "NIGO row appended"
            );
            report.excel_updated = true;
            report.row = Some(row);
        }
        Err(err) => {
            let detail = chain_message(&err);
            warn!(path = %nigo_path.display(), error = %detail, "NIGO sheet not updated");
            report
                .debug_notes
                .push(format!("Failed to update NIGO Excel: {detail}"));
        }
    }

    let body = notice_body(&report.missing_items);
    if let Err(err) = mailer.compose(NOTICE_SUBJECT, &body) {
        let detail = chain_message(&err);
        warn!(error = %detail, "NIGO email not opened");
        report
            .debug_notes
            .push(format!("Failed to open mail client: {detail}"));
    }

    report.status = Status::Success;
    report
}

fn append_nigo_row(mapping: &FieldMapping, nigo_path: &Path, notes: &mut Vec<String>) -> Result<u32> {
    let mut opened = workbook::open_or_create(nigo_path);
    notes.extend(opened.recovery_note.take());

    let sheet = workbook::sheet_named_mut(&mut opened.book, NIGO_SHEET)?;
    workbook::ensure_header(sheet);
    let row = workbook::append_row(sheet, mapping);

    for (index, field) in Field::ALL.iter().enumerate() {
        if is_flagged_cell(*field, mapping.value(*field)) {
            workbook::highlight_cell(sheet, index as u32 + 1, row);
        }
    }
    workbook::apply_column_widths(sheet);

    workbook::save(&opened.book, nigo_path)?;
    Ok(row)
}

pub fn notice_body(missing: &[String]) -> String {
    let mut lines = vec![NOTICE_HEADING.to_string(), String::new()];
    if missing.is_empty() {
        lines.push(NOTICE_NOTHING_LISTED.to_string());
    } else {
        lines.extend(missing.iter().map(|item| format!("- {item}")));
    }
    lines.push(String::new());
    lines.push(NOTICE_CLOSING.to_string());
    lines.join("\n")
}
