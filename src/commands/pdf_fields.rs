use std::path::Path;

use tracing::{info, warn};

use crate::cli::PdfFieldsArgs;
use crate::config::AppConfig;
use crate::error::FlowError;
use crate::model::{PdfFields, PdfFieldsReport, Status};
use crate::pdf::{extract_pages_with_pdftotext, scan_pages};
use crate::workbook;

pub const REP_CODE_CELL: (u32, u32) = (2, 1);
pub const FEE_CELL: (u32, u32) = (2, 2);

pub fn run(args: PdfFieldsArgs, config: &AppConfig) -> PdfFieldsReport {
    info!(
        pdf = %args.pdf_path.display(),
        sheet = %config.field_sheet_path.display(),
        "extracting rep code and fee"
    );

    match extract_and_update(&args.pdf_path, &config.field_sheet_path) {
        Ok(fields) => {
            info!(
                rep_code = fields.rep_code.as_deref().unwrap_or_default(),
                fee = fields.fee.as_deref().unwrap_or_default(),
                "field sheet updated"
            );
            PdfFieldsReport {
                error: None,
                error_kind: None,
                fields: Some(fields),
                status: Status::Success,
            }
        }
        Err(err) => {
            warn!(error = %err, kind = err.kind(), "pdf field extraction failed");
            PdfFieldsReport {
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
                fields: None,
                status: Status::Failed,
            }
        }
    }
}

pub fn extract_and_update(pdf_path: &Path, sheet_path: &Path) -> Result<PdfFields, FlowError> {
    let pages = extract_pages_with_pdftotext(pdf_path).map_err(FlowError::extraction)?;
    info!(pages = pages.len(), "pdf text extracted");

    let fields = scan_pages(&pages);
    write_field_cells(sheet_path, &fields)?;
    Ok(fields)
}

/// Writes the values into B1/B2 of the first sheet; unset values leave cells untouched.
pub fn write_field_cells(sheet_path: &Path, fields: &PdfFields) -> Result<(), FlowError> {
    let mut book = workbook::open_existing(sheet_path)?;
    let sheet = workbook::first_sheet_mut(&mut book).map_err(FlowError::io)?;

    let updates = [(REP_CODE_CELL, &fields.rep_code), (FEE_CELL, &fields.fee)];
    for ((column, row), value) in updates {
        if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
            workbook::set_text(sheet, column, row, value);
        }
    }

    workbook::save(&book, sheet_path).map_err(FlowError::io)
}
