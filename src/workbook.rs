use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use umya_spreadsheet::helper::coordinate::string_from_column_index;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::FlowError;
use crate::model::{Field, FieldMapping};
use crate::util::ensure_parent_directory;

pub const COLUMN_WIDTH: f64 = 20.0;
pub const HIGHLIGHT_ARGB: &str = "FFFFCCCC";

pub struct OpenedWorkbook {
    pub book: Spreadsheet,
    /// Set when an unreadable file was replaced by a fresh workbook.
    pub recovery_note: Option<String>,
}

/// Opens `path`, or starts a fresh workbook when the file is absent or unreadable.
///
/// An unreadable file is overwritten on the next save.
pub fn open_or_create(path: &Path) -> OpenedWorkbook {
    if !path.exists() {
        info!(path = %path.display(), "workbook missing; starting a new one");
        return OpenedWorkbook {
            book: umya_spreadsheet::new_file(),
            recovery_note: None,
        };
    }

    match umya_spreadsheet::reader::xlsx::read(path) {
        Ok(book) => OpenedWorkbook {
            book,
            recovery_note: None,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "workbook unreadable; starting a new one");
            OpenedWorkbook {
                book: umya_spreadsheet::new_file(),
                recovery_note: Some(format!(
                    "Existing workbook at {} could not be opened ({err}); a new workbook replaced it",
                    path.display()
                )),
            }
        }
    }
}

pub fn open_existing(path: &Path) -> Result<Spreadsheet, FlowError> {
    if !path.exists() {
        return Err(FlowError::Io(format!(
            "Excel file not found at {}",
            path.display()
        )));
    }

    umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|err| FlowError::Io(format!("failed to open {}: {err}", path.display())))
}

pub fn first_sheet_mut(book: &mut Spreadsheet) -> Result<&mut Worksheet> {
    book.get_sheet_mut(&0)
        .context("workbook has no worksheets")
}

pub fn sheet_named_mut<'a>(book: &'a mut Spreadsheet, name: &str) -> Result<&'a mut Worksheet> {
    if book.get_sheet_by_name(name).is_none() {
        book.new_sheet(name)
            .map_err(|err| anyhow!("failed to create sheet {name}: {err}"))?;
        info!(sheet = name, "created sheet");
    }

    book.get_sheet_by_name_mut(name)
        .with_context(|| format!("sheet {name} missing after creation"))
}

pub fn has_header(sheet: &Worksheet) -> bool {
    let highest_row = sheet.get_highest_row();
    !(highest_row == 0 || (highest_row == 1 && sheet.get_value((1, 1)).is_empty()))
}

/// Writes the bold header row when the sheet has none. Returns whether it wrote.
pub fn ensure_header(sheet: &mut Worksheet) -> bool {
    if has_header(sheet) {
        return false;
    }

    for (index, field) in Field::ALL.iter().enumerate() {
        let column = index as u32 + 1;
        sheet
            .get_cell_mut((column, 1))
            .set_value_string(field.header());
        sheet
            .get_style_mut((column, 1))
            .get_font_mut()
            .set_bold(true);
    }
    true
}

/// Appends `mapping` below the last used row and returns the new row number.
pub fn append_row(sheet: &mut Worksheet, mapping: &FieldMapping) -> u32 {
    let row = sheet.get_highest_row() + 1;
    for (index, field) in Field::ALL.iter().enumerate() {
        let column = index as u32 + 1;
        sheet
            .get_cell_mut((column, row))
            .set_value_string(mapping.cell_text(*field));
    }
    row
}

pub fn highlight_cell(sheet: &mut Worksheet, column: u32, row: u32) {
    sheet
        .get_style_mut((column, row))
        .set_background_color(HIGHLIGHT_ARGB);
}

pub fn apply_column_widths(sheet: &mut Worksheet) {
    for column in 1..=Field::ALL.len() as u32 {
        sheet
            .get_column_dimension_mut(&string_from_column_index(&column))
            .set_width(COLUMN_WIDTH);
    }
}

pub fn set_text(sheet: &mut Worksheet, column: u32, row: u32, value: &str) {
    sheet.get_cell_mut((column, row)).set_value_string(value);
}

/// Writes the workbook over `path`. The write is not atomic.
pub fn save(book: &Spreadsheet, path: &Path) -> Result<()> {
    ensure_parent_directory(path)?;
    umya_spreadsheet::writer::xlsx::write(book, path)
        .map_err(|err| anyhow!("failed to save workbook {}: {err}", path.display()))?;
    info!(path = %path.display(), "saved workbook");
    Ok(())
}

pub fn data_row_count(sheet: &Worksheet) -> u32 {
    if has_header(sheet) {
        sheet.get_highest_row().saturating_sub(1)
    } else {
        0
    }
}
