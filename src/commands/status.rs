use std::path::Path;

use tracing::{info, warn};

use crate::commands::agent::NIGO_SHEET;
use crate::config::{API_KEY_VAR, AppConfig};
use crate::model::{LedgerStatus, Status, StatusReport};
use crate::util::now_utc_string;
use crate::workbook;

pub fn run(config: &AppConfig) -> StatusReport {
    info!(
        ledger = %config.ledger_path.display(),
        nigo_ledger = %config.nigo_ledger_path.display(),
        "status requested"
    );

    let credential_configured = config.api_key().is_some();
    if !credential_configured {
        warn!(
            env_file = %config.env_file.display(),
            "{} not configured",
            API_KEY_VAR
        );
    }

    let ledger = inspect_ledger(&config.ledger_path, None);
    let nigo_ledger = inspect_ledger(&config.nigo_ledger_path, Some(NIGO_SHEET));

    let field_sheet_exists = config.field_sheet_path.exists();
    if !field_sheet_exists {
        warn!(path = %config.field_sheet_path.display(), "field sheet missing");
    }

    StatusReport {
        status: Status::Success,
        generated_at: now_utc_string(),
        credential_configured,
        ledger,
        nigo_ledger,
        field_sheet_exists,
    }
}

/// Summarizes one sheet of a ledger workbook; `None` means the first sheet.
pub fn inspect_ledger(path: &Path, sheet_name: Option<&str>) -> LedgerStatus {
    let mut status = LedgerStatus {
        path: path.display().to_string(),
        sheet: sheet_name.unwrap_or_default().to_string(),
        exists: path.exists(),
        readable: false,
        has_header: false,
        data_rows: 0,
    };

    if !status.exists {
        warn!(path = %status.path, "ledger missing");
        return status;
    }

    let book = match workbook::open_existing(path) {
        Ok(book) => book,
        Err(err) => {
            warn!(path = %status.path, error = %err, "ledger unreadable");
            return status;
        }
    };
    status.readable = true;

    let sheet = match sheet_name {
        Some(name) => book.get_sheet_by_name(name),
        None => book.get_sheet(&0),
    };
    let Some(sheet) = sheet else {
        warn!(path = %status.path, sheet = %status.sheet, "sheet missing");
        return status;
    };

    status.sheet = sheet.get_name().to_string();
    status.has_header = workbook::has_header(sheet);
    status.data_rows = workbook::data_row_count(sheet);

    info!(
        path = %status.path,
        sheet = %status.sheet,
        data_rows = status.data_rows,
        "ledger status"
    );
    status
}
