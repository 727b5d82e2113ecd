use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use umya_spreadsheet::{Spreadsheet, Worksheet};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::ledger::{SUMMARY_SUBJECT, summary_body};
use super::nigo::{NIGO_SHEET, NOTICE_SUBJECT, notice_body};
use super::*;
use crate::llm::fake::CannedModel;
use crate::mail::recording::RecordingMailer;
use crate::model::Field;
use crate::workbook::HIGHLIGHT_ARGB;

fn mapping(value: Value) -> FieldMapping {
    FieldMapping::from_payload(&value.to_string()).expect("fixture should be an object")
}

fn complete_fields() -> Value {
    json!({
        "Discretion": "Discretionary",
        "WRAP": "WRAP",
        "Clients name": "Ted Smith Trust",
        "Effective date": "03/14/2024",
        "Client signature page 11": "Yes",
        "client date page 11": "Yes",
        "account number": "ACC-1001",
        "Fee type": "Flat",
        "Fee amount": "1%",
        "ADV received date": "03/01/2024",
        "Client signature page 14": "Yes",
        "client date page 14": "Yes",
    })
}

fn reopen(path: &Path) -> Spreadsheet {
    umya_spreadsheet::reader::xlsx::read(path).expect("workbook should reopen")
}

fn row_values(sheet: &Worksheet, row: u32) -> Vec<String> {
    (1..=12).map(|column| sheet.get_value((column, row))).collect()
}

fn is_bold(sheet: &Worksheet, column: u32, row: u32) -> bool {
    sheet
        .get_cell((column, row))
        .and_then(|cell| cell.get_style().get_font())
        .map(|font| *font.get_bold())
        .unwrap_or(false)
}

fn is_highlighted(sheet: &Worksheet, column: u32, row: u32) -> bool {
    sheet
        .get_cell((column, row))
        .and_then(|cell| cell.get_style().get_background_color())
        .map(|color| color.get_argb() == HIGHLIGHT_ARGB)
        .unwrap_or(false)
}

fn write_docx(dir: &Path, body_xml: &str) -> PathBuf {
    let path = dir.join("agreement.docx");
    let file = File::create(&path).expect("docx should be created");
    let mut zip = ZipWriter::new(file);
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .expect("document part should start");
    let xml = format!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
    );
    zip.write_all(xml.as_bytes())
        .expect("document part should be written");
    zip.finish().expect("archive should be finalized");
    path
}

#[test]
fn save_creates_missing_workbook_with_bold_header() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("Desktop").join("Advisory Agent.xlsx");
    let mailer = RecordingMailer::default();

    let report = save_to_ledger(&mapping(complete_fields()), &path, &mailer);
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.row, Some(2));
    assert!(path.exists());

    let book = reopen(&path);
    let sheet = book.get_sheet(&0).expect("sheet should exist");
    let headers: Vec<String> = Field::ALL.iter().map(|f| f.header().to_string()).collect();
    assert_eq!(row_values(sheet, 1), headers);
    assert!((1..=12).all(|column| is_bold(sheet, column, 1)));
}

#[test]
fn save_twice_appends_two_rows_under_a_single_header() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("ledger.xlsx");
    let mailer = RecordingMailer::default();

    let first = save_to_ledger(&mapping(complete_fields()), &path, &mailer);
    let second = save_to_ledger(
        &mapping(json!({ "Clients name": "Second Trust", "Fee amount": "0.85%" })),
        &path,
        &mailer,
    );
    assert_eq!(first.row, Some(2));
    assert_eq!(second.row, Some(3));

    let book = reopen(&path);
    let sheet = book.get_sheet(&0).expect("sheet should exist");
    assert_eq!(sheet.get_highest_row(), 3);
    assert_eq!(sheet.get_value((1, 1)), "Discretion");
    assert_eq!(sheet.get_value((3, 2)), "Ted Smith Trust");
    assert_eq!(
        row_values(sheet, 3),
        vec!["", "", "Second Trust", "", "", "", "", "", "0.85%", "", "", ""]
    );
}

#[test]
fn save_opens_summary_email_for_every_field() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("ledger.xlsx");
    let mailer = RecordingMailer::default();

    save_to_ledger(&mapping(json!({ "WRAP": "Non-WRAP" })), &path, &mailer);

    let drafts = mailer.drafts.borrow();
    assert_eq!(drafts.len(), 1);
    let (subject, body) = &drafts[0];
    assert_eq!(subject, SUMMARY_SUBJECT);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "Advisory Agent Analysis Results:");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "Discretionary v. Non-Discretionary: Not Found");
    assert_eq!(lines[3], "Wrap v. Non-WRAP: Non-WRAP");
    assert_eq!(lines.len(), 14);
}

#[test]
fn mail_failure_is_recorded_without_failing_the_save() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("ledger.xlsx");

    let report = save_to_ledger(&mapping(complete_fields()), &path, &RecordingMailer::failing());
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.debug_notes.len(), 1);
    assert!(report.debug_notes[0].starts_with("Failed to open mail client"));
}

#[test]
fn save_replaces_corrupt_workbook_and_notes_it() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("ledger.xlsx");
    std::fs::write(&path, "garbage").expect("corrupt file should be written");

    let report = save_to_ledger(&mapping(complete_fields()), &path, &RecordingMailer::default());
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.row, Some(2));
    assert!(report.debug_notes.iter().any(|note| note.contains("could not be opened")));
}

#[test]
fn save_fails_when_target_cannot_be_written() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "file, not a directory").expect("blocker should be written");
    let path = blocker.join("ledger.xlsx");
    let mailer = RecordingMailer::default();

    let report = save_to_ledger(&mapping(complete_fields()), &path, &mailer);
    assert_eq!(report.status, Status::Failed);
    assert_eq!(report.error_kind, Some("io"));
    assert!(mailer.drafts.borrow().is_empty());
}

#[test]
fn nigo_highlights_invalid_cells_on_dedicated_sheet() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("nigo.xlsx");
    let mut fields = complete_fields();
    fields["client date page 11"] = json!("03/14/2024");
    fields["account number"] = json!("not found");
    fields["Fee type"] = json!("");

    let report = flag_nigo(&mapping(fields), &path, &RecordingMailer::default());
    assert_eq!(report.status, Status::Success);
    assert!(report.excel_updated);
    assert_eq!(report.row, Some(2));
    assert_eq!(
        report.flagged_fields,
        vec!["client date page 11", "account number", "Fee type"]
    );

    let book = reopen(&path);
    let sheet = book
        .get_sheet_by_name(NIGO_SHEET)
        .expect("NIGO sheet should exist");
    assert!(is_bold(sheet, 1, 1));
    let highlighted: Vec<u32> = (1..=12)
        .filter(|column| is_highlighted(sheet, *column, 2))
        .collect();
    assert_eq!(highlighted, vec![6, 7, 8]);
    assert_eq!(sheet.get_value((6, 2)), "03/14/2024");
}

#[test]
fn nigo_missing_list_diverges_from_highlighting() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("nigo.xlsx");
    let mailer = RecordingMailer::default();
    let mut fields = complete_fields();
    fields["account number"] = json!("not found");
    fields["Fee amount"] = json!("Missing");

    let report = flag_nigo(&mapping(fields), &path, &mailer);
    assert_eq!(report.flagged_fields, vec!["account number", "Fee amount"]);
    assert_eq!(report.missing_items, vec!["Fee Amount"]);

    let drafts = mailer.drafts.borrow();
    let (subject, body) = &drafts[0];
    assert_eq!(subject, NOTICE_SUBJECT);
    assert!(body.contains("- Fee Amount"));
    assert!(!body.contains("Account Number"));
}

#[test]
fn nigo_reuses_existing_sheet_and_keeps_other_sheets() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("shared.xlsx");
    let mailer = RecordingMailer::default();

    save_to_ledger(&mapping(complete_fields()), &path, &mailer);
    let first = flag_nigo(&mapping(complete_fields()), &path, &mailer);
    let second = flag_nigo(&mapping(json!({})), &path, &mailer);
    assert_eq!(first.row, Some(2));
    assert_eq!(second.row, Some(3));
    assert_eq!(second.missing_items.len(), 12);

    let book = reopen(&path);
    assert_eq!(book.get_sheet_count(), 2);
    let master = book.get_sheet(&0).expect("master sheet should exist");
    assert_eq!(master.get_value((3, 2)), "Ted Smith Trust");
    let nigo = book
        .get_sheet_by_name(NIGO_SHEET)
        .expect("NIGO sheet should exist");
    assert!((1..=12).all(|column| is_highlighted(nigo, column, 3)));
    assert!((1..=12).all(|column| !is_highlighted(nigo, column, 2)));
}

#[test]
fn nigo_workbook_failure_still_sends_notice() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "file, not a directory").expect("blocker should be written");
    let mailer = RecordingMailer::default();

    let report = flag_nigo(
        &mapping(json!({ "WRAP": "Error" })),
        &blocker.join("nigo.xlsx"),
        &mailer,
    );
    assert_eq!(report.status, Status::Success);
    assert!(!report.excel_updated);
    assert!(report.debug_notes[0].starts_with("Failed to update NIGO Excel"));
    assert_eq!(mailer.drafts.borrow().len(), 1);
}

#[test]
fn notice_body_falls_back_when_nothing_is_missing() {
    assert_eq!(
        notice_body(&[]),
        "Please see the following missing items that need to be corrected:\n\n\
         No specific extracted fields marked as missing/error. Please review document manually.\n\n\
         Please resubmit once corrected."
    );
    assert_eq!(
        notice_body(&["Fee Type".to_string()]),
        "Please see the following missing items that need to be corrected:\n\n\
         - Fee Type\n\nPlease resubmit once corrected."
    );
}

#[test]
fn summary_body_prefers_headers_over_aliases() {
    let body = summary_body(&mapping(json!({
        "Clients name": "Header Trust",
        "clientName": "Alias Trust",
        "feeAmount": "1.25%",
    })));
    assert!(body.contains("Client's Name: Header Trust"));
    assert!(body.contains("Fee Amount: 1.25%"));
}

#[test]
fn analyze_document_returns_model_fields_and_document_text() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let doc = write_docx(
        dir.path(),
        r#"<w:p><w:r><w:t>Rep Code: TSM</w:t></w:r></w:p>
           <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Other Arrangements</w:t></w:r></w:p></w:tc>
           <w:tc><w:p><w:r><w:t>Flat 1%</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
    );
    let model = CannedModel::replying(
        "```json\n{\"Fee Structure\": \"Flat 1%\", \"Rep Code\": \"TSM\"}\n```",
    );

    let report = analyze_document(&doc, &model);
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.fee, Some(json!("Flat 1%")));
    let text = report.document_text.expect("document text should be returned");
    assert!(text.contains("Rep Code: TSM\n"));
    assert!(text.contains("Other Arrangements | Flat 1%\n"));
    assert!(model.prompts.borrow()[0].contains(&text));
    assert_eq!(report.document_sha256.map(|hash| hash.len()), Some(64));
}

#[test]
fn analyze_document_defaults_fee_to_not_found() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let doc = write_docx(dir.path(), "<w:p><w:r><w:t>Agreement</w:t></w:r></w:p>");
    let model = CannedModel::replying("{\"Rep Code\": \"TSM\"}");

    let report = analyze_document(&doc, &model);
    assert_eq!(report.fee, Some(json!("Not Found")));
}

#[test]
fn analyze_document_rejects_empty_documents_before_calling_model() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let doc = write_docx(dir.path(), "<w:p/><w:p><w:r><w:t> </w:t></w:r></w:p>");
    let model = CannedModel::replying("{}");

    let report = analyze_document(&doc, &model);
    assert_eq!(report.status, Status::Failed);
    assert_eq!(
        report.error.as_deref(),
        Some("No text could be extracted from the document.")
    );
    assert!(model.prompts.borrow().is_empty());
}

#[test]
fn analyze_document_wraps_read_failures_with_debug_note() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let model = CannedModel::replying("{}");

    let report = analyze_document(&dir.path().join("absent.docx"), &model);
    assert_eq!(report.status, Status::Failed);
    assert_eq!(report.error_kind, Some("extraction"));
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|error| error.starts_with("Failed to read .docx file:"))
    );
    assert_eq!(report.debug_notes.len(), 1);
}

#[test]
fn analyze_document_reports_non_json_reply_as_remote_failure() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let doc = write_docx(dir.path(), "<w:p><w:r><w:t>Agreement</w:t></w:r></w:p>");
    let model = CannedModel::replying("I could not find anything.");

    let report = analyze_document(&doc, &model);
    assert_eq!(report.status, Status::Failed);
    assert_eq!(report.error_kind, Some("remote"));
    assert!(report.gemini_data.is_none());
}

#[test]
fn extract_requires_credential_before_reading_document() {
    if std::env::var(API_KEY_VAR).is_ok() {
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let config = AppConfig {
        env_file: dir.path().join(".env.local"),
        ..AppConfig::default()
    };

    let report = extract(
        ExtractArgs {
            doc_path: dir.path().join("absent.docx"),
        },
        &config,
    );
    assert_eq!(report.status, Status::Failed);
    assert_eq!(report.error_kind, Some("configuration"));
    assert_eq!(
        report.error.as_deref(),
        Some("GEMINI_API_KEY not found in environment")
    );
}

#[test]
fn run_payload_rejects_malformed_json_with_snippet() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let config = AppConfig {
        ledger_path: dir.path().join("ledger.xlsx"),
        mail_enabled: false,
        ..AppConfig::default()
    };
    let payload = format!("{{\"WRAP\": {}", "x".repeat(150));

    let outcome = run_payload(Mode::Save, PayloadArgs { payload }, &config);
    let PayloadOutcome::Rejected(report) = outcome else {
        panic!("malformed payload should be rejected");
    };
    assert!(report.error.starts_with("Invalid JSON payload for save mode:"));
    assert_eq!(report.error.matches("JSON payload").count(), 1);
    assert_eq!(report.payload_snippet.chars().count(), PAYLOAD_SNIPPET_CHARS);
    assert!(!dir.path().join("ledger.xlsx").exists());
}

#[test]
fn run_payload_saves_with_disabled_mailer() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let config = AppConfig {
        ledger_path: dir.path().join("ledger.xlsx"),
        mail_enabled: false,
        ..AppConfig::default()
    };

    let outcome = run_payload(
        Mode::Save,
        PayloadArgs {
            payload: complete_fields().to_string(),
        },
        &config,
    );
    let json = serde_json::to_value(&outcome).expect("outcome should serialize");
    assert_eq!(json["status"], "success");
    assert_eq!(json["row"], 2);
}
