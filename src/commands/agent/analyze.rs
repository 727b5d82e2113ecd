use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::docx::read_docx;
use crate::error::{FlowError, chain_message};
use crate::llm::{FEE_STRUCTURE_KEY, LanguageModel, summarize};
use crate::model::{ExtractReport, Status};
use crate::util::sha256_file;

const NOT_FOUND: &str = "Not Found";

pub fn analyze_document(doc_path: &Path, model: &dyn LanguageModel) -> ExtractReport {
    let mut debug_notes = Vec::new();

    let document = match read_docx(doc_path) {
        Ok(document) => document,
        Err(err) => {
            let detail = chain_message(&err);
            debug_notes.push(format!("Error reading .docx: {detail}"));
            return failed_report(
                FlowError::Extraction(format!("Failed to read .docx file: {detail}")),
                debug_notes,
            );
        }
    };

    if document.is_empty() {
        return failed_report(
            FlowError::Extraction("No text could be extracted from the document.".to_string()),
            debug_notes,
        );
    }

    let document_text = document.render();
    info!(
        path = %doc_path.display(),
        paragraphs = document.paragraphs.len(),
        tables = document.tables.len(),
        chars = document_text.len(),
        "document text extracted"
    );

    let document_sha256 = match sha256_file(doc_path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            debug_notes.push(format!("Could not hash document: {}", chain_message(&err)));
            None
        }
    };

    let data = match summarize(model, &document_text) {
        Ok(data) => data,
        Err(err) => return failed_report(FlowError::remote(err), debug_notes),
    };

    let fee = data
        .get(FEE_STRUCTURE_KEY)
        .cloned()
        .unwrap_or_else(|| Value::from(NOT_FOUND));
    info!(fields = data.len(), "model reply parsed");

    ExtractReport {
        status: Status::Success,
        error: None,
        error_kind: None,
        debug_notes,
        gemini_data: Some(data),
        fee: Some(fee),
        document_text: Some(document_text),
        document_sha256,
    }
}

pub(super) fn failed_report(err: FlowError, debug_notes: Vec<String>) -> ExtractReport {
    warn!(error = %err, kind = err.kind(), "document analysis failed");
    ExtractReport {
        status: Status::Failed,
        error: Some(err.to_string()),
        error_kind: Some(err.kind()),
        debug_notes,
        gemini_data: None,
        fee: None,
        document_text: None,
        document_sha256: None,
    }
}
