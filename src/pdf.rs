use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::model::PdfFields;

pub const REP_CODE_LABEL: &str = "Rep Code";
pub const FEE_LABEL: &str = "Fee";
pub const REP_CODE_PAGE_INDEX: usize = 0;
pub const FEE_PAGE_INDEX: usize = 13;

pub fn extract_pages_with_pdftotext(pdf_path: &Path) -> Result<Vec<String>> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg("1")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// pdftotext ends every page with a form feed.
pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub fn scan_pages(pages: &[String]) -> PdfFields {
    let rep_code = pages
        .get(REP_CODE_PAGE_INDEX)
        .and_then(|page| find_labeled_token(page, REP_CODE_LABEL));

    let fee = if pages.len() > FEE_PAGE_INDEX {
        find_labeled_token(&pages[FEE_PAGE_INDEX], FEE_LABEL)
    } else {
        None
    };

    PdfFields { rep_code, fee }
}

/// First token after `label` on the first line that mentions it.
///
/// Only the text up to a repeated label is considered, and a label with
/// nothing after it yields `None` even though it was found.
pub fn find_labeled_token(page_text: &str, label: &str) -> Option<String> {
    let line = page_text.lines().find(|line| line.contains(label))?;
    let remainder = line.split(label).nth(1)?;

    remainder
        .trim_matches(|ch| ch == ':' || ch == ' ')
        .split_whitespace()
        .next()
        .map(ToOwned::to_owned)
}
