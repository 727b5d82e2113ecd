//! Plain-text view of a DOCX agreement.
//!
//! Only `word/document.xml` is read. Body paragraphs and top-level tables are
//! kept in document order; paragraphs inside table cells belong to the cell.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

pub const DOC_CONTENT_MARKER: &str = "\n--- DOC CONTENT ---\n";
pub const TABLE_CONTENT_MARKER: &str = "\n--- TABLE CONTENT ---\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Vec<Vec<String>>>,
}

impl DocumentText {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|text| text.trim().is_empty())
            && self
                .tables
                .iter()
                .flatten()
                .flatten()
                .all(|cell| cell.trim().is_empty())
    }

    pub fn render(&self) -> String {
        let mut content = String::from(DOC_CONTENT_MARKER);
        for paragraph in &self.paragraphs {
            if paragraph.trim().is_empty() {
                continue;
            }
            content.push_str(paragraph);
            content.push('\n');
        }

        content.push_str(TABLE_CONTENT_MARKER);
        for row in self.tables.iter().flatten() {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect();
            if cells.is_empty() {
                continue;
            }
            content.push_str(&cells.join(" | "));
            content.push('\n');
        }

        content
    }
}

pub fn read_docx(path: &Path) -> Result<DocumentText> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("{} is not a DOCX (zip) archive", path.display()))?;

    let mut document_xml = archive
        .by_name("word/document.xml")
        .with_context(|| format!("{} has no word/document.xml part", path.display()))?;
    let mut xml = String::new();
    document_xml
        .read_to_string(&mut xml)
        .with_context(|| format!("failed to read word/document.xml in {}", path.display()))?;

    parse_document_xml(&xml)
        .with_context(|| format!("failed to parse word/document.xml in {}", path.display()))
}

#[derive(Default)]
struct BodyWalker {
    text: DocumentText,
    table_depth: usize,
    in_run: bool,
    in_text_run: bool,
    paragraph: String,
    cell_paragraphs: Vec<String>,
    row: Vec<String>,
    table: Vec<Vec<String>>,
}

impl BodyWalker {
    fn start(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table.clear();
                }
            }
            b"tr" if self.table_depth == 1 => self.row.clear(),
            b"tc" if self.table_depth == 1 => self.cell_paragraphs.clear(),
            b"p" => self.paragraph.clear(),
            b"r" => self.in_run = true,
            b"t" => self.in_text_run = true,
            _ => self.empty(element),
        }
    }

    fn empty(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"tab" if self.in_run => self.paragraph.push('\t'),
            b"br" | b"cr" if self.in_run => self.paragraph.push('\n'),
            b"p" => {
                self.paragraph.clear();
                self.end_paragraph();
            }
            b"tc" if self.table_depth == 1 => self.row.push(String::new()),
            _ => {}
        }
    }

    fn end(&mut self, local_name: &[u8]) {
        match local_name {
            b"t" => self.in_text_run = false,
            b"r" => self.in_run = false,
            b"p" => self.end_paragraph(),
            b"tc" if self.table_depth == 1 => {
                let cell = self.cell_paragraphs.join("\n").trim().to_string();
                self.row.push(cell);
            }
            b"tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.table.push(row);
            }
            b"tbl" => {
                if self.table_depth == 1 {
                    let table = std::mem::take(&mut self.table);
                    self.text.tables.push(table);
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn text(&mut self, value: &str) {
        if self.in_text_run {
            self.paragraph.push_str(value);
        }
    }

    fn end_paragraph(&mut self) {
        let paragraph = std::mem::take(&mut self.paragraph);
        match self.table_depth {
            0 => self.text.paragraphs.push(paragraph),
            1 => self.cell_paragraphs.push(paragraph),
            _ => {}
        }
    }
}

pub fn parse_document_xml(xml: &str) -> Result<DocumentText> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut walker = BodyWalker::default();
    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed XML near byte {}", reader.buffer_position()))?
        {
            Event::Start(element) => walker.start(&element),
            Event::Empty(element) => walker.empty(&element),
            Event::End(element) => walker.end(element.local_name().as_ref()),
            Event::Text(text) => {
                let value = text.unescape().context("invalid XML text escape")?;
                walker.text(&value);
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                walker.text(&value);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.text)
}
