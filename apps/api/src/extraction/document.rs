//! Binary Text Extractor — turns an uploaded PDF or DOCX into plain text.
//!
//! Pure and synchronous. Callers on the async runtime run it inside
//! `tokio::task::spawn_blocking`.

use std::fmt;
use std::path::Path;

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, TableCellContent, TableChild,
    TableRowChild,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves a declared format tag: a short name, a MIME type or a file name.
    pub fn from_tag(tag: &str) -> Result<Self, DocumentError> {
        let normalized = tag.trim().to_ascii_lowercase();
        // "application/pdf; charset=binary" still names a PDF.
        let essence = normalized.split(';').next().unwrap_or("").trim();

        match essence {
            "pdf" | ".pdf" | PDF_MIME => return Ok(DocumentFormat::Pdf),
            "docx" | ".docx" | DOCX_MIME => return Ok(DocumentFormat::Docx),
            _ => {}
        }

        match Path::new(essence)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            _ => Err(DocumentError::UnsupportedFormat(tag.trim().to_string())),
        }
    }

    /// Guesses the format from magic bytes. DOCX files are ZIP containers.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(DocumentFormat::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            Some(DocumentFormat::Docx)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts plain text from `bytes`. Zero usable characters is a failure, not an empty success.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, DocumentError> {
    let raw = match format {
        DocumentFormat::Pdf => decode_pdf(bytes)?,
        DocumentFormat::Docx => decode_docx(bytes)?,
    };

    let text = normalize_text(&raw);
    if text.is_empty() {
        warn!("{format} decoded but produced no text ({} bytes in)", bytes.len());
        return Err(DocumentError::ExtractionFailure(format!(
            "no extractable text in {format} document"
        )));
    }

    debug!(
        "{format} extraction produced {} characters",
        text.chars().count()
    );
    Ok(text)
}

fn decode_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    // pdf_extract panics on some malformed files instead of returning an error.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(DocumentError::ExtractionFailure(format!(
            "PDF decode error: {e}"
        ))),
        Err(_) => Err(DocumentError::ExtractionFailure(
            "PDF decoder panicked (malformed PDF)".to_string(),
        )),
    }
}

fn decode_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| DocumentError::ExtractionFailure(format!("DOCX decode error: {e}")))?;

    let mut lines: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => {
                for TableChild::TableRow(row) in &table.rows {
                    for TableRowChild::TableCell(cell) in &row.cells {
                        let cell_text = cell
                            .children
                            .iter()
                            .filter_map(|content| match content {
                                TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join("\n");
                        lines.push(cell_text);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    collect_runs(&paragraph.children, &mut text);
    text
}

fn collect_runs(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => collect_runs(&link.children, out),
            _ => {}
        }
    }
}

/// Joins page/section boundaries with newlines and drops layout noise.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000C}'], "\n")
        .replace('\u{00A0}', " ");

    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = true;
    for line in unified.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !previous_blank {
                out.push("");
            }
            previous_blank = true;
        } else {
            out.push(line);
            previous_blank = false;
        }
    }
    while out.last() == Some(&"") {
        out.pop();
    }
    out.join("\n")
}
