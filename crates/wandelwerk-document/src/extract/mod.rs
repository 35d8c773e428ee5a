// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction — one readable view per document kind, selected by the
// declared file kind.

mod ooxml;
pub mod slides;
pub mod tabular;
pub mod word;

use serde::Serialize;
use tracing::{info, instrument};
use wandelwerk_core::error::{EngineError, Result};
use wandelwerk_core::{SourceFile, SourceKind};

use crate::pdf::reader::PdfReader;

pub use slides::{Slide, SlideContent};
pub use tabular::Table;

/// Families of documents the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Paged,
    WordProcessing,
    SlideDeck,
    Spreadsheet,
    DelimitedText,
    PlainText,
}

impl DocumentKind {
    /// Map a declared file kind to its extractor. Media and image kinds have
    /// no text view.
    pub fn from_source(kind: SourceKind) -> Result<Self> {
        match kind {
            SourceKind::Pdf => Ok(Self::Paged),
            SourceKind::Docx => Ok(Self::WordProcessing),
            SourceKind::Pptx => Ok(Self::SlideDeck),
            SourceKind::Xlsx => Ok(Self::Spreadsheet),
            SourceKind::Csv => Ok(Self::DelimitedText),
            SourceKind::Txt => Ok(Self::PlainText),
            other => Err(EngineError::UnsupportedKind(format!(
                "{} has no text view",
                other.mime_type()
            ))),
        }
    }
}

/// What the extractor found, shaped per document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extraction {
    Page {
        page: u32,
        page_count: u32,
        text: String,
    },
    Paragraphs {
        text: String,
    },
    Slides {
        slides: Vec<Slide>,
    },
    Table {
        rows: usize,
        columns: usize,
        table: Table,
    },
    PlainText {
        text: String,
    },
}

/// Extract the readable content of `file`.
///
/// `page` selects the 1-based page of a paged document and defaults to the
/// first page; other kinds ignore it.
#[instrument(skip_all, fields(kind = ?file.kind, bytes_len = file.len()))]
pub fn extract(file: &SourceFile, page: Option<u32>) -> Result<Extraction> {
    let extraction = match DocumentKind::from_source(file.kind)? {
        DocumentKind::Paged => {
            let reader = PdfReader::from_bytes(&file.bytes)?;
            let page = page.unwrap_or(1);
            Extraction::Page {
                page,
                page_count: reader.page_count(),
                text: reader.page_text(page)?,
            }
        }
        DocumentKind::WordProcessing => Extraction::Paragraphs {
            text: word::paragraphs_text(&file.bytes)?,
        },
        DocumentKind::SlideDeck => Extraction::Slides {
            slides: slides::slides(&file.bytes)?,
        },
        DocumentKind::Spreadsheet => table_extraction(Table::from_xlsx(&file.bytes)?),
        DocumentKind::DelimitedText => table_extraction(Table::from_csv(&file.bytes)?),
        DocumentKind::PlainText => Extraction::PlainText {
            text: plain_text(&file.bytes)?,
        },
    };

    info!(kind = ?file.kind, "Extraction complete");
    Ok(extraction)
}

fn table_extraction(table: Table) -> Extraction {
    Extraction::Table {
        rows: table.row_count(),
        columns: table.column_count(),
        table,
    }
}

/// Strict UTF-8 decode; a leading byte-order mark is dropped.
pub fn plain_text(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|err| EngineError::DocumentError(format!("text is not valid UTF-8: {}", err)))
}
