// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandelwerk-document — Document transformations for the Wandelwerk engine.
//
// Provides PDF assembly (merge, range extraction, lock, unlock), image
// pagination onto fixed-size pages, CSV-to-vCard conversion, and text
// extraction for PDF, DOCX, PPTX, XLSX, CSV and plain-text files.

pub mod contacts;
pub mod extract;
pub mod image;
pub mod pdf;

// Re-export the primary entry points so callers can use `wandelwerk_document::PdfAssembler` etc.
pub use contacts::{ContactRecord, VCardBatch, csv_to_vcards};
pub use extract::{DocumentKind, Extraction, extract};
pub use image::paginator::{ImagePaginator, PageImage};
pub use pdf::assembler::PdfAssembler;
pub use pdf::range::PageRange;
pub use pdf::writer::PdfWriter;
