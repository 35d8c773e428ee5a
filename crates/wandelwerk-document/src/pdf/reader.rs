// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — load an existing PDF with `lopdf` and inspect its pages.

use lopdf::{Document, ObjectId};
use tracing::{debug, instrument};
use wandelwerk_core::error::{EngineError, Result};

/// Read-only view over a loaded PDF document.
///
/// Nothing in this crate mutates the wrapped `lopdf::Document`; every
/// transformation copies pages into a fresh output document.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Load a PDF from raw bytes already in memory.
    ///
    /// A document whose objects are still encrypted (anything locked with a
    /// non-empty user password) is `PasswordProtected`; lopdf would otherwise
    /// present it as a document without pages.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = load_document(data)?;
        if is_locked(&document) {
            debug!("PDF is locked, refusing to read it");
            return Err(EngineError::PasswordProtected);
        }

        debug!(
            pages = document.get_pages().len(),
            encrypted = document.is_encrypted(),
            "PDF loaded from bytes"
        );

        Ok(Self { document })
    }

    pub(crate) fn from_document(document: Document) -> Self {
        Self { document }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Page object IDs in reading order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // lopdf keys pages by their 1-indexed page number in a BTreeMap.
        self.document.get_pages().into_values().collect()
    }

    /// Object ID of a 1-indexed page.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page_number)
            .copied()
            .ok_or(EngineError::PageOutOfRange {
                page: page_number,
                count: self.page_count(),
            })
    }

    /// Extracted text of a 1-indexed page; empty if the page carries no text.
    #[instrument(skip(self))]
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        let count = self.page_count();
        if page_number == 0 || page_number > count {
            return Err(EngineError::PageOutOfRange {
                page: page_number,
                count,
            });
        }

        let text = self
            .document
            .extract_text(&[page_number])
            .map_err(|err| {
                EngineError::PdfError(format!(
                    "failed to extract text from page {}: {}",
                    page_number, err
                ))
            })?;

        debug!(page_number, chars = text.len(), "Page text extracted");
        Ok(text)
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }
}

/// Parse `data` without judging whether its objects could be decrypted.
pub(crate) fn load_document(data: &[u8]) -> Result<Document> {
    Document::load_mem(data)
        .map_err(|err| EngineError::PdfError(format!("failed to load PDF from memory: {}", err)))
}

/// Encrypted, and lopdf could not open it with the empty user password.
pub(crate) fn is_locked(document: &Document) -> bool {
    document.is_encrypted() && document.encryption_state.is_none()
}
