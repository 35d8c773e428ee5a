// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-processing documents (DOCX): body paragraphs in document order.

use tracing::{debug, instrument};
use wandelwerk_core::error::{EngineError, Result};

use super::ooxml::{self, Package, is};

const DOCUMENT_PART: &str = "word/document.xml";

/// Every top-level body paragraph, joined by `\n`.
///
/// Paragraphs nested inside tables are not part of the body's paragraph
/// sequence and are left out.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn paragraphs_text(bytes: &[u8]) -> Result<String> {
    let mut package = Package::open(bytes)?;
    let xml = package.read_part(DOCUMENT_PART)?;
    let doc = ooxml::parse_xml(&xml, DOCUMENT_PART)?;

    let body = doc
        .descendants()
        .find(|node| is(node, "body"))
        .ok_or_else(|| EngineError::DocumentError("document has no <w:body>".into()))?;

    let paragraphs: Vec<String> = body
        .children()
        .filter(|node| is(node, "p"))
        .map(|paragraph| paragraph_text(&paragraph))
        .collect();

    debug!(paragraphs = paragraphs.len(), "DOCX paragraphs extracted");
    Ok(paragraphs.join("\n"))
}

/// Text runs of one paragraph; tabs and breaks become `\t` and `\n`.
fn paragraph_text(paragraph: &roxmltree::Node<'_, '_>) -> String {
    let mut text = String::new();
    for node in paragraph.descendants() {
        if !node.is_element() {
            continue;
        }
        match node.tag_name().name() {
            "t" => text.push_str(node.text().unwrap_or_default()),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}
