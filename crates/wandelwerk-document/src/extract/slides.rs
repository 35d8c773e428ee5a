// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slide decks (PPTX): text of each slide's shapes, slide by slide.

use serde::Serialize;
use tracing::{debug, instrument, warn};
use wandelwerk_core::error::Result;

use super::ooxml::{self, Package, RELATIONSHIPS_NS, is};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Text found on one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "shapes", rename_all = "snake_case")]
pub enum SlideContent {
    /// Text of each text-bearing shape, in shape-tree order.
    Text(Vec<String>),
    /// The slide has no shape carrying text.
    NoText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slide {
    /// 1-based position in the deck.
    pub number: usize,
    pub content: SlideContent,
}

/// Every slide of the deck, in presentation order.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn slides(bytes: &[u8]) -> Result<Vec<Slide>> {
    let mut package = Package::open(bytes)?;
    let parts = slide_parts(&mut package)?;

    let mut slides = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        let xml = package.read_part(part)?;
        let doc = ooxml::parse_xml(&xml, part)?;
        let shapes = shape_texts(&doc);

        slides.push(Slide {
            number: index + 1,
            content: if shapes.is_empty() {
                SlideContent::NoText
            } else {
                SlideContent::Text(shapes)
            },
        });
    }

    debug!(slides = slides.len(), "PPTX slides extracted");
    Ok(slides)
}

/// Slide part names in presentation order.
///
/// Order comes from `<p:sldIdLst>`; packages without a usable list fall back
/// to the numeric order of `ppt/slides/slideN.xml`.
fn slide_parts(package: &mut Package<'_>) -> Result<Vec<String>> {
    if let Some(xml) = package.read_optional_part(PRESENTATION_PART)? {
        let doc = ooxml::parse_xml(&xml, PRESENTATION_PART)?;
        let rels = package.relationships(PRESENTATION_PART)?;

        let ordered: Vec<String> = doc
            .descendants()
            .filter(|node| is(node, "sldId"))
            .filter_map(|node| node.attribute((RELATIONSHIPS_NS, "id")))
            .filter_map(|rel_id| rels.get(rel_id).cloned())
            .collect();
        if !ordered.is_empty() {
            return Ok(ordered);
        }
        warn!("presentation has no slide list, ordering slides by file name");
    }

    let mut numbered: Vec<(u32, String)> = package
        .part_names()
        .into_iter()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name))
        })
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// Text of each top-level shape in the slide's shape tree. Shapes without a
/// text body, or whose text body is empty, carry no text.
fn shape_texts(doc: &roxmltree::Document<'_>) -> Vec<String> {
    let Some(tree) = doc.descendants().find(|node| is(node, "spTree")) else {
        return Vec::new();
    };

    tree.children()
        .filter(|node| is(node, "sp"))
        .filter_map(|shape| {
            let body = shape.children().find(|node| is(node, "txBody"))?;
            let text = body
                .children()
                .filter(|node| is(node, "p"))
                .map(|paragraph| paragraph_text(&paragraph))
                .collect::<Vec<_>>()
                .join("\n");
            (!text.trim().is_empty()).then_some(text)
        })
        .collect()
}

fn paragraph_text(paragraph: &roxmltree::Node<'_, '_>) -> String {
    let mut text = String::new();
    for node in paragraph.descendants().filter(|node| node.is_element()) {
        match node.tag_name().name() {
            "t" => text.push_str(node.text().unwrap_or_default()),
            "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}
