// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office Open XML packages — the zip container shared by DOCX, PPTX and XLSX,
// plus the relationship parts that link one XML part to another.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use tracing::debug;
use wandelwerk_core::error::{EngineError, Result};
use zip::ZipArchive;
use zip::result::ZipError;

/// Namespace of `r:id` attributes.
pub(crate) const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// An opened OOXML package held in memory.
pub(crate) struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| {
            EngineError::DocumentError(format!("not an Office Open XML package: {}", err))
        })?;
        debug!(entries = archive.len(), "OOXML package opened");
        Ok(Self { archive })
    }

    /// Read a required part as UTF-8 text.
    pub(crate) fn read_part(&mut self, name: &str) -> Result<String> {
        self.read_optional_part(name)?.ok_or_else(|| {
            EngineError::DocumentError(format!("package has no '{}' part", name))
        })
    }

    /// Read a part that may legitimately be absent.
    pub(crate) fn read_optional_part(&mut self, name: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => {
                return Err(EngineError::DocumentError(format!(
                    "cannot read '{}': {}",
                    name, err
                )));
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(|err| {
            EngineError::DocumentError(format!("'{}' is not valid UTF-8 XML: {}", name, err))
        })?;
        Ok(Some(content))
    }

    pub(crate) fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Relationship targets of `part` keyed by relationship ID, resolved to
    /// package-absolute part names.
    pub(crate) fn relationships(&mut self, part: &str) -> Result<HashMap<String, String>> {
        let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
        let rels_name = if dir.is_empty() {
            format!("_rels/{file}.rels")
        } else {
            format!("{dir}/_rels/{file}.rels")
        };

        let Some(xml) = self.read_optional_part(&rels_name)? else {
            return Ok(HashMap::new());
        };
        let doc = parse_xml(&xml, &rels_name)?;

        Ok(doc
            .descendants()
            .filter(|node| is(node, "Relationship"))
            .filter_map(|node| {
                let id = node.attribute("Id")?;
                let target = node.attribute("Target")?;
                Some((id.to_string(), resolve_target(dir, target)))
            })
            .collect())
    }
}

/// Parse an XML part, naming the part on failure.
pub(crate) fn parse_xml<'x>(xml: &'x str, part: &str) -> Result<roxmltree::Document<'x>> {
    roxmltree::Document::parse(xml)
        .map_err(|err| EngineError::DocumentError(format!("malformed XML in '{}': {}", part, err)))
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Local-name match that ignores the namespace prefix.
pub(crate) fn is(node: &roxmltree::Node<'_, '_>, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    /// Build a zip package from `(part name, content)` pairs.
    pub(crate) fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, content) in parts {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .expect("zip entry starts");
                writer.write_all(content.as_bytes()).expect("zip entry writes");
            }
            writer.finish().expect("zip finishes");
        }
        cursor.into_inner()
    }
}
