// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tabular documents (CSV, XLSX) loaded into an in-memory string table. The
// first row is the header; it names the columns and is not counted as a row.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, instrument};
use wandelwerk_core::error::{EngineError, Result};

use super::ooxml::{self, Package, RELATIONSHIPS_NS, is};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FALLBACK_SHEET_PART: &str = "xl/worksheets/sheet1.xml";
/// Widest sheet Excel can address (column `XFD`).
const MAX_COLUMNS: usize = 16_384;

/// A header row plus data rows, every row exactly as wide as the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells.
    ///
    /// A row wider than the header is an error: its extra cells would have no
    /// column to belong to.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                if row.len() > width {
                    return Err(EngineError::DocumentError(format!(
                        "row {} has {} fields but the header has {}",
                        index + 1,
                        row.len(),
                        width
                    )));
                }
                row.resize(width, String::new());
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { headers, rows })
    }

    /// Read a headered CSV file.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::new(headers, rows)?;
        debug!(rows = table.row_count(), columns = table.column_count(), "CSV loaded");
        Ok(table)
    }

    /// Read the first worksheet of an XLSX workbook.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_xlsx(bytes: &[u8]) -> Result<Self> {
        let mut package = Package::open(bytes)?;
        let shared = shared_strings(&mut package)?;
        let sheet_part = first_sheet_part(&mut package)?;
        let xml = package.read_part(&sheet_part)?;
        let doc = ooxml::parse_xml(&xml, &sheet_part)?;

        let grid = sheet_cells(&doc, &shared)?;
        let width = grid
            .values()
            .filter_map(|cells| cells.keys().next_back())
            .max()
            .map_or(0, |&last| last + 1);

        let mut dense = grid.into_values().map(|cells| {
            let mut row = vec![String::new(); width];
            for (column, value) in cells {
                row[column] = value;
            }
            row
        });

        let headers = dense.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = dense.collect();

        let table = Self::new(headers, rows)?;
        debug!(
            sheet = %sheet_part,
            rows = table.row_count(),
            columns = table.column_count(),
            "Worksheet loaded"
        );
        Ok(table)
    }

    /// Number of data rows (the header is not counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Position of the column whose header is exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

fn csv_error(err: csv::Error) -> EngineError {
    EngineError::DocumentError(format!("malformed CSV: {}", err))
}

/// The shared string table; absent in workbooks without text cells.
fn shared_strings(package: &mut Package<'_>) -> Result<Vec<String>> {
    let Some(xml) = package.read_optional_part(SHARED_STRINGS_PART)? else {
        return Ok(Vec::new());
    };
    let doc = ooxml::parse_xml(&xml, SHARED_STRINGS_PART)?;

    Ok(doc
        .root_element()
        .children()
        .filter(|node| is(node, "si"))
        .map(|item| rich_text(&item))
        .collect())
}

/// Concatenated `<t>` runs, skipping phonetic guides.
fn rich_text(node: &roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| is(n, "t"))
        .filter(|n| !n.ancestors().any(|a| is(&a, "rPh")))
        .filter_map(|n| n.text())
        .collect()
}

/// Part name of the workbook's first sheet.
fn first_sheet_part(package: &mut Package<'_>) -> Result<String> {
    let Some(xml) = package.read_optional_part(WORKBOOK_PART)? else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };
    let doc = ooxml::parse_xml(&xml, WORKBOOK_PART)?;
    let rels = package.relationships(WORKBOOK_PART)?;

    Ok(doc
        .descendants()
        .find(|node| is(node, "sheet"))
        .and_then(|sheet| sheet.attribute((RELATIONSHIPS_NS, "id")))
        .and_then(|rel_id| rels.get(rel_id).cloned())
        .unwrap_or_else(|| FALLBACK_SHEET_PART.to_string()))
}

/// Non-empty cells keyed by row then column, both 0-based.
fn sheet_cells(
    doc: &roxmltree::Document<'_>,
    shared: &[String],
) -> Result<BTreeMap<usize, BTreeMap<usize, String>>> {
    let mut grid: BTreeMap<usize, BTreeMap<usize, String>> = BTreeMap::new();
    let mut next_row = 0usize;

    for row in doc.descendants().filter(|node| is(node, "row")) {
        let row_index = match row.attribute("r").and_then(|r| r.parse::<usize>().ok()) {
            Some(number) if number > 0 => number - 1,
            _ => next_row,
        };
        next_row = row_index + 1;

        let mut next_column = 0usize;
        let mut cells = HashMap::new();
        for cell in row.children().filter(|node| is(node, "c")) {
            let column = match cell.attribute("r") {
                Some(reference) => column_from_reference(reference)?,
                None => None,
            }
            .unwrap_or(next_column);
            if column >= MAX_COLUMNS {
                return Err(EngineError::DocumentError(format!(
                    "cell in row {} lies beyond column XFD",
                    row_index + 1
                )));
            }
            next_column = column + 1;

            if let Some(value) = cell_value(&cell, shared)? {
                cells.insert(column, value);
            }
        }

        if !cells.is_empty() {
            grid.entry(row_index).or_default().extend(cells);
        }
    }

    Ok(grid)
}

/// Display value of one `<c>` element, or `None` when it holds nothing.
fn cell_value(cell: &roxmltree::Node<'_, '_>, shared: &[String]) -> Result<Option<String>> {
    let raw = cell
        .children()
        .find(|node| is(node, "v"))
        .and_then(|v| v.text());

    let value = match cell.attribute("t") {
        Some("s") => match raw {
            Some(index) => {
                let index: usize = index.trim().parse().map_err(|_| {
                    EngineError::DocumentError(format!("bad shared string index '{}'", index))
                })?;
                Some(shared.get(index).cloned().ok_or_else(|| {
                    EngineError::DocumentError(format!("shared string {} does not exist", index))
                })?)
            }
            None => None,
        },
        Some("inlineStr") => cell
            .children()
            .find(|node| is(node, "is"))
            .map(|inline| rich_text(&inline)),
        Some("b") => raw.map(|v| (if v.trim() == "1" { "TRUE" } else { "FALSE" }).to_string()),
        _ => raw.map(str::to_string),
    };

    Ok(value.filter(|v| !v.is_empty()))
}

/// 0-based column of an `A1`-style reference (`"C7"` → 2), `None` when the
/// reference has no column letters.
fn column_from_reference(reference: &str) -> Result<Option<usize>> {
    let mut number = 0usize;
    let mut seen = false;
    for letter in reference.bytes().take_while(u8::is_ascii_alphabetic) {
        seen = true;
        number = number
            .checked_mul(26)
            .and_then(|n| n.checked_add((letter.to_ascii_uppercase() - b'A' + 1) as usize))
            .filter(|&n| n <= MAX_COLUMNS)
            .ok_or_else(|| {
                EngineError::DocumentError(format!(
                    "cell reference '{}' lies beyond column XFD",
                    reference
                ))
            })?;
    }
    Ok(seen.then(|| number - 1))
}
