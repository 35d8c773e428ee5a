// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vCard 3.0 encoder.

use tracing::{debug, warn};

/// Cells read from one table row; either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRow {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl ContactRow {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            phone: Some(phone.into()),
        }
    }
}

/// A contact whose name and phone are both present after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    name: String,
    phone: String,
}

impl ContactRecord {
    /// Validate raw cells. Empty cells and the spreadsheet placeholder `nan`
    /// (any case) do not make a contact.
    pub fn from_row(row: &ContactRow) -> Option<Self> {
        Some(Self {
            name: usable_cell(row.name.as_deref())?,
            phone: usable_cell(row.phone.as_deref())?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Append this contact's vCard block to `out`.
    fn write_to(&self, out: &mut String) {
        out.push_str(&format!(
            "BEGIN:VCARD\nVERSION:3.0\nFN:{}\nTEL;TYPE=CELL:{}\nEND:VCARD\n",
            self.name, self.phone
        ));
    }
}

fn usable_cell(cell: Option<&str>) -> Option<String> {
    let trimmed = cell?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(trimmed.to_string())
}

/// Encoded vCards plus how many rows made it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCardBatch {
    /// Concatenated vCard blocks, LF line endings.
    pub text: String,
    pub valid: usize,
    pub skipped: usize,
}

/// Encode every valid row, in order, skipping and counting the rest.
pub fn encode(rows: impl IntoIterator<Item = ContactRow>) -> VCardBatch {
    let mut batch = VCardBatch::default();

    for (index, row) in rows.into_iter().enumerate() {
        match ContactRecord::from_row(&row) {
            Some(record) => {
                record.write_to(&mut batch.text);
                batch.valid += 1;
            }
            None => {
                debug!(row = index + 1, "Skipping contact row without usable name/phone");
                batch.skipped += 1;
            }
        }
    }

    if batch.valid == 0 && batch.skipped > 0 {
        warn!(skipped = batch.skipped, "No usable contacts found");
    }
    batch
}
