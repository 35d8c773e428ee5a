// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contacts — turn name/phone tables into vCard 3.0 text.

pub mod vcard;

use tracing::{info, instrument};
use wandelwerk_core::Artifact;
use wandelwerk_core::error::{EngineError, Result};

use crate::extract::tabular::Table;

pub use vcard::{ContactRecord, ContactRow, VCardBatch, encode};

/// Header of the column holding display names.
pub const NAME_COLUMN: &str = "Name";
/// Header of the column holding phone numbers.
pub const PHONE_COLUMN: &str = "Phone";

/// Raw name/phone cells of every data row.
///
/// Fails with [`EngineError::MissingColumn`] naming each required header the
/// table lacks; individual bad rows are left for the encoder to skip.
pub fn contact_rows(table: &Table) -> Result<Vec<ContactRow>> {
    let name = table.column_index(NAME_COLUMN);
    let phone = table.column_index(PHONE_COLUMN);

    let (Some(name), Some(phone)) = (name, phone) else {
        let missing = [(NAME_COLUMN, name), (PHONE_COLUMN, phone)]
            .into_iter()
            .filter(|(_, index)| index.is_none())
            .map(|(column, _)| column.to_string())
            .collect();
        return Err(EngineError::MissingColumn(missing));
    };

    Ok(table
        .rows
        .iter()
        .map(|row| ContactRow {
            name: row.get(name).cloned(),
            phone: row.get(phone).cloned(),
        })
        .collect())
}

/// Read a headered CSV and encode its contacts.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn csv_to_vcards(bytes: &[u8]) -> Result<VCardBatch> {
    let table = Table::from_csv(bytes)?;
    let batch = encode(contact_rows(&table)?);
    info!(valid = batch.valid, skipped = batch.skipped, "Contacts converted");
    Ok(batch)
}

/// [`csv_to_vcards`] packaged as `contacts.vcf`, with the number of contacts written.
pub fn csv_to_vcard_artifact(bytes: &[u8]) -> Result<(Artifact, usize)> {
    let batch = csv_to_vcards(bytes)?;
    let valid = batch.valid;
    Ok((Artifact::vcard(batch.text), valid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_valid_rows_only() {
        let csv = b"Name,Phone\nAlice,123\n,456\nBob,nan\n  Carol  , 789 \n";
        let batch = csv_to_vcards(csv).unwrap();
        assert_eq!(batch.valid, 2);
        assert_eq!(batch.skipped, 2);
        assert!(batch.text.contains("FN:Alice\n"));
        assert!(batch.text.contains("FN:Carol\nTEL;TYPE=CELL:789\n"));
        assert!(!batch.text.contains("Bob"));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = b"Site,Phone,Name\nNorth,555,Dana\n";
        let batch = csv_to_vcards(csv).unwrap();
        assert_eq!(batch.valid, 1);
        assert!(batch.text.contains("FN:Dana\nTEL;TYPE=CELL:555\n"));
    }

    #[test]
    fn missing_phone_column_aborts() {
        let err = csv_to_vcards(b"Name,Mobile\nAlice,123\n").unwrap_err();
        match err {
            EngineError::MissingColumn(columns) => assert_eq!(columns, vec!["Phone"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn both_columns_missing_are_both_reported() {
        let err = csv_to_vcards(b"a,b\n1,2\n").unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn(ref c) if c.len() == 2));
    }

    #[test]
    fn column_names_are_case_sensitive() {
        assert!(matches!(
            csv_to_vcards(b"name,phone\nAlice,123\n"),
            Err(EngineError::MissingColumn(_))
        ));
    }

    #[test]
    fn artifact_is_vcard() {
        let (artifact, count) = csv_to_vcard_artifact(b"Name,Phone\nAlice,123\n").unwrap();
        assert_eq!(count, 1);
        assert_eq!(artifact.file_name, "contacts.vcf");
        assert_eq!(artifact.content_type, "text/vcard");
    }
}
