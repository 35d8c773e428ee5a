// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password protection — AES-256 (PDF security handler revision 6) via lopdf's
// encryption support, with the file key drawn from `ring`'s system RNG.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use lopdf::encryption::crypt_filters::{Aes256CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::xref::XrefEntry;
use lopdf::{Document, ObjectId, Reader};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, instrument, warn};
use wandelwerk_core::error::{EngineError, Result};

use crate::pdf::reader::{self, PdfReader};

/// Name of the standard crypt filter used for both strings and streams.
const CRYPT_FILTER_NAME: &[u8] = b"StdCF";

/// Encrypt `document` in place so that `password` opens it (as both user and
/// owner password).
#[instrument(skip_all)]
pub(crate) fn lock(document: &mut Document, password: &str) -> Result<()> {
    let mut file_key = [0u8; 32];
    SystemRandom::new()
        .fill(&mut file_key)
        .map_err(|_| EngineError::Encryption("system random generator unavailable".into()))?;

    let crypt_filter: Arc<dyn CryptFilter> = Arc::new(Aes256CryptFilter);
    let version = EncryptionVersion::V5 {
        encrypt_metadata: true,
        crypt_filters: BTreeMap::from([(CRYPT_FILTER_NAME.to_vec(), crypt_filter)]),
        file_encryption_key: &file_key,
        stream_filter: CRYPT_FILTER_NAME.to_vec(),
        string_filter: CRYPT_FILTER_NAME.to_vec(),
        owner_password: password,
        user_password: password,
        permissions: Permissions::all(),
    };

    let state = EncryptionState::try_from(version)
        .map_err(|err| EngineError::Encryption(format!("invalid encryption settings: {}", err)))?;
    document
        .encrypt(&state)
        .map_err(|err| EngineError::Encryption(format!("failed to encrypt document: {}", err)))?;

    debug!("AES-256 encryption applied");
    Ok(())
}

/// Load `bytes` and unlock it with `password`.
///
/// A document that is not encrypted at all is treated the same as a wrong
/// password: the caller asked to unlock something that has no lock.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub(crate) fn unlock(bytes: &[u8], password: &str) -> Result<PdfReader> {
    let document = reader::load_document(bytes)?;

    if !document.is_encrypted() {
        warn!("Unlock requested for a document without encryption");
        return Err(EngineError::WrongPassword);
    }

    document.authenticate_password(password).map_err(|err| {
        debug!(%err, "Password rejected");
        EngineError::WrongPassword
    })?;

    // lopdf decrypts on load only when the user password is empty.
    if !reader::is_locked(&document) {
        return Ok(PdfReader::from_document(document));
    }

    let mut document = load_encrypted_objects(bytes, document);
    document.decrypt(password).map_err(|err| {
        EngineError::PdfError(format!("failed to decrypt document: {}", err))
    })?;

    debug!(objects = document.objects.len(), "Document decrypted");
    Ok(PdfReader::from_document(document))
}

/// Parse every in-use object of a locked document, still encrypted, into
/// `document` so that `Document::decrypt` has something to decrypt.
fn load_encrypted_objects(bytes: &[u8], document: Document) -> Document {
    let start = bytes.windows(5).position(|w| w == b"%PDF-").unwrap_or(0);
    let ids: Vec<ObjectId> = document
        .reference_table
        .entries
        .iter()
        .filter_map(|(&number, entry)| match *entry {
            XrefEntry::Normal { generation, .. } => Some((number, generation)),
            _ => None,
        })
        .filter(|id| !document.objects.contains_key(id))
        .collect();

    let pdf = Reader {
        buffer: &bytes[start..],
        document,
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };

    let mut objects = BTreeMap::new();
    for id in ids {
        match pdf.get_object(id, &mut HashSet::new()) {
            Ok(object) => {
                objects.insert(id, object);
            }
            Err(err) => warn!(?id, %err, "Skipping unreadable object"),
        }
    }

    let mut document = pdf.document;
    document.objects.extend(objects);
    document
}
