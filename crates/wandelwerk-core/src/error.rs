// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Wandelwerk.

use thiserror::Error;

/// Top-level error type for all engine operations.
///
/// Every variant aborts the operation that raised it: no engine call ever
/// returns a partial artifact alongside an error.
#[derive(Debug, Error)]
pub enum EngineError {
    // -- Input validation --
    #[error("invalid page range: {0}")]
    InvalidRange(String),

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported file kind: {0}")]
    UnsupportedKind(String),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumn(Vec<String>),

    // -- PDF security --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("wrong password or document is not encrypted")]
    WrongPassword,

    #[error("document is password protected; unlock it first")]
    PasswordProtected,

    // -- Processing --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("document could not be read: {0}")]
    DocumentError(String),

    #[error("transcode failed: {reason}")]
    TranscodeFailed {
        reason: String,
        /// Trailing lines of the transcoder's diagnostic output.
        stderr: String,
    },

    // -- Environment --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Shorthand for a transcoder failure with no captured diagnostics.
    pub fn transcode(reason: impl Into<String>) -> Self {
        Self::TranscodeFailed {
            reason: reason.into(),
            stderr: String::new(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EngineError>;
