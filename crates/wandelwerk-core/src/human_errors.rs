// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the presentation shell.
//
// Every engine error is mapped to plain English with a clear suggestion. The
// engine itself never retries; `retriable` tells the shell whether asking the
// user again (e.g. for a password) can succeed.

use crate::error::EngineError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Temporary condition, the same request may work on a second attempt.
    Transient,
    /// The user must change an input (password, range, file).
    ActionRequired,
    /// The request cannot succeed as given.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether re-submitting with different input can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
        }
    }
}

/// Convert an [`EngineError`] into a [`HumanError`].
pub fn humanize_error(err: &EngineError) -> HumanError {
    match err {
        // -- Input validation --
        EngineError::InvalidRange(detail) => HumanError::new(
            "That page range doesn't work for this document.",
            format!("Use a single page like 3 or a range like 2-7 within the document. ({detail})"),
            true,
            Severity::ActionRequired,
        ),

        EngineError::PageOutOfRange { count, .. } => HumanError::new(
            "That page doesn't exist.",
            format!("Pick a page between 1 and {count}."),
            true,
            Severity::ActionRequired,
        ),

        EngineError::InvalidParameter(detail) => HumanError::new(
            "One of the settings isn't valid.",
            format!("Check the values and try again. ({detail})"),
            true,
            Severity::ActionRequired,
        ),

        EngineError::UnsupportedKind(detail) => HumanError::new(
            "This type of file isn't supported.",
            format!("Supported files are PDF, DOCX, PPTX, XLSX, CSV, TXT, MP4, MP3, WAV, JPG and PNG. ({detail})"),
            false,
            Severity::Permanent,
        ),

        EngineError::MissingColumn(columns) => HumanError::new(
            "The spreadsheet is missing required columns.",
            format!("Add a header row with these columns: {}.", columns.join(", ")),
            true,
            Severity::ActionRequired,
        ),

        // -- PDF security --
        EngineError::Encryption(_) => HumanError::new(
            "The PDF couldn't be locked.",
            "Choose a password that isn't empty and try again.",
            true,
            Severity::ActionRequired,
        ),

        EngineError::WrongPassword => HumanError::new(
            "Wrong password.",
            "Check the password and try again. The file may also not be locked at all.",
            true,
            Severity::ActionRequired,
        ),

        EngineError::PasswordProtected => HumanError::new(
            "This PDF is locked with a password.",
            "Unlock it with its password first, then try again.",
            true,
            Severity::ActionRequired,
        ),

        // -- Processing --
        EngineError::PdfError(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged. Try opening it in a PDF viewer first, or try a different file.",
            false,
            Severity::Permanent,
        ),

        EngineError::ImageError(_) => HumanError::new(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.",
            false,
            Severity::Permanent,
        ),

        EngineError::DocumentError(_) => HumanError::new(
            "This document couldn't be read.",
            "The file may be damaged or saved in an older format. Try re-saving it and upload again.",
            false,
            Severity::Permanent,
        ),

        EngineError::TranscodeFailed { reason, .. } => humanize_transcode_error(reason),

        // -- Environment --
        EngineError::Config(detail) => HumanError::new(
            "The tool isn't set up correctly.",
            format!("Check the engine configuration. ({detail})"),
            false,
            Severity::Permanent,
        ),

        EngineError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError::new(
                    "The file couldn't be found.",
                    "It may have been moved or deleted. Try choosing the file again.",
                    true,
                    Severity::ActionRequired,
                )
            } else {
                HumanError::new(
                    "There was a problem reading or writing a file.",
                    "Try again. If this keeps happening, the disk may be full.",
                    true,
                    Severity::Transient,
                )
            }
        }

        EngineError::Serialization(_) => HumanError::new(
            "The settings file couldn't be read.",
            "Check that the configuration file is valid JSON.",
            false,
            Severity::Permanent,
        ),
    }
}

fn humanize_transcode_error(reason: &str) -> HumanError {
    let lower = reason.to_ascii_lowercase();

    if lower.contains("timed out") {
        HumanError::new(
            "Processing the video took too long.",
            "Try a shorter or smaller video, or a faster speed setting.",
            true,
            Severity::Transient,
        )
    } else if lower.contains("failed to start") {
        HumanError::new(
            "The video tool isn't installed.",
            "Install ffmpeg or point the engine at it in the configuration.",
            false,
            Severity::Permanent,
        )
    } else {
        HumanError::new(
            "The video couldn't be processed.",
            "The file may be damaged, or the videos may use different formats. Try re-exporting them as MP4.",
            false,
            Severity::Permanent,
        )
    }
}
