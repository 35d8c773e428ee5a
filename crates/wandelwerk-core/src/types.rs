// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Wandelwerk transformation engine.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;

/// Unique identifier for a single transformation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Csv,
    Txt,
    Mp4,
    Mp3,
    Wav,
    Jpeg,
    Png,
}

impl SourceKind {
    /// MIME type string for this kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
            Self::Txt => "text/plain",
            Self::Mp4 => "video/mp4",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Infer the kind from a file extension (case-insensitive, no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            "mp4" => Some(Self::Mp4),
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Infer the kind from the last `.`-separated segment of a file name.
    pub fn from_file_name(name: &str) -> Result<Self, EngineError> {
        name.rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| EngineError::UnsupportedKind(name.to_string()))
    }

    /// Whether this kind is an audio or video container.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Mp4 | Self::Mp3 | Self::Wav)
    }

    /// Whether this kind is a raster image.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

/// An uploaded file: opaque bytes plus the kind the caller declared for it.
///
/// Owned by the single operation it is handed to and dropped afterwards.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(kind: SourceKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The single downloadable result of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `merged.pdf`.
    pub file_name: String,
    pub content_type: &'static str,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, content_type: &'static str) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type,
        }
    }

    pub fn pdf(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self::new(bytes, file_name, "application/pdf")
    }

    pub fn mp4(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self::new(bytes, file_name, "video/mp4")
    }

    pub fn vcard(text: String) -> Self {
        Self::new(text.into_bytes(), "contacts.vcf", "text/vcard")
    }
}

/// Fixed-size target page for image pagination, in canvas units (PDF points).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// A4 portrait at 72 units per inch.
    pub const A4: Canvas = Canvas {
        width: 595,
        height: 842,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::A4
    }
}

/// Encoder speed preset for video compression, ordered slowest to fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPreset {
    Medium,
    Fast,
    Faster,
    #[default]
    Ultrafast,
}

impl CompressionPreset {
    pub const ALL: [CompressionPreset; 4] = [
        CompressionPreset::Medium,
        CompressionPreset::Fast,
        CompressionPreset::Faster,
        CompressionPreset::Ultrafast,
    ];

    /// x264 `-preset` keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Fast => "fast",
            Self::Faster => "faster",
            Self::Ultrafast => "ultrafast",
        }
    }
}

impl FromStr for CompressionPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                EngineError::InvalidParameter(format!(
                    "unknown speed preset '{s}' (expected medium, fast, faster or ultrafast)"
                ))
            })
    }
}

impl std::fmt::Display for CompressionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
