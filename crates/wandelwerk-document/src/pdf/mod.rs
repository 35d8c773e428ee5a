// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page ranges, merging, extraction, password protection, and
// writing image pages.

pub mod assembler;
pub mod range;
pub mod reader;
pub mod security;
pub mod writer;

pub use assembler::PdfAssembler;
pub use range::PageRange;
pub use reader::PdfReader;
pub use writer::PdfWriter;

#[cfg(test)]
pub(crate) mod fixtures;
