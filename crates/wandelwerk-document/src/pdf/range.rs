// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page range expressions: `"3"` for a single page, `"2-7"` for an inclusive span.

use std::str::FromStr;

use wandelwerk_core::error::{EngineError, Result};

/// The syntactic form of a range expression, before it is checked against a
/// document's page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSpec {
    Single(u32),
    Span { start: u32, end: u32 },
}

impl FromStr for PageSpec {
    type Err = EngineError;

    fn from_str(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(EngineError::InvalidRange("range is empty".into()));
        }

        if !expr.contains('-') {
            return Ok(Self::Single(parse_endpoint(expr)?));
        }

        let parts: Vec<&str> = expr.split('-').collect();
        if parts.len() != 2 {
            return Err(EngineError::InvalidRange(format!(
                "'{expr}' must have exactly two endpoints"
            )));
        }

        let start = parse_endpoint(parts[0])?;
        let end = parse_endpoint(parts[1])?;
        if start > end {
            return Err(EngineError::InvalidRange(format!(
                "start page {start} is after end page {end}"
            )));
        }

        Ok(Self::Span { start, end })
    }
}

impl PageSpec {
    /// Check this selection against a document with `page_count` pages.
    pub fn resolve(self, page_count: u32) -> Result<PageRange> {
        let (start, end) = match self {
            Self::Single(page) => (page, page),
            Self::Span { start, end } => (start, end),
        };
        if end > page_count {
            return Err(EngineError::InvalidRange(format!(
                "page {end} exceeds document length of {page_count} pages"
            )));
        }
        Ok(PageRange {
            pages: (start..=end).collect(),
        })
    }
}

/// An ordered, duplicate-free list of 1-based page numbers, every one of which
/// exists in the document it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pages: Vec<u32>,
}

impl PageRange {
    /// Parse `expr` and validate it against `page_count`.
    pub fn parse(expr: &str, page_count: u32) -> Result<Self> {
        expr.parse::<PageSpec>()?.resolve(page_count)
    }

    /// 1-based page numbers in output order.
    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    /// 0-based page indices in output order.
    pub fn zero_based(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().map(|&page| page as usize - 1)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn parse_endpoint(token: &str) -> Result<u32> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidRange(format!(
            "'{token}' is not a page number"
        )));
    }
    let page: u32 = token
        .parse()
        .map_err(|_| EngineError::InvalidRange(format!("'{token}' is not a page number")))?;
    if page == 0 {
        return Err(EngineError::InvalidRange("pages are numbered from 1".into()));
    }
    Ok(page)
}
