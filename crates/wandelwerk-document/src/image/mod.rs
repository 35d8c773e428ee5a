// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — fit raster images onto fixed-size pages.

pub mod paginator;

pub use paginator::{ImagePaginator, PageImage, Placement};
