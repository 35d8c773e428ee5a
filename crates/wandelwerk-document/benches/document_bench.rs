// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the wandelwerk-document crate: image pagination
// onto an A4 canvas and page range parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use wandelwerk_core::Canvas;
use wandelwerk_document::{ImagePaginator, PageRange};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Paginate a 1200x900 synthetic photo onto A4. Lanczos3 resampling dominates.
fn bench_paginate(c: &mut Criterion) {
    let photo = DynamicImage::ImageRgb8(RgbImage::from_fn(1200, 900, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let paginator = ImagePaginator::new(Canvas::A4);

    c.bench_function("paginate (1200x900 -> A4)", |b| {
        b.iter(|| {
            let pages = paginator.paginate(black_box(std::slice::from_ref(&photo)));
            black_box(pages.expect("pagination succeeds"));
        });
    });
}

fn bench_page_range(c: &mut Criterion) {
    c.bench_function("page range parse (1-500 of 1000)", |b| {
        b.iter(|| black_box(PageRange::parse(black_box("1-500"), 1000)));
    });
}

criterion_group!(benches, bench_paginate, bench_page_range);
criterion_main!(benches);
