// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — turn paginated raster pages into a PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};
use wandelwerk_core::error::{EngineError, Result};
use wandelwerk_core::{Artifact, Canvas};

use crate::image::paginator::{ImagePaginator, PageImage};

/// Canvas units are PDF points; placing rasters at 72 dpi maps one pixel to one point.
const POINTS_PER_INCH: f32 = 72.0;

/// Writes equally-sized raster pages into a multi-page PDF.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("Wandelwerk Images")
    }
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// One PDF page per raster page, in order. Each PDF page is exactly the
    /// size of its canvas and the raster covers it edge to edge.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn write_pages(&self, pages: &[PageImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(EngineError::InvalidParameter(
                "at least one image is required".into(),
            ));
        }

        info!(pages = pages.len(), title = %self.title, "Writing image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            let (width, height) = page.raster.dimensions();
            let raw = RawImage {
                pixels: RawImageData::U8(page.raster.as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(POINTS_PER_INCH),
                    rotate: None,
                },
            }];

            let (page_w, page_h) = canvas_mm(page.canvas);
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        debug!(
            output_bytes = output.len(),
            warnings = warnings.len(),
            "Image PDF serialised"
        );
        Ok(output)
    }
}

/// Decode, paginate onto `canvas`, and write the result as `images.pdf`.
pub fn images_to_pdf(images: &[&[u8]], canvas: Canvas) -> Result<Artifact> {
    let pages = ImagePaginator::new(canvas).paginate_encoded(images)?;
    let bytes = PdfWriter::default().write_pages(&pages)?;
    Ok(Artifact::pdf(bytes, "images.pdf"))
}

/// Canvas size converted from points to printpdf's millimetre units.
fn canvas_mm(canvas: Canvas) -> (Mm, Mm) {
    let to_mm = |points: u32| Mm(points as f32 * 25.4 / POINTS_PER_INCH);
    (to_mm(canvas.width), to_mm(canvas.height))
}
