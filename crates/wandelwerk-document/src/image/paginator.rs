// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image paginator — scale each image to fit a fixed canvas, preserving aspect
// ratio, and centre it on a white page. Uses the `image` crate.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use tracing::{debug, info, instrument};
use wandelwerk_core::Canvas;
use wandelwerk_core::error::{EngineError, Result};

/// Where a scaled image sits on its canvas, in canvas units (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Fit an `image_w` x `image_h` image into `canvas`.
    ///
    /// Images relatively wider than the canvas are scaled to the canvas width,
    /// all others to the canvas height. The free axis is centred. Fractional
    /// sizes truncate, and never drop below one unit.
    pub fn fit(image_w: u32, image_h: u32, canvas: Canvas) -> Self {
        let ratio = image_w as f64 / image_h as f64;

        let (width, height) = if ratio > canvas.aspect_ratio() {
            let height = (canvas.width as f64 / ratio) as u32;
            (canvas.width, height.clamp(1, canvas.height))
        } else {
            let width = (canvas.height as f64 * ratio) as u32;
            (width.clamp(1, canvas.width), canvas.height)
        };

        Self {
            x: (canvas.width - width) / 2,
            y: (canvas.height - height) / 2,
            width,
            height,
        }
    }
}

/// A finished page: an RGB raster exactly the size of its canvas.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub canvas: Canvas,
    /// Rectangle occupied by the source image.
    pub placement: Placement,
    pub raster: RgbImage,
}

/// Lays out images one per page on a fixed-size canvas.
pub struct ImagePaginator {
    canvas: Canvas,
}

impl ImagePaginator {
    pub fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    /// Decode each encoded image (JPEG, PNG, ...) and paginate, preserving order.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn paginate_encoded(&self, images: &[&[u8]]) -> Result<Vec<PageImage>> {
        let decoded = images
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                image::load_from_memory(bytes).map_err(|err| {
                    EngineError::ImageError(format!(
                        "failed to decode image #{}: {}",
                        index + 1,
                        err
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.paginate(&decoded)
    }

    /// One page per image, in input order.
    pub fn paginate(&self, images: &[DynamicImage]) -> Result<Vec<PageImage>> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(EngineError::InvalidParameter(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }

        info!(
            images = images.len(),
            canvas_w = self.canvas.width,
            canvas_h = self.canvas.height,
            "Paginating images"
        );

        images.iter().map(|image| self.place(image)).collect()
    }

    /// Scale with Lanczos3 and composite onto a white canvas.
    fn place(&self, image: &DynamicImage) -> Result<PageImage> {
        let (image_w, image_h) = (image.width(), image.height());
        if image_w == 0 || image_h == 0 {
            return Err(EngineError::ImageError("image has no pixels".into()));
        }

        let placement = Placement::fit(image_w, image_h, self.canvas);
        let scaled = image
            .resize_exact(placement.width, placement.height, FilterType::Lanczos3)
            .to_rgba8();

        // Transparent regions show the white page rather than black.
        let mut page = RgbaImage::from_pixel(
            self.canvas.width,
            self.canvas.height,
            Rgba([255, 255, 255, 255]),
        );
        imageops::overlay(&mut page, &scaled, placement.x as i64, placement.y as i64);

        debug!(
            from_w = image_w,
            from_h = image_h,
            to_w = placement.width,
            to_h = placement.height,
            x = placement.x,
            y = placement.y,
            "Image placed"
        );

        Ok(PageImage {
            canvas: self.canvas,
            placement,
            raster: DynamicImage::ImageRgba8(page).to_rgb8(),
        })
    }
}
