// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Fixed-size drawing surface the meme is composed on.
//!
//! The canvas never changes size; images are scaled into it via [`fit`](crate::fit::fit).

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::fit::{FitResult, fit};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    pub fn fill_black(&mut self) {
        self.fill(BLACK);
    }

    fn fill(&mut self, color: Rgba<u8>) {
        for p in self.pixels.pixels_mut() {
            *p = color;
        }
    }

    /// Scale `image` to the fit rectangle and composite it at the fit offset.
    ///
    /// Returns false (and draws nothing) when the geometry is not finite, which only
    /// happens for degenerate image dimensions.
    pub fn draw_image(&mut self, image: &DynamicImage, rect: FitResult, filter: FilterType) -> bool {
        let finite = [rect.width, rect.height, rect.start_x, rect.start_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return false;
        }

        // Round both edges, not offset and size, so adjacent spans never leave a seam.
        let x = rect.start_x.round();
        let y = rect.start_y.round();
        let w = ((rect.start_x + rect.width).round() - x).max(1.0) as u32;
        let h = ((rect.start_y + rect.height).round() - y).max(1.0) as u32;
        let (x, y) = (x as i64, y as i64);

        let scaled = if (w, h) == (image.width(), image.height()) {
            image.to_rgba8()
        } else {
            image.resize_exact(w, h, filter).to_rgba8()
        };
        imageops::overlay(&mut self.pixels, &scaled, x, y);
        true
    }

    /// Image-load sequence: clear, paint black, draw the image letterboxed.
    pub fn letterbox(&mut self, image: &DynamicImage, filter: FilterType) -> FitResult {
        let rect = fit(
            f64::from(self.width()),
            f64::from(self.height()),
            f64::from(image.width()),
            f64::from(image.height()),
        );
        self.clear();
        self.fill_black();
        if !self.draw_image(image, rect, filter) {
            tracing::warn!(?rect, "skipping draw of image with degenerate geometry");
        }
        rect
    }

    /// Write the canvas to `path`; the format follows the file extension.
    ///
    /// JPEG has no alpha channel, so it is written from an RGB copy.
    pub fn save(&self, path: &Path) -> Result<()> {
        let image = match ImageFormat::from_path(path) {
            Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgb8(self.to_dynamic().to_rgb8()),
            _ => self.to_dynamic(),
        };
        image
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.pixels().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, RED))
    }

    fn is_reddish(p: &Rgba<u8>) -> bool {
        p[0] > 240 && p[1] < 16 && p[2] < 16 && p[3] == 255
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = Canvas::new(4, 3);
        assert_eq!((canvas.width(), canvas.height()), (4, 3));
        assert!(canvas.pixels().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_letterbox_wide_image_leaves_bands() {
        let mut canvas = Canvas::new(400, 400);
        let rect = canvas.letterbox(&solid(800, 400), FilterType::Triangle);
        assert_eq!(rect.start_y, 100.0);

        for y in [0, 50, 99, 300, 350, 399] {
            assert_eq!(*canvas.pixels().get_pixel(200, y), BLACK, "row {y}");
        }
        for y in [100, 150, 200, 299] {
            assert!(is_reddish(canvas.pixels().get_pixel(200, y)), "row {y}");
        }
    }

    #[test]
    fn test_letterbox_tall_image_leaves_side_bands() {
        let mut canvas = Canvas::new(400, 400);
        canvas.letterbox(&solid(100, 200), FilterType::Nearest);

        assert_eq!(*canvas.pixels().get_pixel(50, 200), BLACK);
        assert_eq!(*canvas.pixels().get_pixel(350, 200), BLACK);
        assert!(is_reddish(canvas.pixels().get_pixel(100, 200)));
        assert!(is_reddish(canvas.pixels().get_pixel(299, 200)));
    }

    #[test]
    fn test_letterbox_replaces_previous_content() {
        let mut canvas = Canvas::new(400, 400);
        canvas.letterbox(&solid(400, 400), FilterType::Nearest);
        assert!(is_reddish(canvas.pixels().get_pixel(0, 0)));

        canvas.letterbox(&solid(800, 400), FilterType::Nearest);
        assert_eq!(*canvas.pixels().get_pixel(0, 0), BLACK);
    }

    #[test]
    fn test_clear_after_draw() {
        let mut canvas = Canvas::new(40, 40);
        canvas.letterbox(&solid(10, 10), FilterType::Nearest);
        canvas.clear();
        assert!(canvas.pixels().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_draw_image_skips_non_finite_geometry() {
        let mut canvas = Canvas::new(40, 40);
        let rect = FitResult {
            width: 40.0,
            height: f64::NAN,
            start_x: 0.0,
            start_y: f64::NAN,
        };
        assert!(!canvas.draw_image(&solid(1, 1), rect, FilterType::Nearest));
        assert!(canvas.pixels().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_draw_image_fractional_offset_reaches_far_edge() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_black();
        let rect = FitResult {
            width: 9.4,
            height: 10.0,
            start_x: 0.4,
            start_y: 0.0,
        };
        assert!(canvas.draw_image(&solid(4, 4), rect, FilterType::Nearest));
        for x in 0..10 {
            assert!(is_reddish(canvas.pixels().get_pixel(x, 5)), "column {x}");
        }
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let mut canvas = Canvas::new(20, 10);
        canvas.fill_black();
        canvas.save(&path).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (20, 10));
    }

    #[test]
    fn test_save_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let mut canvas = Canvas::new(16, 16);
        canvas.letterbox(&solid(32, 16), FilterType::Nearest);
        canvas.save(&path).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (16, 16));
    }

    #[test]
    fn test_save_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = Canvas::new(2, 2);
        assert!(canvas.save(&dir.path().join("out.unknown")).is_err());
    }
}
