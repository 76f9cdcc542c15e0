// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Caption rendering.
//!
//! Fonts are discovered through `fontdb` and rasterized with `ab_glyph`. Each caption is a
//! single line centered horizontally: the top line hangs from the top edge, the bottom line
//! sits on the bottom edge. Both are inset by a margin so glyphs are not clipped.

use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow};
use fontdb::{Database, Family, Query, Source};
use image::RgbaImage;

use crate::canvas::Canvas;

const FILL: [u8; 3] = [255, 255, 255];
const OUTLINE: [u8; 3] = [0, 0, 0];

/// Families tried, in order, after the configured one.
const FALLBACK_FAMILIES: &[&str] = &["Impact", "Anton", "DejaVu Sans", "Noto Sans"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionStyle {
    pub size: f32,
    pub margin: u32,
    pub outline: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            size: 40.0,
            margin: 8,
            outline: 2,
        }
    }
}

pub struct CaptionFont {
    font: FontArc,
}

impl CaptionFont {
    /// Load a font file directly, or search the system fonts for `family` and the fallbacks.
    pub fn load(family: Option<&str>, path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let data = fs::read(path)
                .with_context(|| format!("failed to read font at {}", path.display()))?;
            return Self::from_bytes(data);
        }

        let mut db = Database::new();
        db.load_system_fonts();

        let families = family
            .into_iter()
            .chain(FALLBACK_FAMILIES.iter().copied())
            .map(Family::Name)
            .chain(std::iter::once(Family::SansSerif));

        for family in families {
            if let Some(id) = db.query(&Query {
                families: &[family],
                ..Default::default()
            }) && let Some(font) = load_face(&db, id)?
            {
                tracing::debug!(face = ?id, "caption font selected");
                return Ok(Self { font });
            }
        }

        for face in db.faces() {
            if let Some(font) = load_face(&db, face.id)? {
                return Ok(Self { font });
            }
        }

        Err(anyhow!("no usable system font found for captions"))
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(data).context("failed to decode caption font")?;
        Ok(Self { font })
    }

    /// Advance width of `text` at `size` pixels, kerning included.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph);
            }
            width += scaled.h_advance(glyph);
            previous = Some(glyph);
        }
        width.max(0.0)
    }

    fn metrics(&self, size: f32) -> (f32, f32) {
        let scaled = self.font.as_scaled(PxScale::from(size));
        (scaled.ascent(), scaled.descent().abs())
    }
}

fn load_face(db: &Database, id: fontdb::ID) -> Result<Option<FontArc>> {
    let face = db.face(id).context("missing font face in database")?;
    let data = match &face.source {
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::File(path) => {
            fs::read(path).with_context(|| format!("failed to read font at {}", path.display()))?
        }
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };
    // Collections and exotic formats are skipped rather than treated as fatal.
    Ok(FontArc::try_from_vec(data).ok())
}

/// Baselines for the top and bottom captions on a canvas of `height` pixels.
pub fn baselines(height: u32, ascent: f32, descent: f32, margin: u32) -> (f32, f32) {
    let margin = margin as f32;
    (margin + ascent, height as f32 - margin - descent)
}

/// Left edge that centers a line of `text_width` on `canvas_width / 2`.
pub fn centered_left(canvas_width: u32, text_width: f32) -> f32 {
    canvas_width as f32 / 2.0 - text_width / 2.0
}

/// Draw both captions onto the canvas. Empty captions are skipped.
pub fn draw_captions(
    canvas: &mut Canvas,
    font: &CaptionFont,
    top: &str,
    bottom: &str,
    style: CaptionStyle,
) {
    let (ascent, descent) = font.metrics(style.size);
    let (top_baseline, bottom_baseline) =
        baselines(canvas.height(), ascent, descent, style.margin);

    for (text, baseline) in [(top, top_baseline), (bottom, bottom_baseline)] {
        let text = text.trim_end_matches(['\n', '\r']);
        if text.is_empty() {
            continue;
        }
        let left = centered_left(canvas.width(), font.measure(text, style.size));
        draw_outlined(canvas.pixels_mut(), font, text, left, baseline, style);
    }
}

fn draw_outlined(
    pixels: &mut RgbaImage,
    font: &CaptionFont,
    text: &str,
    left: f32,
    baseline: f32,
    style: CaptionStyle,
) {
    let r = style.outline as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx, dy) == (0, 0) || dx * dx + dy * dy > r * r {
                continue;
            }
            draw_text(
                pixels,
                font,
                text,
                left + dx as f32,
                baseline + dy as f32,
                style.size,
                OUTLINE,
            );
        }
    }
    draw_text(pixels, font, text, left, baseline, style.size, FILL);
}

fn draw_text(
    pixels: &mut RgbaImage,
    font: &CaptionFont,
    text: &str,
    left: f32,
    baseline: f32,
    size: f32,
    color: [u8; 3],
) {
    let scaled = font.font.as_scaled(PxScale::from(size));
    let mut cursor_x = left;
    let mut previous = None;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let glyph = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            cursor_x += scaled.kern(prev, glyph);
        }
        let advance = scaled.h_advance(glyph);
        let mut positioned = scaled.scaled_glyph(ch);
        positioned.position = point(cursor_x, baseline);
        if let Some(outline) = font.font.outline_glyph(positioned) {
            let bounds = outline.px_bounds();
            outline.draw(|x, y, coverage| {
                blend_pixel(
                    pixels,
                    bounds.min.x as i64 + i64::from(x),
                    bounds.min.y as i64 + i64::from(y),
                    color,
                    coverage,
                );
            });
        }
        cursor_x += advance;
        previous = Some(glyph);
    }
}

/// Source-over blend of a solid color with `coverage` as alpha. Out-of-bounds is clipped.
fn blend_pixel(pixels: &mut RgbaImage, x: i64, y: i64, color: [u8; 3], coverage: f32) {
    if x < 0 || y < 0 || x >= i64::from(pixels.width()) || y >= i64::from(pixels.height()) {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    if a == 0.0 {
        return;
    }
    let p = pixels.get_pixel_mut(x as u32, y as u32);
    let dst_a = f32::from(p[3]) / 255.0;
    let out_a = a + dst_a * (1.0 - a);
    // Straight (non-premultiplied) alpha: weight the destination color by its own alpha.
    for (c, &src) in color.iter().enumerate() {
        let blended = f32::from(src) * a + f32::from(p[c]) * dst_a * (1.0 - a);
        p[c] = (blended / out_a).round() as u8;
    }
    p[3] = (out_a * 255.0).round() as u8;
}
