// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Containment fit of an image into the canvas.

/// Rectangle at which a source image is drawn inside the canvas.
///
/// `start_x`/`start_y` are the top-left corner in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitResult {
    pub width: f64,
    pub height: f64,
    pub start_x: f64,
    pub start_y: f64,
}

/// Scale the image to the largest size that keeps its aspect ratio and center it
/// on the axis with leftover space.
///
/// Images narrower than square fill the canvas height; everything else (square
/// included) fills the canvas width. Inputs are not validated: zero or non-finite
/// dimensions yield non-finite geometry.
pub fn fit(canvas_width: f64, canvas_height: f64, image_width: f64, image_height: f64) -> FitResult {
    let aspect_ratio = image_width / image_height;

    if aspect_ratio < 1.0 {
        let width = canvas_height * aspect_ratio;
        FitResult {
            width,
            height: canvas_height,
            start_x: (canvas_width - width) / 2.0,
            start_y: 0.0,
        }
    } else {
        let height = canvas_width / aspect_ratio;
        FitResult {
            width: canvas_width,
            height,
            start_x: 0.0,
            start_y: (canvas_height - height) / 2.0,
        }
    }
}
