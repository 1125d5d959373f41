use image::{ImageBuffer, Luma, imageops};
use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, Result};

/// Grayscale working image, intensities in `[0, 1]`, 0 is background.
pub type Canvas = ImageBuffer<Luma<f32>, Vec<f32>>;

pub const INK_THRESHOLD: f32 = 0.1;

/// Labelled inclusive pixel rectangle in the frame of one specific canvas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub label: String,
    pub xmin: i32,
    pub xmax: i32,
    pub ymin: i32,
    pub ymax: i32,
}

impl BoundingBox {
    pub fn new(label: impl Into<String>, xmin: i32, xmax: i32, ymin: i32, ymax: i32) -> Self {
        Self {
            label: label.into(),
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn covering(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(label, 0, width as i32 - 1, 0, height as i32 - 1)
    }

    pub fn width(&self) -> i32 {
        self.xmax - self.xmin + 1
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin + 1
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.xmin >= 0
            && self.ymin >= 0
            && self.xmin <= self.xmax
            && self.ymin <= self.ymax
            && self.xmax < width as i32
            && self.ymax < height as i32
    }
}

/// Inclusive rectangle enclosing every ink pixel of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InkExtent {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    inked: bool,
}

impl InkExtent {
    /// True when no pixel passed the threshold. The coordinates then hold the
    /// scan defaults (`top = height`, `bottom = 0`, `left = width`, `right = 0`).
    pub fn is_empty(&self) -> bool {
        !self.inked
    }
}

pub fn max_intensity(image: &Canvas) -> f32 {
    image.pixels().map(|p| p[0]).fold(0.0, f32::max)
}

/// Divides every pixel by the image maximum. All-zero images are left as is.
pub(crate) fn normalize_by_max(image: &mut Canvas) {
    let max = max_intensity(image);
    if max > 0.0 {
        image.pixels_mut().for_each(|p| p[0] /= max);
    }
}

pub fn translate_boxes(mut boxes: Vec<BoundingBox>, dx: i32, dy: i32) -> Vec<BoundingBox> {
    for b in boxes.iter_mut() {
        b.xmin += dx;
        b.xmax += dx;
        b.ymin += dy;
        b.ymax += dy;
    }
    boxes
}

/// Resamples `image` to `width x height` and rescales `boxes` into the new frame.
///
/// Box coordinates are mapped independently per axis as
/// `trunc(x / source_width * width)`, so a round trip may lose a pixel.
pub fn resize_with_boxes(
    image: &Canvas,
    width: u32,
    height: u32,
    mut boxes: Vec<BoundingBox>,
) -> Result<(Canvas, Vec<BoundingBox>)> {
    let (from_width, from_height) = image.dimensions();
    if width == 0 || height == 0 || from_width == 0 || from_height == 0 {
        return Err(ComposeError::DegenerateShape {
            from_width,
            from_height,
            width,
            height,
        });
    }

    let mut clamped = image.clone();
    clamped
        .pixels_mut()
        .for_each(|p| p[0] = p[0].clamp(0.0, 1.0));
    let mut resized = imageops::resize(&clamped, width, height, imageops::FilterType::Triangle);
    normalize_by_max(&mut resized);

    for b in boxes.iter_mut() {
        b.xmin = rescale(b.xmin, from_width, width);
        b.xmax = rescale(b.xmax, from_width, width);
        b.ymin = rescale(b.ymin, from_height, height);
        b.ymax = rescale(b.ymax, from_height, height);
    }

    Ok((resized, boxes))
}

pub fn resize(image: &Canvas, width: u32, height: u32) -> Result<Canvas> {
    resize_with_boxes(image, width, height, Vec::new()).map(|(img, _)| img)
}

fn rescale(v: i32, from: u32, to: u32) -> i32 {
    (v as f64 / from as f64 * to as f64) as i32
}

pub fn ink_extent(image: &Canvas) -> InkExtent {
    let (width, height) = image.dimensions();
    let mut extent = InkExtent {
        top: height,
        bottom: 0,
        left: width,
        right: 0,
        inked: false,
    };
    for (x, y, p) in image.enumerate_pixels() {
        if p[0] > INK_THRESHOLD {
            extent.top = extent.top.min(y);
            extent.bottom = extent.bottom.max(y);
            extent.left = extent.left.min(x);
            extent.right = extent.right.max(x);
            extent.inked = true;
        }
    }
    extent
}

/// Crops `image` to its ink and moves `boxes` into the cropped frame.
///
/// An image without ink yields a 0x0 canvas, and the boxes are shifted by
/// `(-width, -height)` of the input. Callers that care check
/// [`ink_extent`] first.
pub fn crop_to_ink(image: &Canvas, boxes: Vec<BoundingBox>) -> (Canvas, Vec<BoundingBox>) {
    let extent = ink_extent(image);
    let boxes = translate_boxes(boxes, -(extent.left as i32), -(extent.top as i32));

    let (width, height) = image.dimensions();
    let crop_w = (extent.right + 1).min(width).saturating_sub(extent.left);
    let crop_h = (extent.bottom + 1).min(height).saturating_sub(extent.top);
    let cropped = ImageBuffer::from_fn(crop_w, crop_h, |x, y| {
        *image.get_pixel(extent.left + x, extent.top + y)
    });
    (cropped, boxes)
}

pub fn crop_glyph(image: &Canvas) -> Canvas {
    crop_to_ink(image, Vec::new()).0
}

/// Thickens strokes by spreading every pixel over a disc of `radius`.
///
/// The canvas grows by `radius` on every side and the boxes move with it.
pub fn fatten(
    image: &Canvas,
    radius: u32,
    boxes: Vec<BoundingBox>,
) -> (Canvas, Vec<BoundingBox>) {
    if radius == 0 {
        return (image.clone(), boxes);
    }
    let (width, height) = image.dimensions();
    let r = radius as i64;
    let mut bigger: Canvas = ImageBuffer::new(width + 2 * radius, height + 2 * radius);

    for (x, y, p) in image.enumerate_pixels() {
        let v = p[0];
        if v == 0.0 {
            continue;
        }
        let (x, y) = (x as i64, y as i64);
        for i in (x - r)..=(x + r) {
            for j in (y - r)..=(y + r) {
                let d = (((i - x).pow(2) + (j - y).pow(2)) as f64).sqrt();
                if d > r as f64 {
                    continue;
                }
                let fan = (std::f64::consts::FRAC_PI_2 * d / r as f64).cos() as f32 * v;
                bigger.get_pixel_mut((i + r) as u32, (j + r) as u32)[0] += fan.abs();
            }
        }
    }
    bigger
        .pixels_mut()
        .for_each(|p| p[0] = p[0].clamp(0.0, 1.0));

    (bigger, translate_boxes(boxes, radius as i32, radius as i32))
}
