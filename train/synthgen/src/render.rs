use std::path::Path;

use anyhow::Context;
use compositor::{BoundingBox, LayoutConfig};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenCfg {
    pub out_dir: String,    // "dataset"
    pub glyph_root: String, // <root>/emnist/<label>/*.png, <root>/crohme/<label>/*.png
    pub samples: u32,
    pub seed: u64,
    pub size: u32, // output frame is size x size
    pub max_depth: u32,
    pub max_number: i64,
    pub spacing: (u32, u32), // inclusive range
    pub exponent_scale: f64,
    pub fatten_radius: u32,     // 0 keeps strokes as sampled
    pub white_background: bool, // dark ink on white, like the rendered svgs
    pub previews: bool,         // also write images with the boxes drawn
    pub layout: LayoutConfig,
}

impl Default for GenCfg {
    fn default() -> Self {
        Self {
            out_dir: "dataset".to_string(),
            glyph_root: "assets/glyphs".to_string(),
            samples: 400,
            seed: 0,
            size: 224,
            max_depth: 3,
            max_number: 100,
            spacing: (2, 8),
            exponent_scale: 0.5,
            fatten_radius: 0,
            white_background: true,
            previews: false,
            layout: LayoutConfig::default(),
        }
    }
}

impl GenCfg {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Copy of `img` with every box outlined.
pub fn draw_preview(img: &GrayImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut preview = DynamicImage::ImageLuma8(img.clone()).to_rgb8();
    for b in boxes.iter().filter(|b| b.width() > 0 && b.height() > 0) {
        draw_hollow_rect_mut(
            &mut preview,
            Rect::at(b.xmin, b.ymin).of_size(b.width() as u32, b.height() as u32),
            Rgb([220, 30, 30]),
        );
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: GenCfg =
            serde_json::from_str(r#"{"samples": 3, "layout": {"paren_margin": 1.5}}"#).unwrap();
        assert_eq!(cfg.samples, 3);
        assert_eq!(cfg.size, 224);
        assert_eq!(cfg.layout.paren_margin, 1.5);
        assert_eq!(cfg.layout.fraction_overhang, 20);
    }

    #[test]
    fn preview_outlines_boxes() {
        let img = GrayImage::from_pixel(10, 10, image::Luma([255]));
        let preview = draw_preview(&img, &[BoundingBox::new("a", 2, 5, 3, 7)]);
        assert_eq!(preview.get_pixel(2, 3), &Rgb([220, 30, 30]));
        assert_eq!(preview.get_pixel(5, 7), &Rgb([220, 30, 30]));
        assert_eq!(preview.get_pixel(3, 5), &Rgb([255, 255, 255]));
    }
}
