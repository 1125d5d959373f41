use compositor::{
    BoundingBox, Composite,
    geometry::{resize_with_boxes, translate_boxes},
};
use image::{GrayImage, Luma, imageops};

/// Scales `composite` so its longest side is `size`, pastes it centered-left
/// into a `size x size` frame and quantizes it to 8 bits.
pub fn fit_to_frame(
    composite: &Composite,
    size: u32,
    white_background: bool,
) -> compositor::Result<(GrayImage, Vec<BoundingBox>)> {
    let (w, h) = composite.image.dimensions();
    let (new_w, new_h) = if h > w {
        ((size as u64 * w as u64 / h as u64).max(1) as u32, size)
    } else {
        (size, (size as u64 * h as u64 / w.max(1) as u64).max(1) as u32)
    };
    let (scaled, boxes) =
        resize_with_boxes(&composite.image, new_w, new_h, composite.boxes.clone())?;

    let top = (size - new_h) / 2;
    let to_gray = |v: f32| {
        let ink = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if white_background { 255 - ink } else { ink }
    };
    let scaled = GrayImage::from_fn(new_w, new_h, |x, y| Luma([to_gray(scaled.get_pixel(x, y)[0])]));

    let mut frame = GrayImage::from_pixel(size, size, Luma([to_gray(0.0)]));
    imageops::replace(&mut frame, &scaled, 0, top as i64);

    Ok((frame, translate_boxes(boxes, 0, top as i32)))
}
