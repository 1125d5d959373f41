use image::{ImageBuffer, imageops};
use tracing::trace;

use crate::{
    config::LayoutConfig,
    error::{ComposeError, Result},
    geometry::{
        BoundingBox, Canvas, crop_glyph, crop_to_ink, ink_extent, resize, resize_with_boxes,
        translate_boxes,
    },
    store::SymbolStore,
};

/// An image together with the boxes of every glyph placed on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    pub image: Canvas,
    pub boxes: Vec<BoundingBox>,
}

impl Composite {
    pub fn new(image: Canvas, boxes: Vec<BoundingBox>) -> Self {
        Self { image, boxes }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn boxes_fit(&self) -> bool {
        let (w, h) = self.image.dimensions();
        self.boxes.iter().all(|b| b.fits_within(w, h))
    }
}

struct Placement {
    part: Composite,
    left: u32,
    top: u32,
}

impl Placement {
    fn at(part: Composite, left: u32, top: u32) -> Self {
        Self { part, left, top }
    }
}

/// Pastes every part onto a zeroed canvas, collects the shifted boxes and
/// crops the result to its ink.
fn assemble(width: u32, height: u32, placements: Vec<Placement>) -> Composite {
    let mut canvas: Canvas = ImageBuffer::new(width, height);
    let mut boxes = Vec::new();
    for Placement { part, left, top } in placements {
        imageops::replace(&mut canvas, &part.image, left as i64, top as i64);
        boxes.extend(translate_boxes(part.boxes, left as i32, top as i32));
    }
    trace!(width, height, boxes = boxes.len(), "assembled canvas");

    let (image, boxes) = crop_to_ink(&canvas, boxes);
    Composite { image, boxes }
}

fn centered(outer: u32, inner: u32) -> u32 {
    (outer as f64 / 2.0 - inner as f64 / 2.0).max(0.0) as u32
}

/// Layout operators over glyphs sampled from a [`SymbolStore`].
///
/// Every operator consumes its input composites and returns a new one whose
/// image is cropped to its ink and whose boxes are expressed in that image's
/// frame, so outputs can be fed straight back in.
pub struct Compositor<'s> {
    store: &'s mut SymbolStore,
    layout: LayoutConfig,
}

impl<'s> Compositor<'s> {
    pub fn new(store: &'s mut SymbolStore) -> Self {
        Self::with_layout(store, LayoutConfig::default())
    }

    pub fn with_layout(store: &'s mut SymbolStore, layout: LayoutConfig) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn store_mut(&mut self) -> &mut SymbolStore {
        self.store
    }

    pub fn symbol(&mut self, label: &str) -> Result<Composite> {
        let glyph = self.inked_glyph(label)?;
        let b = BoundingBox::covering(label, glyph.width(), glyph.height());
        Ok(Composite::new(glyph, vec![b]))
    }

    fn inked_glyph(&mut self, label: &str) -> Result<Canvas> {
        let glyph = self.store.sample(label)?;
        if ink_extent(&glyph).is_empty() {
            return Err(ComposeError::BlankGlyph(label.to_string()));
        }
        Ok(crop_glyph(&glyph))
    }

    pub fn digits(&mut self, number: i64, spacing: u32) -> Result<Composite> {
        if number < 0 {
            return Err(ComposeError::InvalidInput(format!(
                "cannot lay out the digits of negative number {number}"
            )));
        }

        let glyphs = number
            .to_string()
            .chars()
            .map(|d| self.symbol(&d.to_string()))
            .collect::<Result<Vec<_>>>()?;

        let count = glyphs.len() as u32;
        let row = glyphs
            .iter()
            .map(Composite::height)
            .fold(self.layout.row_height, u32::max);
        let width = self.layout.row_height * count + spacing * count;

        let mut left = 0;
        let mut placements = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            let (w, h) = glyph.image.dimensions();
            placements.push(Placement::at(glyph, left, centered(row, h)));
            left += w + spacing;
        }

        Ok(assemble(width.max(left), row, placements))
    }

    /// Characters of `text` side by side, folded left to right with [`Self::adjacent`].
    pub fn string(&mut self, text: &str, spacing: u32) -> Result<Composite> {
        let mut chars = text.chars();
        let first = chars
            .next()
            .ok_or_else(|| ComposeError::InvalidInput("cannot lay out an empty string".into()))?;

        let mut acc = self.symbol(&first.to_string())?;
        for c in chars {
            let next = self.symbol(&c.to_string())?;
            acc = self.adjacent(acc, next, spacing);
        }
        Ok(acc)
    }

    pub fn binary(
        &self,
        left: Composite,
        operator: Composite,
        right: Composite,
        spacing: u32,
    ) -> Composite {
        let height = [left.height(), operator.height(), right.height()]
            .into_iter()
            .fold(self.layout.operator_min_height, u32::max);
        let width = left.width() + operator.width() + right.width() + 2 * spacing;

        let op_left = left.width() + spacing;
        let right_left = op_left + operator.width() + spacing;
        let (left_top, op_top, right_top) = (
            centered(height, left.height()),
            centered(height, operator.height()),
            centered(height, right.height()),
        );
        assemble(
            width,
            height,
            vec![
                Placement::at(left, 0, left_top),
                Placement::at(operator, op_left, op_top),
                Placement::at(right, right_left, right_top),
            ],
        )
    }

    /// Implicit multiplication: `left` and `right` next to each other.
    pub fn adjacent(&self, left: Composite, right: Composite, spacing: u32) -> Composite {
        let height = left.height().max(right.height());
        let width = left.width() + right.width() + spacing;

        let left_top = centered(height, left.height());
        let right_top = centered(height, right.height());
        let right_left = left.width() + spacing;
        assemble(
            width,
            height,
            vec![
                Placement::at(left, 0, left_top),
                Placement::at(right, right_left, right_top),
            ],
        )
    }

    /// `base` raised to `exponent`.
    ///
    /// The exponent is scaled to `scale` times the base height (at least
    /// `min_exponent_height`) keeping its aspect ratio, and sits to the right
    /// of the base with its vertical center level with the base's top edge.
    /// The base rests on the bottom edge unless the exponent reaches lower.
    pub fn exponent(
        &self,
        base: Composite,
        exponent: Composite,
        scale: f64,
        spacing: u32,
    ) -> Result<Composite> {
        let (exp_w, exp_h) = exponent.image.dimensions();
        let scaled_h = self
            .layout
            .min_exponent_height
            .max((scale * base.height() as f64) as u32);
        let scaled_w = (scaled_h as f64 / exp_h as f64 * exp_w as f64) as u32;
        let (scaled, exp_boxes) =
            resize_with_boxes(&exponent.image, scaled_w, scaled_h, exponent.boxes)?;

        let head_room = (0.5 * scaled_h as f64 * self.layout.exponent_margin) as u32;
        let base_top = head_room;
        let exp_top = base_top.saturating_sub((0.5 * scaled_h as f64) as u32);
        // a short base leaves the exponent hanging below it
        let height = (base_top + base.height()).max(exp_top + scaled_h);
        let width = base.width() + spacing + scaled_w;
        let exp_left = base.width() + spacing;

        Ok(assemble(
            width,
            height,
            vec![
                Placement::at(base, 0, base_top),
                Placement::at(Composite::new(scaled, exp_boxes), exp_left, exp_top),
            ],
        ))
    }

    pub fn parenthesize(&mut self, inner: Composite, spacing: u32) -> Result<Composite> {
        let inner_h = inner.height();
        let open = self.paren("(", inner_h)?;
        let close = self.paren(")", inner_h)?;

        let height = ((inner_h as f64 * self.layout.paren_margin) as u32).max(inner_h);
        let width = inner.width() + 2 * spacing + open.width() + close.width();

        let inner_left = open.width() + spacing;
        let close_left = inner_left + inner.width() + spacing;
        let (open_top, inner_top, close_top) = (
            centered(height, open.height()),
            centered(height, inner_h),
            centered(height, close.height()),
        );
        Ok(assemble(
            width,
            height,
            vec![
                Placement::at(open, 0, open_top),
                Placement::at(inner, inner_left, inner_top),
                Placement::at(close, close_left, close_top),
            ],
        ))
    }

    fn paren(&mut self, label: &str, height: u32) -> Result<Composite> {
        let glyph = self.inked_glyph(label)?;
        let glyph = resize(&glyph, glyph.width(), height)?;
        let b = BoundingBox::covering(label, glyph.width(), glyph.height());
        Ok(Composite::new(glyph, vec![b]))
    }

    /// `numerator` over `denominator`, separated by a bar wider than both.
    pub fn fraction(
        &mut self,
        numerator: Composite,
        denominator: Composite,
        spacing: u32,
    ) -> Result<Composite> {
        let bar = self.inked_glyph("-")?;
        let width = numerator.width().max(denominator.width()) + self.layout.fraction_overhang;
        let bar = resize(&bar, width, bar.height())?;
        let bar_box = BoundingBox::covering("-", bar.width(), bar.height());
        let bar = Composite::new(bar, vec![bar_box]);

        let height = numerator.height() + 2 * spacing + bar.height() + denominator.height();
        let bar_top = numerator.height() + spacing;
        let denom_top = bar_top + bar.height() + spacing;

        let (num_left, bar_left, denom_left) = (
            centered(width, numerator.width()),
            centered(width, bar.width()),
            centered(width, denominator.width()),
        );
        Ok(assemble(
            width,
            height,
            vec![
                Placement::at(numerator, num_left, 0),
                Placement::at(bar, bar_left, bar_top),
                Placement::at(denominator, denom_left, denom_top),
            ],
        ))
    }
}
