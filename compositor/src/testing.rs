//! Synthetic glyph sets for unit tests.

use std::{cell::Cell, rc::Rc};

use image::ImageBuffer;

use crate::{
    error::Result,
    geometry::Canvas,
    store::{MemoryLoader, SetLoader, SymbolStore},
    vocabulary::{GLYPH_SIZE, Source, Vocabulary},
};

/// `width x height` canvas with ones in the inclusive rectangle.
pub fn block(width: u32, height: u32, left: u32, top: u32, right: u32, bottom: u32) -> Canvas {
    ImageBuffer::from_fn(width, height, |x, y| {
        let inside = (left..=right).contains(&x) && (top..=bottom).contains(&y);
        image::Luma([if inside { 1.0 } else { 0.0 }])
    })
}

pub fn raw_glyph(source: Source, left: u32, top: u32, right: u32, bottom: u32) -> Canvas {
    let mut g = block(GLYPH_SIZE, GLYPH_SIZE, left, top, right, bottom);
    match source {
        Source::Emnist => {}
        Source::CrohmeFat => g.pixels_mut().for_each(|p| p[0] *= 255.0),
        Source::CrohmePlain => g.pixels_mut().for_each(|p| p[0] = (1.0 - p[0]) * 255.0),
    }
    g
}

fn raw_set(label: &str, source: Source) -> Vec<Canvas> {
    match label {
        "-" => vec![
            raw_glyph(source, 5, 20, 39, 24),
            raw_glyph(source, 8, 21, 36, 23),
        ],
        "(" | ")" => vec![
            raw_glyph(source, 18, 4, 26, 40),
            raw_glyph(source, 19, 6, 25, 38),
        ],
        _ => vec![
            raw_glyph(source, 10, 8, 34, 36),
            raw_glyph(source, 14, 12, 30, 33),
            raw_glyph(source, 8, 15, 36, 30),
            // crops to a 3 px high bar
            raw_glyph(source, 6, 21, 38, 23),
        ],
    }
}

/// Store holding synthetic sets for every label of the standard vocabulary.
pub fn synthetic_store(seed: u64) -> SymbolStore {
    let vocabulary = Vocabulary::default();
    let mut loader = MemoryLoader::new();
    for label in vocabulary.labels() {
        let source = vocabulary.resolve(label).unwrap();
        loader.insert(label, raw_set(label, source));
    }
    SymbolStore::with_seed(vocabulary, loader, seed)
}

pub struct CountingLoader {
    calls: Rc<Cell<usize>>,
}

impl CountingLoader {
    pub fn new() -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl SetLoader for CountingLoader {
    fn load(&self, label: &str, source: Source) -> Result<Vec<Canvas>> {
        self.calls.set(self.calls.get() + 1);
        Ok(raw_set(label, source))
    }
}
