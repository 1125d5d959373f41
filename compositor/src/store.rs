use std::collections::{BTreeSet, HashMap};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::debug;

use crate::{
    error::{ComposeError, Result},
    geometry::{Canvas, max_intensity},
    vocabulary::{GLYPH_SIZE, Source, Vocabulary},
};

/// Supplies the raw glyphs of one symbol set.
///
/// Implementations return the images exactly as stored; the source's
/// [`Transform`](crate::vocabulary::Transform) is applied by the store.
pub trait SetLoader {
    fn load(&self, label: &str, source: Source) -> Result<Vec<Canvas>>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    sets: HashMap<String, Vec<Canvas>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, glyphs: Vec<Canvas>) {
        self.sets.insert(label.into(), glyphs);
    }

    pub fn with_set(mut self, label: impl Into<String>, glyphs: Vec<Canvas>) -> Self {
        self.insert(label, glyphs);
        self
    }
}

impl SetLoader for MemoryLoader {
    fn load(&self, label: &str, _source: Source) -> Result<Vec<Canvas>> {
        self.sets
            .get(label)
            .cloned()
            .ok_or_else(|| ComposeError::Load {
                label: label.to_string(),
                reason: "no glyphs registered".to_string(),
            })
    }
}

/// Interchangeable handwriting samples of one label.
#[derive(Clone, Debug)]
pub struct BitmapSet {
    source: Source,
    glyphs: Vec<Canvas>,
}

impl BitmapSet {
    fn from_raw(label: &str, source: Source, mut glyphs: Vec<Canvas>) -> Result<Self> {
        if let Some(bad) = glyphs
            .iter()
            .find(|g| g.dimensions() != (GLYPH_SIZE, GLYPH_SIZE))
        {
            let (w, h) = bad.dimensions();
            return Err(ComposeError::Load {
                label: label.to_string(),
                reason: format!("glyph is {w}x{h}, expected {GLYPH_SIZE}x{GLYPH_SIZE}"),
            });
        }

        let transform = source.transform();
        if transform.normalize {
            // one maximum for the whole set, not per glyph
            let max = glyphs.iter().map(max_intensity).fold(0.0, f32::max);
            if max > 0.0 {
                glyphs
                    .iter_mut()
                    .flat_map(|g| g.pixels_mut())
                    .for_each(|p| p[0] /= max);
            }
        }
        if transform.invert {
            glyphs
                .iter_mut()
                .flat_map(|g| g.pixels_mut())
                .for_each(|p| p[0] = 1.0 - p[0]);
        }

        Ok(Self { source, glyphs })
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[Canvas] {
        &self.glyphs
    }
}

/// Cache of symbol sets keyed by label, with random glyph sampling.
///
/// Not synchronized: hosts that share one store between threads must wrap
/// it in their own lock.
pub struct SymbolStore {
    vocabulary: Vocabulary,
    loader: Box<dyn SetLoader>,
    loaded: HashMap<String, BitmapSet>,
    rng: SmallRng,
}

impl SymbolStore {
    pub fn new(vocabulary: Vocabulary, loader: impl SetLoader + 'static) -> Self {
        Self::with_rng(vocabulary, loader, SmallRng::from_os_rng())
    }

    pub fn with_seed(vocabulary: Vocabulary, loader: impl SetLoader + 'static, seed: u64) -> Self {
        Self::with_rng(vocabulary, loader, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(vocabulary: Vocabulary, loader: impl SetLoader + 'static, rng: SmallRng) -> Self {
        Self {
            vocabulary,
            loader: Box::new(loader),
            loaded: HashMap::new(),
            rng,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Loads the whole set for `label`, replacing any cached copy.
    pub fn load_set(&mut self, label: &str) -> Result<&BitmapSet> {
        let source = self
            .vocabulary
            .resolve(label)
            .ok_or_else(|| ComposeError::UnknownSymbol(label.to_string()))?;
        let raw = self.loader.load(label, source)?;
        let set = BitmapSet::from_raw(label, source, raw)?;
        debug!(label, ?source, glyphs = set.len(), "loaded symbol set");

        self.loaded.insert(label.to_string(), set);
        Ok(&self.loaded[label])
    }

    pub fn sample(&mut self, label: &str) -> Result<Canvas> {
        if !self.loaded.contains_key(label) {
            self.load_set(label)?;
        }
        let set = &self.loaded[label];
        if set.is_empty() {
            return Err(ComposeError::EmptySet(label.to_string()));
        }
        let index = self.rng.random_range(0..set.len());
        Ok(set.glyphs[index].clone())
    }

    pub fn loaded_symbols(&self) -> BTreeSet<String> {
        self.loaded.keys().cloned().collect()
    }

    pub fn evict(&mut self, label: &str) -> Result<()> {
        match self.loaded.remove(label) {
            Some(_) => {
                debug!(label, "evicted symbol set");
                Ok(())
            }
            None => Err(ComposeError::NotLoaded(label.to_string())),
        }
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingLoader, block, raw_glyph, synthetic_store};
    use image::ImageBuffer;

    #[test]
    fn sample_draws_members_of_the_cached_set() {
        let mut store = synthetic_store(7);
        let set = store.load_set("4").unwrap().glyphs().to_vec();
        for _ in 0..20 {
            let g = store.sample("4").unwrap();
            assert_eq!(g.dimensions(), (GLYPH_SIZE, GLYPH_SIZE));
            assert!(set.contains(&g));
        }
    }

    #[test]
    fn sample_populates_the_cache_once() {
        let (loader, calls) = CountingLoader::new();
        let mut store = SymbolStore::with_seed(Vocabulary::default(), loader, 1);
        for _ in 0..5 {
            store.sample("x").unwrap();
        }
        store.sample("y").unwrap();
        assert_eq!(calls.get(), 2);
        let expected: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        assert_eq!(store.loaded_symbols(), expected);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let mut store = synthetic_store(0);
        assert_eq!(
            store.load_set("unicorn").unwrap_err(),
            ComposeError::UnknownSymbol("unicorn".to_string())
        );
        assert!(store.sample("unicorn").is_err());
        assert!(store.loaded_symbols().is_empty());
    }

    #[test]
    fn evict_removes_and_rejects_absent_labels() {
        let mut store = synthetic_store(0);
        store.sample("7").unwrap();
        store.sample("(").unwrap();
        store.evict("7").unwrap();
        assert!(!store.loaded_symbols().contains("7"));
        assert!(store.loaded_symbols().contains("("));
        assert_eq!(
            store.evict("7").unwrap_err(),
            ComposeError::NotLoaded("7".to_string())
        );
        store.clear();
        assert!(store.loaded_symbols().is_empty());
    }

    #[test]
    fn crohme_plain_sets_are_normalized_and_inverted() {
        let mut store = synthetic_store(0);
        let set = store.load_set("times").unwrap();
        assert_eq!(set.source(), Source::CrohmePlain);
        let g = &set.glyphs()[0];
        // raw is dark ink on a white 255 background
        assert_eq!(g.get_pixel(0, 0)[0], 0.0);
        assert_eq!(g.get_pixel(22, 22)[0], 1.0);
    }

    #[test]
    fn crohme_fat_sets_are_only_normalized() {
        let mut store = synthetic_store(0);
        let set = store.load_set("+").unwrap();
        assert_eq!(set.source(), Source::CrohmeFat);
        let g = &set.glyphs()[0];
        assert_eq!(g.get_pixel(0, 0)[0], 0.0);
        assert_eq!(g.get_pixel(22, 22)[0], 1.0);
    }

    #[test]
    fn wrong_glyph_size_fails_to_load() {
        let loader = MemoryLoader::new().with_set("a", vec![block(44, 45, 1, 1, 5, 5)]);
        let mut store = SymbolStore::with_seed(Vocabulary::default(), loader, 0);
        assert!(matches!(
            store.load_set("a"),
            Err(ComposeError::Load { .. })
        ));
    }

    #[test]
    fn empty_sets_cannot_be_sampled() {
        let loader = MemoryLoader::new().with_set("b", Vec::new());
        let mut store = SymbolStore::with_seed(Vocabulary::default(), loader, 0);
        assert_eq!(
            store.sample("b").unwrap_err(),
            ComposeError::EmptySet("b".to_string())
        );
    }

    #[test]
    fn reload_overwrites_the_cached_set() {
        let mut loader = MemoryLoader::new();
        loader.insert("c", vec![raw_glyph(Source::Emnist, 10, 10, 30, 30)]);
        let mut store = SymbolStore::with_seed(Vocabulary::default(), loader, 0);
        store.load_set("c").unwrap();
        let again = store.load_set("c").unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(store.loaded_symbols().len(), 1);
        let blank: Canvas = ImageBuffer::new(GLYPH_SIZE, GLYPH_SIZE);
        assert_ne!(store.sample("c").unwrap(), blank);
    }
}
