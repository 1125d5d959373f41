pub mod compose;
pub mod config;
pub mod error;
pub mod geometry;
pub mod store;
pub mod vocabulary;

#[cfg(test)]
mod testing;

pub use compose::{Composite, Compositor};
pub use config::LayoutConfig;
pub use error::{ComposeError, Result};
pub use geometry::{BoundingBox, Canvas};
pub use store::{BitmapSet, MemoryLoader, SetLoader, SymbolStore};
pub use vocabulary::{Source, Vocabulary};
