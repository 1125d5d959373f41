use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const GLYPH_SIZE: u32 = 45;

pub const EMNIST_SYMBOLS: &[&str] = &[
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e", "f", "g", "h", "i",
    "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
];

pub const CROHME_SYMBOLS: &[&str] = &[
    "0", "8", "cos", "forward_slash", ",", "+", "lambda", "mu", "prime", "sum", "x", "1", "9",
    "Delta", "gamma", "!", "i", "ldots", "neq", "q", "tan", "y", "2", "A", "d", "geq", "(",
    "infty", "leq", "N", "R", "theta", "z", "3", "alpha", "div", "G", ")", "in", "l", "o",
    "rightarrow", "T", "4", "ascii_124", "e", "gt", "[", "int", "lim", "phi", "S", "times", "5",
    "beta", "exists", "H", "]", "log", "p", "sigma", "u", "6", "b", "f", "=", "{", "j", "lt",
    "pi", "sin", "v", "7", "C", "forall", "-", "}", "k", "M", "pm", "sqrt", "w",
];

/// CROHME symbols whose sets are stored with pre-thickened strokes.
pub const FATTENED_SYMBOLS: &[&str] = &["-", "(", ")", "+"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Emnist,
    CrohmeFat,
    CrohmePlain,
}

/// Post-load pixel transform of a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    pub normalize: bool,
    pub invert: bool,
}

impl Source {
    pub const fn transform(self) -> Transform {
        match self {
            Source::Emnist => Transform {
                normalize: false,
                invert: false,
            },
            Source::CrohmeFat => Transform {
                normalize: true,
                invert: false,
            },
            Source::CrohmePlain => Transform {
                normalize: true,
                invert: true,
            },
        }
    }

    pub const fn dataset(self) -> &'static str {
        match self {
            Source::Emnist => "emnist",
            Source::CrohmeFat | Source::CrohmePlain => "crohme",
        }
    }

    pub fn file_stem(self, label: &str) -> String {
        match self {
            Source::CrohmeFat => format!("{label}_fat"),
            Source::Emnist | Source::CrohmePlain => label.to_string(),
        }
    }
}

/// Lookup table from symbol label to its backing source.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    table: HashMap<String, Source>,
}

impl Vocabulary {
    /// Builds the table. EMNIST wins for labels present in both datasets.
    pub fn new<'a>(
        emnist: impl IntoIterator<Item = &'a str>,
        crohme: impl IntoIterator<Item = &'a str>,
        fattened: &[&str],
    ) -> Self {
        let mut table = HashMap::new();
        for label in crohme {
            let source = if fattened.contains(&label) {
                Source::CrohmeFat
            } else {
                Source::CrohmePlain
            };
            table.insert(label.to_string(), source);
        }
        for label in emnist {
            table.insert(label.to_string(), Source::Emnist);
        }
        Self { table }
    }

    pub fn resolve(&self, label: &str) -> Option<Source> {
        self.table.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.table.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(
            EMNIST_SYMBOLS.iter().copied(),
            CROHME_SYMBOLS.iter().copied(),
            FATTENED_SYMBOLS,
        )
    }
}
