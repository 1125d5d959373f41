use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("{0} is not a valid symbol")]
    UnknownSymbol(String),

    #[error("{0} is not loaded")]
    NotLoaded(String),

    #[error("cannot resize {from_width}x{from_height} to {width}x{height}")]
    DegenerateShape {
        from_width: u32,
        from_height: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to load symbol set {label}: {reason}")]
    Load { label: String, reason: String },

    #[error("symbol set {0} has no glyphs")]
    EmptySet(String),

    #[error("sampled glyph of {0} has no ink")]
    BlankGlyph(String),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
