/// Result type for rule, codec and engine operations.
pub type Result<T> = std::result::Result<T, LifeError>;

/// Errors produced while parsing rules, decoding patterns or installing boards.
#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    /// Malformed B/S rule string, or a neighbor count outside 0..=8.
    #[error("invalid rule format: {0}")]
    InvalidRuleFormat(String),

    /// The RLE header line does not match `x = <int>, y = <int>[, rule = <rule>]`.
    #[error("invalid header format: {0}")]
    InvalidHeaderFormat(String),

    /// A run-length count could not be read as an integer.
    #[error("invalid numeric token: {0}")]
    InvalidNumericToken(String),

    /// Decoded cells would land outside the target grid.
    #[error("pattern exceeds {size}x{size} grid at x = {x}, y = {y}")]
    PatternExceedsBounds { x: usize, y: usize, size: usize },

    /// Grid side must be positive.
    #[error("invalid grid size: {0}")]
    InvalidSize(usize),

    /// A board of the wrong dimension was handed to an engine.
    #[error("grid size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
