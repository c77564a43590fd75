use thiserror::Error;

/// Malformed grid text. Line and column numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("grid is empty")]
    Empty,

    #[error("invalid digit {found:?} at line {line}, column {column}")]
    InvalidDigit {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Coordinate arithmetic escaped the grid. Indicates a bug, not bad input.
    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// The goal cannot be reached under the run-length policy.
    #[error("no path reaches the goal")]
    NoPathFound,

    /// The search gave up before proving either outcome.
    #[error("search budget of {limit} pops exceeded")]
    BudgetExceeded { limit: u64 },

    #[error("unknown variant {0:?}, expected \"classic\" or \"ultra\"")]
    UnknownVariant(String),
}
