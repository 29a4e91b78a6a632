use std::fmt;

use thiserror::Error;

/// Which schema list a rejected identifier was checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    FluidLine,
    Stage,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::FluidLine => f.write_str("fluid line"),
            SelectionKind::Stage => f.write_str("stage"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown {kind}: {name:?}")]
    InvalidSelection { kind: SelectionKind, name: String },

    #[error("percentage {0} is outside 0..=100")]
    PercentageOutOfRange(f64),

    #[error("malformed progress data: {0}")]
    MalformedPersistedData(String),
}

impl ProgressError {
    pub(crate) fn unknown_line(name: &str) -> Self {
        ProgressError::InvalidSelection {
            kind: SelectionKind::FluidLine,
            name: name.to_string(),
        }
    }

    pub(crate) fn unknown_stage(name: &str) -> Self {
        ProgressError::InvalidSelection {
            kind: SelectionKind::Stage,
            name: name.to_string(),
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, ProgressError>;
