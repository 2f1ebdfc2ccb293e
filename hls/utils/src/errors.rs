//! Errors generated by the passes.
use thiserror::Error;

/// Convenience wrapper to represent success or meaningful error.
pub type HlsResult<T> = std::result::Result<T, Error>;

/// Failures that abort a synthesis run.
///
/// The first four variants are the failure modes of the passes themselves.
/// A pass that returns one of them has not committed any of its output.
#[derive(Error, Debug)]
pub enum Error {
    /// A schedulable operation type has no usable resource type.
    #[error("coverage failure: {0}")]
    Coverage(String),

    /// The design cannot be made to fit the area limit.
    #[error("area budget failure: {0}")]
    Budget(String),

    /// A dependency graph handed to a topological sort is not a DAG.
    #[error("cycle detected: {0}")]
    Cycle(String),

    /// The ILP solver did not return a usable solution.
    #[error("solver failure: {0}")]
    Solver(String),

    /// The input violates a structural requirement of the data model.
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Miscellaneous error message
    #[error("{0}")]
    Misc(String),
}

impl Error {
    pub fn coverage<S: ToString>(msg: S) -> Self {
        Self::Coverage(msg.to_string())
    }

    pub fn budget<S: ToString>(msg: S) -> Self {
        Self::Budget(msg.to_string())
    }

    pub fn cycle<S: ToString>(msg: S) -> Self {
        Self::Cycle(msg.to_string())
    }

    pub fn solver<S: ToString>(msg: S) -> Self {
        Self::Solver(msg.to_string())
    }

    pub fn malformed<S: ToString>(msg: S) -> Self {
        Self::Malformed(msg.to_string())
    }

    pub fn misc<S: ToString>(msg: S) -> Self {
        Self::Misc(msg.to_string())
    }

    /// Short name of the failure class, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Coverage(_) => "coverage",
            Error::Budget(_) => "budget",
            Error::Cycle(_) => "cycle",
            Error::Solver(_) => "solver",
            Error::Malformed(_) => "malformed",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Misc(_) => "misc",
        }
    }
}
