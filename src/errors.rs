//! Crate-wide error type.
//!
//! Recoverable anomalies (unknown identifiers, pairs without a common
//! subsumer) never reach this enum: they fall back to documented scores and are
//! only reported through `tracing`.

use crate::ontology::{EntityKind, IriError};
use crate::similarity::record::RecordError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The two entities cannot be compared directly.
    #[error("cannot compare a {left} with a {right}")]
    IncompatibleEntityKind { left: EntityKind, right: EntityKind },

    /// A cost handed to the assignment solver was negative or not finite.
    #[error("invalid assignment cost {value} at row {row}, column {col}")]
    AssignmentInputInvalid { row: usize, col: usize, value: f64 },

    /// The assignment solver ran out of jobs to grow its tree with.
    #[error("no augmenting path for assignment row {worker}")]
    AssignmentStalled { worker: usize },

    /// A similarity value was not a number in `[0, 1]`.
    #[error("similarity {value} is outside [0, 1]")]
    SimilarityOutOfRange { value: f64 },

    #[error(transparent)]
    Iri(#[from] IriError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot initialize logger: {0}")]
    Logger(String),
}

impl Error {
    pub(crate) fn incompatible(left: EntityKind, right: EntityKind) -> Self {
        Self::IncompatibleEntityKind { left, right }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
