//! Error types for the scheduling engine and its I/O layer.
//!
//! Two enums model the two failure layers:
//!
//! - [`ScheduleError`] — failures inside the planning engine. Recoverable
//!   kinds (`InsufficientSamples`) prune a single placement and the search
//!   continues; `Infeasible` is the terminal outcome when no candidate
//!   survives; `ReservationConflict` indicates a caller bug (an event was
//!   inserted without pre-querying a free slot) and is surfaced as fatal.
//! - [`InputError`] — failures while reading the pipeline, resource
//!   catalog, or dry-run CSV files. Always fatal, reported before the
//!   engine starts.

use thiserror::Error;

/// Why a candidate schedule (or the whole search) became infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InfeasibleReason {
    /// Every surviving placement exceeded the deadline fraction.
    DeadlineExceeded,
    /// Every surviving placement exceeded the budget fraction.
    BudgetExceeded,
    /// A step had no resource with dry-run coverage and no forced
    /// deployment to bypass the gap.
    InsufficientSamples,
}

impl std::fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibleReason::DeadlineExceeded => write!(f, "deadline exceeded"),
            InfeasibleReason::BudgetExceeded => write!(f, "budget exceeded"),
            InfeasibleReason::InsufficientSamples => write!(f, "insufficient dry-run samples"),
        }
    }
}

/// Errors produced by the scheduling engine.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// No dry-run sample covers the (step, resource) pair, so no estimation
    /// can be derived for it.
    #[error("no dry-run sample for step '{step}' on resource '{resource}'")]
    InsufficientSamples { step: String, resource: String },

    /// An event was inserted at a position where the summed reservations
    /// exceed the resource capacity. Callers are expected to pre-query a
    /// free slot, so this indicates an internal bug.
    #[error(
        "reservation conflict for step '{step}' on resource '{resource}' at position {position}"
    )]
    ReservationConflict {
        step: String,
        resource: String,
        position: f64,
    },

    /// The search ended with no surviving candidate timeline.
    #[error("no feasible timeline: {reason}")]
    Infeasible { reason: InfeasibleReason },
}

/// Errors produced while loading input files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A row references a step name that the pipeline does not declare.
    #[error("'{path}' references unknown step '{name}'")]
    UnknownStep { path: String, name: String },

    /// A row references a resource name that the catalog does not declare.
    #[error("'{path}' references unknown resource '{name}'")]
    UnknownResource { path: String, name: String },

    /// A field value failed to parse or is out of range.
    #[error("invalid value '{value}' for {field} in '{path}'")]
    InvalidField {
        path: String,
        field: String,
        value: String,
    },
}
