#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a bound is non-finite or the lower bound is greater
    /// than the upper bound.
    #[error("invalid bounds for '{name}': low ({low}) must be finite and <= high ({high})")]
    InvalidBounds {
        /// The parameter the bounds belong to.
        name: &'static str,
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when an evaluation batch has no rows.
    #[error("evaluation batch must contain at least one row")]
    EmptyBatch,

    /// Returned when the number of rows and ground-truth targets differ.
    #[error("batch length mismatch: {rows} rows but {targets} targets")]
    BatchLengthMismatch {
        /// The number of feature rows.
        rows: usize,
        /// The number of ground-truth targets.
        targets: usize,
    },

    /// Returned when the population is too small to breed from.
    #[error("invalid population size: {0} (must be at least 2)")]
    InvalidPopulationSize(usize),

    /// Returned when the budget would not evaluate a single candidate.
    #[error("invalid budget: at least one generation or trial is required")]
    InvalidBudget,

    /// Returned when a probability lies outside `[0.0, 1.0]`.
    #[error("invalid probability for '{name}': {value} must be in [0.0, 1.0]")]
    InvalidProbability {
        /// The configuration option.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when a variation operator is configured with a
    /// non-finite or negative parameter.
    #[error("invalid operator configuration: {0}")]
    InvalidOperator(&'static str),

    /// Returned when a spawned evaluation task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),
}

pub type Result<T> = core::result::Result<T, Error>;
