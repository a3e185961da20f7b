#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Multi-objective calibration search for coarse-grained polymer models.
//!
//! A coarse-grained (CG) model predicts polymer properties much faster than
//! a full model, but only after its parameters are calibrated. This crate
//! searches a 5-dimensional calibration space with NSGA-II, trading off
//! prediction error against a runtime-cost proxy, and reports the Pareto
//! front of the best trade-offs together with a complete history of every
//! evaluated candidate.
//!
//! # Getting Started
//!
//! ```
//! use std::sync::Arc;
//!
//! use cg_calibrate::prelude::*;
//!
//! // Reference data: random formulations scored by the ground-truth model.
//! let batch = EvaluationBatch::from_ground_truth(sample_design(20, 42))?;
//! let objective = CalibrationObjective::new(Arc::new(batch));
//!
//! let config = SearchConfig::builder()
//!     .population_size(20)
//!     .generations(10)
//!     .seed(42)
//!     .build()?;
//!
//! let mut engine = SearchEngine::new(config, objective);
//! engine.run();
//!
//! for candidate in engine.pareto_front() {
//!     println!("{} -> {:?}", candidate.vector, candidate.objectives);
//! }
//! # Ok::<(), cg_calibrate::Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`CalibrationVector`](parameter::CalibrationVector) | One point of the search space: `s1`, `s2`, `s3`, `c_scale`, `sb`. |
//! | [`CalibrationSpace`](parameter::CalibrationSpace) | Per-component bounds; every evaluated vector lies inside them. |
//! | [`EvaluationBatch`](batch::EvaluationBatch) | Feature rows paired with reference responses. |
//! | [`Objective`] | Maps a vector to `(error, runtime_cost)`; [`CalibrationObjective`](objective::CalibrationObjective) is the built-in one. |
//! | [`SearchEngine`] | The NSGA-II generation loop. |
//! | [`History`] | Append-only record of every evaluation, with CSV export. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `async` | [`SearchEngine::run_parallel`] via tokio | off |
//! | `serde` | `Serialize`/`Deserialize` on public types, [`History::save`]/[`History::load`] | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at generation boundaries | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod batch;
pub mod design;
pub mod engine;
mod error;
pub mod history;
pub mod metrics;
pub mod model;
pub mod objective;
pub mod parameter;
pub mod pareto;
mod rng_util;
mod types;

pub use engine::SearchEngine;
pub use error::{Error, Result};
pub use history::History;
pub use objective::Objective;
pub use types::{Candidate, CandidateStatus, Objectives};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use cg_calibrate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::EvaluationBatch;
    pub use crate::design::{FeatureRow, sample_design};
    pub use crate::engine::{
        BlendDistribution, Budget, Mutation, SearchConfig, SearchConfigBuilder, SearchEngine,
    };
    pub use crate::error::{Error, Result};
    #[cfg(feature = "serde")]
    pub use crate::history::HistorySnapshot;
    pub use crate::history::{History, HistoryEntry, HistoryRecord};
    pub use crate::metrics::ErrorWeights;
    pub use crate::model::{Response, ResponseSurface, RuntimeProxy};
    pub use crate::objective::{CalibrationObjective, Objective};
    pub use crate::parameter::{CalibrationSpace, CalibrationVector, ParamBounds};
    pub use crate::types::{Candidate, CandidateStatus, Objectives};
}
