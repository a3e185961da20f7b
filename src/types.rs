//! Core types shared by the evaluator, the engine, and the history.

use core::fmt;

use crate::parameter::CalibrationVector;

/// The two objective values of one evaluation. Both are minimized.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objectives {
    /// Combined mean percent error against the reference.
    pub error: f64,
    /// Runtime cost proxy.
    pub runtime_cost: f64,
}

impl Objectives {
    /// Creates an objective pair.
    #[must_use]
    pub const fn new(error: f64, runtime_cost: f64) -> Self {
        Self {
            error,
            runtime_cost,
        }
    }

    /// Returns `true` if both values are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.error.is_finite() && self.runtime_cost.is_finite()
    }

    /// The values as `[error, runtime_cost]`.
    #[must_use]
    pub const fn to_array(self) -> [f64; 2] {
        [self.error, self.runtime_cost]
    }

    /// Returns `true` if `self` Pareto-dominates `other`.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        crate::pareto::dominates(&self.to_array(), &other.to_array())
    }
}

/// A calibration vector with its evaluated objectives.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// The evaluated parameters.
    pub vector: CalibrationVector,
    /// The objective values.
    pub objectives: Objectives,
}

impl Candidate {
    /// Pairs a vector with its objectives.
    #[must_use]
    pub const fn new(vector: CalibrationVector, objectives: Objectives) -> Self {
        Self { vector, objectives }
    }

    /// Returns `true` if both objective values are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.objectives.is_finite()
    }
}

/// Whether a recorded candidate took part in ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CandidateStatus {
    /// Finite objectives; eligible for ranking and selection.
    Ranked,
    /// Non-finite objective; kept for auditing only.
    Excluded,
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ranked => "ranked",
            Self::Excluded => "excluded",
        })
    }
}
