//! The [`Objective`] trait defines what gets optimized.
//!
//! [`CalibrationObjective`] is the concrete evaluator: it runs the
//! coarse-grained model over an [`EvaluationBatch`] and reports the
//! combined percent error and the runtime proxy.
//!
//! ```
//! use std::sync::Arc;
//!
//! use cg_calibrate::prelude::*;
//!
//! let batch = EvaluationBatch::from_ground_truth(sample_design(20, 42)).unwrap();
//! let objective = CalibrationObjective::new(Arc::new(batch));
//!
//! let scores = objective.evaluate(&CalibrationVector::identity());
//! assert!(scores.error > 0.0);
//! assert!((scores.runtime_cost - 10.0).abs() < 1e-12);
//! ```
//!
//! Plain closures also implement [`Objective`], which is handy for
//! synthetic problems in tests:
//!
//! ```
//! use cg_calibrate::prelude::*;
//!
//! let objective = |v: &CalibrationVector| Objectives::new(v.s1, 1.0 / v.c_scale);
//! let scores = objective.evaluate(&CalibrationVector::identity());
//! assert_eq!(scores.to_array(), [1.0, 1.0]);
//! ```
//!
//! Implement [`after_generation`](Objective::after_generation) on a struct
//! to stop a run early at a generation boundary.

use core::ops::ControlFlow;
use std::sync::Arc;

use crate::batch::EvaluationBatch;
use crate::history::History;
use crate::metrics::{ErrorWeights, mean_percent_error};
use crate::model::{self, ResponseSurface, RuntimeProxy};
use crate::parameter::CalibrationVector;
use crate::types::Objectives;

/// Scores calibration vectors.
///
/// Evaluation must be a pure function of the vector. A non-finite value is
/// not an error: the engine records the candidate as excluded and keeps
/// going.
///
/// # Thread safety
///
/// [`SearchEngine::run_parallel`](crate::SearchEngine::run_parallel)
/// additionally requires `Send + Sync + 'static`. The sequential
/// [`run`](crate::SearchEngine::run) has no such requirement.
pub trait Objective {
    /// Computes `(error, runtime_cost)` for `vector`.
    fn evaluate(&self, vector: &CalibrationVector) -> Objectives;

    /// Called after each generation has been recorded.
    ///
    /// Return `ControlFlow::Break(())` to end the run before the next
    /// generation is evaluated.
    ///
    /// Default: always continues.
    fn after_generation(&self, _generation: usize, _history: &History) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F> Objective for F
where
    F: Fn(&CalibrationVector) -> Objectives,
{
    fn evaluate(&self, vector: &CalibrationVector) -> Objectives {
        self(vector)
    }
}

/// Coarse-grained model error and runtime cost over a fixed batch.
#[derive(Clone, Debug)]
pub struct CalibrationObjective {
    batch: Arc<EvaluationBatch>,
    surface: ResponseSurface,
    runtime: RuntimeProxy,
    weights: ErrorWeights,
}

impl CalibrationObjective {
    /// Creates an evaluator with the default coarse-grained coefficients,
    /// runtime proxy, and equal error weights.
    #[must_use]
    pub fn new(batch: Arc<EvaluationBatch>) -> Self {
        Self {
            batch,
            surface: ResponseSurface::COARSE_GRAINED,
            runtime: RuntimeProxy::default(),
            weights: ErrorWeights::default(),
        }
    }

    /// Replaces the coarse-grained response coefficients.
    #[must_use]
    pub fn with_surface(mut self, surface: ResponseSurface) -> Self {
        self.surface = surface;
        self
    }

    /// Replaces the runtime proxy constants.
    #[must_use]
    pub fn with_runtime(mut self, runtime: RuntimeProxy) -> Self {
        self.runtime = runtime;
        self
    }

    /// Replaces the density / radius-of-gyration error weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ErrorWeights) -> Self {
        self.weights = weights;
        self
    }

    /// The shared evaluation batch.
    #[must_use]
    pub fn batch(&self) -> &EvaluationBatch {
        &self.batch
    }

    /// Combined mean percent error of the calibrated model.
    #[must_use]
    pub fn error(&self, theta: &CalibrationVector) -> f64 {
        let n = self.batch.len();
        let mut density_pred = Vec::with_capacity(n);
        let mut density_true = Vec::with_capacity(n);
        let mut rg_pred = Vec::with_capacity(n);
        let mut rg_true = Vec::with_capacity(n);

        for (row, target) in self.batch.iter() {
            let predicted = self.surface.predict(&model::cg_transform(row, theta));
            density_pred.push(predicted.density);
            density_true.push(target.density);
            rg_pred.push(predicted.radius_of_gyration);
            rg_true.push(target.radius_of_gyration);
        }

        self.weights.combine(
            mean_percent_error(&density_pred, &density_true),
            mean_percent_error(&rg_pred, &rg_true),
        )
    }

    /// Runtime cost proxy for `theta`.
    #[must_use]
    pub fn runtime_cost(&self, theta: &CalibrationVector) -> f64 {
        self.runtime.cost(theta)
    }
}

impl Objective for CalibrationObjective {
    fn evaluate(&self, vector: &CalibrationVector) -> Objectives {
        Objectives::new(self.error(vector), self.runtime_cost(vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::sample_design;
    use crate::parameter::CalibrationSpace;

    fn objective() -> CalibrationObjective {
        let batch = EvaluationBatch::from_ground_truth(sample_design(5, 42)).unwrap();
        CalibrationObjective::new(Arc::new(batch))
    }

    #[test]
    fn evaluation_is_deterministic() {
        let obj = objective();
        let v = CalibrationVector::new(0.9, 1.1, 1.2, 0.8, 0.1);
        assert_eq!(obj.evaluate(&v), obj.evaluate(&v));
    }

    #[test]
    fn in_bounds_vectors_give_valid_objectives() {
        let obj = objective();
        let space = CalibrationSpace::default();
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..200 {
            let scores = obj.evaluate(&space.sample(&mut rng));
            assert!(scores.is_finite());
            assert!(scores.error >= 0.0);
            assert!(scores.runtime_cost > 0.0);
        }
    }

    #[test]
    fn chain_scale_trades_cost() {
        let obj = objective();
        let cheap = obj.evaluate(&CalibrationVector::new(1.0, 1.0, 1.0, 2.0, 0.0));
        let costly = obj.evaluate(&CalibrationVector::new(1.0, 1.0, 1.0, 0.5, 0.0));
        assert!(cheap.runtime_cost < costly.runtime_cost);
    }

    #[test]
    fn reference_surface_has_zero_error_at_identity() {
        let obj = objective().with_surface(ResponseSurface::GROUND_TRUTH);
        let scores = obj.evaluate(&CalibrationVector::identity());
        assert!(scores.error < 1e-5, "error = {}", scores.error);
    }

    #[test]
    fn error_weights_are_applied() {
        let density_only = objective().with_weights(ErrorWeights {
            density: 1.0,
            radius_of_gyration: 0.0,
        });
        let rg_only = objective().with_weights(ErrorWeights {
            density: 0.0,
            radius_of_gyration: 1.0,
        });
        let v = CalibrationVector::identity();
        let combined = objective().error(&v);
        let avg = 0.5 * (density_only.error(&v) + rg_only.error(&v));
        assert!((combined - avg).abs() < 1e-9);
    }

    #[test]
    fn runtime_constants_are_tunable() {
        let obj = objective().with_runtime(RuntimeProxy {
            base: 1.0,
            penalty_weight: 0.0,
        });
        let cost = obj.runtime_cost(&CalibrationVector::new(1.4, 0.6, 1.0, 0.5, 0.0));
        assert!((cost - 2.0).abs() < 1e-12);
    }
}
