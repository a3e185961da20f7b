//! Percent-error metrics.

/// Added to the reference magnitude so near-zero targets do not blow up.
pub const PERCENT_EPSILON: f64 = 1e-9;

/// Percent error of one prediction against its reference value.
#[must_use]
pub fn percent_error(predicted: f64, truth: f64) -> f64 {
    100.0 * (predicted - truth).abs() / (truth.abs() + PERCENT_EPSILON)
}

/// Mean percent error over paired predictions and references.
///
/// Returns `NaN` for empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_percent_error(predicted: &[f64], truth: &[f64]) -> f64 {
    debug_assert_eq!(predicted.len(), truth.len());
    let n = predicted.len().min(truth.len());
    if n == 0 {
        return f64::NAN;
    }
    let total: f64 = predicted
        .iter()
        .zip(truth)
        .map(|(&p, &t)| percent_error(p, t))
        .sum();
    total / n as f64
}

/// Weights of the density and radius-of-gyration terms in the combined error.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorWeights {
    /// Weight of the density error.
    pub density: f64,
    /// Weight of the radius-of-gyration error.
    pub radius_of_gyration: f64,
}

impl Default for ErrorWeights {
    fn default() -> Self {
        Self {
            density: 0.5,
            radius_of_gyration: 0.5,
        }
    }
}

impl ErrorWeights {
    /// Weighted sum of the two mean percent errors.
    #[must_use]
    pub fn combine(&self, density_error: f64, rg_error: f64) -> f64 {
        self.density * density_error + self.radius_of_gyration * rg_error
    }
}
