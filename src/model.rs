//! Closed-form response surfaces for the reference and coarse-grained models.
//!
//! Both models share one functional form and differ only in coefficients:
//!
//! ```text
//! density = a + b·f1 + c·sin(k·L·100) + d·f2·κ + e·sin(g·f3)
//! rg      = h·√(L·100)·(1 + i·κ)·(1 + j·f3)
//! ```
//!
//! where `f1..f3` are monomer fractions, `L` the scaled chain length and
//! `κ` the stiffness. The coarse-grained coefficients are offset from the
//! reference ones, which leaves a calibration gap no parameter vector can
//! close.

use crate::design::FeatureRow;
use crate::parameter::CalibrationVector;

/// Added to the fraction sum before renormalizing.
pub const FRACTION_EPSILON: f64 = 1e-9;

/// Predicted (or reference) observables for one design row.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    /// Mass density.
    pub density: f64,
    /// Radius of gyration.
    pub radius_of_gyration: f64,
}

/// Coefficients of the shared density / radius-of-gyration form.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseSurface {
    /// Density offset `a`.
    pub density_base: f64,
    /// Weight `b` of fraction 1.
    pub density_f1: f64,
    /// Amplitude `c` of the chain-length oscillation.
    pub density_chain_amplitude: f64,
    /// Frequency `k` of the chain-length oscillation.
    pub density_chain_frequency: f64,
    /// Weight `d` of the fraction-2 × stiffness coupling.
    pub density_f2_stiffness: f64,
    /// Amplitude `e` of the fraction-3 oscillation.
    pub density_f3_amplitude: f64,
    /// Frequency `g` of the fraction-3 oscillation.
    pub density_f3_frequency: f64,
    /// Prefactor `h` of the radius of gyration.
    pub rg_prefactor: f64,
    /// Stiffness sensitivity `i` of the radius of gyration.
    pub rg_stiffness: f64,
    /// Fraction-3 sensitivity `j` of the radius of gyration.
    pub rg_f3: f64,
}

impl ResponseSurface {
    /// The synthetic all-atom reference.
    pub const GROUND_TRUTH: Self = Self {
        density_base: 0.8,
        density_f1: 0.4,
        density_chain_amplitude: 0.15,
        density_chain_frequency: 0.03,
        density_f2_stiffness: 0.05,
        density_f3_amplitude: 0.02,
        density_f3_frequency: 3.0,
        rg_prefactor: 0.2,
        rg_stiffness: 0.3,
        rg_f3: 0.1,
    };

    /// The intentionally biased coarse-grained surrogate.
    pub const COARSE_GRAINED: Self = Self {
        density_base: 0.75,
        density_f1: 0.35,
        density_chain_amplitude: 0.12,
        density_chain_frequency: 0.03,
        density_f2_stiffness: 0.04,
        density_f3_amplitude: 0.01,
        density_f3_frequency: 2.5,
        rg_prefactor: 0.22,
        rg_stiffness: 0.25,
        rg_f3: 0.07,
    };

    /// Evaluates the surface at one design row.
    #[must_use]
    pub fn predict(&self, row: &FeatureRow) -> Response {
        let [f1, f2, f3] = row.fractions;
        let units = row.chain_length * 100.0;
        let kappa = row.stiffness;

        let density = self.density_base
            + self.density_f1 * f1
            + self.density_chain_amplitude * (self.density_chain_frequency * units).sin()
            + self.density_f2_stiffness * f2 * kappa
            + self.density_f3_amplitude * (self.density_f3_frequency * f3).sin();
        let radius_of_gyration = self.rg_prefactor
            * units.sqrt()
            * (1.0 + self.rg_stiffness * kappa)
            * (1.0 + self.rg_f3 * f3);

        Response {
            density,
            radius_of_gyration,
        }
    }
}

impl Default for ResponseSurface {
    fn default() -> Self {
        Self::COARSE_GRAINED
    }
}

/// Reference observables for one design row.
#[must_use]
pub fn ground_truth(row: &FeatureRow) -> Response {
    ResponseSurface::GROUND_TRUTH.predict(row)
}

/// Applies a calibration vector to a design row.
///
/// Fractions are scaled by `s1..s3` and renormalized to sum to one,
/// chain length is multiplied by `c_scale`, and `sb` is added to the
/// stiffness.
#[must_use]
pub fn cg_transform(row: &FeatureRow, theta: &CalibrationVector) -> FeatureRow {
    let scales = theta.fraction_scales();
    let mut fractions = [0.0; 3];
    for ((out, f), s) in fractions.iter_mut().zip(row.fractions).zip(scales) {
        *out = f * s;
    }
    let total: f64 = fractions.iter().sum::<f64>() + FRACTION_EPSILON;
    for f in &mut fractions {
        *f /= total;
    }

    FeatureRow {
        fractions,
        chain_length: row.chain_length * theta.c_scale,
        stiffness: row.stiffness + theta.sb,
    }
}

/// Runtime cost proxy for a coarse-grained simulation.
///
/// `cost = base / c_scale + penalty_weight · (|s1 − 1| + |s2 − 1| + |s3 − 1|)`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeProxy {
    /// Cost at `c_scale = 1` with unscaled fractions.
    pub base: f64,
    /// Weight of the fraction-rescaling complexity penalty.
    pub penalty_weight: f64,
}

impl Default for RuntimeProxy {
    fn default() -> Self {
        Self {
            base: 10.0,
            penalty_weight: 0.1,
        }
    }
}

impl RuntimeProxy {
    /// Cost of simulating with `theta`.
    #[must_use]
    pub fn cost(&self, theta: &CalibrationVector) -> f64 {
        let penalty: f64 = theta
            .fraction_scales()
            .iter()
            .map(|s| (s - 1.0).abs())
            .sum();
        self.base / theta.c_scale + self.penalty_weight * penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::sample_design;

    fn row() -> FeatureRow {
        FeatureRow::new([0.2, 0.3, 0.5], 1.5, 0.8)
    }

    #[test]
    fn ground_truth_matches_hand_computation() {
        let r = ground_truth(&row());
        let expected_density = 0.8
            + 0.4 * 0.2
            + 0.15 * (0.03_f64 * 150.0).sin()
            + 0.05 * 0.3 * 0.8
            + 0.02 * (3.0_f64 * 0.5).sin();
        let expected_rg = 0.2 * 150.0_f64.sqrt() * (1.0 + 0.3 * 0.8) * (1.0 + 0.1 * 0.5);
        assert!((r.density - expected_density).abs() < 1e-12);
        assert!((r.radius_of_gyration - expected_rg).abs() < 1e-12);
    }

    #[test]
    fn surfaces_differ() {
        let gt = ground_truth(&row());
        let cg = ResponseSurface::COARSE_GRAINED.predict(&row());
        assert!((gt.density - cg.density).abs() > 1e-3);
        assert!((gt.radius_of_gyration - cg.radius_of_gyration).abs() > 1e-3);
    }

    #[test]
    fn transformed_fractions_sum_to_one() {
        let mut rng = fastrand::Rng::with_seed(11);
        let space = crate::parameter::CalibrationSpace::default();
        for r in sample_design(200, 5) {
            let theta = space.sample(&mut rng);
            let t = cg_transform(&r, &theta);
            let sum: f64 = t.fractions.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
        }
    }

    #[test]
    fn identity_transform_keeps_row() {
        let t = cg_transform(&row(), &CalibrationVector::identity());
        for (a, b) in t.fractions.iter().zip(row().fractions) {
            assert!((a - b).abs() < 1e-8);
        }
        assert!((t.chain_length - 1.5).abs() < 1e-12);
        assert!((t.stiffness - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_fractions_do_not_divide_by_zero() {
        let r = FeatureRow::new([0.0, 0.0, 0.0], 1.0, 1.0);
        let t = cg_transform(&r, &CalibrationVector::identity());
        assert!(t.fractions.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn larger_chain_scale_is_cheaper() {
        let proxy = RuntimeProxy::default();
        let fast = CalibrationVector::new(1.0, 1.0, 1.0, 2.0, 0.0);
        let slow = CalibrationVector::new(1.0, 1.0, 1.0, 0.5, 0.0);
        assert!(proxy.cost(&fast) < proxy.cost(&slow));
        assert!((proxy.cost(&fast) - 5.0).abs() < 1e-12);
        assert!((proxy.cost(&slow) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn fraction_rescaling_is_penalized() {
        let proxy = RuntimeProxy::default();
        let plain = CalibrationVector::identity();
        let scaled = CalibrationVector::new(1.4, 0.6, 1.0, 1.0, 0.0);
        assert!((proxy.cost(&scaled) - proxy.cost(&plain) - 0.08).abs() < 1e-12);
    }
}
