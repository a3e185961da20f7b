//! Polymer design rows and a seeded design sampler.
//!
//! Each design case describes a copolymer by the fractions of its three
//! monomer types (summing to 1), a scaled chain length, and a stiffness
//! value.

use crate::rng_util;

/// One design case.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureRow {
    /// Fractions of the three monomer types.
    pub fractions: [f64; 3],
    /// Scaled chain length (repeat units / 100).
    pub chain_length: f64,
    /// Backbone stiffness.
    pub stiffness: f64,
}

impl FeatureRow {
    /// Creates a design row.
    #[must_use]
    pub const fn new(fractions: [f64; 3], chain_length: f64, stiffness: f64) -> Self {
        Self {
            fractions,
            chain_length,
            stiffness,
        }
    }
}

/// Draws `n` design rows.
///
/// Fractions follow a flat Dirichlet(1, 1, 1), chain length is an integer
/// in `[50, 500)` divided by 100, and stiffness is uniform in `[0.1, 2.0)`.
/// The same seed always produces the same rows.
///
/// # Examples
///
/// ```
/// use cg_calibrate::design::sample_design;
///
/// let rows = sample_design(50, 42);
/// assert_eq!(rows.len(), 50);
/// for row in &rows {
///     let sum: f64 = row.fractions.iter().sum();
///     assert!((sum - 1.0).abs() < 1e-12);
/// }
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_design(n: usize, seed: u64) -> Vec<FeatureRow> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n)
        .map(|_| {
            let fractions = flat_dirichlet(&mut rng);
            let chain_length = rng.u32(50..500) as f64 / 100.0;
            let stiffness = rng_util::f64_range(&mut rng, 0.1, 2.0);
            FeatureRow::new(fractions, chain_length, stiffness)
        })
        .collect()
}

/// Dirichlet(1, 1, 1): normalized standard exponentials.
fn flat_dirichlet(rng: &mut fastrand::Rng) -> [f64; 3] {
    let mut draws = [
        rng_util::exponential(rng),
        rng_util::exponential(rng),
        rng_util::exponential(rng),
    ];
    let total: f64 = draws.iter().sum();
    if total > 0.0 {
        for d in &mut draws {
            *d /= total;
        }
    } else {
        draws = [1.0 / 3.0; 3];
    }
    draws
}
