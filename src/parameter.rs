//! The calibration search space.
//!
//! A [`CalibrationVector`] holds the five tunable parameters of the
//! coarse-grained model:
//!
//! | Index | Name | Meaning | Default bounds |
//! |---|---|---|---|
//! | 0 | `s1` | scale factor for monomer fraction 1 | `[0.6, 1.4]` |
//! | 1 | `s2` | scale factor for monomer fraction 2 | `[0.6, 1.4]` |
//! | 2 | `s3` | scale factor for monomer fraction 3 | `[0.6, 1.4]` |
//! | 3 | `c_scale` | chain-length scale factor | `[0.5, 2.0]` |
//! | 4 | `sb` | stiffness bias | `[-0.3, 0.3]` |
//!
//! [`CalibrationSpace`] pairs each parameter with an inclusive
//! [`ParamBounds`] range.
//!
//! # Examples
//!
//! ```
//! use cg_calibrate::parameter::{CalibrationSpace, ParamBounds};
//!
//! let space = CalibrationSpace::default().with_c_scale(ParamBounds::new(0.5, 1.0));
//! assert!(space.validate().is_ok());
//!
//! let bad = CalibrationSpace::default().with_sb(ParamBounds::new(0.3, -0.3));
//! assert!(bad.validate().is_err());
//! ```

use core::fmt;

use crate::error::{Error, Result};
use crate::rng_util;

/// Number of calibration parameters.
pub const N_PARAMS: usize = 5;

/// Parameter names in vector order.
pub const PARAM_NAMES: [&str; N_PARAMS] = ["s1", "s2", "s3", "c_scale", "sb"];

/// An inclusive `[low, high]` range for one parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamBounds {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
}

impl ParamBounds {
    /// Creates a new range. Validation happens in
    /// [`CalibrationSpace::validate`].
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Width of the range.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Midpoint of the range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.low + self.high)
    }

    /// Returns `true` if `value` lies inside the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Clamps `value` into the range. `NaN` maps to the midpoint.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.midpoint();
        }
        value.clamp(self.low, self.high)
    }

    /// Draws a uniform value inside the range.
    pub(crate) fn sample(&self, rng: &mut fastrand::Rng) -> f64 {
        self.clamp(rng_util::f64_range(rng, self.low, self.high))
    }

    fn check(&self, name: &'static str) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low > self.high {
            return Err(Error::InvalidBounds {
                name,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// The five bounded calibration parameters of the coarse-grained model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationVector {
    /// Scale factor for monomer fraction 1.
    pub s1: f64,
    /// Scale factor for monomer fraction 2.
    pub s2: f64,
    /// Scale factor for monomer fraction 3.
    pub s3: f64,
    /// Chain-length scale factor.
    pub c_scale: f64,
    /// Stiffness bias.
    pub sb: f64,
}

impl CalibrationVector {
    /// Creates a vector from its components.
    #[must_use]
    pub const fn new(s1: f64, s2: f64, s3: f64, c_scale: f64, sb: f64) -> Self {
        Self {
            s1,
            s2,
            s3,
            c_scale,
            sb,
        }
    }

    /// The identity calibration: no rescaling, no bias.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0, 0.0)
    }

    /// Components in [`PARAM_NAMES`] order.
    #[must_use]
    pub const fn to_array(self) -> [f64; N_PARAMS] {
        [self.s1, self.s2, self.s3, self.c_scale, self.sb]
    }

    /// Builds a vector from components in [`PARAM_NAMES`] order.
    #[must_use]
    pub const fn from_array(values: [f64; N_PARAMS]) -> Self {
        let [s1, s2, s3, c_scale, sb] = values;
        Self::new(s1, s2, s3, c_scale, sb)
    }

    /// The three fraction multipliers.
    #[must_use]
    pub const fn fraction_scales(&self) -> [f64; 3] {
        [self.s1, self.s2, self.s3]
    }
}

impl fmt::Display for CalibrationVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s1={:.4}, s2={:.4}, s3={:.4}, c_scale={:.4}, sb={:.4}",
            self.s1, self.s2, self.s3, self.c_scale, self.sb
        )
    }
}

/// Per-parameter bounds of the search space.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationSpace {
    bounds: [ParamBounds; N_PARAMS],
}

impl Default for CalibrationSpace {
    fn default() -> Self {
        Self {
            bounds: [
                ParamBounds::new(0.6, 1.4),
                ParamBounds::new(0.6, 1.4),
                ParamBounds::new(0.6, 1.4),
                ParamBounds::new(0.5, 2.0),
                ParamBounds::new(-0.3, 0.3),
            ],
        }
    }
}

impl CalibrationSpace {
    /// Creates a space from bounds in [`PARAM_NAMES`] order.
    #[must_use]
    pub const fn new(bounds: [ParamBounds; N_PARAMS]) -> Self {
        Self { bounds }
    }

    /// Sets the bounds of `s1`.
    #[must_use]
    pub fn with_s1(mut self, bounds: ParamBounds) -> Self {
        self.bounds[0] = bounds;
        self
    }

    /// Sets the bounds of `s2`.
    #[must_use]
    pub fn with_s2(mut self, bounds: ParamBounds) -> Self {
        self.bounds[1] = bounds;
        self
    }

    /// Sets the bounds of `s3`.
    #[must_use]
    pub fn with_s3(mut self, bounds: ParamBounds) -> Self {
        self.bounds[2] = bounds;
        self
    }

    /// Sets the bounds of `c_scale`.
    #[must_use]
    pub fn with_c_scale(mut self, bounds: ParamBounds) -> Self {
        self.bounds[3] = bounds;
        self
    }

    /// Sets the bounds of `sb`.
    #[must_use]
    pub fn with_sb(mut self, bounds: ParamBounds) -> Self {
        self.bounds[4] = bounds;
        self
    }

    /// All bounds in [`PARAM_NAMES`] order.
    #[must_use]
    pub const fn bounds(&self) -> &[ParamBounds; N_PARAMS] {
        &self.bounds
    }

    /// Checks that every bound is finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        for (bounds, name) in self.bounds.iter().zip(PARAM_NAMES) {
            bounds.check(name)?;
        }
        Ok(())
    }

    /// Returns `true` if every component lies inside its bounds.
    #[must_use]
    pub fn contains(&self, vector: &CalibrationVector) -> bool {
        self.bounds
            .iter()
            .zip(vector.to_array())
            .all(|(b, v)| b.contains(v))
    }

    /// Clamps every component into its bounds.
    #[must_use]
    pub fn clamp(&self, values: [f64; N_PARAMS]) -> CalibrationVector {
        let mut clamped = values;
        for (value, bounds) in clamped.iter_mut().zip(&self.bounds) {
            *value = bounds.clamp(*value);
        }
        CalibrationVector::from_array(clamped)
    }

    /// Draws a vector uniformly inside the space.
    pub(crate) fn sample(&self, rng: &mut fastrand::Rng) -> CalibrationVector {
        let mut values = [0.0; N_PARAMS];
        for (value, bounds) in values.iter_mut().zip(&self.bounds) {
            *value = bounds.sample(rng);
        }
        CalibrationVector::from_array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_space_is_valid() {
        assert!(CalibrationSpace::default().validate().is_ok());
    }

    #[test]
    fn inverted_bounds_are_rejected_with_name() {
        let space = CalibrationSpace::default().with_c_scale(ParamBounds::new(2.0, 0.5));
        let err = space.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidBounds {
                name: "c_scale",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let space = CalibrationSpace::default().with_s2(ParamBounds::new(0.6, f64::INFINITY));
        assert!(space.validate().is_err());
        let space = CalibrationSpace::default().with_sb(ParamBounds::new(f64::NAN, 0.3));
        assert!(space.validate().is_err());
    }

    #[test]
    fn degenerate_bounds_are_allowed() {
        let space = CalibrationSpace::default().with_sb(ParamBounds::new(0.0, 0.0));
        assert!(space.validate().is_ok());
    }

    #[test]
    fn clamp_handles_infinities_and_nan() {
        let space = CalibrationSpace::default();
        let v = space.clamp([f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 100.0, -100.0]);
        assert!(space.contains(&v));
        assert!((v.s1 - 1.4).abs() < 1e-12);
        assert!((v.s2 - 0.6).abs() < 1e-12);
        assert!((v.s3 - 1.0).abs() < 1e-12);
        assert!((v.c_scale - 2.0).abs() < 1e-12);
        assert!((v.sb + 0.3).abs() < 1e-12);
    }

    #[test]
    fn samples_stay_in_bounds() {
        let space = CalibrationSpace::default();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            assert!(space.contains(&space.sample(&mut rng)));
        }
    }

    #[test]
    fn array_round_trip_preserves_order() {
        let v = CalibrationVector::new(0.7, 0.8, 0.9, 1.5, -0.1);
        assert_eq!(v.to_array(), [0.7, 0.8, 0.9, 1.5, -0.1]);
        assert_eq!(CalibrationVector::from_array(v.to_array()), v);
    }
}
