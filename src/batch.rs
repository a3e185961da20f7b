//! The fixed evaluation batch shared by every objective evaluation.

use crate::design::FeatureRow;
use crate::error::{Error, Result};
use crate::model::{self, Response};

/// Design rows paired with their ground-truth targets.
///
/// Built once at startup and never mutated; share it behind an
/// [`Arc`](std::sync::Arc) across evaluations.
///
/// # Examples
///
/// ```
/// use cg_calibrate::batch::EvaluationBatch;
/// use cg_calibrate::design::sample_design;
///
/// let batch = EvaluationBatch::from_ground_truth(sample_design(5, 42)).unwrap();
/// assert_eq!(batch.len(), 5);
///
/// assert!(EvaluationBatch::from_ground_truth(Vec::new()).is_err());
/// ```
///
/// Deserialization goes through [`EvaluationBatch::new`], so an empty or
/// misaligned batch fails to load.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawBatch")
)]
pub struct EvaluationBatch {
    rows: Vec<FeatureRow>,
    targets: Vec<Response>,
}

impl EvaluationBatch {
    /// Creates a batch from rows and externally computed targets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBatch`] if `rows` is empty and
    /// [`Error::BatchLengthMismatch`] if the lengths differ.
    pub fn new(rows: Vec<FeatureRow>, targets: Vec<Response>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if rows.len() != targets.len() {
            return Err(Error::BatchLengthMismatch {
                rows: rows.len(),
                targets: targets.len(),
            });
        }
        Ok(Self { rows, targets })
    }

    /// Creates a batch whose targets come from the reference model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBatch`] if `rows` is empty.
    pub fn from_ground_truth(rows: Vec<FeatureRow>) -> Result<Self> {
        let targets = rows.iter().map(model::ground_truth).collect();
        Self::new(rows, targets)
    }

    /// The design rows.
    #[must_use]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// The ground-truth targets, aligned with [`rows`](Self::rows).
    #[must_use]
    pub fn targets(&self) -> &[Response] {
        &self.targets
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`: empty batches are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over `(row, target)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureRow, &Response)> {
        self.rows.iter().zip(&self.targets)
    }
}

/// Unvalidated wire form of [`EvaluationBatch`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawBatch {
    rows: Vec<FeatureRow>,
    targets: Vec<Response>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBatch> for EvaluationBatch {
    type Error = Error;

    fn try_from(raw: RawBatch) -> Result<Self> {
        Self::new(raw.rows, raw.targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            EvaluationBatch::new(Vec::new(), Vec::new()),
            Err(Error::EmptyBatch)
        ));
    }

    #[test]
    fn mismatched_targets_are_rejected() {
        let rows = vec![FeatureRow::new([0.3, 0.3, 0.4], 1.0, 1.0); 2];
        let targets = vec![
            Response {
                density: 1.0,
                radius_of_gyration: 2.0,
            };
            3
        ];
        assert!(matches!(
            EvaluationBatch::new(rows, targets),
            Err(Error::BatchLengthMismatch {
                rows: 2,
                targets: 3
            })
        ));
    }

    #[test]
    fn ground_truth_targets_are_aligned() {
        let rows = crate::design::sample_design(4, 9);
        let batch = EvaluationBatch::from_ground_truth(rows.clone()).unwrap();
        for ((row, target), original) in batch.iter().zip(&rows) {
            assert_eq!(row, original);
            assert_eq!(*target, model::ground_truth(original));
        }
    }
}
