use core::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::SearchEngine;
use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::parameter::CalibrationVector;
use crate::types::Objectives;

impl<O> SearchEngine<O>
where
    O: Objective + Send + Sync + 'static,
{
    /// Runs the search with up to `concurrency` evaluations in flight.
    ///
    /// Each evaluation is wrapped in
    /// [`spawn_blocking`](tokio::task::spawn_blocking) and collected via a
    /// [`JoinSet`]. Results are put back in population order before ranking,
    /// and all random draws stay on the calling task, so a seeded parallel
    /// run produces exactly the history of a sequential [`run`](Self::run).
    ///
    /// A `concurrency` of 0 is treated as 1.
    ///
    /// An evaluation that panics is isolated to its candidate: it is
    /// recorded with non-finite objectives as
    /// [`Excluded`](crate::CandidateStatus::Excluded) and the run goes on.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskError` if the semaphore is closed. The
    /// interrupted generation is put back, so the run can be resumed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use cg_calibrate::prelude::*;
    ///
    /// # async fn example() -> cg_calibrate::Result<()> {
    /// let batch = EvaluationBatch::from_ground_truth(sample_design(10, 7))?;
    /// let config = SearchConfig::builder().population_size(8).generations(3).seed(7).build()?;
    /// let mut engine = SearchEngine::new(config, CalibrationObjective::new(Arc::new(batch)));
    ///
    /// engine.run_parallel(4).await?;
    /// assert_eq!(engine.history().len(), 24);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_parallel(&mut self, concurrency: usize) -> Result<()> {
        let concurrency = concurrency.max(1);
        trace_info!(
            population_size = self.config.population_size,
            total_trials = self.config.total_trials(),
            concurrency,
            "parallel search started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));

        while let Some(batch) = self.take_generation() {
            let scores = match self.evaluate_parallel(&batch, &semaphore).await {
                Ok(scores) => scores,
                Err(e) => {
                    // Nothing of this generation was recorded; make it resumable.
                    self.population = batch;
                    return Err(e);
                }
            };
            if let ControlFlow::Break(()) = self.advance(&batch, &scores) {
                break;
            }
        }

        trace_info!(
            generations = self.generation,
            evaluated = self.evaluated,
            "parallel search finished"
        );
        Ok(())
    }

    async fn evaluate_parallel(
        &self,
        batch: &[CalibrationVector],
        semaphore: &Arc<Semaphore>,
    ) -> Result<Vec<Objectives>> {
        let mut join_set: JoinSet<(usize, Objectives)> = JoinSet::new();

        for (index, &vector) in batch.iter().enumerate() {
            let permit = Arc::clone(semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::TaskError(e.to_string()))?;
            let objective = Arc::clone(&self.objective);
            join_set.spawn_blocking(move || {
                let scores = objective.evaluate(&vector);
                drop(permit);
                (index, scores)
            });
        }

        // A failed task leaves its slot non-finite, so the candidate is
        // recorded as excluded instead of ending the run.
        let mut scores = vec![Objectives::new(f64::NAN, f64::NAN); batch.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, value)) => scores[index] = value,
                Err(e) => {
                    trace_warn!(error = %e, "evaluation task failed, candidate excluded");
                    #[cfg(not(feature = "tracing"))]
                    drop(e);
                }
            }
        }
        trace_debug!(evaluated = batch.len(), "batch evaluated");
        Ok(scores)
    }
}
