//! Multi-objective search engine (NSGA-II).
//!
//! The engine runs an explicit generation loop:
//!
//! 1. **Evaluate** every vector of the current population and append the
//!    results to the [`History`].
//! 2. **Rank** the finite candidates of this generation together with the
//!    previous survivors by non-domination layer and crowding distance,
//!    and keep the best `population_size` of them.
//! 3. **Select** a parent pool by binary tournament (layer first, then
//!    crowding distance).
//! 4. **Vary** parent pairs with blend crossover and bounded mutation;
//!    every component is clamped into its bounds.
//! 5. **Advance** to the offspring population.
//!
//! When the budget is exhausted, [`SearchEngine::pareto_front`] reports the
//! non-dominated candidates of the *whole* history, not just the final
//! survivors.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use cg_calibrate::prelude::*;
//!
//! let batch = EvaluationBatch::from_ground_truth(sample_design(5, 42)).unwrap();
//! let config = SearchConfig::builder()
//!     .population_size(20)
//!     .generations(10)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let mut engine = SearchEngine::new(config, CalibrationObjective::new(Arc::new(batch)));
//! engine.run();
//!
//! assert_eq!(engine.history().len(), 200);
//! for candidate in engine.pareto_front() {
//!     assert!(candidate.objectives.error >= 0.0);
//!     assert!(candidate.objectives.runtime_cost > 0.0);
//! }
//! ```

mod config;
mod operators;
#[cfg(feature = "async")]
mod parallel;

use core::ops::ControlFlow;
use std::sync::Arc;

pub use config::{BlendDistribution, Budget, Mutation, SearchConfig, SearchConfigBuilder};

use crate::history::History;
use crate::objective::Objective;
use crate::parameter::CalibrationVector;
use crate::pareto;
use crate::types::{Candidate, Objectives};

/// Population-based multi-objective optimizer over the calibration space.
///
/// The random generator is seeded once per engine and only drawn from on
/// the engine's own thread, so the same seed, objective, and configuration
/// always reproduce the same history.
pub struct SearchEngine<O> {
    config: SearchConfig,
    objective: Arc<O>,
    rng: fastrand::Rng,
    history: History,
    /// Vectors awaiting evaluation in the next generation.
    population: Vec<CalibrationVector>,
    /// Elite candidates carried over from ranking.
    survivors: Vec<Candidate>,
    generation: usize,
    evaluated: usize,
    stopped: bool,
}

impl<O: Objective> SearchEngine<O> {
    /// Creates an engine and samples the initial population uniformly
    /// within the configured bounds.
    #[must_use]
    pub fn new(config: SearchConfig, objective: O) -> Self {
        let mut rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let population = random_population(&mut rng, &config);
        Self {
            config,
            objective: Arc::new(objective),
            rng,
            history: History::new(),
            population,
            survivors: Vec::new(),
            generation: 0,
            evaluated: 0,
            stopped: false,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The objective.
    #[must_use]
    pub fn objective(&self) -> &O {
        &self.objective
    }

    /// A read handle on the history of every evaluated candidate.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Number of generations evaluated so far.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Number of candidates evaluated so far.
    #[must_use]
    pub fn n_evaluated(&self) -> usize {
        self.evaluated
    }

    /// The vectors that the next generation will evaluate.
    #[must_use]
    pub fn population(&self) -> &[CalibrationVector] {
        &self.population
    }

    /// The elite candidates kept by the last ranking.
    #[must_use]
    pub fn survivors(&self) -> &[Candidate] {
        &self.survivors
    }

    /// Returns `true` once the budget is spent or the objective asked to stop.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stopped || self.evaluated >= self.config.total_trials()
    }

    /// Non-dominated candidates over the full history.
    ///
    /// Candidates with non-finite objectives are never included.
    #[must_use]
    pub fn pareto_front(&self) -> Vec<Candidate> {
        self.history
            .pareto_front()
            .into_iter()
            .map(|e| e.candidate)
            .collect()
    }

    /// Runs generations until the budget is exhausted or the objective's
    /// [`after_generation`](Objective::after_generation) hook breaks.
    pub fn run(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "run",
            population_size = self.config.population_size,
            total_trials = self.config.total_trials(),
            seed = ?self.config.seed
        )
        .entered();

        while let ControlFlow::Continue(()) = self.step() {}

        trace_info!(
            generations = self.generation,
            evaluated = self.evaluated,
            "search finished"
        );
    }

    /// Runs exactly one generation: evaluate, record, rank, select, vary.
    ///
    /// Returns `Break` when no further generation will run.
    pub fn step(&mut self) -> ControlFlow<()> {
        let Some(batch) = self.take_generation() else {
            return ControlFlow::Break(());
        };
        let scores: Vec<Objectives> = batch.iter().map(|v| self.objective.evaluate(v)).collect();
        self.advance(&batch, &scores)
    }

    /// The next generation's vectors, truncated to the remaining budget.
    fn take_generation(&mut self) -> Option<Vec<CalibrationVector>> {
        if self.is_finished() {
            return None;
        }
        let remaining = self.config.total_trials() - self.evaluated;
        let mut batch = core::mem::take(&mut self.population);
        batch.truncate(remaining);
        Some(batch)
    }

    /// Records an evaluated generation and breeds the next one.
    fn advance(
        &mut self,
        batch: &[CalibrationVector],
        scores: &[Objectives],
    ) -> ControlFlow<()> {
        let candidates: Vec<Candidate> = batch
            .iter()
            .zip(scores)
            .map(|(&v, &o)| Candidate::new(v, o))
            .collect();

        let excluded = self.history.append_generation(self.generation, &candidates);
        if excluded > 0 {
            trace_warn!(
                generation = self.generation,
                excluded,
                "non-finite objectives excluded from ranking"
            );
        }

        let mut pool = core::mem::take(&mut self.survivors);
        pool.extend(candidates.into_iter().filter(Candidate::is_finite));
        let objectives: Vec<Objectives> = pool.iter().map(|c| c.objectives).collect();
        let ranking = pareto::rank(&objectives);
        let kept = ranking.truncate(self.config.population_size);

        trace_info!(
            generation = self.generation,
            evaluated = batch.len(),
            excluded,
            front = ranking.layers.first().map_or(0, Vec::len),
            "generation complete"
        );

        self.survivors = kept.iter().map(|&i| pool[i]).collect();
        trace_debug!(survivors = self.survivors.len(), pool = pool.len(), "survivors selected");
        self.evaluated += batch.len();
        let finished_generation = self.generation;
        self.generation += 1;

        if self.is_finished() {
            return ControlFlow::Break(());
        }
        if let ControlFlow::Break(()) = self
            .objective
            .after_generation(finished_generation, &self.history)
        {
            trace_info!(generation = finished_generation, "stop requested");
            self.stopped = true;
            return ControlFlow::Break(());
        }

        self.population = if kept.is_empty() {
            trace_warn!("no rankable candidates, resampling population");
            random_population(&mut self.rng, &self.config)
        } else {
            self.breed(&ranking, &kept, &pool)
        };
        ControlFlow::Continue(())
    }

    /// Tournament selection followed by crossover and mutation.
    fn breed(
        &mut self,
        ranking: &pareto::Ranking,
        kept: &[usize],
        pool: &[Candidate],
    ) -> Vec<CalibrationVector> {
        let n = self.config.population_size;
        let space = &self.config.space;

        let parents: Vec<CalibrationVector> = (0..n)
            .map(|_| pool[operators::tournament_select(&mut self.rng, ranking, kept)].vector)
            .collect();

        let mut offspring = Vec::with_capacity(n);
        for pair in 0..n.div_ceil(2) {
            let p1 = &parents[2 * pair];
            let p2 = &parents[(2 * pair + 1) % n];

            let (mut child1, mut child2) = operators::crossover(
                &mut self.rng,
                p1,
                p2,
                space,
                self.config.crossover_prob,
                self.config.blend,
            );
            for child in [&mut child1, &mut child2] {
                operators::mutate(
                    &mut self.rng,
                    child,
                    space,
                    self.config.mutation,
                    self.config.mutation_prob,
                );
            }

            offspring.push(space.clamp(child1));
            if offspring.len() < n {
                offspring.push(space.clamp(child2));
            }
        }
        offspring
    }
}

impl<O> core::fmt::Debug for SearchEngine<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("generation", &self.generation)
            .field("evaluated", &self.evaluated)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

fn random_population(rng: &mut fastrand::Rng, config: &SearchConfig) -> Vec<CalibrationVector> {
    (0..config.population_size)
        .map(|_| config.space.sample(rng))
        .collect()
}
