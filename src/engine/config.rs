//! Search configuration and its builder.

use crate::error::{Error, Result};
use crate::parameter::{CalibrationSpace, N_PARAMS};

/// How long a run lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Budget {
    /// Evaluate exactly this many full generations.
    Generations(usize),
    /// Evaluate this many candidates in total. The last generation is
    /// partial when the total is not a multiple of the population size.
    Trials(usize),
}

impl Budget {
    /// Total number of evaluations for a given population size.
    #[must_use]
    pub fn total_trials(&self, population_size: usize) -> usize {
        match *self {
            Self::Generations(n) => n.saturating_mul(population_size),
            Self::Trials(n) => n,
        }
    }
}

/// Distribution of the per-component blend weight used by crossover.
///
/// Each offspring component is `w·p1 + (1 − w)·p2` (and the mirrored
/// `(1 − w)·p1 + w·p2` for the sibling), with `w` drawn independently for
/// every component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlendDistribution {
    /// BLX-α: `w` uniform in `[−alpha, 1 + alpha]`.
    Uniform {
        /// Extension beyond the parents' interval. `0.0` keeps offspring
        /// between the parents.
        alpha: f64,
    },
    /// Simulated binary crossover: `w = (1 + β) / 2` with β drawn from
    /// the SBX spread distribution of index `eta`.
    Sbx {
        /// Distribution index. Larger values keep offspring closer to the
        /// parents.
        eta: f64,
    },
}

/// Per-component mutation operator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mutation {
    /// Add a delta uniform in `[−scale·range, scale·range]`, where `range`
    /// is the width of the parameter's bounds.
    Uniform {
        /// Perturbation scale relative to the bound width.
        scale: f64,
    },
    /// Polynomial mutation with distribution index `eta`.
    Polynomial {
        /// Distribution index.
        eta: f64,
    },
}

/// Validated configuration of a [`SearchEngine`](super::SearchEngine).
///
/// Built with [`SearchConfig::builder`]; every option has an explicit
/// default listed on the builder setter.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    pub(crate) population_size: usize,
    pub(crate) budget: Budget,
    pub(crate) space: CalibrationSpace,
    pub(crate) crossover_prob: f64,
    pub(crate) blend: BlendDistribution,
    pub(crate) mutation_prob: f64,
    pub(crate) mutation: Mutation,
    pub(crate) seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            budget: Budget::Trials(200),
            space: CalibrationSpace::default(),
            crossover_prob: 0.9,
            blend: BlendDistribution::Sbx { eta: 20.0 },
            mutation_prob: default_mutation_prob(),
            mutation: Mutation::Uniform { scale: 0.1 },
            seed: None,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn default_mutation_prob() -> f64 {
    1.0 / N_PARAMS as f64
}

impl SearchConfig {
    /// Creates a builder for configuring a `SearchConfig`.
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Number of candidates per generation.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// The run budget.
    #[must_use]
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Total evaluations the budget allows.
    #[must_use]
    pub fn total_trials(&self) -> usize {
        self.budget.total_trials(self.population_size)
    }

    /// The parameter bounds.
    #[must_use]
    pub fn space(&self) -> &CalibrationSpace {
        &self.space
    }

    /// Probability that a parent pair is recombined.
    #[must_use]
    pub fn crossover_prob(&self) -> f64 {
        self.crossover_prob
    }

    /// Blend-weight distribution of crossover.
    #[must_use]
    pub fn blend(&self) -> BlendDistribution {
        self.blend
    }

    /// Per-component mutation probability.
    #[must_use]
    pub fn mutation_prob(&self) -> f64 {
        self.mutation_prob
    }

    /// Mutation operator.
    #[must_use]
    pub fn mutation(&self) -> Mutation {
        self.mutation
    }

    /// Random seed, if fixed.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Builder for [`SearchConfig`].
///
/// # Examples
///
/// ```
/// use cg_calibrate::engine::{BlendDistribution, Budget, Mutation, SearchConfig};
///
/// let config = SearchConfig::builder()
///     .population_size(20)
///     .budget(Budget::Generations(10))
///     .blend(BlendDistribution::Uniform { alpha: 0.5 })
///     .mutation(Mutation::Uniform { scale: 0.05 })
///     .seed(42)
///     .build()
///     .unwrap();
/// assert_eq!(config.total_trials(), 200);
///
/// assert!(SearchConfig::builder().mutation_prob(1.5).build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    population_size: Option<usize>,
    budget: Option<Budget>,
    space: Option<CalibrationSpace>,
    crossover_prob: Option<f64>,
    blend: Option<BlendDistribution>,
    mutation_prob: Option<f64>,
    mutation: Option<Mutation>,
    seed: Option<u64>,
}

impl SearchConfigBuilder {
    /// Sets the population size. Default: 50. Must be at least 2.
    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Sets the run budget. Default: `Budget::Trials(200)`.
    #[must_use]
    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Shorthand for `budget(Budget::Generations(n))`.
    #[must_use]
    pub fn generations(self, n: usize) -> Self {
        self.budget(Budget::Generations(n))
    }

    /// Shorthand for `budget(Budget::Trials(n))`.
    #[must_use]
    pub fn trials(self, n: usize) -> Self {
        self.budget(Budget::Trials(n))
    }

    /// Sets the parameter bounds. Default: [`CalibrationSpace::default`].
    #[must_use]
    pub fn space(mut self, space: CalibrationSpace) -> Self {
        self.space = Some(space);
        self
    }

    /// Sets the crossover probability. Default: 0.9.
    #[must_use]
    pub fn crossover_prob(mut self, prob: f64) -> Self {
        self.crossover_prob = Some(prob);
        self
    }

    /// Sets the blend-weight distribution. Default: `Sbx { eta: 20.0 }`.
    #[must_use]
    pub fn blend(mut self, blend: BlendDistribution) -> Self {
        self.blend = Some(blend);
        self
    }

    /// Sets the per-component mutation probability. Default: `1 / 5`.
    #[must_use]
    pub fn mutation_prob(mut self, prob: f64) -> Self {
        self.mutation_prob = Some(prob);
        self
    }

    /// Sets the mutation operator. Default: `Uniform { scale: 0.1 }`.
    #[must_use]
    pub fn mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Sets the random seed for reproducibility. Default: unseeded.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBounds`] if any parameter bound is non-finite or
    ///   inverted.
    /// - [`Error::InvalidPopulationSize`] if the population is below 2.
    /// - [`Error::InvalidBudget`] if the budget allows no evaluation.
    /// - [`Error::InvalidProbability`] if a probability is outside `[0, 1]`.
    /// - [`Error::InvalidOperator`] if a blend or mutation parameter is
    ///   negative or non-finite.
    pub fn build(self) -> Result<SearchConfig> {
        let defaults = SearchConfig::default();
        let config = SearchConfig {
            population_size: self.population_size.unwrap_or(defaults.population_size),
            budget: self.budget.unwrap_or(defaults.budget),
            space: self.space.unwrap_or(defaults.space),
            crossover_prob: self.crossover_prob.unwrap_or(defaults.crossover_prob),
            blend: self.blend.unwrap_or(defaults.blend),
            mutation_prob: self.mutation_prob.unwrap_or(defaults.mutation_prob),
            mutation: self.mutation.unwrap_or(defaults.mutation),
            seed: self.seed,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &SearchConfig) -> Result<()> {
    config.space.validate()?;

    if config.population_size < 2 {
        return Err(Error::InvalidPopulationSize(config.population_size));
    }
    if config.total_trials() == 0 {
        return Err(Error::InvalidBudget);
    }

    check_probability("crossover_prob", config.crossover_prob)?;
    check_probability("mutation_prob", config.mutation_prob)?;

    match config.blend {
        BlendDistribution::Uniform { alpha } if !is_non_negative(alpha) => {
            return Err(Error::InvalidOperator(
                "blend alpha must be finite and non-negative",
            ));
        }
        BlendDistribution::Sbx { eta } if !is_non_negative(eta) => {
            return Err(Error::InvalidOperator(
                "SBX eta must be finite and non-negative",
            ));
        }
        _ => {}
    }

    match config.mutation {
        Mutation::Uniform { scale } if !is_non_negative(scale) => Err(Error::InvalidOperator(
            "mutation scale must be finite and non-negative",
        )),
        Mutation::Polynomial { eta } if !is_non_negative(eta) => Err(Error::InvalidOperator(
            "polynomial mutation eta must be finite and non-negative",
        )),
        _ => Ok(()),
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidProbability { name, value })
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParamBounds;

    #[test]
    fn defaults_are_valid() {
        let config = SearchConfig::builder().build().unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.total_trials(), 200);
    }

    #[test]
    fn inverted_space_is_rejected_before_anything_runs() {
        let space = CalibrationSpace::default().with_s1(ParamBounds::new(1.4, 0.6));
        let err = SearchConfig::builder().space(space).build().unwrap_err();
        assert!(matches!(err, Error::InvalidBounds { name: "s1", .. }));
    }

    #[test]
    fn tiny_population_is_rejected() {
        assert!(matches!(
            SearchConfig::builder().population_size(1).build(),
            Err(Error::InvalidPopulationSize(1))
        ));
    }

    #[test]
    fn empty_budget_is_rejected() {
        assert!(matches!(
            SearchConfig::builder().generations(0).build(),
            Err(Error::InvalidBudget)
        ));
        assert!(matches!(
            SearchConfig::builder().trials(0).build(),
            Err(Error::InvalidBudget)
        ));
    }

    #[test]
    fn probabilities_are_checked() {
        assert!(matches!(
            SearchConfig::builder().crossover_prob(-0.1).build(),
            Err(Error::InvalidProbability {
                name: "crossover_prob",
                ..
            })
        ));
        assert!(
            SearchConfig::builder()
                .mutation_prob(f64::NAN)
                .build()
                .is_err()
        );
    }

    #[test]
    fn operator_parameters_are_checked() {
        assert!(
            SearchConfig::builder()
                .blend(BlendDistribution::Uniform { alpha: -1.0 })
                .build()
                .is_err()
        );
        assert!(
            SearchConfig::builder()
                .mutation(Mutation::Uniform {
                    scale: f64::INFINITY
                })
                .build()
                .is_err()
        );
        assert!(
            SearchConfig::builder()
                .mutation(Mutation::Polynomial { eta: 15.0 })
                .build()
                .is_ok()
        );
    }

    #[test]
    fn generation_budget_counts_trials() {
        assert_eq!(Budget::Generations(10).total_trials(20), 200);
        assert_eq!(Budget::Trials(45).total_trials(20), 45);
    }
}
