//! Selection, crossover, and mutation. Every value that leaves this
//! module is inside its bounds.

use super::config::{BlendDistribution, Mutation};
use crate::parameter::{CalibrationSpace, CalibrationVector, N_PARAMS, ParamBounds};
use crate::pareto::Ranking;
use crate::rng_util;

/// Binary tournament: pick 2 random members of the pool, return the index
/// of the winner. Lower layer wins; ties broken by higher crowding distance.
pub(crate) fn tournament_select(
    rng: &mut fastrand::Rng,
    ranking: &Ranking,
    pool: &[usize],
) -> usize {
    let a = pool[rng.usize(0..pool.len())];
    let b = pool[rng.usize(0..pool.len())];
    if ranking.prefers(a, b) { a } else { b }
}

/// Draw one blend weight.
pub(crate) fn blend_weight(rng: &mut fastrand::Rng, blend: BlendDistribution) -> f64 {
    match blend {
        BlendDistribution::Uniform { alpha } => rng_util::f64_range(rng, -alpha, 1.0 + alpha),
        BlendDistribution::Sbx { eta } => {
            let u: f64 = rng_util::f64_range(rng, 0.0, 1.0);
            let beta = if u <= 0.5 {
                (2.0 * u).powf(1.0 / (eta + 1.0))
            } else {
                (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
            };
            0.5 * (1.0 + beta)
        }
    }
}

/// Blend two parent components with weight `w`, clamped to `bounds`.
pub(crate) fn blend(p1: f64, p2: f64, w: f64, bounds: &ParamBounds) -> (f64, f64) {
    let c1 = w * p1 + (1.0 - w) * p2;
    let c2 = (1.0 - w) * p1 + w * p2;
    (bounds.clamp(c1), bounds.clamp(c2))
}

/// Per-component blend crossover. With probability `1 - crossover_prob`
/// the parents are copied unchanged.
pub(crate) fn crossover(
    rng: &mut fastrand::Rng,
    parent1: &CalibrationVector,
    parent2: &CalibrationVector,
    space: &CalibrationSpace,
    crossover_prob: f64,
    blend_distribution: BlendDistribution,
) -> ([f64; N_PARAMS], [f64; N_PARAMS]) {
    let p1 = parent1.to_array();
    let p2 = parent2.to_array();
    let mut child1 = p1;
    let mut child2 = p2;

    let u: f64 = rng_util::f64_range(rng, 0.0, 1.0);
    if u >= crossover_prob {
        return (child1, child2);
    }

    for (i, bounds) in space.bounds().iter().enumerate() {
        if (p1[i] - p2[i]).abs() < 1e-14 {
            continue;
        }
        let w = blend_weight(rng, blend_distribution);
        let (c1, c2) = blend(p1[i], p2[i], w, bounds);
        child1[i] = c1;
        child2[i] = c2;
    }

    (child1, child2)
}

/// Mutates each component independently with probability `mutation_prob`.
pub(crate) fn mutate(
    rng: &mut fastrand::Rng,
    individual: &mut [f64; N_PARAMS],
    space: &CalibrationSpace,
    mutation: Mutation,
    mutation_prob: f64,
) {
    for (value, bounds) in individual.iter_mut().zip(space.bounds()) {
        if rng_util::f64_range(rng, 0.0, 1.0) >= mutation_prob {
            continue;
        }
        *value = match mutation {
            Mutation::Uniform { scale } => uniform_mutation_f64(rng, *value, bounds, scale),
            Mutation::Polynomial { eta } => polynomial_mutation_f64(rng, *value, bounds, eta),
        };
    }
}

/// Uniform bounded perturbation for a single value.
pub(crate) fn uniform_mutation_f64(
    rng: &mut fastrand::Rng,
    x: f64,
    bounds: &ParamBounds,
    scale: f64,
) -> f64 {
    let reach = scale * bounds.range();
    bounds.clamp(x + rng_util::f64_range(rng, -reach, reach))
}

/// Bounded polynomial mutation (Deb & Goyal) with distribution index `eta`.
///
/// Perturbations shrink as `x` nears a bound, so the result stays inside
/// `bounds` before the final clamp.
pub(crate) fn polynomial_mutation_f64(
    rng: &mut fastrand::Rng,
    x: f64,
    bounds: &ParamBounds,
    eta: f64,
) -> f64 {
    let u = rng.f64();
    let width = bounds.range();
    if width <= 0.0 {
        return x;
    }

    let power = eta + 1.0;
    let shift = if u < 0.5 {
        let room = (bounds.high - x) / width;
        let base = 2.0 * u + (1.0 - 2.0 * u) * room.powf(power);
        base.powf(power.recip()) - 1.0
    } else {
        let room = (x - bounds.low) / width;
        let base = 2.0 * (1.0 - u) + (2.0 * u - 1.0) * room.powf(power);
        1.0 - base.powf(power.recip())
    };

    bounds.clamp(x + shift * width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> CalibrationSpace {
        CalibrationSpace::default()
    }

    #[test]
    fn extreme_blend_weights_stay_in_bounds() {
        let space = space();
        let weights = [
            -1e300,
            -1e6,
            -1.0,
            0.0,
            0.5,
            1.0,
            2.0,
            1e6,
            1e300,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
        ];
        let lo = CalibrationVector::from_array(space.bounds().map(|b| b.low));
        let hi = CalibrationVector::from_array(space.bounds().map(|b| b.high));
        for &w in &weights {
            for (i, b) in space.bounds().iter().enumerate() {
                let (c1, c2) = blend(lo.to_array()[i], hi.to_array()[i], w, b);
                assert!(b.contains(c1), "w={w} c1={c1}");
                assert!(b.contains(c2), "w={w} c2={c2}");
            }
        }
    }

    #[test]
    fn wide_blend_distributions_stay_in_bounds() {
        let space = space();
        let mut rng = fastrand::Rng::with_seed(5);
        for blend_distribution in [
            BlendDistribution::Uniform { alpha: 1e9 },
            BlendDistribution::Sbx { eta: 0.0 },
        ] {
            for _ in 0..2000 {
                let p1 = space.sample(&mut rng);
                let p2 = space.sample(&mut rng);
                let (c1, c2) = crossover(&mut rng, &p1, &p2, &space, 1.0, blend_distribution);
                let mut c1 = c1;
                let mut c2 = c2;
                mutate(
                    &mut rng,
                    &mut c1,
                    &space,
                    Mutation::Uniform { scale: 1e12 },
                    1.0,
                );
                mutate(
                    &mut rng,
                    &mut c2,
                    &space,
                    Mutation::Polynomial { eta: 0.0 },
                    1.0,
                );
                assert!(space.contains(&CalibrationVector::from_array(c1)));
                assert!(space.contains(&CalibrationVector::from_array(c2)));
            }
        }
    }

    #[test]
    fn zero_alpha_keeps_children_between_parents() {
        let b = ParamBounds::new(0.0, 10.0);
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..500 {
            let w = blend_weight(&mut rng, BlendDistribution::Uniform { alpha: 0.0 });
            let (c1, c2) = blend(2.0, 6.0, w, &b);
            assert!((2.0..=6.0).contains(&c1));
            assert!((2.0..=6.0).contains(&c2));
            assert!((c1 + c2 - 8.0).abs() < 1e-9);
        }
    }

    #[test]
    fn crossover_probability_zero_copies_parents() {
        let space = space();
        let mut rng = fastrand::Rng::with_seed(2);
        let p1 = CalibrationVector::new(0.7, 0.8, 0.9, 1.0, 0.1);
        let p2 = CalibrationVector::new(1.3, 1.2, 1.1, 1.9, -0.2);
        let (c1, c2) = crossover(
            &mut rng,
            &p1,
            &p2,
            &space,
            0.0,
            BlendDistribution::Sbx { eta: 20.0 },
        );
        assert_eq!(c1, p1.to_array());
        assert_eq!(c2, p2.to_array());
    }

    #[test]
    fn mutation_probability_zero_is_identity() {
        let space = space();
        let mut rng = fastrand::Rng::with_seed(2);
        let original = CalibrationVector::new(0.7, 0.8, 0.9, 1.0, 0.1).to_array();
        let mut v = original;
        mutate(&mut rng, &mut v, &space, Mutation::Uniform { scale: 0.5 }, 0.0);
        assert_eq!(v, original);
    }

    #[test]
    fn uniform_mutation_delta_is_bounded() {
        let b = ParamBounds::new(0.0, 10.0);
        let mut rng = fastrand::Rng::with_seed(4);
        for _ in 0..1000 {
            let m = uniform_mutation_f64(&mut rng, 5.0, &b, 0.1);
            assert!((m - 5.0).abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn polynomial_mutation_degenerate_range() {
        let mut rng = fastrand::Rng::with_seed(1);
        let point = ParamBounds::new(0.3, 0.3);
        assert!((polynomial_mutation_f64(&mut rng, 0.3, &point, 20.0) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn polynomial_mutation_stays_in_bounds_at_the_edges() {
        let b = ParamBounds::new(-0.3, 0.3);
        let mut rng = fastrand::Rng::with_seed(12);
        for x in [-0.3, 0.0, 0.3] {
            for _ in 0..500 {
                let m = polynomial_mutation_f64(&mut rng, x, &b, 1.0);
                assert!(b.contains(m), "x={x} m={m}");
            }
        }
    }

    #[test]
    fn large_eta_keeps_mutations_local() {
        let b = ParamBounds::new(0.0, 10.0);
        let mut rng = fastrand::Rng::with_seed(8);
        let mean_shift = (0..1000)
            .map(|_| (polynomial_mutation_f64(&mut rng, 5.0, &b, 100.0) - 5.0).abs())
            .sum::<f64>()
            / 1000.0;
        assert!(mean_shift < 0.5, "mean shift = {mean_shift}");
    }

    #[test]
    fn tournament_prefers_better_layer() {
        let ranking = Ranking {
            layers: vec![vec![0], vec![1]],
            layer: vec![0, 1],
            crowding: vec![0.0, f64::INFINITY],
        };
        let mut rng = fastrand::Rng::with_seed(3);
        let pool = [0, 1];
        for _ in 0..100 {
            let winner = tournament_select(&mut rng, &ranking, &pool);
            // index 1 can only win against itself
            assert!(winner == 0 || winner == 1);
        }
        let mut wins = 0;
        for _ in 0..1000 {
            if tournament_select(&mut rng, &ranking, &pool) == 0 {
                wins += 1;
            }
        }
        // P(win) = 3/4 for the better layer
        assert!(wins > 650, "wins = {wins}");
    }
}
