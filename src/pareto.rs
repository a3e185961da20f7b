//! Pareto dominance, non-dominated sorting, and crowding distance.
//!
//! All objectives are minimized. A solution **dominates** another if it is
//! no worse in every objective and strictly better in at least one. The
//! **Pareto front** is the set of solutions no other solution dominates.
//!
//! | Function | Purpose |
//! |---|---|
//! | [`non_dominated_sort`] | Partition solutions into successive layers (layer 0, 1, …) |
//! | [`pareto_front_indices`] | Only the non-dominated solutions |
//! | [`crowding_distance`] | Spread of each solution within one layer |
//! | [`rank`] | Layer and crowding distance for every solution at once |
//!
//! # Example
//!
//! ```
//! use cg_calibrate::Objectives;
//! use cg_calibrate::pareto::{crowding_distance, non_dominated_sort, pareto_front_indices};
//!
//! let solutions = [
//!     Objectives::new(1.0, 5.0), // Pareto-optimal
//!     Objectives::new(5.0, 1.0), // Pareto-optimal
//!     Objectives::new(3.0, 3.0), // Pareto-optimal
//!     Objectives::new(4.0, 4.0), // dominated by (3, 3)
//! ];
//!
//! let layers = non_dominated_sort(&solutions);
//! assert_eq!(layers.len(), 2);
//!
//! let mut front = pareto_front_indices(&solutions);
//! front.sort_unstable();
//! assert_eq!(front, vec![0, 1, 2]);
//!
//! let cd = crowding_distance(&solutions[..3]);
//! assert!(cd[0].is_infinite()); // boundary solution
//! assert!(cd[2].is_finite());
//! ```

use crate::types::Objectives;

/// Number of objectives.
pub const N_OBJECTIVES: usize = 2;

/// Returns `true` if `a` Pareto-dominates `b` (minimization).
pub(crate) fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());

    let mut strictly_better = false;
    for (&av, &bv) in a.iter().zip(b) {
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Fast non-dominated sorting (Deb et al., 2002).
///
/// Returns `Vec<Vec<usize>>` where `fronts[0]` is the Pareto front,
/// each inner vec contains indices into `values`.
///
/// Complexity: O(M * N^2) where M = objectives, N = solutions.
pub(crate) fn fast_non_dominated_sort(values: &[[f64; N_OBJECTIVES]]) -> Vec<Vec<usize>> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    // S_p: set of solutions dominated by p
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    // n_p: domination count for p
    let mut domination_count: Vec<usize> = vec![0; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&values[i], &values[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&values[j], &values[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current_front.is_empty() {
        let mut next_front: Vec<usize> = Vec::new();
        for &p in &current_front {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        next_front.sort_unstable();
        fronts.push(current_front);
        current_front = next_front;
    }

    fronts
}

/// Crowding distance for one front (index-based, internal API).
///
/// Boundary solutions get `f64::INFINITY`. Returns one distance value per
/// solution in the front, in the same order as `front_indices`.
pub(crate) fn crowding_distance_indexed(
    front_indices: &[usize],
    values: &[[f64; N_OBJECTIVES]],
) -> Vec<f64> {
    let n = front_indices.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let mut distances = vec![0.0_f64; n];
    let val = |front_pos: usize, obj: usize| -> f64 { values[front_indices[front_pos]][obj] };

    for obj in 0..N_OBJECTIVES {
        let mut sorted: Vec<usize> = (0..n).collect();
        sorted.sort_by(|&a, &b| val(a, obj).total_cmp(&val(b, obj)));

        distances[sorted[0]] = f64::INFINITY;
        distances[sorted[n - 1]] = f64::INFINITY;

        let range = val(sorted[n - 1], obj) - val(sorted[0], obj);
        if range > 0.0 {
            for i in 1..(n - 1) {
                distances[sorted[i]] += (val(sorted[i + 1], obj) - val(sorted[i - 1], obj)) / range;
            }
        }
    }

    distances
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Layer index and crowding distance for every solution of a set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ranking {
    /// Solution indices per non-domination layer, best layer first.
    pub layers: Vec<Vec<usize>>,
    /// Layer of each solution (0 = non-dominated).
    pub layer: Vec<usize>,
    /// Crowding distance of each solution within its layer.
    pub crowding: Vec<f64>,
}

impl Ranking {
    /// Binary-tournament comparison: `true` if `a` beats `b`.
    ///
    /// The lower layer wins; on equal layers the larger crowding distance
    /// wins. Exact ties go to `a`.
    #[must_use]
    pub fn prefers(&self, a: usize, b: usize) -> bool {
        if self.layer[a] != self.layer[b] {
            return self.layer[a] < self.layer[b];
        }
        self.crowding[a] >= self.crowding[b]
    }

    /// Indices of the best `n` solutions: whole layers in order, then the
    /// split layer by descending crowding distance.
    #[must_use]
    pub fn truncate(&self, n: usize) -> Vec<usize> {
        let mut selected: Vec<usize> = Vec::with_capacity(n);
        for layer in &self.layers {
            if selected.len() + layer.len() <= n {
                selected.extend_from_slice(layer);
            } else {
                let remaining = n - selected.len();
                let mut by_crowding = layer.clone();
                by_crowding.sort_by(|&a, &b| self.crowding[b].total_cmp(&self.crowding[a]));
                selected.extend_from_slice(&by_crowding[..remaining]);
                break;
            }
        }
        selected
    }
}

/// Ranks solutions by non-domination layer and crowding distance.
///
/// All values must be finite; the engine filters non-finite candidates
/// out before ranking.
#[must_use]
pub fn rank(solutions: &[Objectives]) -> Ranking {
    let values: Vec<[f64; N_OBJECTIVES]> = solutions.iter().map(|o| o.to_array()).collect();
    let layers = fast_non_dominated_sort(&values);

    let n = solutions.len();
    let mut layer = vec![0_usize; n];
    let mut crowding = vec![0.0_f64; n];
    for (layer_rank, members) in layers.iter().enumerate() {
        let cd = crowding_distance_indexed(members, &values);
        for (&idx, d) in members.iter().zip(cd) {
            layer[idx] = layer_rank;
            crowding[idx] = d;
        }
    }

    Ranking {
        layers,
        layer,
        crowding,
    }
}

/// Compute non-dominated sorting of a set of solutions.
///
/// Return a vec of layers, where `layers[0]` is the Pareto front,
/// `layers[1]` is dominated only by layer 0, and so on. Each inner vec
/// contains indices into `solutions`.
#[must_use]
pub fn non_dominated_sort(solutions: &[Objectives]) -> Vec<Vec<usize>> {
    let values: Vec<[f64; N_OBJECTIVES]> = solutions.iter().map(|o| o.to_array()).collect();
    fast_non_dominated_sort(&values)
}

/// Indices of the non-dominated solutions.
#[must_use]
pub fn pareto_front_indices(solutions: &[Objectives]) -> Vec<usize> {
    non_dominated_sort(solutions)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Crowding distance of every solution in `front` (same order).
///
/// Boundary solutions (best or worst in any objective) receive
/// [`f64::INFINITY`]; fronts of one or two members are all boundary.
#[must_use]
pub fn crowding_distance(front: &[Objectives]) -> Vec<f64> {
    let values: Vec<[f64; N_OBJECTIVES]> = front.iter().map(|o| o.to_array()).collect();
    let indices: Vec<usize> = (0..front.len()).collect();
    crowding_distance_indexed(&indices, &values)
}
