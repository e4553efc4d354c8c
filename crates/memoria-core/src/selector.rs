//! Memory-weighted choice from a candidate pool
//!
//! Every distinct pool value starts with weight 1 and gains 1 for each time it
//! appears in the recent history. Values that sounded recently therefore get
//! *more* likely, not less: the selector reinforces habits so the ambient
//! voices settle into drones. This is the opposite of an anti-repetition
//! filter.

use fastrand::Rng;

use crate::error::{MemoriaError, Result};

/// Distinct pool values paired with their weight (`count in history + 1`).
///
/// Values keep the order of their first appearance in `pool`.
pub fn weights<'p, 'h, V, H>(pool: &'p [V], history: H) -> Vec<(&'p V, usize)>
where
    V: PartialEq + 'h,
    H: IntoIterator<Item = &'h V>,
{
    let mut weighted: Vec<(&'p V, usize)> = Vec::with_capacity(pool.len());
    for value in pool {
        if !weighted.iter().any(|(v, _)| *v == value) {
            weighted.push((value, 1));
        }
    }
    for past in history {
        if let Some(entry) = weighted.iter_mut().find(|(v, _)| *v == past) {
            entry.1 += 1;
        }
    }
    weighted
}

/// Pick a value from `pool`, biased towards what `history` already holds.
///
/// An empty history gives a uniform draw over the pool's elements. An empty
/// pool is an `InvalidArgument` error.
pub fn select<'p, 'h, V, H>(pool: &'p [V], history: H, rng: &mut Rng) -> Result<&'p V>
where
    V: PartialEq + 'h,
    H: IntoIterator<Item = &'h V>,
{
    if pool.is_empty() {
        return Err(MemoriaError::InvalidArgument("cannot select from an empty pool".into()));
    }

    let mut history = history.into_iter().peekable();
    if history.peek().is_none() {
        return Ok(&pool[rng.usize(..pool.len())]);
    }

    let weighted = weights(pool, history);
    let total: usize = weighted.iter().map(|(_, w)| w).sum();
    let mut roll = rng.usize(..total);
    for (value, weight) in &weighted {
        if roll < *weight {
            return Ok(*value);
        }
        roll -= weight;
    }

    // Unreachable: roll < total
    Ok(weighted[weighted.len() - 1].0)
}

/// Probability that `select` returns `value` for a non-empty history
pub fn probability<'h, V, H>(pool: &[V], history: H, value: &V) -> f64
where
    V: PartialEq + 'h,
    H: IntoIterator<Item = &'h V>,
{
    let weighted = weights(pool, history);
    let total: usize = weighted.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return 0.0;
    }
    weighted
        .iter()
        .find(|(v, _)| *v == value)
        .map_or(0.0, |(_, w)| *w as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_is_invalid() {
        let mut rng = Rng::with_seed(1);
        let pool: [&str; 0] = [];
        let result = select(&pool, &["C4"], &mut rng);
        assert!(matches!(result, Err(MemoriaError::InvalidArgument(_))));
    }

    #[test]
    fn test_select_returns_pool_member() {
        let mut rng = Rng::with_seed(7);
        let pool = ["C4", "D4", "E4", "G4", "A4"];
        let history = ["C4", "F4", "C4", "B2"];
        for _ in 0..1000 {
            let choice = select(&pool, &history, &mut rng).unwrap();
            assert!(pool.contains(choice));
        }
    }

    #[test]
    fn test_weights_are_laplace_smoothed() {
        let pool = ["C4", "D4", "C4", "E4"];
        let history = ["C4", "C4", "E4", "G4"];
        let w = weights(&pool, &history);
        assert_eq!(w, vec![(&"C4", 3), (&"D4", 1), (&"E4", 2)]);
    }

    #[test]
    fn test_probability_formula() {
        let pool = ["C4", "D4"];
        let history = ["C4", "C4"];
        assert!((probability(&pool, &history, &"C4") - 0.75).abs() < 1e-12);
        assert!((probability(&pool, &history, &"D4") - 0.25).abs() < 1e-12);
        assert_eq!(probability(&pool, &history, &"E4"), 0.0);
    }

    #[test]
    fn test_weighted_draw_matches_probability() {
        let mut rng = Rng::with_seed(42);
        let pool = ["C4", "D4"];
        let history = ["C4", "C4"];
        let trials = 20_000;
        let c4 = (0..trials)
            .filter(|_| *select(&pool, &history, &mut rng).unwrap() == "C4")
            .count();
        let freq = c4 as f64 / trials as f64;
        assert!((freq - 0.75).abs() < 0.02, "C4 frequency {freq}");
    }

    #[test]
    fn test_empty_history_is_uniform() {
        let mut rng = Rng::with_seed(1234);
        let pool = [60u8, 62, 64, 67, 69];
        let trials = 20_000usize;
        let mut counts = [0usize; 5];
        let empty: [u8; 0] = [];
        for _ in 0..trials {
            let choice = select(&pool, &empty, &mut rng).unwrap();
            let idx = pool.iter().position(|p| p == choice).unwrap();
            counts[idx] += 1;
        }

        let expected = trials as f64 / pool.len() as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        // df = 4, p = 0.0001 critical value is ~23.5
        assert!(chi_square < 23.5, "chi-square {chi_square}, counts {counts:?}");
    }

    #[test]
    fn test_seeded_selection_is_deterministic() {
        let pool = ["C4", "D4", "E4"];
        let history = ["D4", "E4", "E4"];
        let run = |seed| {
            let mut rng = Rng::with_seed(seed);
            (0..32)
                .map(|_| *select(&pool, &history, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
