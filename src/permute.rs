//! Set-statistic permutation engine (spec §4.8).
//!
//! Independent of I/O: operates purely on the per-marker statistic
//! vector. Multi-threaded over the outer set loop; each worker draws from
//! its own RNG stream (spec §5), grounded in the per-call
//! `rand::thread_rng()` pattern `denishdholaria-bijmantra`'s
//! `matrix.rs::calculate_eigenvalues` uses for its power-iteration seed.

use rand::Rng;
use rayon::prelude::*;

use crate::error::{GenoError, Result};

/// For each set `i`, draws `np` random contiguous windows of size
/// `msets[i]` from `stat` and counts how many window sums strictly
/// exceed `setstat[i]`.
///
/// `max_start = M - max(msets) - 1` is shared across every set
/// (spec §9's preserved-behavior open question): small sets draw from the
/// same, not narrower, window range as the largest set.
pub fn permute_sets(
    stat: &[f64],
    msets: &[usize],
    setstat: &[f64],
    np: usize,
    ncores: usize,
) -> Result<Vec<usize>> {
    if msets.len() != setstat.len() {
        return Err(GenoError::shape("msets and setstat must have equal length"));
    }
    let m = stat.len();
    let max_k = *msets.iter().max().unwrap_or(&0);
    if m < max_k + 1 {
        return Err(GenoError::shape(format!(
            "stat has {m} markers, too few for the largest set size {max_k}"
        )));
    }
    let max_start = m - max_k - 1;
    if max_start == 0 {
        return Err(GenoError::shape(
            "no valid starting positions: M - max(msets) - 1 == 0",
        ));
    }

    // Prefix sums let each draw compute a window sum in O(1).
    let mut prefix = vec![0.0f64; m + 1];
    for i in 0..m {
        prefix[i + 1] = prefix[i] + stat[i];
    }

    let pool = crate::build_pool(ncores)?;
    pool.install(|| {
        (0..msets.len())
            .into_par_iter()
            .map(|i| -> Result<usize> {
                let k = msets[i];
                let observed = setstat[i];
                let mut rng = rand::thread_rng();
                let mut count = 0usize;
                for _ in 0..np {
                    let k1 = 1 + rng.gen_range(0..max_start);
                    let window_sum = prefix[k1 - 1 + k] - prefix[k1 - 1];
                    if window_sum > observed {
                        count += 1;
                    }
                }
                Ok(count)
            })
            .collect()
    })
}
