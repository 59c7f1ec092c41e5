//! Polygenic score accumulator (spec §4.6).
//!
//! Generalizes the teacher's per-thread-buffer-then-merge concurrency
//! shape (`calc_kinship`'s `kinship_bufs` reduced into
//! `common_kinship_matrix`) using `rayon`'s `fold`/`reduce` instead of a
//! hand-rolled channel/mutex worker pool.

use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::codec::decode_real;
use crate::error::{GenoError, Result};
use crate::reader::GenoReader;
use crate::transform::{transform_column, Direction, ImputePolicy, Scale};

/// Computes `prs[nr, nprs] += sum_over_cls( g . s[col, :] )`.
///
/// `s` is `[nc, nprs]` effect weights, one row per column in `cls`. Columns
/// with a zero weight across all traits still get read (to keep the
/// per-column policy identical across calls, which the score-additivity
/// property in spec §8 depends on) but contribute nothing.
pub fn score(
    reader: &GenoReader,
    n_rows: usize,
    rws: &[usize],
    cls: &[usize],
    direction: &[Direction],
    af: &[f64],
    impute: ImputePolicy,
    s: &ArrayView2<f64>,
    ncores: usize,
) -> Result<Array2<f64>> {
    if cls.len() != direction.len() || cls.len() != af.len() || cls.len() != s.nrows() {
        return Err(GenoError::shape(
            "cls/direction/af/s row counts must all match",
        ));
    }
    let nr = rws.len();
    let nprs = s.ncols();

    let pool = crate::build_pool(ncores)?;
    let partial = pool.install(|| {
        cls.par_iter()
            .enumerate()
            .try_fold(
                || Array2::<f64>::zeros((nr, nprs)),
                |mut acc, (i, &col)| -> Result<Array2<f64>> {
                    let mut local = reader.try_clone()?;
                    let raw = local.read_column(col)?;
                    let g = decode_real(&raw, n_rows);
                    let g = transform_column(
                        &g,
                        rws,
                        impute,
                        direction[i],
                        Scale::None,
                        af[i],
                    )?;
                    let weights = s.row(i);
                    for (j, &w) in weights.iter().enumerate() {
                        if w != 0.0 {
                            for (row_idx, &gv) in g.iter().enumerate() {
                                acc[[row_idx, j]] += gv * w;
                            }
                        }
                    }
                    Ok(acc)
                },
            )
            .try_reduce(
                || Array2::<f64>::zeros((nr, nprs)),
                |mut a, b| {
                    a += &b;
                    Ok(a)
                },
            )
    })?;

    Ok(partial)
}
