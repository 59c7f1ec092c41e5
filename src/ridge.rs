//! Matrix-free Gauss-Seidel-with-residual-update ridge solver (spec §4.7).
//!
//! Strictly sequential across columns by algorithmic necessity: each
//! `s_j` update depends on the residual produced by the previous column's
//! update (spec §5). Only the per-column vector operations (dot product,
//! norm) are candidates for parallelism, and at the column sizes this
//! solver operates on, a plain loop already saturates memory bandwidth, so
//! none is applied here — matching the teacher's own preference for
//! direct loops over abstraction where it doesn't buy anything.

use crate::codec::decode_real;
use crate::error::{GenoError, Result};
use crate::reader::GenoReader;

pub struct RidgeResult {
    pub s: Vec<f64>,
    pub e: Vec<f64>,
    pub iterations: usize,
    pub last_delta: f64,
}

struct ColumnCache {
    w: Vec<f64>,
    dww: f64,
}

/// Re-reads and re-standardizes column `col`'s row subset using
/// caller-supplied `mean`/`sd` (not subset-computed, per spec §4.7's
/// initialization step), returning the standardized vector restricted to
/// `rws` and its squared norm.
fn load_standardized_column(
    reader: &mut GenoReader,
    n_rows: usize,
    col: usize,
    rws: &[usize],
    mean: f64,
    sd: f64,
) -> Result<ColumnCache> {
    let raw = reader.read_column(col)?;
    let g = decode_real(&raw, n_rows);
    let mut w = Vec::with_capacity(rws.len());
    for &r in rws {
        if r == 0 || r > g.len() {
            return Err(GenoError::shape(format!(
                "row index {r} out of range 1..={}",
                g.len()
            )));
        }
        let v = g[r - 1];
        let centered = if v < 3.0 { (v - mean) } else { 0.0 };
        w.push(if sd > 0.0 { centered / sd } else { 0.0 });
    }
    let dww = w.iter().map(|v| v * v).sum();
    Ok(ColumnCache { w, dww })
}

/// Solves `(W^T W + Lambda) s = W^T y` without materializing `W^T W`.
///
/// `mean`/`sd` are caller-supplied per-column standardization parameters
/// (one entry per `cls`), `lambda` the per-column ridge penalty, `y` the
/// phenotype restricted to the full sample range (indexed by `rws`), `s0`
/// the initial coefficients (zero entries get seeded from the data per
/// spec §4.7's initialization rule).
pub fn ridge_solve(
    reader: &mut GenoReader,
    n_rows: usize,
    rws: &[usize],
    cls: &[usize],
    mean: &[f64],
    sd: &[f64],
    lambda: &[f64],
    y: &[f64],
    mut s: Vec<f64>,
    max_it: usize,
    tol: f64,
) -> Result<RidgeResult> {
    let nc = cls.len();
    if mean.len() != nc || sd.len() != nc || lambda.len() != nc || s.len() != nc {
        return Err(GenoError::shape(
            "mean/sd/lambda/s must all have length equal to cls",
        ));
    }
    if y.len() < *rws.iter().max().unwrap_or(&0) {
        return Err(GenoError::shape("y is shorter than the row subset needs"));
    }

    let n_total = y.len();
    let mut e = vec![0.0; n_total];
    for &r in rws {
        e[r - 1] = y[r - 1];
    }

    // Every column's contribution (freshly seeded or already nonzero from a
    // warm-started s0) must come out of e here, so the `e = y - sum_j w_j
    // s_j` invariant (spec's Data Model section) holds from the first main
    // loop sweep onward regardless of how s was initialized.
    let mut dww = vec![0.0; nc];
    for j in 0..nc {
        let cache = load_standardized_column(reader, n_rows, cls[j], rws, mean[j], sd[j])?;
        dww[j] = cache.dww;
        if s[j] == 0.0 && cache.dww > 0.0 {
            let wte: f64 = rws
                .iter()
                .zip(cache.w.iter())
                .map(|(&r, &wv)| wv * e[r - 1])
                .sum();
            s[j] = (wte / cache.dww) / nc as f64;
        }
        for (&r, &wv) in rws.iter().zip(cache.w.iter()) {
            e[r - 1] -= wv * s[j];
        }
    }

    let mut iterations = 0;
    let mut last_delta = f64::INFINITY;
    let mut s_old = s.clone();

    for _it in 1..=max_it {
        iterations += 1;
        for j in 0..nc {
            let cache = load_standardized_column(reader, n_rows, cls[j], rws, mean[j], sd[j])?;
            let lhs = cache.dww + lambda[j];
            let rhs: f64 = rws
                .iter()
                .zip(cache.w.iter())
                .map(|(&r, &wv)| wv * e[r - 1])
                .sum::<f64>()
                + cache.dww * s[j];
            let s_new = if lhs != 0.0 { rhs / lhs } else { s[j] };
            let delta = s_new - s[j];
            for (&r, &wv) in rws.iter().zip(cache.w.iter()) {
                e[r - 1] -= wv * delta;
            }
            s[j] = s_new;
        }

        let sq_change: f64 = s
            .iter()
            .zip(s_old.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        last_delta = sq_change / (nc as f64).sqrt();
        log::trace!("ridge iteration {iterations}: delta={last_delta}");
        if last_delta < tol {
            break;
        }
        s_old.copy_from_slice(&s);
    }

    Ok(RidgeResult {
        s,
        e,
        iterations,
        last_delta,
    })
}
