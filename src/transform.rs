//! Per-column transformer (spec §4.3).
//!
//! Policy flags are tagged enums, not raw integers, per the REDESIGN
//! FLAGS: `ImputePolicy::PassThroughSentinel` (the spec's `impute = 3`)
//! is a distinct variant from `ImputePolicy::ZeroFill` (`impute = 0`) and
//! must never be collapsed into it.

use crate::error::{GenoError, Result};

const SD_EPS: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputePolicy {
    /// `impute = 0`: pass-through; missing coerced to 0 for numeric use.
    ZeroFill,
    /// `impute = 1`: missing replaced by `2 * af` (computed from the
    /// subset when `af` is zero on entry).
    MeanImpute,
    /// `impute = 3`: pass-through, keep `3` as a sentinel for callers
    /// (e.g. the GRM path) that handle missingness explicitly.
    PassThroughSentinel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `direction = 1`: no flip.
    Forward,
    /// `direction = 0`: `g <- 2 - g`, applied after imputation.
    Flip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// `scale = 0`: no scaling.
    None,
    /// `scale = 1`: subtract subset mean, divide by subset SD.
    Standardize,
    /// `scale = 2`: reserved for caller-pre-encoded dominance dosages;
    /// the transformer applies the same arithmetic as `Standardize`
    /// (spec §9 open question, resolved in DESIGN.md).
    Dominance,
}

/// Applies the selection/imputation/flip/scale pipeline to one decoded
/// column, restricted to the row subset `rws` (one-based indices into the
/// decoded column).
///
/// Order of operations: missing-policy -> direction-flip -> scale, per
/// spec §4.3. If every selected call is missing, the output is all-zero
/// regardless of other flags.
pub fn transform_column(
    g: &[f64],
    rws: &[usize],
    impute: ImputePolicy,
    direction: Direction,
    scale: Scale,
    af_hint: f64,
) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(rws.len());
    for &r in rws {
        if r == 0 || r > g.len() {
            return Err(GenoError::shape(format!(
                "row index {r} out of range 1..={}",
                g.len()
            )));
        }
        out.push(g[r - 1]);
    }

    let n_miss = out.iter().filter(|&&x| x >= 3.0).count();
    if n_miss == out.len() {
        return Ok(vec![0.0; out.len()]);
    }

    let af = match impute {
        ImputePolicy::MeanImpute => {
            if af_hint != 0.0 {
                af_hint
            } else {
                subset_af(&out)
            }
        }
        _ => af_hint,
    };

    for x in out.iter_mut() {
        if *x >= 3.0 {
            *x = match impute {
                ImputePolicy::ZeroFill => 0.0,
                ImputePolicy::MeanImpute => 2.0 * af,
                ImputePolicy::PassThroughSentinel => 3.0,
            };
        }
    }

    if direction == Direction::Flip {
        for x in out.iter_mut() {
            if *x != 3.0 {
                *x = 2.0 - *x;
            }
        }
    }

    match scale {
        Scale::None => {}
        Scale::Standardize | Scale::Dominance => standardize(&mut out),
    }

    Ok(out)
}

/// Allele frequency over non-missing entries of an already row-subset
/// vector, per spec §4.3's fallback when `af` is not supplied.
fn subset_af(x: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in x {
        if v < 3.0 {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        sum / (2.0 * n as f64)
    }
}

/// Scaling semantics from spec §4.3.1: center on non-missing mean, zero
/// missing, divide by sample SD (n-1 denominator) if `sd > 1e-5`,
/// otherwise the column collapses to all-zero.
fn standardize(x: &mut [f64]) {
    let non_missing: Vec<f64> = x.iter().copied().filter(|&v| v < 3.0).collect();
    let n = non_missing.len();
    if n == 0 {
        x.fill(0.0);
        return;
    }
    let mean = non_missing.iter().sum::<f64>() / n as f64;

    for v in x.iter_mut() {
        if *v < 3.0 {
            *v -= mean;
        } else {
            *v = 0.0;
        }
    }

    if n < 2 {
        x.fill(0.0);
        return;
    }
    let var = x.iter().map(|v| v * v).sum::<f64>() / (n as f64 - 1.0);
    let sd = var.sqrt();
    if sd > SD_EPS {
        for v in x.iter_mut() {
            *v /= sd;
        }
    } else {
        x.fill(0.0);
    }
}
