//! GRM builder (spec §4.5).
//!
//! Generalizes the teacher's `calc_partial_kinship` (a hand-indexed BLAS
//! `dsyrk`-style triple loop) into blocked `ndarray` panels: each block of
//! up to `msize` columns is loaded and standardized into `W`, then
//! `G += W * W^T` on the upper triangle via `ndarray`'s `.dot()`. The
//! teacher's "mirror upper to lower after dividing by trace/N" finalization
//! step is preserved exactly (`mirror_and_scale_kinship` in spirit).

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::codec::decode_real;
use crate::error::{GenoError, Result};
use crate::reader::GenoReader;
use crate::transform::{transform_column, Direction, ImputePolicy, Scale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrmModel {
    Additive,
    Dominance,
    EpistasisProduct,
    EpistasisHadamard,
}

pub struct GrmConfig {
    pub model: GrmModel,
    pub msize: usize,
    pub direction: Vec<Direction>,
    pub af: Vec<f64>,
}

fn load_panel(
    reader: &GenoReader,
    n_rows: usize,
    cls: &[usize],
    rws: &[usize],
    direction: &[Direction],
    af: &[f64],
    scale: Scale,
) -> Result<Array2<f64>> {
    let columns: Result<Vec<Vec<f64>>> = cls
        .par_iter()
        .enumerate()
        .map(|(i, &col)| -> Result<Vec<f64>> {
            let mut local = reader.try_clone()?;
            let raw = local.read_column(col)?;
            let g = decode_real(&raw, n_rows);
            transform_column(
                &g,
                rws,
                ImputePolicy::MeanImpute,
                direction[i],
                scale,
                af[i],
            )
        })
        .collect();
    let columns = columns?;
    let nr = rws.len();
    let ncw = columns.len();
    let mut w = Array2::<f64>::zeros((nr, ncw));
    for (j, col) in columns.into_iter().enumerate() {
        for (i, v) in col.into_iter().enumerate() {
            w[[i, j]] = v;
        }
    }
    Ok(w)
}

/// Accumulates the upper triangle of `g += w * w^T` in place.
fn accumulate_upper(g: &mut Array2<f64>, w: ArrayView2<f64>) {
    let update = w.dot(&w.t());
    let n = g.nrows();
    for i in 0..n {
        for j in i..n {
            g[[i, j]] += update[[i, j]];
        }
    }
}

/// Builds the normalized GRM for `cls1` alone (additive, dominance,
/// epistasis_hadamard) or `cls1 x cls2` combined elementwise
/// (epistasis_product), per spec §4.5.
pub fn build_grm(
    reader: &GenoReader,
    n_rows: usize,
    rws: &[usize],
    cls1: &[usize],
    cls2: Option<&[usize]>,
    cfg: &GrmConfig,
    ncores: usize,
) -> Result<Array2<f64>> {
    if rws.is_empty() {
        return Err(GenoError::shape("row subset must be non-empty"));
    }
    if cls1.is_empty() {
        return Err(GenoError::shape("column subset must be non-empty"));
    }
    if cfg.direction.len() != cls1.len() || cfg.af.len() != cls1.len() {
        return Err(GenoError::shape(
            "direction/af vectors must match cls1 length",
        ));
    }
    if matches!(cfg.model, GrmModel::EpistasisProduct)
        && cls2.map_or(true, |c| c.len() != cls1.len())
    {
        return Err(GenoError::shape(
            "epistasis_product requires cls2 with the same length as cls1",
        ));
    }

    let n_used = rws.len();
    let mut g = Array2::<f64>::zeros((n_used, n_used));
    let msize = cfg.msize.max(1);

    let scale = match cfg.model {
        GrmModel::Dominance => Scale::Dominance,
        _ => Scale::Standardize,
    };

    let pool = crate::build_pool(ncores)?;
    pool.install(|| -> Result<()> {
        let mut start = 0;
        while start < cls1.len() {
            let end = (start + msize).min(cls1.len());
            let block1 = &cls1[start..end];
            let dir_block = &cfg.direction[start..end];
            let af_block = &cfg.af[start..end];

            log::debug!("grm block [{start}, {end}) of {} columns", cls1.len());

            let mut w1 = load_panel(reader, n_rows, block1, rws, dir_block, af_block, scale)?;

            // epistasis_product combines two independently standardized panels
            // via an elementwise product before the rank-k update; every other
            // model (including epistasis_hadamard) runs on a single panel, with
            // epistasis_hadamard's distinguishing step deferred to the disk
            // writer, per spec §4.5.
            if cfg.model == GrmModel::EpistasisProduct {
                let cls2 = cls2.unwrap();
                let block2 = &cls2[start..end];
                let w2 = load_panel(reader, n_rows, block2, rws, dir_block, af_block, scale)?;
                w1 = w1 * &w2;
            }

            accumulate_upper(&mut g, w1.view());
            start = end;
        }
        Ok(())
    })?;

    finalize_grm(&mut g, n_used);
    Ok(g)
}

/// Divides by `trace(G)/N_used` and mirrors upper to lower, per spec §4.5.
fn finalize_grm(g: &mut Array2<f64>, n_used: usize) {
    let trace: f64 = (0..n_used).map(|i| g[[i, i]]).sum();
    let norm = trace / n_used as f64;
    if norm == 0.0 {
        log::debug!("grm trace normalization degenerate (trace=0), leaving matrix zero");
        return;
    }
    for i in 0..n_used {
        for j in i..n_used {
            g[[i, j]] /= norm;
            g[[j, i]] = g[[i, j]];
        }
    }
}

/// Writes GRM columns to `out` as IEEE-754 doubles, native byte order,
/// per spec §6. For `GrmModel::EpistasisHadamard`, each written value is
/// squared before writing.
pub fn write_grm(out: &mut impl std::io::Write, g: &ArrayView2<f64>, hadamard: bool) -> Result<()> {
    let n = g.nrows();
    for j in 0..n {
        for i in 0..n {
            let v = g[[i, j]];
            let v = if hadamard { v * v } else { v };
            out.write_all(&v.to_ne_bytes())
                .map_err(GenoError::IoPlain)?;
        }
    }
    Ok(())
}
