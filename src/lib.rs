// -*- mode: Rust; rust-indent-unit: 2; -*-
/// @brief Tools for working with PLINK binary genotype files (`.bed`).
///
/// From
/// https://www.cog-genomics.org/plink/1.9/formats#bed:
///
/// The PLINK binary biallelic genotype table stores one record per variant
/// as a column of 2-bit-packed genotype calls, four samples per byte, with
/// a fixed three-byte magic prefix identifying the file as SNP-major. This
/// crate operates on that packed representation directly: columns are read
/// on demand by absolute seek rather than decoded wholesale into memory, so
/// that variant counts far larger than available RAM are tractable.
///
/// The modules below implement, in order from the packed bytes upward: the
/// bit-pair codec, the file-format header/layout rules, a column-at-a-time
/// reader, the per-column transform pipeline (missingness, direction,
/// scale), a per-variant summary engine, a genomic relationship matrix
/// (GRM) builder, a polygenic score accumulator, a matrix-free ridge
/// solver, a set-statistic permutation engine, and a dense symmetric
/// eigensolver binding.
pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod transform;

pub mod summary;

pub mod grm;
pub mod ridge;
pub mod score;

pub mod eigen;
pub mod permute;

pub use error::{GenoError, Result};
pub use format::GenoFormat;
pub use reader::GenoReader;
pub use transform::{Direction, ImputePolicy, Scale};

/// Builds a scoped `rayon` thread pool for one kernel call, per spec §5's
/// caller-supplied `ncores` (`0` means "use all logical cores", sized from
/// `num_cpus::get()` the way the teacher's `calc_kinship` sizes its buffer
/// pool).
pub(crate) fn build_pool(ncores: usize) -> Result<rayon::ThreadPool> {
    let threads = if ncores == 0 { num_cpus::get() } else { ncores };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| GenoError::format(format!("failed to build thread pool: {e}")))
}
