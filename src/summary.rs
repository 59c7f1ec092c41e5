//! Per-variant summary engine (spec §4.4).

use rayon::prelude::*;

use crate::codec::decode_int;
use crate::error::{GenoError, Result};
use crate::reader::GenoReader;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnStats {
    pub n0: usize,
    pub n1: usize,
    pub n2: usize,
    pub n_miss: usize,
    pub af: f64,
}

impl ColumnStats {
    fn from_codes(codes: &[u8]) -> Self {
        let mut s = ColumnStats::default();
        for &c in codes {
            match c {
                0 => s.n0 += 1,
                1 => s.n1 += 1,
                2 => s.n2 += 1,
                3 => s.n_miss += 1,
                _ => unreachable!("codec guarantees codes in {{0,1,2,3}}"),
            }
        }
        let n_used = codes.len();
        s.af = if s.n_miss < n_used {
            (s.n1 as f64 + 2.0 * s.n2 as f64) / (2.0 * (n_used - s.n_miss) as f64)
        } else {
            0.0
        };
        s
    }
}

fn gather_rows(n_rows: usize, bytes_per_col: usize, raw: &[u8], rws: &[usize]) -> Result<Vec<u8>> {
    let codes = decode_int(raw, n_rows);
    let _ = bytes_per_col;
    let mut out = Vec::with_capacity(rws.len());
    for &r in rws {
        if r == 0 || r > codes.len() {
            return Err(GenoError::shape(format!(
                "row index {r} out of range 1..={}",
                codes.len()
            )));
        }
        out.push(codes[r - 1]);
    }
    Ok(out)
}

/// Serial summary: one column read per iteration, in order.
pub fn summary(reader: &mut GenoReader, n_rows: usize, cls: &[usize], rws: &[usize]) -> Result<Vec<ColumnStats>> {
    let bpc = reader.bytes_per_col();
    let mut out = Vec::with_capacity(cls.len());
    for &col in cls {
        let raw = reader.read_column(col)?;
        let grws = gather_rows(n_rows, bpc, &raw, rws)?;
        out.push(ColumnStats::from_codes(&grws));
    }
    Ok(out)
}

/// Parallel summary: a fresh handle is cloned for each rayon worker, and
/// every iteration seeks absolutely, per spec §5. `ncores` sizes the worker
/// pool (`0` means "use all logical cores", per spec §6).
pub fn summary_parallel(
    reader: &GenoReader,
    n_rows: usize,
    cls: &[usize],
    rws: &[usize],
    ncores: usize,
) -> Result<Vec<ColumnStats>> {
    let pool = crate::build_pool(ncores)?;
    pool.install(|| {
        cls.par_iter()
            .map(|&col| -> Result<ColumnStats> {
                let mut local = reader.try_clone()?;
                let raw = local.read_column(col)?;
                let grws = gather_rows(n_rows, local.bytes_per_col(), &raw, rws)?;
                Ok(ColumnStats::from_codes(&grws))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::GenoFormat;
    use std::io::Write;

    fn write_fixture(cols: &[&[u8]]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&crate::format::BED_MAGIC).unwrap();
        for col in cols {
            f.write_all(col).unwrap();
        }
        f.flush().unwrap();
        f
    }

    #[test]
    fn counts_and_af_match_scenario_3() {
        // codes [0,1,2,3] packed: 00 01 10 11 -> table maps raw bits
        // 00->0,01->3,10->1,11->2 so to get decoded codes [0,1,2,3] we need
        // raw bit-pairs mapping through CODE_TABLE=[0,3,1,2] inverse:
        // code 0 <- bits 00, code 1 <- bits 10, code 2 <- bits 11, code 3 <- bits 01
        let raw_byte = 0b11_10_01_00u8;
        let f = write_fixture(&[&[raw_byte]]);
        let mut reader = GenoReader::open(f.path(), GenoFormat::Bed, 4, 1).unwrap();
        let stats = summary(&mut reader, 4, &[1], &[1, 2, 3, 4]).unwrap();
        assert_eq!(stats[0].n0, 1);
        assert_eq!(stats[0].n1, 1);
        assert_eq!(stats[0].n2, 1);
        assert_eq!(stats[0].n_miss, 1);
        assert!((stats[0].af - 0.5).abs() < 1e-12);
    }

    #[test]
    fn counts_sum_to_n_used() {
        let raw_byte = 0b11_10_01_00u8;
        let f = write_fixture(&[&[raw_byte]]);
        let mut reader = GenoReader::open(f.path(), GenoFormat::Bed, 4, 1).unwrap();
        let stats = summary(&mut reader, 4, &[1], &[1, 2, 3, 4]).unwrap();
        let s = &stats[0];
        assert_eq!(s.n0 + s.n1 + s.n2 + s.n_miss, 4);
    }

    #[test]
    fn serial_and_parallel_agree() {
        let raw_byte = 0b11_10_01_00u8;
        let f = write_fixture(&[&[raw_byte], &[raw_byte]]);
        let reader = GenoReader::open(f.path(), GenoFormat::Bed, 4, 2).unwrap();
        let mut serial_reader = GenoReader::open(f.path(), GenoFormat::Bed, 4, 2).unwrap();
        let serial = summary(&mut serial_reader, 4, &[1, 2], &[1, 2, 3, 4]).unwrap();
        let parallel = summary_parallel(&reader, 4, &[1, 2], &[1, 2, 3, 4], 2).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn ncores_zero_falls_back_to_all_cores() {
        let raw_byte = 0b11_10_01_00u8;
        let f = write_fixture(&[&[raw_byte]]);
        let reader = GenoReader::open(f.path(), GenoFormat::Bed, 4, 1).unwrap();
        let stats = summary_parallel(&reader, 4, &[1], &[1, 2, 3, 4], 0).unwrap();
        assert_eq!(stats[0].n0 + stats[0].n1 + stats[0].n2 + stats[0].n_miss, 4);
    }
}
