//! Explicit on-disk format enum (spec §6, REDESIGN FLAGS).
//!
//! The filename-suffix sniff from the original system is confined to
//! [`GenoFormat::from_path`], a thin opt-in helper for front-ends; the
//! reader itself always takes an explicit `GenoFormat`.

use std::path::Path;

use crate::error::{GenoError, Result};

/// 3-byte magic prefix used by `.bed`-suffixed files, per spec §3.
pub const BED_MAGIC: [u8; 3] = [0x6C, 0x1B, 0x01];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenoFormat {
    /// 3-byte magic prefix present.
    Bed,
    /// No prefix.
    Raw,
}

impl GenoFormat {
    /// Suffix-based detection, kept out of the reader's hot path per the
    /// REDESIGN FLAGS: `.bed` implies `Bed`, `.raw` implies `Raw`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "bed" => Some(GenoFormat::Bed),
            "raw" => Some(GenoFormat::Raw),
            _ => None,
        }
    }

    pub fn header_len(self) -> u64 {
        match self {
            GenoFormat::Bed => BED_MAGIC.len() as u64,
            GenoFormat::Raw => 0,
        }
    }
}

/// `bytes_per_col = ceil(n_rows / 4)`, exact per spec §3's invariant.
pub fn bytes_per_col(n_rows: usize) -> usize {
    (n_rows + 3) / 4
}

/// Validates the magic prefix (when present) and that the remaining file
/// length is an exact multiple of `bytes_per_col`.
pub fn validate_layout(
    format: GenoFormat,
    magic: Option<&[u8]>,
    file_len: u64,
    bytes_per_col: usize,
    n_cols: usize,
) -> Result<()> {
    if format == GenoFormat::Bed {
        let magic = magic.ok_or_else(|| GenoError::format("missing magic prefix in .bed file"))?;
        if magic != BED_MAGIC {
            return Err(GenoError::format(format!(
                "bad magic bytes: expected {:?}, found {:?}",
                BED_MAGIC, magic
            )));
        }
    }
    let expected = format.header_len() + (bytes_per_col as u64) * (n_cols as u64);
    if file_len != expected {
        return Err(GenoError::format(format!(
            "file length {file_len} does not match expected {expected} \
             (header {} + {n_cols} cols * {bytes_per_col} bytes/col)",
            format.header_len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_col_ceils() {
        assert_eq!(bytes_per_col(4), 1);
        assert_eq!(bytes_per_col(5), 2);
        assert_eq!(bytes_per_col(8), 2);
        assert_eq!(bytes_per_col(0), 0);
    }

    #[test]
    fn suffix_detection() {
        assert_eq!(GenoFormat::from_path("foo.bed"), Some(GenoFormat::Bed));
        assert_eq!(GenoFormat::from_path("foo.raw"), Some(GenoFormat::Raw));
        assert_eq!(GenoFormat::from_path("foo.txt"), None);
    }

    #[test]
    fn validate_layout_rejects_bad_magic() {
        let err = validate_layout(GenoFormat::Bed, Some(&[0, 0, 0]), 103, 1, 100);
        assert!(err.is_err());
    }

    #[test]
    fn validate_layout_rejects_bad_length() {
        let err = validate_layout(GenoFormat::Raw, None, 99, 1, 100);
        assert!(err.is_err());
    }

    #[test]
    fn validate_layout_accepts_good_bed() {
        let n_cols = 10usize;
        let bpc = bytes_per_col(4);
        let len = 3 + (bpc * n_cols) as u64;
        assert!(validate_layout(GenoFormat::Bed, Some(&BED_MAGIC), len, bpc, n_cols).is_ok());
    }
}
