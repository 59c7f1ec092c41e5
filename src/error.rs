//! Error taxonomy for the genotype engine.
//!
//! `Io` and `Format` and `Shape` are fatal: the kernel that hit them aborts
//! and hands control back to the caller (spec §7). Numeric degeneracies
//! (zero-variance or all-missing columns) are not represented here at all —
//! they are absorbed in-band as all-zero output and only logged at `debug`.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, GenoError>;

#[derive(Debug, thiserror::Error)]
pub enum GenoError {
    #[error("io error reading {path}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("io error: {0}")]
    IoPlain(#[from] std::io::Error),

    #[error("format error: {0}")]
    Format(String),

    #[error("shape error: {0}")]
    Shape(String),
}

impl GenoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenoError::Io {
            source,
            path: path.into(),
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        GenoError::Format(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        GenoError::Shape(msg.into())
    }
}
