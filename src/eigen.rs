//! Dense symmetric eigensolver binding (spec §4.9).
//!
//! Thin wrapper over `nalgebra::SymmetricEigen`, grounded in the
//! `nalgebra` dependency the TCCON `ggg-rs` pack repo carries for its own
//! dense linear algebra. The teacher repo has no eigensolver of its own;
//! this module is pure addition, built the way the pack's nalgebra user
//! structures a thin binding: convert in, call the library routine,
//! convert the result back out in the shape callers expect.

use nalgebra::{DMatrix, SymmetricEigen};

use crate::error::{GenoError, Result};

/// Eigendecomposes a dense symmetric matrix given as row-major `Vec<f64>`
/// of size `n*n`. Returns `(eigenvalues, eigenvectors)` with eigenvalues
/// ascending and eigenvectors as columns of a row-major `n*n` buffer,
/// per spec §4.9.
///
/// Only the lower triangle of `a` is read, matching
/// `nalgebra::SymmetricEigen`'s own convention; callers that already
/// maintain a fully mirrored matrix (e.g. `grm::build_grm`'s output) may
/// pass it unchanged.
pub fn symmetric_eigen(a: &[f64], n: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if a.len() != n * n {
        return Err(GenoError::shape(format!(
            "matrix buffer has {} entries, expected {}",
            a.len(),
            n * n
        )));
    }
    let m = DMatrix::from_row_slice(n, n, a);
    let eig = SymmetricEigen::new(m);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].partial_cmp(&eig.eigenvalues[j]).unwrap());

    let mut values = vec![0.0; n];
    let mut vectors = vec![0.0; n * n];
    for (rank, &src) in order.iter().enumerate() {
        values[rank] = eig.eigenvalues[src];
        for row in 0..n {
            vectors[row * n + rank] = eig.eigenvectors[(row, src)];
        }
    }
    Ok((values, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_has_unit_eigenvalues() {
        let n = 3;
        let mut a = vec![0.0; n * n];
        for i in 0..n {
            a[i * n + i] = 1.0;
        }
        let (values, _vectors) = symmetric_eigen(&a, n).unwrap();
        for &v in &values {
            assert_relative_eq!(v, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn eigenvalues_are_ascending() {
        let a = vec![2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0];
        let (values, _) = symmetric_eigen(&a, 3).unwrap();
        for w in values.windows(2) {
            assert!(w[0] <= w[1] + 1e-9);
        }
    }

    #[test]
    fn reconstructs_original_matrix() {
        // A = V diag(lambda) V^T should recover the input for a symmetric A.
        let a = vec![2.0, 1.0, 1.0, 2.0];
        let (values, vectors) = symmetric_eigen(&a, 2).unwrap();
        let mut recon = [0.0; 4];
        for i in 0..2 {
            for j in 0..2 {
                let mut acc = 0.0;
                for k in 0..2 {
                    acc += vectors[i * 2 + k] * values[k] * vectors[j * 2 + k];
                }
                recon[i * 2 + j] = acc;
            }
        }
        for idx in 0..4 {
            assert_relative_eq!(recon[idx], a[idx], epsilon = 1e-8);
        }
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        let a = vec![1.0, 2.0, 3.0];
        let err = symmetric_eigen(&a, 2);
        assert!(matches!(err, Err(GenoError::Shape(_))));
    }
}
