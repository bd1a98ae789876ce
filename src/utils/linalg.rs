// src/utils/linalg.rs

use nalgebra::{Matrix3, RowVector3, Vector3};

/// Build the 3x3 lattice matrix (vectors as rows) from the model's
/// row-array representation.
pub fn lattice_matrix(lattice: &[[f64; 3]; 3]) -> Matrix3<f64> {
  Matrix3::from_rows(&[
    RowVector3::from(lattice[0]),
    RowVector3::from(lattice[1]),
    RowVector3::from(lattice[2]),
  ])
}

/// Collapse a lattice matrix back into the row-array representation.
pub fn lattice_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
  [
    [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
    [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
    [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
  ]
}

/// Convert fractional coordinates to Cartesian (Angstroms).
///
/// With lattice vectors as rows, `cartesian = lattice^T * fractional`.
pub fn frac_to_cart(frac: [f64; 3], lattice: &[[f64; 3]; 3]) -> [f64; 3] {
  let cart = lattice_matrix(lattice).transpose() * Vector3::from(frac);
  [cart.x, cart.y, cart.z]
}

/// Convert Cartesian coordinates (Angstroms) to fractional.
///
/// Returns `None` when the lattice is singular (no inverse exists).
pub fn cart_to_frac(cart: [f64; 3], lattice: &[[f64; 3]; 3]) -> Option<[f64; 3]> {
  let inv = lattice_matrix(lattice).transpose().try_inverse()?;
  let frac = inv * Vector3::from(cart);
  Some([frac.x, frac.y, frac.z])
}

/// Signed volume of the cell spanned by the lattice vectors.
pub fn cell_volume(lattice: &[[f64; 3]; 3]) -> f64 {
  lattice_matrix(lattice).determinant()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cubic_lattice() {
    // Simple cubic lattice 5.0 Å
    let lattice = [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]];

    let cart = frac_to_cart([0.5, 0.5, 0.5], &lattice);

    assert!((cart[0] - 2.5).abs() < 1e-10);
    assert!((cart[1] - 2.5).abs() < 1e-10);
    assert!((cart[2] - 2.5).abs() < 1e-10);
    assert!((cell_volume(&lattice) - 125.0).abs() < 1e-10);
  }

  #[test]
  fn test_roundtrip() {
    // Non-orthogonal lattice
    let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.0, 0.0, 5.0]];

    let frac_orig = [0.333, 0.667, 0.25];
    let cart = frac_to_cart(frac_orig, &lattice);
    let frac_back = cart_to_frac(cart, &lattice).unwrap();

    assert!((frac_back[0] - frac_orig[0]).abs() < 1e-10);
    assert!((frac_back[1] - frac_orig[1]).abs() < 1e-10);
    assert!((frac_back[2] - frac_orig[2]).abs() < 1e-10);
  }

  #[test]
  fn test_singular_lattice() {
    // Two identical rows, det = 0
    let lattice = [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
    assert!(cart_to_frac([0.5, 0.5, 0.5], &lattice).is_none());
  }
}
