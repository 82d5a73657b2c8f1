//! The two constant 8×8 transform matrices (DCT, Haar) and the two default
//! 8×8 quantization tables (spec §4.2).

use std::f32::consts::PI;
use std::sync::OnceLock;

use crate::matrix::Matrix;

pub const BLOCK_SIZE: usize = 8;

/// `δ(i) = 1 if i == 0 else √2`.
fn delta(i: usize) -> f32 {
    if i == 0 {
        1.0
    } else {
        std::f32::consts::SQRT_2
    }
}

/// `T_dct[i][j] = (δ(i) / √N) · cos(π · i · (2j+1) / (2N))`.
fn dct_entry(i: usize, j: usize) -> f32 {
    let n = BLOCK_SIZE as f32;
    (delta(i) / n.sqrt()) * ((PI * (i as f32) * (2.0 * j as f32 + 1.0)) / (2.0 * n)).cos()
}

static DCT_MATRIX: OnceLock<Matrix<8, 8, f32>> = OnceLock::new();

/// The DCT-II coefficient matrix, built once and cached. `cos`/`sqrt` are
/// not `const fn`, so this can't be a compile-time constant.
pub fn dct_matrix() -> &'static Matrix<8, 8, f32> {
    DCT_MATRIX.get_or_init(|| Matrix::from_fn(dct_entry))
}

/// The literal analytic Haar-style matrix as laid out row-by-row in the
/// reference implementation. The matrix actually applied during transform
/// (see [`haar_matrix`]) is this array's transpose.
const HAAR_LITERAL: [[f32; 8]; 8] = {
    let h = std::f32::consts::FRAC_1_SQRT_2; // 1/sqrt(2)
    let hh = 0.353_553_39; // 1/(2*sqrt(2))
    [
        [hh, hh, 0.5, 0.0, h, 0.0, 0.0, 0.0],
        [hh, hh, 0.5, 0.0, -h, 0.0, 0.0, 0.0],
        [hh, hh, -0.5, 0.0, 0.0, h, 0.0, 0.0],
        [hh, hh, -0.5, 0.0, 0.0, -h, 0.0, 0.0],
        [hh, -hh, 0.0, 0.5, 0.0, 0.0, h, 0.0],
        [hh, -hh, 0.0, 0.5, 0.0, 0.0, -h, 0.0],
        [hh, -hh, 0.0, -0.5, 0.0, 0.0, 0.0, h],
        [hh, -hh, 0.0, -0.5, 0.0, 0.0, 0.0, -h],
    ]
};

static HAAR_MATRIX: OnceLock<Matrix<8, 8, f32>> = OnceLock::new();

/// The Haar-style transform matrix actually used in `§4.3`/`§4.4`'s
/// `T · S · Tᵀ` formula: the transpose of [`HAAR_LITERAL`].
pub fn haar_matrix() -> &'static Matrix<8, 8, f32> {
    HAAR_MATRIX.get_or_init(|| Matrix::from_array(HAAR_LITERAL).transpose())
}

/// Default DCT quantization table, row-major (spec §4.2).
pub const Q_DCT: [[u8; 8]; 8] = [
    [10, 16, 22, 28, 34, 40, 46, 52],
    [16, 22, 28, 34, 40, 46, 52, 58],
    [22, 28, 34, 40, 46, 52, 58, 64],
    [28, 34, 40, 46, 52, 58, 64, 70],
    [34, 40, 46, 52, 58, 64, 70, 76],
    [40, 46, 52, 58, 64, 70, 76, 82],
    [46, 52, 58, 64, 70, 76, 82, 88],
    [52, 58, 64, 70, 76, 82, 88, 94],
];

/// Default Haar quantization table, row-major (spec §4.2).
pub const Q_HAAR: [[u8; 8]; 8] = [
    [8, 12, 16, 16, 24, 24, 24, 24],
    [12, 12, 16, 16, 24, 24, 24, 24],
    [16, 16, 24, 24, 32, 32, 32, 32],
    [16, 16, 24, 24, 32, 32, 32, 32],
    [24, 24, 32, 32, 38, 38, 38, 38],
    [24, 24, 32, 32, 38, 38, 38, 38],
    [24, 24, 32, 32, 38, 38, 38, 38],
    [24, 24, 32, 32, 38, 38, 38, 38],
];

/// An 8×8 quantization table, kept both as `f32` for the math and as the
/// original `u8` coefficients for container I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QTable {
    pub raw: [[u8; 8]; 8],
}

impl QTable {
    pub fn new(raw: [[u8; 8]; 8]) -> Self {
        QTable { raw }
    }

    pub fn dct_default() -> Self {
        QTable::new(Q_DCT)
    }

    pub fn haar_default() -> Self {
        QTable::new(Q_HAAR)
    }

    pub fn as_matrix(&self) -> Matrix<8, 8, f32> {
        Matrix::from_array(self.raw).as_type(|v| v as f32)
    }

    pub fn flatten_row_major(&self) -> [u8; 64] {
        Matrix::from_array(self.raw).flatten_row_major()
    }

    pub fn from_row_major(bytes: &[u8; 64]) -> Self {
        QTable::new(Matrix::from_row_major(bytes).rows_array())
    }
}

impl Matrix<8, 8, u8> {
    fn rows_array(&self) -> [[u8; 8]; 8] {
        let mut out = [[0u8; 8]; 8];
        for i in 0..8 {
            out[i] = self.get_row(i);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dct_matrix_is_orthonormal() {
        let t = dct_matrix();
        let product = t.product(&t.transpose());
        for i in 0..8 {
            for j in 0..8 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[i][j] - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn haar_matrix_rows_are_unit_norm() {
        let t = haar_matrix();
        for i in 0..8 {
            let row: Matrix<1, 8, f32> = Matrix::from_fn(|_, j| t[i][j]);
            assert!((row.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn default_q_tables_are_strictly_positive() {
        for row in Q_DCT.iter().chain(Q_HAAR.iter()) {
            for &v in row {
                assert!(v > 0);
            }
        }
    }

    #[test]
    fn qtable_row_major_round_trips() {
        let q = QTable::dct_default();
        let flat = q.flatten_row_major();
        let back = QTable::from_row_major(&flat);
        assert_eq!(q, back);
    }
}
