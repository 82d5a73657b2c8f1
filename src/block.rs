//! Forward/inverse block codec and per-block transform selection
//! (spec §4.3, §4.4, §4.7).

use crate::matrix::Matrix;
use crate::pack::{self, CompressedBlock};
use crate::transform::{dct_matrix, haar_matrix, QTable};

/// Forward block codec (spec §4.3): `block_u8 → shift → T·S·Tᵀ → quantize`.
pub fn forward(block: &Matrix<8, 8, u8>, transform: &Matrix<8, 8, f32>, q: &QTable) -> Matrix<8, 8, i8> {
    let shifted = block.as_type(|v| v as f32 - 128.0);
    let transformed = transform.product(&shifted.product(&transform.transpose()));
    let q_matrix = q.as_matrix();
    let quantized = (transformed / q_matrix) + 0.5;
    quantized.as_type(|v| v.floor().clamp(i8::MIN as f32, i8::MAX as f32) as i8)
}

/// Inverse block codec (spec §4.4): `dequantize → Tᵀ·B·T → unshift → clamp`.
pub fn inverse(block: &Matrix<8, 8, i8>, transform: &Matrix<8, 8, f32>, q: &QTable) -> Matrix<8, 8, u8> {
    let dequantized = block.as_type(|v| v as f32) * q.as_matrix();
    let reconstructed = transform.transpose().product(&dequantized.product(transform)) + 128.0;
    reconstructed.as_type(|v| v.floor().clamp(0.0, 255.0) as u8)
}

/// Quality score mixing reconstruction closeness and compressed density
/// (spec §4.7): `√(e² + r²)`.
pub fn quality_score(orig: &Matrix<8, 8, u8>, reconstructed: &Matrix<8, 8, u8>, compressed_bytes: usize) -> f32 {
    let diff: Matrix<8, 8, f32> = Matrix::from_fn(|i, j| orig[i][j] as f32 - reconstructed[i][j] as f32);
    let e = (-diff.norm() / 64.0).exp();
    let r = compressed_bytes as f32 / 64.0;
    (e * e + r * r).sqrt()
}

/// Outcome of running both transforms on one block and picking the winner.
pub struct SelectedBlock {
    pub compressed: CompressedBlock,
    pub is_dct: bool,
    pub score: f32,
}

/// Run both transforms on `block`, pack both results, and pick whichever
/// score is closer to `target_quality`. Ties favor DCT (spec §4.7).
pub fn select_block(block: &Matrix<8, 8, u8>, q_dct: &QTable, q_haar: &QTable, target_quality: f32) -> SelectedBlock {
    let dct_coeffs = forward(block, dct_matrix(), q_dct);
    let dct_packed = pack::pack(&dct_coeffs, true);
    let dct_reconstructed = inverse(&dct_coeffs, dct_matrix(), q_dct);
    let dct_score = quality_score(block, &dct_reconstructed, dct_packed.byte_len());

    let haar_coeffs = forward(block, haar_matrix(), q_haar);
    let haar_packed = pack::pack(&haar_coeffs, false);
    let haar_reconstructed = inverse(&haar_coeffs, haar_matrix(), q_haar);
    let haar_score = quality_score(block, &haar_reconstructed, haar_packed.byte_len());

    let dct_diff = (target_quality - dct_score).abs();
    let haar_diff = (target_quality - haar_score).abs();

    if haar_diff < dct_diff {
        SelectedBlock {
            compressed: haar_packed,
            is_dct: false,
            score: haar_score,
        }
    } else {
        SelectedBlock {
            compressed: dct_packed,
            is_dct: true,
            score: dct_score,
        }
    }
}
