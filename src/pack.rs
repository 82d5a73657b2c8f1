//! Block packer / unpacker (spec §4.5, §4.6, §6.4).

use crate::matrix::Matrix;

pub const IS_DCT_MASK: u8 = 0x80;
pub const IS_LONG_MASK: u8 = 0x40;
pub const SHORT_COUNT_MASK: u8 = 0x3F;

/// Fixed 64-entry zig-zag ordering: `ZIGZAG[k]` is the `(row, col)` position
/// of the k-th zig-zag coefficient, transcribed verbatim from spec §6.4.
#[rustfmt::skip]
pub const ZIGZAG: [(u8, u8); 64] = [
    (0, 0), (0, 1), (1, 0), (2, 0), (1, 1), (0, 2), (0, 3), (1, 2),
    (2, 1), (3, 0), (4, 0), (3, 1), (2, 2), (1, 3), (0, 4), (0, 5),
    (1, 4), (2, 3), (3, 2), (4, 1), (5, 0), (6, 0), (5, 1), (4, 2),
    (3, 3), (2, 4), (1, 5), (0, 6), (0, 7), (1, 6), (2, 5), (3, 4),
    (4, 3), (5, 2), (6, 1), (7, 0), (7, 1), (6, 2), (5, 3), (4, 4),
    (3, 5), (2, 6), (1, 7), (2, 7), (3, 6), (4, 5), (5, 4), (6, 3),
    (7, 2), (7, 3), (6, 4), (5, 5), (4, 6), (3, 7), (4, 7), (5, 6),
    (6, 5), (7, 4), (7, 5), (6, 6), (5, 7), (6, 7), (7, 6), (7, 7),
];

/// A packed block on disk (spec §3 `CompressedBlock`).
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedBlock {
    pub info_byte: u8,
    /// Present only when `info_byte & IS_LONG_MASK != 0`.
    pub table: Option<u64>,
    pub data: Vec<i8>,
}

impl CompressedBlock {
    pub fn is_dct(&self) -> bool {
        self.info_byte & IS_DCT_MASK != 0
    }

    pub fn is_long(&self) -> bool {
        self.info_byte & IS_LONG_MASK != 0
    }

    /// Total bytes this block occupies in the container, matching spec
    /// §4.7's `compressed_bytes` formula.
    pub fn byte_len(&self) -> usize {
        1 + if self.is_long() { 8 } else { 0 } + self.data.len()
    }
}

/// Number of trailing zeros in a zig-zag-flattened coefficient array.
fn tail_zeros(z: &[i8; 64]) -> usize {
    z.iter().rev().take_while(|&&v| v == 0).count()
}

/// Number of zero entries strictly before the position implied by
/// `tail_zeros` (i.e. among `z[0..64-tail_zeros]`).
fn inner_zeros(z: &[i8; 64], tail: usize) -> usize {
    z[0..64 - tail].iter().filter(|&&v| v == 0).count()
}

/// Pack an `i8` block into its on-disk form, choosing short or long form
/// per spec §4.5's decision logic.
pub fn pack(block: &Matrix<8, 8, i8>, is_dct: bool) -> CompressedBlock {
    let zigzag = block.flatten_zigzag();
    let tail = tail_zeros(&zigzag);
    let inner = inner_zeros(&zigzag, tail);

    let transform_bit = if is_dct { IS_DCT_MASK } else { 0 };

    if inner <= 8 {
        let count = 64 - tail;
        CompressedBlock {
            info_byte: transform_bit | (count as u8 & SHORT_COUNT_MASK),
            table: None,
            data: zigzag[0..count].to_vec(),
        }
    } else {
        let row_major = block.flatten_row_major();
        let mut table: u64 = 0;
        let mut data = Vec::new();
        for &value in row_major.iter() {
            table <<= 1;
            if value != 0 {
                table |= 1;
                data.push(value);
            }
        }
        CompressedBlock {
            info_byte: transform_bit | IS_LONG_MASK,
            table: Some(table),
            data,
        }
    }
}

/// Inverse of [`pack`]: reconstruct the `i8` block from its packed form.
pub fn unpack(block: &CompressedBlock) -> Matrix<8, 8, i8> {
    if block.is_long() {
        let table = block.table.unwrap_or(0);
        let mut row_major = [0i8; 64];
        let mut data_iter = block.data.iter();
        for (k, slot) in row_major.iter_mut().enumerate() {
            let bit = (table >> (63 - k)) & 1;
            if bit == 1 {
                *slot = *data_iter.next().unwrap_or(&0);
            }
        }
        Matrix::from_row_major(&row_major)
    } else {
        Matrix::from_zigzag(&block.data)
    }
}
