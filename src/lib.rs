//! # squash codec
//!
//! A lossy still-image codec for RGB images. The image is partitioned into
//! 8×8 tiles; each tile of each color channel is independently transformed
//! (DCT or Haar, whichever scores closer to the requested quality target),
//! quantized, and packed into a compact binary `.sqh` container.
//!
//! ## Encoding
//! ```no_run
//! # use squash_codec::SquashError;
//! # pub fn main() -> Result<(), SquashError> {
//! use squash_codec::{RasterImage, EncodeConfig, encode_image};
//!
//! // A 2x2 RGB image.
//! let pixels = vec![
//!     255, 0, 0,
//!     0, 255, 0,
//!     0, 0, 255,
//!     255, 255, 255,
//! ];
//! let image = RasterImage::new(2, 2, pixels)?;
//!
//! let mut out = Vec::new();
//! encode_image(&mut out, &image, &EncodeConfig::default())?;
//! # Ok(())
//! # }
//! ```

mod block;
mod container;
mod error;
mod image;
mod matrix;
mod pack;
mod raster;
mod transform;

pub use block::{forward, inverse, quality_score, select_block, SelectedBlock};
pub use container::{decode_image, encode_image, EncodeConfig, EncodeStats, SquashHeader, MAGIC};
pub use error::SquashError;
pub use image::SquashImage;
pub use matrix::Matrix;
pub use pack::{pack, unpack, CompressedBlock, IS_DCT_MASK, IS_LONG_MASK, ZIGZAG};
pub use raster::{RasterImage, RasterSink, RasterSource};
pub use transform::{dct_matrix, haar_matrix, QTable, BLOCK_SIZE, Q_DCT, Q_HAAR};
