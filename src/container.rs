//! On-disk `.sqh` container I/O and the full image encode/decode loop
//! (spec §4.8, §6.1–§6.3).

use std::io::{Read, Write};

use crate::block::{inverse, select_block};
use crate::error::SquashError;
use crate::matrix::Matrix;
use crate::pack::{self, CompressedBlock, IS_DCT_MASK, IS_LONG_MASK, SHORT_COUNT_MASK};
use crate::raster::RasterImage;
use crate::transform::{dct_matrix, haar_matrix, QTable};

/// `MAGIC = 0x2F737168` ("sqh/" interpreted little-endian), spec §6.1.
pub const MAGIC: u32 = 0x2F73_7168;

/// File metadata (spec §3 `SquashHeader`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquashHeader {
    pub size_x: u32,
    pub size_y: u32,
    pub channel_tag: u8,
}

impl SquashHeader {
    pub const CHANNEL_RGB: u8 = 3;

    pub fn for_rgb(size_x: u32, size_y: u32) -> Self {
        SquashHeader {
            size_x,
            size_y,
            channel_tag: Self::CHANNEL_RGB,
        }
    }

    pub fn x_blocks(&self) -> u32 {
        (self.size_x + 7) / 8
    }

    pub fn y_blocks(&self) -> u32 {
        (self.size_y + 7) / 8
    }
}

/// Per-image encode configuration, replacing the original's global mutable
/// `Quality` (spec §9): a value passed in, never global state.
#[derive(Debug, Clone, Copy)]
pub struct EncodeConfig {
    pub target_quality: f32,
    pub q_dct: QTable,
    pub q_haar: QTable,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        EncodeConfig {
            target_quality: 0.5,
            q_dct: QTable::dct_default(),
            q_haar: QTable::haar_default(),
        }
    }
}

/// Diagnostics returned by [`encode_image`], replacing the original's
/// module-scope "average coefficient" side channel (spec §9).
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeStats {
    pub blocks_encoded: usize,
    pub dct_blocks: usize,
    pub haar_blocks: usize,
    pub short_form_blocks: usize,
    pub long_form_blocks: usize,
    pub mean_quality_score: f32,
}

fn write_u32_le<W: Write>(w: &mut W, value: u32) -> Result<(), SquashError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn read_u32_le<R: Read>(r: &mut R) -> Result<u32, SquashError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|_| SquashError::ShortRead)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_u8<W: Write>(w: &mut W, value: u8) -> Result<(), SquashError> {
    w.write_all(&[value])?;
    Ok(())
}

fn read_u8<R: Read>(r: &mut R) -> Result<u8, SquashError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf).map_err(|_| SquashError::ShortRead)?;
    Ok(buf[0])
}

fn write_header<W: Write>(w: &mut W, header: &SquashHeader) -> Result<(), SquashError> {
    write_u32_le(w, MAGIC)?;
    write_u32_le(w, header.size_x)?;
    write_u32_le(w, header.size_y)?;
    write_u8(w, header.channel_tag)?;
    Ok(())
}

fn read_header<R: Read>(r: &mut R) -> Result<SquashHeader, SquashError> {
    let magic = read_u32_le(r)?;
    if magic != MAGIC {
        return Err(SquashError::InvalidMagic);
    }
    let size_x = read_u32_le(r)?;
    let size_y = read_u32_le(r)?;
    let channel_tag = read_u8(r)?;
    Ok(SquashHeader {
        size_x,
        size_y,
        channel_tag,
    })
}

fn write_qtable<W: Write>(w: &mut W, q: &QTable) -> Result<(), SquashError> {
    w.write_all(&q.flatten_row_major())?;
    Ok(())
}

fn read_qtable<R: Read>(r: &mut R) -> Result<QTable, SquashError> {
    let mut buf = [0u8; 64];
    r.read_exact(&mut buf).map_err(|_| SquashError::ShortRead)?;
    Ok(QTable::from_row_major(&buf))
}

fn write_block<W: Write>(w: &mut W, block: &CompressedBlock) -> Result<(), SquashError> {
    write_u8(w, block.info_byte)?;
    if let Some(table) = block.table {
        w.write_all(&table.to_le_bytes())?;
    }
    let data: Vec<u8> = block.data.iter().map(|&v| v as u8).collect();
    w.write_all(&data)?;
    Ok(())
}

fn read_block<R: Read>(r: &mut R) -> Result<CompressedBlock, SquashError> {
    let info_byte = read_u8(r)?;
    let (table, data_count) = if info_byte & IS_LONG_MASK != 0 {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf).map_err(|_| SquashError::ShortRead)?;
        let table = u64::from_le_bytes(buf);
        (Some(table), table.count_ones() as usize)
    } else {
        (None, (info_byte & SHORT_COUNT_MASK) as usize)
    };

    let mut raw = vec![0u8; data_count];
    r.read_exact(&mut raw).map_err(|_| SquashError::ShortRead)?;
    let data = raw.into_iter().map(|v| v as i8).collect();

    Ok(CompressedBlock {
        info_byte,
        table,
        data,
    })
}

/// Encode `image` as a `.sqh` stream, writing the prelude then the block
/// stream in raster-tile order (spec §4.8).
pub fn encode_image<W: Write>(
    writer: &mut W,
    image: &RasterImage,
    config: &EncodeConfig,
) -> Result<EncodeStats, SquashError> {
    let header = SquashHeader::for_rgb(image.width(), image.height());
    write_header(writer, &header)?;
    write_qtable(writer, &config.q_dct)?;
    write_qtable(writer, &config.q_haar)?;

    let x_blocks = header.x_blocks();
    let y_blocks = header.y_blocks();

    let mut stats = EncodeStats::default();
    let mut score_sum = 0.0f32;

    for i in 0..y_blocks {
        for j in 0..x_blocks {
            for c in 0..3 {
                let block: Matrix<8, 8, u8> = Matrix::from_fn(|k, l| {
                    image.sample_or_neutral(8 * j + l as u32, 8 * i + k as u32, c)
                });

                let selected = select_block(&block, &config.q_dct, &config.q_haar, config.target_quality);
                write_block(writer, &selected.compressed)?;

                stats.blocks_encoded += 1;
                if selected.is_dct {
                    stats.dct_blocks += 1;
                } else {
                    stats.haar_blocks += 1;
                }
                if selected.compressed.is_long() {
                    stats.long_form_blocks += 1;
                } else {
                    stats.short_form_blocks += 1;
                }
                score_sum += selected.score;
            }
        }
    }

    if stats.blocks_encoded > 0 {
        stats.mean_quality_score = score_sum / stats.blocks_encoded as f32;
    }

    Ok(stats)
}

/// Decode a `.sqh` stream into a [`RasterImage`] (spec §4.8, mirror of
/// [`encode_image`]).
pub fn decode_image<R: Read>(reader: &mut R) -> Result<RasterImage, SquashError> {
    let header = read_header(reader)?;
    let q_dct = read_qtable(reader)?;
    let q_haar = read_qtable(reader)?;

    let width = header.size_x;
    let height = header.size_y;
    let mut pixels = vec![0u8; 3 * width as usize * height as usize];

    let x_blocks = header.x_blocks();
    let y_blocks = header.y_blocks();

    for i in 0..y_blocks {
        for j in 0..x_blocks {
            for c in 0..3usize {
                let packed = read_block(reader)?;
                let coeffs = pack::unpack(&packed);
                let transform = if packed.info_byte & IS_DCT_MASK != 0 {
                    dct_matrix()
                } else {
                    haar_matrix()
                };
                let q = if packed.info_byte & IS_DCT_MASK != 0 {
                    &q_dct
                } else {
                    &q_haar
                };
                let block = inverse(&coeffs, transform, q);

                for k in 0..8u32 {
                    for l in 0..8u32 {
                        let x = 8 * j + l;
                        let y = 8 * i + k;
                        if x < width && y < height {
                            let idx = 3 * (width as usize * y as usize + x as usize) + c;
                            pixels[idx] = block[k as usize][l as usize];
                        }
                    }
                }
            }
        }
    }

    RasterImage::new(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RasterImage {
        let mut pixels = Vec::with_capacity(3 * width as usize * height as usize);
        for _ in 0..(width * height) {
            pixels.extend_from_slice(&rgb);
        }
        RasterImage::new(width, height, pixels).unwrap()
    }

    #[test]
    fn container_prelude_matches_spec() {
        let image = solid_image(16, 16, [128, 128, 128]);
        let mut buf = Vec::new();
        encode_image(&mut buf, &image, &EncodeConfig::default()).unwrap();

        assert_eq!(&buf[0..4], &MAGIC.to_le_bytes());
        assert_eq!(&buf[4..8], &16u32.to_le_bytes());
        assert_eq!(&buf[8..12], &16u32.to_le_bytes());
        assert_eq!(buf[12], SquashHeader::CHANNEL_RGB);
    }

    #[test]
    fn solid_gray_image_round_trips_exactly_with_one_byte_blocks() {
        let image = solid_image(16, 16, [128, 128, 128]);
        let mut buf = Vec::new();
        let stats = encode_image(&mut buf, &image, &EncodeConfig::default()).unwrap();

        assert_eq!(stats.blocks_encoded, 2 * 2 * 3);
        assert_eq!(stats.short_form_blocks, stats.blocks_encoded);
        assert_eq!(stats.dct_blocks, stats.blocks_encoded);

        // header(13) + 2 qtables(128) + 12 one-byte blocks
        assert_eq!(buf.len(), 13 + 128 + 12);

        let decoded = decode_image(&mut &buf[..]).unwrap();
        assert_eq!(decoded.pixels(), image.pixels());
    }

    #[test]
    fn non_multiple_of_eight_dimensions_round_trip_within_bounds() {
        let image = solid_image(9, 9, [50, 60, 70]);
        let mut buf = Vec::new();
        encode_image(&mut buf, &image, &EncodeConfig::default()).unwrap();
        let decoded = decode_image(&mut &buf[..]).unwrap();
        assert_eq!(decoded.width(), 9);
        assert_eq!(decoded.height(), 9);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let buf = vec![0u8; 141];
        let err = decode_image(&mut &buf[..]).unwrap_err();
        assert!(matches!(err, SquashError::InvalidMagic));
    }

    #[test]
    fn double_encode_is_deterministic() {
        let image = solid_image(24, 24, [12, 200, 77]);
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        encode_image(&mut buf1, &image, &EncodeConfig::default()).unwrap();
        encode_image(&mut buf2, &image, &EncodeConfig::default()).unwrap();
        assert_eq!(buf1, buf2);
    }
}
