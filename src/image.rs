//! `SquashImage`: the owning facade over the open/save lifecycle
//! (spec §3, §7; SPEC_FULL §4.10).

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::container::{decode_image, encode_image, EncodeConfig, EncodeStats};
use crate::error::SquashError;
use crate::raster::RasterImage;

/// Owns at most one loaded [`RasterImage`] and mediates `.sqh` open/save,
/// mirroring the reference implementation's `SquashImage` class without its
/// global mutable `Quality` field (spec §9).
#[derive(Debug, Default)]
pub struct SquashImage {
    data: Option<RasterImage>,
}

impl SquashImage {
    pub fn new() -> Self {
        SquashImage { data: None }
    }

    pub fn from_raster(image: RasterImage) -> Self {
        SquashImage { data: Some(image) }
    }

    pub fn data(&self) -> Option<&RasterImage> {
        self.data.as_ref()
    }

    /// Read a `.sqh` stream, replacing any previously loaded raster.
    pub fn open_sqh<R: std::io::Read>(&mut self, reader: &mut R) -> Result<(), SquashError> {
        let image = decode_image(reader)?;
        self.data = Some(image);
        Ok(())
    }

    /// Write a `.sqh` stream. Returns [`SquashError::NoData`] if nothing is
    /// loaded, mirroring the original's `save` returning false on a null
    /// data pointer.
    pub fn save_sqh<W: std::io::Write>(
        &self,
        writer: &mut W,
        config: &EncodeConfig,
    ) -> Result<EncodeStats, SquashError> {
        let image = self.data.as_ref().ok_or(SquashError::NoData)?;
        encode_image(writer, image, config)
    }

    /// Open a `.sqh` file by path.
    pub fn open_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SquashError> {
        let path = path.as_ref();
        require_extension(path, "sqh")?;
        let mut reader = BufReader::new(File::open(path)?);
        self.open_sqh(&mut reader)
    }

    /// Save to a `.sqh` file by path, writing to a sibling temp file and
    /// renaming it into place on success so no partial file is ever left
    /// behind on failure (spec §7).
    pub fn save_path<P: AsRef<Path>>(
        &self,
        path: P,
        config: &EncodeConfig,
        overwrite: bool,
    ) -> Result<EncodeStats, SquashError> {
        let path = path.as_ref();
        require_extension(path, "sqh")?;

        if path.exists() && !overwrite {
            return Err(SquashError::OverwriteRefused(path.display().to_string()));
        }

        let tmp_path = path.with_extension("sqh.tmp");
        let stats = {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            let stats = self.save_sqh(&mut writer, config)?;
            writer.flush()?;
            stats
        };
        fs::rename(&tmp_path, path)?;
        Ok(stats)
    }
}

fn require_extension(path: &Path, expected: &str) -> Result<(), SquashError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(expected) => Ok(()),
        Some(ext) => Err(SquashError::UnsupportedExtension(ext.to_string())),
        None => Err(SquashError::UnsupportedExtension(String::new())),
    }
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
    fn save_without_data_returns_no_data() {
        let image = SquashImage::new();
        let mut buf = Vec::new();
        let err = image.save_sqh(&mut buf, &EncodeConfig::default()).unwrap_err();
        assert!(matches!(err, SquashError::NoData));
    }

    #[test]
    fn save_then_open_round_trips_in_memory() {
        let raster = solid_image(16, 16, [128, 128, 128]);
        let image = SquashImage::from_raster(raster.clone());
        let mut buf = Vec::new();
        image.save_sqh(&mut buf, &EncodeConfig::default()).unwrap();

        let mut reloaded = SquashImage::new();
        reloaded.open_sqh(&mut &buf[..]).unwrap();
        assert_eq!(reloaded.data().unwrap(), &raster);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let image = SquashImage::new();
        let err = image
            .save_path("/tmp/squash-codec-test-output.png", &EncodeConfig::default(), true)
            .unwrap_err();
        assert!(matches!(err, SquashError::UnsupportedExtension(_)));
    }

    #[test]
    fn save_path_refuses_overwrite_without_flag() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("squash-codec-test-{}.sqh", std::process::id()));
        fs::write(&path, b"placeholder").unwrap();

        let raster = solid_image(8, 8, [1, 2, 3]);
        let image = SquashImage::from_raster(raster);
        let err = image
            .save_path(&path, &EncodeConfig::default(), false)
            .unwrap_err();
        assert!(matches!(err, SquashError::OverwriteRefused(_)));

        fs::remove_file(&path).ok();
    }
}
