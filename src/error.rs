use std::error::Error;
use std::fmt::Display;

/// # The error type for the squash codec
///
/// Block-level math is a total function (see [`crate::block`]) and never
/// fails; every variant here originates at an I/O or API boundary.
#[derive(Debug)]
pub enum SquashError {
    /// The `.sqh` prelude did not start with the magic number.
    InvalidMagic,

    /// The underlying reader ended before a required field was fully read.
    ShortRead,

    /// The underlying writer could not accept all bytes of a required field.
    ShortWrite,

    /// A path's extension could not be routed to a known format.
    UnsupportedExtension(String),

    /// Save was attempted before any raster data was loaded.
    NoData,

    /// Save target exists and the caller did not request `overwrite`.
    OverwriteRefused(String),

    /// A raster buffer's length did not match `3 * width * height`.
    BadImageData { length: usize, required: usize },

    /// An io error occurred during reading or writing
    IoError(std::io::Error),
}

impl From<std::io::Error> for SquashError {
    fn from(err: std::io::Error) -> SquashError {
        SquashError::IoError(err)
    }
}

impl Display for SquashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SquashError::*;
        match self {
            InvalidMagic => write!(f, "invalid magic number in .sqh header"),
            ShortRead => write!(f, "unexpected end of input"),
            ShortWrite => write!(f, "writer refused to accept all bytes"),
            UnsupportedExtension(ext) => write!(f, "unsupported file extension: {}", ext),
            NoData => write!(f, "no image data loaded"),
            OverwriteRefused(path) => {
                write!(f, "refusing to overwrite existing file: {}", path)
            }
            BadImageData { length, required } => write!(
                f,
                "invalid raster buffer: {} bytes, expected {}",
                length, required
            ),
            IoError(err) => err.fmt(f),
        }
    }
}

impl Error for SquashError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SquashError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_non_empty() {
        let cases = [
            SquashError::InvalidMagic,
            SquashError::ShortRead,
            SquashError::ShortWrite,
            SquashError::UnsupportedExtension("bmp".into()),
            SquashError::NoData,
            SquashError::OverwriteRefused("out.sqh".into()),
            SquashError::BadImageData {
                length: 10,
                required: 12,
            },
        ];

        for err in cases {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn io_error_round_trips_through_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: SquashError = io_err.into();
        assert!(err.source().is_some());
    }
}
