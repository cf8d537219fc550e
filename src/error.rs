// error.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
use std::fmt;
use std::io;

/// Errors encountered while decoding
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// [Header](block/struct.Header.html) signature is not `GIF`.
    MalformedHeader,
    /// Invalid [Block](block/enum.Block.html) code (tag byte).
    InvalidBlockCode(u8),
    /// Block dispatch did not advance past the given offset.
    StalledCursor(usize),
    /// [GraphicControl](block/struct.GraphicControl.html) block has invalid
    /// length.
    MalformedGraphicControlExtension,
    /// File ends with incomplete block.
    UnexpectedEndOfFile,
    /// LZW minimum code size is too large.
    InvalidCodeSize(u8),
    /// Compressed LZW data invalid or corrupt (strict mode only).
    InvalidLzwData,
    /// Image larger than specified by
    /// [max_image_sz](struct.Decoder.html#method.max_image_sz).
    TooLargeImage,
}

/// Gifanim result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Recoverable problems found while decoding.
///
/// These never abort decoding; the affected pixels fall back to the value
/// seeded by the disposal method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// GIF version other than `87a` or `89a`.
    UnknownVersion([u8; 3]),
    /// Image data ended before all pixels of a frame were decoded.
    TruncatedData {
        /// Frame number
        frame: usize,
        /// Pixels in the image block
        expected: usize,
        /// Pixels actually decoded
        decoded: usize,
    },
    /// Color index outside of the active color table.
    InvalidColorIndex {
        /// Frame number
        frame: usize,
        /// First offending index
        index: u8,
    },
    /// No local or global color table for a frame.
    MissingColorTable {
        /// Frame number
        frame: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::UnknownVersion(v) => {
                write!(fmt, "unknown version: {}", String::from_utf8_lossy(v))
            }
            Warning::TruncatedData {
                frame,
                expected,
                decoded,
            } => write!(
                fmt,
                "frame {}: truncated data ({} of {} pixels)",
                frame, decoded, expected
            ),
            Warning::InvalidColorIndex { frame, index } => {
                write!(fmt, "frame {}: invalid color index {}", frame, index)
            }
            Warning::MissingColorTable { frame } => {
                write!(fmt, "frame {}: missing color table", frame)
            }
        }
    }
}
