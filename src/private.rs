// private.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Private module for top-level items
use crate::block::{Block, Container, DisposalMethod, ImageBlock, ImageDesc};
use crate::compose::Frames;
use crate::decode::{Blocks, MAX_IMAGE_SZ};
use crate::error::{Result, Warning};
use pix::rgb::SRgba8;
use pix::Raster;
use std::io::{BufReader, Read};
use std::time::Duration;

/// GIF file decoder
///
/// The whole input is read before decoding.  It can then be converted to:
/// * [decode] for a complete [Animation]
/// * [into_frames] for composited [Frame]s, one at a time
/// * [into_container] for the parsed blocks, grouped
/// * [into_blocks] for low-level [Block]s
///
/// ## Example: Get frames from a GIF
/// ```
/// use gifanim::Decoder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// // ... open a `File` as "gif"
/// let animation = Decoder::new(gif).decode()?;
/// for frame in &animation.frames {
///     let raster = frame.raster();
///     assert_eq!(raster.width(), 2);
///     // ... display raster for frame.delay()
/// }
/// for warning in &animation.warnings {
///     eprintln!("{}", warning);
/// }
/// # Ok(())
/// # }
/// ```
///
/// [Animation]: struct.Animation.html
/// [Block]: block/enum.Block.html
/// [decode]: struct.Decoder.html#method.decode
/// [Frame]: struct.Frame.html
/// [into_blocks]: struct.Decoder.html#method.into_blocks
/// [into_container]: struct.Decoder.html#method.into_container
/// [into_frames]: struct.Decoder.html#method.into_frames
///
pub struct Decoder<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
    /// Fail on invalid LZW codes
    strict_lzw: bool,
}

impl<R: Read> Decoder<BufReader<R>> {
    /// Create a new buffered GIF decoder.
    pub fn new(reader: R) -> Self {
        Self::new_unbuffered(BufReader::new(reader))
    }
}

impl<R: Read> Decoder<R> {
    /// Create a new unbuffered GIF decoder.
    pub fn new_unbuffered(reader: R) -> Self {
        Decoder {
            reader,
            max_image_sz: Some(MAX_IMAGE_SZ),
            strict_lzw: false,
        }
    }

    /// Set the maximum image size (in pixels) to allow for decoding.
    ///
    /// The logical screen is limited the same way as each image block.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Fail with [InvalidLzwData] instead of skipping invalid codes.
    ///
    /// [InvalidLzwData]: enum.Error.html#variant.InvalidLzwData
    pub fn strict_lzw(mut self, strict_lzw: bool) -> Self {
        self.strict_lzw = strict_lzw;
        self
    }

    /// Read all input data
    fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![];
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read and parse all blocks.
    pub fn into_blocks(mut self) -> Result<Vec<Block>> {
        let buf = self.read_all()?;
        Blocks::new(&buf, self.max_image_sz).collect()
    }

    /// Read and parse into a container.
    pub fn into_container(mut self) -> Result<Container> {
        let buf = self.read_all()?;
        Blocks::new(&buf, self.max_image_sz).into_container()
    }

    /// Convert into a frame `Iterator`.
    pub fn into_frames(self) -> Result<Frames> {
        let strict = self.strict_lzw;
        Ok(Frames::new(self.into_container()?).with_strict(strict))
    }

    /// Decode all frames.
    pub fn decode(self) -> Result<Animation> {
        self.into_frames()?.into_animation()
    }
}

/// One composited frame of an animation.
///
/// The raster is always the size of the logical screen.
pub struct Frame {
    /// Canvas after painting the image block
    raster: Raster<SRgba8>,
    /// Image descriptor of the block
    image_desc: ImageDesc,
    /// Disposal method of the block
    disposal_method: DisposalMethod,
    /// Delay in seconds
    delay_secs: f32,
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Frame {
            raster: Raster::with_raster(&self.raster),
            image_desc: self.image_desc.clone(),
            disposal_method: self.disposal_method,
            delay_secs: self.delay_secs,
        }
    }
}

impl Frame {
    /// Create a frame from a composited raster
    pub(crate) fn new(raster: Raster<SRgba8>, block: &ImageBlock) -> Self {
        Frame {
            raster,
            image_desc: block.image_desc.clone(),
            disposal_method: block.disposal_method(),
            delay_secs: block.delay_secs(),
        }
    }

    /// Get the raster
    pub fn raster(&self) -> &Raster<SRgba8> {
        &self.raster
    }

    /// Get the pixels as RGBA bytes (row-major, top to bottom)
    pub fn rgba(&self) -> &[u8] {
        self.raster.as_u8_slice()
    }

    /// Get the delay in seconds
    pub fn delay_secs(&self) -> f32 {
        self.delay_secs
    }

    /// Get the delay
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f32(self.delay_secs)
    }

    /// Get the disposal method
    pub fn disposal_method(&self) -> DisposalMethod {
        self.disposal_method
    }

    /// Get the image descriptor
    pub fn image_desc(&self) -> &ImageDesc {
        &self.image_desc
    }
}

/// A decoded animation
#[derive(Clone)]
pub struct Animation {
    /// Composited frames, in stream order
    pub frames: Vec<Frame>,
    /// Non-fatal problems found while decoding
    pub warnings: Vec<Warning>,
    /// Number of times to loop (zero means forever)
    pub loop_count: u16,
}
