// decode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Container parsing: bytes to blocks
use crate::block::*;
use crate::error::{Error, Result};

/// Default maximum image size, in pixels
pub(crate) const MAX_IMAGE_SZ: usize = 1 << 25;

/// Maximum LZW minimum code size
const MAX_CODE_SIZE: u8 = 11;

/// Block codes, including those implied by position
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum BlockCode {
    Header_,
    LogicalScreenDesc_,
    GlobalColorTable_,
    Extension_,
    ImageDesc_,
    LocalColorTable_,
    ImageData_,
    Trailer_,
}

impl BlockCode {
    /// Get block code from its tag byte
    fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }

    /// Get the fixed size (before any sub-blocks)
    fn size(self) -> usize {
        use self::BlockCode::*;
        match self {
            Header_ => 6,
            LogicalScreenDesc_ => 7,
            ImageDesc_ => 10,
            Trailer_ => 1,
            Extension_ => 2, // +sub-blocks
            ImageData_ => 1, // +sub-blocks
            GlobalColorTable_ | LocalColorTable_ => 0, // from descriptor
        }
    }
}

/// An `Iterator` for [Block]s within a GIF byte buffer.
///
/// Each step reads exactly one block, so callers may interleave parsing
/// with other work.  Iteration ends after the trailer or the first error.
///
/// [Block]: block/enum.Block.html
pub struct Blocks<'a> {
    /// Input buffer
    buf: &'a [u8],
    /// Read cursor
    offset: usize,
    /// Block expected next, with its size
    expected_next: Option<(BlockCode, usize)>,
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
    /// Done flag
    done: bool,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.next_block();
        if let Ok(Block::Trailer(_)) | Err(_) = res {
            self.done = true;
        }
        Some(res)
    }
}

impl<'a> Blocks<'a> {
    /// Create a new block iterator
    pub fn new(buf: &'a [u8], max_image_sz: Option<usize>) -> Self {
        use self::BlockCode::Header_;
        Blocks {
            buf,
            offset: 0,
            expected_next: Some((Header_, Header_.size())),
            max_image_sz,
            done: false,
        }
    }

    /// Collect all blocks into a container
    pub fn into_container(self) -> Result<Container> {
        let mut builder = ContainerBuilder::default();
        for block in self {
            builder.handle_block(block?);
        }
        builder.build()
    }

    /// Decode the next block (including all sub-blocks)
    fn next_block(&mut self) -> Result<Block> {
        let start = self.offset;
        let (bc, sz) = self.examine_buffer()?;
        let block = self.decode_block(bc, sz)?;
        if self.offset == start {
            return Err(Error::StalledCursor(start));
        }
        debug!("  block  : {:?} @{} {}", bc, start, self.offset - start);
        Ok(block)
    }

    /// Examine buffer for block code and size
    fn examine_buffer(&mut self) -> Result<(BlockCode, usize)> {
        if let Some(bc_sz) = self.expected_next.take() {
            return Ok(bc_sz);
        }
        let t = *self.buf.get(self.offset).ok_or(Error::UnexpectedEndOfFile)?;
        match BlockCode::from_u8(t) {
            Some(bc) => Ok((bc, bc.size())),
            None => Err(Error::InvalidBlockCode(t)),
        }
    }

    /// Take a fixed number of bytes
    fn take(&mut self, sz: usize) -> Result<&'a [u8]> {
        let end = self.offset + sz;
        let buf = self
            .buf
            .get(self.offset..end)
            .ok_or(Error::UnexpectedEndOfFile)?;
        self.offset = end;
        Ok(buf)
    }

    /// Take one sub-block, or `None` at the block terminator
    fn sub_block(&mut self) -> Result<Option<&'a [u8]>> {
        let sz = usize::from(self.take(1)?[0]);
        if sz > 0 {
            Ok(Some(self.take(sz)?))
        } else {
            Ok(None)
        }
    }

    /// Decode one block
    fn decode_block(&mut self, bc: BlockCode, sz: usize) -> Result<Block> {
        use self::BlockCode::*;
        if bc == Header_ && self.buf.len() < sz {
            return Err(Error::MalformedHeader);
        }
        let buf = self.take(sz)?;
        Ok(match bc {
            Header_ => {
                let b = Header::from_buf(buf)?;
                self.expected_next =
                    Some((LogicalScreenDesc_, LogicalScreenDesc_.size()));
                b.into()
            }
            LogicalScreenDesc_ => {
                let b = LogicalScreenDesc::from_buf(buf);
                self.check_image_sz(b.screen_sz())?;
                let sz = b.color_table_config().size_bytes();
                if sz > 0 {
                    self.expected_next = Some((GlobalColorTable_, sz));
                }
                b.into()
            }
            GlobalColorTable_ => {
                Block::GlobalColorTable(ColorTable::with_colors(buf))
            }
            Extension_ => self.decode_extension(buf[1])?,
            ImageDesc_ => {
                let b = ImageDesc::from_buf(buf);
                self.check_image_sz(b.image_sz())?;
                let sz = b.color_table_config().size_bytes();
                self.expected_next = if sz > 0 {
                    Some((LocalColorTable_, sz))
                } else {
                    Some((ImageData_, ImageData_.size()))
                };
                b.into()
            }
            LocalColorTable_ => {
                self.expected_next = Some((ImageData_, ImageData_.size()));
                Block::LocalColorTable(ColorTable::with_colors(buf))
            }
            ImageData_ => self.decode_image_data(buf[0])?.into(),
            Trailer_ => Trailer::default().into(),
        })
    }

    /// Check an image (or screen) size against the maximum
    fn check_image_sz(&self, image_sz: usize) -> Result<()> {
        match self.max_image_sz {
            Some(sz) if image_sz > sz => Err(Error::TooLargeImage),
            _ => Ok(()),
        }
    }

    /// Decode image data sub-blocks
    fn decode_image_data(&mut self, min_code_size: u8) -> Result<ImageData> {
        if min_code_size > MAX_CODE_SIZE {
            return Err(Error::InvalidCodeSize(min_code_size));
        }
        let mut b = ImageData::new(min_code_size);
        while let Some(data) = self.sub_block()? {
            b.add_data(data);
        }
        Ok(b)
    }

    /// Decode an extension block
    fn decode_extension(&mut self, label: u8) -> Result<Block> {
        use crate::block::ExtensionCode::*;
        Ok(match ExtensionCode::from(label) {
            GraphicControl_ => self.decode_graphic_control()?.into(),
            Comment_ => {
                let mut b = Comment::default();
                while let Some(data) = self.sub_block()? {
                    b.add_comment(data);
                }
                b.into()
            }
            PlainText_ => self.decode_plain_text()?.into(),
            Application_ => self.decode_application()?.into(),
            Unknown_(n) => {
                let mut b = Unknown::new(n);
                while let Some(data) = self.sub_block()? {
                    b.add_sub_block(data);
                }
                b.into()
            }
        })
    }

    /// Decode a graphic control extension
    fn decode_graphic_control(&mut self) -> Result<GraphicControl> {
        let b = match self.sub_block()? {
            Some(buf) => GraphicControl::from_buf(buf)?,
            None => return Err(Error::MalformedGraphicControlExtension),
        };
        while let Some(data) = self.sub_block()? {
            warn!("Extra graphic control data: {:?}", data);
        }
        Ok(b)
    }

    /// Decode a plain text extension
    fn decode_plain_text(&mut self) -> Result<PlainText> {
        let mut b = PlainText::default();
        if let Some(buf) = self.sub_block()? {
            match TextGrid::from_buf(buf) {
                Some(grid) => b.set_grid(grid),
                None => b.add_sub_block(buf),
            }
            while let Some(data) = self.sub_block()? {
                b.add_sub_block(data);
            }
        }
        Ok(b)
    }

    /// Decode an application extension
    fn decode_application(&mut self) -> Result<Application> {
        let buf = self.take(12)?;
        if buf[0] != 11 {
            warn!("Application block size: {}", buf[0]);
        }
        let mut b = Application::with_id(&buf[1..9], &buf[9..12]);
        while let Some(data) = self.sub_block()? {
            b.add_app_data(data);
        }
        Ok(b)
    }
}

impl Header {
    /// Decode a Header block from a buffer
    fn from_buf(buf: &[u8]) -> Result<Self> {
        if &buf[..3] == b"GIF" {
            let version = [buf[3], buf[4], buf[5]];
            if !matches!(&version, b"87a" | b"89a") {
                warn!("Unknown version: {:?}", version);
            }
            Ok(Header::with_version(version))
        } else {
            Err(Error::MalformedHeader)
        }
    }
}

impl LogicalScreenDesc {
    /// Decode a Logical Screen Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        let width = u16::from_le_bytes([buf[0], buf[1]]);
        let height = u16::from_le_bytes([buf[2], buf[3]]);
        LogicalScreenDesc::default()
            .with_screen_width(width)
            .with_screen_height(height)
            .with_flags(buf[4])
            .with_background_color_idx(buf[5])
            .with_pixel_aspect_ratio(buf[6])
    }
}

impl ImageDesc {
    /// Decode an Image Descriptor block from a buffer (with separator)
    fn from_buf(buf: &[u8]) -> Self {
        let left = u16::from_le_bytes([buf[1], buf[2]]);
        let top = u16::from_le_bytes([buf[3], buf[4]]);
        let width = u16::from_le_bytes([buf[5], buf[6]]);
        let height = u16::from_le_bytes([buf[7], buf[8]]);
        ImageDesc::default()
            .with_left(left)
            .with_top(top)
            .with_width(width)
            .with_height(height)
            .with_flags(buf[9])
    }
}

impl GraphicControl {
    /// Decode a Graphic Control extension from its data sub-block
    fn from_buf(buf: &[u8]) -> Result<Self> {
        if buf.len() >= 4 {
            if buf.len() > 4 {
                warn!("Graphic control block size: {}", buf.len());
            }
            let delay = u16::from_le_bytes([buf[1], buf[2]]);
            Ok(GraphicControl::default()
                .with_flags(buf[0])
                .with_delay_time_cs(delay)
                .with_transparent_color_idx(buf[3]))
        } else {
            Err(Error::MalformedGraphicControlExtension)
        }
    }
}

impl TextGrid {
    /// Decode a text grid from the first plain text sub-block
    fn from_buf(buf: &[u8]) -> Option<Self> {
        if buf.len() != 12 {
            return None;
        }
        Some(TextGrid {
            left: u16::from_le_bytes([buf[0], buf[1]]),
            top: u16::from_le_bytes([buf[2], buf[3]]),
            width: u16::from_le_bytes([buf[4], buf[5]]),
            height: u16::from_le_bytes([buf[6], buf[7]]),
            cell_width: buf[8],
            cell_height: buf[9],
            foreground_color_idx: buf[10],
            background_color_idx: buf[11],
        })
    }
}

/// Builder which groups blocks into a container
#[derive(Default)]
struct ContainerBuilder {
    header: Option<Header>,
    logical_screen_desc: Option<LogicalScreenDesc>,
    global_color_table: Option<ColorTable>,
    graphic_control_ext: Option<GraphicControl>,
    image_desc: Option<ImageDesc>,
    local_color_table: Option<ColorTable>,
    image_blocks: Vec<ImageBlock>,
    comments: Vec<Comment>,
    plain_texts: Vec<PlainText>,
    applications: Vec<Application>,
}

impl ContainerBuilder {
    /// Handle one block
    fn handle_block(&mut self, block: Block) {
        match block {
            Block::Header(b) => self.header = Some(b),
            Block::LogicalScreenDesc(b) => self.logical_screen_desc = Some(b),
            Block::GlobalColorTable(b) => self.global_color_table = Some(b),
            Block::GraphicControl(b) => {
                if self.graphic_control_ext.is_some() {
                    debug!("Replacing graphic control: {:?}", b);
                }
                self.graphic_control_ext = Some(b);
            }
            Block::Comment(b) => self.comments.push(b),
            Block::PlainText(b) => self.plain_texts.push(b),
            Block::Application(b) => self.applications.push(b),
            Block::Unknown(b) => {
                debug!("Skipping unknown extension: {:02X}", b.label())
            }
            Block::ImageDesc(b) => self.image_desc = Some(b),
            Block::LocalColorTable(b) => self.local_color_table = Some(b),
            Block::ImageData(image_data) => {
                let graphic_control_ext = self.graphic_control_ext.take();
                let local_color_table = self.local_color_table.take();
                if let Some(image_desc) = self.image_desc.take() {
                    self.image_blocks.push(ImageBlock {
                        graphic_control_ext,
                        image_desc,
                        local_color_table,
                        image_data,
                    });
                }
            }
            Block::Trailer(_) => {
                if let Some(b) = self.graphic_control_ext.take() {
                    debug!("Dropping trailing graphic control: {:?}", b);
                }
            }
        }
    }

    /// Build the container
    fn build(self) -> Result<Container> {
        match (self.header, self.logical_screen_desc) {
            (Some(header), Some(logical_screen_desc)) => Ok(Container {
                header,
                logical_screen_desc,
                global_color_table: self.global_color_table,
                image_blocks: self.image_blocks,
                comments: self.comments,
                plain_texts: self.plain_texts,
                applications: self.applications,
            }),
            _ => Err(Error::UnexpectedEndOfFile),
        }
    }
}

/// Parse a complete GIF byte buffer into a container
pub fn parse(bytes: &[u8]) -> Result<Container> {
    Blocks::new(bytes, Some(MAX_IMAGE_SZ)).into_container()
}
