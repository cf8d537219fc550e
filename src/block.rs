// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF block types
use pix::rgb::SRgb8;

/// Number of bytes per color table entry
const CHANNELS: usize = 3;

/// Color table existence flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableExistence {
    /// No color table
    Absent,
    /// Color table follows its descriptor
    Present,
}

/// Color table ordering flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableOrdering {
    /// Not sorted
    NotSorted,
    /// Sorted by decreasing importance
    Sorted,
}

/// Color table configuration, decoded from a descriptor's packed flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    existence: ColorTableExistence,
    ordering: ColorTableOrdering,
    table_len: usize, // must be between 2...256
}

impl ColorTableConfig {
    /// Decode a configuration from presence flag, sort flag and the 3-bit
    /// size exponent.
    fn from_flags(present: bool, sorted: bool, size_bits: u8) -> Self {
        let existence = if present {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        };
        let ordering = if sorted {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        };
        let table_len = 2 << (size_bits & 0b0111);
        ColorTableConfig {
            existence,
            ordering,
            table_len,
        }
    }

    /// Get the existence flag
    pub fn existence(&self) -> ColorTableExistence {
        self.existence
    }

    /// Get the ordering flag
    pub fn ordering(&self) -> ColorTableOrdering {
        self.ordering
    }

    /// Get the number of entries (zero if absent)
    pub fn len(&self) -> usize {
        match self.existence {
            ColorTableExistence::Absent => 0,
            ColorTableExistence::Present => self.table_len,
        }
    }

    /// Check if the table is absent
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size of the table in bytes
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Method for disposing of a frame before the next one is painted
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    NoAction,
    /// Leave the frame in place
    Keep,
    /// Restore the canvas to the background color
    Background,
    /// Restore the canvas to its state before the frame
    Previous,
    /// Reserved value (4-7)
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            n => Reserved(n),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

/// Extension label (the byte following the introducer)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

/// Header block: signature and version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Header {
    /// Create a header with a version
    pub fn with_version(version: [u8; 3]) -> Self {
        Header { version }
    }

    /// Get the version (`87a` or `89a`)
    pub fn version(&self) -> [u8; 3] {
        self.version
    }

    /// Check whether the version is one of the known ones
    pub fn is_known_version(&self) -> bool {
        matches!(&self.version, b"87a" | b"89a")
    }
}

/// Logical Screen Descriptor block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0000_1000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Adjust the screen width
    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }

    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    /// Adjust the screen height
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }

    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    /// Get the screen size (in pixels)
    pub fn screen_sz(&self) -> usize {
        usize::from(self.screen_width) * usize::from(self.screen_height)
    }

    /// Adjust the packed flags
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Get the packed flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Get the color resolution (bits per primary color, 1-8)
    pub fn color_resolution(&self) -> u8 {
        ((self.flags & Self::COLOR_RESOLUTION) >> 4) + 1
    }

    /// Get the global color table configuration
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(
            self.flags & Self::COLOR_TABLE_PRESENT != 0,
            self.flags & Self::COLOR_TABLE_ORDERING != 0,
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }

    /// Adjust the background color index
    pub fn with_background_color_idx(mut self, idx: u8) -> Self {
        self.background_color_idx = idx;
        self
    }

    /// Get the background color index
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }

    /// Adjust the pixel aspect ratio
    pub fn with_pixel_aspect_ratio(mut self, ratio: u8) -> Self {
        self.pixel_aspect_ratio = ratio;
        self
    }

    /// Get the pixel aspect ratio
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Color table (global or local)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<u8>,
}

impl ColorTable {
    /// Create a color table from packed RGB triples
    pub fn with_colors(colors: &[u8]) -> Self {
        let n = colors.len() / CHANNELS * CHANNELS;
        let colors = colors[..n].to_vec();
        ColorTable { colors }
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get the packed RGB triples
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Look up the channels of one entry
    pub fn rgb(&self, idx: u8) -> Option<[u8; 3]> {
        let i = usize::from(idx) * CHANNELS;
        self.colors.get(i..i + CHANNELS).map(|c| [c[0], c[1], c[2]])
    }

    /// Look up one entry
    pub fn color(&self, idx: u8) -> Option<SRgb8> {
        self.rgb(idx).map(|[r, g, b]| SRgb8::new(r, g, b))
    }
}

/// Graphic Control extension block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    /// Adjust the packed flags
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Get the packed flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Get the disposal method
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }

    /// Get the user input flag
    pub fn user_input(&self) -> bool {
        (self.flags & Self::USER_INPUT) != 0
    }

    /// Adjust the delay time
    pub fn with_delay_time_cs(mut self, delay_time_cs: u16) -> Self {
        self.delay_time_cs = delay_time_cs;
        self
    }

    /// Get the delay time in centiseconds
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    /// Adjust the transparent color index (flag is not changed)
    pub fn with_transparent_color_idx(mut self, idx: u8) -> Self {
        self.transparent_color_idx = idx;
        self
    }

    /// Get the transparent color index, if the flag is set
    pub fn transparent_color(&self) -> Option<u8> {
        if (self.flags & Self::TRANSPARENT_COLOR) != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
}

/// Comment extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
    comments: Vec<Vec<u8>>, // ascii only comments recommended
}

impl Comment {
    /// Add one comment sub-block
    pub fn add_comment(&mut self, b: &[u8]) {
        self.comments.push(b.to_vec());
    }

    /// Get the comment sub-blocks
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }
}

/// Text grid of a plain text extension
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextGrid {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub cell_width: u8,
    pub cell_height: u8,
    pub foreground_color_idx: u8,
    pub background_color_idx: u8,
}

/// Plain Text extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlainText {
    grid: Option<TextGrid>,
    sub_blocks: Vec<Vec<u8>>, // text data
}

impl PlainText {
    /// Adjust the text grid
    pub fn set_grid(&mut self, grid: TextGrid) {
        self.grid = Some(grid);
    }

    /// Get the text grid
    pub fn grid(&self) -> Option<TextGrid> {
        self.grid
    }

    /// Add a text sub-block
    pub fn add_sub_block(&mut self, b: &[u8]) {
        self.sub_blocks.push(b.to_vec());
    }

    /// Get the text sub-blocks
    pub fn sub_blocks(&self) -> &[Vec<u8>] {
        &self.sub_blocks
    }
}

/// Application extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Application {
    app_id: Vec<u8>,
    auth_code: Vec<u8>,
    app_data: Vec<Vec<u8>>, // sequence of sub-blocks
}

impl Application {
    /// Create an application block with identifier and authentication code
    pub fn with_id(app_id: &[u8], auth_code: &[u8]) -> Self {
        Application {
            app_id: app_id.to_vec(),
            auth_code: auth_code.to_vec(),
            app_data: vec![],
        }
    }

    /// Get the application identifier (8 bytes)
    pub fn app_id(&self) -> &[u8] {
        &self.app_id
    }

    /// Get the authentication code (3 bytes)
    pub fn auth_code(&self) -> &[u8] {
        &self.auth_code
    }

    /// Add a data sub-block
    pub fn add_app_data(&mut self, b: &[u8]) {
        self.app_data.push(b.to_vec());
    }

    /// Get the data sub-blocks
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }

    /// Get the loop count, if the first data sub-block is a loop sub-block.
    ///
    /// Zero means loop forever.
    pub fn loop_count(&self) -> Option<u16> {
        match self.app_data.first() {
            Some(d) if d.len() >= 3 && d[0] == 1 => {
                Some(u16::from_le_bytes([d[1], d[2]]))
            }
            _ => None,
        }
    }
}

/// Extension block with an unrecognized label
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unknown {
    label: u8,
    sub_blocks: Vec<Vec<u8>>,
}

impl Unknown {
    /// Create an unknown extension block
    pub fn new(label: u8) -> Self {
        Unknown {
            label,
            sub_blocks: vec![],
        }
    }

    /// Get the extension label
    pub fn label(&self) -> u8 {
        self.label
    }

    /// Add a sub-block
    pub fn add_sub_block(&mut self, b: &[u8]) {
        self.sub_blocks.push(b.to_vec());
    }

    /// Get the sub-blocks
    pub fn sub_blocks(&self) -> &[Vec<u8>] {
        &self.sub_blocks
    }
}

/// Image Descriptor block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0010_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Adjust the left position
    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }

    /// Get the left position
    pub fn left(&self) -> u16 {
        self.left
    }

    /// Adjust the top position
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }

    /// Get the top position
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Adjust the width
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// Get the width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Adjust the height
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }

    /// Get the height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Adjust the packed flags
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Get the packed flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Check whether the image is interlaced
    pub fn interlaced(&self) -> bool {
        (self.flags & Self::INTERLACED) != 0
    }

    /// Get the local color table configuration
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(
            self.flags & Self::COLOR_TABLE_PRESENT != 0,
            self.flags & Self::COLOR_TABLE_ORDERING != 0,
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }

    /// Get the image size (in pixels)
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Check whether a canvas position lies within the image rectangle
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let left = u32::from(self.left);
        let top = u32::from(self.top);
        x >= left
            && x < left + u32::from(self.width)
            && y >= top
            && y < top + u32::from(self.height)
    }
}

/// Image data: LZW minimum code size and concatenated sub-blocks
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageData {
    min_code_size: u8,
    data: Vec<u8>,
}

impl ImageData {
    /// Create empty image data
    pub fn new(min_code_size: u8) -> Self {
        ImageData {
            min_code_size,
            data: vec![],
        }
    }

    /// Append one sub-block of compressed data
    pub fn add_data(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    /// Get the LZW minimum code size
    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }

    /// Get the compressed data
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Trailer block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trailer {}

/// One block of a GIF stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Header(Header),
    LogicalScreenDesc(LogicalScreenDesc),
    GlobalColorTable(ColorTable),
    PlainText(PlainText),
    GraphicControl(GraphicControl),
    Comment(Comment),
    Application(Application),
    Unknown(Unknown),
    ImageDesc(ImageDesc),
    LocalColorTable(ColorTable),
    ImageData(ImageData),
    Trailer(Trailer),
}

impl From<Header> for Block {
    fn from(b: Header) -> Self {
        Block::Header(b)
    }
}

impl From<LogicalScreenDesc> for Block {
    fn from(b: LogicalScreenDesc) -> Self {
        Block::LogicalScreenDesc(b)
    }
}

impl From<PlainText> for Block {
    fn from(b: PlainText) -> Self {
        Block::PlainText(b)
    }
}

impl From<GraphicControl> for Block {
    fn from(b: GraphicControl) -> Self {
        Block::GraphicControl(b)
    }
}

impl From<Comment> for Block {
    fn from(b: Comment) -> Self {
        Block::Comment(b)
    }
}

impl From<Application> for Block {
    fn from(b: Application) -> Self {
        Block::Application(b)
    }
}

impl From<Unknown> for Block {
    fn from(b: Unknown) -> Self {
        Block::Unknown(b)
    }
}

impl From<ImageDesc> for Block {
    fn from(b: ImageDesc) -> Self {
        Block::ImageDesc(b)
    }
}

impl From<ImageData> for Block {
    fn from(b: ImageData) -> Self {
        Block::ImageData(b)
    }
}

impl From<Trailer> for Block {
    fn from(b: Trailer) -> Self {
        Block::Trailer(b)
    }
}

/// One image block, with the graphic control extension preceding it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBlock {
    pub graphic_control_ext: Option<GraphicControl>,
    pub image_desc: ImageDesc,
    pub local_color_table: Option<ColorTable>,
    pub image_data: ImageData,
}

impl ImageBlock {
    /// Get the disposal method (`Background` if no graphic control)
    pub fn disposal_method(&self) -> DisposalMethod {
        self.graphic_control_ext
            .map_or(DisposalMethod::Background, |c| c.disposal_method())
    }

    /// Get the transparent color index
    pub fn transparent_color(&self) -> Option<u8> {
        self.graphic_control_ext.and_then(|c| c.transparent_color())
    }

    /// Get the delay in seconds.
    ///
    /// Without a graphic control, one 60th of a second; with a zero delay,
    /// one tenth of a second.
    pub fn delay_secs(&self) -> f32 {
        match self.graphic_control_ext {
            None => 1.0 / 60.0,
            Some(c) if c.delay_time_cs() == 0 => 0.1,
            Some(c) => f32::from(c.delay_time_cs()) / 100.0,
        }
    }
}

/// Parsed GIF container: every block of the stream, grouped
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub header: Header,
    pub logical_screen_desc: LogicalScreenDesc,
    pub global_color_table: Option<ColorTable>,
    pub image_blocks: Vec<ImageBlock>,
    pub comments: Vec<Comment>,
    pub plain_texts: Vec<PlainText>,
    pub applications: Vec<Application>,
}

impl Container {
    /// Get the GIF version
    pub fn version(&self) -> [u8; 3] {
        self.header.version()
    }

    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.logical_screen_desc.screen_width()
    }

    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.logical_screen_desc.screen_height()
    }

    /// Get the color resolution (bits per primary color)
    pub fn color_resolution(&self) -> u8 {
        self.logical_screen_desc.color_resolution()
    }

    /// Get the background color index
    pub fn background_color_idx(&self) -> u8 {
        self.logical_screen_desc.background_color_idx()
    }

    /// Get the pixel aspect ratio
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.logical_screen_desc.pixel_aspect_ratio()
    }

    /// Get the number of times to loop the animation (zero means forever)
    pub fn loop_count(&self) -> u16 {
        self.applications
            .iter()
            .find_map(|a| a.loop_count())
            .unwrap_or(0)
    }

    /// Get the image blocks
    pub fn image_blocks(&self) -> &[ImageBlock] {
        &self.image_blocks
    }

    /// Get the comment extensions
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Get the plain text extensions
    pub fn plain_texts(&self) -> &[PlainText] {
        &self.plain_texts
    }

    /// Get the application extensions
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    /// Get the active color table for an image block.
    ///
    /// A flagged local table supersedes the global table.
    pub fn color_table<'a>(
        &'a self,
        block: &'a ImageBlock,
    ) -> Option<&'a ColorTable> {
        let local = block.image_desc.color_table_config().existence();
        let global = self.logical_screen_desc.color_table_config().existence();
        if local == ColorTableExistence::Present {
            block.local_color_table.as_ref()
        } else if global == ColorTableExistence::Present {
            self.global_color_table.as_ref()
        } else {
            None
        }
    }
}
