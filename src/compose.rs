// compose.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Frame compositing: image blocks to canvas-sized RGBA frames
use crate::block::{ColorTable, Container, DisposalMethod, ImageBlock};
use crate::error::{Result, Warning};
use crate::interlace;
use crate::lzw::Decompressor;
use crate::private::{Animation, Frame};
use pix::rgb::SRgba8;
use pix::Raster;

/// An `Iterator` of composited [Frame]s, one per image block.
///
/// Each frame is seeded by the disposal method of the frame before it, then
/// the image block is painted over the seed.  Non-fatal problems are
/// collected as [Warning]s.
///
/// [Frame]: struct.Frame.html
/// [Warning]: enum.Warning.html
pub struct Frames {
    /// Parsed container
    container: Container,
    /// Compositing state
    state: State,
    /// Index of next image block
    index: usize,
}

/// State carried from one frame to the next
struct State {
    /// Canvas width
    width: u32,
    /// Canvas height
    height: u32,
    /// Fail on invalid LZW codes
    strict: bool,
    /// Canvas and disposal method of the previous frame
    previous: Option<(Vec<SRgba8>, DisposalMethod)>,
    /// Canvas of the latest frame disposed with `NoAction` or `Keep`
    restore: Option<Vec<SRgba8>>,
    /// Warnings collected so far
    warnings: Vec<Warning>,
}

impl Iterator for Frames {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.container.image_blocks.get(self.index)?;
        let res = self.state.compose_frame(&self.container, block, self.index);
        self.index = if res.is_ok() {
            self.index + 1
        } else {
            self.container.image_blocks.len()
        };
        Some(res)
    }
}

impl Frames {
    /// Create a frame iterator over a container
    pub fn new(container: Container) -> Self {
        let mut warnings = vec![];
        if !container.header.is_known_version() {
            let version = container.version();
            warn!("Unknown version: {}", String::from_utf8_lossy(&version));
            warnings.push(Warning::UnknownVersion(version));
        }
        let state = State {
            width: container.screen_width().into(),
            height: container.screen_height().into(),
            strict: false,
            previous: None,
            restore: None,
            warnings,
        };
        Frames {
            container,
            state,
            index: 0,
        }
    }

    /// Fail on invalid LZW codes instead of skipping them
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.state.strict = strict;
        self
    }

    /// Get the container
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Get warnings collected so far
    pub fn warnings(&self) -> &[Warning] {
        &self.state.warnings
    }

    /// Composite all remaining frames into an animation
    pub fn into_animation(mut self) -> Result<Animation> {
        let frames = self.by_ref().collect::<Result<Vec<_>>>()?;
        Ok(Animation {
            frames,
            warnings: self.state.warnings,
            loop_count: self.container.loop_count(),
        })
    }
}

impl State {
    /// Get number of pixels on the canvas
    fn canvas_sz(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Record a warning
    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Composite one image block
    fn compose_frame(
        &mut self,
        container: &Container,
        block: &ImageBlock,
        frame: usize,
    ) -> Result<Frame> {
        let table = container.color_table(block);
        let transparent = block.transparent_color();
        let bg_idx = container.background_color_idx();
        let bg = background(table, bg_idx, transparent);
        if table.is_none() {
            self.warn(Warning::MissingColorTable { frame });
        }
        let mut canvas = self.seed(bg);
        let pixels = self.decode_pixels(block, frame)?;
        let size = (self.width, self.height);
        if let Some(index) = paint(&mut canvas, size, block, table, &pixels) {
            self.warn(Warning::InvalidColorIndex { frame, index });
        }
        let disposal = block.disposal_method();
        debug!("frame {}: {:?} {:?}", frame, block.image_desc, disposal);
        if let DisposalMethod::NoAction | DisposalMethod::Keep = disposal {
            self.restore = Some(canvas.clone());
        }
        let raster =
            Raster::with_pixels(self.width, self.height, canvas.clone());
        self.previous = Some((canvas, disposal));
        Ok(Frame::new(raster, block))
    }

    /// Decompress (and de-interlace) the indices of an image block.
    ///
    /// Pixels past the end of truncated data are `None`.
    fn decode_pixels(
        &mut self,
        block: &ImageBlock,
        frame: usize,
    ) -> Result<Vec<Option<u8>>> {
        let desc = &block.image_desc;
        let expected = desc.image_sz();
        let data = &block.image_data;
        let decoded = Decompressor::new(data.min_code_size())
            .with_strict(self.strict)
            .decompress(data.data(), expected)?;
        if decoded.len() < expected {
            self.warn(Warning::TruncatedData {
                frame,
                expected,
                decoded: decoded.len(),
            });
        }
        let mut pixels: Vec<Option<u8>> =
            decoded.into_iter().map(Some).collect();
        pixels.resize(expected, None);
        if desc.interlaced() {
            Ok(interlace::reorder(&pixels, desc.width().into()))
        } else {
            Ok(pixels)
        }
    }

    /// Seed a new canvas from the previous frame's disposal method
    fn seed(&self, bg: SRgba8) -> Vec<SRgba8> {
        match self.previous.as_ref().map(|p| p.1) {
            None => self.seed_background(bg),
            Some(DisposalMethod::NoAction) => self.seed_blank(bg),
            Some(DisposalMethod::Keep) => self.seed_keep(bg),
            Some(DisposalMethod::Background) => self.seed_background(bg),
            Some(DisposalMethod::Previous) => self.seed_previous(bg),
            Some(DisposalMethod::Reserved(_)) => self.seed_blank(bg),
        }
    }

    /// Leave the canvas blank: unpainted pixels show the background
    fn seed_blank(&self, bg: SRgba8) -> Vec<SRgba8> {
        vec![bg; self.canvas_sz()]
    }

    /// Start from the previous frame
    fn seed_keep(&self, bg: SRgba8) -> Vec<SRgba8> {
        match &self.previous {
            Some((canvas, _)) => canvas.clone(),
            None => self.seed_blank(bg),
        }
    }

    /// Fill with the background color
    fn seed_background(&self, bg: SRgba8) -> Vec<SRgba8> {
        vec![bg; self.canvas_sz()]
    }

    /// Restore the latest frame disposed with `NoAction` or `Keep`
    fn seed_previous(&self, bg: SRgba8) -> Vec<SRgba8> {
        match &self.restore {
            Some(canvas) => canvas.clone(),
            None => self.seed_blank(bg),
        }
    }
}

/// Get the background color of a frame.
///
/// It is transparent when the background index is also the transparent
/// index.
fn background(
    table: Option<&ColorTable>,
    bg_idx: u8,
    transparent: Option<u8>,
) -> SRgba8 {
    let alpha = if transparent == Some(bg_idx) { 0 } else { 255 };
    match table.and_then(|t| t.rgb(bg_idx)) {
        Some([r, g, b]) => SRgba8::new(r, g, b, alpha),
        None => SRgba8::new(0, 0, 0, 255),
    }
}

/// Paint an image block onto a seeded canvas.
///
/// Returns the first color index missing from the table, if any.
fn paint(
    canvas: &mut [SRgba8],
    (canvas_width, canvas_height): (u32, u32),
    block: &ImageBlock,
    table: Option<&ColorTable>,
    pixels: &[Option<u8>],
) -> Option<u8> {
    let desc = &block.image_desc;
    let transparent = block.transparent_color();
    let width = u32::from(desc.width());
    let height = u32::from(desc.height());
    let mut invalid = None;
    for y in 0..height {
        let cy = u32::from(desc.top()) + y;
        if cy >= canvas_height {
            break;
        }
        for x in 0..width {
            let cx = u32::from(desc.left()) + x;
            if cx >= canvas_width {
                break;
            }
            let idx = match pixels[(y * width + x) as usize] {
                Some(idx) if Some(idx) != transparent => idx,
                _ => continue,
            };
            let table = match table {
                Some(table) => table,
                None => continue,
            };
            match table.rgb(idx) {
                Some([r, g, b]) => {
                    let i = (cy * canvas_width + cx) as usize;
                    canvas[i] = SRgba8::new(r, g, b, 255);
                }
                None => {
                    invalid.get_or_insert(idx);
                }
            }
        }
    }
    invalid
}

/// Composite every frame of a container into an animation
pub fn compose(container: Container) -> Result<Animation> {
    Frames::new(container).into_animation()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::parse;
    use crate::error::Error;
    use crate::fixture::GifBuilder;
    use crate::lzw::compress::compress;

    const RED: [u8; 3] = [255, 0, 0];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [0, 0, 255];
    const WHITE: [u8; 3] = [255, 255, 255];
    const PALETTE: &[[u8; 3]] = &[RED, GREEN, BLUE, WHITE];

    fn decode(gif: &[u8]) -> Animation {
        compose(parse(gif).unwrap()).unwrap()
    }

    /// Get RGBA of one canvas pixel
    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 4] {
        let w = frame.raster().width() as usize;
        let i = (y * w + x) * 4;
        let p = &frame.rgba()[i..i + 4];
        [p[0], p[1], p[2], p[3]]
    }

    fn opaque(c: [u8; 3]) -> [u8; 4] {
        [c[0], c[1], c[2], 255]
    }

    #[test]
    fn canvas_sized_frames() {
        let gif = GifBuilder::new(4, 3, PALETTE, 3)
            .image(0, 0, 2, 2, &[0, 1, 2, 0])
            .image(3, 2, 3, 3, &[1; 9])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.frames.len(), 2);
        for frame in &anim.frames {
            assert_eq!(frame.raster().width(), 4);
            assert_eq!(frame.raster().height(), 3);
            assert_eq!(frame.rgba().len(), 4 * 3 * 4);
        }
        let f = &anim.frames[1];
        assert_eq!(pixel(f, 3, 2), opaque(GREEN));
        assert_eq!(pixel(f, 2, 2), opaque(WHITE));
        assert!(anim.warnings.is_empty());
    }

    #[test]
    fn idempotent() {
        let gif = GifBuilder::new(3, 3, PALETTE, 0)
            .graphic_control(1, 5, Some(0))
            .image(0, 0, 3, 3, &[1, 0, 2, 2, 0, 1, 3, 3, 0])
            .graphic_control(3, 5, None)
            .image(1, 1, 2, 2, &[0, 1, 2, 3])
            .image(0, 0, 1, 1, &[2])
            .build();
        let a = decode(&gif);
        let b = decode(&gif);
        assert_eq!(a.frames.len(), b.frames.len());
        for (fa, fb) in a.frames.iter().zip(b.frames.iter()) {
            assert_eq!(fa.rgba(), fb.rgba());
            assert_eq!(fa.delay_secs(), fb.delay_secs());
        }
    }

    #[test]
    fn black_then_white() {
        let gif = GifBuilder::new(2, 2, &[[0, 0, 0], WHITE], 0)
            .graphic_control(2, 10, None)
            .image(0, 0, 2, 2, &[0; 4])
            .graphic_control(0, 25, None)
            .image(0, 0, 2, 2, &[1; 4])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.frames.len(), 2);
        assert!(anim.frames[0].rgba().chunks(4).all(|p| p == [0, 0, 0, 255]));
        assert!(anim.frames[1].rgba().chunks(4).all(|p| p == opaque(WHITE)));
        assert_eq!(anim.frames[0].delay_secs(), 0.1);
        assert_eq!(anim.frames[1].delay_secs(), 0.25);
        let disposal = anim.frames[0].disposal_method();
        assert_eq!(disposal, DisposalMethod::Background);
    }

    #[test]
    fn single_pixel() {
        let gif = GifBuilder::new(1, 1, &[[10, 20, 30]], 0)
            .image(0, 0, 1, 1, &[0])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.frames.len(), 1);
        assert_eq!(anim.frames[0].rgba(), [10, 20, 30, 255]);
        assert_eq!(anim.frames[0].delay_secs(), 1.0 / 60.0);
        assert_eq!(anim.loop_count, 0);
        assert!(anim.warnings.is_empty());
    }

    #[test]
    fn zero_delay() {
        let gif = GifBuilder::new(1, 1, PALETTE, 0)
            .graphic_control(0, 0, None)
            .image(0, 0, 1, 1, &[0])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.frames[0].delay_secs(), 0.1);
        assert_eq!(anim.frames[0].delay().as_millis(), 100);
    }

    #[test]
    fn dispose_to_background() {
        let gif = GifBuilder::new(4, 4, PALETTE, 3)
            .graphic_control(2, 0, None)
            .image(0, 0, 4, 4, &[0; 16])
            .image(1, 1, 1, 1, &[1])
            .build();
        let anim = decode(&gif);
        let f = &anim.frames[1];
        for y in 0..4 {
            for x in 0..4 {
                let c = if (x, y) == (1, 1) { GREEN } else { WHITE };
                assert_eq!(pixel(f, x, y), opaque(c));
            }
        }
    }

    #[test]
    fn transparent_background() {
        let gif = GifBuilder::new(3, 1, PALETTE, 3)
            .graphic_control(2, 0, None)
            .image(0, 0, 3, 1, &[0; 3])
            .graphic_control(0, 0, Some(3))
            .image(0, 0, 1, 1, &[1])
            .build();
        let anim = decode(&gif);
        let f = &anim.frames[1];
        assert_eq!(pixel(f, 0, 0), opaque(GREEN));
        assert_eq!(pixel(f, 1, 0), [255, 255, 255, 0]);
        assert_eq!(pixel(f, 2, 0), [255, 255, 255, 0]);
    }

    #[test]
    fn dispose_keep() {
        let first: Vec<u8> = (0..16).map(|i| (i % 3) as u8).collect();
        let gif = GifBuilder::new(4, 4, PALETTE, 3)
            .graphic_control(1, 0, None)
            .image(0, 0, 4, 4, &first)
            .image(2, 2, 2, 2, &[3; 4])
            .build();
        let anim = decode(&gif);
        let (f0, f1) = (&anim.frames[0], &anim.frames[1]);
        for y in 0..4 {
            for x in 0..4 {
                if x >= 2 && y >= 2 {
                    assert_eq!(pixel(f1, x, y), opaque(WHITE));
                } else {
                    assert_eq!(pixel(f1, x, y), pixel(f0, x, y));
                }
            }
        }
    }

    #[test]
    fn transparent_shows_previous() {
        let gif = GifBuilder::new(2, 2, PALETTE, 3)
            .graphic_control(1, 0, None)
            .image(0, 0, 2, 2, &[0; 4])
            .graphic_control(1, 0, Some(2))
            .image(0, 0, 2, 2, &[2, 1, 2, 1])
            .build();
        let anim = decode(&gif);
        let f = &anim.frames[1];
        assert_eq!(pixel(f, 0, 0), opaque(RED));
        assert_eq!(pixel(f, 1, 0), opaque(GREEN));
        assert_eq!(pixel(f, 0, 1), opaque(RED));
        assert_eq!(pixel(f, 1, 1), opaque(GREEN));
    }

    #[test]
    fn dispose_previous() {
        let gif = GifBuilder::new(2, 2, PALETTE, 3)
            .graphic_control(1, 0, None)
            .image(0, 0, 2, 2, &[0; 4])
            .graphic_control(3, 0, None)
            .image(0, 0, 2, 2, &[1; 4])
            .image(0, 0, 1, 1, &[2])
            .build();
        let anim = decode(&gif);
        let f = &anim.frames[2];
        assert_eq!(pixel(f, 0, 0), opaque(BLUE));
        assert_eq!(pixel(f, 1, 0), opaque(RED));
        assert_eq!(pixel(f, 0, 1), opaque(RED));
        assert_eq!(pixel(f, 1, 1), opaque(RED));
    }

    #[test]
    fn dispose_previous_without_earlier() {
        let gif = GifBuilder::new(2, 1, PALETTE, 3)
            .graphic_control(3, 0, None)
            .image(0, 0, 2, 1, &[0; 2])
            .image(0, 0, 1, 1, &[1])
            .build();
        let anim = decode(&gif);
        let f = &anim.frames[1];
        assert_eq!(pixel(f, 0, 0), opaque(GREEN));
        assert_eq!(pixel(f, 1, 0), opaque(WHITE));
    }

    #[test]
    fn interlaced() {
        let pixels: Vec<u8> = (0..30).map(|i| ((i / 3) % 4) as u8).collect();
        let plain = GifBuilder::new(3, 10, PALETTE, 0)
            .image(0, 0, 3, 10, &pixels)
            .build();
        let inter = GifBuilder::new(3, 10, PALETTE, 0)
            .image_local(0, 0, 3, 10, &[], true, &pixels)
            .build();
        let a = decode(&plain);
        let b = decode(&inter);
        assert!(b.frames[0].image_desc().interlaced());
        assert_eq!(a.frames[0].rgba(), b.frames[0].rgba());
    }

    #[test]
    fn local_table() {
        let gif = GifBuilder::new(2, 1, PALETTE, 0)
            .image_local(0, 0, 2, 1, &[[1, 2, 3], [4, 5, 6]], false, &[1, 0])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.frames[0].rgba(), [4, 5, 6, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn one_bit_min_code_size() {
        let data = compress(1, &[0, 1, 1, 0]);
        let gif = GifBuilder::new(2, 2, &[RED, GREEN], 0)
            .image_raw(0, 0, 2, 2, &[], false, 1, &data)
            .build();
        let anim = decode(&gif);
        assert!(anim.warnings.is_empty());
        let f = &anim.frames[0];
        assert_eq!(pixel(f, 0, 0), opaque(RED));
        assert_eq!(pixel(f, 1, 0), opaque(GREEN));
        assert_eq!(pixel(f, 0, 1), opaque(GREEN));
        assert_eq!(pixel(f, 1, 1), opaque(RED));
    }

    #[test]
    fn truncated_data() {
        let data = compress(2, &[1; 16]);
        let gif = GifBuilder::new(4, 4, &[[0, 0, 0], WHITE], 0)
            .image_raw(0, 0, 4, 4, &[], false, 2, &data[..2])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.frames.len(), 1);
        match anim.warnings.as_slice() {
            [Warning::TruncatedData {
                frame: 0,
                expected: 16,
                decoded,
            }] => assert!(*decoded < 16),
            w => panic!("unexpected warnings: {:?}", w),
        }
        let f = &anim.frames[0];
        assert_eq!(pixel(f, 0, 0), opaque(WHITE));
        assert_eq!(pixel(f, 3, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn invalid_color_index() {
        let gif = GifBuilder::new(2, 1, &[RED, GREEN], 0)
            .image(0, 0, 2, 1, &[1, 3])
            .build();
        let anim = decode(&gif);
        assert_eq!(
            anim.warnings,
            [Warning::InvalidColorIndex { frame: 0, index: 3 }]
        );
        let f = &anim.frames[0];
        assert_eq!(pixel(f, 0, 0), opaque(GREEN));
        assert_eq!(pixel(f, 1, 0), opaque(RED));
    }

    #[test]
    fn missing_color_table() {
        let gif = GifBuilder::new(2, 1, &[], 0)
            .image(0, 0, 2, 1, &[0, 1])
            .build();
        let anim = decode(&gif);
        assert_eq!(anim.warnings, [Warning::MissingColorTable { frame: 0 }]);
        assert_eq!(anim.frames[0].rgba(), [0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn unknown_version() {
        let mut gif = GifBuilder::new(1, 1, PALETTE, 0)
            .image(0, 0, 1, 1, &[0])
            .build();
        gif[3..6].copy_from_slice(b"90a");
        let anim = decode(&gif);
        assert_eq!(anim.warnings, [Warning::UnknownVersion(*b"90a")]);
        assert_eq!(anim.frames.len(), 1);
    }

    #[test]
    fn strict_lzw() {
        let gif = GifBuilder::new(2, 1, PALETTE, 0)
            .image_raw(0, 0, 2, 1, &[], false, 2, &[0x7C, 0x0A])
            .build();
        let container = parse(&gif).unwrap();
        let anim = compose(container.clone()).unwrap();
        assert_eq!(anim.frames.len(), 1);
        let mut frames = Frames::new(container).with_strict(true);
        assert!(matches!(frames.next(), Some(Err(Error::InvalidLzwData))));
        assert!(frames.next().is_none());
    }
}
