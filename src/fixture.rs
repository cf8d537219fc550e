// fixture.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Hand-assembled GIF streams for tests
use crate::lzw::compress::compress;

/// Builder for GIF byte streams
pub(crate) struct GifBuilder {
    buf: Vec<u8>,
}

/// Get table size bits (as in the packed flags) for a number of entries
fn table_bits(len: usize) -> u8 {
    let mut bits = 0;
    while (2 << bits) < len && bits < 7 {
        bits += 1;
    }
    bits
}

/// Append a color table, padded to a power of two
fn push_table(buf: &mut Vec<u8>, table: &[[u8; 3]]) {
    let len = 2 << table_bits(table.len());
    for i in 0..len {
        buf.extend_from_slice(table.get(i).unwrap_or(&[0, 0, 0]));
    }
}

/// Append data as sub-blocks, followed by a terminator
fn push_sub_blocks(buf: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        buf.push(chunk.len() as u8);
        buf.extend_from_slice(chunk);
    }
    buf.push(0);
}

/// Reorder top-to-bottom rows into interlaced order
fn interlace(pixels: &[u8], width: usize) -> Vec<u8> {
    let height = pixels.len() / width.max(1);
    let mut out = Vec::with_capacity(pixels.len());
    for &(first, step) in [(0, 8), (4, 8), (2, 4), (1, 2)].iter() {
        for y in (first..height).step_by(step) {
            out.extend_from_slice(&pixels[y * width..(y + 1) * width]);
        }
    }
    out
}

impl GifBuilder {
    /// Start a GIF89a stream with a global table (empty for none)
    pub fn new(
        width: u16,
        height: u16,
        global: &[[u8; 3]],
        bg_idx: u8,
    ) -> Self {
        let mut buf = b"GIF89a".to_vec();
        buf.extend_from_slice(&width.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
        let flags = if global.is_empty() {
            0x70
        } else {
            0x80 | 0x70 | table_bits(global.len())
        };
        buf.extend_from_slice(&[flags, bg_idx, 0]);
        if !global.is_empty() {
            push_table(&mut buf, global);
        }
        GifBuilder { buf }
    }

    /// Add a graphic control extension
    pub fn graphic_control(
        mut self,
        disposal: u8,
        delay_cs: u16,
        transparent: Option<u8>,
    ) -> Self {
        let flags = (disposal << 2) | u8::from(transparent.is_some());
        let delay = delay_cs.to_le_bytes();
        let idx = transparent.unwrap_or(0);
        self.buf.extend_from_slice(&[0x21, 0xF9, 4, flags]);
        self.buf.extend_from_slice(&[delay[0], delay[1], idx, 0]);
        self
    }

    /// Add a comment extension
    pub fn comment(mut self, text: &[u8]) -> Self {
        self.buf.extend_from_slice(&[0x21, 0xFE]);
        push_sub_blocks(&mut self.buf, text);
        self
    }

    /// Add a NETSCAPE2.0 application extension with one data sub-block
    pub fn loop_count(mut self, payload: &[u8]) -> Self {
        self.buf.extend_from_slice(&[0x21, 0xFF, 11]);
        self.buf.extend_from_slice(b"NETSCAPE2.0");
        push_sub_blocks(&mut self.buf, payload);
        self
    }

    /// Add an extension with a raw body (sub-blocks and terminator)
    pub fn extension(mut self, label: u8, body: &[u8]) -> Self {
        self.buf.extend_from_slice(&[0x21, label]);
        self.buf.extend_from_slice(body);
        self
    }

    /// Add an image using the global color table
    pub fn image(
        self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> Self {
        self.image_local(left, top, width, height, &[], false, pixels)
    }

    /// Add an image with an optional local table (empty for none)
    #[allow(clippy::too_many_arguments)]
    pub fn image_local(
        self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        table: &[[u8; 3]],
        interlaced: bool,
        pixels: &[u8],
    ) -> Self {
        let max = pixels.iter().copied().max().unwrap_or(0);
        let mut min_code_size = 2;
        while (1 << min_code_size) <= usize::from(max) {
            min_code_size += 1;
        }
        let ordered = if interlaced {
            interlace(pixels, usize::from(width))
        } else {
            pixels.to_vec()
        };
        let data = compress(min_code_size, &ordered);
        self.image_raw(
            left,
            top,
            width,
            height,
            table,
            interlaced,
            min_code_size,
            &data,
        )
    }

    /// Add an image with already compressed data
    #[allow(clippy::too_many_arguments)]
    pub fn image_raw(
        mut self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        table: &[[u8; 3]],
        interlaced: bool,
        min_code_size: u8,
        data: &[u8],
    ) -> Self {
        let mut flags = if interlaced { 0x40 } else { 0 };
        if !table.is_empty() {
            flags |= 0x80 | table_bits(table.len());
        }
        self.buf.push(0x2C);
        for v in [left, top, width, height].iter() {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self.buf.push(flags);
        if !table.is_empty() {
            push_table(&mut self.buf, table);
        }
        self.buf.push(min_code_size);
        push_sub_blocks(&mut self.buf, data);
        self
    }

    /// Finish the stream with a trailer
    pub fn build(mut self) -> Vec<u8> {
        self.buf.push(0x3B);
        self.buf
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_sizes() {
        assert_eq!(table_bits(1), 0);
        assert_eq!(table_bits(2), 0);
        assert_eq!(table_bits(3), 1);
        assert_eq!(table_bits(4), 1);
        assert_eq!(table_bits(256), 7);
    }

    #[test]
    fn interlaced_rows() {
        let rows: Vec<u8> = (0..10).collect();
        assert_eq!(interlace(&rows, 1), [0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
    }
}
