// bits.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Reading packed codes from a byte buffer

/// Maximum number of bits in one read
const MAX_BITS: u8 = 16;

/// Reader for codes packed least-significant bit first
#[derive(Debug)]
pub(crate) struct BitReader<'a> {
    /// Packed bytes
    buf: &'a [u8],
    /// Current position, in bits
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader
    pub fn new(buf: &'a [u8]) -> Self {
        BitReader { buf, position: 0 }
    }

    /// Get the total length, in bits
    pub fn len(&self) -> usize {
        self.buf.len() * 8
    }

    /// Get the current position, in bits
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read a code of `bits` width at an arbitrary bit offset.
    ///
    /// Returns `None` if the code would extend past the end of the buffer.
    pub fn read(&self, pos: usize, bits: u8) -> Option<u16> {
        debug_assert!(bits > 0 && bits <= MAX_BITS);
        let end = pos.checked_add(usize::from(bits))?;
        if end > self.len() {
            return None;
        }
        let shift = pos % 8;
        let need = shift + usize::from(bits);
        let mut code = 0u32;
        let mut n_bits = 0;
        for byte in &self.buf[pos / 8..] {
            if n_bits >= need {
                break;
            }
            code |= u32::from(*byte) << n_bits;
            n_bits += 8;
        }
        let mask = (1u32 << bits) - 1;
        Some(((code >> shift) & mask) as u16)
    }

    /// Peek at the next code without advancing
    pub fn peek(&self, bits: u8) -> Option<u16> {
        self.read(self.position, bits)
    }

    /// Read the next code and advance past it
    pub fn next(&mut self, bits: u8) -> Option<u16> {
        let code = self.peek(bits)?;
        self.position += usize::from(bits);
        Some(code)
    }
}
