// lzw.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF
use crate::bits::BitReader;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> usize {
        1 << self.0
    }
}

/// Code type
type Code = u16;

/// Dictionary node: a byte appended to the string of another code
#[derive(Clone, Copy, Debug)]
struct Node {
    /// Prefix code
    prefix: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Code dictionary, append-only between resets
#[derive(Debug)]
struct Dictionary {
    /// Table of codes
    table: Vec<Node>,
    /// Minimum code bits
    min_code_bits: u8,
}

impl Dictionary {
    /// Create a new code dictionary
    fn new(min_code_bits: u8) -> Self {
        let mut dict = Dictionary {
            table: Vec::with_capacity(Bits::MAX.entries()),
            min_code_bits,
        };
        dict.reset();
        dict
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the number of entries (including clear and end codes)
    fn len(&self) -> usize {
        self.table.len()
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Reset to single-byte entries plus clear and end codes
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.push_node(None, byte as u8);
        }
        self.push_node(None, 0); // clear code
        self.push_node(None, 0); // end code
    }

    /// Push a node into the dictionary
    fn push_node(&mut self, prefix: Option<Code>, byte: u8) {
        if self.table.len() < Bits::MAX.entries() {
            self.table.push(Node { prefix, byte });
        }
    }

    /// Get the first byte of a code's string
    fn first_byte(&self, code: Code) -> u8 {
        let mut node = self.table[usize::from(code)];
        while let Some(code) = node.prefix {
            node = self.table[usize::from(code)];
        }
        node.byte
    }

    /// Append a code's string to a buffer
    fn emit(&self, code: Code, buffer: &mut Vec<u8>) {
        let start = buffer.len();
        let mut node = self.table[usize::from(code)];
        buffer.push(node.byte);
        while let Some(code) = node.prefix {
            node = self.table[usize::from(code)];
            buffer.push(node.byte);
        }
        buffer[start..].reverse();
    }
}

/// LZW Data Decompressor
#[derive(Debug)]
pub(crate) struct Decompressor {
    /// Code dictionary
    dict: Dictionary,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Previous code
    last: Option<Code>,
    /// Fail on out-of-range codes instead of skipping them
    strict: bool,
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(min_code_bits: u8) -> Self {
        Decompressor {
            dict: Dictionary::new(min_code_bits),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
            strict: false,
        }
    }

    /// Adjust strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reset dictionary and code width
    fn reset(&mut self) {
        self.dict.reset();
        self.code_bits = Bits::from(self.min_code_bits + 1);
        self.last = None;
    }

    /// Decompress a buffer of concatenated sub-block data.
    ///
    /// Decoding stops at the end code, at the end of data, or once
    /// `expected` bytes are produced.  The result is never longer than
    /// `expected`; a shorter result means the data was truncated.
    pub fn decompress(
        &mut self,
        bytes: &[u8],
        expected: usize,
    ) -> Result<Vec<u8>> {
        self.reset();
        let mut reader = BitReader::new(bytes);
        let mut buffer = Vec::with_capacity(expected);
        while buffer.len() < expected {
            let code = match reader.next(self.code_bits.into()) {
                Some(code) => code,
                None => break,
            };
            if code == self.dict.clear_code() {
                self.reset();
                continue;
            }
            if code == self.dict.end_code() {
                break;
            }
            if !self.decompress_code(code, &mut buffer)? {
                continue;
            }
            self.adjust_code_bits(&reader);
        }
        buffer.truncate(expected);
        Ok(buffer)
    }

    /// Decompress one code, returning false if it was skipped
    fn decompress_code(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<bool> {
        let next_code = self.dict.next_code();
        match (self.last, code.cmp(&next_code)) {
            (None, Ordering::Less) => self.dict.emit(code, buffer),
            (Some(last), Ordering::Less) => {
                let start = buffer.len();
                self.dict.emit(code, buffer);
                self.dict.push_node(Some(last), buffer[start]);
            }
            (Some(last), Ordering::Equal) => {
                self.dict.push_node(Some(last), self.dict.first_byte(last));
                self.dict.emit(code, buffer);
            }
            _ => {
                if self.strict {
                    return Err(Error::InvalidLzwData);
                }
                trace!("skipping invalid code {} (next: {})", code, next_code);
                return Ok(false);
            }
        }
        self.last = Some(code);
        Ok(true)
    }

    /// Widen codes as the dictionary fills.
    ///
    /// With a full dictionary, the next code must be a clear code; if it is
    /// not, the dictionary is reset anyway.  Some encoders rely on this.
    fn adjust_code_bits(&mut self, reader: &BitReader) {
        let len = self.dict.len();
        if self.code_bits < Bits::MAX {
            if len >= self.code_bits.entries() {
                self.code_bits += 1;
            }
        } else if len >= Bits::MAX.entries() {
            let clear = self.dict.clear_code();
            if reader.peek(Bits::MAX.into()) != Some(clear) {
                trace!("early dictionary reset at {}", reader.position());
                self.reset();
            }
        }
    }
}
