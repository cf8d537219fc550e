// lib.rs      gifanim crate.
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! # gifanim
//!
//! Decode GIF87a / GIF89a images into a sequence of composited, timed
//! frames.
//!
//! Frames are always the size of the logical screen.  Each one is the
//! result of applying the previous frame's disposal method, then painting
//! the image block over it with transparency.
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

mod bits;
pub mod block;
mod compose;
mod decode;
mod error;
#[cfg(test)]
mod fixture;
mod interlace;
mod lzw;
mod private;

pub use crate::compose::{compose, Frames};
pub use crate::decode::{parse, Blocks};
pub use crate::error::{Error, Result, Warning};
pub use crate::private::{Animation, Decoder, Frame};
