// interlace.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Interlaced row ordering

/// Interlace passes: (first row, row step)
const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Reorder rows from four-pass interlaced order to top-to-bottom order.
///
/// Rows are `width`-sized chunks of the buffer; a trailing partial row is
/// left untouched.
pub(crate) fn reorder<T: Copy>(decoded: &[T], width: usize) -> Vec<T> {
    let mut out = decoded.to_vec();
    if width == 0 {
        return out;
    }
    let height = decoded.len() / width;
    let mut rows = decoded.chunks_exact(width);
    for &(first, step) in PASSES.iter() {
        for y in (first..height).step_by(step) {
            if let Some(row) = rows.next() {
                let start = y * width;
                out[start..start + width].copy_from_slice(row);
            }
        }
    }
    out
}
