// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Winding accumulation and fill rule resolve, shared by the backends.

use std::sync::atomic::{AtomicI16, Ordering};

use peniko::Fill;

/// Destination for signed winding increments.
///
/// Implemented for plain stencils, written by one pass at a time, and for
/// atomic stencils shared by parallel invocations.
pub trait Accumulate {
    fn accumulate(&mut self, index: usize, delta: i16);
}

impl Accumulate for [i16] {
    #[inline]
    fn accumulate(&mut self, index: usize, delta: i16) {
        self[index] = self[index].wrapping_add(delta);
    }
}

impl Accumulate for &[AtomicI16] {
    #[inline]
    fn accumulate(&mut self, index: usize, delta: i16) {
        self[index].fetch_add(delta, Ordering::Relaxed);
    }
}

/// Path space center of stencil sample `(x, y)`.
#[inline]
pub fn sample_center(pixel_offset: [u32; 2], antialias: u32, x: u32, y: u32) -> [f64; 2] {
    let n = antialias as f64;
    [
        pixel_offset[0] as f64 + (x as f64 + 0.5) / n,
        pixel_offset[1] as f64 + (y as f64 + 0.5) / n,
    ]
}

/// Range of sample indices along one axis whose centers lie in
/// `[min, max]`, clamped to `[lo, hi)`.
pub fn sample_span(min: f64, max: f64, offset: u32, antialias: u32, lo: u32, hi: u32) -> (u32, u32) {
    let n = antialias as f64;
    let first = ((min - offset as f64) * n - 0.5).ceil();
    let last = ((max - offset as f64) * n - 0.5).floor();
    let start = first.max(lo as f64);
    let end = (last + 1.0).min(hi as f64);
    if end <= start {
        (lo, lo)
    } else {
        (start as u32, end as u32)
    }
}

#[inline]
pub fn is_covered(winding: i16, fill: Fill) -> bool {
    match fill {
        Fill::NonZero => winding != 0,
        Fill::EvenOdd => winding % 2 != 0,
    }
}

/// Fraction of the `antialias²` samples of pixel `(x, y)` that are covered.
pub fn pixel_coverage(
    stencil: &[i16],
    row_width: u32,
    antialias: u32,
    x: u32,
    y: u32,
    fill: Fill,
) -> f32 {
    let n = antialias as usize;
    let stride = row_width as usize * n;
    let mut covered = 0_u32;
    for j in 0..n {
        let row = (y as usize * n + j) * stride + x as usize * n;
        covered += stencil[row..row + n]
            .iter()
            .filter(|w| is_covered(**w, fill))
            .count() as u32;
    }
    covered as f32 / (n * n) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rules() {
        for w in [-3_i16, -1, 1, 3] {
            assert!(is_covered(w, Fill::NonZero));
            assert!(is_covered(w, Fill::EvenOdd));
        }
        for w in [-2_i16, 2, 4] {
            assert!(is_covered(w, Fill::NonZero));
            assert!(!is_covered(w, Fill::EvenOdd));
        }
        assert!(!is_covered(0, Fill::NonZero));
        assert!(!is_covered(0, Fill::EvenOdd));
    }

    #[test]
    fn both_accumulators_agree() {
        let mut plain = vec![0_i16; 4];
        let atomic: Vec<AtomicI16> = (0..4).map(|_| AtomicI16::new(0)).collect();
        let mut shared = atomic.as_slice();
        for (index, delta) in [(0, 1), (1, -1), (0, 1), (3, i16::MAX), (3, 1)] {
            plain.as_mut_slice().accumulate(index, delta);
            shared.accumulate(index, delta);
        }
        let atomic: Vec<i16> = atomic.into_iter().map(AtomicI16::into_inner).collect();
        assert_eq!(plain, atomic);
        assert_eq!(plain[3], i16::MIN);
    }

    #[test]
    fn coverage_averages_block() {
        // 2x1 pixels at 2x supersampling: a 4x2 stencil.
        let stencil = [1, 0, 2, 2, 1, 1, 0, 2];
        assert_eq!(pixel_coverage(&stencil, 2, 2, 0, 0, Fill::NonZero), 0.75);
        assert_eq!(pixel_coverage(&stencil, 2, 2, 1, 0, Fill::NonZero), 0.75);
        assert_eq!(pixel_coverage(&stencil, 2, 2, 1, 0, Fill::EvenOdd), 0.0);
        assert_eq!(sample_center([10, 0], 2, 1, 0), [11.0 - 0.25, 0.25]);
    }

    #[test]
    fn sample_span_clamps() {
        assert_eq!(sample_span(0.0, 2.0, 0, 2, 0, 16), (0, 4));
        assert_eq!(sample_span(0.3, 0.7, 0, 1, 0, 16), (0, 1));
        assert_eq!(sample_span(0.6, 0.9, 0, 1, 0, 16), (0, 0));
        assert_eq!(sample_span(-5.0, 100.0, 0, 1, 3, 7), (3, 7));
        assert_eq!(sample_span(10.0, 11.0, 10, 1, 0, 4), (0, 1));
    }
}
