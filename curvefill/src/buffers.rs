// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use curvefill_encoding::stencil::{is_covered, pixel_coverage};
use peniko::Fill;

/// Signed winding per sample, before any fill rule is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stencil {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Samples per pixel along each axis.
    pub antialias: u32,
    /// Row major, `width * antialias` samples per row.
    pub samples: Vec<i16>,
}

impl Stencil {
    /// Samples per row.
    pub fn stride(&self) -> u32 {
        self.width * self.antialias
    }

    /// Number of sample rows.
    pub fn rows(&self) -> u32 {
        self.height * self.antialias
    }

    /// Winding of sample `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> i16 {
        self.samples[y as usize * self.stride() as usize + x as usize]
    }

    /// Whether sample `(x, y)` is covered under `fill`.
    pub fn is_covered(&self, x: u32, y: u32, fill: Fill) -> bool {
        is_covered(self.get(x, y), fill)
    }

    /// Per pixel fraction of covered samples.
    pub fn resolve(&self, fill: Fill) -> Coverage {
        let alpha = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .map(|(x, y)| pixel_coverage(&self.samples, self.width, self.antialias, x, y, fill))
            .collect();
        Coverage {
            width: self.width,
            height: self.height,
            alpha,
        }
    }

    /// Coverage multiplied into `color`, interleaved per pixel.
    pub fn resolve_color(&self, fill: Fill, color: &[f32]) -> ColorBuffer {
        let coverage = self.resolve(fill);
        let data = coverage
            .alpha
            .iter()
            .flat_map(|a| color.iter().map(move |c| a * c))
            .collect();
        ColorBuffer {
            width: self.width,
            height: self.height,
            channels: color.len(),
            data,
        }
    }
}

/// One coverage value in `[0, 1]` per pixel, row major.
#[derive(Clone, Debug, PartialEq)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<f32>,
}

impl Coverage {
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.alpha[y as usize * self.width as usize + x as usize]
    }

    /// Sum of all pixel coverage, in square pixels.
    pub fn total(&self) -> f64 {
        self.alpha.iter().map(|a| *a as f64).sum()
    }
}

/// Interleaved color channels per pixel, row major.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl ColorBuffer {
    /// The channels of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        &self.data[start..start + self.channels]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stencil() -> Stencil {
        // 2x1 pixels at 2x supersampling.
        Stencil {
            width: 2,
            height: 1,
            antialias: 2,
            samples: vec![1, 0, -2, 2, 1, 1, 0, 3],
        }
    }

    #[test]
    fn resolves_under_both_rules() {
        let stencil = stencil();
        assert_eq!(stencil.get(3, 1), 3);
        assert_eq!(stencil.resolve(Fill::NonZero).alpha, [0.75, 0.75]);
        assert_eq!(stencil.resolve(Fill::EvenOdd).alpha, [0.75, 0.25]);
        assert!(!stencil.is_covered(2, 0, Fill::EvenOdd));
    }

    #[test]
    fn color_scales_by_coverage() {
        let color = stencil().resolve_color(Fill::EvenOdd, &[1.0, 0.5, 0.0]);
        assert_eq!(color.channels, 3);
        assert_eq!(color.pixel(0, 0), [0.75, 0.375, 0.0]);
        assert_eq!(color.pixel(1, 0), [0.25, 0.125, 0.0]);
    }
}
