// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Kernel buffer records and the per-sample inside tests shared by every
//! rasterizer backend.
//!
//! All tests run in `f64` on the `f32` record data, so every backend that
//! consumes the same records produces the same stencil.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::classify::implicit;
use crate::math::{Point, Vec3};

/// Maximum number of interleaved output channels.
pub const MAX_CHANNELS: usize = 16;

/// Parameters shared by the stencil and resolve kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct KernelParams {
    /// Path space position of the output's top left pixel.
    pub pixel_offset: [u32; 2],
    /// Output width in pixels. A stencil row holds `row_width * antialias`
    /// samples.
    pub row_width: u32,
    /// Supersampling factor per axis.
    pub antialias: u32,
    /// Color written at full coverage, one value per output channel.
    pub fill_color: [f32; MAX_CHANNELS],
}

/// A fan triangle; contributes its orientation sign wherever it covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct TriangleRecord {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub p2: [f32; 2],
}

/// A quadratic segment: start, control and end point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct QuadRecord {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub p2: [f32; 2],
}

/// One hull triangle of a classified cubic with the `(k, l, m)` values at
/// its vertices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CubicRecord {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub p2: [f32; 2],
    pub v0: [f32; 3],
    pub v1: [f32; 3],
    pub v2: [f32; 3],
}

const_assert_eq!(std::mem::size_of::<KernelParams>(), 80);
const_assert_eq!(std::mem::size_of::<TriangleRecord>(), 24);
const_assert_eq!(std::mem::size_of::<QuadRecord>(), 24);
const_assert_eq!(std::mem::size_of::<CubicRecord>(), 60);

type Vec2 = [f64; 2];

fn promote(p: [f32; 2]) -> Vec2 {
    [p[0] as f64, p[1] as f64]
}

fn cross(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Edge function of `q` against `a -> b`, evaluated from the
/// lexicographically smaller endpoint so both windings of a shared edge
/// agree bit for bit.
fn edge_function(a: Vec2, b: Vec2, q: Vec2) -> f64 {
    if (a[0], a[1]) <= (b[0], b[1]) {
        cross(a, b, q)
    } else {
        -cross(b, a, q)
    }
}

/// Tie rule for samples exactly on an edge of a positively oriented
/// triangle. Of the two directions of any edge exactly one is accepted.
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    let d = [b[0] - a[0], b[1] - a[1]];
    d[1] < 0.0 || (d[1] == 0.0 && d[0] > 0.0)
}

/// Orientation sign of the triangle when it contains `q`, zero otherwise.
pub fn triangle_winding(p0: Vec2, p1: Vec2, p2: Vec2, q: Vec2) -> i16 {
    let o = cross(p0, p1, p2);
    if o == 0.0 || o.is_nan() {
        return 0;
    }
    let (p1, p2) = if o < 0.0 { (p2, p1) } else { (p1, p2) };
    for (a, b) in [(p0, p1), (p1, p2), (p2, p0)] {
        let w = edge_function(a, b, q);
        if w < 0.0 || (w == 0.0 && !is_top_left(a, b)) {
            return 0;
        }
    }
    if o > 0.0 {
        1
    } else {
        -1
    }
}

/// Barycentric weights of `q` for the vertices in the given order.
fn barycentric(p0: Vec2, p1: Vec2, p2: Vec2, q: Vec2) -> [f64; 3] {
    let den = cross(p0, p1, p2);
    let w1 = cross(p0, q, p2) / den;
    let w2 = cross(p0, p1, q) / den;
    [1.0 - w1 - w2, w1, w2]
}

/// A record the stencil pass can rasterize.
pub trait StencilRecord: Copy + Send + Sync {
    fn vertices(&self) -> [[f32; 2]; 3];

    /// The signed winding increment at sample position `q`.
    fn winding_at(&self, q: Vec2) -> i16;

    /// `[min_x, min_y, max_x, max_y]` of the covering triangle.
    fn bounds(&self) -> [f64; 4] {
        let [a, b, c] = self.vertices().map(promote);
        [
            a[0].min(b[0]).min(c[0]),
            a[1].min(b[1]).min(c[1]),
            a[0].max(b[0]).max(c[0]),
            a[1].max(b[1]).max(c[1]),
        ]
    }
}

impl TriangleRecord {
    pub fn new(p: [Point; 3]) -> Self {
        Self {
            p0: p[0].to_f32(),
            p1: p[1].to_f32(),
            p2: p[2].to_f32(),
        }
    }
}

impl StencilRecord for TriangleRecord {
    fn vertices(&self) -> [[f32; 2]; 3] {
        [self.p0, self.p1, self.p2]
    }

    fn winding_at(&self, q: Vec2) -> i16 {
        triangle_winding(promote(self.p0), promote(self.p1), promote(self.p2), q)
    }
}

impl QuadRecord {
    pub fn new(p: [Point; 3]) -> Self {
        Self {
            p0: p[0].to_f32(),
            p1: p[1].to_f32(),
            p2: p[2].to_f32(),
        }
    }
}

impl StencilRecord for QuadRecord {
    fn vertices(&self) -> [[f32; 2]; 3] {
        [self.p0, self.p1, self.p2]
    }

    fn winding_at(&self, q: Vec2) -> i16 {
        let [p0, p1, p2] = self.vertices().map(promote);
        let winding = triangle_winding(p0, p1, p2, q);
        if winding == 0 {
            return 0;
        }
        // (u, v) is (0, 0), (½, 0), (1, 1) at the vertices.
        let [_, w1, w2] = barycentric(p0, p1, p2, q);
        let u = 0.5 * w1 + w2;
        if u * u - w2 < 0.0 {
            winding
        } else {
            0
        }
    }
}

impl CubicRecord {
    pub fn new(p: [Point; 3], klm: [Vec3; 3]) -> Self {
        Self {
            p0: p[0].to_f32(),
            p1: p[1].to_f32(),
            p2: p[2].to_f32(),
            v0: klm[0].to_f32(),
            v1: klm[1].to_f32(),
            v2: klm[2].to_f32(),
        }
    }
}

impl StencilRecord for CubicRecord {
    fn vertices(&self) -> [[f32; 2]; 3] {
        [self.p0, self.p1, self.p2]
    }

    fn winding_at(&self, q: Vec2) -> i16 {
        let [p0, p1, p2] = self.vertices().map(promote);
        let winding = triangle_winding(p0, p1, p2, q);
        if winding == 0 {
            return 0;
        }
        let [w0, w1, w2] = barycentric(p0, p1, p2, q);
        let klm = Vec3::from_f32(self.v0) * w0
            + Vec3::from_f32(self.v1) * w1
            + Vec3::from_f32(self.v2) * w2;
        if implicit(klm) < 0.0 {
            winding
        } else {
            0
        }
    }
}

/// The encoded primitives of a path, ready for either backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Records {
    pub triangles: Vec<TriangleRecord>,
    pub quads: Vec<QuadRecord>,
    pub cubics: Vec<CubicRecord>,
}

impl Records {
    pub fn len(&self) -> usize {
        self.triangles.len() + self.quads.len() + self.cubics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
