// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value types and tolerance predicates shared by every stage.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use peniko::kurbo;

/// Tolerance used for every near-zero and near-equal comparison.
///
/// Classification branch boundaries depend on this value, so it is pinned
/// for the whole pipeline rather than configurable per call.
pub const EPSILON: f64 = 1e-9;

/// Whether `value` is within [`EPSILON`] of zero.
///
/// Callers normalize their quantities first; see [`almost_zero_relative`]
/// for values that carry a scale.
#[inline]
pub fn almost_zero(value: f64) -> bool {
    value.abs() <= EPSILON
}

/// Whether `value` is negligible compared to `scale`.
#[inline]
pub fn almost_zero_relative(value: f64, scale: f64) -> bool {
    value.abs() <= EPSILON * scale.abs()
}

/// Relative comparison, falling back to an absolute one near zero.
#[inline]
pub fn almost_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// A 2D point or vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The z component of the 3D cross product.
    #[inline]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Both coordinates within [`EPSILON`] of each other, relatively.
    pub fn almost_equal(self, other: Self) -> bool {
        almost_equal(self.x, other.x) && almost_equal(self.y, other.y)
    }

    pub fn to_f32(self) -> [f32; 2] {
        [self.x as f32, self.y as f32]
    }

    pub fn from_f32(p: [f32; 2]) -> Self {
        Self::new(p[0] as f64, p[1] as f64)
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A 3D vector, used for the `(k, l, m)` implicit coefficient triples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn to_f32(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }

    pub fn from_f32(v: [f32; 3]) -> Self {
        Self::new(v[0] as f64, v[1] as f64, v[2] as f64)
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Axis-aligned bounds of `points`, or `None` when there are none.
pub fn bounds(points: impl IntoIterator<Item = Point>) -> Option<kurbo::Rect> {
    points.into_iter().map(kurbo::Point::from).fold(None, |rect, p| {
        Some(rect.map_or(kurbo::Rect::from_points(p, p), |r| r.union_pt(p)))
    })
}

/// Affine transformation matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    /// 2x2 matrix, column major.
    pub matrix: [f64; 4],
    /// Translation.
    pub translation: [f64; 2],
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 1.0],
        translation: [0.0; 2],
    };

    pub fn scale(s: f64) -> Self {
        Self {
            matrix: [s, 0.0, 0.0, s],
            translation: [0.0; 2],
        }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            matrix: Self::IDENTITY.matrix,
            translation: [x, y],
        }
    }

    /// Creates a transform from a kurbo affine matrix.
    pub fn from_kurbo(transform: &kurbo::Affine) -> Self {
        let c = transform.as_coeffs();
        Self {
            matrix: [c[0], c[1], c[2], c[3]],
            translation: [c[4], c[5]],
        }
    }

    /// Converts the transform to a kurbo affine matrix.
    pub fn to_kurbo(&self) -> kurbo::Affine {
        kurbo::Affine::new([
            self.matrix[0],
            self.matrix[1],
            self.matrix[2],
            self.matrix[3],
            self.translation[0],
            self.translation[1],
        ])
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.matrix[0] * p.x + self.matrix[2] * p.y + self.translation[0],
            self.matrix[1] * p.x + self.matrix[3] * p.y + self.translation[1],
        )
    }
}

impl Mul for Transform {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        Self {
            matrix: [
                self.matrix[0] * other.matrix[0] + self.matrix[2] * other.matrix[1],
                self.matrix[1] * other.matrix[0] + self.matrix[3] * other.matrix[1],
                self.matrix[0] * other.matrix[2] + self.matrix[2] * other.matrix[3],
                self.matrix[1] * other.matrix[2] + self.matrix[3] * other.matrix[3],
            ],
            translation: [
                self.matrix[0] * other.translation[0]
                    + self.matrix[2] * other.translation[1]
                    + self.translation[0],
                self.matrix[1] * other.translation[0]
                    + self.matrix[3] * other.translation[1]
                    + self.translation[1],
            ],
        }
    }
}
