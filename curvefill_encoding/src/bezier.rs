// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bézier curves of arbitrary degree over an additive element type.

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use peniko::kurbo;
use smallvec::SmallVec;

use crate::classify::Invariants;
use crate::math::{Point, EPSILON};
use crate::poly::Polynomial;

/// Control point type of a [`Bezier`] curve.
pub trait BezierElement:
    Copy + Debug + PartialEq + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
    const ZERO: Self;
}

impl BezierElement for f64 {
    const ZERO: Self = 0.0;
}

impl BezierElement for Point {
    const ZERO: Self = Point::ZERO;
}

/// Parameter values, typically a handful per curve.
pub type Params = SmallVec<[f64; 8]>;

/// A Bézier curve with at least two control points.
///
/// Curves are immutable: [`Bezier::split`], [`Bezier::elevated`] and friends
/// return new curves.
#[derive(Clone, Debug, PartialEq)]
pub struct Bezier<T> {
    points: SmallVec<[T; 4]>,
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

impl<T: BezierElement> Bezier<T> {
    /// Returns `None` for fewer than two control points.
    pub fn new(points: impl IntoIterator<Item = T>) -> Option<Self> {
        let points: SmallVec<[T; 4]> = points.into_iter().collect();
        (points.len() >= 2).then_some(Self { points })
    }

    pub fn line(p0: T, p1: T) -> Self {
        Self {
            points: smallvec::smallvec![p0, p1],
        }
    }

    pub fn quad(p0: T, p1: T, p2: T) -> Self {
        Self {
            points: smallvec::smallvec![p0, p1, p2],
        }
    }

    pub fn cubic(p0: T, p1: T, p2: T, p3: T) -> Self {
        Self {
            points: smallvec::smallvec![p0, p1, p2, p3],
        }
    }

    /// A curve of `len` control points all equal to `point`.
    fn collapsed(point: T, len: usize) -> Self {
        Self {
            points: smallvec::smallvec![point; len.max(2)],
        }
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn degree(&self) -> usize {
        self.points.len() - 1
    }

    pub fn start(&self) -> T {
        self.points[0]
    }

    pub fn end(&self) -> T {
        self.points[self.points.len() - 1]
    }

    pub fn eval(&self, t: f64) -> T {
        let p = &self.points;
        let mt = 1.0 - t;
        match p.len() {
            2 => p[0] * mt + p[1] * t,
            3 => p[0] * (mt * mt) + p[1] * (2.0 * mt * t) + p[2] * (t * t),
            4 => {
                p[0] * (mt * mt * mt)
                    + p[1] * (3.0 * mt * mt * t)
                    + p[2] * (3.0 * mt * t * t)
                    + p[3] * (t * t * t)
            }
            len => {
                let n = len - 1;
                let mut coeff = 1.0;
                let mut sum = T::ZERO;
                for (i, &point) in p.iter().enumerate() {
                    sum = sum + point * (coeff * mt.powi((n - i) as i32) * t.powi(i as i32));
                    coeff = coeff * (n - i) as f64 / (i + 1) as f64;
                }
                sum
            }
        }
    }

    /// The hodograph. A line derives to a constant two-point curve.
    pub fn derivative(&self) -> Self {
        let n = self.degree() as f64;
        let points: SmallVec<[T; 4]> = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]) * n)
            .collect();
        if points.len() == 1 {
            Self::collapsed(points[0], 2)
        } else {
            Self { points }
        }
    }

    /// The same curve with one more control point.
    pub fn elevated(&self) -> Self {
        let p = &self.points;
        let n1 = p.len() as f64;
        let mut points = SmallVec::with_capacity(p.len() + 1);
        points.push(p[0]);
        for i in 1..p.len() {
            let a = i as f64 / n1;
            points.push(p[i - 1] * a + p[i] * (1.0 - a));
        }
        points.push(self.end());
        Self { points }
    }

    /// De Casteljau subdivision at `t`.
    ///
    /// Parameters within [`EPSILON`] of either end return a curve collapsed
    /// onto that endpoint alongside the unchanged curve.
    pub fn split(&self, t: f64) -> (Self, Self) {
        let len = self.points.len();
        if t <= EPSILON {
            return (Self::collapsed(self.start(), len), self.clone());
        }
        if t >= 1.0 - EPSILON {
            return (self.clone(), Self::collapsed(self.end(), len));
        }
        let mut work = self.points.clone();
        let mut left = SmallVec::with_capacity(len);
        let mut right: SmallVec<[T; 4]> = SmallVec::with_capacity(len);
        for level in (1..=len).rev() {
            left.push(work[0]);
            right.push(work[level - 1]);
            for i in 0..level - 1 {
                work[i] = work[i] + (work[i + 1] - work[i]) * t;
            }
        }
        right.reverse();
        (Self { points: left }, Self { points: right })
    }

    /// The sub-curve between parameters `t0` and `t1`.
    pub fn subsegment(&self, t0: f64, t1: f64) -> Self {
        let (_, right) = self.split(t0);
        if t0 >= 1.0 - EPSILON {
            return right;
        }
        right.split((t1 - t0) / (1.0 - t0)).0
    }

    /// Power basis coefficients, `result[j]` multiplying `t^j`.
    pub fn power_coefficients(&self) -> SmallVec<[T; 4]> {
        let p = &self.points;
        match p.len() {
            2 => smallvec::smallvec![p[0], p[1] - p[0]],
            3 => smallvec::smallvec![p[0], (p[1] - p[0]) * 2.0, p[0] - p[1] * 2.0 + p[2]],
            4 => smallvec::smallvec![
                p[0],
                (p[1] - p[0]) * 3.0,
                (p[0] - p[1] * 2.0 + p[2]) * 3.0,
                p[3] - p[0] + (p[1] - p[2]) * 3.0,
            ],
            len => {
                let n = len - 1;
                (0..=n)
                    .map(|j| {
                        let sum = (0..=j).fold(T::ZERO, |acc, i| {
                            let sign = if (j - i) % 2 == 0 { 1.0 } else { -1.0 };
                            acc + p[i] * (sign * binomial(j, i))
                        });
                        sum * binomial(n, j)
                    })
                    .collect()
            }
        }
    }

    /// Inverse of [`Bezier::power_coefficients`].
    ///
    /// Fewer than two coefficients produce a constant two-point curve.
    pub fn from_power_coefficients(a: &[T]) -> Self {
        match a.len() {
            0 => Self::collapsed(T::ZERO, 2),
            1 => Self::collapsed(a[0], 2),
            2 => Self::line(a[0], a[0] + a[1]),
            3 => Self::quad(a[0], a[0] + a[1] * 0.5, a[0] + a[1] + a[2]),
            4 => Self::cubic(
                a[0],
                a[0] + a[1] * (1.0 / 3.0),
                a[0] + a[1] * (2.0 / 3.0) + a[2] * (1.0 / 3.0),
                a[0] + a[1] + a[2] + a[3],
            ),
            len => {
                let n = len - 1;
                let points = (0..=n)
                    .map(|i| {
                        (0..=i).fold(T::ZERO, |acc, j| {
                            acc + a[j] * (binomial(i, j) / binomial(n, j))
                        })
                    })
                    .collect();
                Self { points }
            }
        }
    }
}

impl Bezier<f64> {
    pub fn polynomial(&self) -> Polynomial {
        Polynomial::new(self.power_coefficients())
    }

    pub fn from_polynomial(poly: &Polynomial) -> Self {
        Self::from_power_coefficients(poly.coeffs())
    }
}

impl Bezier<Point> {
    /// Power basis polynomials of the x and y coordinates.
    pub fn polynomials(&self) -> (Polynomial, Polynomial) {
        let coeffs = self.power_coefficients();
        (
            Polynomial::new(coeffs.iter().map(|p| p.x)),
            Polynomial::new(coeffs.iter().map(|p| p.y)),
        )
    }

    pub fn from_polynomials(x: &Polynomial, y: &Polynomial) -> Self {
        let n = x.coeffs().len().max(y.coeffs().len());
        let coeffs: SmallVec<[Point; 4]> = (0..n)
            .map(|i| Point::new(x.coeff(i), y.coeff(i)))
            .collect();
        Self::from_power_coefficients(&coeffs)
    }

    /// Control points of a cubic, `None` for other degrees.
    pub fn as_cubic(&self) -> Option<[Point; 4]> {
        match *self.points() {
            [p0, p1, p2, p3] => Some([p0, p1, p2, p3]),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// Parameters in `[0, 1]` where either coordinate's derivative vanishes,
    /// sorted.
    pub fn stationary(&self) -> Params {
        let (x, y) = self.polynomials();
        let mut params: Params = x
            .derivative()
            .roots_in(0.0, 1.0)
            .into_iter()
            .chain(y.derivative().roots_in(0.0, 1.0))
            .collect();
        params.sort_by(f64::total_cmp);
        params.dedup();
        params
    }

    pub fn boundary(&self) -> kurbo::Rect {
        let (start, end) = (kurbo::Point::from(self.start()), kurbo::Point::from(self.end()));
        self.stationary()
            .into_iter()
            .fold(kurbo::Rect::from_points(start, end), |rect, t| {
                rect.union_pt(kurbo::Point::from(self.eval(t)))
            })
    }

    /// Inflection parameters in `[0, 1]`, sorted.
    pub fn inflections(&self) -> Params {
        let poly = if let Some(cubic) = self.as_cubic() {
            rotated_inflection_polynomial(&cubic)
        } else if self.degree() > 3 {
            let (x, y) = self.polynomials();
            let (dx, dy) = (x.derivative(), y.derivative());
            let (ddx, ddy) = (dx.derivative(), dy.derivative());
            &(&dx * &ddy) - &(&dy * &ddx)
        } else {
            return Params::new();
        };
        poly.roots_in(0.0, 1.0).into_iter().collect()
    }

    /// The parameter and point on the curve closest to `point`.
    pub fn closest(&self, point: Point) -> (f64, Point) {
        let (x, y) = self.polynomials();
        let dx = &x - &Polynomial::new([point.x]);
        let dy = &y - &Polynomial::new([point.y]);
        // Half the derivative of the squared distance.
        let slope = &(&dx * &x.derivative()) + &(&dy * &y.derivative());
        slope
            .roots_in(0.0, 1.0)
            .into_iter()
            .chain([0.0, 1.0])
            .map(|t| (t, self.eval(t)))
            .fold((0.0, self.start()), |best, candidate| {
                if candidate.1.distance(point) < best.1.distance(point) {
                    candidate
                } else {
                    best
                }
            })
    }

    /// The two parameters of a cubic's double point, when both lie strictly
    /// inside the segment.
    pub fn self_intersection(&self) -> Option<(f64, f64)> {
        let (t1, t2) = Invariants::new(&self.as_cubic()?).double_points()?;
        let inside = |t: f64| t > EPSILON && t < 1.0 - EPSILON;
        (inside(t1) && inside(t2)).then_some((t1, t2))
    }

    /// Signed area enclosed by the curve and the chord closing it.
    ///
    /// Positive when the closed loop turns counter-clockwise in a y-up frame.
    pub fn signed_area(&self) -> f64 {
        // Measured from the start point, where the chord term vanishes.
        let origin = self.start();
        let local = Self {
            points: self.points.iter().map(|p| *p - origin).collect(),
        };
        let (x, y) = local.polynomials();
        let integrand = &(&x * &y.derivative()) - &(&y * &x.derivative());
        0.5 * integrand.integral().eval(1.0)
    }
}

/// Inflection polynomial of a cubic after moving `p0` to the origin and
/// rotating `p3` onto the x axis.
fn rotated_inflection_polynomial(p: &[Point; 4]) -> Polynomial {
    let chord = p[3] - p[0];
    let (sin, cos) = if chord == Point::ZERO {
        (0.0, 1.0)
    } else {
        let len = chord.length();
        (-chord.y / len, chord.x / len)
    };
    let rotate = |q: Point| {
        let q = q - p[0];
        Point::new(q.x * cos - q.y * sin, q.x * sin + q.y * cos)
    };
    let (p1, p2, p3) = (rotate(p[1]), rotate(p[2]), rotate(p[3]));
    let a = p2.x * p1.y;
    let b = p3.x * p1.y;
    let c = p1.x * p2.y;
    let d = p3.x * p2.y;
    Polynomial::new([c - a, 3.0 * a - b - 3.0 * c, -3.0 * a + 2.0 * b + 3.0 * c - d])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn curves() -> Vec<Bezier<Point>> {
        vec![
            Bezier::line(pt(0.0, 0.0), pt(3.0, 1.0)),
            Bezier::quad(pt(0.0, 0.0), pt(1.0, 2.0), pt(2.0, 0.0)),
            Bezier::cubic(pt(0.0, 0.0), pt(1.0, 1.5), pt(-0.3, 1.0), pt(1.0, 0.0)),
            Bezier::new([pt(0.0, 0.0), pt(1.0, 3.0), pt(2.0, -1.0), pt(4.0, 2.0), pt(5.0, 0.0)])
                .unwrap(),
            Bezier::new([
                pt(0.0, 0.0),
                pt(1.0, 3.0),
                pt(2.0, -1.0),
                pt(4.0, 2.0),
                pt(5.0, 0.0),
                pt(6.0, 4.0),
            ])
            .unwrap(),
        ]
    }

    #[test]
    fn needs_two_points() {
        assert!(Bezier::<f64>::new([1.0]).is_none());
        assert!(Bezier::<f64>::new([1.0, 1.0]).is_some());
    }

    #[test]
    fn split_identity() {
        for curve in curves() {
            for t in [0.0, 1e-12, 0.1, 0.5, 0.73, 1.0 - 1e-12, 1.0] {
                let (l, r) = curve.split(t);
                let p = curve.eval(t);
                assert_eq!(l.degree(), curve.degree());
                assert_eq!(r.degree(), curve.degree());
                assert!(l.end().distance(p) < 1e-9, "{curve:?} at {t}");
                assert!(r.start().distance(p) < 1e-9, "{curve:?} at {t}");
                // The halves trace the original.
                if t > 1e-6 && t < 1.0 - 1e-6 {
                    let s = 0.3;
                    assert!(l.eval(s).distance(curve.eval(s * t)) < 1e-9);
                    assert!(r.eval(s).distance(curve.eval(t + s * (1.0 - t))) < 1e-9);
                }
            }
        }
    }

    #[test]
    fn split_at_ends_collapses() {
        let curve = &curves()[2];
        let (l, r) = curve.split(0.0);
        assert!(l.points().iter().all(|p| *p == curve.start()));
        assert_eq!(&r, curve);
        let (l, r) = curve.split(1.0);
        assert_eq!(&l, curve);
        assert!(r.points().iter().all(|p| *p == curve.end()));
    }

    #[test]
    fn elevation_invariance() {
        for curve in curves() {
            let elevated = curve.elevated();
            assert_eq!(elevated.degree(), curve.degree() + 1);
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                assert!(elevated.eval(t).distance(curve.eval(t)) < 1e-9);
            }
        }
    }

    #[test]
    fn power_basis_round_trip() {
        for curve in curves() {
            let (x, y) = curve.polynomials();
            let back = Bezier::from_polynomials(&x, &y);
            for (a, b) in back.points().iter().zip(curve.points()) {
                assert!(a.distance(*b) < 1e-9);
            }
            for t in [0.2, 0.6] {
                assert!((x.eval(t) - curve.eval(t).x).abs() < 1e-9);
                assert!((y.eval(t) - curve.eval(t).y).abs() < 1e-9);
            }
        }
        let scalar = Bezier::cubic(1.0, -2.0, 4.0, 0.5);
        let poly = scalar.polynomial();
        assert!((poly.eval(0.3) - scalar.eval(0.3)).abs() < 1e-12);
        assert_eq!(Bezier::from_polynomial(&poly), scalar);
        assert_eq!(Bezier::from_polynomial(&Polynomial::new([2.0])).points(), &[2.0, 2.0]);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        for curve in curves() {
            let d = curve.derivative();
            assert_eq!(d.degree(), curve.degree().saturating_sub(1).max(1));
            let (t, h) = (0.4, 1e-6);
            let fd = (curve.eval(t + h) - curve.eval(t - h)) * (0.5 / h);
            assert!(d.eval(t).distance(fd) < 1e-5, "{curve:?}");
        }
    }

    #[test]
    fn stationary_and_boundary() {
        let curve = Bezier::quad(pt(0.0, 0.0), pt(1.0, 2.0), pt(2.0, 0.0));
        assert_eq!(curve.stationary().as_slice(), &[0.5]);
        let bbox = curve.boundary();
        assert_eq!((bbox.x0, bbox.y0), (0.0, 0.0));
        assert!((bbox.y1 - 1.0).abs() < 1e-12);
        assert_eq!(bbox.x1, 2.0);
    }

    #[test]
    fn inflections_agree_with_cross_polynomial() {
        let curve = Bezier::cubic(pt(0.0, 0.0), pt(1.0, 2.0), pt(2.0, -2.0), pt(3.0, 0.0));
        let closed_form = curve.inflections();
        assert_eq!(closed_form.len(), 1);
        assert!((closed_form[0] - 0.5).abs() < 1e-9);
        // The elevated curve takes the general path.
        let general = curve.elevated().inflections();
        assert_eq!(general.len(), 1);
        assert!((general[0] - 0.5).abs() < 1e-9);
        // Convex arcs have none.
        let arc = Bezier::cubic(pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 2.0), pt(2.0, 2.0));
        assert!(arc.inflections().is_empty());
    }

    #[test]
    fn closest_point() {
        let line = Bezier::line(pt(0.0, 0.0), pt(4.0, 0.0));
        let (t, p) = line.closest(pt(1.0, 3.0));
        assert!((t - 0.25).abs() < 1e-12);
        assert_eq!(p, pt(1.0, 0.0));
        let (t, _) = line.closest(pt(-5.0, 1.0));
        assert_eq!(t, 0.0);
        let cubic = &curves()[2];
        let target = cubic.eval(0.8) + pt(0.0, -0.01);
        let (t, _) = cubic.closest(target);
        assert!((t - 0.8).abs() < 0.05);
    }

    #[test]
    fn self_intersection_of_loop() {
        let curve = &curves()[2];
        let (t1, t2) = curve.self_intersection().unwrap();
        assert!(0.0 < t1 && t1 < t2 && t2 < 1.0);
        assert!((t1 - 0.24040).abs() < 1e-4);
        assert!((t2 - 0.68086).abs() < 1e-4);
        assert!(curve.eval(t1).distance(curve.eval(t2)) < 1e-9);
        assert!(curves()[1].self_intersection().is_none());
        let arc = Bezier::cubic(pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 2.0), pt(2.0, 2.0));
        assert!(arc.self_intersection().is_none());
        // Cut through the loop, one crossing is left outside.
        let (head, _) = curve.split(0.5);
        assert!(head.self_intersection().is_none());
    }

    #[test]
    fn signed_area_of_parabolic_segment() {
        let curve = Bezier::quad(pt(0.0, 0.0), pt(1.0, 2.0), pt(2.0, 0.0));
        assert!((curve.signed_area() + 4.0 / 3.0).abs() < 1e-12);
        let reversed = Bezier::quad(pt(2.0, 0.0), pt(1.0, 2.0), pt(0.0, 0.0));
        assert!((reversed.signed_area() - 4.0 / 3.0).abs() < 1e-12);
        // Same area as a cubic.
        assert!((curve.elevated().signed_area() + 4.0 / 3.0).abs() < 1e-12);
    }
}
