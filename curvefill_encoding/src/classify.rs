// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loop–Blinn classification and implicitization of cubic curves.
//!
//! A cubic is classified from three invariants of its power basis
//! coefficients. Each class yields functionals `k`, `l` and `m`, given as
//! values at the four control points, that are affine in the plane and
//! satisfy `k³ = l·m` along the curve. After [`Classification::orient`],
//! the region between the curve and its chord is where `k³ - l·m < 0`.

use crate::bezier::Params;
use crate::math::{almost_zero, almost_zero_relative, Point, Vec3, EPSILON};
use crate::poly::Polynomial;

/// The Loop–Blinn invariants `d1`, `d2`, `d3`, normalized so the largest
/// magnitude is one.
///
/// Each invariant is first compared against the squared size of the power
/// basis coefficients and flushed to zero when negligible, so rounding
/// noise on collinear control points is not scaled up to unit size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Invariants {
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
}

impl Invariants {
    pub fn new(p: &[Point; 4]) -> Self {
        let c1 = (p[1] - p[0]) * 3.0;
        let c2 = (p[0] - p[1] * 2.0 + p[2]) * 3.0;
        let c3 = p[3] - p[0] + (p[1] - p[2]) * 3.0;
        let d1 = -c3.cross(c2);
        let d2 = c3.cross(c1);
        let d3 = -c2.cross(c1);
        let size = [c1, c2, c3]
            .iter()
            .fold(0.0_f64, |m, c| m.max(c.x.abs()).max(c.y.abs()));
        let flush = |d: f64| if almost_zero_relative(d, size * size) { 0.0 } else { d };
        let (d1, d2, d3) = (flush(d1), flush(d2), flush(d3));
        let scale = d1.abs().max(d2.abs()).max(d3.abs());
        if scale > 0.0 && scale.is_finite() {
            Self {
                d1: d1 / scale,
                d2: d2 / scale,
                d3: d3 / scale,
            }
        } else {
            Self { d1, d2, d3 }
        }
    }

    pub fn discriminant(&self) -> f64 {
        3.0 * self.d2 * self.d2 - 4.0 * self.d1 * self.d3
    }

    pub fn is_finite(&self) -> bool {
        self.d1.is_finite() && self.d2.is_finite() && self.d3.is_finite()
    }

    /// Inflection parameters strictly inside the curve, sorted.
    ///
    /// Roots of `3·d1·t² - 3·d2·t + d3`.
    pub fn inflections(&self) -> Params {
        Polynomial::new([self.d3, -3.0 * self.d2, 3.0 * self.d1])
            .roots_in(EPSILON, 1.0 - EPSILON)
            .into_iter()
            .collect()
    }

    /// Both parameters of the double point, sorted, when the curve has a real
    /// one (anywhere on the infinite curve).
    pub fn double_points(&self) -> Option<(f64, f64)> {
        if almost_zero(self.d1) {
            return None;
        }
        let disc = self.discriminant();
        if disc >= -EPSILON {
            return None;
        }
        let root = (-disc).sqrt();
        let t1 = (self.d2 - root) / (2.0 * self.d1);
        let t2 = (self.d2 + root) / (2.0 * self.d1);
        Some((t1.min(t2), t1.max(t2)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CuspKind {
    /// `d1 = d2 = 0`: the cubic is a quadratic in disguise.
    InflectionAtInfinity,
    /// `d1 = 0`: a single inflection and a cusp at infinity.
    CuspAtInfinity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveClass {
    /// Collinear control points; contributes only through its chord.
    Line,
    Quadratic,
    Serpentine,
    Cusp(CuspKind),
    Loop,
}

/// A classified cubic with its implicit functionals at the control points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub class: CurveClass,
    /// `(k, l, m)` at each control point.
    pub klm: [Vec3; 4],
}

/// `k³ - l·m`; negative inside.
#[inline]
pub fn implicit(klm: Vec3) -> f64 {
    klm.x * klm.x * klm.x - klm.y * klm.z
}

/// Converts power basis rows (`t⁰` to `t³`) to control point values.
fn to_control_points(rows: [Vec3; 4]) -> [Vec3; 4] {
    let [a0, a1, a2, a3] = rows;
    [
        a0,
        a0 + a1 * (1.0 / 3.0),
        a0 + a1 * (2.0 / 3.0) + a2 * (1.0 / 3.0),
        a0 + a1 + a2 + a3,
    ]
}

/// Classifies the cubic with control points `p`.
pub fn classify(p: &[Point; 4]) -> Classification {
    let inv = Invariants::new(p);
    let Invariants { d1, d2, d3 } = inv;
    let disc = inv.discriminant();
    let (class, rows) = if almost_zero(d1) && almost_zero(d2) {
        if almost_zero(d3) {
            (CurveClass::Line, [Vec3::ZERO; 4])
        } else {
            // k = t, l = t², m = t
            let rows = [
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::ZERO,
            ];
            (CurveClass::Cusp(CuspKind::InflectionAtInfinity), rows)
        }
    } else if almost_zero(d1) {
        let (tl, sl) = (d3, 3.0 * d2);
        let rows = [
            Vec3::new(tl, tl * tl * tl, 1.0),
            Vec3::new(-sl, -3.0 * sl * tl * tl, 0.0),
            Vec3::new(0.0, 3.0 * sl * sl * tl, 0.0),
            Vec3::new(0.0, -sl * sl * sl, 0.0),
        ];
        (CurveClass::Cusp(CuspKind::CuspAtInfinity), rows)
    } else if disc >= -EPSILON {
        let root = (3.0 * disc.max(0.0)).sqrt();
        let (tl, tm) = (3.0 * d2 - root, 3.0 * d2 + root);
        let (sl, sm) = (6.0 * d1, 6.0 * d1);
        let rows = [
            Vec3::new(tl * tm, tl * tl * tl, tm * tm * tm),
            Vec3::new(
                -sm * tl - sl * tm,
                -3.0 * sl * tl * tl,
                -3.0 * sm * tm * tm,
            ),
            Vec3::new(sl * sm, 3.0 * sl * sl * tl, 3.0 * sm * sm * tm),
            Vec3::new(0.0, -sl * sl * sl, -sm * sm * sm),
        ];
        (CurveClass::Serpentine, rows)
    } else if disc < -EPSILON {
        let root = (-disc).sqrt();
        let (td, te) = (d2 + root, d2 - root);
        let (sd, se) = (2.0 * d1, 2.0 * d1);
        let rows = [
            Vec3::new(td * te, td * td * te, td * te * te),
            Vec3::new(
                -se * td - sd * te,
                -se * td * td - 2.0 * sd * te * td,
                -sd * te * te - 2.0 * se * td * te,
            ),
            Vec3::new(
                sd * se,
                te * sd * sd + 2.0 * se * td * sd,
                td * se * se + 2.0 * sd * te * se,
            ),
            Vec3::new(0.0, -sd * sd * se, -sd * se * se),
        ];
        (CurveClass::Loop, rows)
    } else {
        log::warn!("cubic {p:?} matches no class (invariants {inv:?}), treating it as a line");
        debug_assert!(!inv.is_finite(), "finite invariants must classify: {inv:?}");
        (CurveClass::Line, [Vec3::ZERO; 4])
    };
    Classification {
        class,
        klm: to_control_points(rows),
    }
}

impl Classification {
    /// Blends the functionals at `q`, using the widest triangle of control
    /// points. `None` when the control points are collinear.
    pub fn klm_at(&self, p: &[Point; 4], q: Point) -> Option<Vec3> {
        const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        let [i, j, k] = TRIPLES.into_iter().max_by(|a, b| {
            let area = |t: &[usize; 3]| (p[t[1]] - p[t[0]]).cross(p[t[2]] - p[t[0]]).abs();
            area(a).total_cmp(&area(b))
        })?;
        let (a, b, c) = (p[i], p[j], p[k]);
        let den = (b - a).cross(c - a);
        let extent = (b - a).length() * (c - a).length();
        if almost_zero_relative(den, extent) {
            return None;
        }
        let w1 = (q - a).cross(c - a) / den;
        let w2 = (b - a).cross(q - a) / den;
        let w0 = 1.0 - w1 - w2;
        Some(self.klm[i] * w0 + self.klm[j] * w1 + self.klm[k] * w2)
    }

    /// Flips the functionals so the region between the curve and its chord
    /// is negative.
    ///
    /// The sign of `k` at the second control point decides; when that is
    /// zero, an interior point between the chord and the curve midpoint
    /// does. Returns `None` if neither is conclusive.
    pub fn orient(&self, p: &[Point; 4]) -> Option<Self> {
        if self.class == CurveClass::Line {
            return Some(*self);
        }
        let k1 = self.klm[1].x;
        let flip = if !almost_zero(k1) {
            k1 < 0.0
        } else {
            let mid = cubic_midpoint(p);
            let interior = p[0].lerp(p[3], 0.5).lerp(mid, 0.5);
            let value = implicit(self.klm_at(p, interior)?);
            if almost_zero(value) {
                return None;
            }
            value > 0.0
        };
        let mut oriented = *self;
        if flip {
            for v in &mut oriented.klm {
                *v = Vec3::new(-v.x, -v.y, v.z);
            }
        }
        Some(oriented)
    }
}

fn cubic_midpoint(p: &[Point; 4]) -> Point {
    (p[0] + p[1] * 3.0 + p[2] * 3.0 + p[3]) * 0.125
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::Bezier;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    const LOOP: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.5),
        Point::new(-0.3, 1.0),
        Point::new(1.0, 0.0),
    ];

    const SERPENTINE: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 3.0),
        Point::new(2.0, -2.0),
        Point::new(4.0, 1.0),
    ];

    /// Point symmetric, so `d1` vanishes and the inflection sits at `t = ½`.
    const S_CURVE: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 2.0),
        Point::new(2.0, -2.0),
        Point::new(3.0, 0.0),
    ];

    /// Convex; its double point lies outside the unit interval.
    const ARC: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(1.0, 2.0),
        Point::new(2.0, 2.0),
    ];

    /// The cubic form of the quadratic (0, 0), (1, 2), (2, 0).
    const ELEVATED_QUAD: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(2.0 / 3.0, 4.0 / 3.0),
        Point::new(4.0 / 3.0, 4.0 / 3.0),
        Point::new(2.0, 0.0),
    ];

    /// Linear x, cubic y: `d1` vanishes.
    const CUSP_AT_INFINITY: [Point; 4] = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(2.0, 1.0),
        Point::new(3.0, 4.0),
    ];

    #[test]
    fn loop_invariants() {
        let inv = Invariants::new(&LOOP);
        assert!((inv.d1 - 1.0).abs() < 1e-3, "{inv:?}");
        assert!((inv.d2 - 0.921).abs() < 1e-3, "{inv:?}");
        assert!((inv.d3 - 0.685).abs() < 1e-3, "{inv:?}");
        assert!(inv.discriminant() < 0.0);
        assert!(inv.inflections().is_empty());
        let (t1, t2) = inv.double_points().unwrap();
        assert!(t1 > 0.0 && t2 < 1.0);
    }

    #[test]
    fn classes() {
        assert_eq!(classify(&LOOP).class, CurveClass::Loop);
        assert_eq!(classify(&SERPENTINE).class, CurveClass::Serpentine);
        assert_eq!(classify(&ARC).class, CurveClass::Loop);
        assert_eq!(
            classify(&S_CURVE).class,
            CurveClass::Cusp(CuspKind::CuspAtInfinity)
        );
        assert_eq!(
            classify(&ELEVATED_QUAD).class,
            CurveClass::Cusp(CuspKind::InflectionAtInfinity)
        );
        assert_eq!(
            classify(&CUSP_AT_INFINITY).class,
            CurveClass::Cusp(CuspKind::CuspAtInfinity)
        );
        let collinear = [pt(0.0, 0.0), pt(1.0, 1.0), pt(3.0, 3.0), pt(2.0, 2.0)];
        assert_eq!(classify(&collinear).class, CurveClass::Line);
    }

    #[test]
    fn inflections_match_bezier() {
        for p in [SERPENTINE, S_CURVE] {
            let params = Invariants::new(&p).inflections();
            assert_eq!(params.len(), 1);
            let curve = Bezier::cubic(p[0], p[1], p[2], p[3]);
            assert!((params[0] - curve.inflections()[0]).abs() < 1e-9);
        }
        assert!((Invariants::new(&S_CURVE).inflections()[0] - 0.5).abs() < 1e-12);
        assert!(Invariants::new(&ARC).inflections().is_empty());
    }

    #[test]
    fn implicit_vanishes_on_curve() {
        for p in [LOOP, SERPENTINE, S_CURVE, ARC, ELEVATED_QUAD, CUSP_AT_INFINITY] {
            let class = classify(&p);
            let curve = Bezier::cubic(p[0], p[1], p[2], p[3]);
            let scale = class
                .klm
                .iter()
                .fold(0.0_f64, |m, v| m.max(v.x.abs()).max(v.y.abs()).max(v.z.abs()));
            for i in 0..=16 {
                let q = curve.eval(i as f64 / 16.0);
                let value = implicit(class.klm_at(&p, q).unwrap());
                assert!(
                    value.abs() < 1e-9 * scale.powi(3).max(1.0),
                    "{:?} at {i}: {value}",
                    class.class
                );
            }
        }
    }

    #[test]
    fn oriented_interior_is_negative() {
        let serpentine = Bezier::cubic(SERPENTINE[0], SERPENTINE[1], SERPENTINE[2], SERPENTINE[3]);
        let t = Invariants::new(&SERPENTINE).inflections()[0];
        let half = serpentine.split(t).0.as_cubic().unwrap();
        for p in [half, ARC, ELEVATED_QUAD, CUSP_AT_INFINITY] {
            let class = classify(&p).orient(&p).unwrap();
            let curve = Bezier::cubic(p[0], p[1], p[2], p[3]);
            for t in [0.25, 0.5, 0.75] {
                let on = curve.eval(t);
                let chord = p[0].lerp(p[3], t);
                let inside = chord.lerp(on, 0.9);
                let outside = chord.lerp(on, 1.1);
                assert!(implicit(class.klm_at(&p, inside).unwrap()) < 0.0, "{p:?}");
                assert!(implicit(class.klm_at(&p, outside).unwrap()) > 0.0, "{p:?}");
            }
        }
        // The centroid of the loop itself.
        let class = classify(&LOOP).orient(&LOOP).unwrap();
        let (t1, t2) = Invariants::new(&LOOP).double_points().unwrap();
        let curve = Bezier::cubic(LOOP[0], LOOP[1], LOOP[2], LOOP[3]);
        let n = 200;
        let centroid = (0..n)
            .map(|i| curve.eval(t1 + (t2 - t1) * i as f64 / n as f64))
            .fold(Point::ZERO, |acc, q| acc + q)
            / n as f64;
        assert!(implicit(class.klm_at(&LOOP, centroid).unwrap()) < 0.0);
    }

    #[test]
    fn rounded_collinear_is_a_line() {
        let (a, b) = (pt(44.386, 8.931), pt(34.583, 4.166));
        let p = [a, a.lerp(b, 0.6853), a.lerp(b, 1.166), b];
        let inv = Invariants::new(&p);
        assert_eq!(inv, Invariants { d1: 0.0, d2: 0.0, d3: 0.0 });
        assert!(inv.inflections().is_empty());
        assert!(inv.double_points().is_none());
        assert_eq!(classify(&p).class, CurveClass::Line);
    }

    #[test]
    fn line_needs_no_orientation() {
        let collinear = [pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0), pt(3.0, 0.0)];
        let class = classify(&collinear);
        assert_eq!(class.orient(&collinear), Some(class));
        assert!(class.klm_at(&collinear, pt(1.0, 1.0)).is_none());
    }
}
