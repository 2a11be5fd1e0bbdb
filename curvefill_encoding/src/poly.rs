// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single variable polynomials in power basis, and their real roots.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

use smallvec::SmallVec;

use crate::math::{almost_zero_relative, EPSILON};

/// Real roots of a polynomial, in no particular order.
pub type Roots = SmallVec<[f64; 5]>;

/// Newton steps applied to closed-form cubic and quartic roots.
const POLISH_STEPS: usize = 2;

/// Iteration cap for bracketed refinement of higher degree roots.
const MAX_REFINE_STEPS: usize = 100;

/// A polynomial `c[0] + c[1] x + c[2] x² + ...`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polynomial {
    coeffs: SmallVec<[f64; 8]>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients ordered by increasing power.
    pub fn new(coeffs: impl IntoIterator<Item = f64>) -> Self {
        Self {
            coeffs: coeffs.into_iter().collect(),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficient of `x^power`, zero past the end.
    pub fn coeff(&self, power: usize) -> f64 {
        self.coeffs.get(power).copied().unwrap_or(0.0)
    }

    /// Nominal degree, counting trailing zero coefficients.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    pub fn derivative(&self) -> Self {
        Self::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c * i as f64),
        )
    }

    /// Antiderivative with a zero constant term.
    pub fn integral(&self) -> Self {
        Self::new(
            std::iter::once(0.0).chain(
                self.coeffs
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c / (i + 1) as f64),
            ),
        )
    }

    /// Drops trailing coefficients that are negligible next to the largest one.
    #[must_use]
    pub fn trim(&self) -> Self {
        let scale = self.coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        let mut coeffs = self.coeffs.clone();
        while let Some(&last) = coeffs.last() {
            if !almost_zero_relative(last, scale) {
                break;
            }
            coeffs.pop();
        }
        Self { coeffs }
    }

    /// All real roots.
    ///
    /// Degrees up to four use closed forms, each falling through to the next
    /// lower degree when the leading coefficient is negligible. Higher
    /// degrees bracket roots between critical points and refine them.
    pub fn roots(&self) -> Roots {
        let p = self.trim();
        let c = p.coeffs();
        let mut roots = match c.len() {
            0 | 1 => Roots::new(),
            2 => smallvec::smallvec![-c[0] / c[1]],
            3 => quadratic_roots(c[2], c[1], c[0]),
            4 => cubic_roots(c[3], c[2], c[1], c[0]),
            5 => quartic_roots(c[4], c[3], c[2], c[1], c[0]),
            _ => return p.refined_roots(),
        };
        if c.len() > 3 {
            let deriv = p.derivative();
            for root in &mut roots {
                *root = p.polish(&deriv, *root);
            }
        }
        roots.retain(|r| r.is_finite());
        roots
    }

    /// Real roots within `[min, max]`, sorted.
    pub fn roots_in(&self, min: f64, max: f64) -> Roots {
        let mut roots: Roots = self
            .roots()
            .into_iter()
            .filter(|r| *r >= min && *r <= max)
            .collect();
        roots.sort_by(f64::total_cmp);
        roots
    }

    fn polish(&self, deriv: &Self, mut x: f64) -> f64 {
        for _ in 0..POLISH_STEPS {
            let d = deriv.eval(x);
            if d == 0.0 || !d.is_finite() {
                break;
            }
            let next = x - self.eval(x) / d;
            if !next.is_finite() || self.eval(next).abs() > self.eval(x).abs() {
                break;
            }
            x = next;
        }
        x
    }

    /// Root isolation for degree above four. The polynomial must be trimmed.
    fn refined_roots(&self) -> Roots {
        let c = self.coeffs();
        let lead = c[c.len() - 1];
        let bound = 1.0
            + c[..c.len() - 1]
                .iter()
                .fold(0.0_f64, |m, x| m.max((x / lead).abs()));
        let deriv = self.derivative();
        let mut stops: SmallVec<[f64; 8]> = smallvec::smallvec![-bound];
        stops.extend(
            deriv
                .roots_in(-bound, bound)
                .into_iter()
                .filter(|x| *x > -bound && *x < bound),
        );
        stops.push(bound);

        let mut roots = Roots::new();
        let push = |r: f64, roots: &mut Roots| {
            if !roots.iter().any(|x| (x - r).abs() <= EPSILON * (1.0 + r.abs())) {
                roots.push(r);
            }
        };
        for pair in stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let (flo, fhi) = (self.eval(lo), self.eval(hi));
            if self.is_root(lo, flo) {
                push(lo, &mut roots);
            }
            if self.is_root(hi, fhi) {
                push(hi, &mut roots);
            } else if flo.signum() != fhi.signum() && !self.is_root(lo, flo) {
                push(self.refine(&deriv, lo, hi), &mut roots);
            }
        }
        roots
    }

    fn is_root(&self, x: f64, fx: f64) -> bool {
        let scale = self
            .coeffs
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x.abs() + c.abs());
        fx == 0.0 || almost_zero_relative(fx, scale)
    }

    /// Safeguarded Newton iteration on a bracket with a sign change.
    fn refine(&self, deriv: &Self, mut lo: f64, mut hi: f64) -> f64 {
        let flo_sign = self.eval(lo).signum();
        let mut x = 0.5 * (lo + hi);
        for _ in 0..MAX_REFINE_STEPS {
            let fx = self.eval(x);
            if fx == 0.0 {
                break;
            }
            if fx.signum() == flo_sign {
                lo = x;
            } else {
                hi = x;
            }
            let d = deriv.eval(x);
            let newton = x - fx / d;
            let next = if d != 0.0 && newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };
            if (next - x).abs() <= f64::EPSILON * (1.0 + x.abs()) {
                x = next;
                break;
            }
            x = next;
        }
        x
    }
}

/// Roots of `a x² + b x + c`, `a` non-zero.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Roots {
    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        if !almost_zero_relative(disc, b * b + (4.0 * a * c).abs()) {
            return Roots::new();
        }
        disc = 0.0;
    }
    if disc == 0.0 {
        return smallvec::smallvec![-0.5 * b / a];
    }
    // Avoid cancellation between -b and the square root.
    let q = -0.5 * (b + disc.sqrt().copysign(b));
    let mut roots: Roots = smallvec::smallvec![q / a];
    if q != 0.0 {
        roots.push(c / q);
    }
    roots
}

/// Roots of `a x³ + b x² + c x + d`, `a` non-zero.
fn cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Roots {
    let (a, b, c) = (b / a, c / a, d / a);
    let q = (a * a - 3.0 * b) / 9.0;
    let r = (2.0 * a * a * a - 9.0 * a * b + 27.0 * c) / 54.0;
    let shift = a / 3.0;
    let (r2, q3) = (r * r, q * q * q);
    if almost_zero_relative(r2 - q3, r2.max(q3.abs())) || (r == 0.0 && q == 0.0) {
        // Double (or triple) root.
        let u = -r.cbrt();
        if u == 0.0 {
            return smallvec::smallvec![-shift];
        }
        return smallvec::smallvec![2.0 * u - shift, -u - shift];
    }
    if r2 < q3 {
        let theta = (r / q3.sqrt()).clamp(-1.0, 1.0).acos();
        let m = -2.0 * q.sqrt();
        smallvec::smallvec![
            m * (theta / 3.0).cos() - shift,
            m * ((theta + 2.0 * PI) / 3.0).cos() - shift,
            m * ((theta - 2.0 * PI) / 3.0).cos() - shift,
        ]
    } else {
        let big_a = -(r.abs() + (r2 - q3).sqrt()).cbrt().copysign(r);
        let big_b = if big_a == 0.0 { 0.0 } else { q / big_a };
        smallvec::smallvec![big_a + big_b - shift]
    }
}

/// Roots of `a x⁴ + b x³ + c x² + d x + e`, `a` non-zero (Ferrari).
fn quartic_roots(a: f64, b: f64, c: f64, d: f64, e: f64) -> Roots {
    let (a, b, c, d) = (b / a, c / a, d / a, e / a);
    // Depressed quartic y⁴ + p y² + q y + r with x = y - a/4.
    let a2 = a * a;
    let p = b - 3.0 * a2 / 8.0;
    let q = c - a * b / 2.0 + a2 * a / 8.0;
    let r = d - a * c / 4.0 + a2 * b / 16.0 - 3.0 * a2 * a2 / 256.0;
    let shift = a / 4.0;
    let scale = p.abs().max(r.abs().sqrt()).max(1.0);

    let mut roots = Roots::new();
    if almost_zero_relative(q, scale * scale.sqrt()) {
        // Biquadratic in z = y².
        for z in quadratic_roots(1.0, p, r) {
            if z >= 0.0 {
                let y = z.sqrt();
                roots.push(y - shift);
                if y != 0.0 {
                    roots.push(-y - shift);
                }
            } else if almost_zero_relative(z, scale) {
                roots.push(-shift);
            }
        }
        return roots;
    }

    // Largest root of the resolvent cubic m³ + p m² + (p²/4 - r) m - q²/8.
    let m = cubic_roots(1.0, p, p * p / 4.0 - r, -q * q / 8.0)
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max);
    if !(m > 0.0) {
        return roots;
    }
    let s = (2.0 * m).sqrt();
    let t = q / (2.0 * s);
    for y in quadratic_roots(1.0, s, p / 2.0 + m - t)
        .into_iter()
        .chain(quadratic_roots(1.0, -s, p / 2.0 + m + t))
    {
        roots.push(y - shift);
    }
    roots
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Self) -> Polynomial {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Polynomial::new((0..n).map(|i| self.coeff(i) + rhs.coeff(i)))
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Self) -> Polynomial {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Polynomial::new((0..n).map(|i| self.coeff(i) - rhs.coeff(i)))
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Self) -> Polynomial {
        if self.coeffs.is_empty() || rhs.coeffs.is_empty() {
            return Polynomial::zero();
        }
        let mut coeffs: SmallVec<[f64; 8]> =
            smallvec::smallvec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial { coeffs }
    }
}

impl Mul<f64> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: f64) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|c| c * rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut roots: Roots) -> Vec<f64> {
        roots.sort_by(f64::total_cmp);
        roots.to_vec()
    }

    fn assert_roots(poly: &Polynomial, expected: &[f64]) {
        let roots = sorted(poly.roots());
        assert_eq!(roots.len(), expected.len(), "{poly:?}: {roots:?}");
        for (r, e) in roots.iter().zip(expected) {
            assert!((r - e).abs() < 1e-9, "{poly:?}: {roots:?} vs {expected:?}");
        }
    }

    /// Expands `(x - r0)(x - r1)...`.
    fn from_roots(roots: &[f64]) -> Polynomial {
        roots.iter().fold(Polynomial::new([1.0]), |acc, r| {
            &acc * &Polynomial::new([-r, 1.0])
        })
    }

    #[test]
    fn linear_and_constant() {
        assert_roots(&Polynomial::new([3.0]), &[]);
        assert_roots(&Polynomial::new([-3.0, 2.0]), &[1.5]);
        assert_roots(&Polynomial::zero(), &[]);
    }

    #[test]
    fn quadratic() {
        assert_roots(&from_roots(&[-1.0, 4.0]), &[-1.0, 4.0]);
        assert_roots(&Polynomial::new([1.0, 0.0, 1.0]), &[]);
        assert_roots(&Polynomial::new([1.0, -2.0, 1.0]), &[1.0]);
    }

    #[test]
    fn negligible_leading_coefficient_falls_through() {
        assert_roots(&Polynomial::new([-2.0, 1.0, 1e-14]), &[2.0]);
        assert_roots(&Polynomial::new([6.0, -5.0, 1.0, 0.0, 0.0]), &[2.0, 3.0]);
    }

    #[test]
    fn cubic_three_real_and_one_real() {
        assert_roots(&from_roots(&[-2.0, 0.5, 3.0]), &[-2.0, 0.5, 3.0]);
        // (x - 1)(x² + 1)
        assert_roots(&Polynomial::new([-1.0, 1.0, -1.0, 1.0]), &[1.0]);
        assert_roots(&from_roots(&[2.0, 2.0, -1.0]), &[-1.0, 2.0]);
    }

    #[test]
    fn quartic() {
        let p = Polynomial::new([24.0, -50.0, 35.0, -10.0, 1.0]);
        assert_eq!(p, from_roots(&[1.0, 2.0, 3.0, 4.0]));
        assert_roots(&p, &[1.0, 2.0, 3.0, 4.0]);
        // Biquadratic x⁴ - 5x² + 4.
        assert_roots(&Polynomial::new([4.0, 0.0, -5.0, 0.0, 1.0]), &[-2.0, -1.0, 1.0, 2.0]);
        // (x² + 1)(x - 2)(x + 3) has two real roots.
        let p = &Polynomial::new([1.0, 0.0, 1.0]) * &from_roots(&[2.0, -3.0]);
        assert_roots(&p, &[-3.0, 2.0]);
    }

    #[test]
    fn quintic_is_refined() {
        assert_roots(
            &from_roots(&[-1.5, 0.25, 1.0, 2.0, 3.5]),
            &[-1.5, 0.25, 1.0, 2.0, 3.5],
        );
        // x⁵ - x has roots -1, 0, 1.
        assert_roots(&Polynomial::new([0.0, -1.0, 0.0, 0.0, 0.0, 1.0]), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn derivative_and_integral() {
        let p = Polynomial::new([1.0, 2.0, 3.0]);
        assert_eq!(p.derivative(), Polynomial::new([2.0, 6.0]));
        assert_eq!(p.integral(), Polynomial::new([0.0, 1.0, 1.0, 1.0]));
        assert_eq!(p.integral().derivative(), p);
        assert_eq!(p.eval(2.0), 17.0);
    }

    #[test]
    fn arithmetic() {
        let a = Polynomial::new([1.0, 1.0]);
        let b = Polynomial::new([-1.0, 1.0]);
        assert_eq!(&a * &b, Polynomial::new([-1.0, 0.0, 1.0]));
        assert_eq!(&a + &b, Polynomial::new([0.0, 2.0]));
        assert_eq!(&a - &b, Polynomial::new([2.0, 0.0]));
        assert_eq!(&a * 2.0, Polynomial::new([2.0, 2.0]));
    }

    #[test]
    fn roots_in_range_are_sorted() {
        let p = from_roots(&[0.75, -3.0, 0.25]);
        assert_eq!(p.roots_in(0.0, 1.0).len(), 2);
        let r = p.roots_in(0.0, 1.0);
        assert!(r[0] < r[1]);
    }
}
