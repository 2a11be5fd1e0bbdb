// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decomposition of a closed path into fan triangles and classified curve
//! primitives.
//!
//! Each component becomes a triangle fan from its start point over the chain
//! of segment endpoints, which accounts for the polygon through those
//! points. Every curve then contributes the signed region between itself and
//! its chord.

use smallvec::SmallVec;

use crate::bezier::Bezier;
use crate::classify::{classify, Classification, CurveClass, CuspKind, Invariants};
use crate::math::{almost_zero_relative, bounds, Point, Vec3, EPSILON};
use crate::path::{Component, Path, Segment};
use crate::primitive::{CubicRecord, QuadRecord, Records, TriangleRecord};

/// Number of halvings tried on a cubic piece whose orientation can't be
/// decided before it is treated as a line.
pub const MAX_SUBDIVISION_DEPTH: u32 = 3;

/// A classified cubic piece, oriented so its interior is negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicPrimitive {
    pub points: [Point; 4],
    /// `(k, l, m)` at each control point.
    pub klm: [Vec3; 4],
    /// Signed area between the curve and its chord.
    pub area: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// A curve that contributes only through its chord.
    Line { from: Point, to: Point },
    Quadratic { points: [Point; 3] },
    Serpentine(CubicPrimitive),
    Cusp(CuspKind, CubicPrimitive),
    Loop(CubicPrimitive),
}

impl Primitive {
    pub fn class(&self) -> CurveClass {
        match self {
            Self::Line { .. } => CurveClass::Line,
            Self::Quadratic { .. } => CurveClass::Quadratic,
            Self::Serpentine(_) => CurveClass::Serpentine,
            Self::Cusp(kind, _) => CurveClass::Cusp(*kind),
            Self::Loop(_) => CurveClass::Loop,
        }
    }

    pub fn cubic(&self) -> Option<&CubicPrimitive> {
        match self {
            Self::Serpentine(c) | Self::Cusp(_, c) | Self::Loop(c) => Some(c),
            Self::Line { .. } | Self::Quadratic { .. } => None,
        }
    }
}

/// The output of [`decompose`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decomposition {
    pub triangles: Vec<[Point; 3]>,
    pub primitives: Vec<Primitive>,
}

impl Decomposition {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.primitives.is_empty()
    }

    /// Encodes the decomposition as kernel records.
    pub fn encode(&self) -> Records {
        let mut records = Records {
            triangles: self.triangles.iter().map(|t| TriangleRecord::new(*t)).collect(),
            ..Records::default()
        };
        for primitive in &self.primitives {
            match primitive {
                Primitive::Line { .. } => {}
                Primitive::Quadratic { points } => records.quads.push(QuadRecord::new(*points)),
                Primitive::Serpentine(c) | Primitive::Cusp(_, c) | Primitive::Loop(c) => {
                    encode_cubic(c, &mut records.cubics);
                }
            }
        }
        records
    }
}

/// Covers the control point hull of `cubic` with one or two triangles, each
/// wound to the sign of the cubic's area.
fn encode_cubic(cubic: &CubicPrimitive, out: &mut Vec<CubicRecord>) {
    let p = &cubic.points;
    let hull = convex_hull(p);
    let triangles: SmallVec<[[usize; 3]; 2]> = match *hull {
        [a, b, c] => smallvec::smallvec![[a, b, c]],
        [a, b, c, d] => smallvec::smallvec![[a, b, c], [a, c, d]],
        _ => SmallVec::new(),
    };
    for [a, mut b, mut c] in triangles {
        let o = (p[b] - p[a]).cross(p[c] - p[a]);
        if o == 0.0 {
            continue;
        }
        if (o > 0.0) != (cubic.area > 0.0) {
            std::mem::swap(&mut b, &mut c);
        }
        out.push(CubicRecord::new(
            [p[a], p[b], p[c]],
            [cubic.klm[a], cubic.klm[b], cubic.klm[c]],
        ));
    }
}

/// Indices of the convex hull of `points`, counter-clockwise in a y-up
/// frame. Collinear points are dropped.
fn convex_hull(points: &[Point; 4]) -> SmallVec<[usize; 4]> {
    let mut order = [0, 1, 2, 3];
    order.sort_by(|&i, &j| {
        points[i]
            .x
            .total_cmp(&points[j].x)
            .then(points[i].y.total_cmp(&points[j].y))
    });
    let chain = |indices: &mut dyn Iterator<Item = usize>| {
        let mut hull: SmallVec<[usize; 4]> = SmallVec::new();
        for i in indices {
            while let [.., a, b] = *hull {
                if (points[b] - points[a]).cross(points[i] - points[a]) > 0.0 {
                    break;
                }
                hull.pop();
            }
            hull.push(i);
        }
        hull
    };
    let mut lower = chain(&mut order.iter().copied());
    let mut upper = chain(&mut order.iter().rev().copied());
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Decomposes every component of `path`.
pub fn decompose(path: &Path) -> Decomposition {
    let mut out = Decomposition::default();
    for component in path.components() {
        decompose_component(component, &mut out);
    }
    log::trace!(
        "decomposed {} segments into {} triangles and {} primitives",
        path.segment_count(),
        out.triangles.len(),
        out.primitives.len()
    );
    out
}

fn decompose_component(component: &Component, out: &mut Decomposition) {
    if component.segments.is_empty() {
        return;
    }
    let start = component.start;
    let mut chain = vec![start];
    let mut current = start;
    for segment in &component.segments {
        match *segment {
            Segment::Line(end) => chain.push(end),
            Segment::Quad(ctrl, end) => {
                let (u, v) = (ctrl - current, end - current);
                if almost_zero_relative(u.cross(v), u.length() * v.length()) {
                    out.primitives.push(Primitive::Line {
                        from: current,
                        to: end,
                    });
                } else {
                    out.primitives.push(Primitive::Quadratic {
                        points: [current, ctrl, end],
                    });
                }
                chain.push(end);
            }
            Segment::Cubic(c1, c2, end) => {
                decompose_cubic([current, c1, c2, end], &mut chain, out);
            }
        }
        current = segment.end();
    }
    for pair in chain[1..].windows(2) {
        let triangle = [start, pair[0], pair[1]];
        if (pair[0] - start).cross(pair[1] - start) != 0.0 {
            out.triangles.push(triangle);
        }
    }
    log::trace!(
        "component at {:?}: {} segments, fan of {} vertices",
        start,
        component.segments.len(),
        chain.len()
    );
}

/// Splits a cubic at its inflections, or failing those at its double
/// point, and classifies the pieces. Every piece's end joins the fan chain.
fn decompose_cubic(p: [Point; 4], chain: &mut Vec<Point>, out: &mut Decomposition) {
    let invariants = Invariants::new(&p);
    let mut splits = invariants.inflections();
    if splits.is_empty() {
        if let Some((t1, t2)) = invariants.double_points() {
            splits.extend([t1, t2].into_iter().filter(|t| *t > EPSILON && *t < 1.0 - EPSILON));
        }
    }
    let mut rest = Bezier::cubic(p[0], p[1], p[2], p[3]);
    let mut prev = 0.0;
    for t in splits {
        let (piece, right) = rest.split((t - prev) / (1.0 - prev));
        classify_piece(&piece, 0, chain, out);
        rest = right;
        prev = t;
    }
    classify_piece(&rest, 0, chain, out);
}

fn classify_piece(
    piece: &Bezier<Point>,
    depth: u32,
    chain: &mut Vec<Point>,
    out: &mut Decomposition,
) {
    let Some(p) = piece.as_cubic() else {
        return;
    };
    let line = Primitive::Line {
        from: p[0],
        to: p[3],
    };
    let classification = classify(&p);
    let area = piece.signed_area();
    let extent = bounds(p).map_or(0.0, |bbox| bbox.width().max(bbox.height()));
    if classification.class == CurveClass::Line || area.abs() <= EPSILON * extent * extent {
        out.primitives.push(line);
        chain.push(p[3]);
        return;
    }
    let Some(Classification { class, klm }) = classification.orient(&p) else {
        if depth < MAX_SUBDIVISION_DEPTH {
            let (left, right) = piece.split(0.5);
            classify_piece(&left, depth + 1, chain, out);
            classify_piece(&right, depth + 1, chain, out);
        } else {
            log::warn!("orientation of cubic {p:?} is undecidable, treating it as a line");
            out.primitives.push(line);
            chain.push(p[3]);
        }
        return;
    };
    let cubic = CubicPrimitive {
        points: p,
        klm,
        area,
    };
    out.primitives.push(match class {
        CurveClass::Serpentine => Primitive::Serpentine(cubic),
        CurveClass::Cusp(kind) => Primitive::Cusp(kind, cubic),
        CurveClass::Loop => Primitive::Loop(cubic),
        CurveClass::Line | CurveClass::Quadratic => line,
    });
    chain.push(p[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathBuilder;
    use crate::primitive::StencilRecord;

    fn winding(records: &Records, q: [f64; 2]) -> i16 {
        let triangles = records.triangles.iter().map(|r| r.winding_at(q));
        let quads = records.quads.iter().map(|r| r.winding_at(q));
        let cubics = records.cubics.iter().map(|r| r.winding_at(q));
        triangles.chain(quads).chain(cubics).sum()
    }

    #[test]
    fn square_fans_into_two_triangles() {
        let path = PathBuilder::new()
            .move_to((0.0, 0.0))
            .line_to((4.0, 0.0))
            .line_to((4.0, 4.0))
            .line_to((0.0, 4.0))
            .close()
            .finish();
        let decomposition = decompose(&path);
        assert_eq!(decomposition.triangles.len(), 2);
        assert!(decomposition.primitives.is_empty());
        let records = decomposition.encode();
        assert_eq!(winding(&records, [1.0, 3.0]).abs(), 1);
        assert_eq!(winding(&records, [3.0, 1.0]).abs(), 1);
        assert_eq!(winding(&records, [5.0, 1.0]), 0);
    }

    #[test]
    fn empty_component_emits_nothing() {
        let path = Path::from_components(vec![Component::new(Point::new(3.0, 3.0))]);
        assert!(decompose(&path).is_empty());
        assert!(decompose(&Path::new()).encode().is_empty());
    }

    #[test]
    fn collinear_quad_is_a_line() {
        let path = PathBuilder::new()
            .move_to((0.0, 0.0))
            .quad_to((1.0, 1.0), (2.0, 2.0))
            .line_to((2.0, 0.0))
            .close()
            .finish();
        let decomposition = decompose(&path);
        assert_eq!(decomposition.primitives[0].class(), CurveClass::Line);
        assert!(decomposition.encode().quads.is_empty());
    }

    #[test]
    fn rounded_collinear_cubic_emits_no_cubic_records() {
        let (a, b) = (Point::new(44.386, 8.931), Point::new(34.583, 4.166));
        let path = PathBuilder::new()
            .move_to(a)
            .cubic_to(a.lerp(b, 0.6853), a.lerp(b, 1.166), b)
            .close()
            .finish();
        let decomposition = decompose(&path);
        assert!(decomposition
            .primitives
            .iter()
            .all(|p| p.class() == CurveClass::Line));
        assert!(decomposition.encode().cubics.is_empty());
    }

    #[test]
    fn elevated_quad_matches_quad() {
        let quad = PathBuilder::new()
            .move_to((0.0, 0.0))
            .quad_to((1.0, 2.0), (2.0, 0.0))
            .close()
            .finish();
        let cubic = PathBuilder::new()
            .move_to((0.0, 0.0))
            .cubic_to((2.0 / 3.0, 4.0 / 3.0), (4.0 / 3.0, 4.0 / 3.0), (2.0, 0.0))
            .close()
            .finish();
        let quad = decompose(&quad);
        let cubic = decompose(&cubic);
        // The chord closes back onto the start: the fan is degenerate.
        assert!(quad.triangles.is_empty() && cubic.triangles.is_empty());
        assert_eq!(
            cubic.primitives[0].class(),
            CurveClass::Cusp(CuspKind::InflectionAtInfinity)
        );
        let (quad, cubic) = (quad.encode(), cubic.encode());
        assert_eq!(quad.quads.len(), 1);
        assert_eq!(cubic.cubics.len(), 2);
        let inside = winding(&quad, [1.0, 0.5]);
        assert_ne!(inside, 0);
        assert_eq!(winding(&cubic, [1.0, 0.5]), inside);
        assert_eq!(winding(&quad, [1.0, 1.5]), 0);
        assert_eq!(winding(&cubic, [1.0, 1.5]), 0);
    }

    #[test]
    fn cubics_split_at_inflection_and_double_point() {
        let s_curve = PathBuilder::new()
            .move_to((0.0, 0.0))
            .cubic_to((1.0, 2.0), (2.0, -2.0), (3.0, 0.0))
            .close()
            .finish();
        let decomposition = decompose(&s_curve);
        assert_eq!(decomposition.primitives.len(), 2);
        // The two lobes have opposite signs.
        let areas: Vec<f64> = decomposition
            .primitives
            .iter()
            .map(|p| p.cubic().unwrap().area)
            .collect();
        assert!(areas[0] * areas[1] < 0.0, "{areas:?}");

        let looped = PathBuilder::new()
            .move_to((0.0, 0.0))
            .cubic_to((1.0, 1.5), (-0.3, 1.0), (1.0, 0.0))
            .close()
            .finish();
        let decomposition = decompose(&looped);
        assert_eq!(decomposition.primitives.len(), 3);
        assert!(decomposition
            .primitives
            .iter()
            .all(|p| p.class() != CurveClass::Line));
        // start, crossing, crossing, end, start: the crossings coincide up to
        // rounding.
        assert!(!decomposition.triangles.is_empty() && decomposition.triangles.len() <= 2);
    }

    #[test]
    fn hull_drops_interior_points() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
        ];
        assert_eq!(convex_hull(&square).len(), 4);
        let interior = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.5),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        ];
        let hull = convex_hull(&interior);
        assert_eq!(hull.len(), 3);
        assert!(!hull.contains(&1));
    }
}
