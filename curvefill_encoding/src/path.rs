// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{self, PathEl};

use crate::bezier::Bezier;
use crate::math::{Point, Transform};

/// One segment of a component, starting where the previous one ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Line(Point),
    Quad(Point, Point),
    Cubic(Point, Point, Point),
}

impl Segment {
    pub fn end(&self) -> Point {
        match *self {
            Self::Line(p) | Self::Quad(_, p) | Self::Cubic(_, _, p) => p,
        }
    }

    pub fn to_bezier(&self, start: Point) -> Bezier<Point> {
        match *self {
            Self::Line(p1) => Bezier::line(start, p1),
            Self::Quad(p1, p2) => Bezier::quad(start, p1, p2),
            Self::Cubic(p1, p2, p3) => Bezier::cubic(start, p1, p2, p3),
        }
    }

    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let t = |p| transform.apply(p);
        match *self {
            Self::Line(p1) => Self::Line(t(p1)),
            Self::Quad(p1, p2) => Self::Quad(t(p1), t(p2)),
            Self::Cubic(p1, p2, p3) => Self::Cubic(t(p1), t(p2), t(p3)),
        }
    }

    fn points(&self) -> impl Iterator<Item = Point> {
        let (points, len) = match *self {
            Self::Line(p1) => ([p1, p1, p1], 1),
            Self::Quad(p1, p2) => ([p1, p2, p2], 2),
            Self::Cubic(p1, p2, p3) => ([p1, p2, p3], 3),
        };
        points.into_iter().take(len)
    }
}

/// A closed outline: a start point and the segments walking back to it.
///
/// A component without segments covers nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl Component {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    pub fn end(&self) -> Point {
        self.segments.last().map_or(self.start, Segment::end)
    }

    /// Whether the last segment returns to the start point.
    pub fn is_closed(&self) -> bool {
        self.end() == self.start
    }

    /// The segments as curves, each with its start point.
    pub fn beziers(&self) -> impl Iterator<Item = Bezier<Point>> + '_ {
        let starts = std::iter::once(self.start).chain(self.segments.iter().map(Segment::end));
        starts
            .zip(&self.segments)
            .map(|(start, segment)| segment.to_bezier(start))
    }
}

/// An ordered collection of closed components whose windings add up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    components: Vec<Component>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|c| c.segments.is_empty())
    }

    pub fn segment_count(&self) -> usize {
        self.components.iter().map(|c| c.segments.len()).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.components.iter().all(|c| {
            c.start.is_finite() && c.segments.iter().all(|s| s.points().all(Point::is_finite))
        })
    }

    /// Tight bounds of the outline, from each segment's stationary points.
    ///
    /// `None` when no component has a segment.
    pub fn bounding_box(&self) -> Option<kurbo::Rect> {
        self.components
            .iter()
            .filter(|c| !c.segments.is_empty())
            .flat_map(Component::beziers)
            .map(|curve| curve.boundary())
            .reduce(|a, b| a.union(b))
    }

    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let components = self
            .components
            .iter()
            .map(|c| Component {
                start: transform.apply(c.start),
                segments: c.segments.iter().map(|s| s.transformed(transform)).collect(),
            })
            .collect();
        Self { components }
    }

    pub fn to_kurbo(&self) -> kurbo::BezPath {
        let mut path = kurbo::BezPath::new();
        for component in &self.components {
            path.move_to(component.start);
            for segment in &component.segments {
                match *segment {
                    Segment::Line(p1) => path.line_to(p1),
                    Segment::Quad(p1, p2) => path.quad_to(p1, p2),
                    Segment::Cubic(p1, p2, p3) => path.curve_to(p1, p2, p3),
                }
            }
            path.close_path();
        }
        path
    }
}

impl From<&kurbo::BezPath> for Path {
    /// Every subpath is closed with an explicit line when it doesn't end at
    /// its start point.
    fn from(path: &kurbo::BezPath) -> Self {
        let mut builder = PathBuilder::new();
        builder.path_elements(path.elements().iter().copied());
        builder.finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BuilderState {
    Start,
    MoveTo,
    NonemptySubpath,
}

/// Incremental construction of a fill [`Path`].
///
/// Every subpath is closed: starting a new one, [`PathBuilder::close`] and
/// [`PathBuilder::finish`] append a line back to the start point if needed.
/// Zero-length segments are dropped.
#[derive(Debug)]
pub struct PathBuilder {
    path: Path,
    current: Component,
    state: BuilderState,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            path: Path::new(),
            current: Component::new(Point::ZERO),
            state: BuilderState::Start,
        }
    }

    /// Starts a new subpath, closing the current one.
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.close();
        self.current = Component::new(p.into());
        self.state = BuilderState::MoveTo;
        self
    }

    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.push(Segment::Line(p), p)
    }

    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let (p1, p2) = (p1.into(), p2.into());
        self.push(Segment::Quad(p1, p2), p2)
    }

    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let (p1, p2, p3) = (p1.into(), p2.into(), p3.into());
        self.push(Segment::Cubic(p1, p2, p3), p3)
    }

    fn push(&mut self, segment: Segment, end: Point) -> &mut Self {
        if self.state == BuilderState::Start {
            // Like kurbo, a segment without a preceding move starts a
            // subpath at its end point.
            return self.move_to(end);
        }
        let start = self.current.end();
        if segment.points().all(|p| p == start) {
            return self;
        }
        self.current.segments.push(segment);
        self.state = BuilderState::NonemptySubpath;
        self
    }

    /// Closes the current subpath with a line back to its start point.
    pub fn close(&mut self) -> &mut Self {
        match self.state {
            BuilderState::Start => return self,
            BuilderState::MoveTo => {
                self.state = BuilderState::Start;
                return self;
            }
            BuilderState::NonemptySubpath => (),
        }
        let start = self.current.start;
        if !self.current.is_closed() {
            self.current.segments.push(Segment::Line(start));
        }
        let component = std::mem::replace(&mut self.current, Component::new(start));
        self.path.push(component);
        self.state = BuilderState::Start;
        self
    }

    pub fn path_elements(&mut self, elements: impl Iterator<Item = PathEl>) -> &mut Self {
        for el in elements {
            match el {
                PathEl::MoveTo(p0) => self.move_to(p0),
                PathEl::LineTo(p0) => self.line_to(p0),
                PathEl::QuadTo(p0, p1) => self.quad_to(p0, p1),
                PathEl::CurveTo(p0, p1, p2) => self.cubic_to(p0, p1, p2),
                PathEl::ClosePath => self.close(),
            };
        }
        self
    }

    /// Closes the current subpath and returns the path.
    pub fn finish(&mut self) -> Path {
        self.close();
        std::mem::take(&mut self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_closes_subpaths() {
        let path = PathBuilder::new()
            .move_to((0.0, 0.0))
            .line_to((4.0, 0.0))
            .line_to((4.0, 4.0))
            .move_to((10.0, 10.0))
            .quad_to((12.0, 8.0), (14.0, 10.0))
            .close()
            .finish();
        assert_eq!(path.components().len(), 2);
        for component in path.components() {
            assert!(component.is_closed());
        }
        assert_eq!(path.components()[0].segments.len(), 3);
        assert_eq!(path.segment_count(), 5);
    }

    #[test]
    fn builder_drops_degenerate_input() {
        let path = PathBuilder::new()
            .move_to((1.0, 1.0))
            .move_to((0.0, 0.0))
            .line_to((0.0, 0.0))
            .line_to((2.0, 0.0))
            .line_to((0.0, 2.0))
            .close()
            .move_to((5.0, 5.0))
            .finish();
        assert_eq!(path.components().len(), 1);
        assert_eq!(path.components()[0].start, Point::ZERO);
        assert_eq!(path.components()[0].segments.len(), 3);
    }

    #[test]
    fn segment_without_move_starts_subpath() {
        let path = PathBuilder::new()
            .line_to((1.0, 1.0))
            .line_to((2.0, 1.0))
            .line_to((1.0, 2.0))
            .finish();
        assert_eq!(path.components()[0].start, Point::new(1.0, 1.0));
        assert_eq!(path.components()[0].segments.len(), 3);
    }

    #[test]
    fn kurbo_round_trip() {
        let circle = kurbo::Circle::new((32.0, 32.0), 28.0);
        let bez = kurbo::Shape::to_path(&circle, 1e-3);
        let path = Path::from(&bez);
        assert_eq!(path.components().len(), 1);
        let bbox = path.bounding_box().unwrap();
        assert!((bbox.x0 - 4.0).abs() < 1e-3 && (bbox.y1 - 60.0).abs() < 1e-3);
        let back = Path::from(&path.to_kurbo());
        assert_eq!(back, path);
    }

    #[test]
    fn transform_moves_every_point() {
        let path = PathBuilder::new()
            .move_to((0.0, 0.0))
            .cubic_to((1.0, 0.0), (1.0, 1.0), (0.0, 1.0))
            .finish();
        let moved = path.transformed(&(Transform::translate(2.0, 3.0) * Transform::scale(2.0)));
        let bbox = moved.bounding_box().unwrap();
        assert_eq!(bbox.origin(), kurbo::Point::new(2.0, 3.0));
        assert_eq!(bbox.y1, 5.0);
        assert!(Path::new().bounding_box().is_none());
        assert!(!path.is_empty());
        assert!(path.is_finite());
    }
}
