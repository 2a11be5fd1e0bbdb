// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A slow reference rasterizer: flatten every curve finely and count edge
//! crossings at each sample.

use curvefill::{Path, Point, RenderParams};

/// Steps per curve segment when flattening.
const STEPS: usize = 256;

/// One polyline per non-empty component, implicitly closed.
pub fn flatten(path: &Path) -> Vec<Vec<Point>> {
    path.components()
        .iter()
        .filter(|c| !c.segments.is_empty())
        .map(|c| {
            let mut polyline = vec![c.start];
            for curve in c.beziers() {
                if curve.degree() == 1 {
                    polyline.push(curve.end());
                    continue;
                }
                polyline.extend((1..=STEPS).map(|i| curve.eval(i as f64 / STEPS as f64)));
            }
            polyline
        })
        .collect()
}

/// Signed crossing of the edge `a -> b` by the rightward ray from `q`.
fn crossing(a: Point, b: Point, q: Point) -> i32 {
    let side = (b - a).cross(q - a);
    if a.y <= q.y && q.y < b.y && side > 0.0 {
        1
    } else if b.y <= q.y && q.y < a.y && side < 0.0 {
        -1
    } else {
        0
    }
}

fn edges(polylines: &[Vec<Point>]) -> impl Iterator<Item = (Point, Point)> + '_ {
    polylines.iter().flat_map(|polyline| {
        let n = polyline.len();
        (0..n).map(move |i| (polyline[i], polyline[(i + 1) % n]))
    })
}

/// Signed number of times the polylines wind around `q`.
///
/// Counterclockwise in y-down coordinates, as seen on screen, is negative.
pub fn winding(polylines: &[Vec<Point>], q: Point) -> i32 {
    edges(polylines).map(|(a, b)| crossing(a, b, q)).sum()
}

/// Winding at every sample center of the stencil `params` describes.
pub fn oracle_stencil(path: &Path, params: &RenderParams) -> Vec<i32> {
    let polylines = flatten(path);
    let n = params.antialias;
    let (stride, rows) = (params.width * n, params.height * n);
    let mut stencil = Vec::with_capacity(stride as usize * rows as usize);
    let mut row_edges = Vec::new();
    for y in 0..rows {
        let qy = params.origin[1] as f64 + (y as f64 + 0.5) / n as f64;
        // Only edges spanning the row can cross it.
        row_edges.clear();
        row_edges.extend(
            edges(&polylines).filter(|(a, b)| a.y.min(b.y) <= qy && qy < a.y.max(b.y)),
        );
        for x in 0..stride {
            let q = Point::new(params.origin[0] as f64 + (x as f64 + 0.5) / n as f64, qy);
            stencil.push(row_edges.iter().map(|(a, b)| crossing(*a, *b, q)).sum());
        }
    }
    stencil
}
