// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sequential scanline backend.
//!
//! Each record is walked one sample row at a time. The row's span is found
//! from where the triangle's edges cross it, widened by a sample on either
//! side, and every sample in the span is tested with the record's exact
//! predicate.

use curvefill_encoding::stencil::{sample_center, sample_span, Accumulate};
use curvefill_encoding::{KernelParams, Records, StencilRecord};

/// Horizontal extent of the triangle `v`, sorted by y, on the line at `y`.
fn row_extent(v: &[[f64; 2]; 3], y: f64) -> Option<(f64, f64)> {
    let [top, mid, bottom] = *v;
    let mut extent: Option<(f64, f64)> = None;
    let mut include = |x: f64| {
        extent = Some(match extent {
            Some((lo, hi)) => (lo.min(x), hi.max(x)),
            None => (x, x),
        });
    };
    for (a, b) in [(top, bottom), (top, mid), (mid, bottom)] {
        if y < a[1] || y > b[1] {
            continue;
        }
        if a[1] == b[1] {
            include(a[0]);
            include(b[0]);
        } else {
            include(a[0] + (b[0] - a[0]) * (y - a[1]) / (b[1] - a[1]));
        }
    }
    extent
}

fn scan_record<R: StencilRecord>(
    params: &KernelParams,
    record: &R,
    stride: u32,
    rows: u32,
    stencil: &mut [i16],
) {
    let [min_x, min_y, max_x, max_y] = record.bounds();
    let mut v = record.vertices().map(|p| [p[0] as f64, p[1] as f64]);
    v.sort_by(|a, b| a[1].total_cmp(&b[1]));
    let (offset_x, offset_y) = (params.pixel_offset[0], params.pixel_offset[1]);
    let pad = 1.0 / params.antialias as f64;
    let (y0, y1) = sample_span(min_y, max_y, offset_y, params.antialias, 0, rows);
    for y in y0..y1 {
        let sy = sample_center(params.pixel_offset, params.antialias, 0, y)[1];
        let (lo, hi) = row_extent(&v, sy).unwrap_or((min_x, max_x));
        let (x0, x1) = sample_span(
            (lo - pad).max(min_x),
            (hi + pad).min(max_x),
            offset_x,
            params.antialias,
            0,
            stride,
        );
        for x in x0..x1 {
            let q = sample_center(params.pixel_offset, params.antialias, x, y);
            let delta = record.winding_at(q);
            if delta != 0 {
                stencil.accumulate((y * stride + x) as usize, delta);
            }
        }
    }
}

/// Accumulates every record into a fresh `stride × rows` stencil.
pub(crate) fn render_stencil(
    records: &Records,
    params: &KernelParams,
    stride: u32,
    rows: u32,
) -> Vec<i16> {
    let mut stencil = vec![0_i16; stride as usize * rows as usize];
    for triangle in &records.triangles {
        scan_record(params, triangle, stride, rows, &mut stencil);
    }
    for quad in &records.quads {
        scan_record(params, quad, stride, rows, &mut stencil);
    }
    for cubic in &records.cubics {
        scan_record(params, cubic, stride, rows, &mut stencil);
    }
    stencil
}
