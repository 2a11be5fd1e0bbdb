// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::atomic::AtomicI16;

use curvefill_encoding::stencil::{sample_center, sample_span, Accumulate};
use curvefill_encoding::{CubicRecord, KernelParams, QuadRecord, StencilRecord, TriangleRecord};

use super::CpuBinding;
use crate::SHADERS;

/// Sample range `[x0, y0, x1, y1)` of a workgroup.
fn workgroup_bounds(wg: u32, stride: u32, rows: u32) -> [u32; 4] {
    let [wg_width, wg_height, _] = SHADERS.stencil.workgroup_size;
    let tiles_x = stride.div_ceil(wg_width).max(1);
    let x0 = (wg % tiles_x) * wg_width;
    let y0 = (wg / tiles_x) * wg_height;
    [
        x0,
        y0,
        (x0 + wg_width).min(stride),
        (y0 + wg_height).min(rows),
    ]
}

fn stencil_record<R: StencilRecord>(
    params: &KernelParams,
    record: &R,
    bounds: [u32; 4],
    stride: u32,
    stencil: &mut &[AtomicI16],
) {
    let [min_x, min_y, max_x, max_y] = record.bounds();
    let (x0, x1) = sample_span(
        min_x,
        max_x,
        params.pixel_offset[0],
        params.antialias,
        bounds[0],
        bounds[2],
    );
    let (y0, y1) = sample_span(
        min_y,
        max_y,
        params.pixel_offset[1],
        params.antialias,
        bounds[1],
        bounds[3],
    );
    for y in y0..y1 {
        for x in x0..x1 {
            let q = sample_center(params.pixel_offset, params.antialias, x, y);
            let delta = record.winding_at(q);
            if delta != 0 {
                stencil.accumulate((y * stride + x) as usize, delta);
            }
        }
    }
}

fn stencil_main(
    wg: u32,
    params: &KernelParams,
    triangles: &[TriangleRecord],
    quads: &[QuadRecord],
    cubics: &[CubicRecord],
    mut stencil: &[AtomicI16],
) {
    let stride = params.row_width * params.antialias;
    if stride == 0 {
        return;
    }
    let rows = (stencil.len() / stride as usize) as u32;
    let bounds = workgroup_bounds(wg, stride, rows);
    if bounds[0] >= bounds[2] || bounds[1] >= bounds[3] {
        return;
    }
    for triangle in triangles {
        stencil_record(params, triangle, bounds, stride, &mut stencil);
    }
    for quad in quads {
        stencil_record(params, quad, bounds, stride, &mut stencil);
    }
    for cubic in cubics {
        stencil_record(params, cubic, bounds, stride, &mut stencil);
    }
}

/// Accumulates the winding of every record into the stencil.
///
/// `n_wg` workgroups tile the stencil row by row, each covering a block of
/// samples the size of the stencil workgroup. Each workgroup visits every
/// record but writes only inside its own block, so no two workgroups ever
/// add to the same sample and the atomic adds never contend.
pub fn stencil(n_wg: u32, resources: &[CpuBinding<'_>]) {
    let params = resources[0].as_typed::<KernelParams>();
    let triangles = resources[1].as_slice::<TriangleRecord>();
    let quads = resources[2].as_slice::<QuadRecord>();
    let cubics = resources[3].as_slice::<CubicRecord>();
    let stencil = resources[4].as_atomic();
    let (params, triangles, quads, cubics) = (&*params, &*triangles, &*quads, &*cubics);
    #[cfg(feature = "multithreading")]
    {
        use rayon::prelude::*;
        (0..n_wg).into_par_iter().for_each(|wg| {
            stencil_main(wg, params, triangles, quads, cubics, stencil);
        });
    }
    #[cfg(not(feature = "multithreading"))]
    for wg in 0..n_wg {
        stencil_main(wg, params, triangles, quads, cubics, stencil);
    }
}
