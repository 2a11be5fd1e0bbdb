// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch of the CPU stencil and resolve kernels.

use std::cell::RefCell;
use std::sync::atomic::AtomicI16;

use curvefill_encoding::{KernelParams, Records};
use curvefill_shaders::cpu::{self, CpuBinding};
use curvefill_shaders::SHADERS;
use peniko::Fill;

/// Runs the stencil kernel over a fresh `stride × rows` stencil.
pub(crate) fn render_stencil(
    records: &Records,
    params: &KernelParams,
    stride: u32,
    rows: u32,
) -> Vec<i16> {
    let samples: Vec<AtomicI16> = (0..stride as usize * rows as usize)
        .map(|_| AtomicI16::new(0))
        .collect();
    let [x, y, _] = SHADERS.stencil.workgroup_count([stride, rows, 1]);
    let resources = [
        CpuBinding::Buffer(bytemuck::bytes_of(params)),
        CpuBinding::Buffer(bytemuck::cast_slice(&records.triangles)),
        CpuBinding::Buffer(bytemuck::cast_slice(&records.quads)),
        CpuBinding::Buffer(bytemuck::cast_slice(&records.cubics)),
        CpuBinding::Atomic(&samples),
    ];
    log::trace!("dispatching {} with {} workgroups", SHADERS.stencil.name, x * y);
    cpu::stencil(x * y, &resources);
    samples.into_iter().map(AtomicI16::into_inner).collect()
}

/// Runs the resolve kernel for `fill`, writing `params.fill_color[..channels]`
/// scaled by coverage for each of `pixels` pixels.
pub(crate) fn resolve(
    stencil: &[i16],
    params: &KernelParams,
    fill: Fill,
    pixels: u32,
    channels: usize,
) -> Vec<f32> {
    let (shader, kernel): (_, fn(u32, &[CpuBinding<'_>])) = match fill {
        Fill::NonZero => (SHADERS.resolve_nonzero, cpu::resolve_nonzero),
        Fill::EvenOdd => (SHADERS.resolve_even_odd, cpu::resolve_even_odd),
    };
    let output = RefCell::new(vec![0_u8; pixels as usize * channels * size_of::<f32>()]);
    let [n_wg, _, _] = shader.workgroup_count([pixels, 1, 1]);
    let resources = [
        CpuBinding::Buffer(bytemuck::bytes_of(params)),
        CpuBinding::Buffer(bytemuck::cast_slice(stencil)),
        CpuBinding::BufferRW(&output),
    ];
    log::trace!("dispatching {} with {n_wg} workgroups", shader.name);
    kernel(n_wg, &resources);
    output
        .into_inner()
        .chunks_exact(size_of::<f32>())
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
