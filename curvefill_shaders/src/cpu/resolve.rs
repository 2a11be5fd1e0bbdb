// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use curvefill_encoding::stencil::pixel_coverage;
use curvefill_encoding::{KernelParams, MAX_CHANNELS};
use peniko::Fill;

use super::CpuBinding;
use crate::SHADERS;

/// Writes the pixels of workgroup `wg` into `out`, which holds exactly
/// those pixels.
fn resolve_main(
    wg: usize,
    params: &KernelParams,
    stencil: &[i16],
    channels: usize,
    fill: Fill,
    out: &mut [f32],
) {
    let wg_size = SHADERS.resolve_nonzero.workgroup_size[0] as usize;
    let width = params.row_width as usize;
    for local in 0..out.len() / channels {
        let pixel = wg * wg_size + local;
        let (x, y) = ((pixel % width) as u32, (pixel / width) as u32);
        let coverage = pixel_coverage(stencil, params.row_width, params.antialias, x, y, fill);
        for c in 0..channels {
            out[local * channels + c] = coverage * params.fill_color[c];
        }
    }
}

fn resolve(n_wg: u32, resources: &[CpuBinding<'_>], fill: Fill) {
    let params = resources[0].as_typed::<KernelParams>();
    let stencil = resources[1].as_slice::<i16>();
    let mut output = resources[2].as_slice_mut::<f32>();
    let samples_per_pixel = (params.antialias * params.antialias) as usize;
    if samples_per_pixel == 0 || params.row_width == 0 {
        return;
    }
    let pixels = stencil.len() / samples_per_pixel;
    if pixels == 0 {
        return;
    }
    let channels = output.len() / pixels;
    assert!(
        (1..=MAX_CHANNELS).contains(&channels),
        "output holds {channels} channels per pixel"
    );
    let wg_size = SHADERS.resolve_nonzero.workgroup_size[0] as usize;
    let covered = (n_wg as usize * wg_size).min(pixels);
    let output = &mut output[..covered * channels];
    let (params, stencil) = (&*params, &*stencil);
    #[cfg(feature = "multithreading")]
    {
        use rayon::prelude::*;
        output
            .par_chunks_mut(wg_size * channels)
            .enumerate()
            .for_each(|(wg, out)| resolve_main(wg, params, stencil, channels, fill, out));
    }
    #[cfg(not(feature = "multithreading"))]
    for (wg, out) in output.chunks_mut(wg_size * channels).enumerate() {
        resolve_main(wg, params, stencil, channels, fill, out);
    }
}

/// Resolves the stencil to coverage times fill color, covering samples with
/// a nonzero winding.
pub fn resolve_nonzero(n_wg: u32, resources: &[CpuBinding<'_>]) {
    resolve(n_wg, resources, Fill::NonZero);
}

/// Resolves the stencil to coverage times fill color, covering samples with
/// an odd winding.
pub fn resolve_even_odd(n_wg: u32, resources: &[CpuBinding<'_>]) {
    resolve(n_wg, resources, Fill::EvenOdd);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn run(kernel: fn(u32, &[CpuBinding<'_>]), stencil: &[i16], params: &KernelParams) -> Vec<f32> {
        let pixels = stencil.len() / (params.antialias * params.antialias) as usize;
        let output = RefCell::new(vec![0_u8; pixels * 2 * size_of::<f32>()]);
        let [n_wg, _, _] = SHADERS.resolve_nonzero.workgroup_count([pixels as u32, 1, 1]);
        kernel(
            n_wg,
            &[
                CpuBinding::Buffer(bytemuck::bytes_of(params)),
                CpuBinding::Buffer(bytemuck::cast_slice(stencil)),
                CpuBinding::BufferRW(&output),
            ],
        );
        let bytes = output.into_inner();
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[test]
    fn fill_rules_and_channels() {
        let mut fill_color = [0.0; 16];
        fill_color[0] = 1.0;
        fill_color[1] = 0.5;
        let params = KernelParams {
            pixel_offset: [0, 0],
            row_width: 2,
            antialias: 2,
            fill_color,
        };
        // Left pixel: windings 1, 2, 2, 0. Right pixel: 2, -2, 3, 0.
        let stencil = [1, 2, 2, -2, 2, 0, 3, 0];
        let nonzero = run(resolve_nonzero, &stencil, &params);
        assert_eq!(nonzero, [0.75, 0.375, 0.75, 0.375]);
        let even_odd = run(resolve_even_odd, &stencil, &params);
        assert_eq!(even_odd, [0.25, 0.125, 0.25, 0.125]);
    }

    #[test]
    fn many_workgroups() {
        let params = KernelParams {
            pixel_offset: [0, 0],
            row_width: 300,
            antialias: 1,
            fill_color: [1.0; 16],
        };
        let stencil: Vec<i16> = (0..600).map(|i| (i % 3) as i16).collect();
        let out = run(resolve_nonzero, &stencil, &params);
        for (i, pair) in out.chunks_exact(2).enumerate() {
            let expected = if i % 3 == 0 { 0.0 } else { 1.0 };
            assert_eq!(pair, [expected, expected], "{i}");
        }
    }
}
