// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Helpers for the Curvefill integration tests.
//!
//! Renders can be written out as PNG files for inspection. Set
//! `CURVEFILL_DEBUG_TEST` to `all`, or to a comma separated list of test
//! names, and the matching renders land in `curvefill_tests/debug_outputs`.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs, reason = "Only for testing")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::print_stdout,
    reason = "Only for testing"
)]

mod oracle;

use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{bail, Result};
use curvefill::peniko::Fill;
use curvefill::{Backend, Coverage, Path, RenderParams, Renderer, RendererOptions, Stencil};

pub use oracle::{flatten, oracle_stencil, winding};

/// Everything needed to render one test scene.
#[derive(Clone, Debug)]
pub struct TestParams {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fill: Fill,
    pub antialias: u32,
    pub backend: Backend,
}

impl TestParams {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            fill: Fill::NonZero,
            antialias: 4,
            backend: Backend::Scanline,
        }
    }

    pub fn render_params(&self) -> RenderParams {
        RenderParams::new(self.width, self.height)
            .with_fill(self.fill)
            .with_antialias(self.antialias)
    }

    pub fn renderer(&self) -> Result<Renderer> {
        Ok(Renderer::new(RendererOptions {
            backend: self.backend,
            num_threads: NonZeroUsize::new(4).filter(|_| self.backend == Backend::Kernel),
        })?)
    }

    fn debug_name(&self) -> String {
        let backend = match self.backend {
            Backend::Scanline => "scanline",
            Backend::Kernel => "kernel",
        };
        format!("{}_{backend}", self.name)
    }
}

/// Renders `path` with `params`, saving the coverage as a PNG if the test is
/// selected by `CURVEFILL_DEBUG_TEST`.
pub fn render_then_debug(path: &Path, params: &TestParams) -> Result<Coverage> {
    let coverage = params.renderer()?.render(path, &params.render_params())?;
    let out_path = debug_outputs().join(format!("{}.png", params.debug_name()));
    if env_var_relates_to("CURVEFILL_DEBUG_TEST", &params.name) {
        std::fs::create_dir_all(debug_outputs())?;
        write_png_to_file(&coverage, &out_path)?;
        println!(
            "Wrote debug result ({}x{}) to {out_path:?}",
            coverage.width, coverage.height
        );
    } else if out_path.exists() {
        std::fs::remove_file(&out_path)?;
    }
    Ok(coverage)
}

/// Renders the stencil of `path` with both backends, failing if they differ
/// in any sample.
pub fn compare_backends(path: &Path, params: &TestParams) -> Result<Stencil> {
    let render_params = params.render_params();
    let render = |backend| -> Result<Stencil> {
        let params = TestParams {
            backend,
            ..params.clone()
        };
        Ok(params.renderer()?.render_stencil(path, &render_params)?)
    };
    let scanline = render(Backend::Scanline)?;
    let kernel = render(Backend::Kernel)?;
    if let Some(i) = scanline
        .samples
        .iter()
        .zip(&kernel.samples)
        .position(|(a, b)| a != b)
    {
        let stride = scanline.stride() as usize;
        bail!(
            "{}: backends differ at sample ({}, {}): {} vs {}",
            params.name,
            i % stride,
            i / stride,
            scanline.samples[i],
            kernel.samples[i]
        );
    }
    Ok(scanline)
}

fn debug_outputs() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("debug_outputs")
}

/// Writes coverage as an 8-bit grayscale PNG, white where covered.
pub fn write_png_to_file(coverage: &Coverage, out_path: &std::path::Path) -> Result<()> {
    let file = File::create(out_path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, coverage.width, coverage.height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let data: Vec<u8> = coverage
        .alpha
        .iter()
        .map(|a| (a.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}

/// Whether `var` is `all` or lists `name` among its comma separated entries.
pub fn env_var_relates_to(var: &'static str, name: &str) -> bool {
    std::env::var(var).is_ok_and(|value| {
        value.eq_ignore_ascii_case("all") || value.split(',').any(|item| item.trim() == name)
    })
}
