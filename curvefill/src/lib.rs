// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curvefill rasterizes filled vector paths made of lines, quadratic and
//! cubic Bézier segments.
//!
//! A path is decomposed into a triangle fan over its segment endpoints plus
//! one primitive per curve. Cubics are classified with the Loop–Blinn method,
//! which gives each one an implicit form whose sign tells whether a point
//! lies between the curve and its chord. Each primitive adds its signed
//! winding to a supersampled stencil, and a fill rule turns the stencil into
//! coverage.
//!
//! Two backends produce identical stencils: a sequential scanline walk, and
//! the per-sample stencil kernel from `curvefill_shaders`, which runs its
//! workgroups in parallel when the `multithreading` feature is enabled.
//!
//! ```
//! use curvefill::peniko::Fill;
//! use curvefill::{rasterize, PathBuilder};
//!
//! let path = PathBuilder::new()
//!     .move_to((2.0, 2.0))
//!     .line_to((14.0, 2.0))
//!     .quad_to((14.0, 14.0), (2.0, 14.0))
//!     .close()
//!     .finish();
//! let coverage = rasterize(&path, 16, 16, Fill::NonZero, 4)?;
//! assert_eq!(coverage.get(4, 4), 1.0);
//! assert_eq!(coverage.get(0, 0), 0.0);
//! # Ok::<(), curvefill::Error>(())
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Feel free to send a PR that solves one or more of these.
// Need to allow instead of expect until Rust 1.83 https://github.com/rust-lang/rust/pull/130025
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred, only apply in some feature sets so not expect"
)]

mod buffers;
mod kernel;
mod scanline;

use std::num::NonZeroUsize;

use curvefill_encoding::{decompose, KernelParams, Records};
use thiserror::Error;

pub use buffers::{ColorBuffer, Coverage, Stencil};
pub use curvefill_encoding::{
    Component, Path, PathBuilder, Point, Segment, Transform, MAX_CHANNELS,
};
pub use peniko;
pub use peniko::kurbo;

pub mod low_level {
    //! The stages between a [`Path`](crate::Path) and its stencil, for
    //! inspecting or driving them directly.

    pub use curvefill_encoding::{
        classify, decompose, Bezier, Classification, CubicPrimitive, CurveClass, CuspKind,
        Decomposition, Invariants, KernelParams, Polynomial, Primitive, Records, StencilRecord,
    };
    pub use curvefill_shaders::SHADERS;
}

/// Largest supported supersampling factor per axis.
pub const MAX_ANTIALIAS: u32 = 16;

/// Errors that can occur in Curvefill.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The output has no pixels.
    #[error("Output size {0}x{1} is empty")]
    EmptyTarget(u32, u32),
    /// The supersampling factor is zero or too large.
    #[error("Antialiasing factor {0} is outside 1..={max}", max = MAX_ANTIALIAS)]
    InvalidAntialias(u32),
    /// The supersampled stencil can't be indexed with `u32`.
    #[error("Stencil of {0}x{1} samples is too large")]
    StencilTooLarge(u64, u64),
    /// A color needs one to [`MAX_CHANNELS`] channels.
    #[error("Color has {0} channels, expected 1 to {max}", max = MAX_CHANNELS)]
    InvalidChannels(usize),
    /// The path has a NaN or infinite coordinate.
    #[error("Path has non-finite coordinates")]
    NonFinitePath,
    /// The dedicated thread pool couldn't be created.
    #[cfg(feature = "multithreading")]
    #[error("Couldn't create thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Which implementation accumulates the stencil.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Sequential, one record and sample row at a time.
    #[default]
    Scanline,
    /// The CPU stencil and resolve kernels.
    Kernel,
}

/// Options which are set at renderer creation time, used in [`Renderer::new`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RendererOptions {
    pub backend: Backend,
    /// How many threads the kernel backend uses.
    ///
    /// `None` uses the global rayon thread pool. Has no effect without the
    /// `multithreading` feature or with the scanline backend.
    pub num_threads: Option<NonZeroUsize>,
}

/// Parameters used in a single render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    /// Width of the output in pixels.
    pub width: u32,
    /// Height of the output in pixels.
    pub height: u32,
    pub fill: peniko::Fill,
    /// Samples per pixel along each axis, from 1 to [`MAX_ANTIALIAS`].
    pub antialias: u32,
    /// Path space position of the output's top left pixel.
    pub origin: [u32; 2],
}

impl RenderParams {
    /// Nonzero fill of the region `(0, 0)` to `(width, height)` with one
    /// sample per pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fill: peniko::Fill::NonZero,
            antialias: 1,
            origin: [0, 0],
        }
    }

    #[must_use]
    pub fn with_fill(mut self, fill: peniko::Fill) -> Self {
        self.fill = fill;
        self
    }

    #[must_use]
    pub fn with_antialias(mut self, antialias: u32) -> Self {
        self.antialias = antialias;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: [u32; 2]) -> Self {
        self.origin = origin;
        self
    }

    /// Checks the parameters and returns the stencil size in samples.
    fn stencil_size(&self) -> Result<[u32; 2]> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::EmptyTarget(self.width, self.height));
        }
        if !(1..=MAX_ANTIALIAS).contains(&self.antialias) {
            return Err(Error::InvalidAntialias(self.antialias));
        }
        let stride = u64::from(self.width) * u64::from(self.antialias);
        let rows = u64::from(self.height) * u64::from(self.antialias);
        match stride.checked_mul(rows) {
            Some(samples) if samples <= u64::from(u32::MAX) => Ok([stride as u32, rows as u32]),
            _ => Err(Error::StencilTooLarge(stride, rows)),
        }
    }

    fn kernel_params(&self, color: &[f32]) -> KernelParams {
        let mut fill_color = [0.0; MAX_CHANNELS];
        fill_color[..color.len()].copy_from_slice(color);
        KernelParams {
            pixel_offset: self.origin,
            row_width: self.width,
            antialias: self.antialias,
            fill_color,
        }
    }
}

/// Rasterizes paths into stencils, coverage or color.
#[derive(Debug)]
pub struct Renderer {
    options: RendererOptions,
    #[cfg(feature = "multithreading")]
    thread_pool: Option<rayon::ThreadPool>,
}

static_assertions::assert_impl_all!(Renderer: Send, Sync);

impl Renderer {
    pub fn new(options: RendererOptions) -> Result<Self> {
        #[cfg(feature = "multithreading")]
        let thread_pool = match options.num_threads {
            Some(num_threads) if options.backend == Backend::Kernel => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads.get())
                    .thread_name(|i| format!("curvefill-{i}"))
                    .build()?,
            ),
            _ => None,
        };
        Ok(Self {
            options,
            #[cfg(feature = "multithreading")]
            thread_pool,
        })
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Runs `f` on the dedicated thread pool, if there is one.
    fn install<T: Send>(&self, f: impl FnOnce() -> T + Send) -> T {
        #[cfg(feature = "multithreading")]
        if let Some(pool) = &self.thread_pool {
            return pool.install(f);
        }
        f()
    }

    fn encode(path: &Path) -> Result<Records> {
        if !path.is_finite() {
            log::warn!("rejecting path with non-finite coordinates");
            return Err(Error::NonFinitePath);
        }
        let decomposition = decompose(path);
        Ok(decomposition.encode())
    }

    /// Accumulates the winding of `path` at every sample.
    pub fn render_stencil(&self, path: &Path, params: &RenderParams) -> Result<Stencil> {
        let [stride, rows] = params.stencil_size()?;
        let records = Self::encode(path)?;
        let kernel_params = params.kernel_params(&[]);
        log::debug!(
            "rendering {} triangles, {} quadratics and {} cubic triangles into {stride}x{rows} samples with the {:?} backend",
            records.triangles.len(),
            records.quads.len(),
            records.cubics.len(),
            self.options.backend
        );
        let samples = match self.options.backend {
            Backend::Scanline => scanline::render_stencil(&records, &kernel_params, stride, rows),
            Backend::Kernel => self.install(|| {
                kernel::render_stencil(&records, &kernel_params, stride, rows)
            }),
        };
        Ok(Stencil {
            width: params.width,
            height: params.height,
            antialias: params.antialias,
            samples,
        })
    }

    /// Renders the fraction of each pixel covered by `path` under
    /// `params.fill`.
    pub fn render(&self, path: &Path, params: &RenderParams) -> Result<Coverage> {
        let stencil = self.render_stencil(path, params)?;
        let alpha = match self.options.backend {
            Backend::Scanline => return Ok(stencil.resolve(params.fill)),
            Backend::Kernel => self.resolve(&stencil, params, &[1.0]),
        };
        Ok(Coverage {
            width: params.width,
            height: params.height,
            alpha,
        })
    }

    /// Renders `color` scaled by the coverage of `path`, interleaved per
    /// pixel.
    pub fn render_color(
        &self,
        path: &Path,
        params: &RenderParams,
        color: &[f32],
    ) -> Result<ColorBuffer> {
        if !(1..=MAX_CHANNELS).contains(&color.len()) {
            return Err(Error::InvalidChannels(color.len()));
        }
        let stencil = self.render_stencil(path, params)?;
        let data = match self.options.backend {
            Backend::Scanline => return Ok(stencil.resolve_color(params.fill, color)),
            Backend::Kernel => self.resolve(&stencil, params, color),
        };
        Ok(ColorBuffer {
            width: params.width,
            height: params.height,
            channels: color.len(),
            data,
        })
    }

    fn resolve(&self, stencil: &Stencil, params: &RenderParams, color: &[f32]) -> Vec<f32> {
        let kernel_params = params.kernel_params(color);
        let pixels = params.width * params.height;
        self.install(|| {
            kernel::resolve(
                &stencil.samples,
                &kernel_params,
                params.fill,
                pixels,
                color.len(),
            )
        })
    }
}

/// Renders the coverage of `path` over `(0, 0)` to `(width, height)` with
/// `antialias²` samples per pixel, using the default renderer.
pub fn rasterize(
    path: &Path,
    width: u32,
    height: u32,
    fill: peniko::Fill,
    antialias: u32,
) -> Result<Coverage> {
    let params = RenderParams::new(width, height)
        .with_fill(fill)
        .with_antialias(antialias);
    Renderer::new(RendererOptions::default())?.render(path, &params)
}
