// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Metadata and CPU implementations of the Curvefill kernels.
//!
//! Rasterization with the kernel backend runs in two dispatches. `stencil`
//! accumulates the signed winding of every encoded primitive into a
//! supersampled `i16` buffer, and one of the resolve kernels turns each
//! pixel's block of samples into coverage under a fill rule. [`SHADERS`]
//! describes the workgroup size and resource bindings of each, so a
//! dispatcher can size its workgroup counts and bind resources in order.

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
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Feel free to send a PR that solves one or more of these.
// Need to allow instead of expect until Rust 1.83 https://github.com/rust-lang/rust/pull/130025
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred, only apply in some feature sets so not expect"
)]

mod types;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use types::BindType;

use std::borrow::Cow;

#[derive(Clone, Debug)]
pub struct ComputeShader<'a> {
    pub name: Cow<'a, str>,
    pub workgroup_size: [u32; 3],
    pub bindings: Cow<'a, [BindType]>,
}

impl ComputeShader<'_> {
    /// Number of workgroups needed to cover `invocations` along each axis.
    pub fn workgroup_count(&self, invocations: [u32; 3]) -> [u32; 3] {
        [0, 1, 2].map(|i| invocations[i].div_ceil(self.workgroup_size[i]))
    }
}

pub struct Shaders<'a> {
    /// One invocation per stencil sample, visiting every primitive. Each
    /// workgroup owns a tile of samples.
    ///
    /// Bindings: kernel parameters, triangle, quadratic and cubic records,
    /// then the `i16` stencil, which is accumulated into atomically.
    pub stencil: ComputeShader<'a>,
    /// One invocation per output pixel.
    ///
    /// Bindings: kernel parameters, the stencil, then the interleaved `f32`
    /// output.
    pub resolve_nonzero: ComputeShader<'a>,
    /// Same as `resolve_nonzero`, under the even-odd rule.
    pub resolve_even_odd: ComputeShader<'a>,
}

mod generated {
    use super::*;
    use BindType::*;
    pub const SHADERS: Shaders<'static> = Shaders {
        stencil: ComputeShader {
            name: Cow::Borrowed("stencil"),
            workgroup_size: [16, 16, 1],
            bindings: Cow::Borrowed(&[Uniform, BufReadOnly, BufReadOnly, BufReadOnly, Buffer]),
        },
        resolve_nonzero: ComputeShader {
            name: Cow::Borrowed("resolve_nonzero"),
            workgroup_size: [256, 1, 1],
            bindings: Cow::Borrowed(&[Uniform, BufReadOnly, Buffer]),
        },
        resolve_even_odd: ComputeShader {
            name: Cow::Borrowed("resolve_even_odd"),
            workgroup_size: [256, 1, 1],
            bindings: Cow::Borrowed(&[Uniform, BufReadOnly, Buffer]),
        },
    };
}

pub use generated::SHADERS;
