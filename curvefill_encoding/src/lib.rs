// Copyright 2025 the Curvefill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve algebra, cubic classification and path decomposition.
//!
//! This crate turns a [`Path`] into the [`Records`] consumed by the
//! rasterizer backends, and holds the per-sample predicates they share.

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
// Allow because of: https://github.com/rust-lang/rust/pull/130025
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![expect(
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc,
    reason = "Deferred"
)]
#![allow(
    clippy::return_self_not_must_use,
    clippy::missing_assert_message,
    clippy::shadow_unrelated,
    clippy::exhaustive_enums,
    reason = "Deferred, only apply in some feature sets so not expect"
)]

pub mod bezier;
pub mod classify;
pub mod decompose;
pub mod math;
pub mod path;
pub mod poly;
pub mod primitive;
pub mod stencil;

pub use bezier::{Bezier, BezierElement};
pub use classify::{classify, Classification, CurveClass, CuspKind, Invariants};
pub use decompose::{decompose, CubicPrimitive, Decomposition, Primitive, MAX_SUBDIVISION_DEPTH};
pub use math::{bounds, Point, Transform, Vec3, EPSILON};
pub use path::{Component, Path, PathBuilder, Segment};
pub use poly::Polynomial;
pub use primitive::{
    CubicRecord, KernelParams, QuadRecord, Records, StencilRecord, TriangleRecord, MAX_CHANNELS,
};
pub use stencil::Accumulate;
