//! Snapcheck is a golden-image regression harness for 2D drawing tests.
//!
//! A test draws into an offscreen CPU surface; teardown captures the result
//! as a premultiplied RGBA8 bitmap, persists it as a PNG artifact, and — in
//! compare mode — classifies it against a previously committed reference
//! image with a tolerance-parameterized pixel comparator.
//!
//! # Pipeline overview
//!
//! 1. **Set up**: [`CanvasFixture::set_up`] allocates the surface (512x256 by
//!    default) and runs the ordered [`SetupTransform`] list.
//! 2. **Draw**: the test body renders through [`CanvasFixture::surface`].
//! 3. **Tear down**: [`run_teardown`] captures, writes
//!    `TestImage.<Suite>.<Case>[.<descriptor>].png`, loads the reference, and
//!    produces a [`Verdict`].
//! 4. **Assert**: the caller checks [`Verdict::passed`]; mismatches carry a
//!    differing-pixel count, a `Delta.`-prefixed diff image, and recorded
//!    `expectedImage`/`actualImage`/`deltaImage` paths.
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Immutable bitmaps**: capture, decode, and diff synthesis each produce
//!   an owned [`Bitmap`] that is never mutated afterwards.
//! - **Explicit configuration**: a [`Session`] owns the [`HarnessConfig`] and
//!   the pooled capture surfaces; nothing hides in process statics.
//! - **Synchronous I/O**: artifacts are on disk before a verdict exists.
#![forbid(unsafe_code)]

pub mod artifact;
pub mod bitmap;
pub mod compare;
pub mod config;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod naming;
pub mod session;

pub use artifact::{Diagnostics, decode_png, encode_png, load_reference, write_atomic};
pub use bitmap::Bitmap;
pub use compare::{Comparator, Comparison, DiffMetric, PixelComparator};
pub use config::{HarnessConfig, RunMode};
pub use error::{SnapError, SnapResult};
pub use fixture::{
    BackgroundPrime, CanvasFixture, DEFAULT_CANVAS_SIZE, DeviceMimic, SetupTransform, Surface,
};
pub use harness::{Outcome, Verdict, run_teardown};
pub use naming::{ArtifactPaths, TestIdentity};
pub use session::Session;
