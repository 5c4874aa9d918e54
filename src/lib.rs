// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Tests lean on unwrap/expect/panic for brevity.
#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)
)]

//! Retro CRT post-processing built on wgpu.
//!
//! The effect (phosphor bleed blur, motion smear, edge darkening, tape noise,
//! interlacing, scanlines) runs as a fixed sequence of full-screen passes over
//! an already-rendered color image. Every scratch buffer is a transient
//! render target acquired and released within the frame that uses it.
//!
//! # Key entry points
//!
//! - [`renderer::postprocess::retro::RetroPass`] - the pass scheduler:
//!   `setup` → `execute` → `dispose`
//! - [`renderer::postprocess::retro::RetroFeature`] - host-facing wrapper
//!   that filters cameras and parameter state before queueing the pass
//! - [`effect::RetroParameters`] - the clamped knob set the pass reads
//! - [`options::Options`] - TOML presets for the knobs
//! - [`gpu`] - the wgpu backend: transient target pool, frame encoder and
//!   the multi-technique shader program
//!
//! # Frame topology
//!
//! ```text
//! source ─► L0 ─► L1 ─► L2 ─► L3 ─► … ─► L(N-1)   downsample (bleed, then blur)
//!                        L2 ◄─ L3 ◄─ … ◄─ L(N-1)   upsample-blend, i into i-1
//!           L1 ─► smear0 ─► smear1              two-tap smear
//! L0 + L1 + L2 + smear1 ─► source               composite, in place
//! ```

pub mod effect;
pub mod error;
pub mod gpu;
pub mod options;
pub mod renderer;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::RetroError;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
