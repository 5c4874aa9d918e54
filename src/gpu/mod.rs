//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, shader composition, the
//! transient render-target pool, and the wgpu implementation of the retro
//! pass's recorder.

/// Bind groups and uniform slots reused across frames.
pub mod blit_bindings;
/// Per-frame command recorder over a host encoder.
pub mod frame;
/// Shared wgpu boilerplate helpers for screen-space pipelines.
pub mod pipeline_helpers;
/// wgpu device bring-up, windowed and headless.
pub mod render_context;
/// The compiled multi-technique retro program.
pub mod retro_program;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Pooled transient render targets.
pub mod target_pool;
/// Render-target texture abstraction.
pub mod texture;
/// Aligned per-draw uniform blocks in one growable buffer.
pub mod uniform_slots;

pub use blit_bindings::BlitBindings;
pub use frame::FrameEncoder;
pub use retro_program::RetroProgram;
pub use target_pool::{PoolLimits, WgpuTargetPool};
