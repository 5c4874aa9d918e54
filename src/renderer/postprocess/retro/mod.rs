//! Retro CRT pass.
//!
//! A blur pyramid over the source image, a two-tap horizontal smear at a
//! capped resolution, and a composite that writes the result back over the
//! source. Scheduling is backend-agnostic: the pass records through
//! [`CommandRecorder`] and borrows scratch targets from a
//! [`TargetPool`](super::target::TargetPool). The wgpu implementation of
//! both lives in [`crate::gpu`].

mod feature;
mod pass;
pub mod plan;
mod pyramid;
mod recorder;
mod smear;
mod technique;
mod uniforms;

#[cfg(test)]
pub(crate) mod testing;

pub use feature::{CameraKind, RetroFeature};
pub use pass::{Execution, FrameStats, RetroPass};
pub use plan::{Extent, FramePlan, UpsampleStep};
pub use pyramid::{level_key, BlurPyramid, LEVEL_PREFIX};
pub use recorder::{Blit, CommandRecorder, CompositeInputs, TextureSlot};
pub use smear::{smear_keys, SmearTap, SMEAR_NAMES, SMEAR_TAPS};
pub use technique::Technique;
pub use uniforms::{Binding, RetroUniforms};
