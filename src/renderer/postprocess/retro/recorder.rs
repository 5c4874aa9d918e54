use super::technique::Technique;
use super::uniforms::RetroUniforms;
use crate::error::RetroError;
use crate::renderer::postprocess::target::TargetHandle;

/// A texture a blit reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    /// The host's color image the pass transforms in place.
    Source,
    /// A pooled target acquired this frame.
    Target(TargetHandle),
}

/// Extra inputs of the composite technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeInputs {
    /// Pyramid level 1.
    pub slightly_blurred: TargetHandle,
    /// Pyramid level 2.
    pub blurred: TargetHandle,
    /// Second smear buffer.
    pub smear: TargetHandle,
}

/// One full-screen draw of the retro program.
///
/// The draw carries its own parameter block; nothing is shared between
/// draws or frames through program-global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blit {
    /// Technique to run.
    pub technique: Technique,
    /// Main input.
    pub source: TextureSlot,
    /// Destination.
    pub dest: TextureSlot,
    /// Parameter block for this draw.
    pub uniforms: RetroUniforms,
    /// Composite-only inputs.
    pub inputs: Option<CompositeInputs>,
}

/// Records the retro pass's commands for later submission by the host.
///
/// Recording is in program order; the host relies on in-order execution,
/// so a blit may read whatever an earlier blit wrote.
pub trait CommandRecorder {
    /// The compiled program the recorder draws with.
    type Program;

    /// Open a named profiling scope.
    fn begin_scope(&mut self, label: &str);

    /// Close the innermost profiling scope.
    fn end_scope(&mut self);

    /// Record one full-screen draw.
    ///
    /// # Errors
    ///
    /// [`RetroError::UnknownTarget`] when a slot names a target that is not
    /// currently acquired.
    fn blit(
        &mut self,
        program: &Self::Program,
        blit: &Blit,
    ) -> Result<(), RetroError>;
}

/// Run `f` inside a profiling scope that is closed on every exit path.
pub(crate) fn scoped<C, T>(
    cmd: &mut C,
    label: &str,
    f: impl FnOnce(&mut C) -> Result<T, RetroError>,
) -> Result<T, RetroError>
where
    C: CommandRecorder + ?Sized,
{
    cmd.begin_scope(label);
    let result = f(cmd);
    cmd.end_scope();
    result
}
