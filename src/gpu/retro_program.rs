//! The compiled retro program: one bind group layout shared by all five
//! techniques and one pipeline per technique.

use super::pipeline_helpers::{
    create_screen_space_pipeline, dynamic_uniform_buffer_of,
    filtering_sampler, linear_sampler, texture_2d,
};
use super::shader_composer::{ShaderComposer, RETRO_SHADER};
use crate::error::RetroError;
use crate::renderer::postprocess::retro::{RetroUniforms, Technique};
use crate::renderer::postprocess::target::SCRATCH_FORMAT;

/// Bind group slots of the retro program.
pub mod slot {
    /// Main input texture.
    pub const MAIN: u32 = 0;
    /// Linear clamp sampler.
    pub const SAMPLER: u32 = 1;
    /// Per-draw [`RetroUniforms`](crate::renderer::postprocess::retro::RetroUniforms),
    /// bound at a dynamic offset.
    pub const UNIFORMS: u32 = 2;
    /// Composite: pyramid level 1.
    pub const SLIGHTLY_BLURRED: u32 = 3;
    /// Composite: pyramid level 2.
    pub const BLURRED: u32 = 4;
    /// Composite: smear result.
    pub const SMEAR: u32 = 5;
}

/// GPU-side retro program.
pub struct RetroProgram {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl RetroProgram {
    /// Compile the program. The composite renders into `output_format`
    /// (the host image's format); every other technique renders into
    /// scratch targets.
    ///
    /// # Errors
    ///
    /// Returns [`RetroError::ShaderCompose`] if the shader fails to compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self, RetroError> {
        let shader = composer.compose(device, "Retro Shader", RETRO_SHADER, "retro.wgsl")?;

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Retro Bind Group Layout"),
            entries: &[
                texture_2d(slot::MAIN),
                filtering_sampler(slot::SAMPLER),
                dynamic_uniform_buffer_of::<RetroUniforms>(slot::UNIFORMS),
                texture_2d(slot::SLIGHTLY_BLURRED),
                texture_2d(slot::BLURRED),
                texture_2d(slot::SMEAR),
            ],
        });

        let pipelines = Technique::ALL
            .iter()
            .map(|&technique| {
                let format = if technique.writes_source() {
                    output_format
                } else {
                    SCRATCH_FORMAT
                };
                let blend = technique
                    .blends_into_destination()
                    .then_some(wgpu::BlendState::ALPHA_BLENDING);
                create_screen_space_pipeline(
                    device,
                    technique.label(),
                    &shader,
                    technique.entry_point(),
                    format,
                    blend,
                    &[&layout],
                )
            })
            .collect();

        Ok(Self {
            layout,
            sampler: linear_sampler(device, "Retro Sampler"),
            pipelines,
        })
    }

    /// Pipeline of one technique.
    #[must_use]
    pub fn pipeline(&self, technique: Technique) -> &wgpu::RenderPipeline {
        &self.pipelines[technique.index() as usize]
    }

    /// The shared bind group layout.
    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// The shared sampler.
    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
