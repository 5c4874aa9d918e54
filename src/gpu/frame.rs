//! Per-frame wgpu recorder for the retro pass.
//!
//! [`FrameEncoder`] borrows the host's encoder, the target pool, the
//! long-lived [`BlitBindings`] and the host's color image for the duration
//! of one `execute` call, and turns each [`Blit`] into one render pass.

use super::blit_bindings::{resolve, BlitBindings};
use super::retro_program::RetroProgram;
use super::target_pool::WgpuTargetPool;
use crate::error::RetroError;
use crate::renderer::postprocess::retro::{Blit, CommandRecorder};
use crate::renderer::postprocess::target::{
    TargetDesc, TargetHandle, TargetKey, TargetPool,
};

/// Records retro draws into a host command encoder.
///
/// Create at most one per [`BlitBindings`] per queue submission: creating
/// it rewinds the uniform slots the previous one wrote.
pub struct FrameEncoder<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: &'a mut wgpu::CommandEncoder,
    pool: &'a mut WgpuTargetPool,
    bindings: &'a mut BlitBindings,
    source: &'a wgpu::TextureView,
    open_scopes: usize,
}

impl<'a> FrameEncoder<'a> {
    /// Wrap `encoder` for one frame. `source` is the host's color image;
    /// it must allow both sampling and rendering.
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        encoder: &'a mut wgpu::CommandEncoder,
        pool: &'a mut WgpuTargetPool,
        bindings: &'a mut BlitBindings,
        source: &'a wgpu::TextureView,
    ) -> Self {
        bindings.begin_frame();
        Self {
            device,
            queue,
            encoder,
            pool,
            bindings,
            source,
            open_scopes: 0,
        }
    }
}

impl TargetPool for FrameEncoder<'_> {
    fn acquire(
        &mut self,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<TargetHandle, RetroError> {
        self.pool.acquire(key, desc)
    }

    fn release(&mut self, handle: TargetHandle) {
        self.pool.release(handle);
    }
}

impl CommandRecorder for FrameEncoder<'_> {
    type Program = RetroProgram;

    fn begin_scope(&mut self, label: &str) {
        self.encoder.push_debug_group(label);
        self.open_scopes += 1;
    }

    fn end_scope(&mut self) {
        if self.open_scopes > 0 {
            self.encoder.pop_debug_group();
            self.open_scopes -= 1;
        }
    }

    fn blit(
        &mut self,
        program: &RetroProgram,
        blit: &Blit,
    ) -> Result<(), RetroError> {
        let dest = resolve(self.pool, self.source, blit.dest)?;
        let offset =
            self.bindings
                .write_uniforms(self.device, self.queue, &blit.uniforms);
        let bind_group = self.bindings.bind_group(
            self.device,
            program,
            self.pool,
            self.source,
            blit,
        )?;

        let load = if blit.technique.blends_into_destination() {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        };
        let mut pass =
            self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(blit.technique.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: dest,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
        pass.set_pipeline(program.pipeline(blit.technique));
        pass.set_bind_group(0, bind_group, &[offset]);
        pass.draw(0..3, 0..1);
        Ok(())
    }
}

impl Drop for FrameEncoder<'_> {
    fn drop(&mut self) {
        while self.open_scopes > 0 {
            self.encoder.pop_debug_group();
            self.open_scopes -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Knob, RetroParameters};
    use crate::gpu::render_context::headless;
    use crate::gpu::shader_composer::ShaderComposer;
    use crate::gpu::texture::RenderTarget;
    use crate::renderer::postprocess::retro::{Execution, RetroPass};

    #[test]
    fn pass_records_on_a_real_device() {
        let format = wgpu::TextureFormat::Rgba8Unorm;
        // Skipped on machines without an adapter.
        let Ok((device, queue)) = pollster::block_on(headless()) else {
            return;
        };
        let mut composer = ShaderComposer::new().unwrap();
        let program =
            RetroProgram::new(&device, &mut composer, format).unwrap();
        let mut pool = WgpuTargetPool::new(&device);
        let mut bindings = BlitBindings::new(&device);
        let source =
            RenderTarget::new(&device, "Test Source", 256, 144, format);

        let mut pass = RetroPass::new("Retro", program);
        pass.setup(
            &RetroParameters::default()
                .enabled(true)
                .with(Knob::BleedRadius, 1.0)
                .with(Knob::SmearIntensity, 0.5),
        );

        let mut targets = 0;
        let mut groups = 0;
        for frame in 0..2 {
            let mut encoder =
                device.create_command_encoder(&Default::default());
            let execution = {
                let mut recorder = FrameEncoder::new(
                    &device,
                    &queue,
                    &mut encoder,
                    &mut pool,
                    &mut bindings,
                    &source.view,
                );
                pass.execute(&mut recorder, 256, 144).unwrap()
            };
            let _ = queue.submit([encoder.finish()]);
            let Execution::Rendered(stats) = execution else {
                panic!("pass was skipped");
            };
            assert_eq!(stats.targets, stats.depth + 2);
            assert_eq!(pool.live_count(), 0);
            if frame == 0 {
                targets = stats.targets;
                groups = bindings.cached_groups();
                assert!(groups > 0);
            }
        }

        // The second frame reuses every target and bind group of the first
        assert_eq!(pool.allocations() as usize, targets);
        assert_eq!(pool.free_count(), targets);
        assert_eq!(bindings.cached_groups(), groups);
    }
}
