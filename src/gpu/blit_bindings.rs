//! Bind groups and uniform slots reused across frames by [`FrameEncoder`].
//!
//! A bind group is cached per set of sampled textures, identified by pool
//! serials, so a steady-state frame records its draws without creating
//! any GPU object. Groups that sample the host image are only kept for
//! the frame that created them, since the host may hand in a different
//! view next frame.
//!
//! [`FrameEncoder`]: super::FrameEncoder

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use super::retro_program::{slot, RetroProgram};
use super::target_pool::WgpuTargetPool;
use super::uniform_slots::UniformSlots;
use crate::error::RetroError;
use crate::renderer::postprocess::retro::{Blit, RetroUniforms, TextureSlot};
use crate::renderer::postprocess::target::TargetHandle;

/// Serial standing for the host image; pool serials start at 1.
const SOURCE_SERIAL: u64 = 0;

/// Draws per frame the uniform buffer is sized for up front: a full
/// eight-level pyramid, both smear stages and the composite.
const INITIAL_SLOTS: u32 = 32;

/// Textures a bind group samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GroupKey {
    main: u64,
    composite: Option<[u64; 3]>,
}

impl GroupKey {
    fn samples_source(&self) -> bool {
        self.main == SOURCE_SERIAL
    }
}

/// Long-lived draw state of the retro program on one device.
pub struct BlitBindings {
    uniforms: UniformSlots<RetroUniforms>,
    groups: FxHashMap<GroupKey, wgpu::BindGroup>,
    generations: (u64, u64),
}

impl BlitBindings {
    /// Empty cache with room for a typical frame's uniform blocks.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            uniforms: UniformSlots::new(device, "Retro Uniform Slots", INITIAL_SLOTS),
            groups: FxHashMap::default(),
            generations: (0, 0),
        }
    }

    /// Number of cached bind groups.
    #[must_use]
    pub fn cached_groups(&self) -> usize {
        self.groups.len()
    }

    /// Start a frame: uniform slots are reused and groups over the host
    /// image are forgotten.
    pub(crate) fn begin_frame(&mut self) {
        self.uniforms.rewind();
        self.groups.retain(|key, _| !key.samples_source());
    }

    /// Store one draw's parameter block; returns its dynamic offset.
    pub(crate) fn write_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &RetroUniforms,
    ) -> u32 {
        self.uniforms.push(device, queue, uniforms)
    }

    /// The bind group for `blit`'s inputs, created on first use.
    pub(crate) fn bind_group(
        &mut self,
        device: &wgpu::Device,
        program: &RetroProgram,
        pool: &WgpuTargetPool,
        source: &wgpu::TextureView,
        blit: &Blit,
    ) -> Result<&wgpu::BindGroup, RetroError> {
        let generations = (pool.generation(), self.uniforms.generation());
        if generations != self.generations {
            self.groups.clear();
            self.generations = generations;
        }

        let key = GroupKey {
            main: match blit.source {
                TextureSlot::Source => SOURCE_SERIAL,
                TextureSlot::Target(handle) => serial(pool, handle)?,
            },
            composite: match blit.inputs {
                Some(inputs) => Some([
                    serial(pool, inputs.slightly_blurred)?,
                    serial(pool, inputs.blurred)?,
                    serial(pool, inputs.smear)?,
                ]),
                None => None,
            },
        };
        match self.groups.entry(key) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let group = create_group(
                    device,
                    program,
                    pool,
                    source,
                    blit,
                    self.uniforms.binding(),
                )?;
                Ok(&*entry.insert(group))
            }
        }
    }
}

fn serial(pool: &WgpuTargetPool, handle: TargetHandle) -> Result<u64, RetroError> {
    pool.serial(handle.key)
        .ok_or(RetroError::UnknownTarget(handle.key))
}

pub(crate) fn target_view(
    pool: &WgpuTargetPool,
    handle: TargetHandle,
) -> Result<&wgpu::TextureView, RetroError> {
    pool.view(handle.key)
        .ok_or(RetroError::UnknownTarget(handle.key))
}

pub(crate) fn resolve<'v>(
    pool: &'v WgpuTargetPool,
    source: &'v wgpu::TextureView,
    slot: TextureSlot,
) -> Result<&'v wgpu::TextureView, RetroError> {
    match slot {
        TextureSlot::Source => Ok(source),
        TextureSlot::Target(handle) => target_view(pool, handle),
    }
}

fn create_group(
    device: &wgpu::Device,
    program: &RetroProgram,
    pool: &WgpuTargetPool,
    source: &wgpu::TextureView,
    blit: &Blit,
    uniforms: wgpu::BufferBinding<'_>,
) -> Result<wgpu::BindGroup, RetroError> {
    let main = resolve(pool, source, blit.source)?;
    // Non-composite draws never sample the extra slots; bind the main
    // input there to satisfy the shared layout.
    let (slightly_blurred, blurred, smear) = match blit.inputs {
        Some(inputs) => (
            target_view(pool, inputs.slightly_blurred)?,
            target_view(pool, inputs.blurred)?,
            target_view(pool, inputs.smear)?,
        ),
        None => (main, main, main),
    };
    log::trace!("retro: new bind group for {}", blit.technique.label());

    Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(blit.technique.label()),
        layout: program.layout(),
        entries: &[
            wgpu::BindGroupEntry {
                binding: slot::MAIN,
                resource: wgpu::BindingResource::TextureView(main),
            },
            wgpu::BindGroupEntry {
                binding: slot::SAMPLER,
                resource: wgpu::BindingResource::Sampler(program.sampler()),
            },
            wgpu::BindGroupEntry {
                binding: slot::UNIFORMS,
                resource: wgpu::BindingResource::Buffer(uniforms),
            },
            wgpu::BindGroupEntry {
                binding: slot::SLIGHTLY_BLURRED,
                resource: wgpu::BindingResource::TextureView(slightly_blurred),
            },
            wgpu::BindGroupEntry {
                binding: slot::BLURRED,
                resource: wgpu::BindingResource::TextureView(blurred),
            },
            wgpu::BindGroupEntry {
                binding: slot::SMEAR,
                resource: wgpu::BindingResource::TextureView(smear),
            },
        ],
    }))
}
