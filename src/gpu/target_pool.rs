//! wgpu-backed [`TargetPool`].
//!
//! Targets are recycled by `(width, height, format)`: a release parks the
//! texture on a free list and the next acquire of the same shape takes it
//! back, so a steady-state frame allocates nothing. Allocation is bounded by
//! a byte budget and the device's maximum texture dimension.
//!
//! The key and shape bookkeeping lives in [`TargetBook`], which never
//! touches the device; [`WgpuTargetPool`] only supplies the textures.

use rustc_hash::FxHashMap;

use super::texture::{target_bytes, RenderTarget};
use crate::error::RetroError;
use crate::renderer::postprocess::target::{
    TargetDesc, TargetHandle, TargetKey, TargetPool,
};

type Shape = (u32, u32, wgpu::TextureFormat);

/// Limits of a [`WgpuTargetPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    /// Largest width or height the pool will allocate.
    pub max_dimension: u32,
    /// Upper bound on bytes held by the pool, live and parked.
    pub byte_budget: u64,
}

impl PoolLimits {
    /// Limits derived from a device: its 2D texture limit and a 512 MiB
    /// budget.
    #[must_use]
    pub fn for_device(device: &wgpu::Device) -> Self {
        Self {
            max_dimension: device.limits().max_texture_dimension_2d,
            byte_budget: 512 << 20,
        }
    }
}

/// Byte accounting against a [`PoolLimits`] budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Budget {
    limits: PoolLimits,
    allocated: u64,
}

impl Budget {
    fn fits(&self, desc: &TargetDesc) -> bool {
        desc.width > 0
            && desc.height > 0
            && desc.width <= self.limits.max_dimension
            && desc.height <= self.limits.max_dimension
    }

    fn headroom(&self) -> u64 {
        self.limits.byte_budget.saturating_sub(self.allocated)
    }

    fn charge(&mut self, bytes: u64) -> bool {
        if bytes > self.headroom() {
            return false;
        }
        self.allocated += bytes;
        true
    }

    fn refund(&mut self, bytes: u64) {
        self.allocated = self.allocated.saturating_sub(bytes);
    }
}

/// A stored target with the serial it was allocated under.
struct Pooled<T> {
    serial: u64,
    shape: Shape,
    target: T,
}

/// Key and shape bookkeeping of a pool, generic over what it stores.
struct TargetBook<T> {
    budget: Budget,
    live: FxHashMap<TargetKey, Pooled<T>>,
    free: FxHashMap<Shape, Vec<Pooled<T>>>,
    allocations: u64,
    generation: u64,
}

impl<T> TargetBook<T> {
    fn new(limits: PoolLimits) -> Self {
        Self {
            budget: Budget {
                limits,
                allocated: 0,
            },
            live: FxHashMap::default(),
            free: FxHashMap::default(),
            allocations: 0,
            generation: 0,
        }
    }

    fn get(&self, key: TargetKey) -> Option<&Pooled<T>> {
        self.live.get(&key)
    }

    fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Take a parked target of the requested shape, or reserve budget and
    /// store what `create` makes.
    fn acquire(
        &mut self,
        key: TargetKey,
        desc: &TargetDesc,
        create: impl FnOnce(TargetKey, &TargetDesc) -> T,
    ) -> Result<TargetHandle, RetroError> {
        if self.live.contains_key(&key) {
            return Err(RetroError::TargetInUse(key));
        }
        let shape = (desc.width, desc.height, desc.format);
        let pooled = match self.free.get_mut(&shape).and_then(Vec::pop) {
            Some(pooled) => pooled,
            None => {
                self.reserve(key, desc)?;
                self.allocations += 1;
                Pooled {
                    serial: self.allocations,
                    shape,
                    target: create(key, desc),
                }
            }
        };
        let _ = self.live.insert(key, pooled);
        Ok(TargetHandle {
            key,
            width: desc.width,
            height: desc.height,
        })
    }

    fn reserve(
        &mut self,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<(), RetroError> {
        let exhausted = RetroError::PoolExhausted {
            key,
            width: desc.width,
            height: desc.height,
        };
        if !self.budget.fits(desc) {
            return Err(exhausted);
        }
        let bytes = target_bytes(desc.width, desc.height, desc.format);
        if self.budget.charge(bytes) {
            return Ok(());
        }
        // Parked targets of other shapes are the only thing to give back.
        self.trim();
        if self.budget.charge(bytes) {
            Ok(())
        } else {
            Err(exhausted)
        }
    }

    fn release(&mut self, handle: TargetHandle) {
        let Some(pooled) = self.live.remove(&handle.key) else {
            log::warn!("target pool: release of unknown target {}", handle.key);
            return;
        };
        self.free.entry(pooled.shape).or_default().push(pooled);
    }

    fn trim(&mut self) {
        let mut dropped = 0;
        for pooled in self.free.drain().flat_map(|(_, parked)| parked) {
            let (width, height, format) = pooled.shape;
            self.budget.refund(target_bytes(width, height, format));
            dropped += 1;
        }
        if dropped > 0 {
            self.generation += 1;
            log::debug!("target pool: dropped {dropped} parked targets");
        }
    }
}

/// Transient render targets on one wgpu device.
pub struct WgpuTargetPool {
    device: wgpu::Device,
    book: TargetBook<RenderTarget>,
}

impl WgpuTargetPool {
    /// Create an empty pool with [`PoolLimits::for_device`].
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        Self::with_limits(device, PoolLimits::for_device(device))
    }

    /// Create an empty pool with explicit limits.
    #[must_use]
    pub fn with_limits(device: &wgpu::Device, limits: PoolLimits) -> Self {
        Self {
            device: device.clone(),
            book: TargetBook::new(limits),
        }
    }

    /// Texture view of a live target.
    #[must_use]
    pub fn view(&self, key: TargetKey) -> Option<&wgpu::TextureView> {
        self.book.get(key).map(|pooled| &pooled.target.view)
    }

    /// Serial of the texture currently acquired under `key`.
    ///
    /// Serials start at 1 and are never reused, so two draws with equal
    /// serials sample the same texture.
    #[must_use]
    pub fn serial(&self, key: TargetKey) -> Option<u64> {
        self.book.get(key).map(|pooled| pooled.serial)
    }

    /// Bumped whenever the pool destroys textures.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.book.generation
    }

    /// Number of targets currently acquired.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.book.live.len()
    }

    /// Number of parked targets waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.book.free_count()
    }

    /// Bytes held, live and parked.
    #[must_use]
    pub fn allocated_bytes(&self) -> u64 {
        self.book.budget.allocated
    }

    /// Textures created since the pool was made.
    #[must_use]
    pub fn allocations(&self) -> u64 {
        self.book.allocations
    }

    /// Drop every parked target, e.g. after a resize made them stale.
    pub fn trim(&mut self) {
        self.book.trim();
    }
}

impl TargetPool for WgpuTargetPool {
    fn acquire(
        &mut self,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<TargetHandle, RetroError> {
        let device = &self.device;
        self.book.acquire(key, desc, |key, desc| {
            log::debug!(
                "target pool: allocating {key} {}x{} {:?}",
                desc.width,
                desc.height,
                desc.format
            );
            RenderTarget::new(
                device,
                &key.to_string(),
                desc.width,
                desc.height,
                desc.format,
            )
        })
    }

    fn release(&mut self, handle: TargetHandle) {
        self.book.release(handle);
    }
}
