//! Transient render-target contract shared by post-processing passes.
//!
//! Passes never own scratch textures. They ask a [`TargetPool`] for a
//! target under a stable [`TargetKey`], draw with it, and hand it back
//! before the frame ends. A [`FrameLease`] keeps that bookkeeping honest.

use std::fmt;
use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::error::RetroError;

/// Format of every scratch target the retro pass acquires.
pub const SCRATCH_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Rgba16Float;

/// Stable identity of a pooled render target.
///
/// The id is a hash of the target's name, so the same name yields the same
/// key in every frame and every process without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetKey {
    id: u64,
    name: &'static str,
    index: Option<u8>,
}

impl TargetKey {
    /// Key for a singly-named target, e.g. `_SmearTexture0`.
    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self {
            id: hash_label(name),
            name,
            index: None,
        }
    }

    /// Key for one slot of a numbered family, e.g. `_RetroBlurTexture3`.
    #[must_use]
    pub fn indexed(prefix: &'static str, index: u8) -> Self {
        Self {
            id: hash_label(&format!("{prefix}{index}")),
            name: prefix,
            index: Some(index),
        }
    }

    /// Numeric identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}{index}", self.name),
            None => f.write_str(self.name),
        }
    }
}

fn hash_label(label: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(label.as_bytes());
    hasher.finish()
}

/// Size and format of a requested target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDesc {
    /// Width in pixels (non-zero).
    pub width: u32,
    /// Height in pixels (non-zero).
    pub height: u32,
    /// Color format.
    pub format: wgpu::TextureFormat,
}

impl TargetDesc {
    /// A scratch-format target of the given extent.
    #[must_use]
    pub fn scratch(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: SCRATCH_FORMAT,
        }
    }
}

/// An acquired target. Valid until released back to its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetHandle {
    /// Pool key the target was acquired under.
    pub key: TargetKey,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TargetHandle {
    /// `[1/width, 1/height]`, as the shaders expect.
    #[must_use]
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    /// `[width, height]` as floats.
    #[must_use]
    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// On-demand, size-keyed allocation of temporary color targets.
///
/// The pool may be shared with unrelated passes; a consumer must release
/// exactly the handles it acquired.
pub trait TargetPool {
    /// Acquire a target under `key` at the requested size.
    ///
    /// # Errors
    ///
    /// Fails when the pool cannot satisfy the request, e.g.
    /// [`RetroError::PoolExhausted`] or [`RetroError::TargetInUse`].
    fn acquire(
        &mut self,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<TargetHandle, RetroError>;

    /// Return a previously acquired target.
    fn release(&mut self, handle: TargetHandle);
}

/// Everything one pass acquired during the current frame.
///
/// [`release_all`](Self::release_all) hands the targets back in reverse
/// acquisition order and must run on every exit path of the pass.
#[derive(Debug, Default)]
pub struct FrameLease {
    held: Vec<TargetHandle>,
}

impl FrameLease {
    /// Empty lease.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire through `pool` and remember the handle.
    ///
    /// # Errors
    ///
    /// Propagates the pool's error; nothing is recorded in that case.
    pub fn acquire<P: TargetPool + ?Sized>(
        &mut self,
        pool: &mut P,
        key: TargetKey,
        desc: &TargetDesc,
    ) -> Result<TargetHandle, RetroError> {
        let handle = pool.acquire(key, desc)?;
        self.held.push(handle);
        Ok(handle)
    }

    /// Number of targets currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Release every held target. Returns how many were released.
    pub fn release_all<P: TargetPool + ?Sized>(&mut self, pool: &mut P) -> usize {
        let count = self.held.len();
        while let Some(handle) = self.held.pop() {
            pool.release(handle);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingPool {
        live: Vec<TargetKey>,
        fail_on: Option<TargetKey>,
    }

    impl TargetPool for CountingPool {
        fn acquire(
            &mut self,
            key: TargetKey,
            desc: &TargetDesc,
        ) -> Result<TargetHandle, RetroError> {
            if self.fail_on == Some(key) {
                return Err(RetroError::PoolExhausted {
                    key,
                    width: desc.width,
                    height: desc.height,
                });
            }
            self.live.push(key);
            Ok(TargetHandle {
                key,
                width: desc.width,
                height: desc.height,
            })
        }

        fn release(&mut self, handle: TargetHandle) {
            self.live.retain(|k| *k != handle.key);
        }
    }

    #[test]
    fn keys_are_stable_and_distinct() {
        let a = TargetKey::indexed("_RetroBlurTexture", 2);
        let b = TargetKey::indexed("_RetroBlurTexture", 2);
        let c = TargetKey::indexed("_RetroBlurTexture", 3);
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.to_string(), "_RetroBlurTexture2");
        assert_ne!(
            TargetKey::named("_SmearTexture0").id(),
            TargetKey::named("_SmearTexture1").id()
        );
    }

    #[test]
    fn lease_releases_everything_it_acquired() {
        let mut pool = CountingPool::default();
        let mut lease = FrameLease::new();
        for name in ["_A", "_B", "_C"] {
            let _ = lease
                .acquire(&mut pool, TargetKey::named(name), &TargetDesc::scratch(4, 4))
                .unwrap();
        }
        assert_eq!(pool.live.len(), 3);
        assert_eq!(lease.release_all(&mut pool), 3);
        assert!(pool.live.is_empty());
        assert!(lease.is_empty());
    }

    #[test]
    fn failed_acquire_is_not_held() {
        let failing = TargetKey::named("_B");
        let mut pool = CountingPool {
            fail_on: Some(failing),
            ..Default::default()
        };
        let mut lease = FrameLease::new();
        let _ = lease
            .acquire(&mut pool, TargetKey::named("_A"), &TargetDesc::scratch(2, 2))
            .unwrap();
        assert!(lease
            .acquire(&mut pool, failing, &TargetDesc::scratch(2, 2))
            .is_err());
        assert_eq!(lease.len(), 1);
        assert_eq!(lease.release_all(&mut pool), 1);
        assert!(pool.live.is_empty());
    }

    #[test]
    fn texel_size_inverts_extent() {
        let handle = TargetHandle {
            key: TargetKey::named("_T"),
            width: 4,
            height: 8,
        };
        assert_eq!(handle.texel_size(), [0.25, 0.125]);
        assert_eq!(handle.size(), [4.0, 8.0]);
    }
}
