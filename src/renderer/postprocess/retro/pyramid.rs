use crate::renderer::postprocess::target::TargetKey;

/// Name prefix of the pyramid's pool keys.
pub const LEVEL_PREFIX: &str = "_RetroBlurTexture";

/// Pool key of pyramid level `index`.
///
/// Pure: the same index always yields the same key, in any pass instance
/// and any frame.
#[must_use]
pub fn level_key(index: usize) -> TargetKey {
    TargetKey::indexed(LEVEL_PREFIX, u8::try_from(index).unwrap_or(u8::MAX))
}

/// Index-addressed key arena for the blur pyramid.
///
/// The arena is rebuilt wholesale when the depth changes and reused
/// otherwise. It only holds identities; the backing targets are acquired
/// from the pool every frame.
#[derive(Debug, Default)]
pub struct BlurPyramid {
    keys: Vec<TargetKey>,
    rebuilds: u64,
}

impl BlurPyramid {
    /// Match the arena to `depth`. Returns `true` if it was rebuilt.
    pub fn ensure_depth(&mut self, depth: usize) -> bool {
        if self.keys.len() == depth {
            return false;
        }
        self.keys = (0..depth).map(level_key).collect();
        self.rebuilds += 1;
        true
    }

    /// Current keys, level 0 first.
    #[must_use]
    pub fn keys(&self) -> &[TargetKey] {
        &self.keys
    }

    /// Current depth (zero before the first frame).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    /// How many times the arena has been rebuilt.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
