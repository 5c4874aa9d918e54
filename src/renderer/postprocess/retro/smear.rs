use crate::renderer::postprocess::target::TargetKey;

/// Pool key names of the two smear buffers.
pub const SMEAR_NAMES: [&str; 2] = ["_SmearTexture0", "_SmearTexture1"];

/// One directional tap of the smear accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmearTap {
    /// Sample offset in smear-buffer texels.
    pub offset: f32,
    /// Weight kept by the trailing sample.
    pub attenuation: f32,
}

/// Small tap (level 1 → smear 0), then large tap (smear 0 → smear 1).
///
/// Two spatial taps stand in for multi-frame feedback: the second pass
/// smears the already-smeared buffer over a wider reach.
pub const SMEAR_TAPS: [SmearTap; 2] = [
    SmearTap {
        offset: 1.5,
        attenuation: 0.55,
    },
    SmearTap {
        offset: 6.0,
        attenuation: 0.8,
    },
];

/// Pool keys of the ping-pong smear buffers.
#[must_use]
pub fn smear_keys() -> [TargetKey; 2] {
    SMEAR_NAMES.map(TargetKey::named)
}
