use crate::effect::{Knob, RetroParameters};

/// Named scalar inputs of the retro program.
///
/// Each binding is one `f32` lane of [`RetroUniforms`]; the names are the
/// program's stable input names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Bleed direction bias of the first downsample.
    BlurBias,
    /// Bleed strength.
    BleedIntensity,
    /// Smear strength in the composite.
    SmearIntensity,
    /// Edge darkening strength.
    EdgeIntensity,
    /// Edge sample offset; bound negated.
    EdgeDistance,
    /// Tape noise amount.
    TapeNoiseAmount,
    /// Tape noise speed.
    TapeNoiseSpeed,
    /// Tape noise opacity.
    TapeNoiseAlpha,
    /// Interlacing strength.
    InterlacingAmount,
    /// Scanline scroll speed.
    ScanlineSpeed,
    /// Scanline frequency.
    ScanlineFrequency,
    /// Scanline strength.
    ScanlineIntensity,
    /// Blend weight of one upsample step.
    UpsampleFactor,
    /// Smear tap offset, in smear-buffer texels.
    SmearOffset,
    /// Smear tap attenuation.
    SmearAttenuation,
    /// Seconds since the host clock started.
    Time,
}

impl Binding {
    /// Bindings written by `setup` from the parameter set.
    pub const PARAMETERS: [Binding; 12] = [
        Binding::BlurBias,
        Binding::BleedIntensity,
        Binding::SmearIntensity,
        Binding::EdgeIntensity,
        Binding::EdgeDistance,
        Binding::TapeNoiseAmount,
        Binding::TapeNoiseSpeed,
        Binding::TapeNoiseAlpha,
        Binding::InterlacingAmount,
        Binding::ScanlineSpeed,
        Binding::ScanlineFrequency,
        Binding::ScanlineIntensity,
    ];

    /// Stable input name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Binding::BlurBias => "_BlurBias",
            Binding::BleedIntensity => "_BleedIntensity",
            Binding::SmearIntensity => "_SmearIntensity",
            Binding::EdgeIntensity => "_EdgeIntensity",
            Binding::EdgeDistance => "_EdgeDistance",
            Binding::TapeNoiseAmount => "_TapeNoiseAmount",
            Binding::TapeNoiseSpeed => "_TapeNoiseSpeed",
            Binding::TapeNoiseAlpha => "_TapeNoiseAlpha",
            Binding::InterlacingAmount => "_InterlacingAmount",
            Binding::ScanlineSpeed => "_ScanlineSpeed",
            Binding::ScanlineFrequency => "_ScanlineFrequency",
            Binding::ScanlineIntensity => "_ScanlineIntensity",
            Binding::UpsampleFactor => "_UpsampleFactor",
            Binding::SmearOffset => "_SmearOffset",
            Binding::SmearAttenuation => "_SmearAttenuation",
            Binding::Time => "_Time",
        }
    }

    /// Knob feeding this binding and the value it binds, if any.
    fn from_parameters(self, params: &RetroParameters) -> Option<f32> {
        let value = match self {
            Binding::BlurBias => params.get(Knob::BleedDirection),
            Binding::BleedIntensity => params.get(Knob::BleedIntensity),
            Binding::SmearIntensity => params.get(Knob::SmearIntensity),
            Binding::EdgeIntensity => params.get(Knob::EdgeIntensity),
            Binding::EdgeDistance => -params.get(Knob::EdgeDistance),
            Binding::TapeNoiseAmount => params.get(Knob::TapeNoiseAmount),
            Binding::TapeNoiseSpeed => params.get(Knob::TapeNoiseSpeed),
            Binding::TapeNoiseAlpha => params.get(Knob::TapeNoiseAlpha),
            Binding::InterlacingAmount => params.get(Knob::InterlacingAmount),
            Binding::ScanlineSpeed => params.get(Knob::ScanlineSpeed),
            Binding::ScanlineFrequency => params.get(Knob::ScanlineFrequency),
            Binding::ScanlineIntensity => params.get(Knob::ScanlineIntensity),
            Binding::UpsampleFactor
            | Binding::SmearOffset
            | Binding::SmearAttenuation
            | Binding::Time => return None,
        };
        Some(value)
    }
}

/// Per-draw parameter block of the retro program. Must match WGSL struct
/// `RetroUniforms` in `retro.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RetroUniforms {
    /// `_BlurBias`.
    pub blur_bias: f32,
    /// `_BleedIntensity`.
    pub bleed_intensity: f32,
    /// `_SmearIntensity`.
    pub smear_intensity: f32,
    /// `_EdgeIntensity`.
    pub edge_intensity: f32,
    /// `_EdgeDistance` (already negated).
    pub edge_distance: f32,
    /// `_TapeNoiseAmount`.
    pub tape_noise_amount: f32,
    /// `_TapeNoiseSpeed`.
    pub tape_noise_speed: f32,
    /// `_TapeNoiseAlpha`.
    pub tape_noise_alpha: f32,
    /// `_InterlacingAmount`.
    pub interlacing_amount: f32,
    /// `_ScanlineSpeed`.
    pub scanline_speed: f32,
    /// `_ScanlineFrequency`.
    pub scanline_frequency: f32,
    /// `_ScanlineIntensity`.
    pub scanline_intensity: f32,
    /// `_UpsampleFactor`.
    pub upsample_factor: f32,
    /// `_SmearOffset`.
    pub smear_offset: f32,
    /// `_SmearAttenuation`.
    pub smear_attenuation: f32,
    /// `_Time`.
    pub time: f32,
    /// Texel size of the draw's main input.
    pub texel_size: [f32; 2],
    /// Pixel extent of the draw's destination.
    pub target_size: [f32; 2],
}

impl Default for RetroUniforms {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl RetroUniforms {
    /// Read one named lane.
    #[must_use]
    pub fn get(&self, binding: Binding) -> f32 {
        match binding {
            Binding::BlurBias => self.blur_bias,
            Binding::BleedIntensity => self.bleed_intensity,
            Binding::SmearIntensity => self.smear_intensity,
            Binding::EdgeIntensity => self.edge_intensity,
            Binding::EdgeDistance => self.edge_distance,
            Binding::TapeNoiseAmount => self.tape_noise_amount,
            Binding::TapeNoiseSpeed => self.tape_noise_speed,
            Binding::TapeNoiseAlpha => self.tape_noise_alpha,
            Binding::InterlacingAmount => self.interlacing_amount,
            Binding::ScanlineSpeed => self.scanline_speed,
            Binding::ScanlineFrequency => self.scanline_frequency,
            Binding::ScanlineIntensity => self.scanline_intensity,
            Binding::UpsampleFactor => self.upsample_factor,
            Binding::SmearOffset => self.smear_offset,
            Binding::SmearAttenuation => self.smear_attenuation,
            Binding::Time => self.time,
        }
    }

    /// Overwrite one named lane.
    pub fn set(&mut self, binding: Binding, value: f32) {
        let lane = match binding {
            Binding::BlurBias => &mut self.blur_bias,
            Binding::BleedIntensity => &mut self.bleed_intensity,
            Binding::SmearIntensity => &mut self.smear_intensity,
            Binding::EdgeIntensity => &mut self.edge_intensity,
            Binding::EdgeDistance => &mut self.edge_distance,
            Binding::TapeNoiseAmount => &mut self.tape_noise_amount,
            Binding::TapeNoiseSpeed => &mut self.tape_noise_speed,
            Binding::TapeNoiseAlpha => &mut self.tape_noise_alpha,
            Binding::InterlacingAmount => &mut self.interlacing_amount,
            Binding::ScanlineSpeed => &mut self.scanline_speed,
            Binding::ScanlineFrequency => &mut self.scanline_frequency,
            Binding::ScanlineIntensity => &mut self.scanline_intensity,
            Binding::UpsampleFactor => &mut self.upsample_factor,
            Binding::SmearOffset => &mut self.smear_offset,
            Binding::SmearAttenuation => &mut self.smear_attenuation,
            Binding::Time => &mut self.time,
        };
        *lane = value;
    }

    /// Write every parameter-fed binding from `params`.
    pub fn bind_parameters(&mut self, params: &RetroParameters) {
        for binding in Binding::PARAMETERS {
            if let Some(value) = binding.from_parameters(params) {
                self.set(binding, value);
            }
        }
    }

    /// Copy with one lane replaced.
    #[must_use]
    pub fn with(mut self, binding: Binding, value: f32) -> Self {
        self.set(binding, value);
        self
    }

    /// Copy with the main-input texel size and destination extent replaced.
    #[must_use]
    pub fn with_extents(mut self, texel_size: [f32; 2], target_size: [f32; 2]) -> Self {
        self.texel_size = texel_size;
        self.target_size = target_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_sixteen_byte_aligned() {
        assert_eq!(size_of::<RetroUniforms>(), 80);
        assert_eq!(size_of::<RetroUniforms>() % 16, 0);
    }

    #[test]
    fn parameters_bind_under_their_names() {
        let params = RetroParameters::default()
            .with(Knob::BleedDirection, -0.5)
            .with(Knob::EdgeDistance, 0.002)
            .with(Knob::ScanlineIntensity, 0.4);
        let mut uniforms = RetroUniforms::default();
        uniforms.bind_parameters(&params);
        assert_eq!(uniforms.get(Binding::BlurBias), -0.5);
        assert_eq!(uniforms.get(Binding::EdgeDistance), -0.002);
        assert_eq!(uniforms.scanline_intensity, 0.4);
        // Per-pass lanes stay untouched
        assert_eq!(uniforms.get(Binding::UpsampleFactor), 0.0);
    }

    #[test]
    fn binding_names_are_unique() {
        let all = [
            Binding::UpsampleFactor,
            Binding::SmearOffset,
            Binding::SmearAttenuation,
            Binding::Time,
        ];
        let mut names: Vec<_> = Binding::PARAMETERS
            .iter()
            .chain(all.iter())
            .map(|b| b.name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 16);
    }
}
