use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::effect::{Knob, RetroParameters};

/// Authoring-side values of the retro effect, as stored in presets.
///
/// Values are plain numbers here; [`RetroOptions::to_parameters`] clamps
/// them into the ranges the pass expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Retro", inline)]
#[serde(default)]
pub struct RetroOptions {
    /// Master switch.
    #[schemars(title = "Enable")]
    pub enabled: bool,
    /// Blur radius relative to screen width.
    #[schemars(title = "Bleed Radius", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub bleed_radius: f32,
    /// Horizontal bias of the bleed.
    #[schemars(title = "Bleed Direction", range(min = -1.0, max = 1.0), extend("step" = 0.05))]
    pub bleed_direction: f32,
    /// Bleed strength in the composite.
    #[schemars(title = "Bleed Intensity", range(min = 0.0, max = 2.0), extend("step" = 0.05))]
    pub bleed_intensity: f32,
    /// Smear trail strength.
    #[schemars(title = "Smear Intensity", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub smear_intensity: f32,
    /// Edge darkening strength.
    #[schemars(title = "Edge Intensity", range(min = 0.0, max = 2.0), extend("step" = 0.05))]
    pub edge_intensity: f32,
    /// Edge darkening distance.
    #[schemars(title = "Edge Distance", range(min = 0.0, max = 0.005), extend("step" = 0.0001))]
    pub edge_distance: f32,
    /// Tape noise amount.
    #[schemars(title = "Tape Noise", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub tape_noise_amount: f32,
    /// Tape noise scroll speed.
    #[schemars(title = "Tape Noise Speed", range(min = 0.0, max = 10.0), extend("step" = 0.1))]
    pub tape_noise_speed: f32,
    /// Tape noise opacity.
    #[schemars(title = "Tape Noise Alpha", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub tape_noise_alpha: f32,
    /// Interlacing strength.
    #[schemars(title = "Interlacing", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub interlacing_amount: f32,
    /// Scanline scroll speed.
    #[schemars(title = "Scanline Speed", range(min = 0.0, max = 10.0), extend("step" = 0.1))]
    pub scanline_speed: f32,
    /// Scanlines per screen height.
    #[schemars(title = "Scanline Frequency", range(min = 0.0, max = 1000.0), extend("step" = 1.0))]
    pub scanline_frequency: f32,
    /// Scanline darkening strength.
    #[schemars(title = "Scanline Intensity", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub scanline_intensity: f32,
}

impl Default for RetroOptions {
    fn default() -> Self {
        Self::from_parameters(&RetroParameters::default())
    }
}

impl RetroOptions {
    /// Clamp the stored values into a runtime parameter set.
    #[must_use]
    pub fn to_parameters(&self) -> RetroParameters {
        let mut params = RetroParameters::default().enabled(self.enabled);
        for knob in Knob::ALL {
            params.set(knob, *self.field(knob));
        }
        params
    }

    /// Snapshot a runtime parameter set.
    #[must_use]
    pub fn from_parameters(params: &RetroParameters) -> Self {
        let mut options = Self {
            enabled: params.enabled,
            bleed_radius: 0.0,
            bleed_direction: 0.0,
            bleed_intensity: 0.0,
            smear_intensity: 0.0,
            edge_intensity: 0.0,
            edge_distance: 0.0,
            tape_noise_amount: 0.0,
            tape_noise_speed: 0.0,
            tape_noise_alpha: 0.0,
            interlacing_amount: 0.0,
            scanline_speed: 0.0,
            scanline_frequency: 0.0,
            scanline_intensity: 0.0,
        };
        for knob in Knob::ALL {
            *options.field_mut(knob) = params.get(knob);
        }
        options
    }

    fn field(&self, knob: Knob) -> &f32 {
        match knob {
            Knob::BleedRadius => &self.bleed_radius,
            Knob::BleedDirection => &self.bleed_direction,
            Knob::BleedIntensity => &self.bleed_intensity,
            Knob::SmearIntensity => &self.smear_intensity,
            Knob::EdgeIntensity => &self.edge_intensity,
            Knob::EdgeDistance => &self.edge_distance,
            Knob::TapeNoiseAmount => &self.tape_noise_amount,
            Knob::TapeNoiseSpeed => &self.tape_noise_speed,
            Knob::TapeNoiseAlpha => &self.tape_noise_alpha,
            Knob::InterlacingAmount => &self.interlacing_amount,
            Knob::ScanlineSpeed => &self.scanline_speed,
            Knob::ScanlineFrequency => &self.scanline_frequency,
            Knob::ScanlineIntensity => &self.scanline_intensity,
        }
    }

    fn field_mut(&mut self, knob: Knob) -> &mut f32 {
        match knob {
            Knob::BleedRadius => &mut self.bleed_radius,
            Knob::BleedDirection => &mut self.bleed_direction,
            Knob::BleedIntensity => &mut self.bleed_intensity,
            Knob::SmearIntensity => &mut self.smear_intensity,
            Knob::EdgeIntensity => &mut self.edge_intensity,
            Knob::EdgeDistance => &mut self.edge_distance,
            Knob::TapeNoiseAmount => &mut self.tape_noise_amount,
            Knob::TapeNoiseSpeed => &mut self.tape_noise_speed,
            Knob::TapeNoiseAlpha => &mut self.tape_noise_alpha,
            Knob::InterlacingAmount => &mut self.interlacing_amount,
            Knob::ScanlineSpeed => &mut self.scanline_speed,
            Knob::ScanlineFrequency => &mut self.scanline_frequency,
            Knob::ScanlineIntensity => &mut self.scanline_intensity,
        }
    }
}
