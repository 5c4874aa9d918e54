use super::ClampedFloat;

/// One bounded scalar of the retro effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Knob {
    /// Blur radius as a fraction of screen width; drives pyramid depth.
    BleedRadius,
    /// Horizontal bias of the first (bleed) downsample.
    BleedDirection,
    /// Strength of the bleed mixed back in by the composite.
    BleedIntensity,
    /// Strength of the smear trail.
    SmearIntensity,
    /// Edge darkening strength.
    EdgeIntensity,
    /// Edge darkening sample distance in UV units.
    EdgeDistance,
    /// Amount of tape noise lines.
    TapeNoiseAmount,
    /// Scroll speed of the tape noise.
    TapeNoiseSpeed,
    /// Opacity of the tape noise.
    TapeNoiseAlpha,
    /// Interlacing line offset strength.
    InterlacingAmount,
    /// Scanline scroll speed.
    ScanlineSpeed,
    /// Scanlines per screen height.
    ScanlineFrequency,
    /// Scanline darkening strength.
    ScanlineIntensity,
}

impl Knob {
    /// Number of knobs.
    pub const COUNT: usize = 13;

    /// Every knob, in storage order.
    pub const ALL: [Knob; Self::COUNT] = [
        Knob::BleedRadius,
        Knob::BleedDirection,
        Knob::BleedIntensity,
        Knob::SmearIntensity,
        Knob::EdgeIntensity,
        Knob::EdgeDistance,
        Knob::TapeNoiseAmount,
        Knob::TapeNoiseSpeed,
        Knob::TapeNoiseAlpha,
        Knob::InterlacingAmount,
        Knob::ScanlineSpeed,
        Knob::ScanlineFrequency,
        Knob::ScanlineIntensity,
    ];

    /// `(min, max)` bounds.
    #[must_use]
    pub fn range(self) -> (f32, f32) {
        match self {
            Knob::BleedDirection => (-1.0, 1.0),
            Knob::BleedIntensity | Knob::EdgeIntensity => (0.0, 2.0),
            Knob::EdgeDistance => (0.0, 0.005),
            Knob::TapeNoiseSpeed | Knob::ScanlineSpeed => (0.0, 10.0),
            Knob::ScanlineFrequency => (0.0, 1000.0),
            Knob::BleedRadius
            | Knob::SmearIntensity
            | Knob::TapeNoiseAmount
            | Knob::TapeNoiseAlpha
            | Knob::InterlacingAmount
            | Knob::ScanlineIntensity => (0.0, 1.0),
        }
    }

    /// Value of a freshly created parameter set.
    #[must_use]
    pub fn default_value(self) -> f32 {
        match self {
            Knob::TapeNoiseSpeed | Knob::ScanlineSpeed => 1.0,
            Knob::ScanlineFrequency => 240.0,
            _ => 0.0,
        }
    }

    /// Field name used by presets and the options schema.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Knob::BleedRadius => "bleed_radius",
            Knob::BleedDirection => "bleed_direction",
            Knob::BleedIntensity => "bleed_intensity",
            Knob::SmearIntensity => "smear_intensity",
            Knob::EdgeIntensity => "edge_intensity",
            Knob::EdgeDistance => "edge_distance",
            Knob::TapeNoiseAmount => "tape_noise_amount",
            Knob::TapeNoiseSpeed => "tape_noise_speed",
            Knob::TapeNoiseAlpha => "tape_noise_alpha",
            Knob::InterlacingAmount => "interlacing_amount",
            Knob::ScanlineSpeed => "scanline_speed",
            Knob::ScanlineFrequency => "scanline_frequency",
            Knob::ScanlineIntensity => "scanline_intensity",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// The retro effect's value set: an enable flag and one [`ClampedFloat`]
/// per [`Knob`].
///
/// The pass copies what it needs during `setup` and never keeps a
/// reference, so hosts are free to swap instances between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct RetroParameters {
    /// Master switch; a disabled set schedules no work.
    pub enabled: bool,
    knobs: [ClampedFloat; Knob::COUNT],
}

impl Default for RetroParameters {
    fn default() -> Self {
        let knobs = Knob::ALL.map(|knob| {
            let (min, max) = knob.range();
            ClampedFloat::new(knob.default_value(), min, max)
        });
        Self {
            enabled: false,
            knobs,
        }
    }
}

impl RetroParameters {
    /// Whether the effect should run at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled
    }

    /// Current value of a knob.
    #[must_use]
    pub fn get(&self, knob: Knob) -> f32 {
        self.knobs[knob.slot()].value()
    }

    /// The bounded value backing a knob.
    #[must_use]
    pub fn clamped(&self, knob: Knob) -> ClampedFloat {
        self.knobs[knob.slot()]
    }

    /// Write a knob, clamping into its range.
    pub fn set(&mut self, knob: Knob, value: f32) {
        self.knobs[knob.slot()].set(value);
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, knob: Knob, value: f32) -> Self {
        self.set(knob, value);
        self
    }

    /// Builder-style enable flag.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Where the host looks up the current parameter set each frame.
///
/// Returning `None` (no set registered) skips the effect exactly like a
/// disabled set does.
pub trait ParameterSource {
    /// The retro parameters in effect for this frame, if any.
    fn retro(&self) -> Option<&RetroParameters>;
}

impl ParameterSource for RetroParameters {
    fn retro(&self) -> Option<&RetroParameters> {
        Some(self)
    }
}

impl ParameterSource for Option<RetroParameters> {
    fn retro(&self) -> Option<&RetroParameters> {
        self.as_ref()
    }
}
