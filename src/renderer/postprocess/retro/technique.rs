/// The five fixed techniques of the retro shader program.
///
/// Discriminants are the program's sub-pass indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    /// Source → level 0, with the bleed direction bias.
    BleedDownsample = 0,
    /// Level i-1 → level i, blur only.
    BlurDownsample = 1,
    /// Level i blended into level i-1 by `_UpsampleFactor`.
    UpsampleBlend = 2,
    /// One directional tap of the smear accumulation.
    SmearAccumulate = 3,
    /// Final composite back onto the source image.
    Composite = 4,
}

impl Technique {
    /// Every technique, in sub-pass order.
    pub const ALL: [Technique; 5] = [
        Technique::BleedDownsample,
        Technique::BlurDownsample,
        Technique::UpsampleBlend,
        Technique::SmearAccumulate,
        Technique::Composite,
    ];

    /// Sub-pass index inside the program.
    #[must_use]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// WGSL fragment entry point implementing this technique.
    #[must_use]
    pub fn entry_point(self) -> &'static str {
        match self {
            Technique::BleedDownsample => "fs_bleed_downsample",
            Technique::BlurDownsample => "fs_blur_downsample",
            Technique::UpsampleBlend => "fs_upsample_blend",
            Technique::SmearAccumulate => "fs_smear_accumulate",
            Technique::Composite => "fs_composite",
        }
    }

    /// Debug label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Technique::BleedDownsample => "Retro Bleed Downsample",
            Technique::BlurDownsample => "Retro Blur Downsample",
            Technique::UpsampleBlend => "Retro Upsample Blend",
            Technique::SmearAccumulate => "Retro Smear Accumulate",
            Technique::Composite => "Retro Composite",
        }
    }

    /// Whether the draw blends over the destination instead of replacing it.
    #[must_use]
    pub fn blends_into_destination(self) -> bool {
        matches!(self, Technique::UpsampleBlend)
    }

    /// Whether the draw writes the host's source image.
    #[must_use]
    pub fn writes_source(self) -> bool {
        matches!(self, Technique::Composite)
    }
}
