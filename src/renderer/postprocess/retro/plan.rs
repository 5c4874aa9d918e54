//! Frame planning: pyramid depth, level extents, smear extent and
//! upsample weights, computed before anything is acquired.

use crate::error::RetroError;

/// Shallowest blur pyramid.
pub const MIN_DEPTH: usize = 3;
/// Deepest blur pyramid.
pub const MAX_DEPTH: usize = 8;
/// Scale applied to `screen_width * bleed_radius` before the logarithm.
pub const RADIUS_SCALE: f32 = 0.25;
/// Damping applied to every upsample blend weight.
pub const UPSAMPLE_DAMPING: f32 = 0.7;
/// Lowest upsample source level; the loop blends levels `depth-1 ..= 3`.
pub const UPSAMPLE_FLOOR: usize = 3;
/// Smear buffer width cap.
pub const SMEAR_MAX_WIDTH: u32 = 640;
/// Smear buffer height cap.
pub const SMEAR_MAX_HEIGHT: u32 = 480;

/// Pixel extent of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Both sides non-zero.
    #[must_use]
    pub fn is_drawable(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Integer half, flooring toward zero.
    #[must_use]
    pub fn halved(self) -> Self {
        Self {
            width: self.width / 2,
            height: self.height / 2,
        }
    }

    /// `[1/width, 1/height]`.
    #[must_use]
    pub fn texel_size(self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    /// `[width, height]` as floats.
    #[must_use]
    pub fn size(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Continuous blur amount, `clamp(log2(width * radius * 0.25), 3, 8)`.
///
/// A zero radius (or width) takes the logarithm to `-inf`, which clamps to
/// the floor; NaN from a negative or NaN radius does the same.
#[must_use]
pub fn blur_amount(screen_width: u32, bleed_radius: f32) -> f32 {
    let raw = (screen_width as f32 * bleed_radius * RADIUS_SCALE).log2();
    if raw.is_nan() {
        MIN_DEPTH as f32
    } else {
        raw.clamp(MIN_DEPTH as f32, MAX_DEPTH as f32)
    }
}

/// Pyramid depth `N = floor(blur_amount)`, always in `3..=8`.
#[must_use]
pub fn pyramid_depth(blur_amount: f32) -> usize {
    (blur_amount.floor() as usize).clamp(MIN_DEPTH, MAX_DEPTH)
}

/// Smear buffer extent, `min(640, width/2) x min(480, height/2)`.
#[must_use]
pub fn smear_extent(screen: Extent) -> Extent {
    let half = screen.halved();
    Extent {
        width: half.width.min(SMEAR_MAX_WIDTH),
        height: half.height.min(SMEAR_MAX_HEIGHT),
    }
}

/// One blend of the upsample loop: level `from` into level `from - 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpsampleStep {
    /// Coarser level read by the blend.
    pub from: usize,
    /// Finer level blended into.
    pub to: usize,
    /// Bound `_UpsampleFactor` (already damped).
    pub weight: f32,
}

/// Every size the retro pass needs for one frame, computed before any
/// target is acquired.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    /// Screen extent the plan was made for.
    pub screen: Extent,
    /// Clamped continuous blur amount.
    pub blur_amount: f32,
    /// Pyramid level extents; index 0 is half resolution.
    pub levels: Vec<Extent>,
    /// Extent of both smear buffers.
    pub smear: Extent,
}

impl FramePlan {
    /// Plan a frame.
    ///
    /// # Errors
    ///
    /// [`RetroError::DegenerateResolution`] when any pyramid level or the
    /// smear buffers would be zero-sized.
    pub fn new(
        width: u32,
        height: u32,
        bleed_radius: f32,
    ) -> Result<Self, RetroError> {
        let screen = Extent { width, height };
        let degenerate = RetroError::DegenerateResolution { width, height };

        let blur_amount = blur_amount(width, bleed_radius);
        let depth = pyramid_depth(blur_amount);

        let mut levels = Vec::with_capacity(depth);
        let mut extent = screen;
        for _ in 0..depth {
            extent = extent.halved();
            if !extent.is_drawable() {
                return Err(degenerate);
            }
            levels.push(extent);
        }

        let smear = smear_extent(screen);
        if !smear.is_drawable() {
            return Err(degenerate);
        }

        Ok(Self {
            screen,
            blur_amount,
            levels,
            smear,
        })
    }

    /// Pyramid depth `N`.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Blend weight before damping for a step reading level `from`.
    ///
    /// `1.0` everywhere except the coarsest level, which gets the part of
    /// the blur amount the floor discarded.
    #[must_use]
    pub fn upsample_factor(&self, from: usize) -> f32 {
        if from + 1 == self.depth() {
            self.blur_amount - self.depth() as f32
        } else {
            1.0
        }
    }

    /// The upsample schedule, coarsest first.
    pub fn upsample_steps(&self) -> impl Iterator<Item = UpsampleStep> + '_ {
        (UPSAMPLE_FLOOR..self.depth()).rev().map(|from| UpsampleStep {
            from,
            to: from - 1,
            weight: self.upsample_factor(from) * UPSAMPLE_DAMPING,
        })
    }
}
