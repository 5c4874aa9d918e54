/// A scalar bounded to `[min, max]`.
///
/// Every write goes through [`set`](Self::set), so `min <= value <= max`
/// holds for the lifetime of the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedFloat {
    value: f32,
    min: f32,
    max: f32,
}

impl ClampedFloat {
    /// Create a bounded value; `value` is clamped into range and swapped
    /// bounds are reordered.
    #[must_use]
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let mut clamped = Self {
            value: min,
            min,
            max,
        };
        clamped.set(value);
        clamped
    }

    /// Overwrite the value, clamping into range. NaN collapses to `min`.
    pub fn set(&mut self, value: f32) {
        self.value = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Same bounds, new value.
    #[must_use]
    pub fn with_value(mut self, value: f32) -> Self {
        self.set(value);
        self
    }
}
