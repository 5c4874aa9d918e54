//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::renderer::postprocess::target::TargetKey;

/// Errors produced by the retrofx crate.
///
/// Per-frame variants ([`DegenerateResolution`](Self::DegenerateResolution),
/// [`PoolExhausted`](Self::PoolExhausted), [`TargetInUse`](Self::TargetInUse),
/// [`UnknownTarget`](Self::UnknownTarget)) never outlive the `execute` call
/// that produced them; the next frame starts clean.
#[derive(Debug)]
pub enum RetroError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// The retro shader program could not be composed.
    ShaderCompose(String),
    /// A pyramid level or smear buffer would have a zero-sized extent.
    DegenerateResolution {
        /// Screen width the frame was planned for.
        width: u32,
        /// Screen height the frame was planned for.
        height: u32,
    },
    /// The pool cannot satisfy an acquire (budget or device limit).
    PoolExhausted {
        /// Key of the target that could not be acquired.
        key: TargetKey,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The key is already held by another consumer this frame.
    TargetInUse(TargetKey),
    /// A command referenced a key that is not currently acquired.
    UnknownTarget(TargetKey),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for RetroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::ShaderCompose(msg) => {
                write!(f, "shader composition failed: {msg}")
            }
            Self::DegenerateResolution { width, height } => write!(
                f,
                "degenerate resolution {width}x{height}: a scratch target \
                 would be zero-sized"
            ),
            Self::PoolExhausted { key, width, height } => write!(
                f,
                "render target pool cannot satisfy {key} at {width}x{height}"
            ),
            Self::TargetInUse(key) => {
                write!(f, "render target {key} is already acquired")
            }
            Self::UnknownTarget(key) => {
                write!(f, "render target {key} is not acquired")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for RetroError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for RetroError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for RetroError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl RetroError {
    /// Whether this error only costs the current frame.
    ///
    /// The render feature swallows these after logging; anything else is a
    /// configuration problem that keeps the feature inactive.
    #[must_use]
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::DegenerateResolution { .. }
                | Self::PoolExhausted { .. }
                | Self::TargetInUse(_)
                | Self::UnknownTarget(_)
        )
    }
}
