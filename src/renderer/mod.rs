//! Rendering subsystems.

pub mod postprocess;
