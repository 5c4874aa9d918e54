//! Post-processing passes.
//!
//! The retro CRT pass and the transient render-target contract it draws
//! through.

pub mod retro;
pub mod target;
