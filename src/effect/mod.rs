//! Effect parameter container read by the retro pass.
//!
//! [`RetroParameters`] is the runtime value set: an enable flag plus a group
//! of [`ClampedFloat`] knobs whose bounds are enforced here, by the owner,
//! so the pass can trust them. Hosts hand a parameter set to the pass
//! through a [`ParameterSource`].

mod clamped;
mod parameters;

pub use clamped::ClampedFloat;
pub use parameters::{Knob, ParameterSource, RetroParameters};
