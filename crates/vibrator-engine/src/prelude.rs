//! Common imports for driving a [`Vibrator`].
//!
//! ```rust,ignore
//! use vibrator_engine::prelude::*;
//! ```

pub use crate::completion::{self, CompletionCallback, EffectOutcome};
pub use crate::{ActuatorHandles, Capabilities, Vibrator, VibratorConfig};

pub use vibrator_effects::{Braking, CompositePrimitive, Effect, EffectStrength};
pub use vibrator_errors::{HapticError, Result};
pub use vibrator_waveform::{ActivePwle, BrakingPwle, CompositeEffect, PrimitivePwle};
