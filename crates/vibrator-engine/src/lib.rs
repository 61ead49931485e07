//! Vibrator Engine - haptic effect orchestration
//!
//! Drives one or more LRA actuators: resolves named effects and composed
//! sequences into hardware waveforms, keeps at most one effect playing,
//! synchronizes secondary actuators off a shared GPIO edge and reports each
//! effect's outcome exactly once.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod actuator;
pub mod always_on;
pub mod capabilities;
pub mod completion;
pub mod config;
pub mod dump;
pub mod observability;
pub mod playback;
pub mod prelude;
pub mod slots;
pub mod vibrator;

pub use actuator::{Actuator, ActuatorSet, GPIO_TRIGGER_BUTTON};
pub use always_on::{ALWAYS_ON_ID_MAX, AlwaysOnBinding, AlwaysOnTable, AlwaysOnWaveform};
pub use capabilities::Capabilities;
pub use completion::{CompletionCallback, EffectOutcome};
pub use config::{ConfigError, LoggingConfig, TimingConfig, VibratorConfig};
pub use observability::init_logging;
pub use playback::{ActiveEffect, PlaybackMonitor, PlaybackPhase, PlaybackSource};
pub use slots::{HeldSlot, SlotLedger};
pub use vibrator::{ActuatorHandles, Vibrator};

pub use vibrator_errors::{HapticError, Result};
