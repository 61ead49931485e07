//! Capability bitmask reported to clients.

use bitflags::bitflags;

bitflags! {
    /// Vibrator capability flags.
    ///
    /// Bit values match the platform vibrator interface.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: i32 {
        /// `on()` reports completion
        const ON_CALLBACK = 1 << 0;
        /// `perform()` reports completion
        const PERFORM_CALLBACK = 1 << 1;
        /// `set_amplitude()` is honored
        const AMPLITUDE_CONTROL = 1 << 2;
        /// Haptic PCM path present
        const EXTERNAL_CONTROL = 1 << 3;
        /// Composite primitive sequences (needs OWT)
        const COMPOSE_EFFECTS = 1 << 5;
        /// Always-on bindings
        const ALWAYS_ON_CONTROL = 1 << 6;
        const GET_RESONANT_FREQUENCY = 1 << 7;
        const GET_Q_FACTOR = 1 << 8;
        /// Frequency queries and PWLE frequencies (needs OWT and chirp)
        const FREQUENCY_CONTROL = 1 << 9;
        /// PWLE sequences (needs OWT and chirp)
        const COMPOSE_PWLE_EFFECTS = 1 << 10;
    }
}

impl Capabilities {
    /// Capabilities of a device with the given optional features.
    pub fn detect(has_owt: bool, has_haptic_pcm: bool, chirp_enabled: bool) -> Self {
        let mut caps = Capabilities::ON_CALLBACK
            | Capabilities::PERFORM_CALLBACK
            | Capabilities::AMPLITUDE_CONTROL
            | Capabilities::ALWAYS_ON_CONTROL
            | Capabilities::GET_RESONANT_FREQUENCY
            | Capabilities::GET_Q_FACTOR;
        if has_haptic_pcm {
            caps |= Capabilities::EXTERNAL_CONTROL;
        }
        if has_owt {
            caps |= Capabilities::COMPOSE_EFFECTS;
            if chirp_enabled {
                caps |= Capabilities::FREQUENCY_CONTROL | Capabilities::COMPOSE_PWLE_EFFECTS;
            }
        }
        caps
    }
}
