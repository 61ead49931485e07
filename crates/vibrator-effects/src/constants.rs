//! Waveform table layout and timing limits

/// Physical waveform indices in the actuator's RAM bank.
pub mod waveform {
    pub const LONG_VIBRATION: u16 = 0;
    pub const RESERVED_1: u16 = 1;
    pub const CLICK: u16 = 2;
    pub const SHORT_VIBRATION: u16 = 3;
    pub const THUD: u16 = 4;
    pub const SPIN: u16 = 5;
    pub const QUICK_RISE: u16 = 6;
    pub const SLOW_RISE: u16 = 7;
    pub const QUICK_FALL: u16 = 8;
    pub const LIGHT_TICK: u16 = 9;
    pub const LOW_TICK: u16 = 10;
    pub const RESERVED_MFG_1: u16 = 11;
    pub const RESERVED_MFG_2: u16 = 12;
    pub const RESERVED_MFG_3: u16 = 13;
    /// Number of precompiled waveforms
    pub const MAX_PHYSICAL: u16 = 14;
    /// Custom slot holding the latest compose payload
    pub const COMPOSE: u16 = 14;
    /// Custom slot holding the latest PWLE payload
    pub const PWLE: u16 = 15;
    /// Size of the per-actuator effect table
    pub const MAX_INDEX: u16 = 16;
}

/// Duration of each physical waveform in milliseconds, by index.
pub const WAVEFORM_DURATIONS_MS: [u32; waveform::MAX_PHYSICAL as usize] = [
    1000, 100, 12, 1000, 300, 130, 150, 500, 100, 5, 12, 1000, 1000, 1000,
];

/// Latency from trigger until the actuator produces output.
pub const MAX_COLD_START_LATENCY_MS: u32 = 6;

/// Allowance for timing error across pauses inside a compound effect.
pub const MAX_PAUSE_TIMING_ERROR_MS: u32 = 1;

/// Silence between the two clicks of a double click.
pub const DOUBLE_CLICK_SILENCE_MS: u32 = 100;

/// `on()` durations below this use the short vibration waveform.
pub const LONG_VIBRATION_THRESHOLD_MS: u32 = 50;

/// Longest `on()` duration.
pub const MAX_TIME_MS: u32 = 0xFFFF;

pub const COMPOSE_DELAY_MAX_MS: u32 = 10_000;
pub const COMPOSE_SIZE_MAX: usize = 254;

/// Primitive scale ceilings indexed by primitive id.
pub const PRIMITIVE_MAX_SCALE: [f32; 9] = [1.0, 0.95, 0.75, 0.9, 1.0, 1.0, 1.0, 0.75, 0.75];

/// Primitive scale floors indexed by primitive id.
pub const PRIMITIVE_MIN_SCALE: [f32; 9] = [0.0, 0.01, 0.11, 0.23, 0.0, 0.25, 0.02, 0.03, 0.16];

/// Duration of the physical waveform at `index`, 0 for custom slots.
pub fn waveform_duration_ms(index: u16) -> u32 {
    WAVEFORM_DURATIONS_MS
        .get(usize::from(index))
        .copied()
        .unwrap_or(0)
}
