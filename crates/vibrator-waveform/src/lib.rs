//! Waveform composition for open-wavetable haptic slots
//!
//! Builds the serialized payloads uploaded into custom waveform slots:
//!
//! - compound effects and composite primitive sequences ([`compose`])
//! - piecewise-linear amplitude/frequency envelopes ([`pwle`])
//!
//! Every request is validated in full while its [`WaveformChunk`] is built,
//! so nothing reaches the hardware unless the whole payload is legal.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod chunk;
pub mod compose;
pub mod pwle;

pub use chunk::*;
pub use compose::*;
pub use pwle::*;

use thiserror::Error;
use vibrator_errors::HapticError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("waveform payload exceeds {max_bytes} bytes")]
    Full { max_bytes: usize },

    #[error("{count} sections exceed the maximum of {max}")]
    TooManySections { count: usize, max: usize },

    #[error("waveform length {duration_ms} ms exceeds {max_ms} ms")]
    TooLong { duration_ms: u32, max_ms: u32 },

    #[error("invalid segment: {0}")]
    InvalidSegment(String),
}

impl From<ChunkError> for HapticError {
    fn from(err: ChunkError) -> Self {
        HapticError::IllegalArgument(err.to_string())
    }
}

/// A validated, flushed payload and the time it takes to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedWaveform {
    pub chunk: WaveformChunk,
    pub duration_ms: u32,
}

impl ComposedWaveform {
    pub fn bytes(&self) -> &[u8] {
        self.chunk.as_bytes()
    }
}
