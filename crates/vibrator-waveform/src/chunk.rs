//! Bit-packed waveform buffer.
//!
//! Fields are packed MSB-first into 24-bit words. Each completed word is
//! stored as four big-endian bytes whose top byte is zero, which is the
//! layout the DSP expects in its 32-bit memory cells.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ChunkError;

/// Byte ceiling of a compose payload.
pub const FF_CUSTOM_DATA_LEN_MAX_COMP: usize = 2044;

/// Byte ceiling of a PWLE payload.
pub const FF_CUSTOM_DATA_LEN_MAX_PWLE: usize = 2302;

const WORD_BITS: u32 = 24;
const WORD_BYTES: usize = 4;

/// "Length calculated" flag in the PWLE wavetable length word.
pub const WT_LEN_CALCD: u32 = 0x0080_0000;

/// Longest PWLE waveform in milliseconds.
pub const PWLE_WLENGTH_MAX_MS: u32 = 0x7FFFF;

/// Payload layout of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    /// Sequence of precompiled waveforms with delays
    Compose,
    /// Piecewise-linear amplitude/frequency envelope
    Pwle,
}

/// Append-only serialized waveform.
#[derive(Clone, PartialEq, Eq)]
pub struct WaveformChunk {
    kind: ChunkKind,
    bytes: Vec<u8>,
    cache: u32,
    cache_bits: u32,
    max_bytes: usize,
}

impl WaveformChunk {
    /// Empty compose chunk with its header written.
    pub fn compose() -> Self {
        Self::with_limit(ChunkKind::Compose, FF_CUSTOM_DATA_LEN_MAX_COMP)
    }

    /// Empty PWLE chunk with its header written.
    pub fn pwle() -> Self {
        Self::with_limit(ChunkKind::Pwle, FF_CUSTOM_DATA_LEN_MAX_PWLE)
    }

    /// Chunk of `kind` holding at most `max_bytes`.
    ///
    /// The header fits in the first two words, so any limit of at least
    /// eight bytes leaves it intact.
    pub fn with_limit(kind: ChunkKind, max_bytes: usize) -> Self {
        let mut chunk = Self {
            kind,
            bytes: Vec::with_capacity(max_bytes.min(FF_CUSTOM_DATA_LEN_MAX_PWLE)),
            cache: 0,
            cache_bits: 0,
            max_bytes,
        };
        let header = match kind {
            ChunkKind::Compose => chunk
                .write(8, 0)
                .and_then(|()| chunk.write(8, 0))
                .and_then(|()| chunk.write(8, 0)),
            ChunkKind::Pwle => chunk
                .write(24, 0)
                .and_then(|()| chunk.write(8, 0))
                .and_then(|()| chunk.write(12, 0))
                .and_then(|()| chunk.write(8, 0)),
        };
        if header.is_err() {
            chunk.bytes.clear();
        }
        chunk
    }

    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    /// Append the low `nbits` of `value`.
    ///
    /// # Errors
    ///
    /// [`ChunkError::Full`] when a completed word would exceed the ceiling.
    pub fn write(&mut self, nbits: u32, value: u32) -> Result<(), ChunkError> {
        let mut remaining = nbits.min(32);
        let value = if remaining >= 32 {
            value
        } else {
            value & ((1_u32 << remaining) - 1)
        };
        while remaining > 0 {
            let take = (WORD_BITS - self.cache_bits).min(remaining);
            let shift = remaining - take;
            let field = (value >> shift) & ((1_u32 << take) - 1);
            self.cache = (self.cache << take) | field;
            self.cache_bits += take;
            remaining = shift;
            if self.cache_bits == WORD_BITS {
                self.emit_word()?;
            }
        }
        Ok(())
    }

    fn emit_word(&mut self) -> Result<(), ChunkError> {
        if self.bytes.len() + WORD_BYTES > self.max_bytes {
            return Err(ChunkError::Full {
                max_bytes: self.max_bytes,
            });
        }
        let word = self.cache & 0x00FF_FFFF;
        self.bytes.extend_from_slice(&word.to_be_bytes());
        self.cache = 0;
        self.cache_bits = 0;
        Ok(())
    }

    /// Pad the partially filled word with zeros.
    pub fn flush(&mut self) -> Result<(), ChunkError> {
        if self.cache_bits == 0 {
            return Ok(());
        }
        self.write(WORD_BITS - self.cache_bits, 0)
    }

    /// Store the section count in the header.
    pub fn set_nsections(&mut self, nsections: usize) -> Result<(), ChunkError> {
        match self.kind {
            ChunkKind::Compose => {
                let count = u8::try_from(nsections)
                    .map_err(|_| ChunkError::TooManySections { count: nsections, max: 255 })?;
                if let Some(byte) = self.bytes.get_mut(2) {
                    *byte = count;
                }
            }
            ChunkKind::Pwle => {
                let count = u8::try_from(nsections)
                    .map_err(|_| ChunkError::TooManySections { count: nsections, max: 255 })?;
                if let Some(byte) = self.bytes.get_mut(7) {
                    *byte = (*byte & 0xF0) | (count >> 4);
                }
                if let Some(byte) = self.bytes.get_mut(9) {
                    *byte = (*byte & 0x0F) | ((count & 0x0F) << 4);
                }
            }
        }
        Ok(())
    }

    /// Store the total PWLE length in the header, in 0.125 ms units.
    pub fn set_wlength(&mut self, total_ms: u32) -> Result<(), ChunkError> {
        if total_ms > PWLE_WLENGTH_MAX_MS {
            return Err(ChunkError::TooLong {
                duration_ms: total_ms,
                max_ms: PWLE_WLENGTH_MAX_MS,
            });
        }
        let encoded = (total_ms * 8) | WT_LEN_CALCD;
        for (byte, value) in self.bytes.iter_mut().zip(encoded.to_be_bytes()) {
            *byte = value;
        }
        Ok(())
    }

    /// Serialized payload. Call [`flush`](Self::flush) first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

impl fmt::Debug for WaveformChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveformChunk")
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .field("pending_bits", &self.cache_bits)
            .finish()
    }
}
