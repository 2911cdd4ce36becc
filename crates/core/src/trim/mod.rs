use crate::{BeatshiftError, Result};

/// Threshold used when trimming is enabled without an explicit value.
pub const DEFAULT_SILENCE_THRESHOLD: u8 = 125;

/// Largest threshold accepted; at 127 the non-silent band is empty.
pub const MAX_SILENCE_THRESHOLD: u8 = 127;

/// Band of raw byte values treated as silence: `[0, t] ∪ [255 - t, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceBand {
    threshold: u8,
}

impl Default for SilenceBand {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

impl SilenceBand {
    pub fn new(threshold: u8) -> Result<Self> {
        if threshold > MAX_SILENCE_THRESHOLD {
            return Err(BeatshiftError::config(format!(
                "trim threshold must be within 0..={MAX_SILENCE_THRESHOLD}, got {threshold}"
            )));
        }

        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// A byte is audible only inside the open interval `(t, 255 - t)`.
    pub fn is_silent(&self, value: u8) -> bool {
        let t = self.threshold;
        !(t < value && value < 255 - t)
    }
}

/// Outcome of a leading-silence trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trimmed<'a> {
    pub samples: &'a [u8],
    pub removed: usize,
}

/// Drops the leading run of silent bytes, cutting on a frame boundary.
///
/// The cut is the first audible byte rounded down to a multiple of
/// `block_align`. A buffer with no audible byte is trimmed up to its last
/// complete frame.
pub fn trim_leading_silence(samples: &[u8], band: SilenceBand, block_align: usize) -> Trimmed<'_> {
    let block_align = block_align.max(1);
    let first_audible = samples
        .iter()
        .position(|&value| !band.is_silent(value))
        .unwrap_or(samples.len());
    let cut = (first_audible - first_audible % block_align).min(samples.len());

    tracing::info!(
        removed = cut,
        threshold = band.threshold(),
        "trimmed leading silence"
    );

    Trimmed {
        samples: &samples[cut..],
        removed: cut,
    }
}
