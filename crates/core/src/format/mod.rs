use crate::{BeatshiftError, Result};

/// Sample layout of the PCM payload handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub sample_rate: u32,
    /// Bytes per multi-channel sample frame.
    pub block_align: u32,
}

impl Format {
    /// Creates a validated format. Both fields must be non-zero.
    pub fn new(sample_rate: u32, block_align: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BeatshiftError::invalid_format(
                "sample rate must be greater than zero",
            ));
        }
        if block_align == 0 {
            return Err(BeatshiftError::invalid_format(
                "block alignment must be greater than zero",
            ));
        }

        Ok(Self {
            sample_rate,
            block_align,
        })
    }

    pub fn block_align_bytes(&self) -> usize {
        self.block_align as usize
    }

    /// Number of payload bytes that make up one second of audio.
    pub fn bytes_per_second(&self) -> f64 {
        f64::from(self.sample_rate) * f64::from(self.block_align)
    }

    /// Converts a byte offset into seconds from the start of the payload.
    pub fn seconds_at(&self, byte_offset: usize) -> f64 {
        byte_offset as f64 / self.bytes_per_second()
    }

    /// Exact (unrounded) length of one beat in bytes at the given tempo.
    ///
    /// Cut points are aligned later, cumulatively, by the segmenter.
    pub fn beat_length_bytes(&self, tempo: Tempo) -> Result<f64> {
        let length = self.bytes_per_second() * 60.0 / tempo.bpm();
        if !length.is_finite() || length <= 0.0 {
            return Err(BeatshiftError::invalid_tempo(format!(
                "{} bpm yields a non-positive beat length",
                tempo.bpm()
            )));
        }
        if length < f64::from(self.block_align) {
            return Err(BeatshiftError::invalid_tempo(format!(
                "{} bpm yields beats shorter than one {}-byte frame",
                tempo.bpm(),
                self.block_align
            )));
        }

        Ok(length)
    }
}

/// Playback tempo in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub fn new(bpm: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(BeatshiftError::invalid_tempo(format!(
                "bpm must be a positive number, got {bpm}"
            )));
        }

        Ok(Self { bpm })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_fields() {
        assert!(matches!(
            Format::new(0, 4),
            Err(BeatshiftError::InvalidFormat(_))
        ));
        assert!(matches!(
            Format::new(44_100, 0),
            Err(BeatshiftError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_non_positive_tempo() {
        assert!(matches!(Tempo::new(0.0), Err(BeatshiftError::InvalidTempo(_))));
        assert!(matches!(Tempo::new(-90.0), Err(BeatshiftError::InvalidTempo(_))));
        assert!(Tempo::new(f64::NAN).is_err());
    }

    #[test]
    fn computes_unrounded_beat_length() {
        let format = Format::new(44_100, 4).unwrap();
        let length = format.beat_length_bytes(Tempo::new(120.0).unwrap()).unwrap();
        assert_eq!(length, 88_200.0);

        let length = format.beat_length_bytes(Tempo::new(70.0).unwrap()).unwrap();
        assert!((length - 151_200.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_beats_shorter_than_a_frame() {
        let format = Format::new(10, 4).unwrap();
        let err = format
            .beat_length_bytes(Tempo::new(1_000.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, BeatshiftError::InvalidTempo(_)));
    }

    #[test]
    fn converts_offsets_to_seconds() {
        let format = Format::new(8_000, 2).unwrap();
        assert_eq!(format.seconds_at(16_000), 1.0);
        assert_eq!(format.seconds_at(4_000), 0.25);
    }
}
