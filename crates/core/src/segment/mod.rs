use std::iter::FusedIterator;

/// One beat cut from the sample payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat<'a> {
    /// Zero-based position of the beat in the stream.
    pub index: usize,
    /// Byte offset of the first byte of the beat.
    pub start: usize,
    pub bytes: &'a [u8],
}

impl Beat<'_> {
    /// Byte offset one past the last byte of the beat.
    pub fn end(&self) -> usize {
        self.start + self.bytes.len()
    }
}

/// Lazy sequence of block-aligned beats.
///
/// Cut points follow a running floating-point target that grows by one beat
/// length per step and is rounded down to a frame boundary each time, so the
/// fractional remainder is carried forward instead of accumulating as drift.
/// The sequence ends at the first cut that would overrun the buffer; the
/// trailing partial beat is never emitted.
#[derive(Debug, Clone)]
pub struct BeatSegments<'a> {
    samples: &'a [u8],
    beat_length: f64,
    block_align: usize,
    target: f64,
    last_cut: usize,
    next_index: usize,
    finished: bool,
}

impl<'a> BeatSegments<'a> {
    /// `beat_length` is in bytes and must be positive; see
    /// [`Format::beat_length_bytes`](crate::Format::beat_length_bytes).
    pub fn new(samples: &'a [u8], beat_length: f64, block_align: usize) -> Self {
        Self {
            samples,
            beat_length,
            block_align: block_align.max(1),
            target: 0.0,
            last_cut: 0,
            next_index: 0,
            finished: beat_length.is_nan() || beat_length <= 0.0,
        }
    }
}

impl<'a> Iterator for BeatSegments<'a> {
    type Item = Beat<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.target += self.beat_length;
        let cut = align_down(self.target, self.block_align);
        if cut > self.samples.len() {
            self.finished = true;
            return None;
        }

        let beat = Beat {
            index: self.next_index,
            start: self.last_cut,
            bytes: &self.samples[self.last_cut..cut],
        };
        self.last_cut = cut;
        self.next_index += 1;
        Some(beat)
    }
}

impl FusedIterator for BeatSegments<'_> {}

fn align_down(target: f64, block_align: usize) -> usize {
    let frames = (target / block_align as f64).floor();
    if frames >= usize::MAX as f64 {
        return usize::MAX;
    }
    frames as usize * block_align
}

/// Bars expected for a payload, used for progress reporting only.
pub fn estimated_bars(len: usize, beat_length: f64, beats_per_bar: u32) -> usize {
    if beat_length <= 0.0 || beats_per_bar == 0 {
        return 0;
    }
    (len as f64 / beat_length / f64::from(beats_per_bar)).floor() as usize
}
