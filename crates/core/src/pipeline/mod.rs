use crate::remap::{Bar, BarRemapper, RemapMode};
use crate::segment::{estimated_bars, BeatSegments};
use crate::shuffle::{ShuffleLog, ShuffleLogEntry};
use crate::trim::{trim_leading_silence, SilenceBand};
use crate::{BeatMap, BeatshiftError, Format, Result, Tempo};

/// Whether each bar gets a freshly shuffled map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShuffleMode {
    #[default]
    Off,
    /// Shuffle with an optional fixed seed for reproducible runs.
    On { seed: Option<u64> },
}

/// Validated engine settings for one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub tempo: Tempo,
    pub beats_per_bar: u32,
    pub map: BeatMap,
    /// Leading silence is removed when set.
    pub trim: Option<SilenceBand>,
    pub shuffle: ShuffleMode,
    /// Emit per-segment [`ProgressEvent::Segment`] diagnostics.
    pub debug: bool,
}

/// Observations reported while the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Trimmed { bytes: usize },
    Start { total_bars: usize },
    Segment { index: usize, start: usize, end: usize },
    Bar { index: usize, total: usize },
    Finish,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Replacement sample payload.
    pub samples: Vec<u8>,
    /// Present only when shuffling was enabled.
    pub shuffle_log: Option<ShuffleLog>,
    pub trimmed_bytes: usize,
    pub bars: usize,
}

/// Single-use driver that trims, segments and remaps one sample payload.
#[derive(Debug)]
pub struct Pipeline {
    format: Format,
    beat_length: f64,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(format: Format, settings: PipelineSettings) -> Result<Self> {
        let format = Format::new(format.sample_rate, format.block_align)?;
        if settings.beats_per_bar == 0 {
            return Err(BeatshiftError::invalid_tempo(
                "beats per bar must be greater than zero",
            ));
        }
        let beat_length = format.beat_length_bytes(settings.tempo)?;

        tracing::debug!(
            sample_rate = format.sample_rate,
            block_align = format.block_align,
            bpm = settings.tempo.bpm(),
            beat_length,
            "pipeline initialised"
        );

        Ok(Self {
            format,
            beat_length,
            settings,
        })
    }

    /// Unrounded beat length in bytes.
    pub fn beat_length(&self) -> f64 {
        self.beat_length
    }

    pub fn run(self, samples: &[u8]) -> Result<PipelineOutput> {
        self.run_with_progress(samples, |_| {})
    }

    pub fn run_with_progress<F>(self, samples: &[u8], mut progress: F) -> Result<PipelineOutput>
    where
        F: FnMut(ProgressEvent),
    {
        let Pipeline {
            format,
            beat_length,
            settings,
        } = self;
        let block_align = format.block_align_bytes();
        let (active, trimmed_bytes) = match settings.trim {
            Some(band) => {
                let trimmed = trim_leading_silence(samples, band, block_align);
                progress(ProgressEvent::Trimmed {
                    bytes: trimmed.removed,
                });
                (trimmed.samples, trimmed.removed)
            }
            None => (samples, 0),
        };

        let beats_per_bar = settings.beats_per_bar;
        let total_bars = estimated_bars(active.len(), beat_length, beats_per_bar);
        progress(ProgressEvent::Start { total_bars });

        let mode = match settings.shuffle {
            ShuffleMode::Off => RemapMode::Static,
            ShuffleMode::On { seed: Some(seed) } => {
                RemapMode::Shuffled(fastrand::Rng::with_seed(seed))
            }
            ShuffleMode::On { seed: None } => RemapMode::Shuffled(fastrand::Rng::new()),
        };
        let mut remapper = BarRemapper::new(settings.map, mode);
        let mut log = remapper.is_shuffling().then(ShuffleLog::new);

        let mut output = Vec::with_capacity(active.len());
        let mut bar = Bar::new(beats_per_bar as usize);
        let mut bar_index = 0;
        let mut bar_start = BarStart::default();

        for beat in BeatSegments::new(active, beat_length, block_align) {
            if settings.debug {
                progress(ProgressEvent::Segment {
                    index: beat.index,
                    start: beat.start,
                    end: beat.end(),
                });
            }
            if bar.is_empty() {
                bar_start = BarStart {
                    byte: beat.start,
                    beat: beat.index,
                };
            }

            if bar.push(beat.bytes) {
                let map = remapper.remap_bar(&mut bar, &mut output);
                if let Some(log) = log.as_mut() {
                    log.push(log_entry(&format, bar_index, bar_start, map));
                }
                bar_index += 1;
                progress(ProgressEvent::Bar {
                    index: bar_index,
                    total: total_bars,
                });
            }
        }

        // Leftover beats form a final partial bar, remapped like a full one.
        if !bar.is_empty() {
            let map = remapper.remap_bar(&mut bar, &mut output);
            if let Some(log) = log.as_mut() {
                log.push(log_entry(&format, bar_index, bar_start, map));
            }
            bar_index += 1;
            progress(ProgressEvent::Bar {
                index: bar_index,
                total: total_bars,
            });
        }

        progress(ProgressEvent::Finish);
        tracing::info!(
            bars = bar_index,
            input_bytes = active.len(),
            output_bytes = output.len(),
            "remapped beats"
        );

        Ok(PipelineOutput {
            samples: output,
            shuffle_log: log,
            trimmed_bytes,
            bars: bar_index,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BarStart {
    byte: usize,
    beat: usize,
}

fn log_entry(format: &Format, bar_index: usize, start: BarStart, map: &BeatMap) -> ShuffleLogEntry {
    ShuffleLogEntry {
        cumulative_bytes: start.byte,
        bar_index,
        cumulative_beat_index: start.beat,
        cumulative_seconds: format.seconds_at(start.byte),
        map_snapshot: map.to_one_based(),
    }
}
