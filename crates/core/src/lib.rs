//! Core library for beatshift.
//!
//! A PCM payload is optionally stripped of leading silence, cut into
//! block-aligned beats derived from a tempo, grouped into bars, and
//! re-emitted bar by bar in the order described by a [`BeatMap`]. Each module
//! owns one stage of that pass; [`Pipeline`] wires them together. The WAV
//! container and the configuration model live alongside so the binary crate
//! only deals with flags and console output.

pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod remap;
pub mod segment;
pub mod shuffle;
pub mod trim;
pub mod wav;

pub use config::{BeatshiftConfig, MapSetting, PartialConfig, TrimSetting};
pub use error::{BeatshiftError, Result};
pub use format::{Format, Tempo};
pub use pipeline::{Pipeline, PipelineOutput, PipelineSettings, ProgressEvent, ShuffleMode};
pub use remap::{Bar, BarRemapper, BeatMap, RemapMode};
pub use segment::{Beat, BeatSegments};
pub use shuffle::{sidecar_path, ShuffleLog, ShuffleLogEntry};
pub use trim::{trim_leading_silence, SilenceBand, Trimmed};
pub use wav::DecodedAudio;
