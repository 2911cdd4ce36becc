use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineSettings, ShuffleMode};
use crate::trim::{SilenceBand, DEFAULT_SILENCE_THRESHOLD};
use crate::{BeatMap, BeatshiftError, Result, Tempo};

pub const DEFAULT_INPUT: &str = "input.wav";
pub const DEFAULT_OUTPUT: &str = "output.wav";
pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
pub const DEFAULT_MAP: &str = "1,4,3,2";

/// Leading-silence trimming as written in a config file: a flag or a
/// numeric threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrimSetting {
    Enabled(bool),
    Threshold(u8),
}

impl TrimSetting {
    /// Threshold to trim with, or `None` when trimming is off.
    pub fn threshold(self) -> Option<u8> {
        match self {
            TrimSetting::Enabled(true) => Some(DEFAULT_SILENCE_THRESHOLD),
            TrimSetting::Enabled(false) => None,
            TrimSetting::Threshold(value) => Some(value),
        }
    }
}

/// Beat order as written in a config file: a list or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapSetting {
    List(Vec<i32>),
    Text(String),
}

impl MapSetting {
    /// 1-based map values. Blank entries in the text form become `0`.
    pub fn values(&self) -> Result<Vec<i32>> {
        match self {
            MapSetting::List(values) => Ok(values.clone()),
            MapSetting::Text(text) => parse_map(text),
        }
    }
}

/// Parses a comma-separated, 1-based beat map such as `"1,4,3,2"`.
pub fn parse_map(text: &str) -> Result<Vec<i32>> {
    text.split(',')
        .map(str::trim)
        .map(|entry| {
            if entry.is_empty() {
                return Ok(0);
            }
            entry.parse::<i32>().map_err(|_| {
                BeatshiftError::config(format!("invalid map entry '{entry}' in '{text}'"))
            })
        })
        .collect()
}

/// One layer of settings: CLI flags or a JSON config file.
///
/// Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub bpm: Option<f64>,
    pub beats_per_bar: Option<u32>,
    pub map: Option<MapSetting>,
    pub trim: Option<TrimSetting>,
    pub shuffle: Option<bool>,
    pub seed: Option<u64>,
    pub debug: Option<bool>,
}

impl PartialConfig {
    /// Loads a JSON config file. Unreadable or malformed files are
    /// configuration errors.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            BeatshiftError::config(format!("cannot read config '{}': {err}", path.display()))
        })?;
        Self::from_json(&text).map_err(|err| match err {
            BeatshiftError::Config(msg) => {
                BeatshiftError::config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|err| BeatshiftError::config(format!("malformed config: {err}")))
    }

    /// Fills every unset field of `self` from `lower`.
    pub fn or(self, lower: PartialConfig) -> PartialConfig {
        PartialConfig {
            input: self.input.or(lower.input),
            output: self.output.or(lower.output),
            bpm: self.bpm.or(lower.bpm),
            beats_per_bar: self.beats_per_bar.or(lower.beats_per_bar),
            map: self.map.or(lower.map),
            trim: self.trim.or(lower.trim),
            shuffle: self.shuffle.or(lower.shuffle),
            seed: self.seed.or(lower.seed),
            debug: self.debug.or(lower.debug),
        }
    }

    /// Applies built-in defaults and validates the map.
    pub fn resolve(self) -> Result<BeatshiftConfig> {
        let map = match self.map {
            Some(map) => map.values()?,
            None => parse_map(DEFAULT_MAP)?,
        };

        Ok(BeatshiftConfig {
            input: self.input.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT)),
            output: self.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            bpm: self.bpm.unwrap_or(DEFAULT_BPM),
            beats_per_bar: self.beats_per_bar.unwrap_or(DEFAULT_BEATS_PER_BAR),
            map,
            trim: self.trim.and_then(TrimSetting::threshold),
            shuffle: self.shuffle.unwrap_or(false),
            seed: self.seed,
            debug: self.debug.unwrap_or(false),
        })
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatshiftConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bpm: f64,
    pub beats_per_bar: u32,
    /// 1-based beat order.
    pub map: Vec<i32>,
    /// Silence threshold, `None` when trimming is off.
    pub trim: Option<u8>,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub debug: bool,
}

impl Default for BeatshiftConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            bpm: DEFAULT_BPM,
            beats_per_bar: DEFAULT_BEATS_PER_BAR,
            map: vec![1, 4, 3, 2],
            trim: None,
            shuffle: false,
            seed: None,
            debug: false,
        }
    }
}

impl BeatshiftConfig {
    /// Validates the engine-facing part of the configuration.
    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        let tempo = Tempo::new(self.bpm)?;
        if self.beats_per_bar == 0 {
            return Err(BeatshiftError::invalid_tempo(
                "beats per bar must be greater than zero",
            ));
        }
        let trim = self.trim.map(SilenceBand::new).transpose()?;
        let shuffle = if self.shuffle {
            ShuffleMode::On { seed: self.seed }
        } else {
            ShuffleMode::Off
        };

        Ok(PipelineSettings {
            tempo,
            beats_per_bar: self.beats_per_bar,
            map: BeatMap::from_one_based(&self.map),
            trim,
            shuffle,
            debug: self.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_with_blank_entries() {
        assert_eq!(parse_map("1,4,3,2").unwrap(), vec![1, 4, 3, 2]);
        assert_eq!(parse_map("1,,3").unwrap(), vec![1, 0, 3]);
        assert_eq!(parse_map(" 2 , 1 ").unwrap(), vec![2, 1]);
        assert!(matches!(parse_map("1,x"), Err(BeatshiftError::Config(_))));
    }

    #[test]
    fn reads_camel_case_json() {
        let config = PartialConfig::from_json(
            r#"{ "bpm": 95.5, "beatsPerBar": 3, "map": [3, 2, 1], "trim": 100, "shuffle": true }"#,
        )
        .unwrap();

        assert_eq!(config.bpm, Some(95.5));
        assert_eq!(config.beats_per_bar, Some(3));
        assert_eq!(config.map, Some(MapSetting::List(vec![3, 2, 1])));
        assert_eq!(config.trim, Some(TrimSetting::Threshold(100)));
        assert_eq!(config.shuffle, Some(true));
    }

    #[test]
    fn accepts_map_strings_and_trim_flags() {
        let config = PartialConfig::from_json(r#"{ "map": "1,,2", "trim": true }"#)
            .unwrap()
            .resolve()
            .unwrap();

        assert_eq!(config.map, vec![1, 0, 2]);
        assert_eq!(config.trim, Some(DEFAULT_SILENCE_THRESHOLD));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            PartialConfig::from_json("{ bpm: "),
            Err(BeatshiftError::Config(_))
        ));
        assert!(matches!(
            PartialConfig::from_json(r#"{ "tempo": 120 }"#),
            Err(BeatshiftError::Config(_))
        ));
    }

    #[test]
    fn upper_layer_wins() {
        let flags = PartialConfig {
            bpm: Some(90.0),
            ..Default::default()
        };
        let file = PartialConfig {
            bpm: Some(140.0),
            shuffle: Some(true),
            ..Default::default()
        };

        let config = flags.or(file).resolve().unwrap();
        assert_eq!(config.bpm, 90.0);
        assert!(config.shuffle);
    }

    #[test]
    fn resolves_defaults() {
        let config = PartialConfig::default().resolve().unwrap();
        assert_eq!(config, BeatshiftConfig::default());
    }

    #[test]
    fn builds_pipeline_settings() {
        let config = BeatshiftConfig {
            trim: Some(120),
            shuffle: true,
            seed: Some(9),
            ..Default::default()
        };

        let settings = config.pipeline_settings().unwrap();
        assert_eq!(settings.map.indices(), &[0, 3, 2, 1]);
        assert_eq!(settings.trim.map(|band| band.threshold()), Some(120));
        assert_eq!(settings.shuffle, ShuffleMode::On { seed: Some(9) });
    }

    #[test]
    fn rejects_invalid_engine_settings() {
        let zero_beats = BeatshiftConfig {
            beats_per_bar: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_beats.pipeline_settings(),
            Err(BeatshiftError::InvalidTempo(_))
        ));

        let bad_trim = BeatshiftConfig {
            trim: Some(200),
            ..Default::default()
        };
        assert!(matches!(
            bad_trim.pipeline_settings(),
            Err(BeatshiftError::Config(_))
        ));

        let bad_bpm = BeatshiftConfig {
            bpm: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_bpm.pipeline_settings(),
            Err(BeatshiftError::InvalidTempo(_))
        ));
    }
}
