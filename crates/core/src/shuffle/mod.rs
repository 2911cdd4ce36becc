use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{BeatMap, Result};

/// Suffix appended to the output path to name the shuffle log sidecar.
pub const SIDECAR_SUFFIX: &str = ".script.json";

/// Returns a uniformly shuffled copy of `map` (Fisher-Yates).
pub fn permute(map: &BeatMap, rng: &mut fastrand::Rng) -> BeatMap {
    let mut indices = map.indices().to_vec();
    for i in (1..indices.len()).rev() {
        let j = rng.usize(0..=i);
        indices.swap(i, j);
    }
    BeatMap::new(indices)
}

/// Map used for one bar, with the bar's position in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleLogEntry {
    /// Byte offset in the (trimmed) input where the bar starts.
    pub cumulative_bytes: usize,
    pub bar_index: usize,
    /// Number of beats that preceded the bar.
    pub cumulative_beat_index: usize,
    pub cumulative_seconds: f64,
    /// 1-based map values, replayable through the `map` option.
    pub map_snapshot: Vec<i64>,
}

/// Append-only record of the permutations used while shuffling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShuffleLog {
    entries: Vec<ShuffleLogEntry>,
}

impl ShuffleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ShuffleLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ShuffleLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the log as a JSON array to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), entries = self.len(), "wrote shuffle log");
        Ok(())
    }
}

/// `<output>.script.json`, next to the rendered file.
pub fn sidecar_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_preserves_entries() {
        let map = BeatMap::from_one_based(&[1, 2, 2, 3, 4, 5]);
        let mut rng = fastrand::Rng::with_seed(42);

        let shuffled = permute(&map, &mut rng);
        let mut before = map.indices().to_vec();
        let mut after = shuffled.indices().to_vec();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn permutation_is_seed_deterministic() {
        let map = BeatMap::from_one_based(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let first = permute(&map, &mut fastrand::Rng::with_seed(3));
        let second = permute(&map, &mut fastrand::Rng::with_seed(3));
        assert_eq!(first, second);
    }

    #[test]
    fn short_maps_are_unchanged() {
        let mut rng = fastrand::Rng::with_seed(1);
        let single = BeatMap::from_one_based(&[3]);
        assert_eq!(permute(&single, &mut rng), single);
        let empty = BeatMap::new(Vec::new());
        assert!(permute(&empty, &mut rng).is_empty());
    }

    #[test]
    fn serialises_entries_in_camel_case() {
        let mut log = ShuffleLog::new();
        log.push(ShuffleLogEntry {
            cumulative_bytes: 0,
            bar_index: 0,
            cumulative_beat_index: 0,
            cumulative_seconds: 0.0,
            map_snapshot: vec![2, 1],
        });

        let json = log.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["cumulativeBytes"], 0);
        assert_eq!(first["mapSnapshot"], serde_json::json!([2, 1]));
    }

    #[test]
    fn sidecar_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("out/mix.wav")),
            PathBuf::from("out/mix.wav.script.json")
        );
    }
}
