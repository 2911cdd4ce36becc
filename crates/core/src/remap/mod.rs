use std::fmt;

use crate::shuffle::permute;

/// Playback order applied to the beats of every bar.
///
/// Entries are zero-based indices into the beats collected for a bar. They
/// may repeat or skip beats, and an entry with no matching beat (including a
/// negative one, produced by a blank or zero config value) is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatMap(Vec<i64>);

impl BeatMap {
    pub fn new(indices: Vec<i64>) -> Self {
        Self(indices)
    }

    /// Builds a map from 1-based configuration values.
    pub fn from_one_based(values: &[i32]) -> Self {
        Self(values.iter().map(|&value| i64::from(value) - 1).collect())
    }

    pub fn indices(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 1-based values, in the form accepted by [`BeatMap::from_one_based`].
    pub fn to_one_based(&self) -> Vec<i64> {
        self.0.iter().map(|index| index + 1).collect()
    }

    fn beat<'a>(&self, position: usize, beats: &[&'a [u8]]) -> Option<&'a [u8]> {
        let index = usize::try_from(self.0[position]).ok()?;
        beats.get(index).copied()
    }
}

impl Default for BeatMap {
    fn default() -> Self {
        Self::from_one_based(&[1, 4, 3, 2])
    }
}

impl fmt::Display for BeatMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self
            .to_one_based()
            .iter()
            .map(|value| value.to_string())
            .collect();
        f.write_str(&values.join(","))
    }
}

/// Beats collected for the bar currently being scanned.
#[derive(Debug)]
pub struct Bar<'a> {
    beats: Vec<&'a [u8]>,
    beats_per_bar: usize,
}

impl<'a> Bar<'a> {
    pub fn new(beats_per_bar: usize) -> Self {
        Self {
            beats: Vec::with_capacity(beats_per_bar),
            beats_per_bar,
        }
    }

    /// Adds a beat and reports whether the bar is now full.
    pub fn push(&mut self, beat: &'a [u8]) -> bool {
        self.beats.push(beat);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.beats.len() >= self.beats_per_bar
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn beats(&self) -> &[&'a [u8]] {
        &self.beats
    }

    pub fn clear(&mut self) {
        self.beats.clear();
    }
}

/// How the map evolves from one bar to the next.
#[derive(Debug)]
pub enum RemapMode {
    /// The configured map is used unchanged for every bar.
    Static,
    /// The map is reshuffled before each bar, starting from the previous
    /// bar's permutation.
    Shuffled(fastrand::Rng),
}

/// Reorders the beats of each bar according to the current map.
#[derive(Debug)]
pub struct BarRemapper {
    current: BeatMap,
    mode: RemapMode,
}

impl BarRemapper {
    pub fn new(map: BeatMap, mode: RemapMode) -> Self {
        Self { current: map, mode }
    }

    pub fn is_shuffling(&self) -> bool {
        matches!(self.mode, RemapMode::Shuffled(_))
    }

    /// Appends the bar's beats to `output` in map order and clears the bar.
    ///
    /// Returns the map that was applied.
    pub fn remap_bar(&mut self, bar: &mut Bar<'_>, output: &mut Vec<u8>) -> &BeatMap {
        if let RemapMode::Shuffled(rng) = &mut self.mode {
            self.current = permute(&self.current, rng);
        }

        for position in 0..self.current.len() {
            if let Some(beat) = self.current.beat(position, bar.beats()) {
                output.extend_from_slice(beat);
            }
        }

        bar.clear();
        &self.current
    }
}
