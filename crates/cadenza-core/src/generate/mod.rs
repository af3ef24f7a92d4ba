//! Sequence generators: melody, bassline and arpeggio
//!
//! Every generator walks the same step clock: wall-clock time from zero to
//! `bars * 4` beats, in steps taken from a [`RhythmPattern`] table and cycled.
//! The step's chord is `floor(t / (total / chords))`. Output is in seconds.

mod arpeggio;
mod bassline;
mod humanize;
mod melody;
pub mod transform;

use serde::{Deserialize, Serialize};

use crate::harmony::theory::normalize_identifier;
use crate::note::clamp_bpm;

pub use arpeggio::{ArpPattern, ArpStyle, arrange, build_pool, generate_arpeggio};
pub use bassline::{BassPattern, BassStyle, generate_bassline};
pub use humanize::humanize;
pub use melody::{MelodicContour, MelodyStyle, generate_melody};

pub const BEATS_PER_BAR: f64 = 4.0;

const EPSILON: f64 = 1e-9;

// ============================================================================
// Rhythm Patterns
// ============================================================================

const THIRD: f64 = 1.0 / 3.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;

const STRAIGHT: [f64; 4] = [1.0; 4];
const EIGHTHS: [f64; 8] = [0.5; 8];
const SIXTEENTHS: [f64; 16] = [0.25; 16];
const TRIPLETS: [f64; 6] = [THIRD; 6];
const SWING_EIGHTHS: [f64; 8] = [TWO_THIRDS, THIRD, TWO_THIRDS, THIRD, TWO_THIRDS, THIRD, TWO_THIRDS, THIRD];
const SYNCOPATED: [f64; 5] = [0.5, 1.0, 0.5, 1.0, 0.5];
const DOTTED: [f64; 4] = [1.5, 0.5, 1.0, 1.0];
const MIXED: [f64; 7] = [1.0, 0.5, 0.5, 1.0, 0.5, 0.5, 1.0];
const FUNK_16TH: [f64; 12] = [0.25, 0.25, 0.5, 0.25, 0.5, 0.25, 0.25, 0.5, 0.25, 0.25, 0.5, 0.25];

/// Step-duration tables, in beats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RhythmPattern {
    #[default]
    Straight,
    EighthNotes,
    Sixteenths,
    Triplets,
    SwingEighths,
    Syncopated,
    Dotted,
    Mixed,
    Funk16th,
}

impl RhythmPattern {
    pub const ALL: [RhythmPattern; 9] = [
        Self::Straight,
        Self::EighthNotes,
        Self::Sixteenths,
        Self::Triplets,
        Self::SwingEighths,
        Self::Syncopated,
        Self::Dotted,
        Self::Mixed,
        Self::Funk16th,
    ];

    pub fn step_beats(&self) -> &'static [f64] {
        match self {
            Self::Straight => &STRAIGHT,
            Self::EighthNotes => &EIGHTHS,
            Self::Sixteenths => &SIXTEENTHS,
            Self::Triplets => &TRIPLETS,
            Self::SwingEighths => &SWING_EIGHTHS,
            Self::Syncopated => &SYNCOPATED,
            Self::Dotted => &DOTTED,
            Self::Mixed => &MIXED,
            Self::Funk16th => &FUNK_16TH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Straight => "Straight",
            Self::EighthNotes => "Eighth Notes",
            Self::Sixteenths => "Sixteenths",
            Self::Triplets => "Triplets",
            Self::SwingEighths => "Swing Eighths",
            Self::Syncopated => "Syncopated",
            Self::Dotted => "Dotted",
            Self::Mixed => "Mixed",
            Self::Funk16th => "Funk 16th",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(name);
        Self::ALL.into_iter().find(|r| normalize_identifier(r.name()) == key)
    }

    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown rhythm pattern, falling back to Straight");
            Self::Straight
        })
    }
}

// ============================================================================
// Step Clock
// ============================================================================

/// One step of the generator clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Step number from zero
    pub index: usize,
    /// Start in seconds
    pub start: f64,
    /// Duration in seconds, trimmed at the end of the phrase
    pub duration: f64,
    /// Start in beats
    pub beat: f64,
    /// Index of the chord sounding at `start`
    pub chord_index: usize,
}

impl Step {
    /// Starts on the first beat of a bar
    pub fn is_downbeat(&self) -> bool {
        on_grid(self.beat, BEATS_PER_BAR)
    }

    /// Starts on any beat
    pub fn is_on_beat(&self) -> bool {
        on_grid(self.beat, 1.0)
    }
}

fn on_grid(position: f64, grid: f64) -> bool {
    let r = position.rem_euclid(grid);
    r < 1e-6 || grid - r < 1e-6
}

/// Iterator over the steps of a phrase
#[derive(Debug, Clone)]
pub struct StepClock {
    beats: &'static [f64],
    seconds_per_beat: f64,
    total: f64,
    chord_span: f64,
    chord_count: usize,
    time: f64,
    index: usize,
}

impl StepClock {
    pub fn new(rhythm: RhythmPattern, bars: u32, bpm: f64, chord_count: usize) -> Self {
        let seconds_per_beat = 60.0 / clamp_bpm(bpm);
        let total = if chord_count == 0 {
            0.0
        } else {
            bars as f64 * BEATS_PER_BAR * seconds_per_beat
        };
        Self {
            beats: rhythm.step_beats(),
            seconds_per_beat,
            total,
            chord_span: total / chord_count.max(1) as f64,
            chord_count,
            time: 0.0,
            index: 0,
        }
    }

    /// Phrase length in seconds
    pub fn total_seconds(&self) -> f64 {
        self.total
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.seconds_per_beat
    }
}

impl Iterator for StepClock {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.time >= self.total - EPSILON || self.beats.is_empty() {
            return None;
        }
        let start = self.time;
        let full = self.beats[self.index % self.beats.len()] * self.seconds_per_beat;
        let duration = full.min(self.total - start);
        let chord_index = ((start / self.chord_span + EPSILON).floor() as usize).min(self.chord_count - 1);

        let step = Step {
            index: self.index,
            start,
            duration,
            beat: start / self.seconds_per_beat,
            chord_index,
        };
        self.time += full;
        self.index += 1;
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_cover_whole_bars() {
        for rhythm in RhythmPattern::ALL {
            let sum: f64 = rhythm.step_beats().iter().sum();
            assert!(sum > 0.0, "{rhythm:?}");
        }
        assert_eq!(RhythmPattern::Straight.step_beats().iter().sum::<f64>(), 4.0);
        assert_eq!(RhythmPattern::Funk16th.step_beats().iter().sum::<f64>(), 4.0);
    }

    #[test]
    fn test_straight_clock() {
        let steps: Vec<Step> = StepClock::new(RhythmPattern::Straight, 4, 120.0, 4).collect();
        assert_eq!(steps.len(), 16);
        assert_eq!(steps[4].start, 2.0);
        assert_eq!(steps[4].chord_index, 1);
        assert!(steps[4].is_downbeat());
        assert!(steps[5].is_on_beat());
        assert!(!steps[5].is_downbeat());
        assert_eq!(steps[15].chord_index, 3);
    }

    #[test]
    fn test_last_step_trimmed() {
        // Syncopated cycles every 3.5 beats, so the 12th step starts at 7.5
        let steps: Vec<Step> = StepClock::new(RhythmPattern::Syncopated, 2, 60.0, 1).collect();
        let end = steps.last().map(|s| s.start + s.duration).unwrap_or_default();
        assert!((end - 8.0).abs() < 1e-9);
        assert_eq!(steps.len(), 12);
        assert_eq!(steps[11].start, 7.5);
        assert_eq!(steps[11].duration, 0.5);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(StepClock::new(RhythmPattern::Straight, 0, 120.0, 4).count(), 0);
        assert_eq!(StepClock::new(RhythmPattern::Straight, 4, 120.0, 0).count(), 0);
    }

    #[test]
    fn test_bpm_clamped() {
        let clock = StepClock::new(RhythmPattern::Straight, 1, -5.0, 1);
        assert_eq!(clock.seconds_per_beat(), 3.0);
    }

    #[test]
    fn test_rhythm_lookup() {
        assert_eq!(RhythmPattern::from_name("swing eighths"), Some(RhythmPattern::SwingEighths));
        assert_eq!(RhythmPattern::from_name("funk16th"), Some(RhythmPattern::Funk16th));
        assert_eq!(RhythmPattern::from_name_or_default("polka"), RhythmPattern::Straight);
    }
}
