//! Contour-driven melody generation

use serde::{Deserialize, Serialize};

use super::{RhythmPattern, StepClock};
use crate::harmony::theory::normalize_identifier;
use crate::harmony::{Chord, PitchClass, Progression, scale_notes};
use crate::note::TimedNote;
use crate::random::RandomSource;

/// Shape the pitch walk follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MelodicContour {
    Ascending,
    Descending,
    Arch,
    Valley,
    Zigzag,
    Stepwise,
    LeapFriendly,
    #[default]
    Random,
}

impl MelodicContour {
    pub const ALL: [MelodicContour; 8] = [
        Self::Ascending,
        Self::Descending,
        Self::Arch,
        Self::Valley,
        Self::Zigzag,
        Self::Stepwise,
        Self::LeapFriendly,
        Self::Random,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(name);
        Self::ALL
            .into_iter()
            .find(|c| normalize_identifier(&format!("{c:?}")) == key)
    }

    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown contour, falling back to Random");
            Self::Random
        })
    }
}

/// Melody generator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyStyle {
    pub rhythm: RhythmPattern,
    pub contour: MelodicContour,
    /// Largest leap from the previous pitch, in semitones (1-24)
    pub max_interval: u8,
    /// Per-step chance of a rest
    pub rest_probability: f32,
    /// Chance of snapping a step to a chord tone
    pub chord_tone_weight: f32,
}

impl Default for MelodyStyle {
    fn default() -> Self {
        Self {
            rhythm: RhythmPattern::Mixed,
            contour: MelodicContour::Random,
            max_interval: 7,
            rest_probability: 0.1,
            chord_tone_weight: 0.6,
        }
    }
}

impl MelodyStyle {
    /// Preset for a genre name. Unknown genres get the default style.
    pub fn for_genre(genre: &str) -> Self {
        let base = Self::default();
        match normalize_identifier(genre).as_str() {
            "pop" => Self {
                rhythm: RhythmPattern::Syncopated,
                contour: MelodicContour::Arch,
                max_interval: 7,
                rest_probability: 0.15,
                ..base
            },
            "jazz" => Self {
                rhythm: RhythmPattern::SwingEighths,
                contour: MelodicContour::LeapFriendly,
                max_interval: 12,
                rest_probability: 0.1,
                ..base
            },
            "classical" => Self {
                rhythm: RhythmPattern::Mixed,
                contour: MelodicContour::Stepwise,
                max_interval: 4,
                rest_probability: 0.12,
                ..base
            },
            "edm" => Self {
                rhythm: RhythmPattern::Sixteenths,
                contour: MelodicContour::Ascending,
                max_interval: 12,
                rest_probability: 0.05,
                ..base
            },
            "hiphop" => Self {
                rhythm: RhythmPattern::Syncopated,
                contour: MelodicContour::Random,
                max_interval: 7,
                rest_probability: 0.25,
                ..base
            },
            _ => base,
        }
    }

    /// Copy with every numeric field in range
    pub fn clamped(&self) -> Self {
        Self {
            max_interval: self.max_interval.clamp(1, 24),
            rest_probability: clamp_unit(self.rest_probability),
            chord_tone_weight: clamp_unit(self.chord_tone_weight),
            ..self.clone()
        }
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Generate a melody over a progression, in seconds
pub fn generate_melody(
    progression: &Progression,
    style: &MelodyStyle,
    bars: u32,
    bpm: f64,
    rng: &mut impl RandomSource,
) -> Vec<TimedNote> {
    let style = style.clamped();
    let steps: Vec<_> = StepClock::new(style.rhythm, bars, bpm, progression.len()).collect();
    let pool = scale_notes(progression.key, progression.scale, 4, 6);
    if steps.is_empty() || pool.is_empty() {
        return Vec::new();
    }

    let mut walker = ContourWalker {
        pool: &pool,
        index: pool.len() / 2,
        position: 0,
        turn: steps.len() / 2,
        max_interval: style.max_interval as i32,
    };

    let mut notes = Vec::with_capacity(steps.len());
    for step in &steps {
        if rng.chance(style.rest_probability) {
            notes.push(TimedNote::rest(step.start, step.duration));
            continue;
        }

        let chord = &progression.chords[step.chord_index];
        let pitch = walker.next_pitch(style.contour, chord, style.chord_tone_weight, rng);
        let velocity = (80.0 + rng.next_f32() * 40.0) as u8;

        let mut note = TimedNote::new(pitch, velocity, step.start, step.duration);
        note.flags.is_accent = step.is_downbeat();
        notes.push(note);
    }

    tracing::debug!(
        notes = notes.len(),
        contour = ?style.contour,
        rhythm = style.rhythm.name(),
        "Generated melody"
    );
    notes
}

// ============================================================================
// Contour Walk
// ============================================================================

/// Walks an index into the scale-tone pool. Every emitted pitch comes from
/// the pool, so the index always tracks the previous pitch exactly.
struct ContourWalker<'a> {
    pool: &'a [u8],
    index: usize,
    position: usize,
    turn: usize,
    max_interval: i32,
}

impl ContourWalker<'_> {
    fn previous(&self) -> i32 {
        self.pool[self.index] as i32
    }

    fn up(&self) -> usize {
        (self.index + 1).min(self.pool.len() - 1)
    }

    fn down(&self) -> usize {
        self.index.saturating_sub(1)
    }

    fn within_reach(&self, idx: usize) -> bool {
        (self.pool[idx] as i32 - self.previous()).abs() <= self.max_interval
    }

    fn next_pitch(
        &mut self,
        contour: MelodicContour,
        chord: &Chord,
        chord_tone_weight: f32,
        rng: &mut impl RandomSource,
    ) -> u8 {
        let position = self.position;
        self.position += 1;

        let target = match contour {
            MelodicContour::Random => {
                self.index = self.free_choice(chord, chord_tone_weight, rng);
                return self.pool[self.index];
            }
            MelodicContour::Ascending => self.up(),
            MelodicContour::Descending => self.down(),
            MelodicContour::Arch if position < self.turn => self.up(),
            MelodicContour::Arch => self.down(),
            MelodicContour::Valley if position < self.turn => self.down(),
            MelodicContour::Valley => self.up(),
            MelodicContour::Zigzag if position % 2 == 0 => self.up(),
            MelodicContour::Zigzag => self.down(),
            MelodicContour::Stepwise => {
                if rng.chance(0.5) {
                    self.up()
                } else {
                    self.down()
                }
            }
            MelodicContour::LeapFriendly => {
                let mut leap = ((rng.next_f32() - 0.5) * 10.0) as i32;
                let last = self.pool.len() as i32 - 1;
                loop {
                    let idx = (self.index as i32 + leap).clamp(0, last) as usize;
                    if leap == 0 || self.within_reach(idx) {
                        break idx;
                    }
                    leap -= leap.signum();
                }
            }
        };
        let target = if self.within_reach(target) { target } else { self.index };

        if rng.chance(chord_tone_weight) {
            if let Some(idx) = self.chord_tone_toward(chord, target) {
                self.index = idx;
                return self.pool[idx];
            }
        }
        self.index = target;
        self.pool[target]
    }

    /// Chord tone nearest the contour target that moves the same way the
    /// contour does and stays within reach
    fn chord_tone_toward(&self, chord: &Chord, target: usize) -> Option<usize> {
        let direction = target.cmp(&self.index);
        let target_pitch = self.pool[target] as i32;

        (0..self.pool.len())
            .filter(|&i| i.cmp(&self.index) == direction)
            .filter(|&i| self.within_reach(i))
            .filter(|&i| chord.contains_pitch_class(PitchClass::of_pitch(self.pool[i])))
            .min_by_key(|&i| (self.pool[i] as i32 - target_pitch).abs())
    }

    /// Unconstrained pick: the chord tone closest to the previous pitch, or a
    /// random scale tone within reach
    fn free_choice(&self, chord: &Chord, chord_tone_weight: f32, rng: &mut impl RandomSource) -> usize {
        let previous = self.previous();
        if rng.chance(chord_tone_weight) {
            let closest = (0..self.pool.len())
                .filter(|&i| self.within_reach(i))
                .filter(|&i| chord.contains_pitch_class(PitchClass::of_pitch(self.pool[i])))
                .min_by_key(|&i| (self.pool[i] as i32 - previous).abs());
            if let Some(idx) = closest {
                return idx;
            }
        }

        let candidates: Vec<usize> = (0..self.pool.len()).filter(|&i| self.within_reach(i)).collect();
        if candidates.is_empty() {
            return self.index;
        }
        candidates[rng.below(candidates.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::{Scale, TEMPLATES};
    use crate::random::seeded;

    fn axis() -> Progression {
        TEMPLATES[0].instantiate(PitchClass::C, Scale::Major)
    }

    fn style(contour: MelodicContour) -> MelodyStyle {
        MelodyStyle {
            rhythm: RhythmPattern::EighthNotes,
            contour,
            rest_probability: 0.0,
            ..MelodyStyle::default()
        }
    }

    fn sounding(notes: &[TimedNote]) -> Vec<u8> {
        notes.iter().filter(|n| n.is_sounding()).map(|n| n.pitch).collect()
    }

    #[test]
    fn test_determinism_with_seed() {
        let s = MelodyStyle::for_genre("Pop");
        let a = generate_melody(&axis(), &s, 4, 110.0, &mut seeded(9));
        let b = generate_melody(&axis(), &s, 4, 110.0, &mut seeded(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_ascending_never_falls() {
        for seed in 0..8 {
            let notes = generate_melody(&axis(), &style(MelodicContour::Ascending), 4, 120.0, &mut seeded(seed));
            let pitches = sounding(&notes);
            assert_eq!(pitches.len(), 32);
            assert!(pitches.windows(2).all(|w| w[0] <= w[1]), "{pitches:?}");
        }
    }

    #[test]
    fn test_descending_never_rises() {
        for seed in 0..8 {
            let notes = generate_melody(&axis(), &style(MelodicContour::Descending), 4, 120.0, &mut seeded(seed));
            let pitches = sounding(&notes);
            assert!(pitches.windows(2).all(|w| w[0] >= w[1]), "{pitches:?}");
        }
    }

    #[test]
    fn test_arch_peaks_in_middle() {
        let mut s = style(MelodicContour::Arch);
        s.chord_tone_weight = 0.0;
        let notes = generate_melody(&axis(), &s, 2, 120.0, &mut seeded(1));
        let pitches = sounding(&notes);
        let half = pitches.len() / 2;
        assert!(pitches[..half].windows(2).all(|w| w[0] <= w[1]));
        assert!(pitches[half..].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_max_interval_respected() {
        for contour in MelodicContour::ALL {
            let mut s = style(contour);
            s.max_interval = 3;
            let notes = generate_melody(&axis(), &s, 4, 120.0, &mut seeded(4));
            let pitches = sounding(&notes);
            assert!(
                pitches.windows(2).all(|w| (w[0] as i32 - w[1] as i32).abs() <= 3),
                "{contour:?} {pitches:?}"
            );
        }
    }

    #[test]
    fn test_pitches_stay_in_scale() {
        let notes = generate_melody(&axis(), &MelodyStyle::for_genre("Jazz"), 8, 140.0, &mut seeded(2));
        assert!(
            notes
                .iter()
                .filter(|n| n.is_sounding())
                .all(|n| Scale::Major.contains(PitchClass::C, PitchClass::of_pitch(n.pitch)))
        );
    }

    #[test]
    fn test_rests_and_velocity() {
        let mut s = style(MelodicContour::Random);
        s.rest_probability = 1.0;
        let notes = generate_melody(&axis(), &s, 1, 120.0, &mut seeded(3));
        assert_eq!(notes.len(), 8);
        assert!(notes.iter().all(|n| n.is_rest()));

        s.rest_probability = 0.0;
        let notes = generate_melody(&axis(), &s, 1, 120.0, &mut seeded(3));
        assert!(notes.iter().all(|n| (80..120).contains(&n.velocity)));
        assert!(notes[0].flags.is_accent);
        assert!(!notes[1].flags.is_accent);
    }

    #[test]
    fn test_empty_progression() {
        let empty = Progression::new(PitchClass::C, Scale::Major, "", "");
        assert!(generate_melody(&empty, &MelodyStyle::default(), 4, 120.0, &mut seeded(0)).is_empty());
        assert!(generate_melody(&axis(), &MelodyStyle::default(), 0, 120.0, &mut seeded(0)).is_empty());
    }

    #[test]
    fn test_genre_presets() {
        assert_eq!(MelodyStyle::for_genre("Classical").max_interval, 4);
        assert_eq!(MelodyStyle::for_genre("Hip-Hop").rest_probability, 0.25);
        assert_eq!(MelodyStyle::for_genre("EDM").rhythm, RhythmPattern::Sixteenths);
        assert_eq!(MelodyStyle::for_genre("zydeco"), MelodyStyle::default());
    }
}
