//! Bassline generation with ghost-note and slide post-passes

use serde::{Deserialize, Serialize};

use super::{RhythmPattern, StepClock};
use crate::harmony::theory::normalize_identifier;
use crate::harmony::{Chord, Progression};
use crate::note::{TimedNote, clamp_bpm, clamp_pitch};
use crate::random::RandomSource;

/// Lowest root the walk will anchor on (E1)
const BASS_LOW: i32 = 28;
/// Highest root the walk will anchor on (E3)
const BASS_HIGH: i32 = 52;
/// First chord sits in octave 2
const FIRST_OCTAVE_BASE: i32 = 36;

const DOWNBEAT_VELOCITY: u8 = 110;
const BEAT_VELOCITY: u8 = 100;
const OFFBEAT_VELOCITY: u8 = 85;

/// Which chord tones the bass cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BassPattern {
    RootOnly,
    #[default]
    RootFifth,
    RootOctave,
    ChordTones,
}

impl BassPattern {
    pub const ALL: [BassPattern; 4] = [Self::RootOnly, Self::RootFifth, Self::RootOctave, Self::ChordTones];

    /// Semitone offsets above the anchored root, cycled within a chord
    pub fn offsets<'a>(&self, chord: &'a Chord) -> &'a [u8] {
        match self {
            Self::RootOnly => &[0],
            Self::RootFifth => &[0, 7],
            Self::RootOctave => &[0, 12],
            Self::ChordTones => chord.quality.intervals(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(name);
        Self::ALL
            .into_iter()
            .find(|p| normalize_identifier(&format!("{p:?}")) == key)
    }

    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown bass pattern, falling back to RootFifth");
            Self::RootFifth
        })
    }
}

/// Bassline generator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BassStyle {
    pub pattern: BassPattern,
    pub rhythm: RhythmPattern,
    pub rest_probability: f32,
    /// Chance of a ghost note before each real note
    pub ghost_probability: f32,
    /// Flag small intervals as slides
    pub slides: bool,
}

impl Default for BassStyle {
    fn default() -> Self {
        Self::new(BassPattern::RootFifth, RhythmPattern::Straight)
    }
}

impl BassStyle {
    /// Style with the groove defaults for `rhythm`
    pub fn new(pattern: BassPattern, rhythm: RhythmPattern) -> Self {
        let (ghost_probability, slides) = match rhythm {
            RhythmPattern::Funk16th => (0.35, true),
            RhythmPattern::Syncopated => (0.2, true),
            RhythmPattern::SwingEighths => (0.0, true),
            _ => (0.0, false),
        };
        Self {
            pattern,
            rhythm,
            rest_probability: 0.0,
            ghost_probability,
            slides,
        }
    }
}

/// Generate a bassline over a progression, in seconds
pub fn generate_bassline(
    progression: &Progression,
    style: &BassStyle,
    bars: u32,
    bpm: f64,
    rng: &mut impl RandomSource,
) -> Vec<TimedNote> {
    let clock = StepClock::new(style.rhythm, bars, bpm, progression.len());
    let rest_probability = style.rest_probability.clamp(0.0, 1.0);

    let mut notes = Vec::new();
    let mut current_chord = None;
    let mut anchor = 0;
    let mut cycle = 0;
    let mut previous_pitch: Option<i32> = None;

    for step in clock {
        let chord = &progression.chords[step.chord_index];
        if current_chord != Some(step.chord_index) {
            current_chord = Some(step.chord_index);
            anchor = anchor_root(chord, previous_pitch);
            cycle = 0;
        }

        let offsets = style.pattern.offsets(chord);
        let offset = offsets.get(cycle % offsets.len().max(1)).copied().unwrap_or(0);
        cycle += 1;

        if rng.chance(rest_probability) {
            notes.push(TimedNote::rest(step.start, step.duration));
            continue;
        }

        let pitch = anchor + offset as i32;
        let velocity = if step.is_downbeat() {
            DOWNBEAT_VELOCITY
        } else if step.is_on_beat() {
            BEAT_VELOCITY
        } else {
            OFFBEAT_VELOCITY
        };

        let mut note = TimedNote::new(clamp_pitch(pitch), velocity, step.start, step.duration);
        note.flags.is_accent = step.is_downbeat();
        notes.push(note);
        previous_pitch = Some(pitch);
    }

    let sixteenth = 15.0 / clamp_bpm(bpm);
    let mut notes = add_ghost_notes(notes, style.ghost_probability.clamp(0.0, 1.0), sixteenth, rng);
    if style.slides {
        mark_slides(&mut notes);
    }

    tracing::debug!(
        notes = notes.len(),
        pattern = ?style.pattern,
        rhythm = style.rhythm.name(),
        "Generated bassline"
    );
    notes
}

/// Root pitch in the bass register nearest the previous note. Ties go low.
fn anchor_root(chord: &Chord, previous: Option<i32>) -> i32 {
    let pc = chord.root.value() as i32;
    let Some(previous) = previous else {
        return FIRST_OCTAVE_BASE + pc;
    };

    (0..=10)
        .map(|octave| octave * 12 + pc)
        .filter(|p| (BASS_LOW..=BASS_HIGH).contains(p))
        .min_by_key(|p| (p - previous).abs())
        .unwrap_or(FIRST_OCTAVE_BASE + pc)
}

/// Insert a quiet sixteenth before selected notes, trimming whatever was
/// sounding before it
fn add_ghost_notes(
    notes: Vec<TimedNote>,
    probability: f32,
    sixteenth: f64,
    rng: &mut impl RandomSource,
) -> Vec<TimedNote> {
    if probability <= 0.0 {
        return notes;
    }

    let mut out: Vec<TimedNote> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        if note.is_sounding() && rng.chance(probability) {
            let ghost_start = note.start - sixteenth;
            let room = match out.last() {
                Some(prev) => prev.start < ghost_start - 1e-9,
                None => ghost_start >= -1e-9,
            };
            if room {
                if let Some(prev) = out.last_mut() {
                    prev.duration = prev.duration.min(ghost_start - prev.start);
                }
                let velocity = 30 + rng.below(16) as u8;
                let mut ghost = TimedNote::new(note.pitch, velocity, ghost_start.max(0.0), sixteenth);
                ghost.flags.is_ghost = true;
                out.push(ghost);
            }
        }
        out.push(note);
    }
    out
}

/// Flag notes whose next sounding note is one to five semitones away
fn mark_slides(notes: &mut [TimedNote]) {
    let sounding: Vec<usize> = (0..notes.len()).filter(|&i| notes[i].is_sounding()).collect();
    for pair in sounding.windows(2) {
        let interval = (notes[pair[1]].pitch as i32 - notes[pair[0]].pitch as i32).abs();
        if (1..=5).contains(&interval) {
            notes[pair[0]].flags.has_slide = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::{PitchClass, Scale, TEMPLATES, generate_progression};
    use crate::random::seeded;

    fn axis() -> Progression {
        TEMPLATES[0].instantiate(PitchClass::C, Scale::Major)
    }

    #[test]
    fn test_root_fifth_scenario() {
        let mut rng = seeded(42);
        let prog = generate_progression(PitchClass::C, Scale::Major, "Pop", 4, &mut rng);
        let style = BassStyle::new(BassPattern::RootFifth, RhythmPattern::Straight);
        let notes = generate_bassline(&prog, &style, 4, 120.0, &mut rng);
        assert_eq!(notes.len(), 16);
        assert!(notes.iter().all(|n| n.is_sounding()));
        assert_eq!(notes[0].pitch, 36);
        assert_eq!(notes[1].pitch, 43);
        assert_eq!(notes[0].velocity, 110);
        assert_eq!(notes[1].velocity, 100);
    }

    #[test]
    fn test_nearest_root_anchoring() {
        // C G Am F: each root lands in the octave closest to the last note
        let style = BassStyle::new(BassPattern::RootOnly, RhythmPattern::Straight);
        let notes = generate_bassline(&axis(), &style, 4, 120.0, &mut seeded(0));
        let roots: Vec<u8> = notes.iter().step_by(4).map(|n| n.pitch).collect();
        assert_eq!(roots, vec![36, 31, 33, 29]);

        // After a fifth on 43 the G stays up
        let style = BassStyle::new(BassPattern::RootFifth, RhythmPattern::Straight);
        let notes = generate_bassline(&axis(), &style, 4, 120.0, &mut seeded(0));
        assert_eq!(notes[4].pitch, 43);
    }

    #[test]
    fn test_chord_tones_cycle_within_chord() {
        let style = BassStyle::new(BassPattern::ChordTones, RhythmPattern::Straight);
        let notes = generate_bassline(&axis(), &style, 4, 120.0, &mut seeded(0));
        let first_bar: Vec<u8> = notes[..4].iter().map(|n| n.pitch).collect();
        assert_eq!(first_bar, vec![36, 40, 43, 36]);
    }

    #[test]
    fn test_offbeat_velocity() {
        let style = BassStyle::new(BassPattern::RootOnly, RhythmPattern::EighthNotes);
        let notes = generate_bassline(&axis(), &style, 1, 120.0, &mut seeded(0));
        assert_eq!(notes[0].velocity, 110);
        assert_eq!(notes[1].velocity, 85);
        assert_eq!(notes[2].velocity, 100);
    }

    #[test]
    fn test_ghost_notes() {
        let mut style = BassStyle::new(BassPattern::RootOnly, RhythmPattern::Straight);
        style.ghost_probability = 1.0;
        let notes = generate_bassline(&axis(), &style, 1, 120.0, &mut seeded(0));
        // No room before the first note, one ghost before each of the other three
        assert_eq!(notes.len(), 7);
        let ghosts: Vec<&TimedNote> = notes.iter().filter(|n| n.flags.is_ghost).collect();
        assert_eq!(ghosts.len(), 3);
        for ghost in ghosts {
            assert!((30..=45).contains(&ghost.velocity));
            assert!((ghost.duration - 0.125).abs() < 1e-9);
        }
        // The note before a ghost is trimmed so nothing overlaps
        for pair in notes.windows(2) {
            assert!(pair[0].end() <= pair[1].start + 1e-9);
        }
    }

    #[test]
    fn test_slides() {
        let mut style = BassStyle::new(BassPattern::RootOnly, RhythmPattern::Straight);
        style.slides = true;
        let notes = generate_bassline(&axis(), &style, 4, 120.0, &mut seeded(0));
        // Roots 36 31 33 29: repeats are not slides, every chord change is
        assert!(!notes[0].flags.has_slide);
        assert!(notes[3].flags.has_slide);
        assert!(notes[7].flags.has_slide);
        assert!(notes[11].flags.has_slide);
        assert!(!notes[15].flags.has_slide);
    }

    #[test]
    fn test_groove_defaults() {
        assert_eq!(BassStyle::new(BassPattern::RootOnly, RhythmPattern::Funk16th).ghost_probability, 0.35);
        assert!(BassStyle::new(BassPattern::RootOnly, RhythmPattern::SwingEighths).slides);
        assert!(!BassStyle::default().slides);
        assert_eq!(BassStyle::default().rest_probability, 0.0);
    }

    #[test]
    fn test_determinism() {
        let style = BassStyle::new(BassPattern::ChordTones, RhythmPattern::Funk16th);
        let a = generate_bassline(&axis(), &style, 4, 96.0, &mut seeded(8));
        let b = generate_bassline(&axis(), &style, 4, 96.0, &mut seeded(8));
        assert_eq!(a, b);
    }
}
