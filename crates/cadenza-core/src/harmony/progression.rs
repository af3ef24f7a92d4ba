//! Diatonic chords, progression templates and the progression container

use serde::{Deserialize, Serialize};

use super::chord::Chord;
use super::theory::{ChordQuality, Key, PitchClass, Scale};
use crate::note::{TimedNote, clamp_bpm};

/// Ordered chords in a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub chords: Vec<Chord>,
    pub key: PitchClass,
    pub scale: Scale,
    pub name: String,
    pub genre: String,
}

impl Progression {
    pub fn new(key: PitchClass, scale: Scale, name: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            chords: Vec::new(),
            key,
            scale,
            name: name.into(),
            genre: genre.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Whether every chord root lies inside the progression's scale
    pub fn is_diatonic(&self) -> bool {
        self.chords.iter().all(|c| self.scale.contains(self.key, c.root))
    }

    /// Move every chord so the progression sits in `key`
    pub fn transposed_to(&self, key: PitchClass) -> Self {
        let semitones = key.value() as i32 - self.key.value() as i32;
        Self {
            chords: self.chords.iter().map(|c| c.transposed(semitones)).collect(),
            key,
            ..self.clone()
        }
    }

    /// Block-chord note events in seconds, one chord every `beats_per_chord`
    pub fn to_notes(&self, beats_per_chord: f64, bpm: f64) -> Vec<TimedNote> {
        let seconds_per_chord = beats_per_chord.max(0.0) * 60.0 / clamp_bpm(bpm);
        let mut notes = Vec::with_capacity(self.chords.iter().map(|c| c.notes().len()).sum());
        for (i, chord) in self.chords.iter().enumerate() {
            let start = i as f64 * seconds_per_chord;
            for &pitch in chord.notes() {
                notes.push(TimedNote::new(pitch, 100, start, seconds_per_chord));
            }
        }
        notes
    }

    /// Chord names joined with dashes, e.g. `C - G - Am - F`
    pub fn chord_names(&self) -> String {
        self.chords.iter().map(Chord::name).collect::<Vec<_>>().join(" - ")
    }
}

// ============================================================================
// Diatonic Chords
// ============================================================================

/// Triad quality for a scale degree.
///
/// Major and natural minor use fixed tables. Other seven-note scales stack
/// thirds inside the scale. Anything else gets a major triad.
pub fn diatonic_quality(scale: Scale, degree: usize) -> ChordQuality {
    match scale {
        Scale::Major => match degree % 7 {
            0 | 3 | 4 => ChordQuality::Major,
            1 | 2 | 5 => ChordQuality::Minor,
            _ => ChordQuality::Diminished,
        },
        Scale::NaturalMinor => match degree % 7 {
            0 | 3 | 4 => ChordQuality::Minor,
            2 | 5 | 6 => ChordQuality::Major,
            _ => ChordQuality::Diminished,
        },
        s if s.is_heptatonic() => stacked_triad(s.intervals(), degree % 7),
        _ => ChordQuality::Major,
    }
}

fn stacked_triad(intervals: &[u8], degree: usize) -> ChordQuality {
    let len = intervals.len();
    let above = |steps: usize| {
        let idx = degree + steps;
        let wrap = if idx >= len { 12 } else { 0 };
        intervals[idx % len] as i32 + wrap - intervals[degree] as i32
    };
    match (above(2), above(4)) {
        (4, 7) => ChordQuality::Major,
        (3, 7) => ChordQuality::Minor,
        (3, 6) => ChordQuality::Diminished,
        (4, 8) => ChordQuality::Augmented,
        _ => ChordQuality::Major,
    }
}

/// One close-voiced chord per scale degree
pub fn diatonic_chords(key: PitchClass, scale: Scale) -> Vec<Chord> {
    scale
        .intervals()
        .iter()
        .enumerate()
        .map(|(degree, &interval)| {
            let root = key.transposed(interval as i32);
            Chord::new(root, diatonic_quality(scale, degree))
        })
        .collect()
}

// ============================================================================
// Templates
// ============================================================================

/// A named progression expressed as (scale degree, quality) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionTemplate {
    pub name: &'static str,
    pub genre: &'static str,
    /// Zero-based scale degree and chord quality
    pub steps: &'static [(u8, ChordQuality)],
}

use ChordQuality as Q;

pub static TEMPLATES: [ProgressionTemplate; 13] = [
    ProgressionTemplate {
        name: "I-V-vi-IV (Axis of Awesome)",
        genre: "Pop",
        steps: &[(0, Q::Major), (4, Q::Major), (5, Q::Minor), (3, Q::Major)],
    },
    ProgressionTemplate {
        name: "vi-IV-I-V (Sensitive)",
        genre: "Pop",
        steps: &[(5, Q::Minor), (3, Q::Major), (0, Q::Major), (4, Q::Major)],
    },
    ProgressionTemplate {
        name: "I-IV-V (50s Progression)",
        genre: "Rock",
        steps: &[(0, Q::Major), (3, Q::Major), (4, Q::Major)],
    },
    ProgressionTemplate {
        name: "I-vi-IV-V (Doo-Wop)",
        genre: "Pop",
        steps: &[(0, Q::Major), (5, Q::Minor), (3, Q::Major), (4, Q::Major)],
    },
    ProgressionTemplate {
        name: "I-V-vi-iii-IV-I-IV-V (Canon)",
        genre: "Classical",
        steps: &[
            (0, Q::Major),
            (4, Q::Major),
            (5, Q::Minor),
            (2, Q::Minor),
            (3, Q::Major),
            (0, Q::Major),
            (3, Q::Major),
            (4, Q::Major),
        ],
    },
    ProgressionTemplate {
        name: "ii-V-I (Jazz Standard)",
        genre: "Jazz",
        steps: &[(1, Q::Minor7), (4, Q::Dominant7), (0, Q::Major7)],
    },
    ProgressionTemplate {
        name: "I-IV-ii-V (Coltrane Changes)",
        genre: "Jazz",
        steps: &[(0, Q::Major7), (3, Q::Major7), (1, Q::Minor7), (4, Q::Dominant7)],
    },
    ProgressionTemplate {
        name: "IVmaj7-iii7-vi7-ii7-V7 (Autumn Leaves)",
        genre: "Jazz",
        steps: &[(3, Q::Major7), (2, Q::Minor7), (5, Q::Minor7), (1, Q::Minor7), (4, Q::Dominant7)],
    },
    ProgressionTemplate {
        name: "i-VI-III-VII (Aeolian)",
        genre: "EDM",
        steps: &[(0, Q::Minor), (5, Q::Major), (2, Q::Major), (6, Q::Major)],
    },
    ProgressionTemplate {
        name: "i-III-VII-VI (Minor Pop)",
        genre: "EDM",
        steps: &[(0, Q::Minor), (2, Q::Major), (6, Q::Major), (5, Q::Major)],
    },
    ProgressionTemplate {
        name: "i-v-VI-III (Dark EDM)",
        genre: "EDM",
        steps: &[(0, Q::Minor), (4, Q::Minor), (5, Q::Major), (2, Q::Major)],
    },
    ProgressionTemplate {
        name: "I7-IV7-V7 (12-Bar Blues)",
        genre: "Blues",
        steps: &[(0, Q::Dominant7), (3, Q::Dominant7), (4, Q::Dominant7)],
    },
    ProgressionTemplate {
        name: "I-IV-I-V7-I (Gospel Turnaround)",
        genre: "Gospel",
        steps: &[(0, Q::Major7), (3, Q::Major7), (0, Q::Major7), (4, Q::Dominant7), (0, Q::Major7)],
    },
];

impl ProgressionTemplate {
    /// Substitute concrete roots. Degrees outside the scale are skipped.
    pub fn instantiate(&self, key: PitchClass, scale: Scale) -> Progression {
        let intervals = scale.intervals();
        let mut progression = Progression::new(key, scale, self.name, self.genre);
        progression.chords = self
            .steps
            .iter()
            .filter_map(|&(degree, quality)| {
                let interval = intervals.get(degree as usize)?;
                Some(Chord::new(key.transposed(*interval as i32), quality))
            })
            .collect();
        progression
    }

    /// Lookup by exact name or by the roman-numeral prefix (`ii-V-I`)
    pub fn by_name(name: &str) -> Option<&'static ProgressionTemplate> {
        let wanted = name.trim();
        TEMPLATES.iter().find(|t| {
            t.name.eq_ignore_ascii_case(wanted)
                || t.name.split_whitespace().next().is_some_and(|prefix| prefix == wanted)
        })
    }
}

/// Every template instantiated in the given key
pub fn popular_progressions(key: Key) -> Vec<Progression> {
    TEMPLATES.iter().map(|t| t.instantiate(key.root, key.scale)).collect()
}

/// Templates tagged with a genre (case-insensitive)
pub fn templates_for_genre(genre: &str) -> Vec<&'static ProgressionTemplate> {
    TEMPLATES.iter().filter(|t| t.genre.eq_ignore_ascii_case(genre.trim())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diatonic_major() {
        let chords = diatonic_chords(PitchClass::C, Scale::Major);
        assert_eq!(chords.len(), 7);
        let qualities: Vec<_> = chords.iter().map(|c| c.quality).collect();
        assert_eq!(
            qualities,
            vec![Q::Major, Q::Minor, Q::Minor, Q::Major, Q::Major, Q::Minor, Q::Diminished]
        );
        let names: Vec<_> = chords.iter().map(Chord::name).collect();
        assert_eq!(names, vec!["C", "Dm", "Em", "F", "G", "Am", "Bdim"]);
    }

    #[test]
    fn test_diatonic_natural_minor() {
        let qualities: Vec<_> = diatonic_chords(PitchClass::new(9), Scale::NaturalMinor)
            .iter()
            .map(|c| c.quality)
            .collect();
        assert_eq!(
            qualities,
            vec![Q::Minor, Q::Diminished, Q::Major, Q::Minor, Q::Minor, Q::Major, Q::Major]
        );
    }

    #[test]
    fn test_stacked_thirds_for_modes() {
        // Harmonic minor: i ii° III+ iv V VI vii°
        let qualities: Vec<_> = (0..7).map(|d| diatonic_quality(Scale::HarmonicMinor, d)).collect();
        assert_eq!(
            qualities,
            vec![Q::Minor, Q::Diminished, Q::Augmented, Q::Minor, Q::Major, Q::Major, Q::Diminished]
        );
        // Dorian: i ii III IV v vi° VII
        assert_eq!(diatonic_quality(Scale::Dorian, 3), Q::Major);
        assert_eq!(diatonic_quality(Scale::Dorian, 5), Q::Diminished);
    }

    #[test]
    fn test_non_heptatonic_falls_back_to_major() {
        let chords = diatonic_chords(PitchClass::C, Scale::MinorPentatonic);
        assert_eq!(chords.len(), 5);
        assert!(chords.iter().all(|c| c.quality == Q::Major));
    }

    #[test]
    fn test_instantiate_axis() {
        let prog = TEMPLATES[0].instantiate(PitchClass::C, Scale::Major);
        assert_eq!(prog.chord_names(), "C - G - Am - F");
        assert_eq!(prog.genre, "Pop");
        assert!(prog.is_diatonic());
    }

    #[test]
    fn test_instantiate_skips_missing_degrees() {
        let prog = TEMPLATES[4].instantiate(PitchClass::C, Scale::MajorPentatonic);
        // Canon uses degree 5 (vi) which the pentatonic scale lacks
        assert_eq!(prog.len(), 7);
    }

    #[test]
    fn test_template_lookup() {
        assert_eq!(templates_for_genre("jazz").len(), 3);
        assert_eq!(templates_for_genre("EDM").len(), 3);
        assert!(templates_for_genre("Polka").is_empty());
        assert_eq!(ProgressionTemplate::by_name("ii-V-I").map(|t| t.genre), Some("Jazz"));
        assert_eq!(popular_progressions(Key::default()).len(), 13);
    }

    #[test]
    fn test_transpose_progression() {
        let prog = TEMPLATES[0].instantiate(PitchClass::C, Scale::Major);
        let in_g = prog.transposed_to(PitchClass::new(7));
        assert_eq!(in_g.chord_names(), "G - D - Em - C");
        assert_eq!(in_g.key, PitchClass::new(7));
        assert!(in_g.is_diatonic());
    }

    #[test]
    fn test_to_notes() {
        let prog = TEMPLATES[2].instantiate(PitchClass::C, Scale::Major);
        let notes = prog.to_notes(4.0, 120.0);
        assert_eq!(notes.len(), 9);
        assert_eq!(notes[3].start, 2.0);
        assert_eq!(notes[3].duration, 2.0);
        assert_eq!(notes[3].pitch, 65);
    }
}
