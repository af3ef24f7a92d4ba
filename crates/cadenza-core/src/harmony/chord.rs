//! Chord construction and voicing

use std::fmt;

use serde::{Deserialize, Serialize};

use super::theory::{ChordQuality, PitchClass};
use crate::note::clamp_pitch;

/// Octave chords are built in (C4 = 60)
pub const BASE_OCTAVE: i32 = 4;

/// Chord voicing types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Voicing {
    #[default]
    Close,     // Notes stacked in order
    Open,      // Second voice up an octave
    Drop2,     // 2nd voice from top dropped an octave
    Drop3,     // 3rd voice from top dropped an octave
    Drop2And4, // 2nd and 4th from top dropped an octave
    Spread,    // Each voice pushed up by a fourth per position
    Rootless,  // Root omitted
    Cluster,   // Everything folded into one octave
}

impl Voicing {
    pub const ALL: [Voicing; 8] = [
        Self::Close,
        Self::Open,
        Self::Drop2,
        Self::Drop3,
        Self::Drop2And4,
        Self::Spread,
        Self::Rootless,
        Self::Cluster,
    ];

    /// Reshape an interval-ordered note list. Chords with fewer than three
    /// notes come back untouched.
    pub fn apply(&self, mut notes: Vec<i32>) -> Vec<i32> {
        if notes.len() < 3 {
            return notes;
        }
        let len = notes.len();

        match self {
            Self::Close => {}
            Self::Open => notes[1] += 12,
            Self::Drop2 => notes[len - 2] -= 12,
            Self::Drop3 => notes[len - 3] -= 12,
            Self::Drop2And4 => {
                notes[len - 2] -= 12;
                if len >= 4 {
                    notes[len - 4] -= 12;
                }
            }
            Self::Spread => {
                for (i, note) in notes.iter_mut().enumerate() {
                    *note += i as i32 * 5;
                }
            }
            Self::Rootless => {
                notes.remove(0);
            }
            Self::Cluster => {
                let lowest = notes.iter().copied().min().unwrap_or_default();
                for note in notes.iter_mut() {
                    *note = lowest + (*note - lowest).rem_euclid(12);
                }
                notes.sort_unstable();
                notes.dedup();
            }
        }

        notes.sort_unstable();
        notes
    }
}

// ============================================================================
// Chord
// ============================================================================

/// A concrete chord: root, quality and the absolute pitches derived from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub voicing: Voicing,
    pub inversion: u8,
    pub(crate) notes: Vec<u8>,
}

impl Chord {
    /// Build a chord in the base octave with the given voicing
    pub fn build(root: PitchClass, quality: ChordQuality, voicing: Voicing) -> Self {
        let base = 12 + BASE_OCTAVE * 12 + root.value() as i32;
        let raw: Vec<i32> = quality.intervals().iter().map(|&i| base + i as i32).collect();
        let notes = voicing.apply(raw).into_iter().map(clamp_pitch).collect();

        Self {
            root,
            quality,
            voicing,
            inversion: 0,
            notes,
        }
    }

    /// Close-voiced chord
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self::build(root, quality, Voicing::Close)
    }

    /// Absolute MIDI pitches, lowest first for uninverted chords
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    /// Lowest sounding pitch
    pub fn bass(&self) -> Option<u8> {
        self.notes.first().copied()
    }

    /// Display name such as `Am7` or `C/E` when inverted
    pub fn name(&self) -> String {
        let mut name = format!("{}{}", self.root, self.quality.symbol());
        if self.inversion > 0 {
            if let Some(bass) = self.bass() {
                name.push('/');
                name.push_str(PitchClass::of_pitch(bass).name());
            }
        }
        name
    }

    pub fn transposed(&self, semitones: i32) -> Self {
        Self {
            root: self.root.transposed(semitones),
            notes: self.notes.iter().map(|&n| clamp_pitch(n as i32 + semitones)).collect(),
            ..self.clone()
        }
    }

    /// Move the lowest note up an octave `n` times
    pub fn inverted(&self, n: usize) -> Self {
        let mut chord = self.clone();
        if chord.notes.is_empty() {
            return chord;
        }
        let steps = n % chord.notes.len();
        for _ in 0..steps {
            let lowest = chord.notes.remove(0);
            chord.notes.push(clamp_pitch(lowest as i32 + 12));
        }
        chord.inversion = ((self.inversion as usize + steps) % chord.notes.len()) as u8;
        chord
    }

    /// Distinct pitch classes sounding in this chord
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let mut classes: Vec<PitchClass> = self.notes.iter().map(|&n| PitchClass::of_pitch(n)).collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    pub fn contains_pitch_class(&self, pc: PitchClass) -> bool {
        self.notes.iter().any(|&n| PitchClass::of_pitch(n) == pc)
    }

    /// Every chord tone between `octave_lo` and `octave_hi`, ascending
    pub fn tones_in_octaves(&self, octave_lo: u8, octave_hi: u8) -> Vec<u8> {
        let classes = self.pitch_classes();
        let mut tones = Vec::with_capacity(classes.len() * (octave_hi.saturating_sub(octave_lo) as usize + 1));
        for octave in octave_lo..=octave_hi {
            for pc in &classes {
                let pitch = 12 + octave as i32 * 12 + pc.value() as i32;
                if (0..=127).contains(&pitch) {
                    tones.push(pitch as u8);
                }
            }
        }
        tones.sort_unstable();
        tones
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c() -> PitchClass {
        PitchClass::C
    }

    #[test]
    fn test_c_major_close() {
        let chord = Chord::build(c(), ChordQuality::Major, Voicing::Close);
        assert_eq!(chord.notes(), &[60, 64, 67]);
        let pcs: Vec<u8> = chord.pitch_classes().iter().map(|p| p.value()).collect();
        assert_eq!(pcs, vec![0, 4, 7]);
        assert_eq!(chord.name(), "C");
    }

    #[test]
    fn test_build_is_deterministic() {
        for voicing in Voicing::ALL {
            let a = Chord::build(PitchClass::new(9), ChordQuality::Minor9, voicing);
            let b = Chord::build(PitchClass::new(9), ChordQuality::Minor9, voicing);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_voicings_on_seventh_chord() {
        let cmaj7 = |v| Chord::build(c(), ChordQuality::Major7, v).notes().to_vec();
        assert_eq!(cmaj7(Voicing::Open), vec![60, 67, 71, 76]);
        assert_eq!(cmaj7(Voicing::Drop2), vec![55, 60, 64, 71]);
        assert_eq!(cmaj7(Voicing::Drop3), vec![52, 60, 67, 71]);
        assert_eq!(cmaj7(Voicing::Drop2And4), vec![48, 55, 64, 71]);
        assert_eq!(cmaj7(Voicing::Spread), vec![60, 69, 77, 86]);
        assert_eq!(cmaj7(Voicing::Rootless), vec![64, 67, 71]);
    }

    #[test]
    fn test_cluster_folds_into_one_octave() {
        let chord = Chord::build(c(), ChordQuality::Major9, Voicing::Cluster);
        assert_eq!(chord.notes(), &[60, 62, 64, 67, 71]);
        assert!(chord.notes().iter().all(|&n| n < 72));
    }

    #[test]
    fn test_small_chords_untouched() {
        for voicing in Voicing::ALL {
            let power = Chord::build(c(), ChordQuality::Power, voicing);
            assert_eq!(power.notes(), &[60, 67]);
        }
    }

    #[test]
    fn test_inversion_naming() {
        let chord = Chord::new(c(), ChordQuality::Major).inverted(1);
        assert_eq!(chord.notes(), &[64, 67, 72]);
        assert_eq!(chord.inversion, 1);
        assert_eq!(chord.name(), "C/E");
        assert_eq!(chord.inverted(2).inversion, 0);
    }

    #[test]
    fn test_transpose_and_membership() {
        let d_minor = Chord::new(PitchClass::new(2), ChordQuality::Minor);
        let e_minor = d_minor.transposed(2);
        assert_eq!(e_minor.root, PitchClass::new(4));
        assert_eq!(e_minor.notes(), &[64, 67, 71]);
        assert!(e_minor.contains_pitch_class(PitchClass::new(11)));
        assert!(!e_minor.contains_pitch_class(PitchClass::C));
    }

    #[test]
    fn test_tones_in_octaves() {
        let chord = Chord::new(c(), ChordQuality::Major);
        assert_eq!(chord.tones_in_octaves(4, 5), vec![60, 64, 67, 72, 76, 79]);
    }
}
