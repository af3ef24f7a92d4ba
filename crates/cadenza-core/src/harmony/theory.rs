//! Pitch classes, scales and chord qualities

use std::fmt;

use serde::{Deserialize, Serialize};

pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

// ============================================================================
// Pitch Class / Key
// ============================================================================

/// A note name modulo the octave (0 = C, 11 = B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Wraps any integer into 0..12
    pub fn new(value: i32) -> Self {
        Self(value.rem_euclid(12) as u8)
    }

    pub fn of_pitch(pitch: u8) -> Self {
        Self(pitch % 12)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn transposed(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones)
    }

    /// Upward distance in semitones from `self` to `other` (0..12)
    pub fn interval_to(self, other: PitchClass) -> u8 {
        (other.0 + 12 - self.0) % 12
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.0 as usize]
    }

    /// Parse a note name such as `C`, `F#`, `Bb` or `c#`
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let base = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let mut offset = 0;
        for c in chars {
            match c {
                '#' | '♯' => offset += 1,
                'b' | '♭' => offset -= 1,
                _ => return None,
            }
        }
        Some(Self::new(base + offset))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tonal center paired with a scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub root: PitchClass,
    pub scale: Scale,
}

impl Key {
    pub fn new(root: PitchClass, scale: Scale) -> Self {
        Self { root, scale }
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::new(PitchClass::C, Scale::Major)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.scale.name())
    }
}

// ============================================================================
// Scales
// ============================================================================

/// Scale/mode types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scale {
    #[default]
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
    WholeTone,
    Chromatic,
    Diminished,
    Augmented,
    Spanish,
    Gypsy,
    Arabic,
    Persian,
}

impl Scale {
    pub const ALL: [Scale; 20] = [
        Self::Major,
        Self::NaturalMinor,
        Self::HarmonicMinor,
        Self::MelodicMinor,
        Self::Dorian,
        Self::Phrygian,
        Self::Lydian,
        Self::Mixolydian,
        Self::Locrian,
        Self::MajorPentatonic,
        Self::MinorPentatonic,
        Self::Blues,
        Self::WholeTone,
        Self::Chromatic,
        Self::Diminished,
        Self::Augmented,
        Self::Spanish,
        Self::Gypsy,
        Self::Arabic,
        Self::Persian,
    ];

    /// Get scale intervals (semitones from root)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Self::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Self::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Self::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Self::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Self::MajorPentatonic => &[0, 2, 4, 7, 9],
            Self::MinorPentatonic => &[0, 3, 5, 7, 10],
            Self::Blues => &[0, 3, 5, 6, 7, 10],
            Self::WholeTone => &[0, 2, 4, 6, 8, 10],
            Self::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Self::Diminished => &[0, 2, 3, 5, 6, 8, 9, 11],
            Self::Augmented => &[0, 3, 4, 7, 8, 11],
            Self::Spanish => &[0, 1, 4, 5, 7, 8, 10],
            Self::Gypsy => &[0, 2, 3, 6, 7, 8, 11],
            Self::Arabic => &[0, 1, 4, 5, 7, 8, 11],
            Self::Persian => &[0, 1, 4, 5, 6, 8, 11],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::NaturalMinor => "Natural Minor",
            Self::HarmonicMinor => "Harmonic Minor",
            Self::MelodicMinor => "Melodic Minor",
            Self::Dorian => "Dorian",
            Self::Phrygian => "Phrygian",
            Self::Lydian => "Lydian",
            Self::Mixolydian => "Mixolydian",
            Self::Locrian => "Locrian",
            Self::MajorPentatonic => "Major Pentatonic",
            Self::MinorPentatonic => "Minor Pentatonic",
            Self::Blues => "Blues",
            Self::WholeTone => "Whole Tone",
            Self::Chromatic => "Chromatic",
            Self::Diminished => "Diminished",
            Self::Augmented => "Augmented",
            Self::Spanish => "Spanish",
            Self::Gypsy => "Gypsy",
            Self::Arabic => "Arabic",
            Self::Persian => "Persian",
        }
    }

    /// Case-, space- and dash-insensitive lookup. `minor` and `aeolian`
    /// resolve to the natural minor scale.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(name);
        match key.as_str() {
            "minor" | "aeolian" => return Some(Self::NaturalMinor),
            "ionian" => return Some(Self::Major),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|s| normalize_identifier(s.name()) == key || normalize_identifier(&format!("{s:?}")) == key)
    }

    /// Lookup that falls back to [`Scale::Major`] for unknown names
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown scale, falling back to Major");
            Self::Major
        })
    }

    /// Whether a pitch class belongs to this scale rooted at `root`
    pub fn contains(&self, root: PitchClass, pc: PitchClass) -> bool {
        self.intervals().contains(&root.interval_to(pc))
    }

    pub fn is_heptatonic(&self) -> bool {
        self.intervals().len() == 7
    }
}

// ============================================================================
// Chord Qualities
// ============================================================================

/// Chord quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Dominant7,
    Major7,
    Minor7,
    MinorMajor7,
    Diminished7,
    HalfDiminished7,
    Augmented7,
    Major9,
    Minor9,
    Dominant9,
    Major11,
    Minor11,
    Dominant11,
    Major13,
    Minor13,
    Dominant13,
    Add9,
    Add11,
    Sixth,
    MinorSixth,
    SixNine,
    Altered,
    Power,
    Dominant7Flat9,
    Dominant7Sharp9,
    Dominant7Sus4,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 32] = [
        Self::Major,
        Self::Minor,
        Self::Diminished,
        Self::Augmented,
        Self::Sus2,
        Self::Sus4,
        Self::Dominant7,
        Self::Major7,
        Self::Minor7,
        Self::MinorMajor7,
        Self::Diminished7,
        Self::HalfDiminished7,
        Self::Augmented7,
        Self::Major9,
        Self::Minor9,
        Self::Dominant9,
        Self::Major11,
        Self::Minor11,
        Self::Dominant11,
        Self::Major13,
        Self::Minor13,
        Self::Dominant13,
        Self::Add9,
        Self::Add11,
        Self::Sixth,
        Self::MinorSixth,
        Self::SixNine,
        Self::Altered,
        Self::Power,
        Self::Dominant7Flat9,
        Self::Dominant7Sharp9,
        Self::Dominant7Sus4,
    ];

    /// Get chord intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::MinorMajor7 => &[0, 3, 7, 11],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::Augmented7 => &[0, 4, 8, 10],
            Self::Major9 => &[0, 4, 7, 11, 14],
            Self::Minor9 => &[0, 3, 7, 10, 14],
            Self::Dominant9 => &[0, 4, 7, 10, 14],
            Self::Major11 => &[0, 4, 7, 11, 14, 17],
            Self::Minor11 => &[0, 3, 7, 10, 14, 17],
            Self::Dominant11 => &[0, 4, 7, 10, 14, 17],
            Self::Major13 => &[0, 4, 7, 11, 14, 21],
            Self::Minor13 => &[0, 3, 7, 10, 14, 21],
            Self::Dominant13 => &[0, 4, 7, 10, 14, 21],
            Self::Add9 => &[0, 4, 7, 14],
            Self::Add11 => &[0, 4, 7, 17],
            Self::Sixth => &[0, 4, 7, 9],
            Self::MinorSixth => &[0, 3, 7, 9],
            Self::SixNine => &[0, 4, 7, 9, 14],
            Self::Altered => &[0, 4, 8, 10, 13, 15],
            Self::Power => &[0, 7],
            Self::Dominant7Flat9 => &[0, 4, 7, 10, 13],
            Self::Dominant7Sharp9 => &[0, 4, 7, 10, 15],
            Self::Dominant7Sus4 => &[0, 5, 7, 10],
        }
    }

    /// Suffix appended to the root name, e.g. `m7` in `Dm7`
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Dominant7 => "7",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::MinorMajor7 => "m(maj7)",
            Self::Diminished7 => "dim7",
            Self::HalfDiminished7 => "m7b5",
            Self::Augmented7 => "7#5",
            Self::Major9 => "maj9",
            Self::Minor9 => "m9",
            Self::Dominant9 => "9",
            Self::Major11 => "maj11",
            Self::Minor11 => "m11",
            Self::Dominant11 => "11",
            Self::Major13 => "maj13",
            Self::Minor13 => "m13",
            Self::Dominant13 => "13",
            Self::Add9 => "add9",
            Self::Add11 => "add11",
            Self::Sixth => "6",
            Self::MinorSixth => "m6",
            Self::SixNine => "6/9",
            Self::Altered => "7alt",
            Self::Power => "5",
            Self::Dominant7Flat9 => "7b9",
            Self::Dominant7Sharp9 => "7#9",
            Self::Dominant7Sus4 => "7sus4",
        }
    }

    /// Lookup by variant name (`Minor7`, `minor 7`) or chord symbol (`m7`).
    /// Symbols are case-sensitive so `M7` and `m7` stay distinct.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if let Some(q) = Self::ALL.into_iter().find(|q| q.symbol() == trimmed && !trimmed.is_empty()) {
            return Some(q);
        }
        let key = normalize_identifier(trimmed);
        match key.as_str() {
            "maj" => return Some(Self::Major),
            "min" => return Some(Self::Minor),
            "dom7" => return Some(Self::Dominant7),
            _ => {}
        }
        Self::ALL.into_iter().find(|q| normalize_identifier(&format!("{q:?}")) == key)
    }

    /// Lookup that falls back to a major triad for unknown names
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown chord quality, falling back to Major");
            Self::Major
        })
    }
}

impl Default for ChordQuality {
    fn default() -> Self {
        Self::Major
    }
}

/// Lowercase and strip spaces, dashes and underscores
pub(crate) fn normalize_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Notes of a scale spanning `octave_min..=octave_max` (C4 = 60)
pub fn scale_notes(root: PitchClass, scale: Scale, octave_min: u8, octave_max: u8) -> Vec<u8> {
    let mut notes = Vec::with_capacity(scale.intervals().len() * (octave_max.saturating_sub(octave_min) as usize + 1));
    for octave in octave_min..=octave_max {
        for &interval in scale.intervals() {
            let pitch = 12 + octave as i32 * 12 + root.value() as i32 + interval as i32;
            if (0..=127).contains(&pitch) {
                notes.push(pitch as u8);
            }
        }
    }
    notes
}

/// Snap a pitch to the nearest scale tone. When equidistant the lower
/// scale degree wins.
pub fn quantize_to_scale(pitch: u8, root: PitchClass, scale: Scale) -> u8 {
    let relative = root.interval_to(PitchClass::of_pitch(pitch)) as i32;

    let mut best = 0i32;
    let mut best_dist = i32::MAX;
    for &interval in scale.intervals() {
        let interval = interval as i32;
        // Signed shortest distance around the octave
        let mut delta = interval - relative;
        if delta > 6 {
            delta -= 12;
        } else if delta < -6 {
            delta += 12;
        }
        if delta.abs() < best_dist || (delta.abs() == best_dist && delta < best) {
            best_dist = delta.abs();
            best = delta;
        }
    }
    crate::note::clamp_pitch(pitch as i32 + best)
}
