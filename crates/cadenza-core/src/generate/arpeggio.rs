//! Arpeggio generation: chord tones stacked into a pool, then reordered

use serde::{Deserialize, Serialize};

use super::{RhythmPattern, StepClock};
use crate::harmony::theory::normalize_identifier;
use crate::harmony::{Chord, Progression};
use crate::note::TimedNote;
use crate::random::RandomSource;

/// Arpeggio ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArpPattern {
    #[default]
    Up,
    Down,
    UpDownInclusive,
    UpDownExclusive,
    DownUp,
    Random,
    PingPong,
    Converge,
    Diverge,
    RandomWalk,
    /// All pool notes at once
    Chord,
}

impl ArpPattern {
    pub const ALL: [ArpPattern; 11] = [
        Self::Up,
        Self::Down,
        Self::UpDownInclusive,
        Self::UpDownExclusive,
        Self::DownUp,
        Self::Random,
        Self::PingPong,
        Self::Converge,
        Self::Diverge,
        Self::RandomWalk,
        Self::Chord,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(name);
        match key.as_str() {
            "updown" => return Some(Self::UpDownExclusive),
            "asplayed" | "order" => return Some(Self::Up),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|p| normalize_identifier(&format!("{p:?}")) == key)
    }

    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown arpeggio pattern, falling back to Up");
            Self::Up
        })
    }
}

/// Arpeggio generator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpStyle {
    pub pattern: ArpPattern,
    pub rhythm: RhythmPattern,
    /// Octaves the pool spans (1-4)
    pub octaves: u8,
    /// Fraction of each step the note holds (0.1-1.0)
    pub gate: f64,
    pub velocity: u8,
}

impl Default for ArpStyle {
    fn default() -> Self {
        Self {
            pattern: ArpPattern::Up,
            rhythm: RhythmPattern::Sixteenths,
            octaves: 1,
            gate: 0.8,
            velocity: 100,
        }
    }
}

impl ArpStyle {
    pub fn new(pattern: ArpPattern) -> Self {
        Self {
            pattern,
            ..Self::default()
        }
    }
}

/// Chord tones stacked over `octaves` octaves, ascending and deduplicated
pub fn build_pool(chord: &Chord, octaves: u8) -> Vec<u8> {
    let octaves = octaves.clamp(1, 4);
    let mut pool: Vec<u8> = (0..octaves)
        .flat_map(|o| chord.notes().iter().map(move |&n| n as u16 + o as u16 * 12))
        .filter(|&p| p <= 127)
        .map(|p| p as u8)
        .collect();
    pool.sort_unstable();
    pool.dedup();
    pool
}

/// Reorder a pool according to `pattern`. The pool is expected ascending.
pub fn arrange(pool: &[u8], pattern: ArpPattern, rng: &mut impl RandomSource) -> Vec<u8> {
    let len = pool.len();
    if len == 0 {
        return Vec::new();
    }

    match pattern {
        ArpPattern::Up | ArpPattern::Chord => pool.to_vec(),
        ArpPattern::Down => pool.iter().rev().copied().collect(),
        ArpPattern::UpDownInclusive => pool.iter().chain(pool.iter().rev()).copied().collect(),
        ArpPattern::UpDownExclusive => {
            let mut seq = pool.to_vec();
            if len > 2 {
                seq.extend(pool[1..len - 1].iter().rev());
            }
            seq
        }
        ArpPattern::DownUp => {
            let mut seq: Vec<u8> = pool.iter().rev().copied().collect();
            if len > 2 {
                seq.extend(&pool[1..len - 1]);
            }
            seq
        }
        ArpPattern::PingPong => {
            if len == 1 {
                return pool.to_vec();
            }
            pool[1..].iter().flat_map(|&n| [pool[0], n]).collect()
        }
        ArpPattern::Converge => converge(pool),
        ArpPattern::Diverge => {
            let mut seq = converge(pool);
            seq.reverse();
            seq
        }
        ArpPattern::Random => {
            let mut seq = pool.to_vec();
            // Fisher-Yates shuffle
            for i in (1..len).rev() {
                let j = rng.below(i + 1);
                seq.swap(i, j);
            }
            seq
        }
        ArpPattern::RandomWalk => {
            let mut idx = rng.below(len);
            let mut seq = Vec::with_capacity(len);
            for _ in 0..len {
                seq.push(pool[idx]);
                idx = if rng.chance(0.5) {
                    (idx + 1).min(len - 1)
                } else {
                    idx.saturating_sub(1)
                };
            }
            seq
        }
    }
}

/// Alternate between the outer edges, working inward
fn converge(pool: &[u8]) -> Vec<u8> {
    let mut seq = Vec::with_capacity(pool.len());
    let (mut lo, mut hi) = (0, pool.len() - 1);
    while lo <= hi {
        seq.push(pool[lo]);
        if lo != hi {
            seq.push(pool[hi]);
        }
        lo += 1;
        if hi == 0 {
            break;
        }
        hi -= 1;
    }
    seq
}

/// Generate an arpeggio over a progression, in seconds
pub fn generate_arpeggio(
    progression: &Progression,
    style: &ArpStyle,
    bars: u32,
    bpm: f64,
    rng: &mut impl RandomSource,
) -> Vec<TimedNote> {
    let gate = style.gate.clamp(0.1, 1.0);
    let velocity = style.velocity.min(127);

    let mut notes = Vec::new();
    let mut current_chord = None;
    let mut sequence: Vec<u8> = Vec::new();
    let mut cursor = 0;

    for step in StepClock::new(style.rhythm, bars, bpm, progression.len()) {
        if current_chord != Some(step.chord_index) {
            current_chord = Some(step.chord_index);
            let pool = build_pool(&progression.chords[step.chord_index], style.octaves);
            sequence = arrange(&pool, style.pattern, rng);
            cursor = 0;
        }
        if sequence.is_empty() {
            continue;
        }

        let duration = step.duration * gate;
        if style.pattern == ArpPattern::Chord {
            for &pitch in &sequence {
                let mut note = TimedNote::new(pitch, velocity, step.start, duration);
                note.flags.is_accent = step.is_downbeat();
                notes.push(note);
            }
        } else {
            let pitch = sequence[cursor % sequence.len()];
            cursor += 1;
            let mut note = TimedNote::new(pitch, velocity, step.start, duration);
            note.flags.is_accent = step.is_downbeat();
            notes.push(note);
        }
    }

    tracing::debug!(notes = notes.len(), pattern = ?style.pattern, octaves = style.octaves, "Generated arpeggio");
    notes
}
