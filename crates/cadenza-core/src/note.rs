//! Timed note events shared by the generators and the quantizer

use serde::{Deserialize, Serialize};

/// Per-note performance flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFlags {
    pub is_rest: bool,
    pub is_ghost: bool,
    pub has_slide: bool,
    pub is_accent: bool,
}

/// A single note event.
///
/// `start` and `duration` share one unit per sequence: generators emit
/// seconds, the quantizer works in beats. Use [`TimedNote::to_beats`] and
/// [`TimedNote::to_seconds`] to cross over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedNote {
    /// MIDI note number (0-127, 60 = middle C). Meaningless for rests.
    pub pitch: u8,
    /// Velocity (0-127)
    pub velocity: u8,
    pub start: f64,
    pub duration: f64,
    pub channel: u8,
    #[serde(default)]
    pub flags: NoteFlags,
}

impl TimedNote {
    pub fn new(pitch: u8, velocity: u8, start: f64, duration: f64) -> Self {
        Self {
            pitch: pitch.min(127),
            velocity: velocity.min(127),
            start,
            duration,
            channel: 0,
            flags: NoteFlags::default(),
        }
    }

    /// A silent placeholder that occupies time but carries no pitch
    pub fn rest(start: f64, duration: f64) -> Self {
        Self {
            pitch: 0,
            velocity: 0,
            start,
            duration,
            channel: 0,
            flags: NoteFlags { is_rest: true, ..Default::default() },
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel.min(15);
        self
    }

    pub fn is_rest(&self) -> bool {
        self.flags.is_rest
    }

    /// Sounding notes are everything that is not a rest
    pub fn is_sounding(&self) -> bool {
        !self.flags.is_rest
    }

    /// End position (start + duration)
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Convert a note timed in seconds to beats
    pub fn to_beats(mut self, bpm: f64) -> Self {
        let beats_per_second = clamp_bpm(bpm) / 60.0;
        self.start *= beats_per_second;
        self.duration *= beats_per_second;
        self
    }

    /// Convert a note timed in beats to seconds
    pub fn to_seconds(mut self, bpm: f64) -> Self {
        let seconds_per_beat = 60.0 / clamp_bpm(bpm);
        self.start *= seconds_per_beat;
        self.duration *= seconds_per_beat;
        self
    }
}

/// Slowest tempo accepted anywhere in the engine
pub const MIN_BPM: f64 = 20.0;
/// Fastest tempo accepted anywhere in the engine
pub const MAX_BPM: f64 = 400.0;

/// Clamp a tempo into the supported range. Non-finite input becomes 120.
pub fn clamp_bpm(bpm: f64) -> f64 {
    if !bpm.is_finite() {
        return 120.0;
    }
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Clamp an arbitrary integer pitch into the MIDI range
pub fn clamp_pitch(pitch: i32) -> u8 {
    pitch.clamp(0, 127) as u8
}

/// Convert a whole sequence from seconds to beats
pub fn notes_to_beats(notes: &[TimedNote], bpm: f64) -> Vec<TimedNote> {
    notes.iter().map(|n| n.to_beats(bpm)).collect()
}

/// Convert a whole sequence from beats to seconds
pub fn notes_to_seconds(notes: &[TimedNote], bpm: f64) -> Vec<TimedNote> {
    notes.iter().map(|n| n.to_seconds(bpm)).collect()
}

/// Stable sort by start time
pub fn sort_by_start(notes: &mut [TimedNote]) {
    notes.sort_by(|a, b| a.start.total_cmp(&b.start));
}
