//! cadenza-core: procedural composition engine
//!
//! Harmony (scales, chords, progressions, key detection), sequence
//! generators (melody, bassline, arpeggio) and the quantization & groove
//! engine. Pure computation: no I/O, no shared state.

mod error;
pub mod generate;
pub mod harmony;
mod note;
pub mod quantize;
mod random;
pub mod style;

pub use error::{CadenzaError, Result};
pub use generate::{
    ArpPattern, ArpStyle, BassPattern, BassStyle, MelodicContour, MelodyStyle, RhythmPattern, generate_arpeggio,
    generate_bassline, generate_melody, humanize,
};
pub use harmony::{
    Chord, ChordQuality, Key, PitchClass, Progression, Scale, Voicing, detect_key, diatonic_chords,
    generate_progression,
};
pub use note::{
    MAX_BPM, MIN_BPM, NoteFlags, TimedNote, clamp_bpm, clamp_pitch, notes_to_beats, notes_to_seconds, sort_by_start,
};
pub use quantize::{GridValue, GrooveTemplate, QuantizationSettings, QuantizeMode, quantize};
pub use random::{RandomSource, seeded};
pub use style::{StyleCatalog, StylePreset};
