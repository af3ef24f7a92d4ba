//! Harmony engine: theory tables, chords, progressions, key detection

mod chord;
mod key_detect;
mod progression;
mod suggest;
pub mod theory;
mod voice_leading;

pub use chord::{BASE_OCTAVE, Chord, Voicing};
pub use key_detect::{detect_key, detect_scale, pitch_class_histogram};
pub use progression::{
    Progression, ProgressionTemplate, TEMPLATES, diatonic_chords, diatonic_quality, popular_progressions,
    templates_for_genre,
};
pub use suggest::{MAX_SUGGESTIONS, generate_progression, suggest_next, transition_score};
pub use theory::{ChordQuality, Key, NOTE_NAMES, PitchClass, Scale, quantize_to_scale, scale_notes};
pub use voice_leading::{optimize_voice_leading, voice_leading_distance};
