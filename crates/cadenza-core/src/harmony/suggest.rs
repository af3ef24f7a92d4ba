//! Chord-transition scoring and progression generation

use super::chord::Chord;
use super::progression::{Progression, diatonic_chords};
use super::theory::{PitchClass, Scale};
use super::voice_leading::optimize_voice_leading;
use crate::random::RandomSource;

/// Number of suggestions returned by [`suggest_next`]
pub const MAX_SUGGESTIONS: usize = 5;
/// Interior chords are picked among this many top suggestions
const VARIETY_POOL: usize = 3;

/// Transition weight for a root movement.
///
/// Keyed on the upward semitone distance between the two roots: a fifth
/// down (up a fourth) scores highest, then a fourth down.
pub fn transition_score(from: &Chord, to: &Chord) -> f32 {
    match from.root.interval_to(to.root) {
        5 => 1.0,
        7 => 0.9,
        2 => 0.7,
        9 => 0.6,
        4 => 0.5,
        0 => 0.3,
        _ => 0.4,
    }
}

/// Up to five diatonic chords ranked by transition score. Ties keep scale
/// degree order.
pub fn suggest_next(current: &Chord, scale: Scale, key: PitchClass) -> Vec<Chord> {
    let mut scored: Vec<(f32, Chord)> = diatonic_chords(key, scale)
        .into_iter()
        .map(|chord| (transition_score(current, &chord), chord))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, chord)| chord).collect()
}

/// Build a progression of `count` chords starting on the tonic.
///
/// Interior chords are drawn from the top three suggestions, the last chord
/// takes the top suggestion, and every chord is then re-voiced for minimal
/// motion from its predecessor.
pub fn generate_progression(
    key: PitchClass,
    scale: Scale,
    genre: &str,
    count: usize,
    rng: &mut impl RandomSource,
) -> Progression {
    let mut progression = Progression::new(key, scale, "Generated", genre);
    if count == 0 {
        return progression;
    }

    let Some(tonic) = diatonic_chords(key, scale).into_iter().next() else {
        return progression;
    };
    progression.chords.push(tonic);

    for i in 1..count {
        let Some(previous) = progression.chords.last() else {
            break;
        };
        let suggestions = suggest_next(previous, scale, key);
        if suggestions.is_empty() {
            break;
        }
        let index = if i == count - 1 {
            0
        } else {
            rng.below(suggestions.len().min(VARIETY_POOL))
        };
        progression.chords.push(suggestions[index].clone());
    }

    for i in 1..progression.chords.len() {
        let optimized = optimize_voice_leading(&progression.chords[i - 1], &progression.chords[i]);
        progression.chords[i] = optimized;
    }

    tracing::debug!(
        key = %key,
        scale = scale.name(),
        genre,
        chords = %progression.chord_names(),
        "Generated progression"
    );
    progression
}
