//! Phrase transformations: transposition, inversion, retrograde, sequencing,
//! time scaling and swing

use crate::note::{TimedNote, clamp_bpm, clamp_pitch};

/// Shift every sounding pitch, clamped to the MIDI range
pub fn transpose(notes: &[TimedNote], semitones: i32) -> Vec<TimedNote> {
    notes
        .iter()
        .map(|&n| {
            let mut n = n;
            if n.is_sounding() {
                n.pitch = clamp_pitch(n.pitch as i32 + semitones);
            }
            n
        })
        .collect()
}

/// Mirror pitches around the first sounding note (or middle C)
pub fn invert(notes: &[TimedNote]) -> Vec<TimedNote> {
    let axis = notes
        .iter()
        .find(|n| n.is_sounding())
        .map(|n| n.pitch as i32)
        .unwrap_or(60);

    notes
        .iter()
        .map(|&n| {
            let mut n = n;
            if n.is_sounding() {
                n.pitch = clamp_pitch(2 * axis - n.pitch as i32);
            }
            n
        })
        .collect()
}

/// Reverse the order and lay the notes end to end from zero
pub fn retrograde(notes: &[TimedNote]) -> Vec<TimedNote> {
    let mut time = 0.0;
    notes
        .iter()
        .rev()
        .map(|&n| {
            let mut n = n;
            n.start = time;
            time += n.duration;
            n
        })
        .collect()
}

/// Repeat a phrase, each copy shifted by the phrase length and transposed
/// by `step` semitones more than the last
pub fn sequence(notes: &[TimedNote], repetitions: usize, step: i32) -> Vec<TimedNote> {
    let length = notes.iter().map(TimedNote::end).fold(0.0, f64::max);
    let mut out = Vec::with_capacity(notes.len() * repetitions);
    for rep in 0..repetitions {
        let shift = rep as f64 * length;
        for note in transpose(notes, rep as i32 * step) {
            out.push(TimedNote {
                start: note.start + shift,
                ..note
            });
        }
    }
    out
}

/// Multiply every start and duration by `factor`. Non-positive or
/// non-finite factors leave the phrase unchanged.
pub fn scale_time(notes: &[TimedNote], factor: f64) -> Vec<TimedNote> {
    if !factor.is_finite() || factor <= 0.0 {
        return notes.to_vec();
    }
    notes
        .iter()
        .map(|&n| TimedNote {
            start: n.start * factor,
            duration: n.duration * factor,
            ..n
        })
        .collect()
}

/// Stretch by `factor` (augmentation)
pub fn augment(notes: &[TimedNote], factor: f64) -> Vec<TimedNote> {
    scale_time(notes, factor)
}

/// Compress by `factor` (diminution)
pub fn diminish(notes: &[TimedNote], factor: f64) -> Vec<TimedNote> {
    if !factor.is_finite() || factor <= 0.0 {
        return notes.to_vec();
    }
    scale_time(notes, 1.0 / factor)
}

/// Delay notes on the second eighth of each beat by up to a triplet
/// (`amount` 0-1). Notes are timed in seconds.
pub fn apply_swing(notes: &[TimedNote], amount: f32, bpm: f64) -> Vec<TimedNote> {
    let amount = amount.clamp(0.0, 1.0) as f64;
    let eighth = 30.0 / clamp_bpm(bpm);

    notes
        .iter()
        .map(|&n| {
            let mut n = n;
            let position = (n.start / eighth).rem_euclid(2.0);
            if position > 0.9 && position < 1.1 {
                n.start += eighth * amount * 0.33;
            }
            n
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase() -> Vec<TimedNote> {
        vec![
            TimedNote::new(60, 100, 0.0, 0.5),
            TimedNote::new(64, 100, 0.5, 0.5),
            TimedNote::rest(1.0, 0.5),
            TimedNote::new(67, 100, 1.5, 1.0),
        ]
    }

    fn pitches(notes: &[TimedNote]) -> Vec<u8> {
        notes.iter().map(|n| n.pitch).collect()
    }

    #[test]
    fn test_transpose_skips_rests() {
        let out = transpose(&phrase(), 5);
        assert_eq!(pitches(&out), vec![65, 69, 0, 72]);
        assert_eq!(pitches(&transpose(&phrase(), 100)), vec![127, 127, 0, 127]);
    }

    #[test]
    fn test_invert_around_first_note() {
        assert_eq!(pitches(&invert(&phrase())), vec![60, 56, 0, 53]);
    }

    #[test]
    fn test_retrograde_restarts_contiguously() {
        let out = retrograde(&phrase());
        assert_eq!(pitches(&out), vec![67, 0, 64, 60]);
        let starts: Vec<f64> = out.iter().map(|n| n.start).collect();
        assert_eq!(starts, vec![0.0, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_sequence() {
        let out = sequence(&phrase(), 3, 2);
        assert_eq!(out.len(), 12);
        assert_eq!(out[4].start, 2.5);
        assert_eq!(out[4].pitch, 62);
        assert_eq!(out[8].pitch, 64);
        assert_eq!(out[8].start, 5.0);
        assert!(out[6].is_rest());
        assert!(sequence(&phrase(), 0, 2).is_empty());
    }

    #[test]
    fn test_augment_and_diminish() {
        let doubled = augment(&phrase(), 2.0);
        assert_eq!(doubled[3].start, 3.0);
        assert_eq!(doubled[3].duration, 2.0);
        assert_eq!(diminish(&doubled, 2.0), phrase());
        assert_eq!(scale_time(&phrase(), -1.0), phrase());
    }

    #[test]
    fn test_swing_moves_offbeat_eighths() {
        // 120 bpm: eighths are 0.25 s
        let notes: Vec<TimedNote> = (0..4).map(|i| TimedNote::new(60, 100, i as f64 * 0.25, 0.25)).collect();
        let out = apply_swing(&notes, 1.0, 120.0);
        assert_eq!(out[0].start, 0.0);
        assert!((out[1].start - (0.25 + 0.25 * 0.33)).abs() < 1e-9);
        assert_eq!(out[2].start, 0.5);
        assert!(out[3].start > 0.75);
    }
}
