//! Random timing, length and velocity jitter for generated notes

use crate::note::TimedNote;
use crate::random::RandomSource;

/// Start-time jitter at full amount, in seconds (plus or minus)
const TIMING_SECONDS: f64 = 0.01;
/// Duration jitter at full amount, as a fraction of the note length
const DURATION_RATIO: f64 = 0.1;
/// Velocity jitter at full amount
const VELOCITY_RANGE: f32 = 20.0;

/// Perturb every sounding note.
///
/// `amount` (0-1) scales the jitter: starts move up to 10 ms, durations up
/// to 10 %, velocities up to 20 steps (kept within 20-127). Rests pass
/// through. Notes must be timed in seconds.
pub fn humanize(notes: &[TimedNote], amount: f32, rng: &mut impl RandomSource) -> Vec<TimedNote> {
    let amount = if amount.is_nan() { 0.0 } else { amount.clamp(0.0, 1.0) };
    if amount == 0.0 {
        return notes.to_vec();
    }

    notes
        .iter()
        .map(|&note| {
            if note.is_rest() {
                return note;
            }
            let mut note = note;
            let timing = rng.signed_unit() as f64 * TIMING_SECONDS * amount as f64;
            let length = 1.0 + rng.signed_unit() as f64 * DURATION_RATIO * amount as f64;
            let velocity = (rng.signed_unit() * VELOCITY_RANGE * amount) as i32;

            note.start = (note.start + timing).max(0.0);
            note.duration *= length;
            note.velocity = (note.velocity as i32 + velocity).clamp(20, 127) as u8;
            note
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded;

    fn line() -> Vec<TimedNote> {
        (0..32).map(|i| TimedNote::new(60 + (i % 12) as u8, 90, i as f64 * 0.25, 0.25)).collect()
    }

    #[test]
    fn test_zero_amount_is_identity() {
        let notes = line();
        assert_eq!(humanize(&notes, 0.0, &mut seeded(1)), notes);
    }

    #[test]
    fn test_bounds() {
        let notes = line();
        let out = humanize(&notes, 1.0, &mut seeded(2));
        for (a, b) in notes.iter().zip(&out) {
            assert!((a.start - b.start).abs() <= 0.01 + 1e-12 || b.start == 0.0);
            assert!((b.duration / a.duration - 1.0).abs() <= 0.1 + 1e-9);
            assert!((a.velocity as i32 - b.velocity as i32).abs() <= 20);
            assert!(b.velocity >= 20);
            assert_eq!(a.pitch, b.pitch);
        }
        assert_ne!(out, notes);
    }

    #[test]
    fn test_rests_untouched() {
        let notes = vec![TimedNote::rest(1.0, 0.5), TimedNote::new(60, 10, 1.5, 0.5)];
        let out = humanize(&notes, 1.0, &mut seeded(3));
        assert_eq!(out[0], notes[0]);
        assert!(out[1].velocity >= 20);
    }

    #[test]
    fn test_seeded_repeatable() {
        let notes = line();
        assert_eq!(humanize(&notes, 0.5, &mut seeded(4)), humanize(&notes, 0.5, &mut seeded(4)));
    }
}
