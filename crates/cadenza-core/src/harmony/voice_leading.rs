//! Minimal-motion inversion search between adjacent chords

use super::chord::Chord;
use crate::note::clamp_pitch;

/// Sum of absolute pitch differences between corresponding voices.
/// A voice missing from the smaller chord counts as pitch 0.
pub fn voice_leading_distance(a: &Chord, b: &Chord) -> u32 {
    let voices = a.notes().len().max(b.notes().len());
    (0..voices)
        .map(|i| {
            let x = a.notes().get(i).copied().unwrap_or(0) as i32;
            let y = b.notes().get(i).copied().unwrap_or(0) as i32;
            x.abs_diff(y)
        })
        .sum()
}

/// Pick the rotation of `to` closest to `from`.
///
/// Rotation `k` lifts the lowest note an octave, `k` times, for `k` in
/// `0..=len`. Ties keep the lowest rotation.
pub fn optimize_voice_leading(from: &Chord, to: &Chord) -> Chord {
    let len = to.notes().len();
    if len == 0 {
        return to.clone();
    }

    let mut best = to.clone();
    let mut best_rotation = 0;
    let mut best_distance = voice_leading_distance(from, to);

    let mut candidate = to.clone();
    for rotation in 1..=len {
        let lowest = candidate.notes.remove(0);
        candidate.notes.push(clamp_pitch(lowest as i32 + 12));

        let distance = voice_leading_distance(from, &candidate);
        if distance < best_distance {
            best_distance = distance;
            best_rotation = rotation;
            best = candidate.clone();
        }
    }

    best.inversion = ((to.inversion as usize + best_rotation) % len) as u8;
    tracing::trace!(from = %from, to = %best, distance = best_distance, "Voice leading");
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::{ChordQuality, PitchClass, Voicing};

    #[test]
    fn test_distance_counts_missing_voices_as_zero() {
        let triad = Chord::new(PitchClass::C, ChordQuality::Major);
        let seventh = Chord::new(PitchClass::C, ChordQuality::Major7);
        assert_eq!(voice_leading_distance(&triad, &triad), 0);
        assert_eq!(voice_leading_distance(&triad, &seventh), 71);
        assert_eq!(voice_leading_distance(&seventh, &triad), 71);
    }

    #[test]
    fn test_c_to_f_picks_second_inversion() {
        let c = Chord::new(PitchClass::C, ChordQuality::Major);
        let f = Chord::new(PitchClass::new(5), ChordQuality::Major);
        // Rotations only move upward, so root position (distance 15) wins
        let best = optimize_voice_leading(&c, &f);
        assert_eq!(best.notes(), &[65, 69, 72]);
        assert_eq!(best.inversion, 0);
    }

    #[test]
    fn test_g_to_c_moves_up() {
        let g = Chord::new(PitchClass::new(7), ChordQuality::Major); // 67 71 74
        let c = Chord::new(PitchClass::C, ChordQuality::Major); // 60 64 67
        let best = optimize_voice_leading(&g, &c);
        // rotation 1: 64 67 72 -> 3+4+2 = 9, rotation 2: 67 72 76 -> 0+1+2 = 3
        assert_eq!(best.notes(), &[67, 72, 76]);
        assert_eq!(best.inversion, 2);
        assert_eq!(best.name(), "C/G");
    }

    #[test]
    fn test_never_worse_than_input() {
        let chords: Vec<Chord> = (0..12)
            .flat_map(|root| {
                [ChordQuality::Major, ChordQuality::Minor7, ChordQuality::Dominant9]
                    .into_iter()
                    .map(move |q| Chord::build(PitchClass::new(root), q, Voicing::Drop2))
            })
            .collect();
        for a in &chords {
            for b in &chords {
                let optimized = optimize_voice_leading(a, b);
                assert!(voice_leading_distance(&optimized, a) <= voice_leading_distance(b, a));
            }
        }
    }
}
