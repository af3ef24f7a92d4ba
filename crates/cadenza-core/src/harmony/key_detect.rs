//! Key and scale detection from pitch collections

use super::theory::{Key, PitchClass, Scale};

/// Krumhansl-Schmuckler major key profile
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
/// Krumhansl-Schmuckler minor key profile
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Count of each pitch class in the input
pub fn pitch_class_histogram(pitches: &[u8]) -> [f64; 12] {
    let mut histogram = [0.0; 12];
    for &pitch in pitches {
        histogram[(pitch % 12) as usize] += 1.0;
    }
    histogram
}

/// Pearson correlation between the histogram rotated to `root` and a profile
fn correlate(histogram: &[f64; 12], root: usize, profile: &[f64; 12]) -> f64 {
    let h_mean = histogram.iter().sum::<f64>() / 12.0;
    let p_mean = profile.iter().sum::<f64>() / 12.0;

    let mut cov = 0.0;
    let mut h_var = 0.0;
    let mut p_var = 0.0;
    for (i, &p) in profile.iter().enumerate() {
        let h = histogram[(root + i) % 12] - h_mean;
        let p = p - p_mean;
        cov += h * p;
        h_var += h * h;
        p_var += p * p;
    }

    let denom = (h_var * p_var).sqrt();
    if denom <= f64::EPSILON { 0.0 } else { cov / denom }
}

/// Most likely key for a set of pitches.
///
/// Empty input, or input where every pitch class is equally common, yields
/// C major.
pub fn detect_key(pitches: &[u8]) -> Key {
    let histogram = pitch_class_histogram(pitches);
    let first = histogram[0];
    if histogram.iter().all(|&h| h == first) {
        return Key::default();
    }

    let mut best = Key::default();
    let mut best_corr = f64::NEG_INFINITY;
    for root in 0..12 {
        for (scale, profile) in [(Scale::Major, &MAJOR_PROFILE), (Scale::NaturalMinor, &MINOR_PROFILE)] {
            let corr = correlate(&histogram, root, profile);
            if corr > best_corr {
                best_corr = corr;
                best = Key::new(PitchClass::new(root as i32), scale);
            }
        }
    }

    tracing::debug!(key = %best, correlation = best_corr, notes = pitches.len(), "Detected key");
    best
}

/// Scale from the catalog that covers the most distinct pitch classes
/// relative to `root`. Ties go to the scale with fewer tones, then to
/// catalog order. Empty input yields [`Scale::Major`].
pub fn detect_scale(pitches: &[u8], root: PitchClass) -> Scale {
    let mut present = [false; 12];
    for &pitch in pitches {
        present[root.interval_to(PitchClass::of_pitch(pitch)) as usize] = true;
    }

    let mut best = Scale::Major;
    let mut best_matches = 0;
    for scale in Scale::ALL {
        let matches = scale.intervals().iter().filter(|&&i| present[i as usize]).count();
        let tighter = scale.intervals().len() < best.intervals().len();
        if matches > best_matches || (matches == best_matches && matches > 0 && tighter) {
            best_matches = matches;
            best = scale;
        }
    }
    best
}
