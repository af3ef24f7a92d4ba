//! Style presets and the catalog seam that supplies them

use serde::{Deserialize, Serialize};

use crate::generate::{MelodicContour, RhythmPattern};
use crate::harmony::{PitchClass, Progression, Scale, diatonic_chords};
use crate::note::clamp_bpm;

/// Musical defaults for a style: scale, tempo, a seed progression and feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    pub name: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub scale: Scale,
    /// Inclusive tempo range in BPM
    pub tempo_range: (f64, f64),
    /// Zero-based scale degrees of the seed progression
    #[serde(default)]
    pub degrees: Vec<u8>,
    #[serde(default)]
    pub rhythm: RhythmPattern,
    #[serde(default)]
    pub contour: MelodicContour,
}

impl StylePreset {
    /// Diatonic chords on the preset's degrees, in `key`. Degrees past the
    /// end of the scale are skipped.
    pub fn seed_progression(&self, key: PitchClass) -> Progression {
        let diatonic = diatonic_chords(key, self.scale);
        let mut progression = Progression::new(key, self.scale, self.name.clone(), self.genre.clone());
        progression.chords = self
            .degrees
            .iter()
            .filter_map(|&d| diatonic.get(d as usize).cloned())
            .collect();
        progression
    }

    /// Pull a tempo into the preset's range
    pub fn clamp_tempo(&self, bpm: f64) -> f64 {
        let (lo, hi) = self.tempo_bounds();
        clamp_bpm(bpm).clamp(lo, hi)
    }

    /// Middle of the tempo range
    pub fn default_tempo(&self) -> f64 {
        let (lo, hi) = self.tempo_bounds();
        ((lo + hi) / 2.0).round()
    }

    fn tempo_bounds(&self) -> (f64, f64) {
        let (a, b) = (clamp_bpm(self.tempo_range.0), clamp_bpm(self.tempo_range.1));
        (a.min(b), a.max(b))
    }
}

/// A source of named style presets
pub trait StyleCatalog {
    fn preset(&self, name: &str) -> Option<StylePreset>;

    /// Preset names in catalog order
    fn names(&self) -> Vec<String>;

    fn presets_for_genre(&self, genre: &str) -> Vec<StylePreset> {
        self.names()
            .iter()
            .filter_map(|n| self.preset(n))
            .filter(|p| p.genre.eq_ignore_ascii_case(genre.trim()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::ChordQuality;

    fn pop() -> StylePreset {
        StylePreset {
            name: "Pop".into(),
            genre: "Pop".into(),
            scale: Scale::Major,
            tempo_range: (100.0, 130.0),
            degrees: vec![0, 4, 5, 3],
            rhythm: RhythmPattern::Straight,
            contour: MelodicContour::Arch,
        }
    }

    struct Fixed(Vec<StylePreset>);

    impl StyleCatalog for Fixed {
        fn preset(&self, name: &str) -> Option<StylePreset> {
            self.0.iter().find(|p| p.name == name).cloned()
        }

        fn names(&self) -> Vec<String> {
            self.0.iter().map(|p| p.name.clone()).collect()
        }
    }

    #[test]
    fn test_seed_progression() {
        let prog = pop().seed_progression(PitchClass::C);
        assert_eq!(prog.chord_names(), "C - G - Am - F");
        assert!(prog.is_diatonic());
        assert_eq!(prog.chords[2].quality, ChordQuality::Minor);
        assert_eq!(prog.name, "Pop");
    }

    #[test]
    fn test_degrees_past_scale_are_skipped() {
        let preset = StylePreset {
            scale: Scale::MinorPentatonic,
            degrees: vec![0, 3, 6],
            ..pop()
        };
        assert_eq!(preset.seed_progression(PitchClass::new(9)).len(), 2);
    }

    #[test]
    fn test_tempo() {
        let p = pop();
        assert_eq!(p.clamp_tempo(90.0), 100.0);
        assert_eq!(p.clamp_tempo(140.0), 130.0);
        assert_eq!(p.clamp_tempo(120.0), 120.0);
        assert_eq!(p.default_tempo(), 115.0);
        let reversed = StylePreset { tempo_range: (130.0, 100.0), ..pop() };
        assert_eq!(reversed.clamp_tempo(90.0), 100.0);
    }

    #[test]
    fn test_catalog_genre_filter() {
        let catalog = Fixed(vec![
            pop(),
            StylePreset { name: "Synth Pop".into(), ..pop() },
            StylePreset { name: "Bebop".into(), genre: "Jazz".into(), ..pop() },
        ]);
        assert_eq!(catalog.presets_for_genre("pop").len(), 2);
        assert_eq!(catalog.presets_for_genre("Jazz")[0].name, "Bebop");
    }
}
