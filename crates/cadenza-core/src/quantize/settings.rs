//! Quantization settings and presets

use serde::{Deserialize, Serialize};

use super::grid::GridValue;
use super::groove::GrooveTemplate;
use crate::harmony::theory::normalize_identifier;
use crate::note::TimedNote;

/// Which note times the quantizer moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuantizeMode {
    #[default]
    NoteStart,
    NoteEnd,
    NoteStartAndEnd,
    /// Round the length to whole grid cells
    NoteLength,
    NoteStartAndLength,
}

impl QuantizeMode {
    pub const ALL: [QuantizeMode; 5] = [
        Self::NoteStart,
        Self::NoteEnd,
        Self::NoteStartAndEnd,
        Self::NoteLength,
        Self::NoteStartAndLength,
    ];

    pub fn moves_start(&self) -> bool {
        matches!(self, Self::NoteStart | Self::NoteStartAndEnd | Self::NoteStartAndLength)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(name);
        let key = match key.as_str() {
            "start" => "notestart",
            "end" => "noteend",
            "length" => "notelength",
            "startandend" => "notestartandend",
            "startandlength" => "notestartandlength",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|m| normalize_identifier(&format!("{m:?}")) == key)
    }
}

/// Swing shortcut range; 50 is straight
pub const SWING_MIN: f32 = 25.0;
pub const SWING_MAX: f32 = 75.0;

/// Quantization parameters, passed by value to every quantize call.
///
/// Strengths are percentages (0 leaves the note alone, 100 snaps fully).
/// A swing other than 50 takes precedence over the groove's timing table;
/// the groove's velocity and length tables still apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizationSettings {
    pub grid: GridValue,
    pub mode: QuantizeMode,
    pub strength: f32,
    pub length_strength: f32,
    /// Snap to the closest line rather than forward only
    pub snap_to_nearest: bool,
    pub swing: f32,
    pub groove: Option<GrooveTemplate>,
    /// Only notes starting inside this beat range are moved
    pub beat_range: Option<(f64, f64)>,
    pub velocity_range: Option<(u8, u8)>,
    pub pitch_range: Option<(u8, u8)>,
}

impl Default for QuantizationSettings {
    fn default() -> Self {
        Self {
            grid: GridValue::Sixteenth,
            mode: QuantizeMode::NoteStart,
            strength: 100.0,
            length_strength: 100.0,
            snap_to_nearest: true,
            swing: 50.0,
            groove: None,
            beat_range: None,
            velocity_range: None,
            pitch_range: None,
        }
    }
}

impl QuantizationSettings {
    pub fn new(grid: GridValue) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: QuantizeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = clamp_percent(strength);
        self
    }

    pub fn with_length_strength(mut self, strength: f32) -> Self {
        self.length_strength = clamp_percent(strength);
        self
    }

    pub fn with_swing(mut self, swing: f32) -> Self {
        self.swing = swing;
        self.swing = self.swing_percent();
        self
    }

    pub fn with_groove(mut self, groove: GrooveTemplate) -> Self {
        self.groove = Some(groove);
        self
    }

    pub fn forward_only(mut self) -> Self {
        self.snap_to_nearest = false;
        self
    }

    pub fn with_beat_range(mut self, start: f64, end: f64) -> Self {
        self.beat_range = Some((start.min(end), start.max(end)));
        self
    }

    pub fn with_velocity_range(mut self, min: u8, max: u8) -> Self {
        self.velocity_range = Some((min.min(max), min.max(max)));
        self
    }

    pub fn with_pitch_range(mut self, min: u8, max: u8) -> Self {
        self.pitch_range = Some((min.min(max), min.max(max)));
        self
    }

    /// Copy with every numeric field pulled into range
    pub fn clamped(&self) -> Self {
        let mut s = self.clone();
        s.strength = clamp_percent(s.strength);
        s.length_strength = clamp_percent(s.length_strength);
        s.swing = s.swing_percent();
        s
    }

    pub(crate) fn strength_fraction(&self) -> f64 {
        clamp_percent(self.strength) as f64 / 100.0
    }

    pub(crate) fn length_strength_fraction(&self) -> f64 {
        clamp_percent(self.length_strength) as f64 / 100.0
    }

    pub(crate) fn swing_percent(&self) -> f32 {
        if self.swing.is_nan() { 50.0 } else { self.swing.clamp(SWING_MIN, SWING_MAX) }
    }

    pub fn has_swing(&self) -> bool {
        self.swing_percent() != 50.0
    }

    /// Whether a note falls inside every configured filter
    pub fn accepts(&self, note: &TimedNote) -> bool {
        let in_range = self
            .beat_range
            .is_none_or(|(start, end)| note.start >= start && note.start <= end);
        let in_velocity = self
            .velocity_range
            .is_none_or(|(min, max)| (min..=max).contains(&note.velocity));
        let in_pitch = self
            .pitch_range
            .is_none_or(|(min, max)| (min..=max).contains(&note.pitch));
        in_range && in_velocity && in_pitch
    }

    // ========================================================================
    // Presets
    // ========================================================================

    pub fn tight_16th() -> Self {
        Self::new(GridValue::Sixteenth)
    }

    pub fn soft_8th() -> Self {
        Self::new(GridValue::Eighth).with_strength(75.0)
    }

    pub fn swing_16th(swing: f32) -> Self {
        Self::new(GridValue::Sixteenth).with_swing(swing)
    }

    pub fn triplet_feel() -> Self {
        Self::new(GridValue::EighthTriplet).with_mode(QuantizeMode::NoteStartAndLength)
    }

    pub fn humanize() -> Self {
        Self::new(GridValue::Sixteenth)
            .with_strength(50.0)
            .with_groove(GrooveTemplate::humanize(15.0))
    }

    pub fn drum_tight() -> Self {
        Self::new(GridValue::Sixteenth)
            .with_mode(QuantizeMode::NoteStartAndLength)
            .with_length_strength(50.0)
    }

    /// Preset by name (`tight16th`, `soft8th`, `swing16th`, `triplet`,
    /// `humanize`, `drumtight`)
    pub fn preset(name: &str) -> Option<Self> {
        match normalize_identifier(name).as_str() {
            "tight16th" | "tight" => Some(Self::tight_16th()),
            "soft8th" | "soft" => Some(Self::soft_8th()),
            "swing16th" | "swing" => Some(Self::swing_16th(62.0)),
            "tripletfeel" | "triplet" => Some(Self::triplet_feel()),
            "humanize" => Some(Self::humanize()),
            "drumtight" | "drums" => Some(Self::drum_tight()),
            _ => None,
        }
    }
}

fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() { 100.0 } else { value.clamp(0.0, 100.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = QuantizationSettings::default();
        assert_eq!(s.grid, GridValue::Sixteenth);
        assert_eq!(s.mode, QuantizeMode::NoteStart);
        assert_eq!(s.strength, 100.0);
        assert!(s.snap_to_nearest);
        assert!(!s.has_swing());
        assert!(s.groove.is_none());
    }

    #[test]
    fn test_builders_clamp() {
        let s = QuantizationSettings::default()
            .with_strength(150.0)
            .with_length_strength(-5.0)
            .with_swing(90.0);
        assert_eq!(s.strength, 100.0);
        assert_eq!(s.length_strength, 0.0);
        assert_eq!(s.swing, SWING_MAX);

        let raw = QuantizationSettings {
            strength: f32::NAN,
            swing: 10.0,
            ..Default::default()
        };
        let c = raw.clamped();
        assert_eq!(c.strength, 100.0);
        assert_eq!(c.swing, SWING_MIN);
    }

    #[test]
    fn test_presets() {
        assert_eq!(QuantizationSettings::soft_8th().strength, 75.0);
        assert_eq!(QuantizationSettings::swing_16th(62.0).swing, 62.0);
        assert_eq!(QuantizationSettings::triplet_feel().grid, GridValue::EighthTriplet);
        let drums = QuantizationSettings::drum_tight();
        assert_eq!(drums.mode, QuantizeMode::NoteStartAndLength);
        assert_eq!(drums.length_strength, 50.0);
        let human = QuantizationSettings::humanize();
        assert_eq!(human.strength, 50.0);
        assert_eq!(human.groove.as_ref().map(|g| g.name()), Some("Humanize 15%"));
        assert_eq!(QuantizationSettings::preset("Drum Tight"), Some(drums));
        assert!(QuantizationSettings::preset("loose").is_none());
    }

    #[test]
    fn test_filters() {
        let s = QuantizationSettings::default()
            .with_beat_range(4.0, 0.0)
            .with_velocity_range(40, 100)
            .with_pitch_range(36, 48);
        assert!(s.accepts(&TimedNote::new(40, 80, 1.0, 0.5)));
        assert!(!s.accepts(&TimedNote::new(40, 80, 4.5, 0.5)));
        assert!(!s.accepts(&TimedNote::new(40, 120, 1.0, 0.5)));
        assert!(!s.accepts(&TimedNote::new(60, 80, 1.0, 0.5)));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(QuantizeMode::from_name("start"), Some(QuantizeMode::NoteStart));
        assert_eq!(QuantizeMode::from_name("note-start-and-length"), Some(QuantizeMode::NoteStartAndLength));
        assert!(QuantizeMode::NoteStartAndEnd.moves_start());
        assert!(!QuantizeMode::NoteLength.moves_start());
    }

    #[test]
    fn test_serde_round_trip() {
        let s = QuantizationSettings::swing_16th(58.0)
            .with_pitch_range(36, 51)
            .with_groove(GrooveTemplate::mpc60());
        let text = serde_json::to_string(&s).unwrap();
        let back: QuantizationSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s);
    }
}
