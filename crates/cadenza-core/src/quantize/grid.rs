//! Musical grid units and snapping

use serde::{Deserialize, Serialize};

use crate::harmony::theory::normalize_identifier;

/// Grid unit: straight, triplet and dotted note values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GridValue {
    Bar,
    Half,
    Quarter,
    Eighth,
    #[default]
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    HalfTriplet,
    QuarterTriplet,
    EighthTriplet,
    SixteenthTriplet,
    ThirtySecondTriplet,
    HalfDotted,
    QuarterDotted,
    EighthDotted,
    SixteenthDotted,
}

impl GridValue {
    pub const ALL: [GridValue; 16] = [
        Self::Bar,
        Self::Half,
        Self::Quarter,
        Self::Eighth,
        Self::Sixteenth,
        Self::ThirtySecond,
        Self::SixtyFourth,
        Self::HalfTriplet,
        Self::QuarterTriplet,
        Self::EighthTriplet,
        Self::SixteenthTriplet,
        Self::ThirtySecondTriplet,
        Self::HalfDotted,
        Self::QuarterDotted,
        Self::EighthDotted,
        Self::SixteenthDotted,
    ];

    /// Length of one grid cell in beats (quarter note = 1)
    pub fn beats(&self) -> f64 {
        match self {
            Self::Bar => 4.0,
            Self::Half => 2.0,
            Self::Quarter => 1.0,
            Self::Eighth => 0.5,
            Self::Sixteenth => 0.25,
            Self::ThirtySecond => 0.125,
            Self::SixtyFourth => 0.0625,
            Self::HalfTriplet => 4.0 / 3.0,
            Self::QuarterTriplet => 2.0 / 3.0,
            Self::EighthTriplet => 1.0 / 3.0,
            Self::SixteenthTriplet => 0.5 / 3.0,
            Self::ThirtySecondTriplet => 0.25 / 3.0,
            Self::HalfDotted => 3.0,
            Self::QuarterDotted => 1.5,
            Self::EighthDotted => 0.75,
            Self::SixteenthDotted => 0.375,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bar => "1/1",
            Self::Half => "1/2",
            Self::Quarter => "1/4",
            Self::Eighth => "1/8",
            Self::Sixteenth => "1/16",
            Self::ThirtySecond => "1/32",
            Self::SixtyFourth => "1/64",
            Self::HalfTriplet => "1/2T",
            Self::QuarterTriplet => "1/4T",
            Self::EighthTriplet => "1/8T",
            Self::SixteenthTriplet => "1/16T",
            Self::ThirtySecondTriplet => "1/32T",
            Self::HalfDotted => "1/2.",
            Self::QuarterDotted => "1/4.",
            Self::EighthDotted => "1/8.",
            Self::SixteenthDotted => "1/16.",
        }
    }

    pub fn is_triplet(&self) -> bool {
        self.name().ends_with('T')
    }

    pub fn is_dotted(&self) -> bool {
        self.name().ends_with('.')
    }

    /// Parse a display name (`"1/16"`, `"1/8T"`, `"1/4."`) or a variant
    /// name (`"sixteenth"`, `"eighth_triplet"`)
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if let Some(grid) = Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(trimmed))
        {
            return Some(grid);
        }
        let key = normalize_identifier(trimmed);
        if key == "whole" {
            return Some(Self::Bar);
        }
        Self::ALL
            .into_iter()
            .find(|g| normalize_identifier(&format!("{g:?}")) == key)
    }

    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(name, "Unknown grid value, falling back to 1/16");
            Self::Sixteenth
        })
    }
}

impl std::fmt::Display for GridValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Snap `position` (beats) to a multiple of `grid_size`.
///
/// With `nearest` the closest line wins; otherwise the snap only moves
/// forward (the next line at or after `position`). Non-positive grid sizes
/// return the position unchanged.
pub fn snap_to_grid_size(position: f64, grid_size: f64, nearest: bool) -> f64 {
    if grid_size.is_nan() || grid_size <= 0.0 {
        return position;
    }
    let cells = position / grid_size;
    let cells = if nearest { cells.round() } else { cells.ceil() };
    cells * grid_size
}

pub fn snap_to_grid(position: f64, grid: GridValue, nearest: bool) -> f64 {
    snap_to_grid_size(position, grid.beats(), nearest)
}

/// Grid line at or before `position`
pub fn previous_grid_position(position: f64, grid: GridValue) -> f64 {
    (position / grid.beats()).floor() * grid.beats()
}

/// Grid line at or after `position`
pub fn next_grid_position(position: f64, grid: GridValue) -> f64 {
    (position / grid.beats()).ceil() * grid.beats()
}

/// Real-time input snap: a note arriving within `lookahead` beats of a grid
/// line (either side) lands on it, anything else is left where it was
/// played. The following line is checked first.
pub fn quantize_input_time(time: f64, grid: GridValue, lookahead: f64) -> f64 {
    let previous = previous_grid_position(time, grid);
    let next = previous + grid.beats();
    let lookahead = lookahead.max(0.0);

    if next - time <= lookahead {
        next
    } else if time - previous <= lookahead {
        previous
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_beat_lengths() {
        assert_eq!(GridValue::Bar.beats(), 4.0);
        assert_eq!(GridValue::Sixteenth.beats(), 0.25);
        assert!(approx(GridValue::EighthTriplet.beats() * 3.0, 1.0));
        assert_eq!(GridValue::QuarterDotted.beats(), 1.5);
        assert!(GridValue::SixteenthTriplet.is_triplet());
        assert!(GridValue::EighthDotted.is_dotted());
        assert!(!GridValue::Eighth.is_triplet());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(GridValue::from_name("1/16"), Some(GridValue::Sixteenth));
        assert_eq!(GridValue::from_name("1/8t"), Some(GridValue::EighthTriplet));
        assert_eq!(GridValue::from_name("1/4."), Some(GridValue::QuarterDotted));
        assert_eq!(GridValue::from_name("thirty-second"), Some(GridValue::ThirtySecond));
        assert_eq!(GridValue::from_name("whole"), Some(GridValue::Bar));
        assert_eq!(GridValue::from_name("1/7"), None);
        assert_eq!(GridValue::from_name_or_default("1/7"), GridValue::Sixteenth);
        for grid in GridValue::ALL {
            assert_eq!(GridValue::from_name(grid.name()), Some(grid));
        }
    }

    #[test]
    fn test_snap() {
        assert!(approx(snap_to_grid(0.48, GridValue::Sixteenth, true), 0.5));
        assert!(approx(snap_to_grid(0.6, GridValue::Sixteenth, true), 0.5));
        assert!(approx(snap_to_grid(0.51, GridValue::Sixteenth, false), 0.75));
        assert!(approx(snap_to_grid(0.5, GridValue::Sixteenth, false), 0.5));
        assert_eq!(snap_to_grid_size(0.3, 0.0, true), 0.3);
    }

    #[test]
    fn test_previous_and_next() {
        assert!(approx(previous_grid_position(1.3, GridValue::Quarter), 1.0));
        assert!(approx(next_grid_position(1.3, GridValue::Quarter), 2.0));
        assert!(approx(previous_grid_position(2.0, GridValue::Quarter), 2.0));
        assert!(approx(next_grid_position(2.0, GridValue::Quarter), 2.0));
    }

    #[test]
    fn test_input_time_lookahead() {
        assert!(approx(quantize_input_time(0.95, GridValue::Quarter, 0.1), 1.0));
        assert!(approx(quantize_input_time(1.05, GridValue::Quarter, 0.1), 1.0));
        assert!(approx(quantize_input_time(1.5, GridValue::Quarter, 0.1), 1.5));
        assert!(approx(quantize_input_time(1.5, GridValue::Quarter, 0.0), 1.5));
    }
}
