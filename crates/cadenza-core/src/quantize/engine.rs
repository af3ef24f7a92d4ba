//! Strength-weighted grid quantization, transient snapping and groove
//! extraction. Every function here is pure; notes are timed in beats.

use serde::{Deserialize, Serialize};

use super::grid::{GridValue, snap_to_grid_size};
use super::groove::GrooveTemplate;
use super::settings::{QuantizationSettings, QuantizeMode};
use crate::error::{CadenzaError, Result};
use crate::note::{TimedNote, notes_to_beats, notes_to_seconds};

/// Shortest length a quantized note may be left with, in beats
pub const MIN_NOTE_LENGTH: f64 = 0.01;

/// Buckets in an extracted groove (one bar of sixteenths)
pub const EXTRACT_DIVISIONS: usize = 16;

/// An audio onset to be snapped for time-warping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransientMarker {
    pub position_beats: f64,
    /// Detector confidence, carried through untouched
    pub strength: f32,
    pub quantized_position: Option<f64>,
}

impl TransientMarker {
    pub fn new(position_beats: f64, strength: f32) -> Self {
        Self {
            position_beats,
            strength,
            quantized_position: None,
        }
    }

    pub fn is_quantized(&self) -> bool {
        self.quantized_position.is_some()
    }

    /// How far quantization moved the marker
    pub fn shift(&self) -> f64 {
        self.quantized_position.map_or(0.0, |q| q - self.position_beats)
    }
}

// ============================================================================
// Note Quantization
// ============================================================================

/// Quantize a single note.
///
/// Rests and notes outside the settings' filters pass through unchanged.
pub fn quantize_note(note: &TimedNote, settings: &QuantizationSettings) -> TimedNote {
    quantize_scaled(note, settings, 1.0)
}

/// Quantize every note
pub fn quantize(notes: &[TimedNote], settings: &QuantizationSettings) -> Vec<TimedNote> {
    let out: Vec<TimedNote> = notes.iter().map(|n| quantize_scaled(n, settings, 1.0)).collect();
    tracing::debug!(
        notes = notes.len(),
        moved = out.iter().zip(notes).filter(|(a, b)| a != b).count(),
        grid = settings.grid.name(),
        mode = ?settings.mode,
        strength = settings.strength,
        "Quantized notes"
    );
    out
}

/// Quantize notes timed in seconds, converting through beats at `bpm`
pub fn quantize_seconds(notes: &[TimedNote], settings: &QuantizationSettings, bpm: f64) -> Vec<TimedNote> {
    notes_to_seconds(&quantize(&notes_to_beats(notes, bpm), settings), bpm)
}

/// One pass of a gradual quantize: the effective strength ramps linearly
/// from `1/iterations` on pass 0 to full strength on the last pass.
pub fn iterative_quantize(
    note: &TimedNote,
    settings: &QuantizationSettings,
    iterations: u32,
    current: u32,
) -> TimedNote {
    if iterations == 0 {
        return *note;
    }
    let ramp = ((current as f64 + 1.0) / iterations as f64).min(1.0);
    quantize_scaled(note, settings, ramp)
}

fn quantize_scaled(note: &TimedNote, settings: &QuantizationSettings, ramp: f64) -> TimedNote {
    if note.is_rest() || !settings.accepts(note) {
        return *note;
    }

    let grid = settings.grid.beats();
    let nearest = settings.snap_to_nearest;
    let strength = settings.strength_fraction() * ramp;
    let length_strength = settings.length_strength_fraction();

    let target = snap_to_grid_size(note.start, grid, nearest);
    let index = grid_index(target, grid);
    let groove = settings.groove.as_ref();
    let offset_percent = if settings.has_swing() {
        swing_offset(index, settings.swing_percent())
    } else {
        groove.map_or(0.0, |g| g.timing_offset(index))
    };
    let groove_target = target + offset_percent as f64 * grid / 100.0;

    let mut out = *note;
    if settings.mode.moves_start() {
        move_start(&mut out, groove_target, strength);
    }
    match settings.mode {
        QuantizeMode::NoteStart => {}
        QuantizeMode::NoteEnd => move_end(&mut out, grid, strength, nearest),
        QuantizeMode::NoteStartAndEnd => move_end(&mut out, grid, length_strength, nearest),
        QuantizeMode::NoteLength | QuantizeMode::NoteStartAndLength => {
            round_length(&mut out, grid, length_strength);
        }
    }

    if let Some(groove) = groove {
        let velocity_scale = 1.0 + (groove.velocity_scale(index) as f64 - 1.0) * strength;
        if velocity_scale != 1.0 {
            out.velocity = (out.velocity as f64 * velocity_scale).round().clamp(1.0, 127.0) as u8;
        }
        let duration_scale = 1.0 + (groove.duration_scale(index) as f64 - 1.0) * strength;
        if duration_scale != 1.0 {
            out.duration = (out.duration * duration_scale).max(MIN_NOTE_LENGTH);
        }
    }

    out
}

/// Grid index of a position already on the grid
fn grid_index(position: f64, grid: f64) -> i64 {
    (position / grid).round() as i64
}

/// Odd grid positions are delayed; 50 % swing is straight, 75 % pushes the
/// off-beat half a cell late
fn swing_offset(index: i64, swing: f32) -> f32 {
    if index.rem_euclid(2) == 1 {
        (swing - 50.0) * 2.0
    } else {
        0.0
    }
}

fn move_start(note: &mut TimedNote, target: f64, strength: f64) {
    let delta = (target - note.start) * strength;
    if delta != 0.0 {
        note.start = (note.start + delta).max(0.0);
    }
}

/// Pull the end toward the grid by changing the length; the start stays
fn move_end(note: &mut TimedNote, grid: f64, strength: f64, nearest: bool) {
    let end = note.end();
    let delta = (snap_to_grid_size(end, grid, nearest) - end) * strength;
    if delta != 0.0 {
        note.duration = (note.duration + delta).max(MIN_NOTE_LENGTH);
    }
}

/// Round the length to a whole number of grid cells (at least one)
fn round_length(note: &mut TimedNote, grid: f64, strength: f64) {
    let target = ((note.duration / grid).round() * grid).max(grid);
    let delta = (target - note.duration) * strength;
    if delta != 0.0 {
        note.duration = (note.duration + delta).max(MIN_NOTE_LENGTH);
    }
}

// ============================================================================
// Transients
// ============================================================================

/// Snap audio transient positions with the same grid and strength rules as
/// note starts. Swing, groove and note filters do not apply.
pub fn quantize_transients(
    markers: &[TransientMarker],
    settings: &QuantizationSettings,
) -> Vec<TransientMarker> {
    let grid = settings.grid.beats();
    let strength = settings.strength_fraction();
    markers
        .iter()
        .map(|&m| {
            let target = snap_to_grid_size(m.position_beats, grid, settings.snap_to_nearest);
            TransientMarker {
                quantized_position: Some(m.position_beats + (target - m.position_beats) * strength),
                ..m
            }
        })
        .collect()
}

// ============================================================================
// Groove Extraction
// ============================================================================

/// Measure a performance's groove over one bar of sixteen buckets
pub fn extract_groove(notes: &[TimedNote], grid: GridValue) -> GrooveTemplate {
    measure_groove(notes, grid, EXTRACT_DIVISIONS)
}

/// Measure a performance's groove with a custom bucket count
pub fn extract_groove_with_divisions(
    notes: &[TimedNote],
    grid: GridValue,
    divisions: usize,
) -> Result<GrooveTemplate> {
    if divisions == 0 {
        return Err(CadenzaError::EmptyGroove);
    }
    Ok(measure_groove(notes, grid, divisions))
}

#[derive(Default, Clone, Copy)]
struct Bucket {
    count: usize,
    offset: f64,
    velocity: f64,
    duration: f64,
}

/// Each sounding note is bucketed by its nearest grid line modulo
/// `divisions`. Offsets are averaged per bucket as a percentage of the cell;
/// velocity and length are averaged per bucket and divided by the overall
/// mean. Empty buckets stay neutral.
fn measure_groove(notes: &[TimedNote], grid: GridValue, divisions: usize) -> GrooveTemplate {
    let size = grid.beats();
    let mut buckets = vec![Bucket::default(); divisions];
    let mut total = Bucket::default();

    for note in notes.iter().filter(|n| n.is_sounding()) {
        let cell = (note.start / size).round();
        let offset = (note.start - cell * size) / size * 100.0;
        let bucket = &mut buckets[(cell as i64).rem_euclid(divisions as i64) as usize];
        for b in [bucket, &mut total] {
            b.count += 1;
            b.offset += offset;
            b.velocity += note.velocity as f64;
            b.duration += note.duration;
        }
    }

    let mean = |sum: f64| if total.count == 0 { 0.0 } else { sum / total.count as f64 };
    let (mean_velocity, mean_duration) = (mean(total.velocity), mean(total.duration));
    let ratio = |sum: f64, count: usize, overall: f64| {
        if count == 0 || overall <= 0.0 {
            1.0
        } else {
            (sum / count as f64 / overall) as f32
        }
    };

    let timing = buckets
        .iter()
        .map(|b| if b.count == 0 { 0.0 } else { (b.offset / b.count as f64) as f32 })
        .collect();
    let velocity = buckets.iter().map(|b| ratio(b.velocity, b.count, mean_velocity)).collect();
    let duration = buckets.iter().map(|b| ratio(b.duration, b.count, mean_duration)).collect();

    tracing::debug!(notes = total.count, divisions, grid = grid.name(), "Extracted groove");
    GrooveTemplate::measured("Extracted", timing, velocity, duration)
}
