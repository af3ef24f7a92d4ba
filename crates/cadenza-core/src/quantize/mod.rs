//! Quantization & groove engine
//!
//! A stateless transform over timed notes in beats: grid snapping, swing,
//! groove templates, partial-strength blending and groove extraction.

mod engine;
mod grid;
mod groove;
mod settings;

pub use engine::{
    EXTRACT_DIVISIONS, MIN_NOTE_LENGTH, TransientMarker, extract_groove, extract_groove_with_divisions,
    iterative_quantize, quantize, quantize_note, quantize_seconds, quantize_transients,
};
pub use grid::{
    GridValue, next_grid_position, previous_grid_position, quantize_input_time, snap_to_grid, snap_to_grid_size,
};
pub use groove::{GrooveTemplate, built_in_grooves};
pub use settings::{QuantizationSettings, QuantizeMode, SWING_MAX, SWING_MIN};
