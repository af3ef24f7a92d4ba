//! Groove templates: per-grid-position timing, velocity and length deviations

use serde::{Deserialize, Serialize};

use crate::error::{CadenzaError, Result};
use crate::harmony::theory::normalize_identifier;

const DEFAULT_DIVISIONS: usize = 16;
const HUMANIZE_SEED: u64 = 42;

/// A validated groove table.
///
/// All three tables have exactly `grid_divisions` entries. Timing offsets are
/// a percentage of one grid cell (-50..+50), velocity and duration scales are
/// positive multipliers averaging 1.0, the same normalisation extraction
/// produces. Lookups wrap modulo `grid_divisions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GrooveTables", into = "GrooveTables")]
pub struct GrooveTemplate {
    name: String,
    grid_divisions: usize,
    timing_offsets: Vec<f32>,
    velocity_scales: Vec<f32>,
    duration_scales: Vec<f32>,
}

/// Unchecked wire form of a [`GrooveTemplate`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GrooveTables {
    name: String,
    grid_divisions: usize,
    timing_offsets: Vec<f32>,
    velocity_scales: Vec<f32>,
    duration_scales: Vec<f32>,
}

impl TryFrom<GrooveTables> for GrooveTemplate {
    type Error = CadenzaError;

    fn try_from(raw: GrooveTables) -> Result<Self> {
        Self::new(
            raw.name,
            raw.grid_divisions,
            raw.timing_offsets,
            raw.velocity_scales,
            raw.duration_scales,
        )
    }
}

impl From<GrooveTemplate> for GrooveTables {
    fn from(t: GrooveTemplate) -> Self {
        Self {
            name: t.name,
            grid_divisions: t.grid_divisions,
            timing_offsets: t.timing_offsets,
            velocity_scales: t.velocity_scales,
            duration_scales: t.duration_scales,
        }
    }
}

impl Default for GrooveTemplate {
    fn default() -> Self {
        Self::straight()
    }
}

impl GrooveTemplate {
    pub fn new(
        name: impl Into<String>,
        grid_divisions: usize,
        timing_offsets: Vec<f32>,
        mut velocity_scales: Vec<f32>,
        mut duration_scales: Vec<f32>,
    ) -> Result<Self> {
        if grid_divisions == 0 {
            return Err(CadenzaError::EmptyGroove);
        }
        for (table, len) in [
            ("timing_offsets", timing_offsets.len()),
            ("velocity_scales", velocity_scales.len()),
            ("duration_scales", duration_scales.len()),
        ] {
            if len != grid_divisions {
                return Err(CadenzaError::GrooveTableLength {
                    table,
                    expected: grid_divisions,
                    actual: len,
                });
            }
        }
        normalize_mean("velocity_scales", &mut velocity_scales)?;
        normalize_mean("duration_scales", &mut duration_scales)?;
        Ok(Self {
            name: name.into(),
            grid_divisions,
            timing_offsets,
            velocity_scales,
            duration_scales,
        })
    }

    /// Neutral tables of the given size
    fn neutral(name: impl Into<String>, grid_divisions: usize) -> Self {
        Self {
            name: name.into(),
            grid_divisions,
            timing_offsets: vec![0.0; grid_divisions],
            velocity_scales: vec![1.0; grid_divisions],
            duration_scales: vec![1.0; grid_divisions],
        }
    }

    /// Tables measured from a performance; sized by the timing table
    pub(crate) fn measured(
        name: impl Into<String>,
        timing_offsets: Vec<f32>,
        velocity_scales: Vec<f32>,
        duration_scales: Vec<f32>,
    ) -> Self {
        debug_assert!(!timing_offsets.is_empty());
        debug_assert_eq!(timing_offsets.len(), velocity_scales.len());
        debug_assert_eq!(timing_offsets.len(), duration_scales.len());
        Self {
            name: name.into(),
            grid_divisions: timing_offsets.len(),
            timing_offsets,
            velocity_scales,
            duration_scales,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid_divisions(&self) -> usize {
        self.grid_divisions
    }

    pub fn timing_offsets(&self) -> &[f32] {
        &self.timing_offsets
    }

    pub fn velocity_scales(&self) -> &[f32] {
        &self.velocity_scales
    }

    pub fn duration_scales(&self) -> &[f32] {
        &self.duration_scales
    }

    fn slot(&self, grid_index: i64) -> usize {
        grid_index.rem_euclid(self.grid_divisions as i64) as usize
    }

    /// Timing offset (percent of a grid cell) at a grid index, wrapping
    pub fn timing_offset(&self, grid_index: i64) -> f32 {
        self.timing_offsets[self.slot(grid_index)]
    }

    pub fn velocity_scale(&self, grid_index: i64) -> f32 {
        self.velocity_scales[self.slot(grid_index)]
    }

    pub fn duration_scale(&self, grid_index: i64) -> f32 {
        self.duration_scales[self.slot(grid_index)]
    }

    /// True when the template moves nothing
    pub fn is_neutral(&self) -> bool {
        self.timing_offsets.iter().all(|&o| o == 0.0)
            && self.velocity_scales.iter().all(|&v| v == 1.0)
            && self.duration_scales.iter().all(|&d| d == 1.0)
    }

    // ========================================================================
    // Built-in Templates
    // ========================================================================

    pub fn straight() -> Self {
        Self::neutral("Straight", DEFAULT_DIVISIONS)
    }

    /// Every odd sixteenth delayed; 50 % is straight, 67 % a triplet feel
    pub fn swing(amount: f32) -> Self {
        let amount = amount.clamp(0.0, 100.0);
        let mut t = Self::neutral(format!("Swing {}%", amount as i32), DEFAULT_DIVISIONS);
        let offset = (amount - 50.0) * 0.5;
        for o in t.timing_offsets.iter_mut().skip(1).step_by(2) {
            *o = offset;
        }
        t
    }

    /// Triplet grid with an accented first and softer last partial
    pub fn shuffle() -> Self {
        let mut t = Self::neutral("Shuffle", 12);
        for beat in t.velocity_scales.chunks_mut(3) {
            beat.copy_from_slice(&[1.15, 0.95, 0.9]);
        }
        t
    }

    /// Fixed pseudo-random deviations scaled by `amount` (0-100). The
    /// generator is seeded so the same amount always gives the same table.
    pub fn humanize(amount: f32) -> Self {
        let amount = amount.clamp(0.0, 100.0);
        let mut rng = fastrand::Rng::with_seed(HUMANIZE_SEED);
        let mut draw = || rng.usize(..100) as f32 / 100.0 - 0.5;

        let mut timing = Vec::with_capacity(DEFAULT_DIVISIONS);
        let mut velocity = Vec::with_capacity(DEFAULT_DIVISIONS);
        let mut duration = Vec::with_capacity(DEFAULT_DIVISIONS);
        for _ in 0..DEFAULT_DIVISIONS {
            timing.push(draw() * amount);
            velocity.push((draw() * amount).round() as i32);
            duration.push((draw() * amount * 0.5).round() as i32);
        }
        Self::measured(
            format!("Humanize {}%", amount as i32),
            timing,
            balanced_hundredths(velocity),
            balanced_hundredths(duration),
        )
    }

    /// Late off-beat sixteenths with a strong-weak velocity cycle
    pub fn mpc60() -> Self {
        const TIMING: [f32; 8] = [0.0, 12.0, 0.0, 10.0, 0.0, 14.0, 0.0, 8.0];
        const VELOCITY: [f32; 4] = [1.1, 0.9, 1.05, 0.95];

        let mut t = Self::neutral("MPC 60", DEFAULT_DIVISIONS);
        for i in 0..DEFAULT_DIVISIONS {
            t.timing_offsets[i] = TIMING[i % TIMING.len()];
            t.velocity_scales[i] = VELOCITY[i % VELOCITY.len()];
        }
        t
    }

    /// Look up a built-in template by name, ignoring case, spaces and `%`
    pub fn by_name(name: &str) -> Option<Self> {
        let key = normalize_identifier(&name.replace('%', ""));
        built_in_grooves()
            .into_iter()
            .find(|t| normalize_identifier(&t.name.replace('%', "")) == key)
    }
}

/// Rescale a multiplier table to average 1.0. Entries must be positive.
fn normalize_mean(table: &'static str, scales: &mut [f32]) -> Result<()> {
    if let Some(&value) = scales.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(CadenzaError::GrooveScale { table, value });
    }
    let mean = scales.iter().map(|&v| v as f64).sum::<f64>() / scales.len() as f64;
    // Balanced tables stay bit-exact
    if (mean - 1.0).abs() > f32::EPSILON as f64 {
        for v in scales.iter_mut() {
            *v = (*v as f64 / mean) as f32;
        }
    }
    Ok(())
}

/// Multipliers from deviations in hundredths, shifted so the deviations
/// cancel and the table averages exactly 1.0
fn balanced_hundredths(mut deviations: Vec<i32>) -> Vec<f32> {
    let n = deviations.len() as i32;
    let total: i32 = deviations.iter().sum();
    let (shift, rem) = (total.div_euclid(n), total.rem_euclid(n));
    for (i, d) in deviations.iter_mut().enumerate() {
        *d -= shift + i32::from((i as i32) < rem);
    }
    deviations
        .into_iter()
        .map(|d| (1.0 + d as f32 / 100.0).max(0.01))
        .collect()
}

/// The built-in template set
pub fn built_in_grooves() -> Vec<GrooveTemplate> {
    vec![
        GrooveTemplate::straight(),
        GrooveTemplate::swing(54.0),
        GrooveTemplate::swing(58.0),
        GrooveTemplate::swing(62.0),
        GrooveTemplate::swing(67.0),
        GrooveTemplate::shuffle(),
        GrooveTemplate::humanize(5.0),
        GrooveTemplate::humanize(10.0),
        GrooveTemplate::humanize(20.0),
        GrooveTemplate::mpc60(),
    ]
}
