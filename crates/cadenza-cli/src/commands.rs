//! Subcommand implementations. Each returns the JSON it prints.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use cadenza_core::harmony::optimize_voice_leading;
use cadenza_core::quantize::{GridValue, built_in_grooves, quantize_seconds};
use cadenza_core::{
    ArpPattern, ArpStyle, BassPattern, BassStyle, GrooveTemplate, MelodicContour, MelodyStyle, PitchClass,
    Progression, QuantizationSettings, QuantizeMode, RhythmPattern, Scale, StyleCatalog, StylePreset, TimedNote,
    generate_arpeggio, generate_bassline, generate_melody, generate_progression, humanize,
};
use cadenza_services::{CadenzaConfig, GenerationConfig, TomlStyleCatalog, load_config_from};
use serde::Serialize;
use tracing::{debug, info};

use crate::GenerateArgs;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<CadenzaConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(cadenza_services::config_path);
    load_config_from(&path).with_context(|| format!("loading {}", path.display()))
}

fn catalog(config: &CadenzaConfig) -> anyhow::Result<TomlStyleCatalog> {
    Ok(TomlStyleCatalog::load(config.styles_path.as_deref())?)
}

fn to_json(value: &impl Serialize) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// ============================================================================
// Generators
// ============================================================================

/// Everything a generator needs once flags, config and style are merged
struct Plan {
    settings: GenerationConfig,
    progression: Progression,
    rng: fastrand::Rng,
}

#[derive(Serialize)]
struct Generated {
    key: String,
    tempo: f64,
    bars: u32,
    progression: String,
    notes: Vec<TimedNote>,
}

fn plan(config: &CadenzaConfig, args: &GenerateArgs) -> anyhow::Result<Plan> {
    let mut settings = config.generation.clone();
    if let Some(key) = &args.key {
        if PitchClass::from_name(key).is_none() {
            bail!("unknown key {key:?}");
        }
        settings.key = key.clone();
    }
    if let Some(scale) = &args.scale {
        settings.scale = Scale::from_name_or_default(scale);
    }
    if let Some(genre) = &args.genre {
        settings.genre = genre.clone();
    }
    settings.chords = args.chords.unwrap_or(settings.chords);
    settings.bars = args.bars.unwrap_or(settings.bars);
    settings.tempo = args.tempo.unwrap_or(settings.tempo);
    settings.seed = args.seed.or(settings.seed);

    let mut rng = settings.rng();

    let progression = match &args.style {
        Some(name) => {
            let preset = catalog(config)?
                .preset(name)
                .with_context(|| format!("unknown style {name:?}"))?;
            if args.scale.is_none() {
                settings.scale = preset.scale;
            }
            if args.genre.is_none() && !preset.genre.is_empty() {
                settings.genre = preset.genre.clone();
            }
            settings.tempo = match args.tempo {
                Some(bpm) => preset.clamp_tempo(bpm),
                None => preset.default_tempo(),
            };
            let preset = StylePreset { scale: settings.scale, ..preset };
            voice_led(preset.seed_progression(settings.root()))
        }
        None => generate_progression(settings.root(), settings.scale, &settings.genre, settings.chords, &mut rng),
    };

    info!(
        key = %settings.key(),
        chords = progression.len(),
        tempo = settings.tempo,
        seed = ?settings.seed,
        "Progression ready"
    );
    Ok(Plan { settings, progression, rng })
}

/// Re-voice each chord for minimal motion from the one before
fn voice_led(mut progression: Progression) -> Progression {
    for i in 1..progression.chords.len() {
        progression.chords[i] = optimize_voice_leading(&progression.chords[i - 1], &progression.chords[i]);
    }
    progression
}

fn finish(mut plan: Plan, notes: Vec<TimedNote>, args: &GenerateArgs) -> anyhow::Result<String> {
    let notes = match args.humanize {
        Some(amount) => humanize(&notes, amount, &mut plan.rng),
        None => notes,
    };
    debug!(notes = notes.len(), "Generated");
    to_json(&Generated {
        key: plan.settings.key().to_string(),
        tempo: plan.settings.tempo,
        bars: plan.settings.bars,
        progression: plan.progression.chord_names(),
        notes,
    })
}

pub fn progression(config: &CadenzaConfig, args: &GenerateArgs) -> anyhow::Result<String> {
    let Plan { settings, progression, .. } = plan(config, args)?;
    let notes = progression.to_notes(4.0, settings.tempo);
    to_json(&serde_json::json!({
        "key": settings.key().to_string(),
        "tempo": settings.tempo,
        "names": progression.chord_names(),
        "progression": progression,
        "notes": notes,
    }))
}

pub fn melody(
    config: &CadenzaConfig,
    args: &GenerateArgs,
    contour: Option<&str>,
    rhythm: Option<&str>,
) -> anyhow::Result<String> {
    let mut plan = plan(config, args)?;
    let mut style = MelodyStyle::for_genre(&plan.settings.genre);
    if let Some(name) = contour {
        style.contour = MelodicContour::from_name_or_default(name);
    }
    if let Some(name) = rhythm {
        style.rhythm = RhythmPattern::from_name_or_default(name);
    }
    let notes = generate_melody(&plan.progression, &style, plan.settings.bars, plan.settings.tempo, &mut plan.rng);
    finish(plan, notes, args)
}

pub fn bass(
    config: &CadenzaConfig,
    args: &GenerateArgs,
    pattern: Option<&str>,
    rhythm: Option<&str>,
) -> anyhow::Result<String> {
    let mut plan = plan(config, args)?;
    let style = BassStyle::new(
        pattern.map(BassPattern::from_name_or_default).unwrap_or_default(),
        rhythm.map(RhythmPattern::from_name_or_default).unwrap_or_default(),
    );
    let notes = generate_bassline(&plan.progression, &style, plan.settings.bars, plan.settings.tempo, &mut plan.rng);
    finish(plan, notes, args)
}

pub struct ArpOptions {
    pub pattern: Option<String>,
    pub rhythm: Option<String>,
    pub octaves: Option<u8>,
    pub gate: Option<f64>,
}

pub fn arp(config: &CadenzaConfig, args: &GenerateArgs, options: ArpOptions) -> anyhow::Result<String> {
    let mut plan = plan(config, args)?;
    let mut style = ArpStyle::new(options.pattern.as_deref().map(ArpPattern::from_name_or_default).unwrap_or_default());
    if let Some(name) = &options.rhythm {
        style.rhythm = RhythmPattern::from_name_or_default(name);
    }
    style.octaves = options.octaves.unwrap_or(style.octaves);
    style.gate = options.gate.unwrap_or(style.gate);
    let notes = generate_arpeggio(&plan.progression, &style, plan.settings.bars, plan.settings.tempo, &mut plan.rng);
    finish(plan, notes, args)
}

// ============================================================================
// Quantize
// ============================================================================

pub struct QuantizeOptions {
    pub preset: Option<String>,
    pub grid: Option<String>,
    pub mode: Option<String>,
    pub strength: Option<f32>,
    pub swing: Option<f32>,
    pub groove: Option<String>,
    pub seconds_at: Option<f64>,
}

fn quantize_settings(config: &CadenzaConfig, options: &QuantizeOptions) -> anyhow::Result<QuantizationSettings> {
    let mut settings = match &options.preset {
        Some(name) => QuantizationSettings::preset(name).with_context(|| format!("unknown preset {name:?}"))?,
        None => config.quantize.settings(),
    };
    if let Some(grid) = &options.grid {
        settings.grid = GridValue::from_name(grid).with_context(|| format!("unknown grid {grid:?}"))?;
    }
    if let Some(mode) = &options.mode {
        settings = settings.with_mode(QuantizeMode::from_name(mode).with_context(|| format!("unknown mode {mode:?}"))?);
    }
    if let Some(strength) = options.strength {
        settings = settings.with_strength(strength);
    }
    if let Some(swing) = options.swing {
        settings = settings.with_swing(swing);
    }
    if let Some(groove) = &options.groove {
        settings =
            settings.with_groove(GrooveTemplate::by_name(groove).with_context(|| format!("unknown groove {groove:?}"))?);
    }
    Ok(settings)
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

pub fn quantize(config: &CadenzaConfig, input: &Path, options: QuantizeOptions) -> anyhow::Result<String> {
    let settings = quantize_settings(config, &options)?;
    let notes: Vec<TimedNote> = serde_json::from_str(&read_input(input)?).context("parsing notes")?;
    let quantized = match options.seconds_at {
        Some(bpm) => quantize_seconds(&notes, &settings, bpm),
        None => cadenza_core::quantize(&notes, &settings),
    };
    info!(notes = quantized.len(), grid = %settings.grid, "Quantized");
    to_json(&quantized)
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Serialize)]
struct DetectedKey {
    key: String,
    root: String,
    scale: String,
}

pub fn detect_key(pitches: &[u8]) -> anyhow::Result<String> {
    let key = cadenza_core::detect_key(pitches);
    to_json(&DetectedKey {
        key: key.to_string(),
        root: key.root.name().to_string(),
        scale: key.scale.name().to_string(),
    })
}

pub fn grooves() -> anyhow::Result<String> {
    to_json(&built_in_grooves())
}

pub fn styles(config: &CadenzaConfig, genre: Option<&str>) -> anyhow::Result<String> {
    let catalog = catalog(config)?;
    match genre {
        Some(g) => to_json(&catalog.presets_for_genre(g)),
        None => to_json(&catalog.presets()),
    }
}
