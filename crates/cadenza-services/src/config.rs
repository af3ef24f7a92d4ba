//! User configuration stored as TOML under the platform config directory

use std::path::{Path, PathBuf};

use cadenza_core::quantize::GridValue;
use cadenza_core::{GrooveTemplate, Key, PitchClass, QuantizationSettings, Scale};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenzaConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub quantize: QuantizeConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Style preset file replacing the built-in catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles_path: Option<PathBuf>,
}

/// Defaults for the generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub key: String,
    pub scale: Scale,
    pub genre: String,
    pub chords: usize,
    pub bars: u32,
    pub tempo: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            key: "C".into(),
            scale: Scale::Major,
            genre: "Pop".into(),
            chords: 4,
            bars: 4,
            tempo: 120.0,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Root pitch class from `key`, C when it does not parse
    pub fn root(&self) -> PitchClass {
        PitchClass::from_name(&self.key).unwrap_or_else(|| {
            warn!(key = %self.key, "Unknown key in config, using C");
            PitchClass::C
        })
    }

    pub fn key(&self) -> Key {
        Key::new(self.root(), self.scale)
    }

    /// Seeded generator when a seed is configured, entropy otherwise
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => cadenza_core::seeded(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Defaults for the quantizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    /// Grid display name, e.g. "1/16" or "1/8T"
    pub grid: String,
    pub strength: f32,
    pub swing: f32,
    /// Built-in groove template name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groove: Option<String>,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            grid: GridValue::Sixteenth.name().into(),
            strength: 100.0,
            swing: 50.0,
            groove: None,
        }
    }
}

impl QuantizeConfig {
    pub fn settings(&self) -> QuantizationSettings {
        let mut settings = QuantizationSettings::new(GridValue::from_name_or_default(&self.grid))
            .with_strength(self.strength)
            .with_swing(self.swing);
        if let Some(name) = &self.groove {
            match GrooveTemplate::by_name(name) {
                Some(groove) => settings = settings.with_groove(groove),
                None => warn!(groove = %name, "Unknown groove in config, ignoring"),
            }
        }
        settings
    }
}

/// Live capture buffer sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub retention_seconds: f64,
    pub channel_capacity: usize,
    pub tempo: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            retention_seconds: 120.0,
            channel_capacity: 1024,
            tempo: 120.0,
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("config.toml")
}

/// Load from the default location. A missing file gives defaults.
pub fn load_config() -> Result<CadenzaConfig, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<CadenzaConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CadenzaConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let config = parse_config(&text)?;
    info!(path = %path.display(), "Config loaded");
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<CadenzaConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

pub fn save_config(config: &CadenzaConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &CadenzaConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text)?;
    info!(path = %path.display(), "Config saved");
    Ok(())
}
