//! TOML-backed style catalog

use std::path::Path;

use cadenza_core::{StyleCatalog, StylePreset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const BUILT_IN_STYLES: &str = include_str!("../presets/styles.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Style file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed style file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Duplicate style: {0}")]
    Duplicate(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StyleFile {
    #[serde(default, rename = "style")]
    styles: Vec<StylePreset>,
}

/// Style presets parsed from `[[style]]` tables
#[derive(Debug, Clone, Default)]
pub struct TomlStyleCatalog {
    presets: Vec<StylePreset>,
}

impl TomlStyleCatalog {
    /// The preset file compiled into the crate
    pub fn built_in() -> Result<Self, CatalogError> {
        Self::parse(BUILT_IN_STYLES)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&text)?;
        info!(path = %path.display(), styles = catalog.len(), "Style catalog loaded");
        Ok(catalog)
    }

    /// Load `path` when given, the built-in presets otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::built_in(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let file: StyleFile = toml::from_str(text)?;
        let mut presets: Vec<StylePreset> = Vec::with_capacity(file.styles.len());
        for preset in file.styles {
            if presets.iter().any(|p| p.name.eq_ignore_ascii_case(&preset.name)) {
                return Err(CatalogError::Duplicate(preset.name));
            }
            presets.push(preset);
        }
        Ok(Self { presets })
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn presets(&self) -> &[StylePreset] {
        &self.presets
    }
}

impl StyleCatalog for TomlStyleCatalog {
    /// Case-insensitive lookup by name
    fn preset(&self, name: &str) -> Option<StylePreset> {
        let name = name.trim();
        self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(name)).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.presets.iter().map(|p| p.name.clone()).collect()
    }
}
