//! cadenza-services: live capture, style catalog and configuration

pub mod capture;
pub mod catalog;
pub mod config;

pub use capture::{
    CaptureError, CapturedClip, CapturedEvent, Intake, LoopInfo, MidiCapture, QuantizedCapture, detect_loop,
    detect_tempo, pair_notes,
};
pub use catalog::{CatalogError, TomlStyleCatalog};
pub use config::{
    CadenzaConfig, CaptureConfig, ConfigError, GenerationConfig, QuantizeConfig, config_path, load_config,
    load_config_from, save_config, save_config_to,
};
