use std::path::PathBuf;

use memoria_core::SequencerConfig;
use memoria_services::RuntimeOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct PlayerConfig {
    #[serde(default)]
    pub player: PlayerSettings,
    #[serde(default)]
    pub sequencer: SequencerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PlayerSettings {
    #[serde(flatten)]
    pub runtime: RuntimeOptions,
    /// Stop after this many seconds; runs until killed when unset
    pub duration_secs: Option<f64>,
    /// Load and save histories under the data directory
    pub persist: bool,
    /// Overrides `<data_dir>/memoria/history`
    pub history_dir: Option<PathBuf>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            runtime: RuntimeOptions::default(),
            duration_secs: None,
            persist: true,
            history_dir: None,
        }
    }
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memoria")
        .join("config.toml")
}

pub(crate) fn parse_config(s: &str) -> Option<PlayerConfig> {
    toml::from_str(s).ok()
}

/// Missing or malformed files fall back to defaults
pub(crate) fn load_config() -> PlayerConfig {
    let path = config_path();
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| parse_config(&s))
        .unwrap_or_default()
}

pub(crate) fn save_config(config: &PlayerConfig) {
    let path = config_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(s) = toml::to_string_pretty(config) else { return };
    let _ = std::fs::write(&path, s);
}
