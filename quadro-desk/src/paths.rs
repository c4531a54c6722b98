/// Platform locations for the desk host.
/// Config lives at ~/.config/quadro/config.json (or platform equivalent),
/// the workspace under the platform data dir.
use std::path::PathBuf;

/// Default config path: ~/.config/quadro/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quadro")
        .join("config.json")
}

/// Directory holding one JSON file per storage key.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quadro")
}
