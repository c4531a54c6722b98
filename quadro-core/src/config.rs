/// Store configuration, read from a JSON file by the host.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    /// Storage key holding the workspace document.
    #[serde(default = "default_workspace_key")]
    pub workspace_key: String,
    /// Pre-workspace key holding a bare row array; read once for migration.
    #[serde(default = "default_legacy_key")]
    pub legacy_key: String,
    /// Maximum undo depth. `None` keeps every snapshot.
    #[serde(default)]
    pub history_limit: Option<usize>,
    #[serde(default = "default_project_name")]
    pub default_project_name: String,
    #[serde(default)]
    pub default_author: String,
}

fn default_workspace_key() -> String {
    "quadro-avaliacao.workspace".to_string()
}

fn default_legacy_key() -> String {
    "quadro-avaliacao.board".to_string()
}

fn default_project_name() -> String {
    "Novo projeto".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            workspace_key: default_workspace_key(),
            legacy_key: default_legacy_key(),
            history_limit: None,
            default_project_name: default_project_name(),
            default_author: String::new(),
        }
    }
}

/// Load config from path. Returns defaults if the file is missing or invalid.
pub fn load_config(path: &Path) -> BoardConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                "[quadro.config] Failed to parse config {}: {}",
                path.display(),
                e
            );
            BoardConfig::default()
        }),
        Err(_) => {
            log::info!(
                "[quadro.config] No config at {}, using defaults",
                path.display()
            );
            BoardConfig::default()
        }
    }
}
