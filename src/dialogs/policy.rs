use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POLICY_ENV_VAR: &str = "FRONTIER_DIALOG_CONFIG";
const POLICY_FILE_NAME: &str = "dialogs.yaml";

#[derive(Debug, Error)]
pub enum DialogPolicyError {
    #[error("failed to read dialog policy: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tunables for how a page's dialog session behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialogPolicy {
    /// Keep background alerts around and show them once the page is in
    /// the foreground. The page's callback still runs immediately.
    pub queue_background_alerts: bool,
    /// Forward suppression warnings to the page console.
    pub report_to_console: bool,
}

impl Default for DialogPolicy {
    fn default() -> Self {
        Self {
            queue_background_alerts: false,
            report_to_console: true,
        }
    }
}

impl DialogPolicy {
    /// Reads the policy at `config_path`. A missing path or file yields
    /// the defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, DialogPolicyError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Policy file location: `$FRONTIER_DIALOG_CONFIG`, else `dialogs.yaml`
    /// in the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(POLICY_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("org", "Frontier", "FrontierBrowser")
            .map(|dirs| dirs.config_dir().join(POLICY_FILE_NAME))
    }
}
