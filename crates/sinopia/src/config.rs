//! Configuration file loading for sinopia.
//!
//! Reads `sinopia.config.json` from the working directory, falling back to
//! the user's config directory (`~/.config/sinopia/` on Linux).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sinopia_atelier_dom::DomCompilerOptions;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "sinopia.config.json";

/// Top-level sinopia configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinopiaConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Template compiler options; CLI flags override them.
    #[serde(default)]
    pub compiler: DomCompilerOptions,

    #[serde(default)]
    pub build: BuildConfig,
}

/// Configuration for the `build` command.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Output directory used when `--output` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    /// File extensions treated as templates (default: `["html"]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

impl BuildConfig {
    pub fn extensions(&self) -> Vec<String> {
        self.extensions
            .clone()
            .unwrap_or_else(|| vec!["html".to_string()])
    }
}

/// The config file that applies to `dir` (or the CWD), if any.
pub fn find_config(dir: Option<&Path>) -> Option<PathBuf> {
    let base = dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let local = base.join(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("sinopia").join(CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Load the config that applies to `dir`; no file means the defaults.
pub fn load_config(dir: Option<&Path>) -> Result<SinopiaConfig, ConfigError> {
    let Some(path) = find_config(dir) else {
        return Ok(SinopiaConfig::default());
    };
    tracing::debug!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

/// Like [`load_config`], but a broken file only warns.
pub fn load_config_or_default(dir: Option<&Path>) -> SinopiaConfig {
    load_config(dir).unwrap_or_else(|e| {
        eprintln!("\x1b[33mWarning:\x1b[0m {}", e);
        SinopiaConfig::default()
    })
}
