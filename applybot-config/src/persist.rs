//! Writing config documents to disk and reading session configs back.
use applybot_common::SessionConfig;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }

    /// Guess the format from a file suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            other => Err(format!("unsupported config format: {other}")),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot tell the config format of {0}")]
    UnknownFormat(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Render `config` in `format`; JSON is pretty-printed.
pub fn render<T: Serialize>(config: &T, format: ConfigFormat) -> Result<String, PersistError> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Write `config` to `dir/config-<timestamp>.<ext>`, creating `dir`.
///
/// The timestamp is the current UTC time in ISO-8601 with `:` and `.`
/// replaced by `-`, so names sort chronologically.
pub fn save_config<T: Serialize>(
    config: &T,
    dir: &Path,
    format: ConfigFormat,
) -> Result<PathBuf, PersistError> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let path = dir.join(format!("config-{timestamp}.{}", format.extension()));
    std::fs::write(&path, render(config, format)?).map_err(io_error(&path))?;
    Ok(path)
}

/// Read a session config (control-plane layout) from a JSON or YAML file.
pub fn load_session_config(path: &Path) -> Result<SessionConfig, PersistError> {
    let format =
        ConfigFormat::from_path(path).ok_or_else(|| PersistError::UnknownFormat(path.into()))?;
    let raw = std::fs::read_to_string(path).map_err(io_error(path))?;
    Ok(match format {
        ConfigFormat::Json => serde_json::from_str(&raw)?,
        ConfigFormat::Yaml => serde_yaml::from_str(&raw)?,
    })
}
