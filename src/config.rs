//! Application-level configuration loading, including the runtime scale catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::game::Scale;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MINDSCALE_BACK_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    scales: Vec<Scale>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the baked-in default catalog.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        count = app_config.scales.len(),
                        "loaded scale catalog from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Build a configuration around an explicit catalog, bypassing disk.
    pub fn with_scales(scales: Vec<Scale>) -> Self {
        Self { scales }
    }

    /// The scale catalog assignments are drawn from.
    pub fn scales(&self) -> &[Scale] {
        &self.scales
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scales: default_scales(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    scales: Vec<RawScale>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let scales = value.scales.into_iter().map(Into::into).collect::<Vec<_>>();
        Self { scales }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single scale entry inside the configuration file.
struct RawScale {
    left: String,
    right: String,
}

impl From<RawScale> for Scale {
    fn from(value: RawScale) -> Self {
        Self {
            left: value.left,
            right: value.right,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn scale(left: &str, right: &str) -> Scale {
    Scale {
        left: left.to_string(),
        right: right.to_string(),
    }
}

/// Built-in scale catalog shipped with the binary.
fn default_scales() -> Vec<Scale> {
    vec![
        scale("cold", "hot"),
        scale("quiet", "loud"),
        scale("tiny", "enormous"),
        scale("ancient", "futuristic"),
        scale("ordinary", "bizarre"),
        scale("useless", "indispensable"),
        scale("fragile", "indestructible"),
        scale("cheap", "priceless"),
        scale("terrifying", "comforting"),
        scale("slow", "fast"),
        scale("soft", "hard"),
        scale("underrated", "overrated"),
        scale("forgettable", "unforgettable"),
        scale("casual", "formal"),
        scale("dry", "wet"),
        scale("guilty pleasure", "openly loved"),
        scale("low effort", "high effort"),
        scale("introvert", "extrovert"),
        scale("weekday", "weekend"),
        scale("science", "art"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_non_empty_and_distinct() {
        let config = AppConfig::default();
        let scales = config.scales();
        assert!(scales.len() >= 10);

        for (index, entry) in scales.iter().enumerate() {
            assert!(!entry.left.trim().is_empty());
            assert!(!entry.right.trim().is_empty());
            assert!(
                scales[index + 1..].iter().all(|other| other != entry),
                "duplicate scale entry `{} / {}`",
                entry.left,
                entry.right
            );
        }
    }

    #[test]
    fn raw_config_maps_into_catalog() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"scales":[{"left":"salty","right":"sweet"}]}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.scales(), &[scale("salty", "sweet")]);
    }
}
