use std::fmt;
use std::path::{Path, PathBuf};

use instancer_core::export::DEFAULT_OUTPUT_PATH;
use instancer_core::instancing::{InstanceAttributeNames, NormalRotationMode};
use serde::Deserialize;

/// Extraction settings loaded from `instancer.toml`.
///
/// Every field is optional in the file:
///
/// ```toml
/// output_path = "cache/instancing/instance_data.json"
/// normal_rotation = "shortest_arc"
/// log_missing = true
///
/// [attributes]
/// position = "P"
/// prototype_prefix = "prototype"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InstancerConfig {
    pub attributes: InstanceAttributeNames,
    pub output_path: PathBuf,
    pub normal_rotation: NormalRotationMode,
    /// Log optional attributes that no part carries.
    pub log_missing: bool,
}

impl Default for InstancerConfig {
    fn default() -> Self {
        Self {
            attributes: InstanceAttributeNames::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            normal_rotation: NormalRotationMode::default(),
            log_missing: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Load a config from a TOML file.
pub fn load_config(path: &Path) -> Result<InstancerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a config, falling back to defaults if the file is missing or invalid.
pub fn load_or_default(path: &Path) -> InstancerConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded config: {}", path.display());
            config
        }
        Err(ConfigError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            log::info!("No config at {}, using defaults", path.display());
            InstancerConfig::default()
        }
        Err(e) => {
            log::warn!("{e}, using defaults");
            InstancerConfig::default()
        }
    }
}
