use std::path::{Path, PathBuf};

use guildhall_common::{Error, Result};
use tracing::{info, warn};

use crate::model::AppConfig;

const DEFAULT_CONFIG_NAMES: &[&str] = &["guildhall.yml", "guildhall.yaml", "guildhall.toml"];

/// Reads `AppConfig` from YAML or TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config at `path`, picking the format from the extension.
    pub fn load(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = Self::parse(&contents, ext)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(contents: &str, ext: &str) -> Result<AppConfig> {
        match ext {
            "yml" | "yaml" => serde_yaml::from_str(contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
            "toml" => {
                toml::from_str(contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
            }
            other => Err(Error::Config(format!(
                "unsupported config extension: {other}"
            ))),
        }
    }

    /// Load `explicit` if given, otherwise the first default file found in
    /// `dir`, otherwise built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<AppConfig> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::discover(dir) {
            Some(path) => Self::load(&path),
            None => {
                warn!(
                    "no config file found in {}, using defaults",
                    dir.display()
                );
                Ok(AppConfig::default())
            }
        }
    }

    fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }
}
