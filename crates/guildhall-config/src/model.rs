use std::path::PathBuf;

use guildhall_common::OrgId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub installation: InstallationConfig,
    pub organization: OrganizationConfig,
    pub l10n: L10nConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// TLS is terminated in front of the service, so generated URLs use https.
    pub https: bool,
    /// Prefer `X-Forwarded-Host` over `Host` when building the base URL.
    pub check_forwarded_host: bool,
    /// Fixed public URL; skips detection from request headers when set.
    pub public_url: Option<String>,
    /// Bearer token required by the registration and update endpoints.
    /// Without one those endpoints refuse every request.
    pub admin_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3888,
            https: false,
            check_forwarded_host: true,
            public_url: None,
            admin_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub table_prefix: String,
    pub minimum_version: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("guildhall.db"),
            table_prefix: "adm".to_string(),
            minimum_version: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallationConfig {
    /// Application root. Scripts are read from `<root>/installation/db_scripts`.
    pub root_dir: PathBuf,
    /// Script used by a fresh installation.
    pub install_script: String,
    /// Scripts replayed in order by an update.
    pub update_scripts: Vec<String>,
    pub download_url: String,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            install_script: "db.sql".to_string(),
            update_scripts: Vec::new(),
            download_url: "https://github.com/guildhall-org/guildhall/releases".to_string(),
        }
    }
}

impl InstallationConfig {
    pub fn scripts_dir(&self) -> PathBuf {
        self.root_dir.join("installation").join("db_scripts")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub id: OrgId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct L10nConfig {
    /// YAML map of message id to text, layered over the built-in catalog.
    pub catalog: Option<PathBuf>,
}
