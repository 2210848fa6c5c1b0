//! Steps shared by the installation and update flows: engine version check,
//! engine compatibility fixups, base URL detection and SQL script replay.

pub mod base_url;
pub mod checks;
pub mod error;
pub mod installer;
pub mod script;
pub mod version;

pub use base_url::{INSTALLATION_ROOT_SEGMENT, RequestInfo, resolve_base_url};
pub use checks::{check_database_version, disable_soundex_search_if_unsupported};
pub use error::InstallError;
pub use installer::{Installer, ScriptReport, UpdateReport};
pub use script::apply_sql_script;
pub use version::DatabaseVersion;

/// Version of this release, shown in installer messages.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
