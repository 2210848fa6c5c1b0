use std::sync::Arc;

use guildhall_common::{Localization, Result};
use guildhall_config::AppConfig;
use guildhall_db::Database;
use tracing::info;

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<dyn Database + Send + Sync>,
    pub l10n: Localization,
}

impl AppState {
    pub fn new(config: AppConfig, db: Arc<dyn Database + Send + Sync>) -> Result<Self> {
        let l10n = match &config.l10n.catalog {
            Some(path) => {
                info!("loading message catalog from {}", path.display());
                Localization::with_overrides(path)?
            }
            None => Localization::builtin(),
        };
        Ok(Self { config, db, l10n })
    }
}

pub type SharedState = Arc<AppState>;
