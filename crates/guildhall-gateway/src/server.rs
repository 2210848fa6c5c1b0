use std::sync::Arc;

use guildhall_common::Result;
use guildhall_config::AppConfig;
use guildhall_db::SqliteDatabase;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// The HTTP server that binds to the configured port and serves the modules.
pub struct GatewayServer {
    config: AppConfig,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);

        let db = SqliteDatabase::from_config(&self.config.database)?;
        info!(
            "database {} opened with table prefix {}",
            self.config.database.path.display(),
            self.config.database.table_prefix
        );

        if self.config.gateway.admin_token.is_none() {
            warn!("no admin token configured; registration and update endpoints will refuse all requests");
        }

        let state = Arc::new(AppState::new(self.config, Arc::new(db))?);
        let app = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("Guildhall gateway listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| guildhall_common::Error::Gateway(format!("server error: {e}")))?;

        Ok(())
    }
}
