use axum::Json;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, StatusCode, Version};
use guildhall_installer::{InstallError, Installer};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::context::base_url;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// `GET /adm_program/installation/base-url`
pub async fn base_url_handler(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    version: Version,
    headers: HeaderMap,
) -> Json<Value> {
    let url = base_url(&state.config.gateway, &headers, &uri, version);
    Json(json!({ "base_url": url }))
}

/// `POST /adm_program/installation/update`
///
/// Replays the configured update scripts. A too-old engine answers 409, any
/// other failure 500; the body carries the localized message either way.
pub async fn update_handler(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    version: Version,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let detected_url = base_url(&state.config.gateway, &headers, &uri, version);
    let installation = &state.config.installation;
    let installer = Installer::new(
        state.db.as_ref(),
        installation.scripts_dir(),
        installation.download_url.clone(),
    );

    match installer.update(&installation.update_scripts) {
        Ok(report) => {
            info!("update finished for {detected_url}");
            Ok(Json(json!({
                "status": "ok",
                "base_url": detected_url,
                "report": report,
            })))
        }
        Err(e) => {
            warn!("update failed: {e}");
            let status = match e {
                InstallError::VersionMismatch { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err(ApiError::new(status, e.message(&state.l10n)))
        }
    }
}
