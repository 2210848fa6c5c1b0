use axum::http::{HeaderMap, Uri, Version, header};
use guildhall_common::{Localization, OrgId, Result};
use guildhall_config::GatewayConfig;
use guildhall_db::{Database, SettingsManager};
use guildhall_installer::{RequestInfo, resolve_base_url};

use crate::state::AppState;

const FORWARDED_HOST: &str = "x-forwarded-host";

/// Everything a module needs for one request, passed explicitly instead of
/// living in globals.
pub struct ModuleContext<'a> {
    pub db: &'a dyn Database,
    pub l10n: &'a Localization,
    pub settings: SettingsManager,
    pub org_id: OrgId,
    /// Public root URL of the deployment, no trailing slash.
    pub base_url: String,
}

impl<'a> ModuleContext<'a> {
    pub fn for_request(
        state: &'a AppState,
        headers: &HeaderMap,
        uri: &Uri,
        version: Version,
    ) -> Result<Self> {
        let org_id = state.config.organization.id;
        let settings = SettingsManager::load(state.db.as_ref(), org_id)?;
        Ok(Self {
            db: state.db.as_ref(),
            l10n: &state.l10n,
            settings,
            org_id,
            base_url: base_url(&state.config.gateway, headers, uri, version),
        })
    }
}

/// Configured public URL, or the one reconstructed from the request.
pub fn base_url(config: &GatewayConfig, headers: &HeaderMap, uri: &Uri, version: Version) -> String {
    match &config.public_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => resolve_base_url(
            &request_info(config, headers, uri, version),
            config.check_forwarded_host,
        ),
    }
}

pub fn request_info(
    config: &GatewayConfig,
    headers: &HeaderMap,
    uri: &Uri,
    version: Version,
) -> RequestInfo {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    RequestInfo {
        https: config.https,
        protocol: format!("{version:?}"),
        port: config.port,
        host: header_str(header::HOST.as_str()),
        forwarded_host: header_str(FORWARDED_HOST),
        server_name: config.host.clone(),
        request_uri: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
    }
}
