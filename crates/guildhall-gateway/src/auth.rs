use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use guildhall_security::verify_admin_token;
use tracing::warn;

use crate::error::ApiResult;
use crate::state::SharedState;

/// Admit only requests carrying the configured admin bearer token.
pub async fn require_admin(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let verdict = verify_admin_token(
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
        state.config.gateway.admin_token.as_deref(),
    );

    if let Err(e) = verdict {
        warn!("rejected {} {}: {e}", request.method(), request.uri().path());
        return Err(e.into());
    }
    Ok(next.run(request).await)
}
