use guildhall_common::{Error, Result};
use subtle::ConstantTimeEq;

/// Longest `Authorization` header value that is looked at.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

/// Extract the token of a `Bearer` authorization header.
pub fn parse_bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or_else(|| Error::Unauthorized("missing authorization".into()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(Error::Unauthorized("authorization header too large".into()));
    }

    let (scheme, token) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(Error::Unauthorized("invalid authorization header".into()));
    }
    Ok(token)
}

/// Check the request's bearer token against the configured admin token.
/// No configured token means nobody is admitted.
pub fn verify_admin_token(header: Option<&str>, expected: Option<&str>) -> Result<()> {
    let expected = expected
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Unauthorized("no admin token configured".into()))?;
    let token = parse_bearer_token(header)?;

    if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid admin token".into()))
    }
}
