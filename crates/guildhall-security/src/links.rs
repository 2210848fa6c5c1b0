use guildhall_common::{Error, Result};
use url::Url;

/// Build an absolute link from `base` and `path`, appending `params` as an
/// encoded query string.
///
/// `base` is the deployment root (`https://example.org/club`); `path` is
/// appended below it whether or not it starts with a slash.
pub fn encode_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<String> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url =
        Url::parse(&joined).map_err(|e| Error::Security(format!("invalid url {joined}: {e}")))?;

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter().copied());
    }
    Ok(url.into())
}
