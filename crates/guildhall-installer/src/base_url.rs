use guildhall_security::InputValidator;
use tracing::debug;

/// First path segment of everything the application serves. The base URL is
/// whatever precedes it.
pub const INSTALLATION_ROOT_SEGMENT: &str = "adm_program";

/// Request metadata needed to reconstruct the public URL.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Connection is (or is terminated as) TLS.
    pub https: bool,
    /// Protocol token such as `HTTP/1.1`.
    pub protocol: String,
    /// Local port the request arrived on.
    pub port: u16,
    pub host: Option<String>,
    pub forwarded_host: Option<String>,
    pub server_name: String,
    /// Path and query of the request, e.g. `/club/adm_program/x.php?a=1`.
    pub request_uri: String,
}

/// Rebuild the externally visible root URL of the deployment, e.g.
/// `https://example.org/club` for a request to
/// `https://example.org/club/adm_program/modules/registration`.
///
/// With `check_forwarded_host` the `X-Forwarded-Host` value wins over `Host`.
/// That header is client controlled; enable it only behind a proxy that
/// overwrites it.
pub fn resolve_base_url(request: &RequestInfo, check_forwarded_host: bool) -> String {
    let scheme = scheme(request);
    let port_suffix = if (!request.https && request.port == 80) || (request.https && request.port == 443)
    {
        String::new()
    } else {
        format!(":{}", request.port)
    };

    let forwarded = request
        .forwarded_host
        .as_deref()
        .filter(|_| check_forwarded_host)
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|h| InputValidator::is_valid_host(h));

    let host = match forwarded {
        Some(h) => h.to_string(),
        None => {
            let direct = request
                .host
                .as_deref()
                .map(str::trim)
                .filter(|h| InputValidator::is_valid_host(h))
                .unwrap_or(request.server_name.as_str());
            if has_explicit_port(direct) {
                direct.to_string()
            } else {
                format!("{direct}{port_suffix}")
            }
        }
    };

    let path = application_root_path(&request.request_uri);
    let url = format!("{scheme}://{host}{path}");
    debug!("resolved base url {url} from {}", request.request_uri);
    url
}

fn scheme(request: &RequestInfo) -> String {
    let protocol = request.protocol.to_ascii_lowercase();
    let name = match protocol.split_once('/') {
        Some((name, _)) if !name.is_empty() => name.to_string(),
        _ => "http".to_string(),
    };
    if request.https && !name.ends_with('s') {
        format!("{name}s")
    } else {
        name
    }
}

fn has_explicit_port(host: &str) -> bool {
    match host.strip_prefix('[') {
        Some(rest) => rest.contains("]:"),
        None => host.contains(':'),
    }
}

/// Path below which the application lives, without a trailing slash.
///
/// Cut at the installation root segment when present; otherwise the
/// directory of the requested resource.
fn application_root_path(request_uri: &str) -> &str {
    let path = request_uri
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let needle = format!("/{INSTALLATION_ROOT_SEGMENT}");
    let cut = path.match_indices(needle.as_str()).find_map(|(idx, _)| {
        let after = &path[idx + needle.len()..];
        (after.is_empty() || after.starts_with('/')).then_some(idx)
    });

    match cut {
        Some(idx) => &path[..idx],
        None => match path.rfind('/') {
            Some(idx) => &path[..idx],
            None => "",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(https: bool, port: u16, path: &str) -> RequestInfo {
        RequestInfo {
            https,
            protocol: "HTTP/1.1".into(),
            port,
            host: Some("example.org".into()),
            forwarded_host: None,
            server_name: "internal.local".into(),
            request_uri: path.into(),
        }
    }

    #[test]
    fn default_https_port_is_omitted() {
        let req = request(true, 443, "/adm_program/x.php");
        assert_eq!(resolve_base_url(&req, true), "https://example.org");
    }

    #[test]
    fn default_http_port_is_omitted() {
        let req = request(false, 80, "/club/adm_program/modules/registration?x=1");
        assert_eq!(resolve_base_url(&req, true), "http://example.org/club");
    }

    #[test]
    fn non_default_port_is_kept() {
        let req = request(true, 8080, "/adm_program/x.php");
        assert_eq!(resolve_base_url(&req, true), "https://example.org:8080");

        // 443 over plain http is not a default port
        let req = request(false, 443, "/adm_program/x.php");
        assert_eq!(resolve_base_url(&req, true), "http://example.org:443");
    }

    #[test]
    fn host_header_with_port_is_not_doubled() {
        let mut req = request(false, 8080, "/adm_program/");
        req.host = Some("example.org:8080".into());
        assert_eq!(resolve_base_url(&req, true), "http://example.org:8080");
    }

    #[test]
    fn forwarded_host_wins_when_checked() {
        let mut req = request(true, 8443, "/adm_program/installation/update");
        req.forwarded_host = Some("proxy.example.com".into());
        assert_eq!(resolve_base_url(&req, true), "https://proxy.example.com");
    }

    #[test]
    fn forwarded_host_is_ignored_when_not_checked() {
        let mut req = request(true, 443, "/adm_program/installation/update");
        req.forwarded_host = Some("proxy.example.com".into());
        assert_eq!(resolve_base_url(&req, false), "https://example.org");
    }

    #[test]
    fn first_forwarded_host_of_a_chain_is_used() {
        let mut req = request(true, 443, "/adm_program/");
        req.forwarded_host = Some("outer.example.com, inner.example.com".into());
        assert_eq!(resolve_base_url(&req, true), "https://outer.example.com");
    }

    #[test]
    fn malformed_hosts_fall_back() {
        let mut req = request(false, 80, "/adm_program/");
        req.forwarded_host = Some("evil.org/phish?".into());
        assert_eq!(resolve_base_url(&req, true), "http://example.org");

        req.host = None;
        assert_eq!(resolve_base_url(&req, true), "http://internal.local");

        req.port = 3888;
        assert_eq!(resolve_base_url(&req, true), "http://internal.local:3888");
    }

    #[test]
    fn segment_must_be_a_whole_path_component() {
        let req = request(false, 80, "/my_adm_program_copy/adm_program/index");
        assert_eq!(resolve_base_url(&req, true), "http://example.org/my_adm_program_copy");

        let req = request(false, 80, "/adm_programs/index.php");
        assert_eq!(resolve_base_url(&req, true), "http://example.org/adm_programs");
    }

    #[test]
    fn without_segment_the_request_directory_is_used() {
        let req = request(false, 80, "/club/index.php");
        assert_eq!(resolve_base_url(&req, true), "http://example.org/club");

        let req = request(false, 80, "/");
        assert_eq!(resolve_base_url(&req, true), "http://example.org");
    }

    #[test]
    fn scheme_falls_back_to_http() {
        let mut req = request(true, 443, "/adm_program/");
        req.protocol = String::new();
        assert_eq!(resolve_base_url(&req, true), "https://example.org");
    }
}
