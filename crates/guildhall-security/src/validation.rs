use std::sync::LazyLock;

use guildhall_common::{Error, Result};
use regex::Regex;

/// `host` or `host:port`, hostname or bracketed IPv6 literal.
static HOST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9.-]{0,251}[A-Za-z0-9])?|\[[0-9A-Fa-f:.]+\])(?::[0-9]{1,5})?$")
        .unwrap_or_else(|e| panic!("invalid host pattern: {e}"))
});

/// Input validation and escaping for request data and rendered output.
pub struct InputValidator;

impl InputValidator {
    /// Escape text for use inside HTML content or a double-quoted attribute.
    pub fn escape_html(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#039;"),
                _ => out.push(c),
            }
        }
        out
    }

    /// Remove control characters, keeping newlines and tabs.
    pub fn sanitize(input: &str) -> String {
        input
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect()
    }

    /// Whether a `Host`-style header value is syntactically a host with an
    /// optional port. Says nothing about whether the value can be trusted.
    pub fn is_valid_host(value: &str) -> bool {
        HOST_PATTERN.is_match(value)
    }

    /// Validate a user UUID taken from a request path.
    pub fn validate_uuid(id: &str) -> Result<()> {
        uuid::Uuid::parse_str(id)
            .map(|_| ())
            .map_err(|_| Error::Security(format!("malformed uuid: {}", Self::sanitize(id))))
    }
}

#[cfg(test)]
mod tests {
    use super::InputValidator;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            InputValidator::escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
        assert_eq!(InputValidator::escape_html("plain@example.org"), "plain@example.org");
    }

    #[test]
    fn sanitizes_control_chars_but_keeps_newlines_and_tabs() {
        let input = "hello\u{0000}\u{001F}\n\tworld";
        assert_eq!(InputValidator::sanitize(input), "hello\n\tworld");
    }

    #[test]
    fn host_validation_accepts_hosts_and_ports() {
        assert!(InputValidator::is_valid_host("example.org"));
        assert!(InputValidator::is_valid_host("proxy.example.com:8443"));
        assert!(InputValidator::is_valid_host("[::1]:8080"));
        assert!(InputValidator::is_valid_host("localhost"));
    }

    #[test]
    fn host_validation_rejects_url_fragments() {
        assert!(!InputValidator::is_valid_host(""));
        assert!(!InputValidator::is_valid_host("evil.org/path"));
        assert!(!InputValidator::is_valid_host("user@evil.org"));
        assert!(!InputValidator::is_valid_host("a b"));
        assert!(!InputValidator::is_valid_host("example.org:port"));
    }

    #[test]
    fn validates_uuid_format() {
        assert!(InputValidator::validate_uuid("6f1c2b1e-4a3d-4c8e-9a53-2f7d7b0b8e11").is_ok());
        assert!(InputValidator::validate_uuid("not-a-uuid").is_err());
    }
}
