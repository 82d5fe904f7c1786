//! Reconstructs the external base URL from forwarding headers and provides
//! the strict percent-encoder every handler must run dynamic values through
//! before they reach a header or an HTML body.
//!
//! The encoder/escaper pairing is grounded on
//! `astral-sh-uv/crates/uv-client/Cargo.toml`, which depends on both
//! `percent-encoding` and `html-escape` side by side for exactly this split
//! (URL-safe vs. HTML-safe).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes that must be percent-encoded when a dynamic value is interpolated
/// into a URL: everything except alphanumerics and a small set of characters
/// that are safe in every URL component we build (`-._~:/`). This always
/// encodes CR, LF, space, quotes, and angle brackets — the injection-prone
/// bytes spec.md calls out by name.
const STRICT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':')
    .remove(b'/');

/// Percent-encode `s` for safe inclusion in a URL (header value or HTML
/// `href`). Never emits a raw CR or LF, regardless of input.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, STRICT).to_string()
}

/// HTML-escape `s` for safe inclusion in HTML body text or attribute values.
pub fn escape_html(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// A `302 Found` redirect to `location`. `axum::response::Redirect::to`
/// emits `303 See Other`, which isn't the status this protocol uses —
/// normalization, fallback, and project-listing redirects are all `302`.
pub fn found(location: &str) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header("location", location)
        .body(axum::body::Body::empty())
        .expect("a redirect response with a known-good header value never fails to build")
        .into_response()
}

/// The externally-visible scheme/authority/path-prefix a request resolves
/// to, used to build every absolute link a handler emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    pub scheme: String,
    pub authority: String,
    /// Leading `/`, no trailing `/`. Empty string if the server is mounted
    /// at the root.
    pub path_prefix: String,
}

impl BaseUrl {
    /// Resolve from the request's own scheme/host plus any forwarding
    /// headers. `X-Forwarded-Host` overrides `Host` (and may carry a path
    /// component); `X-Forwarded-Proto` overrides the connection scheme.
    pub fn resolve(
        connection_scheme: &str,
        host_header: Option<&str>,
        forwarded_host: Option<&str>,
        forwarded_proto: Option<&str>,
    ) -> Self {
        let scheme = forwarded_proto.unwrap_or(connection_scheme).to_string();

        let (authority, path_prefix) = match forwarded_host {
            Some(fwd) => split_authority_and_path(fwd),
            None => (host_header.unwrap_or("localhost").to_string(), String::new()),
        };

        Self { scheme, authority, path_prefix }
    }

    /// `scheme://authority/path_prefix`, with every dynamic component
    /// percent-encoded. No trailing slash. Used only where an absolute URL
    /// is required (the `{{URL}}` welcome-page variable) — every internal
    /// link/redirect is root-relative instead, matching the original
    /// implementation's `<a href="/priv/packages/">` style.
    pub fn origin(&self) -> String {
        format!(
            "{}://{}{}",
            encode_component(&self.scheme),
            encode_component(&self.authority),
            encode_path_prefix(&self.path_prefix),
        )
    }

    /// `{path_prefix}/simple/`
    pub fn simple_index_path(&self) -> String {
        format!("{}/simple/", encode_path_prefix(&self.path_prefix))
    }

    /// `{path_prefix}/packages/`
    pub fn packages_path(&self) -> String {
        format!("{}/packages/", encode_path_prefix(&self.path_prefix))
    }

    /// `{path_prefix}/simple/{canonical_project}/`
    pub fn simple_project_path(&self, canonical_project: &str) -> String {
        format!(
            "{}/simple/{}/",
            encode_path_prefix(&self.path_prefix),
            encode_component(canonical_project)
        )
    }

    /// `{path_prefix}/packages/{filename}`
    pub fn packages_artifact_path(&self, filename: &str) -> String {
        format!("{}/packages/{}", encode_path_prefix(&self.path_prefix), encode_component(filename))
    }
}

/// Encode a path prefix component-by-component, preserving internal `/`.
fn encode_path_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }
    prefix
        .split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}

/// Split `X-Forwarded-Host: host[:port][/path[/]]` into (authority,
/// path_prefix). Accepts a path component with or without a trailing slash,
/// normalizing both to the same `/path` form.
fn split_authority_and_path(forwarded: &str) -> (String, String) {
    match forwarded.split_once('/') {
        None => (forwarded.to_string(), String::new()),
        Some((authority, rest)) => {
            let trimmed = rest.trim_end_matches('/');
            let prefix = if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") };
            (authority.to_string(), prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_host_no_forwarding() {
        let base = BaseUrl::resolve("http", Some("systemexit.de"), None, None);
        assert_eq!(base.origin(), "http://systemexit.de");
    }

    #[test]
    fn forwarded_host_with_trailing_slash() {
        let base = BaseUrl::resolve("http", Some("localhost"), Some("forward.ed/priv/"), None);
        assert_eq!(base.origin(), "http://forward.ed/priv");
        assert_eq!(base.simple_index_path(), "/priv/simple/");
        assert_eq!(base.packages_path(), "/priv/packages/");
    }

    #[test]
    fn forwarded_host_without_trailing_slash_same_result() {
        let with_slash = BaseUrl::resolve("http", Some("localhost"), Some("forward.ed/priv/"), None);
        let without_slash = BaseUrl::resolve("http", Some("localhost"), Some("forward.ed/priv"), None);
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn forwarded_proto_overrides_scheme() {
        let base = BaseUrl::resolve("http", Some("host"), None, Some("https"));
        assert_eq!(base.origin(), "https://host");
    }

    #[test]
    fn malicious_forwarded_proto_never_emits_raw_newline() {
        let base = BaseUrl::resolve("http", Some("host"), None, Some("/\nSet-Cookie:malicious=1;"));
        let origin = base.origin();
        assert!(!origin.contains('\n'));
        assert!(!origin.contains('\r'));
        assert!(origin.contains("%0A"));
    }

    #[test]
    fn malicious_project_name_never_emits_raw_newline() {
        let base = BaseUrl::resolve("http", Some("host"), None, None);
        let path = base.simple_project_path("\nSet-Cookie:x=1");
        assert!(!path.contains('\n'));
        assert!(path.contains("%0A"));
    }

    #[test]
    fn escape_html_strips_raw_tags() {
        let escaped = escape_html("<alert>Red</alert>");
        assert!(!escaped.contains("<alert>"));
        assert!(escaped.contains("alert"));
    }
}
