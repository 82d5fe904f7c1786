//! Request handlers, one module per route family (spec.md §4.F's table).

pub mod json_info;
pub mod search;
pub mod simple;
pub mod upload;
pub mod welcome;

use axum::http::HeaderMap;

use crate::urlutil::BaseUrl;

/// The scheme assumed for the connection itself, absent any forwarding
/// header. `pindex` never terminates TLS directly — a real deployment puts
/// it behind a proxy that sets `X-Forwarded-Proto` when it's HTTPS in front.
const CONNECTION_SCHEME: &str = "http";

/// Resolve the external base URL for the current request from its headers,
/// per spec.md §4.E.
pub(crate) fn base_url_from_headers(headers: &HeaderMap) -> BaseUrl {
    let host = headers.get("host").and_then(|v| v.to_str().ok());
    let forwarded_host = headers.get("x-forwarded-host").and_then(|v| v.to_str().ok());
    let forwarded_proto = headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok());
    BaseUrl::resolve(CONNECTION_SCHEME, host, forwarded_host, forwarded_proto)
}
