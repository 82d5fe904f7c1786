//! Welcome page and health probe (spec.md §4.K).
//!
//! Grounded on the plain string-building style of the teacher's
//! `server/src/scan.rs` `describe()` helper — no templating crate, just
//! literal `.replace()` calls over a fixed variable set, per spec.md's own
//! "string-substitution functions over a fixed variable set" framing.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse};
use std::sync::Arc;

use crate::handlers::base_url_from_headers;
use crate::urlutil::{escape_html, BaseUrl};
use crate::AppState;

/// Substitute the fixed `{{NAME}}` variable set into `template`. `raw_query`
/// is the request's raw query string (if any), reflected into `{{URL}}`
/// exactly as received — HTML-escaped before insertion, since a client can
/// put anything there (spec.md §4.E's anti-XSS requirement).
pub(crate) fn render_welcome(
    template: &str,
    base: &BaseUrl,
    raw_query: Option<&str>,
    num_packages: usize,
) -> String {
    let mut url_var = format!("{}/", base.origin());
    if let Some(query) = raw_query {
        url_var.push('?');
        url_var.push_str(query);
    }

    template
        .replace("{{URL}}", &escape_html(&url_var))
        .replace("{{SIMPLE}}", &escape_html(&base.simple_index_path()))
        .replace("{{PACKAGES}}", &escape_html(&base.packages_path()))
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
        .replace("{{NUMPKGS}}", &num_packages.to_string())
}

pub async fn welcome(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> impl IntoResponse {
    let base = base_url_from_headers(&headers);
    let num_packages = state.catalog.snapshot().map(|c| c.project_count()).unwrap_or(0);
    let body = render_welcome(&state.welcome_template, &base, uri.query(), num_packages);
    Html(body)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "Ok")
}
