//! Minimal XML-RPC for the `search` endpoint (spec.md §4.J).
//!
//! Request parsing is deliberately non-conformant: only `methodName` and the
//! first string-like parameter are extracted, since that's all the protocol
//! needs and the original test fixture itself posts a non-standard envelope
//! (`<xml><methodName>search</methodName><string>test</string></xml>`).
//! The emitted response, however, is built to the real `methodResponse`
//! grammar, since it has to survive Python's `xmlrpc.client.loads`.
//!
//! Has no teacher or pack analogue; hand-rolled with `regex`, a dependency
//! the teacher already carries for its own text-extraction handlers.

use regex::Regex;
use std::sync::OnceLock;

use crate::urlutil::escape_html;

fn method_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<methodName>([^<]*)</methodName>").unwrap())
}

fn first_string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<string>([^<]*)</string>").unwrap())
}

/// A parsed `methodCall`: the method name and, if present, the first
/// string-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method_name: String,
    pub first_string_param: Option<String>,
}

pub fn parse_method_call(body: &str) -> Option<MethodCall> {
    let method_name = method_name_re().captures(body)?.get(1)?.as_str().to_string();
    let first_string_param =
        first_string_re().captures(body).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
    Some(MethodCall { method_name, first_string_param })
}

/// One row of a `search` result: name, version, summary, and emission-order
/// `_pypi_ordering`.
pub struct SearchResult {
    pub name: String,
    pub version: String,
    pub summary: String,
    pub pypi_ordering: usize,
}

/// Render a `methodResponse` wrapping a single `<array>` of `<struct>`s, one
/// per result. An empty `results` still renders a well-formed response
/// containing one empty `<struct>` element, per spec.md §4.J.
pub fn render_search_response(results: &[SearchResult]) -> String {
    let members = if results.is_empty() {
        "<value><struct></struct></value>".to_string()
    } else {
        results
            .iter()
            .map(|r| {
                format!(
                    "<value><struct>\
<member><name>name</name><value><string>{}</string></value></member>\
<member><name>version</name><value><string>{}</string></value></member>\
<member><name>summary</name><value><string>{}</string></value></member>\
<member><name>_pypi_ordering</name><value><int>{}</int></value></member>\
</struct></value>",
                    escape_html(&r.name),
                    escape_html(&r.version),
                    escape_html(&r.summary),
                    r.pypi_ordering,
                )
            })
            .collect::<Vec<_>>()
            .join("")
    };

    format!(
        "<?xml version='1.0'?>\
<methodResponse><params><param><value><array><data>{members}</data></array></value></param></params></methodResponse>"
    )
}
