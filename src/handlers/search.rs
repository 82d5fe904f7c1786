//! `POST /RPC2` — legacy XML-RPC `search` method (spec.md §4.J).
//!
//! Same state-read-then-render handler shape as the rest of `handlers/`;
//! the envelope itself is parsed/rendered by [`crate::xmlrpc`].

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::normalize::canonical;
use crate::xmlrpc::{parse_method_call, render_search_response, SearchResult};
use crate::AppState;

pub async fn search(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let call = parse_method_call(&body)
        .ok_or_else(|| AppError::BadRequest("malformed XML-RPC methodCall".to_string()))?;

    if call.method_name != "search" {
        return Err(AppError::BadRequest(format!(
            "Unsupported XML-RPC method: {}",
            call.method_name
        )));
    }

    let query = canonical(call.first_string_param.as_deref().unwrap_or(""));
    let catalog = state.catalog.snapshot()?;

    let mut results = Vec::new();
    for name in catalog.project_names() {
        let project = catalog.project(&name).expect("project_names() only returns existing projects");
        for version in project.versions() {
            if name.contains(&query) || version.contains(&query) {
                results.push(SearchResult {
                    name: name.clone(),
                    version: version.clone(),
                    summary: version,
                    pypi_ordering: results.len(),
                });
            }
        }
    }

    let xml = render_search_response(&results);
    Ok(([("content-type", "text/xml")], xml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PermissiveAuthGate, Settings};

    fn test_state(dir: &std::path::Path) -> Arc<AppState> {
        let settings = Settings {
            roots: vec![dir.to_path_buf()],
            backend: "simple-dir".to_string(),
            auth_ops: vec![],
            password_file: None,
            disable_fallback: false,
            fallback_url: "https://pypi.org/simple/".to_string(),
            cache_control: None,
            welcome_file: None,
            health_endpoint: "/health".to_string(),
            bind_all: false,
            log_format: "pretty".to_string(),
            verbose: 0,
            port: 8080,
        };
        Arc::new(AppState::new(settings, Arc::new(PermissiveAuthGate)).unwrap())
    }

    #[tokio::test]
    async fn search_matches_project_name_substring() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test-1.0.tar.gz"), b"x").unwrap();
        std::fs::write(dir.path().join("other-2.0.tar.gz"), b"x").unwrap();
        let state = test_state(dir.path());

        let body = "<xml><methodName>search</methodName><string>test</string></xml>".to_string();
        let response = search(State(state), body).await.unwrap().into_response();
        let xml = String::from_utf8(
            axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
        )
        .unwrap();
        assert!(xml.contains("<methodResponse>"));
        assert!(xml.contains("<string>test</string>"));
        assert!(xml.contains("<string>1.0</string>"));
        assert!(!xml.contains("other"));
    }

    #[tokio::test]
    async fn unsupported_method_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let body = "<xml><methodName>list_packages</methodName></xml>".to_string();
        let err = search(State(state), body).await.err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
