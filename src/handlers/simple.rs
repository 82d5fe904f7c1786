//! Simple-index / simple-project / flat packages listing / artifact
//! streaming (spec.md §4.G).
//!
//! Grounded on the state-read-then-render shape of the teacher's
//! `api_tree`/`api_file` handlers in `server/src/api.rs`; artifact bodies
//! stream via `tokio_util::io::ReaderStream` over `tokio::fs::File`, the
//! same `tokio-util`/`tokio::fs` pairing the pack's `astral-sh-uv` workspace
//! carries for exactly this purpose.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tokio_util::io::ReaderStream;

use crate::catalog::Artifact;
use crate::error::AppError;
use crate::handlers::base_url_from_headers;
use crate::normalize::canonical;
use crate::urlutil::{escape_html, found};
use crate::AppState;

fn render_listing(title: &str, links: &[(String, String)]) -> String {
    let mut body = format!("<!DOCTYPE html><html><head><title>{title}</title></head><body>\n");
    for (href, text) in links {
        body.push_str(&format!(
            "<a href=\"{}\">{}</a><br/>\n",
            escape_html(href),
            escape_html(text)
        ));
    }
    body.push_str("</body></html>\n");
    body
}

fn fragment_for(state: &AppState, artifact: &Artifact) -> String {
    match state.catalog.digest(&artifact.root, &artifact.filename) {
        Ok(hex) => format!("#sha256={hex}"),
        Err(_) => String::new(),
    }
}

/// `GET /simple/` — every distinct canonical project, ascending.
pub async fn simple_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let base = base_url_from_headers(&headers);
    let catalog = state.catalog.snapshot()?;
    let names = catalog.project_names();
    let links: Vec<(String, String)> =
        names.iter().map(|n| (base.simple_project_path(n), n.clone())).collect();
    Ok(Html(render_listing("Simple Index", &links)))
}

/// `GET /simple/{project}` (no trailing slash) — always redirects to the
/// canonical, slashed form.
pub async fn redirect_simple_project(
    headers: HeaderMap,
    Path(project): Path<String>,
) -> impl IntoResponse {
    let base = base_url_from_headers(&headers);
    found(&base.simple_project_path(&canonical(&project)))
}

/// `GET /simple/{project}/` — artifact listing for one project, or a
/// redirect to the canonical form, or a fallback redirect / 404.
pub async fn simple_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(project): Path<String>,
) -> Result<Response, AppError> {
    let base = base_url_from_headers(&headers);
    let canonical_name = canonical(&project);
    if canonical_name != project {
        return Ok(found(&base.simple_project_path(&canonical_name)));
    }

    let catalog = state.catalog.snapshot()?;
    let Some(mut project) = catalog.project(&canonical_name) else {
        if state.settings.disable_fallback {
            return Err(AppError::NotFound(canonical_name));
        }
        let fallback = format!("{}{}/", state.settings.fallback_url, canonical_name);
        return Ok(found(&fallback));
    };

    project.artifacts.sort_by(|a, b| a.filename.cmp(&b.filename));
    let links: Vec<(String, String)> = project
        .artifacts
        .iter()
        .map(|a| {
            let href = format!("{}{}", base.packages_artifact_path(&a.filename), fragment_for(&state, a));
            (href, a.filename.clone())
        })
        .collect();
    Ok(Html(render_listing(&canonical_name, &links)).into_response())
}

/// `GET /packages/` — every visible artifact across every project.
pub async fn packages_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let base = base_url_from_headers(&headers);
    let catalog = state.catalog.snapshot()?;
    let mut artifacts: Vec<&Artifact> = catalog.all_artifacts().iter().collect();
    artifacts.sort_by(|a, b| a.filename.cmp(&b.filename));
    let links: Vec<(String, String)> = artifacts
        .iter()
        .map(|a| {
            let href = format!("{}{}", base.packages_artifact_path(&a.filename), fragment_for(&state, a));
            (href, a.filename.clone())
        })
        .collect();
    Ok(Html(render_listing("Packages", &links)))
}

/// `GET /packages/{filename}` — stream an artifact's bytes.
pub async fn serve_artifact(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let (_root, file) = {
        let state = state.clone();
        let filename = filename.clone();
        tokio::task::spawn_blocking(move || state.catalog.open_artifact(&filename))
            .await
            .map_err(|e| AppError::IoError(e.to_string()))??
    };

    let tokio_file = tokio::fs::File::from_std(file);
    let stream = ReaderStream::new(tokio_file);
    let body = Body::from_stream(stream);

    let mut response = Response::builder().status(StatusCode::OK);
    if let Some(seconds) = state.settings.cache_control {
        if seconds > 0 {
            response = response.header("cache-control", format!("public, max-age={seconds}"));
        }
    }
    Ok(response.body(body).expect("building a response with a streamed body never fails"))
}
