//! `GET /{project}/json` (spec.md §4.H).

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use pep440_rs::Version;
use serde_json::{json, Value};

use crate::catalog::{Artifact, Project};
use crate::error::AppError;
use crate::normalize::canonical;
use crate::urlutil::found;
use crate::AppState;

fn release_entry(artifact: &Artifact) -> Value {
    json!({
        "filename": artifact.filename,
        "version": artifact.version,
        "packagetype": artifact.kind.to_string(),
        "size": artifact.size,
    })
}

/// Pick the artifact whose version is newest under real PEP 440 ordering,
/// falling back to lexicographic order for any version string that doesn't
/// parse (spec.md §4.H doesn't require rejecting malformed versions).
fn newest_artifact(project: &Project) -> Option<&Artifact> {
    project.artifacts.iter().max_by(|a, b| match (Version::from_str(&a.version), Version::from_str(&b.version)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.version.cmp(&b.version),
    })
}

pub async fn json_info(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
) -> Result<Response, AppError> {
    let canonical_name = canonical(&project);
    if canonical_name != project {
        return Ok(found(&format!("/{canonical_name}/json")));
    }

    let catalog = state.catalog.snapshot()?;
    let project = catalog.project(&canonical_name).ok_or_else(|| AppError::NotFound(canonical_name.clone()))?;

    let newest = newest_artifact(&project).expect("a Project always has at least one artifact");
    let info = json!({
        "name": canonical_name,
        "version": newest.version,
        "summary": newest.version,
    });

    let mut releases: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for artifact in &project.artifacts {
        releases.entry(artifact.version.clone()).or_default().push(release_entry(artifact));
    }

    Ok(Json(json!({ "info": info, "releases": releases })).into_response())
}
