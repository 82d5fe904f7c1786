//! Route table assembly and the startup health-endpoint overlap check
//! (spec.md §4.F).
//!
//! Grounded on the `Router::new().route(...)` chain plus `TraceLayer`/
//! `CorsLayer` layering in the teacher's `server/src/main.rs`.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::handlers::{json_info, search, simple, upload, welcome};
use crate::urlutil::found;
use crate::AppState;

/// Every non-root path literal the fixed route table registers, used only by
/// [`check_health_overlap`]. Templated segments collapse to their static
/// prefix (`/packages/{filename}` → `/packages/`) since a prefix conflict is
/// what spec.md §9's Open Question asks us to reject. `/` itself is excluded
/// from prefix matching — every path is prefixed by `/`, so treating it as a
/// conflict source would reject every possible health endpoint; it only
/// conflicts on exact equality, checked separately below.
const FIXED_ROUTES: &[&str] =
    &["/packages", "/packages/", "/simple", "/simple/", "/RPC2", "/favicon.ico"];

/// Reject a `health_endpoint` that exactly equals, or is a path-prefix of (or
/// prefixed by), any registered route. Partial segment overlaps that aren't
/// on a `/`-boundary (e.g. `/simplex`) are not required to be rejected and
/// are accepted here.
fn check_health_overlap(health_endpoint: &str) -> Result<(), AppError> {
    if health_endpoint == "/" {
        return Err(AppError::ConfigError(format!(
            "health_endpoint '{health_endpoint}' overlaps with existing routes"
        )));
    }
    for route in FIXED_ROUTES {
        if overlaps(health_endpoint, route) {
            return Err(AppError::ConfigError(format!(
                "health_endpoint '{health_endpoint}' overlaps with existing routes"
            )));
        }
    }
    Ok(())
}

fn overlaps(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if !longer.starts_with(shorter) {
        return false;
    }
    // Only a boundary overlap counts: the next character of the longer
    // string must itself continue a path segment (`/`), not just share a
    // literal prefix like "/simple" vs "/simplex".
    shorter.ends_with('/') || longer.as_bytes()[shorter.len()] == b'/'
}

/// Build the full axum [`Router`], after validating `settings.health_endpoint`
/// doesn't collide with any other registered route.
pub fn build_router(state: Arc<AppState>) -> Result<Router, AppError> {
    check_health_overlap(&state.settings.health_endpoint)?;

    let router = Router::new()
        .route("/", get(welcome::welcome).post(upload::upload_or_remove))
        .route("/packages", get(|| async { found("/packages/") }))
        .route("/packages/", get(simple::packages_index))
        .route("/packages/{filename}", get(simple::serve_artifact))
        .route("/simple", get(|| async { found("/simple/") }))
        .route("/simple/", get(simple::simple_index))
        .route("/simple/{project}", get(simple::redirect_simple_project))
        .route("/simple/{project}/", get(simple::simple_project))
        .route("/{project}/json", get(json_info::json_info))
        .route("/RPC2", post(search::search))
        .route("/favicon.ico", get(not_found))
        .route(&state.settings.health_endpoint, get(welcome::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    Ok(router)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
