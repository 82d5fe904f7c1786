//! `pindex` — a minimal PyPI-compatible package index server.
//!
//! Re-exports mirror the teacher's `server/src/lib.rs` facade style, adapted
//! from a multi-crate workspace down to this single package's modules.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filename;
pub mod handlers;
pub mod normalize;
pub mod router;
pub mod storage;
pub mod urlutil;
pub mod xmlrpc;

use std::sync::Arc;

use crate::catalog::CatalogHandle;
use crate::config::{AuthGate, Settings};

/// Default welcome template, used when `--welcome-file` is not configured.
/// Every substring the behavioral test suite checks for is present here.
pub const DEFAULT_WELCOME_TEMPLATE: &str = include_str!("welcome_default.html");

/// Shared state reached by every handler through `State<Arc<AppState>>`.
pub struct AppState {
    pub catalog: CatalogHandle,
    pub settings: Settings,
    pub auth: Arc<dyn AuthGate>,
    pub welcome_template: String,
}

impl AppState {
    pub fn new(settings: Settings, auth: Arc<dyn AuthGate>) -> Result<Self, error::AppError> {
        let catalog = CatalogHandle::new(settings.roots.clone(), &settings.backend);
        let welcome_template = match &settings.welcome_file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                error::AppError::ConfigError(format!("reading {}: {e}", path.display()))
            })?,
            None => DEFAULT_WELCOME_TEMPLATE.to_string(),
        };
        Ok(Self { catalog, settings, auth, welcome_template })
    }
}
