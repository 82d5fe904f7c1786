//! The error type every fallible handler returns.
//!
//! Generalizes the repeated `Result<_, (StatusCode, Json<serde_json::Value>)>`
//! tuple pattern seen throughout the teacher's `server/src/api.rs` handlers
//! into one enum with a single `IntoResponse` impl, per spec.md §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::filename::BadFilename;
use crate::urlutil::escape_html;

#[derive(Debug)]
pub enum AppError {
    /// An uploaded or requested filename doesn't parse (spec §4.A).
    BadFilename(String),
    /// An upload collides with an artifact that already exists and the
    /// backend doesn't allow overwrite.
    Conflict(String),
    /// No such project, version, or artifact.
    NotFound(String),
    /// The request is malformed in some way not covered by a more specific
    /// variant (missing multipart field, unknown `:action`, ...).
    BadRequest(String),
    /// `--root`/`--config` points somewhere unusable, or the route table
    /// fails the health-endpoint overlap check at startup.
    ConfigError(String),
    /// A filesystem operation failed for a reason other than "not found".
    IoError(String),
    /// The configured `AuthGate` rejected the request.
    AuthRequired,
}

impl From<BadFilename> for AppError {
    fn from(e: BadFilename) -> Self {
        AppError::BadFilename(e.0)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(e.to_string())
        } else {
            AppError::IoError(e.to_string())
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadFilename(s) => write!(f, "Bad filename: {s}"),
            AppError::Conflict(s) => write!(f, "Package '{s}' already exists!"),
            // Pre-formatted by the caller: empty for a plain GET 404, or
            // "{name} ({version}) not found" for a removal (spec.md §7).
            AppError::NotFound(s) => write!(f, "{s}"),
            AppError::BadRequest(s) => write!(f, "{s}"),
            AppError::ConfigError(s) => write!(f, "Configuration error: {s}"),
            AppError::IoError(_) => write!(f, "Internal server error"),
            AppError::AuthRequired => write!(f, "Authentication required"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadFilename(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConfigError(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::IoError(detail) = &self {
            tracing::error!(error = %detail, "request failed with an I/O error");
        }
        // Every message that might embed user-supplied text (a filename, a
        // project name) is HTML-escaped; the body is JSON so this is belt
        // and suspenders, but it keeps the same error text safe to drop
        // straight into an HTML error page too.
        let message = escape_html(&self.to_string());
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec_table() {
        assert_eq!(AppError::BadFilename("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ConfigError("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::IoError("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::AuthRequired.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn io_not_found_maps_to_not_found_variant() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let app: AppError = io.into();
        assert!(matches!(app, AppError::NotFound(_)));
    }

    #[test]
    fn io_other_maps_to_io_error_variant() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let app: AppError = io.into();
        assert!(matches!(app, AppError::IoError(_)));
    }

    #[test]
    fn bad_filename_converts() {
        let bf = BadFilename("evil<script>.exe".to_string());
        let app: AppError = bf.into();
        assert!(matches!(app, AppError::BadFilename(_)));
    }

    #[test]
    fn conflict_message_matches_spec_wording() {
        let err = AppError::Conflict("foo_bar-1.0.tar.gz".to_string());
        assert_eq!(err.to_string(), "Package 'foo_bar-1.0.tar.gz' already exists!");
    }

    #[test]
    fn bad_filename_message_matches_spec_wording() {
        let err = AppError::BadFilename("whatever.exe".to_string());
        assert_eq!(err.to_string(), "Bad filename: whatever.exe");
    }
}
