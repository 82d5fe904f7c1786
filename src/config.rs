//! CLI flags, optional TOML config file, and the resolved [`Settings`] the
//! rest of the crate runs on (spec.md §6).
//!
//! The `Cli`/`Commands` derive shape and CLI-wins-over-file precedence are
//! lifted straight from the teacher's `server/src/main.rs`
//! (`Cli`/`Commands`, `--config`/`parse_repos_toml`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

/// Minimal PyPI-compatible package index server.
#[derive(Parser, Debug)]
#[command(name = "pindex", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Root directory to serve artifacts from (repeatable; first wins for
    /// ambiguous writes)
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Load the rest of these options from a TOML file (CLI flags still win)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Storage backend: simple-dir (always rescans) or cached-dir (default)
    #[arg(long)]
    pub backend: Option<String>,

    /// Operation name requiring authentication, e.g. "update" (repeatable)
    #[arg(long = "auth", value_name = "OP")]
    pub auth: Vec<String>,

    /// Path to a credentials file; "." disables authentication
    #[arg(long)]
    pub password_file: Option<PathBuf>,

    /// Disable redirecting unknown projects to the fallback index
    #[arg(long)]
    pub disable_fallback: bool,

    /// Base URL to redirect unknown projects to
    #[arg(long)]
    pub fallback_url: Option<String>,

    /// Cache-Control max-age in seconds for served artifacts
    #[arg(long)]
    pub cache_control: Option<u64>,

    /// Path to a welcome page template
    #[arg(long)]
    pub welcome_file: Option<PathBuf>,

    /// Path for the health probe
    #[arg(long)]
    pub health_endpoint: Option<String>,

    /// Bind to 0.0.0.0 instead of 127.0.0.1
    #[arg(long)]
    pub bind_all: bool,

    /// Log output format: pretty (default) or json
    #[arg(long)]
    pub log_format: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Port to bind (default 8080)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// The same keys as [`Cli`], all optional, read from `--config <path.toml>`.
#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub roots: Option<Vec<PathBuf>>,
    pub backend: Option<String>,
    pub auth: Option<Vec<String>>,
    pub password_file: Option<PathBuf>,
    pub disable_fallback: Option<bool>,
    pub fallback_url: Option<String>,
    pub cache_control: Option<u64>,
    pub welcome_file: Option<PathBuf>,
    pub health_endpoint: Option<String>,
    pub bind_all: Option<bool>,
    pub log_format: Option<String>,
    pub port: Option<u16>,
}

/// Fully-resolved configuration: CLI flags win over the TOML file, which
/// wins over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub roots: Vec<PathBuf>,
    pub backend: String,
    pub auth_ops: Vec<String>,
    pub password_file: Option<PathBuf>,
    pub disable_fallback: bool,
    pub fallback_url: String,
    pub cache_control: Option<u64>,
    pub welcome_file: Option<PathBuf>,
    pub health_endpoint: String,
    pub bind_all: bool,
    pub log_format: String,
    pub verbose: u8,
    pub port: u16,
}

const DEFAULT_FALLBACK_URL: &str = "https://pypi.org/simple/";
const DEFAULT_HEALTH_ENDPOINT: &str = "/health";
const DEFAULT_BACKEND: &str = "cached-dir";
const DEFAULT_PORT: u16 = 8080;

impl Settings {
    /// Resolve from parsed CLI flags, loading and merging `--config` if
    /// given. Returns `ConfigError` if the file can't be read or parsed.
    pub fn resolve(cli: Cli) -> Result<Self, crate::error::AppError> {
        let file = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    crate::error::AppError::ConfigError(format!(
                        "reading {}: {e}",
                        path.display()
                    ))
                })?;
                toml::from_str::<FileConfig>(&text).map_err(|e| {
                    crate::error::AppError::ConfigError(format!(
                        "parsing {}: {e}",
                        path.display()
                    ))
                })?
            }
            None => FileConfig::default(),
        };

        let roots = if !cli.roots.is_empty() {
            cli.roots
        } else {
            file.roots.unwrap_or_else(|| vec![PathBuf::from(".")])
        };
        if roots.is_empty() {
            return Err(crate::error::AppError::ConfigError("no roots configured".to_string()));
        }

        Ok(Settings {
            roots,
            backend: cli.backend.or(file.backend).unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            auth_ops: if !cli.auth.is_empty() { cli.auth } else { file.auth.unwrap_or_default() },
            password_file: cli.password_file.or(file.password_file),
            disable_fallback: cli.disable_fallback || file.disable_fallback.unwrap_or(false),
            fallback_url: cli
                .fallback_url
                .or(file.fallback_url)
                .unwrap_or_else(|| DEFAULT_FALLBACK_URL.to_string()),
            cache_control: cli.cache_control.or(file.cache_control),
            welcome_file: cli.welcome_file.or(file.welcome_file),
            health_endpoint: cli
                .health_endpoint
                .or(file.health_endpoint)
                .unwrap_or_else(|| DEFAULT_HEALTH_ENDPOINT.to_string()),
            bind_all: cli.bind_all || file.bind_all.unwrap_or(false),
            log_format: cli.log_format.or(file.log_format).unwrap_or_else(|| "pretty".to_string()),
            verbose: cli.verbose,
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Authentication remains an opaque external predicate per spec.md §1: this
/// trait is the seam a real deployment plugs a credentials check into.
/// `pindex` ships only the permissive default, since implementing the
/// predicate itself is explicitly out of scope.
pub trait AuthGate: Send + Sync {
    fn requires_auth(&self, operation: &str) -> bool;
    fn authenticate(&self, operation: &str, credentials: Option<&str>) -> bool;
}

/// Always authorizes every operation. The only `AuthGate` this crate ships.
pub struct PermissiveAuthGate;

impl AuthGate for PermissiveAuthGate {
    fn requires_auth(&self, _operation: &str) -> bool {
        false
    }

    fn authenticate(&self, _operation: &str, _credentials: Option<&str>) -> bool {
        true
    }
}
