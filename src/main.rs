//! `pindex` binary — thin CLI shell over the [`pindex`] library crate.
//!
//! Logging init, CLI parse, bind, and graceful shutdown follow the teacher's
//! `server/src/main.rs` almost verbatim in shape (the auto-port-scan loop is
//! dropped — spec.md §6 calls for a single fixed `--port`, default 8080).

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::{error, info};

use pindex::config::{Cli, Commands, PermissiveAuthGate, Settings};
use pindex::router::build_router;
use pindex::AppState;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down..."),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("received Ctrl+C, shutting down...");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "pindex", &mut std::io::stdout());
        return;
    }

    let log_format = cli.log_format.clone().unwrap_or_else(|| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("pindex=info".parse().unwrap());
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).with_target(false).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
    }

    let settings = match Settings::resolve(cli) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    for root in &settings.roots {
        if let Err(e) = std::fs::create_dir_all(root) {
            error!(root = %root.display(), error = %e, "could not create package root");
            std::process::exit(1);
        }
    }

    let bind_all = settings.bind_all;
    let port = settings.port;

    let state = match AppState::new(settings, Arc::new(PermissiveAuthGate)) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "failed to initialize server state");
            std::process::exit(1);
        }
    };

    let app = match build_router(state) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to build route table");
            std::process::exit(1);
        }
    };

    let bind_addr = if bind_all { "0.0.0.0" } else { "127.0.0.1" };
    let listener = match tokio::net::TcpListener::bind(format!("{bind_addr}:{port}")).await {
        Ok(l) => l,
        Err(e) => {
            error!(bind_addr, port, error = %e, "could not bind to address");
            std::process::exit(1);
        }
    };

    info!(bind_addr, port, "pindex listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.unwrap_or_else(|e| {
        error!(error = %e, "server exited with an error");
        std::process::exit(1);
    });
}
