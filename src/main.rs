mod auth;
mod backup;
mod config;
mod db;
mod error;
mod grading;
mod import;
mod ipc;
mod marks;
mod model;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    let cfg = config::Config::parse();

    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_new(&cfg.log_filter).unwrap_or_else(|e| {
        eprintln!("invalid log filter {:?}: {e}", cfg.log_filter);
        EnvFilter::new("resultd=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let default_admin = cfg
        .default_admin()
        .map(|(u, p)| (u.to_string(), p.to_string()));
    let mut state = ipc::AppState::new(default_admin);

    if let Some(workspace) = cfg.workspace.as_deref() {
        if let Err(e) = ipc::open_workspace(&mut state, workspace) {
            tracing::error!(workspace = %workspace.to_string_lossy(), error = %e, "failed to open workspace");
        }
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "resultd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, exiting");
}
