mod calc;
mod config;
mod db;
mod ipc;
mod model;

use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, prelude::*};

fn main() {
    let (cfg, problems) = config::Config::from_env();

    // stdout carries responses; logs go to stderr.
    let fmt = fmt::layer()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false);
    tracing_subscriber::registry()
        .with(fmt)
        .with(cfg.log_level)
        .init();

    for p in &problems {
        tracing::warn!("{p}; using defaults");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "scrudd starting");

    let mut state = ipc::AppState::default();
    if let Some(path) = cfg.workspace.as_deref() {
        if let Err(e) = ipc::select_workspace(&mut state, path) {
            tracing::error!(workspace = %path.display(), "failed to open workspace: {e:#}");
        }
    }

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
                tracing::warn!("bad request line: {e}");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
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
