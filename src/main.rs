mod aggregate;
mod identity;
mod ipc;
mod setup;

use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// stdout carries the protocol, so logs go to stderr.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn load_setup() -> anyhow::Result<setup::Setup> {
    let mut setup = setup::Setup::default();
    if let Some(raw) = std::env::var_os(setup::OVERRIDES_ENV) {
        let path = PathBuf::from(raw);
        setup.apply_overrides_file(&path)?;
        info!(path = %path.display(), "applied setup overrides");
    }
    Ok(setup)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let mut state = ipc::AppState {
        setup: load_setup()?,
    };
    info!(version = env!("CARGO_PKG_VERSION"), "schooldeskd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                warn!(error = %e, "unparseable request line");
                let reply = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                writeln!(stdout, "{}", reply)?;
                stdout.flush()?;
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        writeln!(stdout, "{}", resp)?;
        stdout.flush()?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
