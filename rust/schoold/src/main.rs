mod calendar;
mod config;
mod ipc;
mod logging;
mod notice;
mod routine;
mod selection;
mod session;

use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;
    logging::init(&config)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        days = ?config.routine.days(),
        periods = config.routine.periods(),
        "schoold ready"
    );

    let mut state = ipc::AppState::new(&config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to answer with.
                tracing::warn!(error = %e, "unparseable request line");
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
        let _ = writeln!(stdout, "{}", resp);
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed; exiting");
    Ok(())
}
