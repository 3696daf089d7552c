mod accounts;
mod calc;
mod config;
mod db;
mod error;
mod exchange;
mod ipc;
mod model;
mod roster;
mod seed;
mod session;
mod store;

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

fn write_line(stdout: &mut io::Stdout, value: &serde_json::Value) {
    let _ = writeln!(
        stdout,
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    );
    let _ = stdout.flush();
}

fn handle_line(state: &mut ipc::AppState, stdout: &mut io::Stdout, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    let req: ipc::Request = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            // No id to reply to.
            write_line(
                stdout,
                &serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                }),
            );
            return;
        }
    };
    log::debug!("request {} {}", req.id, req.method);
    let resp = ipc::handle_request(state, req);
    write_line(stdout, &resp);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = config::Config::from_env();
    let mut state = ipc::AppState::new();
    if let Some(path) = &config.workspace {
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            log::error!("could not open {}: {e:#}", path.to_string_lossy());
        }
    }

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdout = io::stdout();
    let mut next_sweep = Instant::now() + config.sweep_interval;
    loop {
        let wait = next_sweep.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(line) => handle_line(&mut state, &mut stdout, &line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if Instant::now() >= next_sweep {
            if let Some(ev) = ipc::handle_sweep(&mut state) {
                write_line(&mut stdout, &ev);
            }
            next_sweep = Instant::now() + config.sweep_interval;
        }
    }
    log::info!("stdin closed, exiting");
}
