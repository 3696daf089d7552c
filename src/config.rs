use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SWEEP_SECONDS: u64 = 15;

/// Process-level settings. Per-workspace settings live in the `settings`
/// table and are edited through `setup.update`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace to open at startup, before any `workspace.select`.
    pub workspace: Option<PathBuf>,
    /// How often the main loop checks the session for expiry.
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let workspace = env::var("ATTENDANCED_WORKSPACE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let sweep_seconds = match env::var("ATTENDANCED_SWEEP_SECONDS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => {
                    log::warn!(
                        "ignoring ATTENDANCED_SWEEP_SECONDS={:?}, using {}",
                        raw,
                        DEFAULT_SWEEP_SECONDS
                    );
                    DEFAULT_SWEEP_SECONDS
                }
            },
            Err(_) => DEFAULT_SWEEP_SECONDS,
        };

        Self {
            workspace,
            sweep_interval: Duration::from_secs(sweep_seconds),
        }
    }
}
