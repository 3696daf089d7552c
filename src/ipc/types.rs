use std::path::PathBuf;

use crate::roster::Dashboard;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    /// Roster and attendance for the open workspace, mirrored to the store
    /// after every mutation.
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            db: None,
            dashboard: Dashboard::default(),
        }
    }
}
