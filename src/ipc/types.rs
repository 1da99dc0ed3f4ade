use std::path::PathBuf;

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
    /// (username, password) seeded into workspaces without admins.
    pub default_admin: Option<(String, String)>,
}

impl AppState {
    pub fn new(default_admin: Option<(String, String)>) -> Self {
        Self {
            workspace: None,
            db: None,
            default_admin,
        }
    }
}
