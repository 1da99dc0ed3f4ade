use clap::Parser;
use std::path::PathBuf;

/// School result daemon speaking line-delimited JSON on stdin/stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "resultd", version, about)]
pub struct Config {
    /// Workspace directory to open at startup.
    #[arg(long, env = "RESULTD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Log filter directive, e.g. `resultd=debug`. Logs go to stderr.
    #[arg(long = "log", env = "RESULTD_LOG", default_value = "resultd=info")]
    pub log_filter: String,

    /// Username of the admin seeded into an empty workspace.
    #[arg(long, env = "RESULTD_ADMIN_USERNAME", default_value = "admin1")]
    pub admin_username: String,

    /// Password for the seeded admin. No admin is seeded without it.
    #[arg(long, env = "RESULTD_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl Config {
    pub fn default_admin(&self) -> Option<(&str, &str)> {
        self.admin_password
            .as_deref()
            .map(|p| (self.admin_username.as_str(), p))
    }
}
