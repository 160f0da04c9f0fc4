use std::env;
use std::path::PathBuf;

use log::info;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_FILE: &str = ".surveymate_session.json";

/// Runtime configuration, read from the environment (with `.env` support)
/// and falling back to development defaults.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the survey backend, e.g. `http://localhost:8000`.
    pub api_base: String,
    /// Where the persistent session store lives.
    pub session_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // .env is optional; system environment wins when both define a key.
        dotenvy::dotenv().ok();

        let api_base = env::var("SURVEYMATE_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let session_file = env::var("SURVEYMATE_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE));

        info!("后端地址: {}", api_base);

        Self {
            api_base,
            session_file,
        }
    }
}
