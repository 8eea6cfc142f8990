mod config;
pub mod database;

pub use config::{Config, GoalsConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the StudySpark data directory, creating it if needed.
///
/// `STUDYSPARK_HOME` wins when set. Otherwise `~/.config/studyspark`, or
/// `~/.config/studyspark-dev` when `STUDYSPARK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYSPARK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYSPARK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyspark-dev")
            } else {
                base_dir.join("studyspark")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
