mod config;
pub mod migrations;
pub mod store;

pub use config::{Config, InputConfig, UiConfig};
pub use store::TrackerStore;

use std::path::PathBuf;

/// Returns `~/.config/habitlog[-dev]/` based on HABITLOG_ENV.
///
/// Set HABITLOG_DATA_DIR to point somewhere else entirely (used by tests),
/// or HABITLOG_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("HABITLOG_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITLOG_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitlog-dev")
            } else {
                base_dir.join("habitlog")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
