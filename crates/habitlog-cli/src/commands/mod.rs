pub mod category;
pub mod config;
pub mod stats;
pub mod tracker;

use habitlog_core::storage::Config;

/// Enforce the configured name/title character limit at the input boundary.
pub(crate) fn check_name_limit(value: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    let limit = Config::load()?.input.name_limit;
    if value.chars().count() > limit {
        return Err(format!("{what} exceeds the {limit}-character limit").into());
    }
    Ok(())
}
