//! Statistics commands for CLI.

use clap::Subcommand;
use habitlog_core::storage::TrackerStore;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Summary across the whole ledger
    Show,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = TrackerStore::open()?;

    match action {
        StatsAction::Show => {
            let summary = store.statistics()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
