//! Category management commands for CLI.

use clap::Subcommand;
use habitlog_core::storage::TrackerStore;
use uuid::Uuid;

use super::check_name_limit;

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a new category
    Create {
        /// Category title (unique, case-insensitive)
        title: String,
    },
    /// List categories with their trackers
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a category
    Rename {
        /// Category ID
        id: Uuid,
        /// New title
        title: String,
    },
    /// Delete a category, its trackers, and their records
    Delete {
        /// Category ID
        id: Uuid,
    },
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = TrackerStore::open()?;

    match action {
        CategoryAction::Create { title } => {
            check_name_limit(&title, "category title")?;
            let category = store.create_category(&title)?;
            println!("Category created: {} ({})", category.title, category.id);
        }
        CategoryAction::List { json } => {
            let categories = store.list_categories()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else if categories.is_empty() {
                println!("No categories yet");
            } else {
                for category in &categories {
                    println!("{} ({})", category.title, category.id);
                    for tracker in &category.trackers {
                        println!("  {} {} ({})", tracker.emoji, tracker.name, tracker.id);
                    }
                }
            }
        }
        CategoryAction::Rename { id, title } => {
            check_name_limit(&title, "category title")?;
            store.rename_category(id, &title)?;
            println!("Category renamed: {id}");
        }
        CategoryAction::Delete { id } => {
            store.delete_category(id)?;
            println!("Category deleted: {id}");
        }
    }
    Ok(())
}
