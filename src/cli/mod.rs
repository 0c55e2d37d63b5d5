pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "freshet")]
#[command(about = "A feed reader with a terminal front end", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe to a feed
    Add {
        /// URL of the feed to subscribe to
        url: String,
    },
    /// Unsubscribe from a feed (removes its entries)
    Remove {
        /// URL of the feed to remove
        url: String,
    },
    /// Fetch and reconcile every subscribed feed
    Update,
    /// List feeds or entries
    List {
        /// Show entries instead of feeds
        #[arg(long)]
        entries: bool,
    },
    /// Launch the terminal UI
    Tui,
}
