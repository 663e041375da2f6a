use clap::{Parser, Subcommand};

/// Find the best rental properties on Rightmove
#[derive(Debug, Parser)]
#[command(name = "crib-scout", version)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl with the given spider and store the results
    Crawl {
        #[arg(default_value = "rightmove")]
        spider: String,
        /// Crawl against a copy of the stored data and print instead of saving
        #[arg(long)]
        dry_run: bool,
    },
    /// List all spiders
    Spiders,
    /// Show stored properties, cheapest first
    Find {
        /// Highest monthly rent
        #[arg(long)]
        max_price: Option<i64>,
        #[arg(long, conflicts_with = "not_favorite")]
        favorite: bool,
        #[arg(long)]
        not_favorite: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Mark a property as favorite
    Favorite {
        id: String,
        #[arg(long)]
        unset: bool,
    },
    /// Ban a property so it is hidden and never crawled again
    Ban {
        id: String,
        #[arg(long)]
        unset: bool,
    },
    /// Set the floor area (square meters) of a property
    SetArea { id: String, sqm: f64 },
    /// Delete stored properties
    Clear {
        /// Delete banned properties too
        #[arg(long)]
        banned: bool,
        /// Delete favorite properties too
        #[arg(long)]
        favorite: bool,
    },
}

impl Command {
    /// The favorite filter of a `find` invocation
    pub fn favorite_filter(favorite: bool, not_favorite: bool) -> Option<bool> {
        match (favorite, not_favorite) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
