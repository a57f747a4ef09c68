use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(about = "Offline-first daily journal synced to a git-hosted repository", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the data directory (cache and config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Edit an entry in $EDITOR (today's by default)
    #[command(alias = "e")]
    Edit {
        /// Entry date, YYYY-MM-DD
        date: Option<String>,
    },

    /// Print an entry
    #[command(alias = "v")]
    Show {
        /// Entry date, YYYY-MM-DD
        date: Option<String>,
    },

    /// List entries
    #[command(alias = "ls")]
    List {
        /// Search term (matches dates and entry text)
        #[arg(short, long)]
        search: Option<String>,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Push pending entries to the remote
    Sync {
        /// Skip the remote index refresh
        #[arg(long)]
        no_refresh: bool,
    },

    /// Show cache and queue state
    Status,

    /// Export all cached entries
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormatArg::Json)]
        format: ExportFormatArg,
    },

    /// Import entries from a JSON export
    Import {
        /// Path to a daybook JSON export
        path: PathBuf,
    },

    /// Delete an entry locally and remotely
    Delete {
        /// Entry date, YYYY-MM-DD
        date: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Drop old synced entries from the local cache
    Prune {
        /// Keep this many recent entries (defaults to the configured value)
        #[arg(long)]
        keep: Option<usize>,
    },

    /// Show or change configuration (key value to set, nothing to show)
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExportFormatArg {
    Json,
    Archive,
}
