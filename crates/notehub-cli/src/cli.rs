use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use notehub_core::ViewFilter;

#[derive(Parser)]
#[command(name = "notehub")]
#[command(about = "Cloud-synced notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Note service base URL (overrides config file and NOTEHUB_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Account email (defaults to NOTEHUB_EMAIL)
    #[arg(long, global = true, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Id token issued by the identity provider (defaults to NOTEHUB_ID_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Path to a JSON client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes
    #[command(alias = "ls")]
    List {
        /// Which notes to show
        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// Only notes whose title or content contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "add")]
    New {
        /// Note title
        #[arg(long)]
        title: Option<String>,
        /// Note content
        #[arg(long)]
        content: Option<String>,
    },
    /// Show a note with its full content
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a note's title or content
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content (opens $EDITOR when neither flag is given)
        #[arg(long)]
        content: Option<String>,
    },
    /// Toggle a note's favorite flag
    #[command(alias = "fav")]
    Favorite {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Bring a trashed note back into the main view
    Restore {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Permanently delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Upload files and attach them to a note
    Attach {
        /// Note ID or unique ID prefix
        id: String,
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove an attachment from a note
    Detach {
        /// Note ID or unique ID prefix
        id: String,
        /// Attachment storage key
        attachment_id: String,
    },
    /// Permanently delete every note in the trash
    EmptyTrash,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FilterArg {
    All,
    Favorites,
    Trash,
}

impl From<FilterArg> for ViewFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Favorites => Self::Favorites,
            FilterArg::Trash => Self::Trash,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
