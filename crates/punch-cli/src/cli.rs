//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use punch_core::TypeFilter;
use punch_store::ScanQuery;

/// Track work sessions in a local store and report hours per day.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory override.
    #[arg(short = 'd', long, global = true)]
    pub datadir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start tracking a new entry.
    Start {
        /// Start date expression; defaults to now.
        #[arg(long)]
        date: Option<String>,

        /// Note attached to the entry.
        #[arg(short, long)]
        message: Option<String>,

        /// Type label, used for indexing and filtering.
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Stop an entry (the most recent when no stamp is given).
    Stop {
        /// Stamp of the entry to stop.
        stamp: Option<String>,

        /// End date expression; defaults to now.
        #[arg(long)]
        date: Option<String>,

        /// Extra note, appended to the entry's message.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start a fresh entry cloning a previous one's message and type.
    Restart {
        /// Stamp of the entry to clone; defaults to the most recent.
        stamp: Option<String>,
    },

    /// Insert a closed entry with both endpoints known.
    Add {
        /// Start date expression.
        start: String,

        /// End date expression.
        end: String,

        /// Note attached to the entry.
        #[arg(short, long)]
        message: Option<String>,

        /// Type label, used for indexing and filtering.
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Show elapsed time when an entry is running.
    Status,

    /// List entries in start-time order.
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        range: RangeArgs,

        /// Include entry messages.
        #[arg(short, long)]
        long: bool,

        /// Print raw key/value rows instead of formatted lines.
        #[arg(long)]
        raw: bool,
    },

    /// Export entries as CSV.
    Csv {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Emit the canonical hour report as JSON.
    Data {
        #[command(flatten)]
        range: RangeArgs,

        /// Report title.
        #[arg(long, default_value = "consulting")]
        title: String,

        /// Hourly rate recorded in the report.
        #[arg(long)]
        rate: Option<f64>,
    },

    /// Print one entry's stored value.
    Get {
        /// Stamp of the entry.
        stamp: String,
    },

    /// Set a property: `punch set [STAMP] PROPERTY VALUE...`.
    ///
    /// Without a stamp the most recent entry is updated. `start`, `end`
    /// (alias `stop`), and `type` get date-merge or index-migration
    /// treatment; any other property is set verbatim, and an empty value
    /// deletes it.
    Set {
        #[arg(required = true, num_args = 2..)]
        args: Vec<String>,
    },

    /// Edit an entry, or one of its properties, in $EDITOR.
    Edit {
        /// Stamp of the entry.
        stamp: String,

        /// Property to edit; the whole value when omitted.
        property: Option<String>,
    },

    /// Write an empty entry under a stamp.
    Insert {
        /// Stamp for the new entry.
        stamp: String,
    },

    /// Remove entries and their index records.
    Rm {
        #[arg(required = true)]
        stamps: Vec<String>,
    },

    /// Archive entries by stamp, or every entry a range matches.
    Archive {
        stamps: Vec<String>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Unarchive entries by stamp, or every entry a range matches.
    Unarchive {
        stamps: Vec<String>,

        #[command(flatten)]
        range: RangeArgs,
    },
}

/// Range and filter options shared by the scanning commands.
#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Lower stamp bound (exclusive).
    #[arg(long)]
    pub gt: Option<String>,

    /// Upper stamp bound (exclusive).
    #[arg(long)]
    pub lt: Option<String>,

    /// Type filter: an exact label, or /pattern/.
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,

    /// Include archived entries.
    #[arg(long)]
    pub archive: bool,
}

impl RangeArgs {
    /// Resolves the raw arguments into a scan query, compiling any type
    /// filter once up front.
    pub fn to_query(&self) -> anyhow::Result<ScanQuery> {
        let kind = self
            .kind
            .as_deref()
            .map(TypeFilter::new)
            .transpose()?;
        Ok(ScanQuery {
            gt: self.gt.clone(),
            lt: self.lt.clone(),
            include_archived: self.archive,
            kind,
            ..ScanQuery::default()
        })
    }
}
