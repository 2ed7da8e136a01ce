//! Command-line arguments.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Recurrence evaluation and RFC 5545 interchange for rule sets
#[derive(Parser)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the next, previous, first and last occurrences of a rule set
    Recompute {
        /// Rule-set description (JSON)
        path: PathBuf,

        /// Reference instant for next/previous (RFC 3339, default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Encode a rule set as iCalendar text
    Export {
        /// Rule-set description (JSON)
        path: PathBuf,

        /// DTSTAMP written on every event (RFC 3339, default: now)
        #[arg(long)]
        dtstamp: Option<DateTime<Utc>>,
    },

    /// Decode iCalendar text into a rule-set description
    Import {
        /// Calendar file (.ics)
        path: PathBuf,
    },
}
