use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::currency::ExchangeRate;
use crate::entity::Currency;

#[derive(Parser, Debug)]
#[command(name = "tripbook")]
#[command(version, about = "An offline-first trip journal: notes, photos and expenses per day")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Day index to work on (0 is the first day of the itinerary)
    #[arg(long, short = 'd', global = true, default_value_t = 0)]
    pub day: u32,

    /// JPY to TWD exchange rate for this run (not saved)
    #[arg(long, global = true, value_name = "RATE")]
    pub rate: Option<ExchangeRate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new journal in the current directory
    Init,

    /// Show the itinerary with each day's spending
    Days {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Work with the notes of a day
    Note(NoteCommand),

    /// Work with the expenses of a day
    Expense(ExpenseCommand),

    /// Show spending totals in both currencies
    Total {
        /// Sum every day instead of only the selected one
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all notes, photos and expenses
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct NoteCommand {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand, Debug)]
pub enum NoteAction {
    /// Add a blank note
    Add {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the text of a note
    Edit {
        /// Note ID
        id: u64,

        /// New text
        #[arg(required_unless_present = "stdin")]
        text: Option<String>,

        /// Read the text from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },

    /// Attach a photo to a note (only the first file is used)
    Attach {
        /// Note ID
        id: u64,

        /// Image file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove the photo from a note
    Detach {
        /// Note ID
        id: u64,
    },

    /// Delete a note
    Delete {
        /// Note ID
        id: u64,
    },

    /// List the notes of the day
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ExpenseCommand {
    #[command(subcommand)]
    pub action: ExpenseAction,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseAction {
    /// Record an expense
    Add {
        /// What the money was spent on
        item: String,

        /// Amount, e.g. 1200 or 49.5
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Currency (JPY or TWD)
        #[arg(long, short = 'c', default_value = "JPY")]
        currency: Currency,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: u64,
    },

    /// List the expenses of the day with the day total
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
