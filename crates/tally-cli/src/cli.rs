//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_core::FilterInput;

/// Tally - Track where your money goes
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Personal finance ledger: balances, filters and charts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding <collection>.json snapshots (implies local source)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Evaluate "now" at this instant instead of the current time
    ///
    /// Accepts RFC 3339 (2024-05-15T12:00:00Z) or a plain date (2024-05-15,
    /// taken as midnight UTC).
    #[arg(long, global = true)]
    pub now: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show balance figures for transactions and subscriptions
    Summary,

    /// List transactions
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List subscriptions
    Subscriptions {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Most frequent transaction receivers
    Receivers {
        /// Only count transactions of the last N days (defaults to config)
        #[arg(long)]
        days: Option<u32>,

        /// Maximum number of receivers to show (defaults to config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Count every transaction, ignoring the configured window
        #[arg(long, conflicts_with = "days")]
        all_time: bool,
    },

    /// Totals per category
    Categories {
        /// Break down income instead of expenses
        #[arg(long)]
        income: bool,
    },

    /// Income and expenses per month
    Monthly {
        /// Year to show (defaults to the year of --now)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Budget usage for the current month
    Budgets,
}

/// Filter flags shared by list commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Match receiver or description (case-insensitive)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Earliest date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Category ids, comma-separated
    #[arg(short, long)]
    pub category: Option<String>,

    /// Payment method ids, comma-separated
    #[arg(short, long)]
    pub payment_method: Option<String>,

    /// Minimum signed amount
    #[arg(long, allow_hyphen_values = true)]
    pub min: Option<String>,

    /// Maximum signed amount
    #[arg(long, allow_hyphen_values = true)]
    pub max: Option<String>,
}

impl From<FilterArgs> for FilterInput {
    fn from(args: FilterArgs) -> Self {
        FilterInput {
            keyword: args.keyword,
            categories: args.category,
            payment_methods: args.payment_method,
            date_from: args.from,
            date_to: args.to,
            price_from: args.min,
            price_to: args.max,
        }
    }
}
