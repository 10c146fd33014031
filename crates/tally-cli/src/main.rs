//! Tally CLI - Personal finance ledger
//!
//! Usage:
//!   tally summary                       Balance figures
//!   tally transactions --keyword rent   Filtered transaction list
//!   tally receivers --days 30           Most frequent receivers
//!   tally budgets                       Budget usage this month

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::{ReceiverQuery, Session};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let session = Session::open(
        cli.config.as_deref(),
        cli.data_dir.as_deref(),
        cli.now.as_deref(),
        cli.json,
    )?;

    match cli.command {
        Commands::Summary => commands::cmd_summary(&session).await,
        Commands::Transactions { filter } => {
            commands::cmd_transactions(&session, filter.into()).await
        }
        Commands::Subscriptions { filter } => {
            commands::cmd_subscriptions(&session, filter.into()).await
        }
        Commands::Receivers {
            days,
            limit,
            all_time,
        } => {
            commands::cmd_receivers(
                &session,
                ReceiverQuery {
                    days,
                    limit,
                    all_time,
                },
            )
            .await
        }
        Commands::Categories { income } => commands::cmd_categories(&session, income).await,
        Commands::Monthly { year } => commands::cmd_monthly(&session, year).await,
        Commands::Budgets => commands::cmd_budgets(&session).await,
    }
}
