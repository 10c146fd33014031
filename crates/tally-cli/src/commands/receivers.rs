//! Receivers command implementation

use anyhow::Result;
use tally_core::balance::unique_receivers;

use super::{load, print_json, Session};

/// Window and limit for the receivers view
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiverQuery {
    pub days: Option<u32>,
    pub limit: Option<usize>,
    pub all_time: bool,
}

pub async fn top_receivers(session: &Session, query: ReceiverQuery) -> Result<Vec<String>> {
    let transactions = load(&session.ctx.transactions).await?;

    let within_days = if query.all_time {
        None
    } else {
        query.days.or(session.receivers.within_days)
    };
    let limit = query.limit.unwrap_or(session.receivers.limit);

    let mut receivers = unique_receivers(&transactions, within_days, session.now);
    receivers.truncate(limit);
    Ok(receivers)
}

pub async fn cmd_receivers(session: &Session, query: ReceiverQuery) -> Result<()> {
    let receivers = top_receivers(session, query).await?;

    if session.json {
        return print_json(&receivers);
    }

    if receivers.is_empty() {
        println!("No receivers in this period.");
        return Ok(());
    }

    println!();
    println!("👥 Frequent receivers");
    println!("   ─────────────────────────────────────────────────────────────");
    for (i, receiver) in receivers.iter().enumerate() {
        println!("   {:>2}. {}", i + 1, receiver);
    }

    Ok(())
}
