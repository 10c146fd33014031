//! Summary command implementation

use anyhow::Result;
use serde::Serialize;
use tally_core::BalanceSummary;

use super::{load, print_json, Session};

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub transactions: BalanceSummary,
    pub subscriptions: BalanceSummary,
}

pub async fn build_summary(session: &Session) -> Result<SummaryReport> {
    let (transactions, subscriptions) = tokio::try_join!(
        load(&session.ctx.transactions),
        load(&session.ctx.subscriptions),
    )?;

    Ok(SummaryReport {
        transactions: BalanceSummary::compute(&transactions, session.now),
        subscriptions: BalanceSummary::compute(&subscriptions, session.now),
    })
}

pub async fn cmd_summary(session: &Session) -> Result<()> {
    let report = build_summary(session).await?;

    if session.json {
        return print_json(&report);
    }

    println!();
    println!("💰 Balance as of {}", session.now.format("%Y-%m-%d %H:%M"));
    println!("   ─────────────────────────────────────────────────────────────");
    print_block(session, "Transactions", &report.transactions);
    println!();
    print_block(session, "Subscriptions (monthly)", &report.subscriptions);

    Ok(())
}

fn print_block(session: &Session, title: &str, s: &BalanceSummary) {
    println!("   {}", title);
    println!(
        "     Earnings  {:>16}   Received {:>14}   Upcoming {:>14}",
        session.money(s.planned_earnings),
        session.money(s.received_earnings),
        session.money(s.upcoming_earnings)
    );
    println!(
        "     Expenses  {:>16}   Paid     {:>14}   Upcoming {:>14}",
        session.money(s.planned_expenses),
        session.money(s.paid_expenses),
        session.money(s.upcoming_expenses)
    );
    println!("     Net       {:>16}", session.money(s.net_planned()));
}
