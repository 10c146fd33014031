//! Monthly totals command implementation

use anyhow::Result;
use chrono::Datelike;
use tally_core::stats::{monthly_totals, MonthTotal};

use super::{load, print_json, Session};

pub async fn cmd_monthly(session: &Session, year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(|| session.now.year());
    let transactions = load(&session.ctx.transactions).await?;
    let months: Vec<MonthTotal> = monthly_totals(&transactions, year);

    if session.json {
        return print_json(&months);
    }

    println!();
    println!("📅 {}", year);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:<5} {:>14} {:>14} {:>14}",
        "", "Income", "Expenses", "Balance"
    );
    for month in &months {
        println!(
            "   {:<5} {:>14} {:>14} {:>14}",
            month.label(),
            session.money(month.income),
            session.money(month.expenses),
            session.money(month.balance())
        );
    }

    Ok(())
}
