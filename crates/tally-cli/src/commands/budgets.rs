//! Budgets command implementation

use anyhow::Result;
use tally_core::stats::{budget_progress, BudgetProgress};

use super::{load, print_json, truncate, Session};

pub async fn budget_report(session: &Session) -> Result<Vec<BudgetProgress>> {
    let (budgets, transactions) = tokio::try_join!(
        load(&session.ctx.budgets),
        load(&session.ctx.transactions),
    )?;

    Ok(budgets
        .iter()
        .map(|budget| budget_progress(budget, &transactions, session.now))
        .collect())
}

pub async fn cmd_budgets(session: &Session) -> Result<()> {
    let report = budget_report(session).await?;

    if session.json {
        return print_json(&report);
    }

    if report.is_empty() {
        println!("No budgets defined.");
        return Ok(());
    }

    println!();
    println!("🎯 Budgets for {}", session.now.format("%B %Y"));
    println!("   ─────────────────────────────────────────────────────────────");
    for progress in &report {
        let marker = if progress.is_exceeded() { "⚠️ " } else { "  " };
        println!(
            "   {}{:<20} {:>14} of {:>14} ({:>5.1}%)  left {}",
            marker,
            truncate(&progress.name, 20),
            session.money(progress.spent),
            session.money(progress.budget),
            progress.percent_used(),
            session.money(progress.remaining())
        );
    }

    Ok(())
}
