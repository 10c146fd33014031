//! Category breakdown command implementation

use anyhow::Result;
use tally_core::stats::{category_breakdown, CategoryTotal, FlowKind};

use super::{load, print_json, truncate, Session};

pub async fn category_totals(session: &Session, kind: FlowKind) -> Result<Vec<CategoryTotal>> {
    let (transactions, categories) = tokio::try_join!(
        load(&session.ctx.transactions),
        load(&session.ctx.categories),
    )?;
    Ok(category_breakdown(&transactions, &categories, kind))
}

pub async fn cmd_categories(session: &Session, income: bool) -> Result<()> {
    let kind = if income {
        FlowKind::Income
    } else {
        FlowKind::Expenses
    };
    let totals = category_totals(session, kind).await?;

    if session.json {
        return print_json(&totals);
    }

    if totals.is_empty() {
        println!("No {} recorded.", if income { "income" } else { "expenses" });
        return Ok(());
    }

    let grand_total: f64 = totals.iter().map(|t| t.total).sum();

    println!();
    println!(
        "📊 {} by category",
        if income { "Income" } else { "Expenses" }
    );
    println!("   ─────────────────────────────────────────────────────────────");
    for total in &totals {
        let share = if grand_total > 0.0 {
            total.total / grand_total * 100.0
        } else {
            0.0
        };
        println!(
            "   {:<24} {:>14} {:>5.1}%",
            truncate(&total.name, 24),
            session.money(total.total),
            share
        );
    }

    Ok(())
}
