//! Transaction command implementation

use anyhow::{Context, Result};
use tally_core::filter::filter_records_with_names;
use tally_core::{FilterInput, NameIndex, Transaction};

use super::{load, print_json, truncate, Session};

/// Load and filter transactions, newest first
pub async fn list_transactions(session: &Session, input: &FilterInput) -> Result<Vec<Transaction>> {
    let filter = input.parse().context("Invalid filter")?;
    let (transactions, categories, payment_methods) = tokio::try_join!(
        load(&session.ctx.transactions),
        load(&session.ctx.categories),
        load(&session.ctx.payment_methods),
    )?;

    let names = NameIndex::new(&categories, &payment_methods);
    let mut matched = filter_records_with_names("", &filter, &transactions, &names);
    matched.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    Ok(matched)
}

pub async fn cmd_transactions(session: &Session, input: FilterInput) -> Result<()> {
    let transactions = list_transactions(session, &input).await?;

    if session.json {
        return print_json(&transactions);
    }

    if transactions.is_empty() {
        println!("No transactions match.");
        return Ok(());
    }

    println!();
    println!("📝 Transactions ({})", transactions.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &transactions {
        let amount_str = if tx.amount < 0.0 {
            format!("\x1b[31m{:>14}\x1b[0m", session.money(tx.amount)) // Red for expenses
        } else {
            format!("\x1b[32m{:>14}\x1b[0m", session.money(tx.amount)) // Green for income
        };
        let label = match &tx.description {
            Some(description) => format!("{} ({})", tx.receiver, description),
            None => tx.receiver.clone(),
        };

        println!(
            "   {} │ {} │ {}",
            tx.date.format("%Y-%m-%d"),
            amount_str,
            truncate(&label, 40)
        );
    }

    Ok(())
}
