//! Subscription command implementation

use anyhow::{Context, Result};
use chrono::Datelike;
use tally_core::filter::filter_records_with_names;
use tally_core::{FilterInput, NameIndex, Subscription};

use super::{load, print_json, truncate, Session};

/// Load and filter subscriptions, ordered by execution day
pub async fn list_subscriptions(
    session: &Session,
    input: &FilterInput,
) -> Result<Vec<Subscription>> {
    let filter = input.parse().context("Invalid filter")?;
    let (subscriptions, categories, payment_methods) = tokio::try_join!(
        load(&session.ctx.subscriptions),
        load(&session.ctx.categories),
        load(&session.ctx.payment_methods),
    )?;

    let names = NameIndex::new(&categories, &payment_methods);
    let mut matched = filter_records_with_names("", &filter, &subscriptions, &names);
    matched.sort_by_key(|s| (s.execute_at, s.id));
    Ok(matched)
}

pub async fn cmd_subscriptions(session: &Session, input: FilterInput) -> Result<()> {
    let subscriptions = list_subscriptions(session, &input).await?;

    if session.json {
        return print_json(&subscriptions);
    }

    if subscriptions.is_empty() {
        println!("No subscriptions match.");
        return Ok(());
    }

    println!();
    println!("🔄 Subscriptions ({})", subscriptions.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in &subscriptions {
        let status = if sub.execute_at <= session.now.day() {
            "✓"
        } else {
            " "
        };
        println!(
            "   {} day {:>2} │ {:>14} │ {}",
            status,
            sub.execute_at,
            session.money(sub.amount),
            truncate(&sub.receiver, 40)
        );
    }

    let total: f64 = subscriptions.iter().map(|s| s.amount).sum();
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Net per month: {}", session.money(total));

    Ok(())
}
