//! Balance and aggregation helpers
//!
//! Pure reducers over record lists. Positive amounts are earnings, negative
//! amounts are expenses; expense figures are always reported as absolute
//! values. "Planned" figures ignore dates, "received"/"paid" figures count
//! records that occurred on or before `now`, "upcoming" figures count the rest.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Record, Transaction};

/// Sum of all positive amounts
pub fn planned_earnings<R: Record>(records: &[R]) -> f64 {
    records
        .iter()
        .map(Record::amount)
        .filter(|amount| *amount > 0.0)
        .sum()
}

/// Sum of the absolute values of all negative amounts
pub fn planned_expenses<R: Record>(records: &[R]) -> f64 {
    records
        .iter()
        .map(Record::amount)
        .filter(|amount| *amount < 0.0)
        .map(f64::abs)
        .sum()
}

pub fn received_earnings<R: Record>(records: &[R], now: DateTime<Utc>) -> f64 {
    earnings_where(records, |r| r.occurred_by(now))
}

pub fn upcoming_earnings<R: Record>(records: &[R], now: DateTime<Utc>) -> f64 {
    earnings_where(records, |r| !r.occurred_by(now))
}

pub fn paid_expenses<R: Record>(records: &[R], now: DateTime<Utc>) -> f64 {
    expenses_where(records, |r| r.occurred_by(now))
}

pub fn upcoming_expenses<R: Record>(records: &[R], now: DateTime<Utc>) -> f64 {
    expenses_where(records, |r| !r.occurred_by(now))
}

fn earnings_where<R: Record>(records: &[R], keep: impl Fn(&R) -> bool) -> f64 {
    records
        .iter()
        .filter(|r| keep(r))
        .map(Record::amount)
        .filter(|amount| *amount > 0.0)
        .sum()
}

fn expenses_where<R: Record>(records: &[R], keep: impl Fn(&R) -> bool) -> f64 {
    records
        .iter()
        .filter(|r| keep(r))
        .map(Record::amount)
        .filter(|amount| *amount < 0.0)
        .map(f64::abs)
        .sum()
}

/// Receivers ordered by how often they appear
///
/// With `within_days`, only transactions dated between `now - within_days`
/// and `now` are counted. Ties keep first-seen order.
pub fn unique_receivers(
    transactions: &[Transaction],
    within_days: Option<u32>,
    now: DateTime<Utc>,
) -> Vec<String> {
    // A window reaching past the earliest representable date has no lower bound
    let cutoff = within_days
        .map(|days| now.checked_sub_signed(Duration::days(i64::from(days))));

    // (first seen position, count)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for tx in transactions {
        if let Some(cutoff) = cutoff {
            if tx.date > now || cutoff.is_some_and(|cutoff| tx.date < cutoff) {
                continue;
            }
        }
        let next = counts.len();
        let entry = counts.entry(tx.receiver.as_str()).or_insert((next, 0));
        entry.1 += 1;
    }

    let mut receivers: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(receiver, (first_seen, count))| (receiver, first_seen, count))
        .collect();
    receivers.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));

    receivers
        .into_iter()
        .map(|(receiver, _, _)| receiver.to_string())
        .collect()
}

/// All balance figures for one record list
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BalanceSummary {
    pub planned_earnings: f64,
    pub planned_expenses: f64,
    pub received_earnings: f64,
    pub upcoming_earnings: f64,
    pub paid_expenses: f64,
    pub upcoming_expenses: f64,
}

impl BalanceSummary {
    pub fn compute<R: Record>(records: &[R], now: DateTime<Utc>) -> Self {
        Self {
            planned_earnings: planned_earnings(records),
            planned_expenses: planned_expenses(records),
            received_earnings: received_earnings(records, now),
            upcoming_earnings: upcoming_earnings(records, now),
            paid_expenses: paid_expenses(records, now),
            upcoming_expenses: upcoming_expenses(records, now),
        }
    }

    /// Planned earnings minus planned expenses
    pub fn net_planned(&self) -> f64 {
        self.planned_earnings - self.planned_expenses
    }
}
