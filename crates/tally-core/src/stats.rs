//! Chart data: per-category breakdowns, monthly totals and budget progress

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::models::{Budget, Category, CategoryId, Transaction};

/// Which side of the ledger to aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Income,
    Expenses,
}

impl FlowKind {
    /// The amount this transaction contributes, as a positive value
    fn contribution(&self, amount: f64) -> Option<f64> {
        match self {
            FlowKind::Income if amount > 0.0 => Some(amount),
            FlowKind::Expenses if amount < 0.0 => Some(amount.abs()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub name: String,
    pub total: f64,
}

/// Total income or expenses per category, largest first
pub fn category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
    kind: FlowKind,
) -> Vec<CategoryTotal> {
    let mut totals: HashMap<CategoryId, f64> = HashMap::new();
    for tx in transactions {
        if let Some(value) = kind.contribution(tx.amount) {
            *totals.entry(tx.category).or_insert(0.0) += value;
        }
    }

    let mut result: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category_id, total)| CategoryTotal {
            category_id,
            name: categories
                .iter()
                .find(|c| c.id == category_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            total,
        })
        .collect();

    result.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then(a.category_id.cmp(&b.category_id))
    });
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthTotal {
    /// 1-12
    pub month: u32,
    pub income: f64,
    pub expenses: f64,
}

impl MonthTotal {
    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }

    pub fn label(&self) -> &'static str {
        const LABELS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        LABELS[(self.month.clamp(1, 12) - 1) as usize]
    }
}

/// Income and expenses for each month of `year`, January first
pub fn monthly_totals(transactions: &[Transaction], year: i32) -> Vec<MonthTotal> {
    let mut months: Vec<MonthTotal> = (1..=12)
        .map(|month| MonthTotal {
            month,
            income: 0.0,
            expenses: 0.0,
        })
        .collect();

    for tx in transactions.iter().filter(|tx| tx.date.year() == year) {
        let slot = &mut months[tx.date.month0() as usize];
        slot.income += FlowKind::Income.contribution(tx.amount).unwrap_or(0.0);
        slot.expenses += FlowKind::Expenses.contribution(tx.amount).unwrap_or(0.0);
    }

    months
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub budget_id: i64,
    pub name: String,
    pub budget: f64,
    pub spent: f64,
}

impl BudgetProgress {
    /// Amount left this month; negative when over budget
    pub fn remaining(&self) -> f64 {
        self.budget - self.spent
    }

    pub fn percent_used(&self) -> f64 {
        if self.budget <= 0.0 {
            return 0.0;
        }
        self.spent / self.budget * 100.0
    }

    pub fn is_exceeded(&self) -> bool {
        self.spent > self.budget
    }
}

/// Expenses of the current month (of `now`) booked on the budget's categories
pub fn budget_progress(
    budget: &Budget,
    transactions: &[Transaction],
    now: DateTime<Utc>,
) -> BudgetProgress {
    let spent: f64 = transactions
        .iter()
        .filter(|tx| tx.date.year() == now.year() && tx.date.month() == now.month())
        .filter(|tx| budget.categories.contains(&tx.category))
        .filter_map(|tx| FlowKind::Expenses.contribution(tx.amount))
        .sum();

    BudgetProgress {
        budget_id: budget.id,
        name: budget.name.clone(),
        budget: budget.budget,
        spent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new(1, "Grocer", -60.0, at(2024, 4, 2)).with_category(1),
            Transaction::new(2, "Grocer", -40.0, at(2024, 4, 9)).with_category(1),
            Transaction::new(3, "Cinema", -25.0, at(2024, 4, 12)).with_category(2),
            Transaction::new(4, "Employer", 2000.0, at(2024, 4, 1)).with_category(3),
            Transaction::new(5, "Grocer", -30.0, at(2024, 3, 28)).with_category(1),
            Transaction::new(6, "Hardware", -15.0, at(2024, 4, 20)).with_category(9),
        ]
    }

    #[test]
    fn test_category_breakdown_expenses() {
        let categories = vec![
            Category::new(1, "Groceries"),
            Category::new(2, "Leisure"),
            Category::new(3, "Salary"),
        ];
        let breakdown = category_breakdown(&sample(), &categories, FlowKind::Expenses);

        let names: Vec<&str> = breakdown.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Leisure", "Unknown"]);
        assert_eq!(breakdown[0].total, 130.0);
        assert_eq!(breakdown[2].total, 15.0);
    }

    #[test]
    fn test_category_breakdown_income() {
        let breakdown = category_breakdown(&sample(), &[], FlowKind::Income);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].category_id, 3);
        assert_eq!(breakdown[0].total, 2000.0);
    }

    #[test]
    fn test_monthly_totals() {
        let months = monthly_totals(&sample(), 2024);
        assert_eq!(months.len(), 12);

        let april = months[3];
        assert_eq!(april.label(), "Apr");
        assert_eq!(april.income, 2000.0);
        assert_eq!(april.expenses, 140.0);
        assert_eq!(april.balance(), 1860.0);

        assert_eq!(months[2].expenses, 30.0);
        assert_eq!(months[0].balance(), 0.0);
        assert!(monthly_totals(&sample(), 2023)
            .iter()
            .all(|m| m.income == 0.0 && m.expenses == 0.0));
    }

    #[test]
    fn test_monthly_totals_ignore_zero_amounts() {
        let txs = vec![
            Transaction::new(1, "Voided", 0.0, at(2024, 6, 2)),
            Transaction::new(2, "Shop", -10.0, at(2024, 6, 3)),
        ];
        let june = monthly_totals(&txs, 2024)[5];
        assert_eq!(june.income, 0.0);
        assert_eq!(june.expenses, 10.0);
    }

    #[test]
    fn test_budget_progress_current_month_only() {
        let budget = Budget::new(1, "Food & Fun", 120.0, vec![1, 2]);
        let progress = budget_progress(&budget, &sample(), at(2024, 4, 30));

        assert_eq!(progress.spent, 125.0);
        assert_eq!(progress.remaining(), -5.0);
        assert!(progress.is_exceeded());

        let march = budget_progress(&budget, &sample(), at(2024, 3, 31));
        assert_eq!(march.spent, 30.0);
        assert_eq!(march.percent_used(), 25.0);
        assert!(!march.is_exceeded());
    }

    #[test]
    fn test_budget_progress_zero_budget() {
        let budget = Budget::new(2, "Empty", 0.0, vec![]);
        let progress = budget_progress(&budget, &sample(), at(2024, 4, 30));
        assert_eq!(progress.spent, 0.0);
        assert_eq!(progress.percent_used(), 0.0);
    }
}
