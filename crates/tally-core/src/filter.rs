//! Filter predicate engine for transactions and subscriptions
//!
//! A `Filter` narrows a record list by keyword, date range, category set,
//! payment-method set and price range. Every dimension is optional and `None`
//! means "no constraint". Steps are applied one after another, each working on
//! the previous step's output.
//!
//! User input is validated once, when a `FilterInput` is parsed into a
//! `Filter`. The engine itself never fails.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{
    Category, CategoryId, PaymentMethod, PaymentMethodId, Record, Subscription, Transaction,
};

/// Filter criteria for record lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub keyword: Option<String>,
    pub categories: Option<Vec<CategoryId>>,
    pub payment_methods: Option<Vec<PaymentMethodId>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub price_from: Option<f64>,
    pub price_to: Option<f64>,
}

impl Filter {
    /// Create an empty filter (passes everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keyword (matches receiver and description)
    pub fn keyword(mut self, keyword: Option<&str>) -> Self {
        self.keyword = keyword.map(str::to_string);
        self
    }

    /// Set category ids; an empty list is treated as no constraint
    pub fn categories(mut self, ids: Option<Vec<CategoryId>>) -> Self {
        self.categories = ids;
        self
    }

    /// Set payment method ids; an empty list is treated as no constraint
    pub fn payment_methods(mut self, ids: Option<Vec<PaymentMethodId>>) -> Self {
        self.payment_methods = ids;
        self
    }

    /// Set inclusive date range
    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Set inclusive signed price range
    pub fn price_range(mut self, from: Option<f64>, to: Option<f64>) -> Self {
        self.price_from = from;
        self.price_to = to;
        self
    }

    /// True when no dimension constrains the result
    pub fn is_empty(&self) -> bool {
        self.keyword.as_deref().map_or(true, |k| k.trim().is_empty())
            && self.categories.as_ref().map_or(true, Vec::is_empty)
            && self.payment_methods.as_ref().map_or(true, Vec::is_empty)
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.price_from.is_none()
            && self.price_to.is_none()
    }
}

/// Raw filter fields as typed by a user
///
/// Blank strings count as "not set".
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
    pub keyword: Option<String>,
    pub categories: Option<String>,
    pub payment_methods: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub price_from: Option<String>,
    pub price_to: Option<String>,
}

impl FilterInput {
    /// Validate the raw fields and build a `Filter`
    ///
    /// Dates must be `YYYY-MM-DD`, prices finite numbers and id lists
    /// comma-separated integers. Contradictory bounds are accepted (they
    /// simply match nothing) but logged.
    pub fn parse(&self) -> Result<Filter> {
        let filter = Filter {
            keyword: non_blank(&self.keyword).map(str::to_string),
            categories: non_blank(&self.categories)
                .map(|s| parse_ids(s, "category"))
                .transpose()?,
            payment_methods: non_blank(&self.payment_methods)
                .map(|s| parse_ids(s, "payment method"))
                .transpose()?,
            date_from: non_blank(&self.date_from)
                .map(|s| parse_date(s, "from"))
                .transpose()?,
            date_to: non_blank(&self.date_to)
                .map(|s| parse_date(s, "to"))
                .transpose()?,
            price_from: non_blank(&self.price_from)
                .map(|s| parse_price(s, "min"))
                .transpose()?,
            price_to: non_blank(&self.price_to)
                .map(|s| parse_price(s, "max"))
                .transpose()?,
        };

        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                warn!(%from, %to, "Date range is empty, no record will match");
            }
        }
        if let (Some(from), Some(to)) = (filter.price_from, filter.price_to) {
            if from > to {
                warn!(from, to, "Price range is empty, no record will match");
            }
        }

        Ok(filter)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_ids(raw: &str, what: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::InvalidFilter(format!("invalid {} id '{}'", what, s)))
        })
        .collect()
}

fn parse_date(raw: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        Error::InvalidFilter(format!("invalid '{}' date '{}' (use YYYY-MM-DD)", what, raw))
    })
}

fn parse_price(raw: &str, what: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::InvalidFilter(format!(
            "invalid '{}' price '{}'",
            what, raw
        ))),
    }
}

/// Category and payment-method names, for keyword matching by name
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    categories: HashMap<CategoryId, String>,
    payment_methods: HashMap<PaymentMethodId, String>,
}

impl NameIndex {
    pub fn new(categories: &[Category], payment_methods: &[PaymentMethod]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| (c.id, c.name.to_lowercase()))
                .collect(),
            payment_methods: payment_methods
                .iter()
                .map(|p| (p.id, p.name.to_lowercase()))
                .collect(),
        }
    }

    fn matches<R: Record>(&self, record: &R, needle: &str) -> bool {
        let category = self
            .categories
            .get(&record.category_id())
            .is_some_and(|name| name.contains(needle));
        let payment_method = self
            .payment_methods
            .get(&record.payment_method_id())
            .is_some_and(|name| name.contains(needle));
        category || payment_method
    }
}

/// Filter any record list
///
/// `keyword` takes precedence over `filter.keyword` when it is not blank.
pub fn filter_records<R: Record + Clone>(keyword: &str, filter: &Filter, records: &[R]) -> Vec<R> {
    apply(keyword, filter, records, None)
}

/// Like `filter_records`, but the keyword also matches category and
/// payment-method names
pub fn filter_records_with_names<R: Record + Clone>(
    keyword: &str,
    filter: &Filter,
    records: &[R],
    names: &NameIndex,
) -> Vec<R> {
    apply(keyword, filter, records, Some(names))
}

pub fn filter_transactions(
    keyword: &str,
    filter: &Filter,
    transactions: &[Transaction],
) -> Vec<Transaction> {
    filter_records(keyword, filter, transactions)
}

pub fn filter_subscriptions(
    keyword: &str,
    filter: &Filter,
    subscriptions: &[Subscription],
) -> Vec<Subscription> {
    filter_records(keyword, filter, subscriptions)
}

fn apply<R: Record + Clone>(
    keyword: &str,
    filter: &Filter,
    records: &[R],
    names: Option<&NameIndex>,
) -> Vec<R> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut result: Vec<R> = records.to_vec();

    let keyword = match keyword.trim() {
        "" => filter.keyword.as_deref().map(str::trim).unwrap_or(""),
        k => k,
    };
    if !keyword.is_empty() {
        let needle = keyword.to_lowercase();
        result.retain(|r| {
            r.receiver().to_lowercase().contains(&needle)
                || r
                    .description()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || names.is_some_and(|n| n.matches(r, &needle))
        });
    }

    if let Some(from) = filter.date_from {
        result.retain(|r| r.starts_on_or_after(from));
    }

    if let Some(to) = filter.date_to {
        result.retain(|r| r.ends_on_or_before(to));
    }

    if let Some(ids) = filter.categories.as_deref().filter(|ids| !ids.is_empty()) {
        result.retain(|r| ids.contains(&r.category_id()));
    }

    if let Some(ids) = filter
        .payment_methods
        .as_deref()
        .filter(|ids| !ids.is_empty())
    {
        result.retain(|r| ids.contains(&r.payment_method_id()));
    }

    // Amounts are signed: this bounds the signed value, not the magnitude.
    if let Some(min) = filter.price_from {
        result.retain(|r| r.amount() >= min);
    }

    if let Some(max) = filter.price_to {
        result.retain(|r| r.amount() <= max);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx(id: i64, receiver: &str, amount: f64, (y, m, d): (i32, u32, u32)) -> Transaction {
        let date = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        Transaction::new(id, receiver, amount, date)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(1, "John", 100.0, (2023, 6, 1))
                .with_category(1)
                .with_payment_method(1)
                .with_description("Rent share"),
            tx(2, "Jane", 200.0, (2023, 6, 2))
                .with_category(2)
                .with_payment_method(2),
            tx(3, "Alice", 300.0, (2023, 6, 3))
                .with_category(3)
                .with_payment_method(3)
                .with_description("Birthday gift"),
        ]
    }

    fn ids<R: Record>(records: &[R], id: impl Fn(&R) -> i64) -> Vec<i64> {
        records.iter().map(id).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let records = sample();
        let result = filter_transactions("", &Filter::new(), &records);
        assert_eq!(result, records);
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let filter = Filter::new().price_range(Some(0.0), None);
        assert!(filter_transactions("john", &filter, &[]).is_empty());
    }

    #[test]
    fn test_keyword_matches_receiver_case_insensitive() {
        let result = filter_transactions("JOHN", &Filter::new(), &sample());
        assert_eq!(ids(&result, |t| t.id), vec![1]);
    }

    #[test]
    fn test_keyword_matches_description() {
        let result = filter_transactions("gift", &Filter::new(), &sample());
        assert_eq!(ids(&result, |t| t.id), vec![3]);
    }

    #[test]
    fn test_keyword_falls_back_to_filter_keyword() {
        let filter = Filter::new().keyword(Some("jane"));
        let result = filter_transactions("  ", &filter, &sample());
        assert_eq!(ids(&result, |t| t.id), vec![2]);

        // Explicit keyword wins
        let result = filter_transactions("alice", &filter, &sample());
        assert_eq!(ids(&result, |t| t.id), vec![3]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = Filter::new().date_range(Some(day(2023, 6, 2)), Some(day(2023, 6, 3)));
        let result = filter_transactions("", &filter, &sample());
        assert_eq!(ids(&result, |t| t.id), vec![2, 3]);
    }

    #[test]
    fn test_date_bounds_independent() {
        let from_only = Filter::new().date_range(Some(day(2023, 6, 3)), None);
        assert_eq!(ids(&filter_transactions("", &from_only, &sample()), |t| t.id), vec![3]);

        let to_only = Filter::new().date_range(None, Some(day(2023, 6, 1)));
        assert_eq!(ids(&filter_transactions("", &to_only, &sample()), |t| t.id), vec![1]);
    }

    #[test]
    fn test_categories_use_set_inclusion() {
        let filter = Filter::new().categories(Some(vec![1, 3]));
        let result = filter_transactions("", &filter, &sample());
        assert_eq!(ids(&result, |t| t.id), vec![1, 3]);
    }

    #[test]
    fn test_empty_category_list_passes_through() {
        let filter = Filter::new().categories(Some(vec![]));
        assert_eq!(filter_transactions("", &filter, &sample()).len(), 3);
    }

    #[test]
    fn test_payment_methods_use_set_inclusion() {
        let filter = Filter::new().payment_methods(Some(vec![2]));
        let result = filter_transactions("", &filter, &sample());
        assert_eq!(ids(&result, |t| t.id), vec![2]);
    }

    #[test]
    fn test_price_range() {
        let filter = Filter::new().price_range(Some(200.0), Some(300.0));
        let result = filter_transactions("", &filter, &sample());
        assert_eq!(ids(&result, |t| t.id), vec![2, 3]);
    }

    #[test]
    fn test_price_bounds_are_signed() {
        let records = vec![
            tx(1, "Shop", -50.0, (2023, 1, 1)),
            tx(2, "Shop", -5.0, (2023, 1, 1)),
            tx(3, "Employer", 1000.0, (2023, 1, 1)),
        ];
        let filter = Filter::new().price_range(Some(-10.0), None);
        let result = filter_transactions("", &filter, &records);
        assert_eq!(ids(&result, |t| t.id), vec![2, 3]);
    }

    #[test]
    fn test_contradictory_bounds_yield_empty() {
        let filter = Filter::new().price_range(Some(300.0), Some(100.0));
        assert!(filter_transactions("", &filter, &sample()).is_empty());
    }

    #[test]
    fn test_subscription_date_filter_uses_day_of_month() {
        let subs = vec![
            Subscription::new(1, "Gym", -30.0, 1),
            Subscription::new(2, "Netflix", -15.0, 15),
            Subscription::new(3, "Salary", 2500.0, 28),
        ];
        let filter = Filter::new().date_range(Some(day(2024, 2, 10)), Some(day(1999, 7, 28)));
        let result = filter_subscriptions("", &filter, &subs);
        assert_eq!(ids(&result, |s| s.id), vec![2, 3]);
    }

    #[test]
    fn test_keyword_matches_names_when_indexed() {
        let categories = vec![Category::new(1, "Housing"), Category::new(2, "Leisure")];
        let payment_methods = vec![PaymentMethod::new(3, "Credit Card")];
        let names = NameIndex::new(&categories, &payment_methods);

        let result = filter_records_with_names("housing", &Filter::new(), &sample(), &names);
        assert_eq!(ids(&result, |t| t.id), vec![1]);

        let result = filter_records_with_names("credit", &Filter::new(), &sample(), &names);
        assert_eq!(ids(&result, |t| t.id), vec![3]);

        // Without the index only receiver/description are searched
        assert!(filter_transactions("housing", &Filter::new(), &sample()).is_empty());
    }

    #[test]
    fn test_filter_input_parse() {
        let input = FilterInput {
            keyword: Some("  rent ".to_string()),
            categories: Some("1, 3".to_string()),
            payment_methods: Some(String::new()),
            date_from: Some("2023-06-02".to_string()),
            date_to: None,
            price_from: Some("-20.5".to_string()),
            price_to: Some("   ".to_string()),
        };
        let filter = input.parse().unwrap();

        assert_eq!(filter.keyword.as_deref(), Some("rent"));
        assert_eq!(filter.categories, Some(vec![1, 3]));
        assert_eq!(filter.payment_methods, None);
        assert_eq!(filter.date_from, Some(day(2023, 6, 2)));
        assert_eq!(filter.price_from, Some(-20.5));
        assert_eq!(filter.price_to, None);
    }

    #[test]
    fn test_filter_input_rejects_bad_values() {
        let bad_date = FilterInput {
            date_from: Some("06/02/2023".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_date.parse(), Err(Error::InvalidFilter(_))));

        let bad_id = FilterInput {
            categories: Some("1,x".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_id.parse(), Err(Error::InvalidFilter(_))));

        let bad_price = FilterInput {
            price_to: Some("NaN".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_price.parse(), Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn test_filter_input_accepts_contradictory_bounds() {
        let input = FilterInput {
            price_from: Some("300".to_string()),
            price_to: Some("100".to_string()),
            ..Default::default()
        };
        let filter = input.parse().unwrap();
        assert!(filter_transactions("", &filter, &sample()).is_empty());
    }
}
