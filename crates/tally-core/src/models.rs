//! Domain models for Tally
//!
//! These are read-only snapshots of backend records. Records are created and
//! deleted by the backend; the core only filters and aggregates them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type CategoryId = i64;
pub type PaymentMethodId = i64;

/// A single booked transaction
///
/// `amount > 0` is income, `amount < 0` is an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub receiver: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub category: CategoryId,
    pub payment_method: PaymentMethodId,
    /// When the transaction was (or will be) processed
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction with empty references and audit fields set to `date`
    pub fn new(id: i64, receiver: impl Into<String>, amount: f64, date: DateTime<Utc>) -> Self {
        Self {
            id,
            receiver: receiver.into(),
            description: None,
            amount,
            category: 0,
            payment_method: 0,
            date,
            created_by: String::new(),
            inserted_at: date,
            updated_at: date,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = category;
        self
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethodId) -> Self {
        self.payment_method = payment_method;
        self
    }
}

/// A recurring payment or income, executed monthly on `execute_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub receiver: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: f64,
    pub category: CategoryId,
    pub payment_method: PaymentMethodId,
    /// Day of month (1-31)
    pub execute_at: u32,
    #[serde(default)]
    pub created_by: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(id: i64, receiver: impl Into<String>, amount: f64, execute_at: u32) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id,
            receiver: receiver.into(),
            description: None,
            amount,
            category: 0,
            payment_method: 0,
            execute_at,
            created_by: String::new(),
            inserted_at: epoch,
            updated_at: epoch,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = category;
        self
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethodId) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Check that `execute_at` is a valid day of month
    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.execute_at) {
            return Err(Error::InvalidData(format!(
                "subscription {} executes on day {}, expected 1-31",
                self.id, self.execute_at
            )));
        }
        Ok(())
    }

    /// Validate every subscription, failing on the first bad one
    pub fn validate_all(subscriptions: &[Subscription]) -> Result<()> {
        subscriptions.iter().try_for_each(Subscription::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id,
            name: name.into(),
            description: None,
            created_by: String::new(),
            inserted_at: epoch,
            updated_at: epoch,
        }
    }
}

/// A bank account, card or wallet that money moves through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    /// Bank or provider name
    #[serde(default)]
    pub provider: String,
    /// IBAN, card number or similar
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(id: PaymentMethodId, name: impl Into<String>) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id,
            name: name.into(),
            provider: String::new(),
            address: String::new(),
            description: None,
            created_by: String::new(),
            inserted_at: epoch,
            updated_at: epoch,
        }
    }
}

/// A monthly spending limit across a set of categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Monthly limit, positive
    pub budget: f64,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub created_by: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(id: i64, name: impl Into<String>, budget: f64, categories: Vec<CategoryId>) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id,
            name: name.into(),
            description: None,
            budget,
            categories,
            created_by: String::new(),
            inserted_at: epoch,
            updated_at: epoch,
        }
    }
}

/// Common view over transactions and subscriptions
///
/// The filter engine and the balance service are written against this trait,
/// so both record kinds share one implementation and differ only in how they
/// answer the date questions.
pub trait Record {
    fn receiver(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn category_id(&self) -> CategoryId;
    fn payment_method_id(&self) -> PaymentMethodId;
    fn amount(&self) -> f64;

    /// Lower date bound, inclusive on the calendar day
    fn starts_on_or_after(&self, day: NaiveDate) -> bool;

    /// Upper date bound, inclusive on the calendar day
    fn ends_on_or_before(&self, day: NaiveDate) -> bool;

    /// Whether the record has already been executed relative to `now`
    fn occurred_by(&self, now: DateTime<Utc>) -> bool;
}

impl Record for Transaction {
    fn receiver(&self) -> &str {
        &self.receiver
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn category_id(&self) -> CategoryId {
        self.category
    }

    fn payment_method_id(&self) -> PaymentMethodId {
        self.payment_method
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn starts_on_or_after(&self, day: NaiveDate) -> bool {
        self.date.date_naive() >= day
    }

    fn ends_on_or_before(&self, day: NaiveDate) -> bool {
        self.date.date_naive() <= day
    }

    fn occurred_by(&self, now: DateTime<Utc>) -> bool {
        self.date <= now
    }
}

impl Record for Subscription {
    fn receiver(&self) -> &str {
        &self.receiver
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn category_id(&self) -> CategoryId {
        self.category
    }

    fn payment_method_id(&self) -> PaymentMethodId {
        self.payment_method
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    // Subscriptions recur monthly, so only the day of month is compared.
    fn starts_on_or_after(&self, day: NaiveDate) -> bool {
        self.execute_at >= day.day()
    }

    fn ends_on_or_before(&self, day: NaiveDate) -> bool {
        self.execute_at <= day.day()
    }

    fn occurred_by(&self, now: DateTime<Utc>) -> bool {
        self.execute_at <= now.day()
    }
}
