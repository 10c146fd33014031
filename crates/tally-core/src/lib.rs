//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance app:
//! - Record types for transactions, subscriptions, categories, payment methods and budgets
//! - Filter engine for narrowing record lists
//! - Balance helpers (planned, received, upcoming earnings and expenses)
//! - Chart statistics and budget progress
//! - Cached entity stores with pluggable fetchers (JSON snapshots, REST backend)
//! - Configuration loading

pub mod balance;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod models;
pub mod stats;
pub mod store;

/// Test utilities including a mock backend server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use balance::BalanceSummary;
pub use config::{Config, DataSource, SourceKind};
pub use context::{AppContext, RefreshReport};
pub use error::{Error, Result};
pub use filter::{Filter, FilterInput, NameIndex};
pub use models::{Budget, Category, PaymentMethod, Record, Subscription, Transaction};
pub use store::{EntityStore, Fetcher, RefreshOutcome, StoreState};
