//! CLI command implementations
//!
//! Commands are organized by view:
//! - `summary` - Balance figures for transactions and subscriptions
//! - `transactions` - Filtered transaction list
//! - `subscriptions` - Filtered subscription list
//! - `receivers` - Most frequent receivers
//! - `categories` - Per-category totals
//! - `monthly` - Income and expenses per month
//! - `budgets` - Budget usage for the current month
//!
//! Every command takes a `Session`: the loaded context plus the settings that
//! shape output.

pub mod budgets;
pub mod categories;
pub mod monthly;
pub mod receivers;
pub mod subscriptions;
pub mod summary;
pub mod transactions;

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tally_core::config::ReceiversConfig;
use tally_core::{AppContext, Config, EntityStore, SourceKind};

// Re-export command functions for main.rs
pub use budgets::*;
pub use categories::*;
pub use monthly::*;
pub use receivers::*;
pub use subscriptions::*;
pub use summary::*;
pub use transactions::*;

/// Everything a command needs to run
pub struct Session {
    pub ctx: AppContext,
    pub now: DateTime<Utc>,
    pub currency: String,
    pub receivers: ReceiversConfig,
    pub json: bool,
}

impl Session {
    /// Load config, apply CLI overrides and build the context
    pub fn open(
        config_path: Option<&Path>,
        data_dir: Option<&Path>,
        now: Option<&str>,
        json: bool,
    ) -> Result<Self> {
        let mut config = Config::load(config_path).context("Failed to load config")?;
        if let Some(dir) = data_dir {
            config.source = SourceKind::Local;
            config.data_dir = Some(dir.to_path_buf());
        }

        let source = config.data_source()?;
        let ctx = AppContext::from_source(&source)?;
        if let Some(user) = &config.user {
            ctx.login(user);
        }

        Ok(Self::new(ctx, &config, parse_now(now)?, json))
    }

    pub fn new(ctx: AppContext, config: &Config, now: DateTime<Utc>, json: bool) -> Self {
        Self {
            ctx,
            now,
            currency: config.currency.clone(),
            receivers: config.receivers.clone(),
            json,
        }
    }

    pub fn money(&self, amount: f64) -> String {
        format_money(amount, &self.currency)
    }
}

/// Load a store, failing if it has no data
pub async fn load<T>(store: &EntityStore<T>) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    store.ensure_loaded().await;
    let state = store.state();
    match (state.data, state.error) {
        (Some(data), _) => Ok(data),
        (None, Some(e)) => Err(anyhow!("Failed to load {}: {}", store.name(), e)),
        (None, None) => bail!("{} is not loaded", store.name()),
    }
}

/// Parse `--now`, defaulting to the current time
pub fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Utc::now());
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid --now '{}' (use RFC 3339 or YYYY-MM-DD)", raw))?;
    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Format an amount with two decimals and the currency code
///
/// Negative amounts keep their sign.
pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
