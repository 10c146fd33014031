//! Application context
//!
//! Holds one shared store per collection. The context is built once at
//! startup and handed to every consumer by reference, so all of them read the
//! same cached data.

use tracing::info;

use crate::config::DataSource;
use crate::error::Result;
use crate::models::{Budget, Category, PaymentMethod, Subscription, Transaction};
use crate::store::{
    CheckedFetcher, EntityStore, Fetcher, JsonFileFetcher, RefreshOutcome, RestClient,
};

pub struct AppContext {
    pub transactions: EntityStore<Vec<Transaction>>,
    pub subscriptions: EntityStore<Vec<Subscription>>,
    pub categories: EntityStore<Vec<Category>>,
    pub payment_methods: EntityStore<Vec<PaymentMethod>>,
    pub budgets: EntityStore<Vec<Budget>>,
}

/// Outcome of `AppContext::refresh_all`, one entry per store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub outcomes: Vec<(String, RefreshOutcome)>,
}

impl RefreshReport {
    /// Names of stores whose fetch failed
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == RefreshOutcome::Failed)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl AppContext {
    /// Build stores from one fetcher per collection
    pub fn new(
        transactions: impl Fetcher<Vec<Transaction>> + 'static,
        subscriptions: impl Fetcher<Vec<Subscription>> + 'static,
        categories: impl Fetcher<Vec<Category>> + 'static,
        payment_methods: impl Fetcher<Vec<PaymentMethod>> + 'static,
        budgets: impl Fetcher<Vec<Budget>> + 'static,
    ) -> Self {
        Self {
            transactions: EntityStore::new("transactions", transactions),
            subscriptions: EntityStore::new("subscriptions", subscriptions),
            categories: EntityStore::new("categories", categories),
            payment_methods: EntityStore::new("payment_methods", payment_methods),
            budgets: EntityStore::new("budgets", budgets),
        }
    }

    /// Build stores reading from snapshots or the remote backend
    ///
    /// Subscriptions are validated on every load; a record with an
    /// impossible execution day fails the whole subscriptions fetch.
    pub fn from_source(source: &DataSource) -> Result<Self> {
        match source {
            DataSource::Local(dir) => {
                info!("Reading snapshots from {}", dir.display());
                Ok(Self::new(
                    JsonFileFetcher::in_dir(dir, "transactions"),
                    CheckedFetcher::new(
                        JsonFileFetcher::<Vec<Subscription>>::in_dir(dir, "subscriptions"),
                        |subs: &Vec<Subscription>| Subscription::validate_all(subs),
                    ),
                    JsonFileFetcher::in_dir(dir, "categories"),
                    JsonFileFetcher::in_dir(dir, "payment_methods"),
                    JsonFileFetcher::in_dir(dir, "budgets"),
                ))
            }
            DataSource::Remote {
                url,
                api_key,
                access_token,
            } => {
                info!("Reading collections from {}", url);
                let mut client = RestClient::new(url, api_key)?;
                if let Some(token) = access_token {
                    client = client.with_access_token(token.clone());
                }
                Ok(Self::new(
                    client.collection("transactions"),
                    CheckedFetcher::new(
                        client.collection::<Vec<Subscription>>("subscriptions"),
                        |subs: &Vec<Subscription>| Subscription::validate_all(subs),
                    ),
                    client.collection("categories"),
                    client.collection("payment_methods"),
                    client.collection("budgets"),
                ))
            }
        }
    }

    /// Tag every store with the signed-in identity
    pub fn login(&self, identity: &str) {
        self.set_identity(Some(identity.to_string()));
    }

    /// Drop all cached data
    pub fn logout(&self) {
        self.set_identity(None);
        self.reset_all();
    }

    fn set_identity(&self, identity: Option<String>) {
        self.transactions.set_identity(identity.clone());
        self.subscriptions.set_identity(identity.clone());
        self.categories.set_identity(identity.clone());
        self.payment_methods.set_identity(identity.clone());
        self.budgets.set_identity(identity);
    }

    pub fn reset_all(&self) {
        self.transactions.reset_store();
        self.subscriptions.reset_store();
        self.categories.reset_store();
        self.payment_methods.reset_store();
        self.budgets.reset_store();
    }

    /// Refresh every store concurrently
    pub async fn refresh_all(&self) -> RefreshReport {
        let (transactions, subscriptions, categories, payment_methods, budgets) = tokio::join!(
            self.transactions.refresh_data(true),
            self.subscriptions.refresh_data(true),
            self.categories.refresh_data(true),
            self.payment_methods.refresh_data(true),
            self.budgets.refresh_data(true),
        );

        RefreshReport {
            outcomes: vec![
                (self.transactions.name().to_string(), transactions),
                (self.subscriptions.name().to_string(), subscriptions),
                (self.categories.name().to_string(), categories),
                (self.payment_methods.name().to_string(), payment_methods),
                (self.budgets.name().to_string(), budgets),
            ],
        }
    }
}
