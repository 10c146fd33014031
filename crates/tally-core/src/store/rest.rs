//! Remote collection fetcher for PostgREST-style backends
//!
//! Reads `GET {base_url}/rest/v1/{collection}?select=*`. The project key is
//! sent as `apikey`; the bearer token is the signed-in user's access token
//! when present, the project key otherwise. Row level security on the
//! backend decides which rows the user sees.
//!
//! # Configuration
//!
//! Environment variables (see `Config::apply_env`):
//! - `TALLY_BACKEND_URL`: Backend URL (required for remote mode)
//! - `TALLY_API_KEY`: Project API key
//! - `TALLY_ACCESS_TOKEN`: Signed-in user's access token

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::Fetcher;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings shared by every collection fetcher
#[derive(Clone)]
pub struct RestClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
        })
    }

    /// Use a user's access token for requests
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetcher for one collection
    pub fn collection<T>(&self, collection: &str) -> RestCollectionFetcher<T> {
        RestCollectionFetcher {
            client: self.clone(),
            collection: collection.to_string(),
            name: format!("rest:{}", collection),
            _marker: PhantomData,
        }
    }
}

pub struct RestCollectionFetcher<T> {
    client: RestClient,
    collection: String,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RestCollectionFetcher<T> {
    fn url(&self) -> String {
        format!(
            "{}/rest/v1/{}?select=*",
            self.client.base_url, self.collection
        )
    }
}

#[async_trait]
impl<T> Fetcher<T> for RestCollectionFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> Result<T> {
        let token = self
            .client
            .access_token
            .as_deref()
            .unwrap_or(&self.client.api_key);

        let response = self
            .client
            .http_client
            .get(self.url())
            .header("apikey", &self.client.api_key)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Fetch(format!(
                "{} returned {}: {}",
                self.collection, status, body
            )));
        }

        debug!(collection = %self.collection, "Fetched collection");
        Ok(response.json().await?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
