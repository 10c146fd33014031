//! Test utilities for tally-core
//!
//! This module provides testing infrastructure: scripted fetchers for store
//! tests, a mock PostgREST backend, and a small fixture data set that can be
//! served by the mock backend or written out as JSON snapshots.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Path as UrlPath,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tokio::sync::{oneshot, Semaphore};

use crate::error::{Error, Result};
use crate::models::{Budget, Category, PaymentMethod, Subscription, Transaction};
use crate::store::Fetcher;

/// Fetcher that replays a fixed list of responses
///
/// Call `n` gets response `n`; once the list is exhausted the last response
/// repeats. Every call yields to the scheduler at least once, so two
/// refreshes polled together really overlap. Clones share the call counter.
pub struct ScriptedFetcher<T> {
    responses: Arc<Vec<std::result::Result<T, &'static str>>>,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl<T> Clone for ScriptedFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            responses: self.responses.clone(),
            calls: self.calls.clone(),
            gate: self.gate.clone(),
        }
    }
}

/// Releases held fetches of a gated `ScriptedFetcher`, one per `open`
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn open(&self) {
        self.0.add_permits(1);
    }
}

impl<T> ScriptedFetcher<T> {
    pub fn new(responses: Vec<std::result::Result<T, &'static str>>) -> Self {
        Self {
            responses: Arc::new(responses),
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// Fetcher whose calls block until the returned gate is opened
    pub fn gated(responses: Vec<std::result::Result<T, &'static str>>) -> (Self, Gate) {
        let semaphore = Arc::new(Semaphore::new(0));
        let mut fetcher = Self::new(responses);
        fetcher.gate = Some(semaphore.clone());
        (fetcher, Gate(semaphore))
    }

    /// Number of times `fetch` was entered
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> Fetcher<T> for ScriptedFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<T> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .get(call)
            .or_else(|| self.responses.last())
            .cloned();

        match &self.gate {
            Some(gate) => gate
                .acquire()
                .await
                .map_err(|e| Error::Fetch(e.to_string()))?
                .forget(),
            None => tokio::task::yield_now().await,
        }

        match response {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::Fetch(message.to_string())),
            None => Err(Error::Fetch("no scripted response".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub fn sample_categories() -> Vec<Category> {
    vec![
        Category::new(1, "Groceries"),
        Category::new(2, "Leisure"),
        Category::new(3, "Salary"),
    ]
}

pub fn sample_payment_methods() -> Vec<PaymentMethod> {
    let mut checking = PaymentMethod::new(1, "Checking");
    checking.provider = "Example Bank".to_string();
    checking.address = "DE00 0000 0000 0000".to_string();
    let mut card = PaymentMethod::new(2, "Credit Card");
    card.provider = "Example Card Co".to_string();
    vec![checking, card]
}

/// Three transactions in May 2024: salary, groceries and a cinema visit
pub fn sample_transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(1, "Employer", 2500.0, at(2024, 5, 1))
            .with_category(3)
            .with_payment_method(1),
        Transaction::new(2, "Supermarket", -82.4, at(2024, 5, 3))
            .with_category(1)
            .with_payment_method(2)
            .with_description("Weekly shopping"),
        Transaction::new(3, "Cinema", -24.0, at(2024, 5, 20))
            .with_category(2)
            .with_payment_method(2),
    ]
}

pub fn sample_subscriptions() -> Vec<Subscription> {
    vec![
        Subscription::new(1, "Employer", 2500.0, 1)
            .with_category(3)
            .with_payment_method(1),
        Subscription::new(2, "Streaming", -12.99, 15)
            .with_category(2)
            .with_payment_method(2),
        Subscription::new(3, "Gym", -30.0, 28)
            .with_category(2)
            .with_payment_method(1),
    ]
}

pub fn sample_budgets() -> Vec<Budget> {
    vec![Budget::new(1, "Fun", 50.0, vec![2])]
}

/// Write every fixture collection as `<collection>.json` into `dir`
pub fn write_sample_snapshots(dir: &Path) -> Result<()> {
    let write = |name: &str, value: serde_json::Value| -> Result<()> {
        std::fs::write(
            dir.join(format!("{}.json", name)),
            serde_json::to_vec_pretty(&value)?,
        )?;
        Ok(())
    };

    write("transactions", serde_json::to_value(sample_transactions())?)?;
    write("subscriptions", serde_json::to_value(sample_subscriptions())?)?;
    write("categories", serde_json::to_value(sample_categories())?)?;
    write(
        "payment_methods",
        serde_json::to_value(sample_payment_methods())?,
    )?;
    write("budgets", serde_json::to_value(sample_budgets())?)?;
    Ok(())
}

// =============================================================================
// Mock backend
// =============================================================================

/// Mock PostgREST backend serving the fixture collections
pub struct MockBackendServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackendServer {
    /// The only API key the mock accepts
    pub const API_KEY: &'static str = "test-anon-key";

    /// The only user access token the mock accepts as a bearer token
    pub const ACCESS_TOKEN: &'static str = "test-user-token";

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new().route("/rest/v1/:collection", get(handle_collection));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockBackendServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `GET /rest/v1/:collection`
async fn handle_collection(UrlPath(collection): UrlPath<String>, headers: HeaderMap) -> Response {
    let api_key = headers.get("apikey").and_then(|v| v.to_str().ok());
    if api_key != Some(MockBackendServer::API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid API key" })),
        )
            .into_response();
    }

    // Without a user token the client sends the API key as the bearer token
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let known = [MockBackendServer::API_KEY, MockBackendServer::ACCESS_TOKEN];
    if !bearer.is_some_and(|token| known.contains(&token)) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "JWT expired" })),
        )
            .into_response();
    }

    let body = match collection.as_str() {
        "transactions" => serde_json::to_value(sample_transactions()),
        "subscriptions" => serde_json::to_value(sample_subscriptions()),
        "categories" => serde_json::to_value(sample_categories()),
        "payment_methods" => serde_json::to_value(sample_payment_methods()),
        "budgets" => serde_json::to_value(sample_budgets()),
        other => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": format!("relation \"{}\" does not exist", other) })),
            )
                .into_response();
        }
    };

    match body {
        Ok(value) => Json(value).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_fetcher_repeats_last_response() {
        let fetcher = ScriptedFetcher::new(vec![Ok(1), Err("down")]);

        assert_eq!(fetcher.fetch().await.unwrap(), 1);
        assert!(fetcher.fetch().await.is_err());
        assert!(fetcher.fetch().await.is_err());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_gated_fetcher_waits_for_gate() {
        let (fetcher, gate) = ScriptedFetcher::gated(vec![Ok(42)]);
        let background = fetcher.clone();
        let handle = tokio::spawn(async move { background.fetch().await });

        while fetcher.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!handle.is_finished());

        gate.open();
        assert_eq!(handle.await.unwrap().unwrap(), 42);
    }

    #[test]
    fn test_write_sample_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_snapshots(dir.path()).unwrap();

        for name in [
            "transactions",
            "subscriptions",
            "categories",
            "payment_methods",
            "budgets",
        ] {
            assert!(dir.path().join(format!("{}.json", name)).exists());
        }
    }
}
